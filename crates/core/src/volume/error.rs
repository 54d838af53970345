use thiserror::Error;

/// # Summary
/// 绝对检索量数据源错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Unauthorized: check SearchAd api key/secret")]
    Unauthorized,
    #[error("Rate limited by upstream")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Http(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    // 凭证未配置或签名密钥非法
    #[error("Configuration error: {0}")]
    Config(String),
}
