use thiserror::Error;

/// # Summary
/// 趋势数据源错误枚举，覆盖鉴权、限流、网络及解析失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 分段扇出会把此错误记录为该分段的失败原因，不会向调用方传播。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrendError {
    // 401，客户端凭证无效
    #[error("Unauthorized: check DataLab client id/secret")]
    Unauthorized,
    // 429，超出调用配额
    #[error("Rate limited by upstream")]
    RateLimited,
    // 网络层错误 (连接失败、超时等)
    #[error("Network error: {0}")]
    Network(String),
    // 其他非 2xx 状态码
    #[error("HTTP status {0}")]
    Http(u16),
    // 响应体无法解码
    #[error("Parse error: {0}")]
    Parse(String),
    // 本地配置缺失
    #[error("Configuration error: {0}")]
    Config(String),
}
