//! # `kwlens-feed` - 上游接口适配器
//!
//! 实现 `kwlens-core` 中定义的数据源端口：
//! - `datalab`: Naver DataLab 搜索趋势 (`TrendProvider`)
//! - `searchad`: Naver SearchAd 关键词工具 (`VolumeProvider`)

pub mod datalab;
pub mod searchad;

use tracing::debug;

/// # Summary
/// 安装进程级 rustls 加密后端。
///
/// # Invariants
/// - 构建任何 HTTP 客户端之前必须调用一次；重复调用无副作用。
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}
