use crate::trend::entity::{SeriesResponse, TrendQuery};
use crate::trend::error::TrendError;
use async_trait::async_trait;

/// # Summary
/// 相对趋势数据源接口 (原始数据源)。
///
/// # Invariants
/// - 每次调用都是一次独立的上游查询，上游会对每次查询独立归一化。
/// - 实现者负责超时控制，调用不得无限期阻塞。
/// - 实现者不做重试，节流由调用方注入的 `RateLimiter` 负责。
#[async_trait]
pub trait TrendProvider: Send + Sync {
    /// # Summary
    /// 执行一次趋势查询。
    ///
    /// # Logic
    /// 1. 将查询条件编码为上游请求。
    /// 2. 发起请求并映射状态码。
    /// 3. 将响应体解码为 `SeriesResponse`。
    ///
    /// # Arguments
    /// * `query`: 查询条件。
    ///
    /// # Returns
    /// 成功返回原始响应，失败返回 `TrendError`。
    async fn query(&self, query: &TrendQuery) -> Result<SeriesResponse, TrendError>;
}
