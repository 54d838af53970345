use async_trait::async_trait;

/// # Summary
/// 上游调用节流接口。
///
/// # Invariants
/// - 每次上游调用之前必须先 `acquire` 一次。
/// - 实现者决定等待机制 (固定间隔、令牌桶等)，调用方不感知具体延迟。
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// 等待直到允许发起下一次调用。
    async fn acquire(&self);
}

/// # Summary
/// 不做任何等待的节流器，供测试和离线重放使用。
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

#[async_trait]
impl RateLimiter for Unthrottled {
    async fn acquire(&self) {}
}
