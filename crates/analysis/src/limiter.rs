use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use kwlens_core::limiter::port::{RateLimiter, Unthrottled};
use std::sync::Arc;
use std::time::Duration;

/// # Summary
/// 固定间隔节流器，基于 `governor` 的直连限流器实现。
///
/// # Invariants
/// - 突发容量为 1：第一次调用立即放行，之后每次调用至少间隔 `interval`。
pub struct IntervalLimiter {
    inner: DefaultDirectRateLimiter,
}

impl IntervalLimiter {
    /// # Summary
    /// 创建固定间隔节流器。
    ///
    /// # Returns
    /// 间隔为零时返回 `None`。
    pub fn new(interval: Duration) -> Option<Self> {
        let quota = Quota::with_period(interval)?;
        Some(Self {
            inner: DefaultDirectRateLimiter::direct(quota),
        })
    }
}

#[async_trait]
impl RateLimiter for IntervalLimiter {
    async fn acquire(&self) {
        self.inner.until_ready().await;
    }
}

/// # Summary
/// 按配置的毫秒间隔构造节流器。
///
/// # Logic
/// 1. 间隔大于零时使用 `IntervalLimiter`。
/// 2. 否则退化为 `Unthrottled`。
pub fn from_interval_ms(interval_ms: u64) -> Arc<dyn RateLimiter> {
    match IntervalLimiter::new(Duration::from_millis(interval_ms)) {
        Some(limiter) => Arc::new(limiter),
        None => Arc::new(Unthrottled),
    }
}
