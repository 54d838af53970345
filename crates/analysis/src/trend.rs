use crate::extractor;
use crate::window::QueryWindow;
use kwlens_core::common::{Device, TimeUnit};
use kwlens_core::limiter::port::RateLimiter;
use kwlens_core::trend::entity::{RatioPoint, SegmentFilter};
use kwlens_core::trend::error::TrendError;
use kwlens_core::trend::port::TrendProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// # Summary
/// 月粒度趋势查询器。
///
/// # Invariants
/// - 周期标签与比例值原样返回，不做任何重标定。
pub struct TrendFetcher {
    provider: Arc<dyn TrendProvider>,
    limiter: Arc<dyn RateLimiter>,
}

impl TrendFetcher {
    pub fn new(provider: Arc<dyn TrendProvider>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { provider, limiter }
    }

    /// # Summary
    /// 查询一个渠道 (全量或指定设备) 的月度比例序列。
    ///
    /// # Returns
    /// 按周期升序的数据点；上游错误原样返回，由调用方决定是否降级为空序列。
    pub async fn fetch(
        &self,
        keyword: &str,
        window: &QueryWindow,
        device: Option<Device>,
    ) -> Result<Vec<RatioPoint>, TrendError> {
        self.limiter.acquire().await;
        let filter = SegmentFilter {
            device,
            ..SegmentFilter::default()
        };
        let response = self
            .provider
            .query(&window.query(keyword, TimeUnit::Month, filter))
            .await?;
        let points = extractor::ratio_points(&response);
        debug!("trend for '{}' ({:?}) has {} points", keyword, device, points.len());
        Ok(points)
    }

    /// 逐个设备查询，各设备结果互相独立。
    pub async fn fetch_by_device(
        &self,
        keyword: &str,
        window: &QueryWindow,
        devices: &[Device],
    ) -> BTreeMap<Device, Result<Vec<RatioPoint>, TrendError>> {
        let mut series = BTreeMap::new();
        for device in devices {
            let result = self.fetch(keyword, window, Some(*device)).await;
            series.insert(*device, result);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kwlens_core::testing::{CountingLimiter, ScriptedTrendProvider};

    #[tokio::test]
    async fn test_fetch_by_device_keeps_failures_separate() {
        let provider = Arc::new(
            ScriptedTrendProvider::new()
                .with_points(
                    SegmentFilter::device(Device::Pc),
                    &[RatioPoint::new("2025-02", 50.0), RatioPoint::new("2025-01", 100.0)],
                )
                .with_failure(SegmentFilter::device(Device::Mobile), TrendError::Http(500)),
        );
        let limiter = Arc::new(CountingLimiter::new());
        let fetcher = TrendFetcher::new(provider.clone(), limiter.clone());
        let window = QueryWindow::trailing(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 365);

        let series = fetcher.fetch_by_device("coffee", &window, &Device::ALL).await;
        let pc = series[&Device::Pc].as_ref().unwrap();
        assert_eq!(pc[0].period, "2025-01");
        assert_eq!(pc[1].ratio, 50.0);
        assert_eq!(series[&Device::Mobile], Err(TrendError::Http(500)));
        assert_eq!(limiter.acquired(), 2);

        let calls = provider.calls().await;
        assert!(calls.iter().all(|q| q.time_unit == TimeUnit::Month));
    }
}
