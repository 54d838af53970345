use crate::extractor;
use crate::window::QueryWindow;
use kwlens_core::analysis::entity::{FanoutSummary, Segment, SegmentOutcome, SegmentResult, SegmentScalar};
use kwlens_core::common::TimeUnit;
use kwlens_core::limiter::port::RateLimiter;
use kwlens_core::trend::port::TrendProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// 分段扇出查询器。
///
/// # Invariants
/// - 分段按输入顺序逐个串行查询，每次查询前等待一次节流器。
/// - 单个分段失败不会中断扇出，也不会向调用方传播错误。
pub struct SegmentFanout {
    provider: Arc<dyn TrendProvider>,
    limiter: Arc<dyn RateLimiter>,
}

impl SegmentFanout {
    pub fn new(provider: Arc<dyn TrendProvider>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { provider, limiter }
    }

    /// # Summary
    /// 对每个分段发起一次独立查询并提取标量。
    ///
    /// # Logic
    /// 1. 等待节流器放行。
    /// 2. 在同一窗口、同一粒度下查询该分段。
    /// 3. 有数据点记为 `Measured`，无数据点记为 `Empty`，出错记为 `Failed`。
    ///
    /// # Arguments
    /// * `keyword`: 查询关键词。
    /// * `window`: 所有分段共享的查询窗口。
    /// * `time_unit`: 时间粒度。
    /// * `segments`: 分段列表。
    ///
    /// # Returns
    /// 按输入顺序排列的分段结果。
    pub async fn run(
        &self,
        keyword: &str,
        window: &QueryWindow,
        time_unit: TimeUnit,
        segments: Vec<Segment>,
    ) -> FanoutReport {
        let mut results = Vec::with_capacity(segments.len());
        for segment in segments {
            self.limiter.acquire().await;
            let query = window.query(keyword, time_unit, segment.filter.clone());
            let outcome = match self.provider.query(&query).await {
                Ok(response) if extractor::has_samples(&response) => {
                    let sum = extractor::ratio_sum(&response);
                    debug!("segment {} of '{}' measured {:.2}", display_label(&segment), keyword, sum);
                    SegmentOutcome::Measured(sum)
                }
                Ok(_) => {
                    debug!("segment {} of '{}' returned no data", display_label(&segment), keyword);
                    SegmentOutcome::Empty
                }
                Err(e) => {
                    warn!("segment {} of '{}' failed: {}", display_label(&segment), keyword, e);
                    SegmentOutcome::Failed(e)
                }
            };
            results.push(SegmentResult { segment, outcome });
        }

        let report = FanoutReport { results };
        info!(
            "fanout for '{}' finished: {} measured, {} empty, {} failed",
            keyword,
            report.succeeded(),
            report.empty(),
            report.failed()
        );
        report
    }
}

fn display_label(segment: &Segment) -> String {
    match segment.device {
        Some(device) => format!("{}@{}", segment.label, device),
        None => segment.label.clone(),
    }
}

/// # Summary
/// 一次扇出的全部分段结果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanoutReport {
    results: Vec<SegmentResult>,
}

impl FanoutReport {
    pub fn results(&self) -> &[SegmentResult] {
        &self.results
    }

    /// 失败与空结果均折算为 0 的标量列表。
    pub fn scalars(&self) -> Vec<SegmentScalar> {
        self.results.iter().map(SegmentResult::to_scalar).collect()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Measured(_)))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, SegmentOutcome::Empty))
    }

    pub fn failed(&self) -> usize {
        self.count(SegmentOutcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&SegmentOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// 汇总统计及失败原因。
    pub fn summary(&self) -> FanoutSummary {
        let failures = self
            .results
            .iter()
            .filter_map(|r| match &r.outcome {
                SegmentOutcome::Failed(e) => Some((display_label(&r.segment), e.to_string())),
                _ => None,
            })
            .collect();
        FanoutSummary {
            succeeded: self.succeeded(),
            empty: self.empty(),
            failed: self.failed(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kwlens_core::common::{Device, Gender};
    use kwlens_core::testing::{CountingLimiter, ScriptedTrendProvider};
    use kwlens_core::trend::entity::SegmentFilter;
    use kwlens_core::trend::error::TrendError;

    fn window() -> QueryWindow {
        QueryWindow::trailing(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 31)
    }

    #[tokio::test]
    async fn test_fanout_collects_outcomes() {
        let provider = Arc::new(
            ScriptedTrendProvider::new()
                .with_series(SegmentFilter::gender(Gender::Male), &[10.0, 20.0])
                .with_failure(
                    SegmentFilter::gender(Gender::Male).with_device(Device::Pc),
                    TrendError::RateLimited,
                ),
        );
        let limiter = Arc::new(CountingLimiter::new());
        let fanout = SegmentFanout::new(provider.clone(), limiter.clone());

        let segments = vec![
            Segment::new("male", SegmentFilter::gender(Gender::Male)),
            Segment::new("female", SegmentFilter::gender(Gender::Female)),
            Segment::new("male", SegmentFilter::gender(Gender::Male).with_device(Device::Pc)),
        ];
        let report = fanout.run("coffee", &window(), TimeUnit::Date, segments).await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.empty(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(limiter.acquired(), 3);

        let scalars = report.scalars();
        assert_eq!(scalars[0].ratio_sum, 30.0);
        assert_eq!(scalars[1].ratio_sum, 0.0);
        assert_eq!(scalars[2].ratio_sum, 0.0);

        let summary = report.summary();
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "male@pc");

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|q| q.time_unit == TimeUnit::Date && q.start == window().start));
        assert_eq!(calls[0].keyword, "coffee");
    }
}
