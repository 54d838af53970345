//! 测试辅助实现，仅在 `test-utils` feature 下编译。
//!
//! 提供脚本化的端口实现，使分析层可以在不发起网络请求、不等待真实时钟的情况下被验证。

use crate::limiter::port::RateLimiter;
use crate::trend::entity::{RatioPoint, RawSample, SegmentFilter, SeriesGroup, SeriesResponse, TrendQuery};
use crate::trend::error::TrendError;
use crate::trend::port::TrendProvider;
use crate::volume::entity::KeywordStat;
use crate::volume::error::VolumeError;
use crate::volume::port::VolumeProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// # Summary
/// 根据过滤条件返回预设响应的趋势数据源。
///
/// # Invariants
/// - 未预设的过滤条件返回空响应 (成功但无数据)。
/// - 记录每次收到的查询，供断言调用次数与参数。
#[derive(Default)]
pub struct ScriptedTrendProvider {
    responses: HashMap<SegmentFilter, Result<SeriesResponse, TrendError>>,
    calls: Mutex<Vec<TrendQuery>>,
}

impl ScriptedTrendProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预设某过滤条件下的比例序列。
    pub fn with_series(mut self, filter: SegmentFilter, ratios: &[f64]) -> Self {
        let points: Vec<RatioPoint> = ratios
            .iter()
            .enumerate()
            .map(|(i, r)| RatioPoint::new(format!("2025-01-{:02}", i + 1), *r))
            .collect();
        self.responses.insert(filter, Ok(series_response("kw", &points)));
        self
    }

    /// 预设某过滤条件下的完整数据点序列。
    pub fn with_points(mut self, filter: SegmentFilter, points: &[RatioPoint]) -> Self {
        self.responses.insert(filter, Ok(series_response("kw", points)));
        self
    }

    /// 预设某过滤条件下的失败。
    pub fn with_failure(mut self, filter: SegmentFilter, error: TrendError) -> Self {
        self.responses.insert(filter, Err(error));
        self
    }

    /// 返回迄今收到的全部查询。
    pub async fn calls(&self) -> Vec<TrendQuery> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TrendProvider for ScriptedTrendProvider {
    async fn query(&self, query: &TrendQuery) -> Result<SeriesResponse, TrendError> {
        self.calls.lock().await.push(query.clone());
        self.responses
            .get(&query.filter)
            .cloned()
            .unwrap_or_else(|| Ok(SeriesResponse::default()))
    }
}

/// 把数据点包装为单组原始响应。
pub fn series_response(title: &str, points: &[RatioPoint]) -> SeriesResponse {
    SeriesResponse {
        results: Some(vec![SeriesGroup {
            title: Some(title.to_string()),
            data: Some(
                points
                    .iter()
                    .map(|p| RawSample {
                        period: Some(p.period.clone()),
                        ratio: serde_json::json!(p.ratio),
                    })
                    .collect(),
            ),
        }]),
    }
}

/// # Summary
/// 返回固定关键词统计的检索量数据源。
pub struct StaticVolumeProvider {
    result: Result<Vec<KeywordStat>, VolumeError>,
}

impl StaticVolumeProvider {
    pub fn new(stats: Vec<KeywordStat>) -> Self {
        Self { result: Ok(stats) }
    }

    pub fn failing(error: VolumeError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl VolumeProvider for StaticVolumeProvider {
    async fn keyword_stats(&self, _hint: &str) -> Result<Vec<KeywordStat>, VolumeError> {
        self.result.clone()
    }
}

/// # Summary
/// 只计数不等待的节流器。
#[derive(Debug, Default)]
pub struct CountingLimiter {
    acquired: AtomicUsize,
}

impl CountingLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }
}
