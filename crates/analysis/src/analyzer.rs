use crate::catalog::SegmentCatalog;
use crate::fanout::{FanoutReport, SegmentFanout};
use crate::normalizer::{ProportionNormalizer, ProportionTable};
use crate::trend::TrendFetcher;
use crate::volume::{VolumeEstimator, resolve_anchors};
use crate::window::QueryWindow;
use kwlens_core::analysis::entity::{FanoutSummary, SegmentScalar};
use kwlens_core::analysis::error::AnalysisError;
use kwlens_core::common::time::TimeProvider;
use kwlens_core::common::{AgeCode, Device, TimeUnit};
use kwlens_core::config::AnalysisConfig;
use kwlens_core::limiter::port::RateLimiter;
use kwlens_core::trend::entity::RatioPoint;
use kwlens_core::trend::port::TrendProvider;
use kwlens_core::volume::entity::{AnchorVolume, KeywordStat, VolumeEstimate};
use kwlens_core::volume::error::VolumeError;
use kwlens_core::volume::port::VolumeProvider;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// # Summary
/// 分析器运行参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerSettings {
    // 分段扇出回溯天数 (日粒度)
    pub segment_window_days: u32,
    // 月度趋势回溯天数
    pub trend_window_days: u32,
    // 占比合计容差
    pub proportion_tolerance: f64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalyzerSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            segment_window_days: config.segment_window_days,
            trend_window_days: config.trend_window_days,
            proportion_tolerance: config.proportion_tolerance,
        }
    }
}

/// 单个维度的占比结果及扇出统计。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProportionReport {
    pub proportions: ProportionTable,
    pub summary: FanoutSummary,
}

/// 按设备拆分的性别与年龄占比。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceProportions {
    pub gender: ProportionReport,
    pub age: ProportionReport,
}

/// # Summary
/// 完整报告中可单独请求的部分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Gender,
    Age,
    Device,
    Trend,
    Volume,
    Related,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Gender,
        Section::Age,
        Section::Device,
        Section::Trend,
        Section::Volume,
        Section::Related,
    ];
}

/// # Summary
/// 单个关键词的完整分析报告。
///
/// # Invariants
/// - 未请求的部分不出现在序列化结果中。
/// - 任何部分失败都只会记录到 `notes`，不会让整个报告失败。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordReport {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<ProportionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<ProportionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_device: Option<DeviceProportions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<RatioPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_by_device: Option<BTreeMap<Device, Vec<RatioPoint>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchors: Option<Vec<AnchorVolume>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Vec<VolumeEstimate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<KeywordStat>>,
    // 部分失败说明
    pub notes: Vec<String>,
}

/// # Summary
/// 关键词分析门面：把扇出、归一化、趋势查询与估算组合到端口之上。
///
/// # Invariants
/// - 上游失败只会降级为 0 或空序列，不会向调用方传播。
/// - 查询窗口统一从注入的时钟计算。
pub struct KeywordAnalyzer {
    trends: Arc<dyn TrendProvider>,
    volumes: Option<Arc<dyn VolumeProvider>>,
    limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn TimeProvider>,
    catalog: SegmentCatalog,
    settings: AnalyzerSettings,
    estimator: VolumeEstimator,
}

impl KeywordAnalyzer {
    pub fn new(
        trends: Arc<dyn TrendProvider>,
        limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            trends,
            volumes: None,
            limiter,
            clock,
            catalog: SegmentCatalog::default(),
            settings: AnalyzerSettings::default(),
            estimator: VolumeEstimator::default(),
        }
    }

    pub fn with_volume_provider(mut self, volumes: Arc<dyn VolumeProvider>) -> Self {
        self.volumes = Some(volumes);
        self
    }

    pub fn with_catalog(mut self, catalog: SegmentCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_settings(mut self, settings: AnalyzerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_estimator(mut self, estimator: VolumeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    fn fanout(&self) -> SegmentFanout {
        SegmentFanout::new(self.trends.clone(), self.limiter.clone())
    }

    fn fetcher(&self) -> TrendFetcher {
        TrendFetcher::new(self.trends.clone(), self.limiter.clone())
    }

    fn normalizer(&self) -> ProportionNormalizer {
        ProportionNormalizer::new(self.settings.proportion_tolerance)
    }

    fn segment_window(&self) -> QueryWindow {
        QueryWindow::trailing(self.clock.today(), self.settings.segment_window_days)
    }

    fn trend_window(&self) -> QueryWindow {
        QueryWindow::trailing(self.clock.today(), self.settings.trend_window_days)
    }

    /// # Summary
    /// 性别占比。
    ///
    /// # Logic
    /// 1. 每个性别在同一日粒度窗口内查询一次。
    /// 2. 比例和作为标量，归一化为百分比。
    pub async fn compute_gender_proportions(&self, keyword: &str) -> ProportionReport {
        info!("computing gender proportions for '{}'", keyword);
        let report = self
            .fanout()
            .run(keyword, &self.segment_window(), TimeUnit::Date, self.catalog.gender_segments())
            .await;
        self.proportion_report(&report, &report.scalars())
    }

    /// # Summary
    /// 年龄占比。
    ///
    /// # Logic
    /// 1. 11 个细分年龄代码各查询一次。
    /// 2. 按十年方案汇总到年龄段后再归一化，失败代码按 0 计入。
    pub async fn compute_age_proportions(&self, keyword: &str) -> ProportionReport {
        info!("computing age proportions for '{}'", keyword);
        let report = self
            .fanout()
            .run(keyword, &self.segment_window(), TimeUnit::Date, self.catalog.fine_age_segments())
            .await;
        let collapsed = self.catalog.decade_scheme.collapse(&fine_age_scalars(&report));
        self.proportion_report(&report, &collapsed)
    }

    /// # Summary
    /// 按设备拆分的性别与年龄占比。
    ///
    /// # Logic
    /// 1. 性别 × 设备、年龄段 × 设备分别扇出。
    /// 2. 每个设备分组独立归一化。
    pub async fn compute_proportions_by_device(&self, keyword: &str) -> DeviceProportions {
        info!("computing device-split proportions for '{}'", keyword);
        let window = self.segment_window();
        let fanout = self.fanout();
        let gender = fanout
            .run(keyword, &window, TimeUnit::Date, self.catalog.gender_device_segments())
            .await;
        let age = fanout
            .run(keyword, &window, TimeUnit::Date, self.catalog.age_device_segments())
            .await;
        DeviceProportions {
            gender: self.proportion_report(&gender, &gender.scalars()),
            age: self.proportion_report(&age, &age.scalars()),
        }
    }

    fn proportion_report(&self, report: &FanoutReport, scalars: &[SegmentScalar]) -> ProportionReport {
        ProportionReport {
            proportions: self.normalizer().normalize(scalars),
            summary: report.summary(),
        }
    }

    /// 全量月度趋势，失败时返回空序列。
    pub async fn compute_monthly_trend(&self, keyword: &str) -> Vec<RatioPoint> {
        self.monthly_trend(keyword).await.0
    }

    /// 按设备的月度趋势，单个设备失败时该设备为空序列。
    pub async fn compute_monthly_trend_by_device(&self, keyword: &str) -> BTreeMap<Device, Vec<RatioPoint>> {
        self.monthly_trend_by_device(keyword).await.0
    }

    async fn monthly_trend(&self, keyword: &str) -> (Vec<RatioPoint>, Option<String>) {
        info!("fetching monthly trend for '{}'", keyword);
        match self.fetcher().fetch(keyword, &self.trend_window(), None).await {
            Ok(points) => (points, None),
            Err(e) => {
                warn!("monthly trend for '{}' failed: {}", keyword, e);
                (Vec::new(), Some(format!("trend: {}", e)))
            }
        }
    }

    async fn monthly_trend_by_device(
        &self,
        keyword: &str,
    ) -> (BTreeMap<Device, Vec<RatioPoint>>, Vec<String>) {
        info!("fetching monthly trend by device for '{}'", keyword);
        let fetched = self
            .fetcher()
            .fetch_by_device(keyword, &self.trend_window(), &self.catalog.devices)
            .await;
        let mut series = BTreeMap::new();
        let mut notes = Vec::new();
        for (device, result) in fetched {
            match result {
                Ok(points) => {
                    series.insert(device, points);
                }
                Err(e) => {
                    warn!("monthly trend for '{}' on {} failed: {}", keyword, device, e);
                    notes.push(format!("trend@{}: {}", device, e));
                    series.insert(device, Vec::new());
                }
            }
        }
        (series, notes)
    }

    /// # Summary
    /// 用锚点把按设备的相对趋势换算为绝对检索量。
    ///
    /// # Returns
    /// 输入结构非法 (重复锚点、负比例、未知基准周期、溢出) 时返回 `AnalysisError`。
    pub fn estimate_absolute_volume(
        &self,
        trend_by_device: &BTreeMap<Device, Vec<RatioPoint>>,
        anchors: &[AnchorVolume],
    ) -> Result<Vec<VolumeEstimate>, AnalysisError> {
        self.estimator.estimate(trend_by_device, anchors)
    }

    fn volume_provider(&self) -> Result<&Arc<dyn VolumeProvider>, VolumeError> {
        self.volumes
            .as_ref()
            .ok_or_else(|| VolumeError::Config("keyword volume source is not configured".to_string()))
    }

    async fn keyword_stats(&self, keyword: &str) -> Result<Vec<KeywordStat>, VolumeError> {
        let provider = self.volume_provider()?;
        self.limiter.acquire().await;
        provider.keyword_stats(keyword).await
    }

    /// 查询关键词本身最近完整月的各设备检索量，作为估算锚点。
    pub async fn fetch_anchors(&self, keyword: &str) -> Result<Vec<AnchorVolume>, VolumeError> {
        let stats = self.keyword_stats(keyword).await?;
        Ok(resolve_anchors(keyword, &stats))
    }

    /// 关联关键词，按合计检索量降序。
    pub async fn related_keywords(&self, keyword: &str) -> Result<Vec<KeywordStat>, VolumeError> {
        let mut stats = self.keyword_stats(keyword).await?;
        stats.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(stats)
    }

    /// 生成包含全部部分的报告。
    pub async fn analyze(&self, keyword: &str) -> KeywordReport {
        self.analyze_sections(keyword, &Section::ALL).await
    }

    /// # Summary
    /// 生成只包含指定部分的报告。
    ///
    /// # Logic
    /// 1. 按固定顺序逐个计算请求的部分。
    /// 2. 扇出失败、趋势失败、检索量失败都写入 `notes`。
    /// 3. 估算检索量时复用已经取得的按设备趋势。
    pub async fn analyze_sections(&self, keyword: &str, sections: &[Section]) -> KeywordReport {
        let wants = |s: Section| sections.contains(&s);
        let mut report = KeywordReport {
            keyword: keyword.to_string(),
            ..KeywordReport::default()
        };

        if wants(Section::Gender) {
            let gender = self.compute_gender_proportions(keyword).await;
            push_fanout_notes(&mut report.notes, "gender", &gender.summary);
            report.gender = Some(gender);
        }
        if wants(Section::Age) {
            let age = self.compute_age_proportions(keyword).await;
            push_fanout_notes(&mut report.notes, "age", &age.summary);
            report.age = Some(age);
        }
        if wants(Section::Device) {
            let by_device = self.compute_proportions_by_device(keyword).await;
            push_fanout_notes(&mut report.notes, "gender by device", &by_device.gender.summary);
            push_fanout_notes(&mut report.notes, "age by device", &by_device.age.summary);
            report.by_device = Some(by_device);
        }
        if wants(Section::Trend) {
            let (trend, note) = self.monthly_trend(keyword).await;
            report.notes.extend(note);
            report.trend = Some(trend);
            let (by_device, notes) = self.monthly_trend_by_device(keyword).await;
            report.notes.extend(notes);
            report.trend_by_device = Some(by_device);
        }
        if wants(Section::Volume) {
            self.fill_volume(keyword, &mut report).await;
        }
        if wants(Section::Related) {
            match self.related_keywords(keyword).await {
                Ok(related) => report.related = Some(related),
                Err(e) => report.notes.push(format!("related keywords: {}", e)),
            }
        }

        info!("report for '{}' finished with {} notes", keyword, report.notes.len());
        report
    }

    async fn fill_volume(&self, keyword: &str, report: &mut KeywordReport) {
        let anchors = match self.fetch_anchors(keyword).await {
            Ok(anchors) => anchors,
            Err(e) => {
                warn!("anchor lookup for '{}' failed: {}", keyword, e);
                report.notes.push(format!("volume anchors: {}", e));
                return;
            }
        };
        let by_device = match &report.trend_by_device {
            Some(series) => series.clone(),
            None => {
                let (series, notes) = self.monthly_trend_by_device(keyword).await;
                report.notes.extend(notes);
                series
            }
        };
        match self.estimate_absolute_volume(&by_device, &anchors) {
            Ok(volume) => report.volume = Some(volume),
            Err(e) => report.notes.push(format!("volume estimate: {}", e)),
        }
        report.anchors = Some(anchors);
    }
}

/// 从细分年龄扇出结果中按年龄代码取标量。
fn fine_age_scalars(report: &FanoutReport) -> BTreeMap<AgeCode, f64> {
    report
        .results()
        .iter()
        .filter_map(|r| match r.segment.filter.ages.as_slice() {
            [code] => Some((*code, r.outcome.scalar())),
            _ => None,
        })
        .collect()
}

fn push_fanout_notes(notes: &mut Vec<String>, dimension: &str, summary: &FanoutSummary) {
    if summary.failed == 0 {
        return;
    }
    let total = summary.succeeded + summary.empty + summary.failed;
    let detail: Vec<String> = summary
        .failures
        .iter()
        .map(|(label, reason)| format!("{} ({})", label, reason))
        .collect();
    notes.push(format!(
        "{}: {} of {} segments failed: {}",
        dimension,
        summary.failed,
        total,
        detail.join(", ")
    ));
}
