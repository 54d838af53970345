use crate::common::{AgeCode, Device, Gender, TimeUnit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// # Summary
/// 相对比例序列中的单个数据点。
///
/// # Invariants
/// - `ratio` 非负且有限。
/// - 序列内按 `period` 升序排列，返回后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPoint {
    // 统计周期标签 ("YYYY-MM-DD" 或 "YYYY-MM")
    pub period: String,
    // 上游归一化后的相对值
    pub ratio: f64,
}

impl RatioPoint {
    pub fn new(period: impl Into<String>, ratio: f64) -> Self {
        Self {
            period: period.into(),
            ratio,
        }
    }
}

/// # Summary
/// 单次查询附加的分段过滤条件。
///
/// # Invariants
/// - 空过滤条件代表全量 (无分段) 查询。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentFilter {
    // 性别过滤
    pub gender: Option<Gender>,
    // 年龄代码过滤 (为空代表不过滤)
    pub ages: Vec<AgeCode>,
    // 设备过滤
    pub device: Option<Device>,
}

impl SegmentFilter {
    pub fn gender(gender: Gender) -> Self {
        Self {
            gender: Some(gender),
            ..Self::default()
        }
    }

    pub fn ages(ages: impl IntoIterator<Item = AgeCode>) -> Self {
        Self {
            ages: ages.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn device(device: Device) -> Self {
        Self {
            device: Some(device),
            ..Self::default()
        }
    }

    /// 在现有条件上叠加设备过滤。
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }
}

/// # Summary
/// 交给 `TrendProvider` 执行的一次上游查询。
///
/// # Invariants
/// - `start <= end`。
/// - 一次查询只包含一个关键词组，组名即关键词本身。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrendQuery {
    // 查询关键词
    pub keyword: String,
    // 窗口开始日期 (含)
    pub start: NaiveDate,
    // 窗口结束日期 (含)
    pub end: NaiveDate,
    // 时间粒度
    pub time_unit: TimeUnit,
    // 分段过滤
    pub filter: SegmentFilter,
}

/// # Summary
/// 上游单次查询的原始响应。
///
/// # Invariants
/// - 所有字段均可缺失，缺失时按空序列处理，解析永不因字段缺失而失败。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesResponse {
    #[serde(default)]
    pub results: Option<Vec<SeriesGroup>>,
}

impl SeriesResponse {
    /// 以切片形式返回结果组，缺失时返回空切片。
    pub fn groups(&self) -> &[SeriesGroup] {
        self.results.as_deref().unwrap_or_default()
    }
}

/// # Summary
/// 响应中的一个关键词组结果。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesGroup {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<RawSample>>,
}

impl SeriesGroup {
    pub fn samples(&self) -> &[RawSample] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// # Summary
/// 原始采样点。
///
/// # Invariants
/// - `ratio` 保留原始 JSON 值，数值化由提取器负责 (数字、数字字符串均可接受)。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub ratio: serde_json::Value,
}
