use crate::common::Device;
use crate::trend::entity::SegmentFilter;
use crate::trend::error::TrendError;
use serde::{Deserialize, Serialize};

/// # Summary
/// 分类维度中的一个取值 (分段)，对应一次独立的上游查询。
///
/// # Invariants
/// - 同一分段集合内 `(label, device)` 唯一。
/// - `device` 同时作为归一化时的二级分组键。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    // 展示标签
    pub label: String,
    // 二级分组 (设备)
    pub device: Option<Device>,
    // 上游过滤条件
    pub filter: SegmentFilter,
}

impl Segment {
    pub fn new(label: impl Into<String>, filter: SegmentFilter) -> Self {
        let device = filter.device;
        Self {
            label: label.into(),
            device,
            filter,
        }
    }
}

/// # Summary
/// 分段的比例总和，作为该分段在查询窗口内的"相对热度质量"。
///
/// # Invariants
/// - `ratio_sum` 非负。
/// - 只能与同一分段集合 (同窗口、同粒度) 内的其他标量比较。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScalar {
    pub label: String,
    pub device: Option<Device>,
    pub ratio_sum: f64,
}

impl SegmentScalar {
    pub fn new(label: impl Into<String>, device: Option<Device>, ratio_sum: f64) -> Self {
        Self {
            label: label.into(),
            device,
            ratio_sum,
        }
    }
}

/// # Summary
/// 单个分段查询的结果。
///
/// # Invariants
/// - 任何结果都能折算为一个非负标量：失败与空结果均折算为 0.0。
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    // 查询成功且有数据点
    Measured(f64),
    // 查询成功但没有可用数据点
    Empty,
    // 查询失败，保留失败原因
    Failed(TrendError),
}

impl SegmentOutcome {
    pub fn scalar(&self) -> f64 {
        match self {
            SegmentOutcome::Measured(v) => *v,
            SegmentOutcome::Empty | SegmentOutcome::Failed(_) => 0.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SegmentOutcome::Failed(_))
    }
}

/// # Summary
/// 单个分段的查询记录。
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentResult {
    pub segment: Segment,
    pub outcome: SegmentOutcome,
}

impl SegmentResult {
    pub fn to_scalar(&self) -> SegmentScalar {
        SegmentScalar::new(
            self.segment.label.clone(),
            self.segment.device,
            self.outcome.scalar(),
        )
    }
}

/// # Summary
/// 占比结果。
///
/// # Invariants
/// - `pct` 位于 `[0, 100]`，保留一位小数，永不为 NaN。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proportion {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    pub pct: f64,
}

/// # Summary
/// 扇出统计摘要，便于调用方展示"部分成功"状态。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutSummary {
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    // (分段标签, 失败原因)
    pub failures: Vec<(String, String)>,
}
