use crate::common::Device;
use thiserror::Error;

/// # Summary
/// 分析域错误枚举。
///
/// # Invariants
/// - 只用于结构性非法输入 (调用方违反契约)，数据缺失或上游失败不会产生此错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    // 同一渠道提供了多个锚点
    #[error("Duplicate anchor for channel {0}")]
    DuplicateAnchor(Device),
    // 指定的基准周期不在趋势序列中
    #[error("Reference period {0} not present in trend input")]
    UnknownReferencePeriod(String),
    // 比例为负数或非有限值
    #[error("Invalid ratio {ratio} for channel {channel} at {period}")]
    InvalidRatio {
        channel: Device,
        period: String,
        ratio: String,
    },
    // 年龄分桶方案非法
    #[error("Invalid age scheme: {0}")]
    InvalidScheme(String),
}
