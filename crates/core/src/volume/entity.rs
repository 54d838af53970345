use crate::common::Device;
use serde::{Deserialize, Serialize};

/// # Summary
/// 某渠道最近一个完整周期的绝对检索量，用作把相对序列换算为绝对值的锚点。
///
/// # Invariants
/// - 每个渠道最多一个锚点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorVolume {
    pub channel: Device,
    pub absolute_count: u64,
}

impl AnchorVolume {
    pub fn new(channel: Device, absolute_count: u64) -> Self {
        Self {
            channel,
            absolute_count,
        }
    }
}

/// # Summary
/// 某周期、某渠道的绝对检索量估算值。
///
/// # Invariants
/// - 结果列表按 `period` 升序，同一周期内按渠道顺序排列。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEstimate {
    pub period: String,
    pub channel: Device,
    pub absolute_count: u64,
}

/// # Summary
/// SearchAd 关键词工具返回的一行关键词统计。
///
/// # Invariants
/// - `total == pc + mobile`。
/// - 低于上游披露下限 (如 "< 10") 的计数已被替换为代表值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStat {
    // 关联关键词
    pub keyword: String,
    // 最近完整月 PC 检索量
    pub pc: u64,
    // 最近完整月移动端检索量
    pub mobile: u64,
    // 合计
    pub total: u64,
    // 竞争度 (上游原样透传，如 "높음"/"중간"/"낮음")
    pub competition: String,
}

impl KeywordStat {
    pub fn new(keyword: impl Into<String>, pc: u64, mobile: u64, competition: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            pc,
            mobile,
            total: pc.saturating_add(mobile),
            competition: competition.into(),
        }
    }

    /// 按渠道取计数。
    pub fn count_for(&self, device: Device) -> u64 {
        match device {
            Device::Pc => self.pc,
            Device::Mobile => self.mobile,
        }
    }
}
