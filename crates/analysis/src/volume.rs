use kwlens_core::analysis::error::AnalysisError;
use kwlens_core::common::Device;
use kwlens_core::trend::entity::RatioPoint;
use kwlens_core::volume::entity::{AnchorVolume, KeywordStat, VolumeEstimate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// # Summary
/// 绝对检索量估算器：用每个渠道的一个绝对量锚点把相对比例序列换算为绝对值。
///
/// # Invariants
/// - 每个渠道的缩放系数独立计算，互不共享。
/// - 所有舍入均为十进制银行家舍入，结果非负。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeEstimator {
    reference_period: Option<String>,
}

impl VolumeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 显式指定基准周期，替代"倒数第二个周期"的默认规则。
    /// `2024-12` 同时匹配 `2024-12` 和 `2024-12-01` 这类带日期的月度标签。
    pub fn with_reference_period(mut self, period: impl Into<String>) -> Self {
        self.reference_period = Some(period.into());
        self
    }

    /// # Summary
    /// 计算每个渠道的缩放系数。
    ///
    /// # Logic
    /// 1. 校验锚点唯一、比例非负且有限。
    /// 2. 求全部周期标签的有序并集。
    /// 3. 选定基准周期：显式指定，或并集的倒数第二个 (不足两个时取最后一个)。
    ///    锚点代表最近一个"完整"周期，而最后一个周期通常尚未结束。
    /// 4. 基准周期比例为 0 时，从并集末尾向前找第一个正比例。
    /// 5. `scale = anchor / reference_ratio`，基准比例为 0 或没有锚点时为 0。
    ///
    /// # Returns
    /// 渠道到缩放系数的映射；周期并集为空时返回空映射。
    pub fn channel_scales(
        &self,
        trend_by_device: &BTreeMap<Device, Vec<RatioPoint>>,
        anchors: &[AnchorVolume],
    ) -> Result<BTreeMap<Device, Decimal>, AnalysisError> {
        let anchors = index_anchors(anchors)?;
        validate_ratios(trend_by_device)?;

        let periods = period_union(trend_by_device);
        let Some(reference) = self.pick_reference(&periods)? else {
            return Ok(BTreeMap::new());
        };

        let mut scales = BTreeMap::new();
        for (device, points) in trend_by_device {
            let ratios = ratio_lookup(points);
            let mut reference_ratio = ratios.get(reference).copied().unwrap_or(0.0);
            if reference_ratio <= 0.0 {
                reference_ratio = periods
                    .iter()
                    .rev()
                    .filter_map(|p| ratios.get(p.as_str()).copied())
                    .find(|r| *r > 0.0)
                    .unwrap_or(0.0);
            }

            let anchor = anchors.get(device).copied().unwrap_or(0);
            let scale = channel_scale(anchor, reference_ratio).unwrap_or_else(|| {
                warn!(
                    "channel {} reference ratio {} is not representable, scale set to 0",
                    device, reference_ratio
                );
                Decimal::ZERO
            });
            debug!(
                "channel {} reference {} ratio {} anchor {} scale {}",
                device, reference, reference_ratio, anchor, scale
            );
            scales.insert(*device, scale);
        }
        Ok(scales)
    }

    /// # Summary
    /// 把每个渠道的相对序列换算为绝对检索量。
    ///
    /// # Logic
    /// 1. 通过 `channel_scales` 求各渠道缩放系数。
    /// 2. 对并集中的每个周期、每个渠道计算 `max(0, round(ratio * scale))`，缺失周期按 0 计。
    ///
    /// # Arguments
    /// * `trend_by_device`: 渠道到月度比例序列。
    /// * `anchors`: 每个渠道至多一个绝对量锚点。
    ///
    /// # Returns
    /// 按 (周期, 渠道) 排序的估算结果；输入结构非法时返回 `AnalysisError`。
    pub fn estimate(
        &self,
        trend_by_device: &BTreeMap<Device, Vec<RatioPoint>>,
        anchors: &[AnchorVolume],
    ) -> Result<Vec<VolumeEstimate>, AnalysisError> {
        let scales = self.channel_scales(trend_by_device, anchors)?;
        if scales.is_empty() {
            return Ok(Vec::new());
        }

        let periods = period_union(trend_by_device);
        let lookups: BTreeMap<Device, HashMap<&str, f64>> = trend_by_device
            .iter()
            .map(|(device, points)| (*device, ratio_lookup(points)))
            .collect();

        let mut estimates = Vec::with_capacity(periods.len().saturating_mul(scales.len()));
        for period in &periods {
            for (device, scale) in &scales {
                let ratio = lookups
                    .get(device)
                    .and_then(|l| l.get(period.as_str()))
                    .copied()
                    .unwrap_or(0.0);
                estimates.push(VolumeEstimate {
                    period: period.clone(),
                    channel: *device,
                    absolute_count: scaled_count(ratio, *scale),
                });
            }
        }
        Ok(estimates)
    }

    fn pick_reference<'a>(&self, periods: &'a [String]) -> Result<Option<&'a str>, AnalysisError> {
        if let Some(wanted) = &self.reference_period {
            return periods
                .iter()
                .find(|p| period_matches(p, wanted))
                .map(|p| Some(p.as_str()))
                .ok_or_else(|| AnalysisError::UnknownReferencePeriod(wanted.clone()));
        }
        let reference = match periods.len() {
            0 => None,
            1 => periods.first(),
            n => periods.get(n - 2),
        };
        Ok(reference.map(String::as_str))
    }
}

fn period_matches(period: &str, wanted: &str) -> bool {
    period
        .strip_prefix(wanted)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

fn index_anchors(anchors: &[AnchorVolume]) -> Result<HashMap<Device, u64>, AnalysisError> {
    let mut indexed = HashMap::with_capacity(anchors.len());
    for anchor in anchors {
        if indexed.insert(anchor.channel, anchor.absolute_count).is_some() {
            return Err(AnalysisError::DuplicateAnchor(anchor.channel));
        }
    }
    Ok(indexed)
}

fn validate_ratios(trend_by_device: &BTreeMap<Device, Vec<RatioPoint>>) -> Result<(), AnalysisError> {
    for (device, points) in trend_by_device {
        if let Some(bad) = points.iter().find(|p| !p.ratio.is_finite() || p.ratio < 0.0) {
            return Err(AnalysisError::InvalidRatio {
                channel: *device,
                period: bad.period.clone(),
                ratio: bad.ratio.to_string(),
            });
        }
    }
    Ok(())
}

fn period_union(trend_by_device: &BTreeMap<Device, Vec<RatioPoint>>) -> Vec<String> {
    trend_by_device
        .values()
        .flatten()
        .map(|p| p.period.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn ratio_lookup(points: &[RatioPoint]) -> HashMap<&str, f64> {
    points.iter().map(|p| (p.period.as_str(), p.ratio)).collect()
}

/// `anchor / ratio`；比例为 0、无法用 `Decimal` 表示或商溢出时返回 `None`。
fn channel_scale(anchor: u64, reference_ratio: f64) -> Option<Decimal> {
    if reference_ratio <= 0.0 {
        return Some(Decimal::ZERO);
    }
    let ratio = Decimal::from_f64_retain(reference_ratio).filter(|r| !r.is_zero())?;
    Decimal::from(anchor).checked_div(ratio)
}

/// `max(0, round(ratio * scale))`，超出 `u64` 时饱和。
fn scaled_count(ratio: f64, scale: Decimal) -> u64 {
    if scale.is_zero() || ratio <= 0.0 {
        return 0;
    }
    let Some(ratio) = Decimal::from_f64_retain(ratio) else {
        return u64::MAX;
    };
    ratio
        .checked_mul(scale)
        .map_or(u64::MAX, |c| c.round().max(Decimal::ZERO).to_u64().unwrap_or(u64::MAX))
}

fn normalize_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// # Summary
/// 从关键词统计中挑出关键词本身的一行，转换为每个设备一个锚点。
///
/// # Logic
/// 1. 关键词与 `relKeyword` 都去掉空白并转小写后比较。
/// 2. 找不到对应行时，两个设备的锚点均为 0。
pub fn resolve_anchors(keyword: &str, stats: &[KeywordStat]) -> Vec<AnchorVolume> {
    let wanted = normalize_keyword(keyword);
    let row = stats.iter().find(|s| normalize_keyword(&s.keyword) == wanted);
    Device::ALL
        .iter()
        .map(|device| AnchorVolume::new(*device, row.map(|r| r.count_for(*device)).unwrap_or(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(&str, f64)]) -> Vec<RatioPoint> {
        points.iter().map(|(p, r)| RatioPoint::new(*p, *r)).collect()
    }

    #[test]
    fn test_reference_is_second_to_last() {
        let mut trend = BTreeMap::new();
        trend.insert(Device::Pc, series(&[("2024-11", 40.0), ("2024-12", 80.0), ("2025-01", 10.0)]));
        let estimates = VolumeEstimator::new()
            .estimate(&trend, &[AnchorVolume::new(Device::Pc, 800)])
            .unwrap();
        let counts: Vec<u64> = estimates.iter().map(|e| e.absolute_count).collect();
        assert_eq!(counts, vec![400, 800, 100]);
    }

    #[test]
    fn test_zero_reference_scans_backward() {
        let mut trend = BTreeMap::new();
        trend.insert(Device::Mobile, series(&[("2024-11", 50.0), ("2024-12", 0.0), ("2025-01", 25.0)]));
        let scales = VolumeEstimator::new()
            .channel_scales(&trend, &[AnchorVolume::new(Device::Mobile, 100)])
            .unwrap();
        // 从末尾向前第一个正比例是 2025-01 的 25
        assert_eq!(scales[&Device::Mobile], Decimal::from(4));
    }

    #[test]
    fn test_missing_anchor_scales_to_zero() {
        let mut trend = BTreeMap::new();
        trend.insert(Device::Pc, series(&[("2025-01", 10.0), ("2025-02", 20.0)]));
        let estimates = VolumeEstimator::new().estimate(&trend, &[]).unwrap();
        assert!(estimates.iter().all(|e| e.absolute_count == 0));
        assert_eq!(estimates.len(), 2);
    }

    #[test]
    fn test_empty_union() {
        let trend: BTreeMap<Device, Vec<RatioPoint>> = BTreeMap::new();
        let estimates = VolumeEstimator::new()
            .estimate(&trend, &[AnchorVolume::new(Device::Pc, 10)])
            .unwrap();
        assert!(estimates.is_empty());
    }

    #[test]
    fn test_rounding_is_half_even() {
        let mut trend = BTreeMap::new();
        trend.insert(Device::Pc, series(&[("2025-01", 2.5), ("2025-02", 1.0), ("2025-03", 3.5)]));
        // 基准为 2025-02 (比例 1)，缩放系数 1
        let estimates = VolumeEstimator::new()
            .estimate(&trend, &[AnchorVolume::new(Device::Pc, 1)])
            .unwrap();
        let counts: Vec<u64> = estimates.iter().map(|e| e.absolute_count).collect();
        assert_eq!(counts, vec![2, 1, 4]);
    }

    #[test]
    fn test_scaled_count_saturates() {
        let huge = Decimal::from(u64::MAX);
        assert_eq!(scaled_count(2.0, huge), u64::MAX);
        assert_eq!(scaled_count(1e10, huge), u64::MAX);
        assert_eq!(scaled_count(0.0, huge), 0);
    }

    #[test]
    fn test_period_matching() {
        assert!(period_matches("2024-12", "2024-12"));
        assert!(period_matches("2024-12-01", "2024-12"));
        assert!(!period_matches("2024-12-01", "2024-1"));
        assert!(!period_matches("2024-11-01", "2024-12"));
    }

    #[test]
    fn test_resolve_anchors_normalizes_keyword() {
        let stats = vec![
            KeywordStat::new("아이폰 케이스", 120, 4500, "높음"),
            KeywordStat::new("아이폰", 9000, 80000, "높음"),
        ];
        let anchors = resolve_anchors("아이폰케이스", &stats);
        assert_eq!(
            anchors,
            vec![AnchorVolume::new(Device::Pc, 120), AnchorVolume::new(Device::Mobile, 4500)]
        );

        let none = resolve_anchors("galaxy", &stats);
        assert!(none.iter().all(|a| a.absolute_count == 0));
    }
}
