use kwlens_core::analysis::entity::{Proportion, SegmentScalar};
use kwlens_core::common::Device;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// 默认允许的组内合计偏差 (百分点)。
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// # Summary
/// 百分比归一化器。
///
/// # Invariants
/// - 每个设备分组 (含"无设备"组) 独立归一化，不同分组之间互不影响。
/// - 结果保留一位小数，舍入后不再二次修正。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionNormalizer {
    tolerance: f64,
}

impl Default for ProportionNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ProportionNormalizer {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// # Summary
    /// 把分段标量换算为百分比占比。
    ///
    /// # Logic
    /// 1. 按 `device` 分组求和。
    /// 2. `pct = round(scalar / total * 100, 1)`，按十进制值做银行家舍入。
    /// 3. 分组合计为 0 时该组全部为 0.0。
    /// 4. 合计偏离 100 超过容差的分组记录告警。
    ///
    /// # Arguments
    /// * `scalars`: 同一分段集合内的标量，顺序即输出顺序。
    ///
    /// # Returns
    /// 与输入一一对应的占比表。
    pub fn normalize(&self, scalars: &[SegmentScalar]) -> ProportionTable {
        let mut totals: BTreeMap<Option<Device>, f64> = BTreeMap::new();
        for scalar in scalars {
            *totals.entry(scalar.device).or_insert(0.0) += scalar.ratio_sum.max(0.0);
        }

        let rows = scalars
            .iter()
            .map(|scalar| {
                let total = totals.get(&scalar.device).copied().unwrap_or(0.0);
                Proportion {
                    label: scalar.label.clone(),
                    device: scalar.device,
                    pct: percentage(scalar.ratio_sum.max(0.0), total),
                }
            })
            .collect();
        let table = ProportionTable { rows };

        for group in table.groups_outside_tolerance(self.tolerance) {
            warn!(
                "proportion group {:?} sums to {:.1}, outside tolerance {}",
                group,
                table.group_sum(group),
                self.tolerance
            );
        }
        table
    }
}

fn percentage(value: f64, total: f64) -> f64 {
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let raw = value / total * 100.0;
    round_tenth(raw)
}

/// 一位小数的银行家舍入；无法表示的值记为 0。
pub(crate) fn round_tenth(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(1))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

/// # Summary
/// 归一化后的占比表。
///
/// # Invariants
/// - 行顺序与输入标量一致。
/// - 任意 `pct` 位于 `[0, 100]`，永不为 NaN。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProportionTable {
    rows: Vec<Proportion>,
}

impl ProportionTable {
    pub fn rows(&self) -> &[Proportion] {
        &self.rows
    }

    /// 按 (标签, 设备) 查找占比。
    pub fn get(&self, label: &str, device: Option<Device>) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.label == label && r.device == device)
            .map(|r| r.pct)
    }

    /// 出现过的设备分组，按首次出现顺序。
    pub fn groups(&self) -> Vec<Option<Device>> {
        let mut groups = Vec::new();
        for row in &self.rows {
            if !groups.contains(&row.device) {
                groups.push(row.device);
            }
        }
        groups
    }

    pub fn group_sum(&self, device: Option<Device>) -> f64 {
        self.rows
            .iter()
            .filter(|r| r.device == device)
            .map(|r| r.pct)
            .sum()
    }

    /// # Summary
    /// 合计偏离 100 超过 `tolerance` 的分组。
    ///
    /// # Invariants
    /// - 全零分组 (退化合计) 不算偏离。
    pub fn groups_outside_tolerance(&self, tolerance: f64) -> Vec<Option<Device>> {
        self.groups()
            .into_iter()
            .filter(|group| {
                let degenerate = self
                    .rows
                    .iter()
                    .filter(|r| r.device == *group)
                    .all(|r| r.pct == 0.0);
                !degenerate && (self.group_sum(*group) - 100.0).abs() > tolerance
            })
            .collect()
    }

    /// 按设备拆分为嵌套结构，无设备的行被忽略。
    pub fn to_nested(&self) -> BTreeMap<Device, Vec<Proportion>> {
        let mut nested: BTreeMap<Device, Vec<Proportion>> = BTreeMap::new();
        for row in &self.rows {
            if let Some(device) = row.device {
                nested.entry(device).or_default().push(row.clone());
            }
        }
        nested
    }
}
