use kwlens_core::trend::entity::{RatioPoint, SeriesGroup, SeriesResponse};
use serde_json::Value;
use std::collections::BTreeMap;

/// # Summary
/// 将原始 `ratio` 字段数值化。
///
/// # Logic
/// 1. 数字直接取值，字符串尝试按浮点数解析。
/// 2. 缺失、非数值、非有限值或负数一律记为 0。
pub fn ratio_value(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

fn group_sum(group: &SeriesGroup) -> f64 {
    group.samples().iter().map(|s| ratio_value(&s.ratio)).sum()
}

/// # Summary
/// 第一个 (或唯一一个) 结果组的比例和。
///
/// # Returns
/// 没有结果组时返回 0.0。
pub fn ratio_sum(response: &SeriesResponse) -> f64 {
    response.groups().first().map(group_sum).unwrap_or(0.0)
}

/// # Summary
/// 多关键词组查询中，组名到比例和的映射。
///
/// # Invariants
/// - 缺失组名记为空字符串；重名时后出现的组覆盖先出现的组。
pub fn ratio_sums_by_group(response: &SeriesResponse) -> BTreeMap<String, f64> {
    response
        .groups()
        .iter()
        .map(|g| (g.title.clone().unwrap_or_default(), group_sum(g)))
        .collect()
}

/// # Summary
/// 第一个结果组的数据点序列。
///
/// # Logic
/// 1. 周期标签与比例值原样保留 (比例按 `ratio_value` 数值化)。
/// 2. 按周期标签稳定排序，保证升序。
pub fn ratio_points(response: &SeriesResponse) -> Vec<RatioPoint> {
    let mut points: Vec<RatioPoint> = response
        .groups()
        .first()
        .map(|g| {
            g.samples()
                .iter()
                .map(|s| RatioPoint::new(s.period.clone().unwrap_or_default(), ratio_value(&s.ratio)))
                .collect()
        })
        .unwrap_or_default();
    points.sort_by(|a, b| a.period.cmp(&b.period));
    points
}

/// 第一个结果组是否包含至少一个采样点。
pub fn has_samples(response: &SeriesResponse) -> bool {
    response
        .groups()
        .first()
        .is_some_and(|g| !g.samples().is_empty())
}
