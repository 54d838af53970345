use kwlens_core::analysis::entity::SegmentScalar;
use kwlens_core::analysis::error::AnalysisError;
use kwlens_core::common::AgeCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// # Summary
/// 一个粗粒度年龄段及其吸收的细分年龄代码。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBucket {
    pub label: String,
    pub codes: Vec<AgeCode>,
}

/// # Summary
/// 年龄分桶方案：有序的年龄段列表。
///
/// # Invariants
/// - 每个年龄段至少包含一个代码。
/// - 同一代码不会出现在两个年龄段中，标签互不重复。
/// - 方案是纯数据，在调用时传入，测试可以替换任意方案。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AgeBucket>", into = "Vec<AgeBucket>")]
pub struct AgeScheme {
    buckets: Vec<AgeBucket>,
}

impl AgeScheme {
    /// # Summary
    /// 校验并构造分桶方案。
    ///
    /// # Logic
    /// 1. 拒绝空年龄段。
    /// 2. 拒绝重复标签与重复代码。
    ///
    /// # Returns
    /// 方案非法时返回 `AnalysisError::InvalidScheme`。
    pub fn new(buckets: Vec<AgeBucket>) -> Result<Self, AnalysisError> {
        let mut labels = HashSet::new();
        let mut seen = HashSet::new();
        for bucket in &buckets {
            if bucket.codes.is_empty() {
                return Err(AnalysisError::InvalidScheme(format!(
                    "bucket '{}' has no age codes",
                    bucket.label
                )));
            }
            if !labels.insert(bucket.label.as_str()) {
                return Err(AnalysisError::InvalidScheme(format!(
                    "duplicate bucket label '{}'",
                    bucket.label
                )));
            }
            for code in &bucket.codes {
                if !seen.insert(*code) {
                    return Err(AnalysisError::InvalidScheme(format!(
                        "age code {} assigned twice",
                        code
                    )));
                }
            }
        }
        Ok(Self { buckets })
    }

    /// 单维度分析使用的 5 段 (按十年) 方案，代码 1 (0~12 岁) 不计入。
    pub fn decade() -> Self {
        Self::builtin(&[
            ("10s", &[2]),
            ("20s", &[3, 4]),
            ("30s", &[5, 6]),
            ("40s", &[7, 8]),
            ("50+", &[9, 10, 11]),
        ])
    }

    /// 与设备分段对齐的 7 段方案。
    pub fn device_aligned() -> Self {
        Self::builtin(&[
            ("0-12", &[1]),
            ("13-19", &[2]),
            ("20-24", &[3]),
            ("25-29", &[4]),
            ("30-39", &[5, 6]),
            ("40-49", &[7, 8]),
            ("50+", &[9, 10, 11]),
        ])
    }

    fn builtin(table: &[(&str, &[u8])]) -> Self {
        Self {
            buckets: table
                .iter()
                .map(|(label, codes)| AgeBucket {
                    label: (*label).to_string(),
                    codes: codes.iter().filter_map(|c| AgeCode::new(*c)).collect(),
                })
                .collect(),
        }
    }

    pub fn buckets(&self) -> &[AgeBucket] {
        &self.buckets
    }

    /// # Summary
    /// 把细分年龄代码的标量汇总到年龄段。
    ///
    /// # Logic
    /// 1. 按方案顺序遍历年龄段。
    /// 2. 对年龄段内的代码求和，输入中缺失的代码记为 0。
    /// 3. 不做归一化。
    ///
    /// # Arguments
    /// * `fine`: 细分年龄代码到标量的映射。
    ///
    /// # Returns
    /// 与方案顺序一致的年龄段标量 (无设备分组)。
    pub fn collapse(&self, fine: &BTreeMap<AgeCode, f64>) -> Vec<SegmentScalar> {
        self.buckets
            .iter()
            .map(|bucket| {
                let sum = bucket
                    .codes
                    .iter()
                    .map(|code| fine.get(code).copied().unwrap_or(0.0))
                    .sum();
                SegmentScalar::new(bucket.label.clone(), None, sum)
            })
            .collect()
    }
}

impl TryFrom<Vec<AgeBucket>> for AgeScheme {
    type Error = AnalysisError;

    fn try_from(buckets: Vec<AgeBucket>) -> Result<Self, Self::Error> {
        AgeScheme::new(buckets)
    }
}

impl From<AgeScheme> for Vec<AgeBucket> {
    fn from(scheme: AgeScheme) -> Self {
        scheme.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: u8) -> AgeCode {
        AgeCode::new(c).unwrap()
    }

    fn fine_scalars() -> BTreeMap<AgeCode, f64> {
        AgeCode::ALL
            .iter()
            .map(|c| (*c, f64::from(c.value()) * 10.0))
            .collect()
    }

    #[test]
    fn test_decade_collapse_sums_constituents() {
        let collapsed = AgeScheme::decade().collapse(&fine_scalars());
        let sums: Vec<(&str, f64)> = collapsed
            .iter()
            .map(|s| (s.label.as_str(), s.ratio_sum))
            .collect();
        assert_eq!(
            sums,
            vec![("10s", 20.0), ("20s", 70.0), ("30s", 110.0), ("40s", 150.0), ("50+", 300.0)]
        );
    }

    #[test]
    fn test_device_aligned_covers_all_codes() {
        let scheme = AgeScheme::device_aligned();
        let total: usize = scheme.buckets().iter().map(|b| b.codes.len()).sum();
        assert_eq!(total, AgeCode::ALL.len());
        let collapsed = scheme.collapse(&fine_scalars());
        assert_eq!(collapsed[0].ratio_sum, 10.0);
        assert_eq!(collapsed[6].ratio_sum, 300.0);
    }

    #[test]
    fn test_collapse_is_idempotent_and_tolerates_missing_codes() {
        let mut fine = fine_scalars();
        fine.remove(&code(3));
        let scheme = AgeScheme::decade();
        let first = scheme.collapse(&fine);
        let second = scheme.collapse(&fine);
        assert_eq!(first, second);
        assert_eq!(first[1].ratio_sum, 40.0);
    }

    #[test]
    fn test_invalid_schemes_rejected() {
        let empty = AgeScheme::new(vec![AgeBucket {
            label: "none".into(),
            codes: vec![],
        }]);
        assert!(matches!(empty, Err(AnalysisError::InvalidScheme(_))));

        let overlapping = AgeScheme::new(vec![
            AgeBucket { label: "a".into(), codes: vec![code(1), code(2)] },
            AgeBucket { label: "b".into(), codes: vec![code(2)] },
        ]);
        assert!(matches!(overlapping, Err(AnalysisError::InvalidScheme(_))));
    }

    #[test]
    fn test_custom_scheme_from_json() {
        let scheme: AgeScheme = serde_json::from_str(
            r#"[{"label":"young","codes":[1,2,3]},{"label":"old","codes":[9,10,11]}]"#,
        )
        .unwrap();
        let collapsed = scheme.collapse(&fine_scalars());
        assert_eq!(collapsed[0].ratio_sum, 60.0);
        assert_eq!(collapsed[1].ratio_sum, 300.0);

        let bad: Result<AgeScheme, _> = serde_json::from_str(r#"[{"label":"x","codes":[12]}]"#);
        assert!(bad.is_err());
    }
}
