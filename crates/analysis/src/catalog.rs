use crate::buckets::AgeScheme;
use kwlens_core::analysis::entity::Segment;
use kwlens_core::common::{AgeCode, Device, Gender};
use kwlens_core::trend::entity::SegmentFilter;

/// # Summary
/// 各分类维度的分段定义表。
///
/// # Invariants
/// - 纯数据，由调用方注入分析器；替换表即可改变分段方式而无需修改逻辑。
/// - 列表顺序即输出顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCatalog {
    // 性别及其展示标签
    pub genders: Vec<(Gender, String)>,
    // 参与设备拆分的设备
    pub devices: Vec<Device>,
    // 单维度年龄分析逐一查询的细分代码
    pub fine_age_codes: Vec<AgeCode>,
    // 单维度年龄分析的汇总方案
    pub decade_scheme: AgeScheme,
    // 按设备拆分时的年龄方案
    pub device_scheme: AgeScheme,
}

impl Default for SegmentCatalog {
    fn default() -> Self {
        Self {
            genders: Gender::ALL.iter().map(|g| (*g, g.to_string())).collect(),
            devices: Device::ALL.to_vec(),
            fine_age_codes: AgeCode::ALL.to_vec(),
            decade_scheme: AgeScheme::decade(),
            device_scheme: AgeScheme::device_aligned(),
        }
    }
}

impl SegmentCatalog {
    /// 每个性别一个分段。
    pub fn gender_segments(&self) -> Vec<Segment> {
        self.genders
            .iter()
            .map(|(gender, label)| Segment::new(label.clone(), SegmentFilter::gender(*gender)))
            .collect()
    }

    /// 每个细分年龄代码一个分段，标签为代码本身。
    pub fn fine_age_segments(&self) -> Vec<Segment> {
        self.fine_age_codes
            .iter()
            .map(|code| Segment::new(code.to_string(), SegmentFilter::ages([*code])))
            .collect()
    }

    /// 性别 × 设备。
    pub fn gender_device_segments(&self) -> Vec<Segment> {
        self.devices
            .iter()
            .flat_map(|device| {
                self.genders.iter().map(move |(gender, label)| {
                    Segment::new(label.clone(), SegmentFilter::gender(*gender).with_device(*device))
                })
            })
            .collect()
    }

    /// # Summary
    /// 年龄段 × 设备。
    ///
    /// # Logic
    /// 每个 (年龄段, 设备) 发起一次查询，过滤条件携带该年龄段的全部代码，
    /// 由上游直接返回年龄段合计，无需再做汇总。
    pub fn age_device_segments(&self) -> Vec<Segment> {
        self.devices
            .iter()
            .flat_map(|device| {
                self.device_scheme.buckets().iter().map(move |bucket| {
                    Segment::new(
                        bucket.label.clone(),
                        SegmentFilter::ages(bucket.codes.iter().copied()).with_device(*device),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_segment_counts() {
        let catalog = SegmentCatalog::default();
        assert_eq!(catalog.gender_segments().len(), 2);
        assert_eq!(catalog.fine_age_segments().len(), 11);
        assert_eq!(catalog.gender_device_segments().len(), 4);
        assert_eq!(catalog.age_device_segments().len(), 14);
    }

    #[test]
    fn test_segment_labels_and_devices() {
        let catalog = SegmentCatalog::default();
        let genders = catalog.gender_segments();
        assert_eq!(genders[0].label, "male");
        assert_eq!(genders[0].device, None);

        let ages = catalog.fine_age_segments();
        assert_eq!(ages[10].label, "11");

        let by_device = catalog.age_device_segments();
        assert_eq!(by_device[0].label, "0-12");
        assert_eq!(by_device[0].device, Some(Device::Pc));
        assert_eq!(by_device[13].label, "50+");
        assert_eq!(by_device[13].device, Some(Device::Mobile));
        assert_eq!(by_device[13].filter.ages.len(), 3);
    }
}
