use kwlens_analysis::volume::VolumeEstimator;
use kwlens_core::analysis::error::AnalysisError;
use kwlens_core::common::Device;
use kwlens_core::trend::entity::RatioPoint;
use kwlens_core::volume::entity::AnchorVolume;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn points(raw: &[(&str, f64)]) -> Vec<RatioPoint> {
    raw.iter().map(|(p, r)| RatioPoint::new(*p, *r)).collect()
}

fn trend<const N: usize>(entries: [(Device, Vec<RatioPoint>); N]) -> BTreeMap<Device, Vec<RatioPoint>> {
    BTreeMap::from(entries)
}

#[test]
fn test_all_zero_channel_never_divides() {
    let input = trend([(Device::Pc, points(&[("2025-01", 0.0), ("2025-02", 0.0)]))]);
    let estimator = VolumeEstimator::new();
    let anchors = [AnchorVolume::new(Device::Pc, 500)];

    let scales = estimator.channel_scales(&input, &anchors).unwrap();
    assert_eq!(scales[&Device::Pc], dec!(0));

    let estimates = estimator.estimate(&input, &anchors).unwrap();
    assert_eq!(estimates.len(), 2);
    assert!(estimates.iter().all(|e| e.absolute_count == 0));
}

#[test]
fn test_channels_scale_independently() {
    let input = trend([
        (Device::Pc, points(&[("2025-01", 50.0), ("2025-02", 100.0), ("2025-03", 20.0)])),
        (Device::Mobile, points(&[("2025-01", 100.0), ("2025-02", 25.0), ("2025-03", 80.0)])),
    ]);
    let anchors = [AnchorVolume::new(Device::Pc, 1000), AnchorVolume::new(Device::Mobile, 50)];
    let scales = VolumeEstimator::new().channel_scales(&input, &anchors).unwrap();
    assert_eq!(scales[&Device::Pc], dec!(10));
    assert_eq!(scales[&Device::Mobile], dec!(2));

    let estimates = VolumeEstimator::new().estimate(&input, &anchors).unwrap();
    let rows: Vec<(&str, Device, u64)> = estimates
        .iter()
        .map(|e| (e.period.as_str(), e.channel, e.absolute_count))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2025-01", Device::Pc, 500),
            ("2025-01", Device::Mobile, 200),
            ("2025-02", Device::Pc, 1000),
            ("2025-02", Device::Mobile, 50),
            ("2025-03", Device::Pc, 200),
            ("2025-03", Device::Mobile, 160),
        ]
    );
}

#[test]
fn test_missing_periods_count_as_zero() {
    let input = trend([
        (Device::Pc, points(&[("2025-01", 10.0), ("2025-02", 20.0), ("2025-03", 5.0)])),
        (Device::Mobile, points(&[("2025-02", 40.0)])),
    ]);
    let anchors = [AnchorVolume::new(Device::Pc, 200), AnchorVolume::new(Device::Mobile, 400)];
    let estimates = VolumeEstimator::new().estimate(&input, &anchors).unwrap();
    let mobile: Vec<u64> = estimates
        .iter()
        .filter(|e| e.channel == Device::Mobile)
        .map(|e| e.absolute_count)
        .collect();
    assert_eq!(mobile, vec![0, 400, 0]);
}

#[test]
fn test_single_period_uses_last() {
    let input = trend([(Device::Pc, points(&[("2025-01", 4.0)]))]);
    let estimates = VolumeEstimator::new()
        .estimate(&input, &[AnchorVolume::new(Device::Pc, 10)])
        .unwrap();
    assert_eq!(estimates[0].absolute_count, 10);
}

#[test]
fn test_contract_violations() {
    let input = trend([(Device::Pc, points(&[("2025-01", 4.0), ("2025-02", 8.0)]))]);

    let duplicate = VolumeEstimator::new().estimate(
        &input,
        &[AnchorVolume::new(Device::Pc, 1), AnchorVolume::new(Device::Pc, 2)],
    );
    assert_eq!(duplicate, Err(AnalysisError::DuplicateAnchor(Device::Pc)));

    let unknown = VolumeEstimator::new()
        .with_reference_period("2024-12")
        .estimate(&input, &[]);
    assert_eq!(unknown, Err(AnalysisError::UnknownReferencePeriod("2024-12".into())));

    let negative = trend([(Device::Mobile, points(&[("2025-01", -1.0)]))]);
    assert!(matches!(
        VolumeEstimator::new().estimate(&negative, &[]),
        Err(AnalysisError::InvalidRatio { channel: Device::Mobile, .. })
    ));

    let nan = trend([(Device::Pc, points(&[("2025-01", f64::NAN)]))]);
    assert!(matches!(
        VolumeEstimator::new().estimate(&nan, &[]),
        Err(AnalysisError::InvalidRatio { .. })
    ));
}

#[test]
fn test_month_override_matches_dated_labels() {
    let input = trend([(
        Device::Pc,
        points(&[("2024-11-01", 40.0), ("2024-12-01", 80.0), ("2025-01-01", 10.0)]),
    )]);
    let anchors = [AnchorVolume::new(Device::Pc, 800)];

    let estimates = VolumeEstimator::new()
        .with_reference_period("2024-11")
        .estimate(&input, &anchors)
        .unwrap();
    let counts: Vec<u64> = estimates.iter().map(|e| e.absolute_count).collect();
    assert_eq!(counts, vec![800, 1600, 200]);
    assert_eq!(estimates[0].period, "2024-11-01");

    let prefix_only = VolumeEstimator::new()
        .with_reference_period("2024-1")
        .estimate(&input, &anchors);
    assert_eq!(prefix_only, Err(AnalysisError::UnknownReferencePeriod("2024-1".into())));
}

#[test]
fn test_unrepresentable_reference_ratio_scales_to_zero() {
    let input = trend([(Device::Pc, points(&[("2025-01", 1e-30), ("2025-02", 1e-30)]))]);
    let anchors = [AnchorVolume::new(Device::Pc, 800)];

    let scales = VolumeEstimator::new().channel_scales(&input, &anchors).unwrap();
    assert_eq!(scales[&Device::Pc], dec!(0));

    let estimates = VolumeEstimator::new().estimate(&input, &anchors).unwrap();
    assert_eq!(estimates.len(), 2);
    assert!(estimates.iter().all(|e| e.absolute_count == 0));
}
