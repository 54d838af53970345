use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod time;

/// # Summary
/// 检索渠道 (设备) 枚举。
///
/// # Invariants
/// - `code()` 必须与 DataLab 接口的 `device` 参数取值一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    // PC 端
    Pc,
    // 移动端
    Mobile,
}

impl Device {
    /// 按固定顺序列出全部设备。
    pub const ALL: [Device; 2] = [Device::Pc, Device::Mobile];

    /// 上游接口使用的设备代码。
    pub fn code(&self) -> &'static str {
        match self {
            Device::Pc => "pc",
            Device::Mobile => "mo",
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" => Ok(Device::Pc),
            "mo" | "mobile" => Ok(Device::Mobile),
            _ => Err(format!("Unknown Device: {}", s)),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Pc => write!(f, "pc"),
            Device::Mobile => write!(f, "mobile"),
        }
    }
}

/// # Summary
/// 性别枚举。
///
/// # Invariants
/// - `code()` 必须与 DataLab 接口的 `gender` 参数取值一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// # Summary
/// DataLab 细分年龄代码 (1 ~ 11)。
///
/// # Invariants
/// - 内部数值始终落在 `1..=11` 区间内，只能通过 `AgeCode::new` 或 `AgeCode::ALL` 获得。
///
/// | 代码 | 年龄段 |
/// |------|--------|
/// | 1 | 0~12 |
/// | 2 | 13~18 |
/// | 3 | 19~24 |
/// | 4 | 25~29 |
/// | 5 | 30~34 |
/// | 6 | 35~39 |
/// | 7 | 40~44 |
/// | 8 | 45~49 |
/// | 9 | 50~54 |
/// | 10 | 55~59 |
/// | 11 | 60+ |
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct AgeCode(u8);

impl AgeCode {
    /// 最大年龄代码。
    pub const MAX: u8 = 11;

    /// 全部 11 个细分年龄代码，按升序排列。
    pub const ALL: [AgeCode; 11] = [
        AgeCode(1),
        AgeCode(2),
        AgeCode(3),
        AgeCode(4),
        AgeCode(5),
        AgeCode(6),
        AgeCode(7),
        AgeCode(8),
        AgeCode(9),
        AgeCode(10),
        AgeCode(11),
    ];

    /// # Summary
    /// 校验并构造年龄代码。
    ///
    /// # Arguments
    /// * `code`: 原始数值。
    ///
    /// # Returns
    /// 处于 `1..=11` 时返回 `Some`，否则返回 `None`。
    pub fn new(code: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&code).then_some(AgeCode(code))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for AgeCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AgeCode::new(value).ok_or_else(|| format!("Age code out of range: {}", value))
    }
}

impl From<AgeCode> for u8 {
    fn from(code: AgeCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for AgeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// # Summary
/// 趋势查询的时间粒度。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    // 日
    Date,
    // 周
    Week,
    // 月
    Month,
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "day" | "1d" => Ok(TimeUnit::Date),
            "week" | "1w" => Ok(TimeUnit::Week),
            "month" | "1mo" => Ok(TimeUnit::Month),
            _ => Err(format!("Unknown TimeUnit: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Date => write!(f, "date"),
            TimeUnit::Week => write!(f, "week"),
            TimeUnit::Month => write!(f, "month"),
        }
    }
}
