use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::RwLock;

/// 上游平台以韩国标准时间 (UTC+9) 划分自然日。
const UPSTREAM_OFFSET_SECS: i32 = 9 * 3600;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 查询窗口的计算必须通过此接口获取当前时间，以便测试固定日期。
pub trait TimeProvider: Send + Sync {
    /// 获取当前时间
    fn now(&self) -> DateTime<Utc>;

    /// # Summary
    /// 获取上游平台日历下的"今天"。
    ///
    /// # Logic
    /// 1. 将 `now()` 转换到 UTC+9。
    /// 2. 取日期部分。
    fn today(&self) -> NaiveDate {
        match FixedOffset::east_opt(UPSTREAM_OFFSET_SECS) {
            Some(offset) => self.now().with_timezone(&offset).date_naive(),
            None => self.now().date_naive(),
        }
    }
}

/// # Summary
/// 普通运行使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动拨动时间。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程读写。
/// - 锁中毒时沿用中毒前的值，不会 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_uses_upstream_calendar() {
        // 2025-01-31 20:00 UTC 在 UTC+9 已是 2025-02-01
        let clock = FakeClockProvider::new(Utc.with_ymd_and_hms(2025, 1, 31, 20, 0, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        clock.set_time(Utc.with_ymd_and_hms(2025, 1, 31, 10, 0, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    }
}
