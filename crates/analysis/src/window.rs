use chrono::{Days, NaiveDate};
use kwlens_core::common::TimeUnit;
use kwlens_core::trend::entity::{SegmentFilter, TrendQuery};
use serde::Serialize;

/// # Summary
/// 查询时间窗口。
///
/// # Invariants
/// - `start <= end`。
/// - 窗口截止到"昨天"，当天数据尚未完整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QueryWindow {
    /// # Summary
    /// 以 `today` 的前一天为终点，向前回溯 `days` 天。
    ///
    /// # Arguments
    /// * `today`: 上游日历下的今天。
    /// * `days`: 回溯天数。
    ///
    /// # Returns
    /// 计算出的窗口；日期下溢时起点钳制到 `NaiveDate::MIN`。
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let end = today.pred_opt().unwrap_or(today);
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// 在本窗口上构造一次查询。
    pub fn query(&self, keyword: &str, time_unit: TimeUnit, filter: SegmentFilter) -> TrendQuery {
        TrendQuery {
            keyword: keyword.to_string(),
            start: self.start,
            end: self.end,
            time_unit,
            filter,
        }
    }
}
