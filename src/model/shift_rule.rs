use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::time::{hhmm, minutes_of_day};

/// A branch shift: the check-in window used to recognise it, the nominal
/// work start, and the optional pay fields used by the payroll preview.
///
/// `window_start > window_end` encodes a window that spans midnight
/// (e.g. 23:00 to 04:59).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShiftRule {
    pub id: u64,
    pub branch_id: u64,
    pub code: String,
    pub name: String,
    #[serde(with = "hhmm")]
    pub window_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub window_end: NaiveTime,
    #[serde(with = "hhmm")]
    pub work_start: NaiveTime,
    pub late_tolerance_minutes: u32,
    pub daily_rate: Option<Decimal>,
    pub late_penalty_per_minute: Option<Decimal>,
    pub absence_penalty: Option<Decimal>,
    pub is_active: bool,
}

impl ShiftRule {
    pub fn window_start_min(&self) -> i32 {
        minutes_of_day(self.window_start)
    }

    pub fn window_end_min(&self) -> i32 {
        minutes_of_day(self.window_end)
    }

    pub fn work_start_min(&self) -> i32 {
        minutes_of_day(self.work_start)
    }

    pub fn wraps_midnight(&self) -> bool {
        self.window_start_min() > self.window_end_min()
    }

    pub fn has_pay_fields(&self) -> bool {
        self.daily_rate.is_some()
            || self.late_penalty_per_minute.is_some()
            || self.absence_penalty.is_some()
    }
}
