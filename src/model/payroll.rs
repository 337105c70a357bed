use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::AttendanceStatus;
use crate::service::resolution::DefaultReason;

/// Pay fields taken from a branch shift rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayRates {
    pub daily_rate: Decimal,
    pub late_penalty_per_minute: Decimal,
    pub absence_penalty: Decimal,
}

/// What the payroll tally needs from one reconciled attendance day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollDay {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollRow {
    #[schema(example = "EMP027")]
    pub emp_no: String,
    #[schema(example = "Aji Fajar Permana")]
    pub name: String,
    #[schema(example = "Klaten")]
    pub branch: String,
    #[schema(example = 20)]
    pub present: u32,
    #[schema(example = 1)]
    pub absent: u32,
    #[schema(example = 45)]
    pub late_minutes: u32,
    #[schema(example = "2000000.00", value_type = String)]
    pub gross: Decimal,
    #[schema(example = "45000.00", value_type = String)]
    pub late_cut: Decimal,
    #[schema(example = "50000.00", value_type = String)]
    pub absent_cut: Decimal,
    #[schema(example = "1905000.00", value_type = String)]
    pub net: Decimal,
    /// Set when the branch had no pay rule and zero rates were used
    #[schema(example = json!(null), value_type = Option<String>)]
    pub rates_defaulted: Option<DefaultReason>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
pub struct PayrollSummary {
    #[schema(example = 3)]
    pub employees: usize,
    #[schema(example = "5400000.00", value_type = String)]
    pub total_gross: Decimal,
    #[schema(example = "5210000.00", value_type = String)]
    pub total_net: Decimal,
    #[schema(example = 95)]
    pub total_late_minutes: u64,
    #[schema(example = 2)]
    pub total_absent: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
pub struct PayrollPreview {
    pub rows: Vec<PayrollRow>,
    pub summary: PayrollSummary,
}
