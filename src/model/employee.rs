use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,
    /// Globally unique, stored uppercase
    pub emp_no: String,
    pub name: String,
    /// STAFF | ADMIN | SPV
    pub role: String,
    pub grade: Option<String>,
    pub branch_id: u64,
    pub salary_override: Option<Decimal>,
    pub is_active: bool,

    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub religion: Option<String>,
    pub education: Option<String>,
    pub marital_status: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
}

pub fn normalize_emp_no(raw: &str) -> String {
    raw.trim().to_uppercase()
}
