//! Storage seam for the attendance pipeline.
//!
//! Handlers are generic over [`AttendanceStore`]; production runs on
//! [`mysql::MySqlStore`], tests on an in-memory store.

use chrono::NaiveDate;

use crate::model::approval::{ApprovalRecord, ApprovalStatus, NewApproval};
use crate::model::attendance::{AttendanceLog, NewPunch, PunchKind};
use crate::model::branch::Branch;
use crate::model::employee::Employee;
use crate::model::kiosk_session::KioskSession;
use crate::model::shift_rule::ShiftRule;
use crate::utils::time::DateBounds;

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Filters and paging for the approvals list.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalQuery {
    pub employee_id: Option<u64>,
    /// Only approvals of employees in this branch
    pub branch_id: Option<u64>,
    pub status: Option<ApprovalStatus>,
    pub page: u64,
    pub per_page: u64,
}

impl ApprovalQuery {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore: Send + Sync {
    async fn branches(&self) -> Result<Vec<Branch>, sqlx::Error>;

    /// Active employees, optionally limited to one branch.
    async fn employees(&self, branch_id: Option<u64>) -> Result<Vec<Employee>, sqlx::Error>;

    /// Rules in configuration order, inactive ones included.
    async fn shift_rules(&self, branch_id: Option<u64>) -> Result<Vec<ShiftRule>, sqlx::Error>;

    async fn attendance_logs(
        &self,
        bounds: DateBounds,
        branch_id: Option<u64>,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error>;

    /// Every approval whose date falls in `bounds`, any status.
    async fn approvals(&self, bounds: DateBounds) -> Result<Vec<ApprovalRecord>, sqlx::Error>;

    async fn list_approvals(
        &self,
        query: &ApprovalQuery,
    ) -> Result<(Vec<ApprovalRecord>, i64), sqlx::Error>;

    async fn kiosk_session(&self, token: &str) -> Result<Option<KioskSession>, sqlx::Error>;

    async fn punch_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        kind: PunchKind,
    ) -> Result<Option<AttendanceLog>, sqlx::Error>;

    async fn insert_punch(&self, punch: &NewPunch) -> Result<u64, sqlx::Error>;

    /// Branch of the employee an approval belongs to.
    async fn approval_branch(&self, id: u64) -> Result<Option<u64>, sqlx::Error>;

    async fn insert_approval(&self, approval: &NewApproval) -> Result<u64, sqlx::Error>;

    /// Moves a pending approval to `status`. Returns false when the row does
    /// not exist or was already decided.
    async fn decide_approval(&self, id: u64, status: ApprovalStatus) -> Result<bool, sqlx::Error>;
}
