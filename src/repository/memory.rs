//! In-memory store for handler and kiosk tests.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveDateTime};

use super::{ApprovalQuery, AttendanceStore};
use crate::model::approval::{ApprovalRecord, ApprovalStatus, NewApproval};
use crate::model::attendance::{AttendanceLog, NewPunch, PunchKind};
use crate::model::branch::Branch;
use crate::model::employee::Employee;
use crate::model::kiosk_session::KioskSession;
use crate::model::shift_rule::ShiftRule;
use crate::utils::time::DateBounds;

#[derive(Default)]
pub struct InMemoryStore {
    branches: Vec<Branch>,
    employees: Vec<Employee>,
    rules: Vec<ShiftRule>,
    sessions: Vec<KioskSession>,
    logs: RwLock<Vec<AttendanceLog>>,
    approvals: RwLock<Vec<ApprovalRecord>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn with_employee(mut self, employee: Employee) -> Self {
        self.employees.push(employee);
        self
    }

    pub fn with_rule(mut self, rule: ShiftRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_session(mut self, session: KioskSession) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn with_log(self, log: AttendanceLog) -> Self {
        self.logs.write().unwrap().push(log);
        self
    }

    pub fn with_approval(self, approval: ApprovalRecord) -> Self {
        self.approvals.write().unwrap().push(approval);
        self
    }

    pub fn logs(&self) -> Vec<AttendanceLog> {
        self.logs.read().unwrap().clone()
    }

    pub fn approval(&self, id: u64) -> Option<ApprovalRecord> {
        self.approvals.read().unwrap().iter().find(|a| a.id == id).cloned()
    }

    fn branch_of(&self, employee_id: u64) -> Option<u64> {
        self.employees
            .iter()
            .find(|e| e.id == employee_id)
            .map(|e| e.branch_id)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl AttendanceStore for InMemoryStore {
    async fn branches(&self) -> Result<Vec<Branch>, sqlx::Error> {
        Ok(self.branches.clone())
    }

    async fn employees(&self, branch_id: Option<u64>) -> Result<Vec<Employee>, sqlx::Error> {
        Ok(self
            .employees
            .iter()
            .filter(|e| e.is_active && branch_id.is_none_or(|b| e.branch_id == b))
            .cloned()
            .collect())
    }

    async fn shift_rules(&self, branch_id: Option<u64>) -> Result<Vec<ShiftRule>, sqlx::Error> {
        Ok(self
            .rules
            .iter()
            .filter(|r| branch_id.is_none_or(|b| r.branch_id == b))
            .cloned()
            .collect())
    }

    async fn attendance_logs(
        &self,
        bounds: DateBounds,
        branch_id: Option<u64>,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .iter()
            .filter(|l| bounds.contains(l.date) && branch_id.is_none_or(|b| l.branch_id == b))
            .cloned()
            .collect())
    }

    async fn approvals(&self, bounds: DateBounds) -> Result<Vec<ApprovalRecord>, sqlx::Error> {
        Ok(self
            .approvals
            .read()
            .unwrap()
            .iter()
            .filter(|a| bounds.contains(a.date))
            .cloned()
            .collect())
    }

    async fn list_approvals(
        &self,
        query: &ApprovalQuery,
    ) -> Result<(Vec<ApprovalRecord>, i64), sqlx::Error> {
        let mut matching: Vec<ApprovalRecord> = self
            .approvals
            .read()
            .unwrap()
            .iter()
            .filter(|a| query.employee_id.is_none_or(|e| a.employee_id == e))
            .filter(|a| query.branch_id.is_none_or(|b| self.branch_of(a.employee_id) == Some(b)))
            .filter(|a| query.status.is_none_or(|s| a.status() == Some(s)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn kiosk_session(&self, token: &str) -> Result<Option<KioskSession>, sqlx::Error> {
        Ok(self.sessions.iter().find(|s| s.token == token).cloned())
    }

    async fn punch_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
        kind: PunchKind,
    ) -> Result<Option<AttendanceLog>, sqlx::Error> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .iter()
            .filter(|l| l.employee_id == employee_id && l.date == date && l.kind() == Some(kind))
            .min_by_key(|l| l.punched_at)
            .cloned())
    }

    async fn insert_punch(&self, punch: &NewPunch) -> Result<u64, sqlx::Error> {
        let id = self.next_id();
        let flags = super::mysql::encode_flags(&punch.flags)?;

        self.logs.write().unwrap().push(AttendanceLog {
            id,
            employee_id: punch.employee_id,
            branch_id: punch.branch_id,
            date: punch.date,
            punched_at: punch.punched_at,
            kind: punch.kind.to_string(),
            shift_code: punch.shift_code.clone(),
            mode: punch.mode.to_string(),
            lat: punch.lat,
            lng: punch.lng,
            distance_meters: punch.distance_meters,
            late_minutes: punch.late_minutes,
            flags,
            final_status: punch.final_status.to_string(),
            photo: punch.photo.clone(),
            note: punch.note.clone(),
            status: None,
        });
        Ok(id)
    }

    async fn approval_branch(&self, id: u64) -> Result<Option<u64>, sqlx::Error> {
        Ok(self.approval(id).and_then(|a| self.branch_of(a.employee_id)))
    }

    async fn insert_approval(&self, approval: &NewApproval) -> Result<u64, sqlx::Error> {
        let id = self.next_id();
        self.approvals.write().unwrap().push(ApprovalRecord {
            id,
            employee_id: approval.employee_id,
            date: approval.date,
            kind: approval.kind.to_string(),
            reason: approval.reason.clone(),
            evidence_photo: None,
            check_in: approval.check_in,
            check_out: approval.check_out,
            distance_meters: approval.distance_meters,
            radius_meters: approval.radius_meters,
            status: ApprovalStatus::Pending.to_string(),
            created_at: NaiveDateTime::default(),
        });
        Ok(id)
    }

    async fn decide_approval(&self, id: u64, status: ApprovalStatus) -> Result<bool, sqlx::Error> {
        let mut approvals = self.approvals.write().unwrap();
        match approvals
            .iter_mut()
            .find(|a| a.id == id && a.status() == Some(ApprovalStatus::Pending))
        {
            Some(row) => {
                row.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
