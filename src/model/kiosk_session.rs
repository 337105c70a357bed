use chrono::NaiveDateTime;

use super::{branch::Branch, employee::Employee};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KioskSessionRow {
    pub id: u64,
    pub token: String,
    pub branch_id: u64,
    pub employee_id: u64,
    pub expires_at: NaiveDateTime,
}

/// A resolved kiosk session: the employee punching and the branch whose
/// geofence applies. Issued elsewhere; this service only consumes it.
#[derive(Debug, Clone)]
pub struct KioskSession {
    pub id: u64,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub branch: Branch,
    pub employee: Employee,
}

impl KioskSession {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at < now
    }
}
