use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Bearer token claims for the back-office (admin / supervisor) API.
/// Tokens are issued by the identity service; this service only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Supervisors are scoped to their own branch
    pub branch_id: Option<u64>,
}
