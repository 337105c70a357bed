use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Role {
    Staff,
    Admin,
    Spv,
}

impl Role {
    /// Supervisors and admins may review attendance and approvals.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Admin | Role::Spv)
    }
}
