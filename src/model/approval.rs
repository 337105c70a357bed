use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::utils::time::hhmm_opt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalType {
    MissingIn,
    MissingOut,
    OutsideRadius,
    Leave,
    ManualCorrection,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// An exception request for one employee/date, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct ApprovalRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 27)]
    pub employee_id: u64,
    #[schema(example = "2026-02-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// missing_in | missing_out | outside_radius | leave | manual_correction
    #[schema(example = "outside_radius")]
    pub kind: String,
    #[schema(example = "GPS drifted, punched in front of the store")]
    pub reason: Option<String>,
    pub evidence_photo: Option<String>,
    #[serde(with = "hhmm_opt")]
    #[schema(example = "07:05", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[serde(with = "hhmm_opt")]
    #[schema(example = "15:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    #[schema(example = 280.0)]
    pub distance_meters: Option<f64>,
    #[schema(example = 200.0)]
    pub radius_meters: Option<f64>,
    /// pending | approved | rejected
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-02-05T07:10:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

impl ApprovalRecord {
    /// `None` when the stored type is not one the merge understands.
    pub fn kind(&self) -> Option<ApprovalType> {
        self.kind.parse().ok()
    }

    pub fn status(&self) -> Option<ApprovalStatus> {
        self.status.parse().ok()
    }

    pub fn is_approved(&self) -> bool {
        self.status() == Some(ApprovalStatus::Approved)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApproval {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub kind: ApprovalType,
    pub reason: Option<String>,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub distance_meters: Option<f64>,
    pub radius_meters: Option<f64>,
}
