use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::utils::time::hhmm_opt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PunchKind {
    In,
    Out,
}

#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString,
    AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PunchMode {
    #[default]
    Normal,
    Offsite,
    Wfh,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PunchFlag {
    OutOfRadius,
    NoGeo,
    ModeOffsite,
    ModeWfh,
}

impl PunchFlag {
    pub fn for_mode(mode: PunchMode) -> Option<Self> {
        match mode {
            PunchMode::Normal => None,
            PunchMode::Offsite => Some(PunchFlag::ModeOffsite),
            PunchMode::Wfh => Some(PunchFlag::ModeWfh),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Valid,
    NeedReview,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceStatus {
    OnTime,
    Late,
    MissingIn,
    MissingOut,
    Leave,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFlag {
    Ok,
    OutsideRadius,
}

/// One persisted kiosk punch (`attendance_logs` row).
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AttendanceLog {
    pub id: u64,
    pub employee_id: u64,
    pub branch_id: u64,
    pub date: NaiveDate,
    pub punched_at: NaiveTime,
    /// IN | OUT
    pub kind: String,
    pub shift_code: Option<String>,
    pub mode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance_meters: Option<f64>,
    pub late_minutes: u32,
    /// JSON array of punch flags
    pub flags: Option<String>,
    pub final_status: String,
    pub photo: Option<String>,
    pub note: Option<String>,
    /// Explicit day status written upstream, if any
    pub status: Option<String>,
}

impl AttendanceLog {
    pub fn kind(&self) -> Option<PunchKind> {
        self.kind.parse().ok()
    }

    pub fn mode(&self) -> Option<PunchMode> {
        self.mode.parse().ok()
    }

    pub fn status(&self) -> Option<AttendanceStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// A punch about to be written by the kiosk endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPunch {
    pub employee_id: u64,
    pub branch_id: u64,
    pub date: NaiveDate,
    pub punched_at: NaiveTime,
    pub kind: PunchKind,
    pub shift_code: Option<String>,
    pub mode: PunchMode,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub distance_meters: Option<f64>,
    pub late_minutes: u32,
    pub flags: Vec<PunchFlag>,
    pub final_status: FinalStatus,
    pub photo: Option<String>,
    pub note: Option<String>,
}

/// The attendance day-row: one employee, one date, check-in and check-out
/// folded together. This is the shape approvals are merged onto.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub employee_id: u64,
    pub emp_no: String,
    pub employee_name: String,
    pub branch_id: u64,
    pub branch_name: String,
    pub branch_code: String,
    pub shift_code: Option<String>,

    #[serde(with = "hhmm_opt")]
    pub check_in: Option<NaiveTime>,
    pub check_in_photo: Option<String>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,

    #[serde(with = "hhmm_opt")]
    pub check_out: Option<NaiveTime>,
    pub check_out_photo: Option<String>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,

    pub late_minutes: Option<u32>,
    pub distance_meters: Option<f64>,
    pub radius_meters: Option<f64>,
    pub location_flag: Option<LocationFlag>,
    pub note: Option<String>,
    pub status: Option<AttendanceStatus>,
}
