use crate::model::attendance::{AttendanceDay, AttendanceStatus};

/// Final status of a day-row. An explicit status (usually written by the
/// approval merge) wins; otherwise it is inferred from the punches.
pub fn effective_status(day: &AttendanceDay) -> AttendanceStatus {
    if let Some(status) = day.status {
        return status;
    }

    if day.check_in.is_none() {
        AttendanceStatus::MissingIn
    } else if day.check_out.is_none() {
        AttendanceStatus::MissingOut
    } else if day.late_minutes.unwrap_or(0) > 0 {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::OnTime
    }
}
