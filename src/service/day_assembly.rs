use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::model::attendance::{AttendanceDay, AttendanceLog, PunchKind};
use crate::model::branch::Branch;
use crate::model::employee::Employee;

/// Folds IN/OUT punches into one row per employee and date, ordered by date
/// then employee. Duplicate punches are tolerated: the earliest IN and the
/// latest OUT are kept.
pub fn assemble_days(
    logs: &[AttendanceLog],
    employees: &HashMap<u64, Employee>,
    branches: &HashMap<u64, Branch>,
) -> Vec<AttendanceDay> {
    let mut grouped: BTreeMap<(NaiveDate, u64), (Option<&AttendanceLog>, Option<&AttendanceLog>)> =
        BTreeMap::new();

    for log in logs {
        let slot = grouped.entry((log.date, log.employee_id)).or_default();
        match log.kind() {
            Some(PunchKind::In) => {
                if slot.0.is_none_or(|cur| log.punched_at < cur.punched_at) {
                    slot.0 = Some(log);
                }
            }
            Some(PunchKind::Out) => {
                if slot.1.is_none_or(|cur| log.punched_at > cur.punched_at) {
                    slot.1 = Some(log);
                }
            }
            None => {
                tracing::warn!(log_id = log.id, kind = %log.kind, "Skipping punch with unknown kind");
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|((date, employee_id), (check_in, check_out))| {
            let first = check_in.or(check_out)?;
            let Some(employee) = employees.get(&employee_id) else {
                tracing::warn!(employee_id, %date, "Punches for unknown employee");
                return None;
            };
            let branch = branches.get(&first.branch_id);

            Some(AttendanceDay {
                date,
                employee_id,
                emp_no: employee.emp_no.clone(),
                employee_name: employee.name.clone(),
                branch_id: first.branch_id,
                branch_name: branch.map(|b| b.name.clone()).unwrap_or_default(),
                branch_code: branch.map(|b| b.code.clone()).unwrap_or_default(),
                shift_code: check_in.and_then(|l| l.shift_code.clone()),

                check_in: check_in.map(|l| l.punched_at),
                check_in_photo: check_in.and_then(|l| l.photo.clone()),
                check_in_lat: check_in.and_then(|l| l.lat),
                check_in_lng: check_in.and_then(|l| l.lng),

                check_out: check_out.map(|l| l.punched_at),
                check_out_photo: check_out.and_then(|l| l.photo.clone()),
                check_out_lat: check_out.and_then(|l| l.lat),
                check_out_lng: check_out.and_then(|l| l.lng),

                late_minutes: check_in.map(|l| l.late_minutes),
                distance_meters: check_in.and_then(|l| l.distance_meters),
                radius_meters: None,
                location_flag: None,
                note: check_in
                    .and_then(|l| l.note.clone())
                    .or_else(|| check_out.and_then(|l| l.note.clone())),
                status: check_in
                    .and_then(|l| l.status())
                    .or_else(|| check_out.and_then(|l| l.status())),
            })
        })
        .collect()
}
