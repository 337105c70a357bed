//! Applies approved exception requests onto attendance day-rows.
//!
//! Overrides run in a fixed order over a copy of the row. `leave` is
//! terminal: once applied nothing else touches the row.

use std::collections::HashMap;
use std::ops::ControlFlow;

use chrono::NaiveDate;

use crate::model::approval::{ApprovalRecord, ApprovalType};
use crate::model::attendance::{AttendanceDay, AttendanceStatus, LocationFlag};

pub const PRECEDENCE: [ApprovalType; 5] = [
    ApprovalType::Leave,
    ApprovalType::ManualCorrection,
    ApprovalType::OutsideRadius,
    ApprovalType::MissingIn,
    ApprovalType::MissingOut,
];

type Key = (u64, NaiveDate);

fn overwrite_note(row: &mut AttendanceDay, approval: &ApprovalRecord) {
    if let Some(reason) = &approval.reason {
        row.note = Some(reason.clone());
    }
}

fn apply_override(
    kind: ApprovalType,
    mut row: AttendanceDay,
    approval: &ApprovalRecord,
) -> ControlFlow<AttendanceDay, AttendanceDay> {
    match kind {
        ApprovalType::Leave => {
            row.status = Some(AttendanceStatus::Leave);
            overwrite_note(&mut row, approval);
            return ControlFlow::Break(row);
        }
        ApprovalType::ManualCorrection => {
            if approval.check_in.is_some() {
                row.check_in = approval.check_in;
            }
            if approval.check_out.is_some() {
                row.check_out = approval.check_out;
            }
            overwrite_note(&mut row, approval);
            row.status = row.status.or(Some(AttendanceStatus::OnTime));
        }
        ApprovalType::OutsideRadius => {
            row.location_flag = Some(LocationFlag::OutsideRadius);
            if approval.distance_meters.is_some() {
                row.distance_meters = approval.distance_meters;
            }
            if approval.radius_meters.is_some() {
                row.radius_meters = approval.radius_meters;
            }
            overwrite_note(&mut row, approval);
        }
        ApprovalType::MissingIn => {
            if row.check_in.is_none() {
                row.status = Some(AttendanceStatus::MissingIn);
                overwrite_note(&mut row, approval);
            }
        }
        ApprovalType::MissingOut => {
            if row.check_out.is_none() {
                row.status = Some(AttendanceStatus::MissingOut);
                overwrite_note(&mut row, approval);
            }
        }
    }
    ControlFlow::Continue(row)
}

fn index_approved(approvals: &[ApprovalRecord]) -> HashMap<Key, Vec<&ApprovalRecord>> {
    let mut by_key: HashMap<Key, Vec<&ApprovalRecord>> = HashMap::new();
    for approval in approvals.iter().filter(|a| a.is_approved()) {
        if approval.kind().is_none() {
            tracing::debug!(
                approval_id = approval.id,
                kind = %approval.kind,
                "Skipping approval with unknown type"
            );
            continue;
        }
        by_key
            .entry((approval.employee_id, approval.date))
            .or_default()
            .push(approval);
    }
    by_key
}

/// Returns a new collection; inputs are never modified. Rows without an
/// approved request come back unchanged.
pub fn merge_approvals(days: &[AttendanceDay], approvals: &[ApprovalRecord]) -> Vec<AttendanceDay> {
    let by_key = index_approved(approvals);

    days.iter()
        .map(|day| {
            let Some(group) = by_key.get(&(day.employee_id, day.date)) else {
                return day.clone();
            };

            let merged = PRECEDENCE.iter().try_fold(day.clone(), |row, kind| {
                match group.iter().find(|a| a.kind() == Some(*kind)) {
                    Some(approval) => apply_override(*kind, row, approval),
                    None => ControlFlow::Continue(row),
                }
            });

            match merged {
                ControlFlow::Break(row) | ControlFlow::Continue(row) => row,
            }
        })
        .collect()
}
