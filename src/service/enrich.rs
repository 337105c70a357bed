use std::collections::HashMap;

use serde::Serialize;

use super::approval_merge::merge_approvals;
use super::geofence::{distance_meters, within_radius};
use super::resolution::DefaultReason;
use super::shift::{ShiftRuleSet, resolve_late_minutes};
use super::status::effective_status;
use crate::model::approval::ApprovalRecord;
use crate::model::attendance::{AttendanceDay, AttendanceStatus, LocationFlag};
use crate::model::branch::Branch;
use crate::model::payroll::PayrollDay;

/// A reconciled day-row with everything the attendance screen, the CSV
/// export and the payroll tally need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub day: AttendanceDay,
    pub shift_detected: Option<String>,
    pub late_minutes_defaulted: Option<DefaultReason>,
    pub in_distance_meters: Option<f64>,
    pub out_distance_meters: Option<f64>,
    pub in_ok: Option<bool>,
    pub out_ok: Option<bool>,
    pub resolved_status: AttendanceStatus,
}

impl EnrichedRow {
    /// Detected shift, falling back to the code recorded at the kiosk.
    pub fn shift_label(&self) -> Option<&str> {
        self.shift_detected
            .as_deref()
            .or(self.day.shift_code.as_deref())
    }
}

impl From<&EnrichedRow> for PayrollDay {
    fn from(row: &EnrichedRow) -> Self {
        PayrollDay {
            employee_id: row.day.employee_id,
            date: row.day.date,
            status: row.resolved_status,
            late_minutes: row.day.late_minutes.unwrap_or(0),
        }
    }
}

fn distance_to(branch: Option<&Branch>, lat: Option<f64>, lng: Option<f64>) -> Option<f64> {
    let branch = branch?;
    Some(distance_meters(lat?, lng?, branch.lat, branch.lng))
}

/// Merge approvals, then resolve shift, lateness, geofence and status.
/// The shift recorded at the kiosk wins over detection from the clock.
/// Must see approvals first so explicit overrides beat inference.
pub fn enrich(
    days: &[AttendanceDay],
    approvals: &[ApprovalRecord],
    rule_sets: &HashMap<u64, ShiftRuleSet>,
    branches: &HashMap<u64, Branch>,
) -> Vec<EnrichedRow> {
    merge_approvals(days, approvals)
        .into_iter()
        .map(|mut day| {
            let rule = rule_sets
                .get(&day.branch_id)
                .and_then(|set| set.select(day.shift_code.as_deref(), day.check_in));
            let late = resolve_late_minutes(day.check_in, rule);
            if late.reason() == Some(DefaultReason::NoShiftMatched) {
                tracing::debug!(
                    employee_id = day.employee_id,
                    date = %day.date,
                    "Check-in matches no shift window"
                );
            }
            day.late_minutes = Some(late.value());

            let branch = branches.get(&day.branch_id);
            let in_distance = distance_to(branch, day.check_in_lat, day.check_in_lng);
            let out_distance = distance_to(branch, day.check_out_lat, day.check_out_lng);
            let in_ok = branch.zip(in_distance).map(|(b, d)| within_radius(d, b.radius_meters));
            let out_ok = branch.zip(out_distance).map(|(b, d)| within_radius(d, b.radius_meters));

            if day.radius_meters.is_none() {
                day.radius_meters = branch.map(|b| b.radius_meters);
            }
            if day.location_flag.is_none() && (in_ok.is_some() || out_ok.is_some()) {
                day.location_flag = if in_ok == Some(false) || out_ok == Some(false) {
                    Some(LocationFlag::OutsideRadius)
                } else {
                    Some(LocationFlag::Ok)
                };
            }

            let resolved_status = effective_status(&day);

            EnrichedRow {
                shift_detected: rule.map(|r| r.code.clone()),
                late_minutes_defaulted: late.reason(),
                in_distance_meters: in_distance,
                out_distance_meters: out_distance,
                in_ok,
                out_ok,
                resolved_status,
                day,
            }
        })
        .collect()
}
