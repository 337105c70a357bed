//! Geofence and shift evaluation of a single kiosk punch.

use chrono::NaiveTime;

use super::geofence::{distance_meters, within_radius};
use super::resolution::Resolution;
use super::shift::{ShiftRuleSet, resolve_late_minutes};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{FinalStatus, PunchFlag, PunchMode};
use crate::model::branch::Branch;
use crate::model::shift_rule::ShiftRule;

#[derive(Debug, Clone, PartialEq)]
pub struct PunchAssessment {
    pub distance_meters: Option<f64>,
    pub flags: Vec<PunchFlag>,
    pub final_status: FinalStatus,
}

/// Blank means "not supplied"; anything else must name a known mode.
pub fn parse_mode(raw: Option<&str>) -> AppResult<Option<PunchMode>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<PunchMode>()
            .map(Some)
            .map_err(|_| AppError::validation("INVALID_MODE", format!("Unknown punch mode `{s}`"))),
    }
}

/// Location check for one punch.
///
/// NORMAL punches outside the branch radius and punches without
/// coordinates need review. OFFSITE and WFH punches are flagged with their
/// mode but stay valid.
pub fn assess_punch(mode: PunchMode, coords: Option<(f64, f64)>, branch: &Branch) -> PunchAssessment {
    let Some((lat, lng)) = coords else {
        return PunchAssessment {
            distance_meters: None,
            flags: vec![PunchFlag::NoGeo],
            final_status: FinalStatus::NeedReview,
        };
    };

    let distance = distance_meters(lat, lng, branch.lat, branch.lng);
    let mut flags = Vec::new();
    let mut final_status = FinalStatus::Valid;

    match PunchFlag::for_mode(mode) {
        Some(flag) => flags.push(flag),
        None => {
            if !within_radius(distance, branch.radius_meters) {
                flags.push(PunchFlag::OutOfRadius);
                final_status = FinalStatus::NeedReview;
            }
        }
    }

    PunchAssessment {
        distance_meters: Some(distance),
        flags,
        final_status,
    }
}

/// The rule a check-in is measured against: the requested shift code when
/// it names an active rule of the branch, otherwise whatever window the
/// punch time falls into.
pub fn check_in_rule<'a>(
    rules: &'a ShiftRuleSet,
    shift_code: Option<&str>,
    at: NaiveTime,
) -> Option<&'a ShiftRule> {
    let requested = shift_code.map(str::trim).filter(|c| !c.is_empty());
    if let Some(code) = requested {
        if rules.by_code(code).is_none() {
            tracing::debug!(
                branch_id = rules.branch_id(),
                shift_code = code,
                "Requested shift not configured, detecting from punch time"
            );
        }
    }
    rules.select(requested, Some(at))
}

/// Late minutes for a check-in at `at`. No rule means zero.
pub fn check_in_late_minutes(at: NaiveTime, rule: Option<&ShiftRule>) -> Resolution<u32> {
    resolve_late_minutes(Some(at), rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::day_assembly::tests::branch;
    use crate::service::resolution::DefaultReason;
    use crate::service::shift::tests::{rule, t};

    fn klaten() -> Branch {
        branch(2, "CBG_002", "Klaten", -7.705, 110.606)
    }

    fn rules() -> ShiftRuleSet {
        let mut morning = rule("SHIFT_1", "05:00", "10:59", "08:00", 10);
        morning.branch_id = 2;
        let mut day = rule("SHIFT_2", "11:00", "15:59", "13:00", 10);
        day.branch_id = 2;
        ShiftRuleSet::new(2, vec![morning, day]).unwrap()
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!(parse_mode(Some("wfh")).unwrap(), Some(PunchMode::Wfh));
        assert_eq!(parse_mode(Some(" Offsite ")).unwrap(), Some(PunchMode::Offsite));
        assert_eq!(parse_mode(Some("")).unwrap(), None);
        assert_eq!(parse_mode(None).unwrap(), None);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = parse_mode(Some("REMOTE")).unwrap_err();
        assert_eq!(err.code(), "INVALID_MODE");
    }

    #[test]
    fn normal_punch_inside_radius_is_valid() {
        let a = assess_punch(PunchMode::Normal, Some((-7.7051, 110.6061)), &klaten());
        assert_eq!(a.final_status, FinalStatus::Valid);
        assert!(a.flags.is_empty());
        assert!(a.distance_meters.unwrap() < 200.0);
    }

    #[test]
    fn normal_punch_outside_radius_needs_review() {
        let a = assess_punch(PunchMode::Normal, Some((-7.7956, 110.3695)), &klaten());
        assert_eq!(a.flags, vec![PunchFlag::OutOfRadius]);
        assert_eq!(a.final_status, FinalStatus::NeedReview);
    }

    #[test]
    fn offsite_and_wfh_are_flagged_but_valid() {
        let far = Some((-7.7956, 110.3695));
        let offsite = assess_punch(PunchMode::Offsite, far, &klaten());
        assert_eq!(offsite.flags, vec![PunchFlag::ModeOffsite]);
        assert_eq!(offsite.final_status, FinalStatus::Valid);

        let wfh = assess_punch(PunchMode::Wfh, far, &klaten());
        assert_eq!(wfh.flags, vec![PunchFlag::ModeWfh]);
        assert_eq!(wfh.final_status, FinalStatus::Valid);
    }

    #[test]
    fn missing_coordinates_need_review() {
        let a = assess_punch(PunchMode::Wfh, None, &klaten());
        assert_eq!(a.flags, vec![PunchFlag::NoGeo]);
        assert_eq!(a.final_status, FinalStatus::NeedReview);
        assert_eq!(a.distance_meters, None);
    }

    #[test]
    fn requested_shift_wins_over_detection() {
        let set = rules();
        let rule = check_in_rule(&set, Some("shift_2"), t("08:30"));
        assert_eq!(rule.map(|r| r.code.as_str()), Some("SHIFT_2"));
        // early for the afternoon shift
        assert_eq!(check_in_late_minutes(t("08:30"), rule).value(), 0);
    }

    #[test]
    fn unknown_or_blank_code_falls_back_to_detection() {
        let set = rules();
        let rule = check_in_rule(&set, Some("SHIFT_9"), t("08:30"));
        assert_eq!(rule.map(|r| r.code.as_str()), Some("SHIFT_1"));
        assert_eq!(check_in_late_minutes(t("08:30"), rule), Resolution::Resolved(20));

        let blank = check_in_rule(&set, Some("  "), t("13:05"));
        assert_eq!(blank.map(|r| r.code.as_str()), Some("SHIFT_2"));
    }

    #[test]
    fn no_rule_means_zero_late_minutes() {
        let set = rules();
        let rule = check_in_rule(&set, None, t("20:00"));
        assert!(rule.is_none());
        let late = check_in_late_minutes(t("20:00"), rule);
        assert_eq!(late.value(), 0);
        assert_eq!(late.reason(), Some(DefaultReason::NoShiftMatched));
    }
}
