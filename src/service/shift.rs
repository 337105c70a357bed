//! Shift window matching and lateness.
//!
//! Check-in windows are inclusive minute ranges. A window whose start is
//! after its end spans midnight, e.g. 23:00-04:59 matches both 23:30 and 02:00.

use std::collections::HashMap;

use chrono::NaiveTime;
use thiserror::Error;

use super::resolution::{DefaultReason, Resolution};
use crate::model::shift_rule::ShiftRule;
use crate::utils::time::{MINUTES_PER_DAY, minutes_of_day};

fn in_window(t: i32, start: i32, end: i32) -> bool {
    if start <= end {
        t >= start && t <= end
    } else {
        t >= start || t <= end
    }
}

/// First active rule whose check-in window contains `check_in`, in the
/// order given.
pub fn detect_shift(check_in: Option<NaiveTime>, rules: &[ShiftRule]) -> Option<&ShiftRule> {
    let t = minutes_of_day(check_in?);
    rules
        .iter()
        .filter(|r| r.is_active)
        .find(|r| in_window(t, r.window_start_min(), r.window_end_min()))
}

/// Minutes past `work_start + tolerance`, never negative.
///
/// For a window spanning midnight both instants are projected onto one axis:
/// a check-in before the window start happened after midnight (+1440), and a
/// work start inside the wrapped tail (`<= window_end`) likewise.
pub fn late_minutes(check_in: NaiveTime, rule: &ShiftRule) -> u32 {
    let mut t = minutes_of_day(check_in);
    let mut work_start = rule.work_start_min();

    if rule.wraps_midnight() {
        if t < rule.window_start_min() {
            t += MINUTES_PER_DAY;
        }
        if work_start <= rule.window_end_min() {
            work_start += MINUTES_PER_DAY;
        }
    }

    let late = i64::from(t) - i64::from(work_start) - i64::from(rule.late_tolerance_minutes);
    u32::try_from(late.max(0)).unwrap_or(u32::MAX)
}

/// Lateness tagged with why it is zero when it could not be computed.
pub fn resolve_late_minutes(
    check_in: Option<NaiveTime>,
    rule: Option<&ShiftRule>,
) -> Resolution<u32> {
    match (check_in, rule) {
        (None, _) => Resolution::defaulted(0, DefaultReason::NoCheckIn),
        (Some(_), None) => Resolution::defaulted(0, DefaultReason::NoShiftMatched),
        (Some(t), Some(rule)) => Resolution::Resolved(late_minutes(t, rule)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("shift rules {first} and {second} of branch {branch_id} have overlapping check-in windows")]
pub struct ShiftOverlap {
    pub branch_id: u64,
    pub first: String,
    pub second: String,
}

fn segments(rule: &ShiftRule) -> Vec<(i32, i32)> {
    let (start, end) = (rule.window_start_min(), rule.window_end_min());
    if start <= end {
        vec![(start, end)]
    } else {
        vec![(start, MINUTES_PER_DAY - 1), (0, end)]
    }
}

fn overlaps(a: &ShiftRule, b: &ShiftRule) -> bool {
    let (sa, sb) = (segments(a), segments(b));
    sa.iter()
        .any(|x| sb.iter().any(|y| x.0 <= y.1 && y.0 <= x.1))
}

/// The active shift rules of one branch, validated so that no check-in time
/// can match two of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRuleSet {
    branch_id: u64,
    rules: Vec<ShiftRule>,
}

impl ShiftRuleSet {
    pub fn new(branch_id: u64, rules: Vec<ShiftRule>) -> Result<Self, ShiftOverlap> {
        let rules: Vec<ShiftRule> = rules
            .into_iter()
            .filter(|r| r.is_active && r.branch_id == branch_id)
            .collect();

        for (i, a) in rules.iter().enumerate() {
            if let Some(b) = rules[i + 1..].iter().find(|b| overlaps(a, b)) {
                return Err(ShiftOverlap {
                    branch_id,
                    first: a.code.clone(),
                    second: b.code.clone(),
                });
            }
        }

        Ok(Self { branch_id, rules })
    }

    pub fn branch_id(&self) -> u64 {
        self.branch_id
    }

    pub fn rules(&self) -> &[ShiftRule] {
        &self.rules
    }

    pub fn detect(&self, check_in: Option<NaiveTime>) -> Option<&ShiftRule> {
        detect_shift(check_in, &self.rules)
    }

    pub fn by_code(&self, code: &str) -> Option<&ShiftRule> {
        self.rules.iter().find(|r| r.code.eq_ignore_ascii_case(code))
    }

    /// The rule named by `shift_code` when it is configured here, otherwise
    /// the window `check_in` falls into.
    pub fn select(&self, shift_code: Option<&str>, check_in: Option<NaiveTime>) -> Option<&ShiftRule> {
        shift_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .and_then(|c| self.by_code(c))
            .or_else(|| self.detect(check_in))
    }
}

/// An active rule of `branch_id` named `shift_code`, looked up without
/// validating the rest of the set.
pub fn requested_rule<'a>(
    rules: &'a [ShiftRule],
    branch_id: u64,
    shift_code: Option<&str>,
) -> Option<&'a ShiftRule> {
    let code = shift_code.map(str::trim).filter(|c| !c.is_empty())?;
    rules
        .iter()
        .filter(|r| r.is_active && r.branch_id == branch_id)
        .find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Groups rules per branch and validates every branch's set.
pub fn rule_sets_by_branch(
    rules: Vec<ShiftRule>,
) -> Result<HashMap<u64, ShiftRuleSet>, ShiftOverlap> {
    let mut grouped: HashMap<u64, Vec<ShiftRule>> = HashMap::new();
    for rule in rules {
        grouped.entry(rule.branch_id).or_default().push(rule);
    }

    grouped
        .into_iter()
        .map(|(branch_id, rules)| Ok((branch_id, ShiftRuleSet::new(branch_id, rules)?)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn t(hhmm: &str) -> NaiveTime {
        crate::utils::time::parse_clock(hhmm).unwrap()
    }

    pub(crate) fn rule(code: &str, start: &str, end: &str, work: &str, tol: u32) -> ShiftRule {
        ShiftRule {
            id: 0,
            branch_id: 1,
            code: code.to_string(),
            name: code.to_string(),
            window_start: t(start),
            window_end: t(end),
            work_start: t(work),
            late_tolerance_minutes: tol,
            daily_rate: None,
            late_penalty_per_minute: None,
            absence_penalty: None,
            is_active: true,
        }
    }

    fn day_shifts() -> Vec<ShiftRule> {
        vec![
            rule("SHIFT_1", "05:00", "10:59", "08:00", 10),
            rule("SHIFT_2", "11:00", "15:59", "13:00", 10),
            rule("SHIFT_3", "16:00", "22:59", "17:00", 10),
        ]
    }

    #[test]
    fn plain_window_is_inclusive() {
        let rules = vec![rule("MORNING", "08:00", "09:00", "08:00", 0)];
        assert!(detect_shift(Some(t("08:00")), &rules).is_some());
        assert!(detect_shift(Some(t("08:30")), &rules).is_some());
        assert!(detect_shift(Some(t("09:00")), &rules).is_some());
        assert!(detect_shift(Some(t("07:59")), &rules).is_none());
        assert!(detect_shift(Some(t("09:01")), &rules).is_none());
    }

    #[test]
    fn wrapping_window_matches_both_sides_of_midnight() {
        let rules = vec![rule("NIGHT", "23:00", "04:59", "23:00", 0)];
        assert_eq!(detect_shift(Some(t("23:30")), &rules).map(|r| r.code.as_str()), Some("NIGHT"));
        assert_eq!(detect_shift(Some(t("02:00")), &rules).map(|r| r.code.as_str()), Some("NIGHT"));
        assert!(detect_shift(Some(t("12:00")), &rules).is_none());
    }

    #[test]
    fn inactive_rules_and_missing_check_in_never_match() {
        let mut rules = day_shifts();
        rules[0].is_active = false;
        assert!(detect_shift(Some(t("07:00")), &rules).is_none());
        assert!(detect_shift(None, &rules).is_none());
    }

    #[test]
    fn first_listed_rule_wins_on_overlap() {
        let rules = vec![
            rule("A", "06:00", "10:00", "07:00", 0),
            rule("B", "09:00", "12:00", "10:00", 0),
        ];
        assert_eq!(detect_shift(Some(t("09:30")), &rules).unwrap().code, "A");
    }

    #[test]
    fn lateness_respects_tolerance() {
        let shift = rule("SHIFT_1", "05:00", "10:59", "08:00", 10);
        assert_eq!(late_minutes(t("07:45"), &shift), 0);
        assert_eq!(late_minutes(t("08:10"), &shift), 0);
        assert_eq!(late_minutes(t("08:11"), &shift), 1);
        assert_eq!(late_minutes(t("09:00"), &shift), 50);
    }

    #[test]
    fn lateness_after_midnight_on_wrapping_shift() {
        let night = rule("NIGHT", "23:00", "04:59", "23:00", 0);
        // 00:10 projects to 1450, work start stays at 1380
        assert_eq!(late_minutes(t("00:10"), &night), 70);
        assert_eq!(late_minutes(t("23:00"), &night), 0);
        assert_eq!(late_minutes(t("23:20"), &night), 20);
    }

    #[test]
    fn lateness_when_work_start_is_in_wrapped_tail() {
        let night = rule("NIGHT", "22:00", "03:00", "00:30", 5);
        // early, before midnight
        assert_eq!(late_minutes(t("23:50"), &night), 0);
        // 01:00 -> 1500, work start 00:30 -> 1470
        assert_eq!(late_minutes(t("01:00"), &night), 25);
    }

    #[test]
    fn early_check_in_clamps_to_zero() {
        let shift = rule("S", "00:00", "23:59", "23:59", 0);
        assert_eq!(late_minutes(t("00:00"), &shift), 0);
        assert_eq!(late_minutes(t("23:58"), &shift), 0);
    }

    #[test]
    fn huge_tolerance_never_wraps_into_lateness() {
        let shift = rule("SHIFT_1", "05:00", "10:59", "08:00", u32::MAX);
        assert_eq!(late_minutes(t("10:59"), &shift), 0);
    }

    #[test]
    fn resolution_distinguishes_default_from_on_time() {
        let shift = rule("SHIFT_1", "05:00", "10:59", "08:00", 10);
        assert_eq!(
            resolve_late_minutes(Some(t("07:00")), Some(&shift)),
            Resolution::Resolved(0)
        );
        assert_eq!(
            resolve_late_minutes(Some(t("07:00")), None).reason(),
            Some(DefaultReason::NoShiftMatched)
        );
        assert_eq!(
            resolve_late_minutes(None, Some(&shift)).reason(),
            Some(DefaultReason::NoCheckIn)
        );
    }

    #[test]
    fn rule_set_accepts_disjoint_windows() {
        let mut rules = day_shifts();
        let mut night = rule("SHIFT_4", "23:00", "04:59", "23:00", 10);
        night.is_active = false;
        rules.push(night);

        let set = ShiftRuleSet::new(1, rules).unwrap();
        assert_eq!(set.rules().len(), 3);
        assert_eq!(set.detect(Some(t("13:05"))).unwrap().code, "SHIFT_2");
        assert_eq!(set.by_code("shift_3").unwrap().code, "SHIFT_3");
        assert!(set.by_code("SHIFT_4").is_none());
    }

    #[test]
    fn select_prefers_the_recorded_shift_code() {
        let set = ShiftRuleSet::new(1, day_shifts()).unwrap();
        assert_eq!(set.select(Some("SHIFT_2"), Some(t("08:30"))).unwrap().code, "SHIFT_2");
        assert_eq!(set.select(Some("NOPE"), Some(t("08:30"))).unwrap().code, "SHIFT_1");
        assert_eq!(set.select(Some(" "), Some(t("13:05"))).unwrap().code, "SHIFT_2");
        assert!(set.select(None, None).is_none());
    }

    #[test]
    fn requested_rule_ignores_set_validation() {
        let mut rules = day_shifts();
        rules.push(rule("SHIFT_4", "22:00", "04:59", "23:00", 10));
        let mut inactive = rule("SHIFT_5", "06:00", "07:00", "06:00", 0);
        inactive.is_active = false;
        rules.push(inactive);

        assert_eq!(requested_rule(&rules, 1, Some("shift_4")).unwrap().code, "SHIFT_4");
        assert!(requested_rule(&rules, 1, Some("SHIFT_5")).is_none());
        assert!(requested_rule(&rules, 2, Some("SHIFT_4")).is_none());
        assert!(requested_rule(&rules, 1, None).is_none());
    }

    #[test]
    fn rule_set_rejects_overlapping_windows() {
        let mut rules = day_shifts();
        rules.push(rule("SHIFT_4", "22:00", "04:59", "23:00", 10));

        let err = ShiftRuleSet::new(1, rules).unwrap_err();
        assert_eq!(err.first, "SHIFT_3");
        assert_eq!(err.second, "SHIFT_4");
    }

    #[test]
    fn overlap_detection_covers_wrapped_tail() {
        let rules = vec![
            rule("NIGHT", "23:00", "04:59", "23:00", 0),
            rule("DAWN", "04:30", "06:00", "05:00", 0),
        ];
        assert!(ShiftRuleSet::new(1, rules).is_err());
    }

    #[test]
    fn grouping_validates_each_branch() {
        let mut other = rule("X", "06:00", "12:00", "07:00", 0);
        other.branch_id = 2;
        let mut rules = day_shifts();
        rules.push(other);

        let sets = rule_sets_by_branch(rules).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[&2].rules()[0].code, "X");
        assert_eq!(sets[&1].branch_id(), 1);
    }
}
