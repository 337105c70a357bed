//! Payroll preview: attendance tallies priced with the branch pay rule.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::resolution::{DefaultReason, Resolution};
use super::shift::ShiftRuleSet;
use crate::model::attendance::AttendanceStatus;
use crate::model::branch::Branch;
use crate::model::employee::Employee;
use crate::model::payroll::{PayRates, PayrollDay, PayrollPreview, PayrollRow, PayrollSummary};
use crate::utils::time::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Present,
    Absent,
}

/// Leave is neither paid presence nor a penalised absence.
fn presence(status: AttendanceStatus) -> Option<Presence> {
    match status {
        AttendanceStatus::OnTime | AttendanceStatus::Late | AttendanceStatus::MissingOut => {
            Some(Presence::Present)
        }
        AttendanceStatus::MissingIn => Some(Presence::Absent),
        AttendanceStatus::Leave => None,
    }
}

fn money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rates from the first active rule of the branch that carries pay fields.
/// No such rule means zero pay and zero penalties.
pub fn branch_pay_rates(rule_set: Option<&ShiftRuleSet>) -> Resolution<PayRates> {
    let rule = rule_set.and_then(|set| set.rules().iter().find(|r| r.has_pay_fields()));

    match rule {
        Some(rule) => Resolution::Resolved(PayRates {
            daily_rate: rule.daily_rate.unwrap_or_default(),
            late_penalty_per_minute: rule.late_penalty_per_minute.unwrap_or_default(),
            absence_penalty: rule.absence_penalty.unwrap_or_default(),
        }),
        None => Resolution::defaulted(PayRates::default(), DefaultReason::NoShiftRule),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    present: u32,
    absent: u32,
    late_minutes: u32,
}

fn tally<'a>(days: impl Iterator<Item = &'a PayrollDay>) -> Tally {
    days.fold(Tally::default(), |mut acc, day| {
        match presence(day.status) {
            Some(Presence::Present) => acc.present += 1,
            Some(Presence::Absent) => acc.absent += 1,
            None => {}
        }
        acc.late_minutes += day.late_minutes;
        acc
    })
}

fn price(employee: &Employee, branch_name: String, tally: Tally, rates: Resolution<PayRates>) -> PayrollRow {
    let rates_defaulted = rates.reason();
    let rates = rates.value();

    let gross = money(Decimal::from(tally.present) * rates.daily_rate);
    let late_cut = money(Decimal::from(tally.late_minutes) * rates.late_penalty_per_minute);
    let absent_cut = money(Decimal::from(tally.absent) * rates.absence_penalty);
    let net = (gross - late_cut - absent_cut).max(Decimal::ZERO);

    PayrollRow {
        emp_no: employee.emp_no.clone(),
        name: employee.name.clone(),
        branch: branch_name,
        present: tally.present,
        absent: tally.absent,
        late_minutes: tally.late_minutes,
        gross,
        late_cut,
        absent_cut,
        net,
        rates_defaulted,
    }
}

fn summarize(rows: &[PayrollRow]) -> PayrollSummary {
    PayrollSummary {
        employees: rows.len(),
        total_gross: rows.iter().map(|r| r.gross).sum(),
        total_net: rows.iter().map(|r| r.net).sum(),
        total_late_minutes: rows.iter().map(|r| u64::from(r.late_minutes)).sum(),
        total_absent: rows.iter().map(|r| u64::from(r.absent)).sum(),
    }
}

/// One row per employee over the inclusive `range`, ordered by branch name
/// then employee name. An inverted range yields an empty preview.
///
/// Days outside the range are ignored and a repeated employee/date is
/// counted once.
pub fn compute_payroll(
    employees: &[Employee],
    branches: &HashMap<u64, Branch>,
    days: &[PayrollDay],
    rule_sets: &HashMap<u64, ShiftRuleSet>,
    range: DateRange,
) -> PayrollPreview {
    if range.is_empty() {
        tracing::debug!(from = %range.from, to = %range.to, "Empty payroll range");
        return PayrollPreview::default();
    }

    let mut by_employee: HashMap<u64, BTreeMap<NaiveDate, &PayrollDay>> = HashMap::new();
    for day in days.iter().filter(|d| range.contains(d.date)) {
        by_employee
            .entry(day.employee_id)
            .or_default()
            .entry(day.date)
            .or_insert(day);
    }

    let mut rows: Vec<PayrollRow> = employees
        .iter()
        .map(|employee| {
            let rates = branch_pay_rates(rule_sets.get(&employee.branch_id));
            if rates.is_defaulted() {
                tracing::warn!(
                    employee_id = employee.id,
                    branch_id = employee.branch_id,
                    "No pay rule configured for branch, using zero rates"
                );
            }

            let tally = by_employee
                .get(&employee.id)
                .map(|days| tally(days.values().copied()))
                .unwrap_or_default();

            let branch_name = branches
                .get(&employee.branch_id)
                .map(|b| b.name.clone())
                .unwrap_or_default();

            price(employee, branch_name, tally, rates)
        })
        .collect();

    rows.sort_by(|a, b| a.branch.cmp(&b.branch).then_with(|| a.name.cmp(&b.name)));

    let summary = summarize(&rows);
    PayrollPreview { rows, summary }
}
