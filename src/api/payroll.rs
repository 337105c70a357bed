use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::optional_date;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::payroll::{PayrollDay, PayrollPreview};
use crate::repository::AttendanceStore;
use crate::repository::mysql::MySqlStore;
use crate::service::day_assembly::assemble_days;
use crate::service::enrich::enrich;
use crate::service::payroll::compute_payroll;
use crate::service::shift::rule_sets_by_branch;
use crate::utils::time::DateRange;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    /// Period start (YYYY-MM-DD, inclusive)
    #[schema(example = "2026-02-01")]
    pub from: String,
    /// Period end (YYYY-MM-DD, inclusive)
    #[schema(example = "2026-02-28")]
    pub to: String,
    /// Limit the preview to one branch
    #[schema(example = 2)]
    pub branch_id: Option<u64>,
}

impl PayrollQuery {
    pub fn range(&self) -> AppResult<DateRange> {
        let from = optional_date(Some(self.from.as_str()), "from")?;
        let to = optional_date(Some(self.to.as_str()), "to")?;
        match (from, to) {
            (Some(from), Some(to)) => Ok(DateRange::new(from, to)),
            _ => Err(AppError::validation("INVALID_DATE", "from and to are required")),
        }
    }
}

/// Payroll preview over `range`: approvals merged and statuses resolved
/// exactly as on the attendance screen, then priced per branch.
pub async fn preview_payroll<S: AttendanceStore>(
    store: &S,
    range: DateRange,
    branch_id: Option<u64>,
) -> AppResult<PayrollPreview> {
    if range.is_empty() {
        return Ok(PayrollPreview::default());
    }

    let branches: HashMap<u64, _> = store
        .branches()
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let employees = store.employees(branch_id).await?;
    let by_id: HashMap<u64, _> = employees.iter().map(|e| (e.id, e.clone())).collect();
    let rule_sets = rule_sets_by_branch(store.shift_rules(branch_id).await?)?;

    let logs = store.attendance_logs(range.into(), branch_id).await?;
    let approvals = store.approvals(range.into()).await?;

    let days = assemble_days(&logs, &by_id, &branches);
    let payroll_days: Vec<PayrollDay> = enrich(&days, &approvals, &rule_sets, &branches)
        .iter()
        .map(PayrollDay::from)
        .collect();

    Ok(compute_payroll(&employees, &branches, &payroll_days, &rule_sets, range))
}

/// Payroll preview for a period
#[utoipa::path(
    get,
    path = "/api/payroll/preview",
    params(PayrollQuery),
    responses(
        (status = 200, description = "Per-employee payroll preview", body = PayrollPreview),
        (status = 400, description = "Missing or malformed dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Shift rules of a branch overlap")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payroll_preview(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<PayrollQuery>,
) -> AppResult<impl Responder> {
    auth.require_admin()?;

    let range = query.range()?;
    let preview = preview_payroll(store.get_ref(), range, query.branch_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        from = %range.from,
        to = %range.to,
        employees = preview.summary.employees,
        "Payroll preview computed"
    );

    Ok(HttpResponse::Ok().json(preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::approval_merge::tests::approval;
    use crate::service::day_assembly::tests::{branch, employee, punch};
    use crate::service::shift::tests::rule;
    use crate::api::kiosk::{PunchRequest, record_check_in};
    use crate::model::kiosk_session::KioskSession;
    use crate::repository::memory::InMemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn store() -> InMemoryStore {
        let mut shift = rule("SHIFT_1", "05:00", "10:59", "08:00", 10);
        shift.branch_id = 2;
        shift.daily_rate = Some(dec!(100000));
        shift.late_penalty_per_minute = Some(dec!(1000));
        shift.absence_penalty = Some(dec!(50000));

        let mut forgot_in = approval(9, "missing_in", "approved");
        forgot_in.date = d(4);

        InMemoryStore::new()
            .with_branch(branch(2, "CBG_002", "Klaten", -7.705, 110.606))
            .with_employee(employee(1, "EMP027", "Aji", 2))
            .with_rule(shift)
            // late 15
            .with_log(punch(1, 1, d(3), "IN", "08:25"))
            .with_log(punch(2, 1, d(3), "OUT", "16:00"))
            // out only, confirmed missing_in
            .with_log(punch(3, 1, d(4), "OUT", "16:00"))
            .with_log(punch(4, 1, d(5), "IN", "07:55"))
            .with_log(punch(5, 1, d(5), "OUT", "16:00"))
            .with_approval(forgot_in)
    }

    #[actix_web::test]
    async fn prices_reconciled_days() {
        let preview = preview_payroll(&store(), DateRange::new(d(1), d(28)), None)
            .await
            .unwrap();

        let row = &preview.rows[0];
        assert_eq!(row.present, 2);
        assert_eq!(row.absent, 1);
        assert_eq!(row.late_minutes, 15);
        assert_eq!(row.gross, dec!(200000));
        assert_eq!(row.net, dec!(135000));
        assert_eq!(preview.summary.total_absent, 1);
    }

    #[actix_web::test]
    async fn approved_leave_is_not_absence() {
        let mut leave = approval(10, "leave", "approved");
        leave.date = d(6);
        let store = store()
            .with_log(punch(6, 1, d(6), "OUT", "12:00"))
            .with_approval(leave);

        let preview = preview_payroll(&store, DateRange::new(d(6), d(6)), None)
            .await
            .unwrap();
        assert_eq!((preview.rows[0].present, preview.rows[0].absent), (0, 0));
    }

    #[actix_web::test]
    async fn lateness_follows_the_shift_chosen_at_the_kiosk() {
        let mut afternoon = rule("SHIFT_2", "11:00", "15:59", "13:00", 10);
        afternoon.branch_id = 2;
        let store = store().with_rule(afternoon);
        let session = KioskSession {
            id: 1,
            token: "tok".into(),
            expires_at: d(7).and_hms_opt(23, 59, 0).unwrap(),
            branch: branch(2, "CBG_002", "Klaten", -7.705, 110.606),
            employee: employee(1, "EMP027", "Aji", 2),
        };
        let req = PunchRequest {
            shift_code: Some("SHIFT_2".into()),
            lat: Some(-7.7051),
            lng: Some(110.6061),
            ..Default::default()
        };

        let receipt = record_check_in(&store, &session, &req, d(7).and_hms_opt(8, 30, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(receipt.late_minutes, 0);

        let preview = preview_payroll(&store, DateRange::new(d(7), d(7)), None)
            .await
            .unwrap();
        assert_eq!(preview.rows[0].late_minutes, 0);
        assert_eq!(preview.rows[0].late_cut, dec!(0));
        assert_eq!(preview.rows[0].present, 1);
    }

    #[actix_web::test]
    async fn inverted_range_is_empty() {
        let preview = preview_payroll(&store(), DateRange::new(d(10), d(1)), None)
            .await
            .unwrap();
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn range_requires_both_dates() {
        let q = PayrollQuery {
            from: "2026-02-01".into(),
            to: "".into(),
            branch_id: None,
        };
        assert_eq!(q.range().unwrap_err().code(), "INVALID_DATE");

        let q = PayrollQuery {
            from: "2026-02-01".into(),
            to: "2026-02-28".into(),
            branch_id: None,
        };
        assert_eq!(q.range().unwrap(), DateRange::new(d(1), d(28)));
    }
}
