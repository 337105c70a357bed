use std::collections::HashMap;

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Paging, optional_date, unless_all};
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceStatus;
use crate::repository::AttendanceStore;
use crate::repository::mysql::MySqlStore;
use crate::service::csv_export::to_csv;
use crate::service::day_assembly::assemble_days;
use crate::service::enrich::{EnrichedRow, enrich};
use crate::service::filter::{AttendanceFilters, DatePreset, apply_filters, resolve_date_range};
use crate::service::shift::rule_sets_by_branch;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Free-text search over name, employee number, branch and shift
    #[schema(example = "aji")]
    pub q: Option<String>,
    /// Branch code, or ALL
    #[schema(example = "CBG_002")]
    pub branch: Option<String>,
    /// on_time | late | missing_in | missing_out | leave, or ALL
    #[schema(example = "late")]
    pub status: Option<String>,
    /// today | 7d | 30d | custom
    pub preset: Option<DatePreset>,
    /// Custom range start (YYYY-MM-DD)
    #[schema(example = "2026-02-01")]
    pub from: Option<String>,
    /// Custom range end (YYYY-MM-DD)
    #[schema(example = "2026-02-28")]
    pub to: Option<String>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl AttendanceQuery {
    pub fn filters(&self) -> AppResult<AttendanceFilters> {
        let status = unless_all(self.status.as_deref())
            .map(|s| {
                s.parse::<AttendanceStatus>().map_err(|_| {
                    AppError::validation("INVALID_STATUS", format!("Unknown attendance status `{s}`"))
                })
            })
            .transpose()?;

        Ok(AttendanceFilters {
            q: self.q.clone(),
            branch: unless_all(self.branch.as_deref()).map(str::to_string),
            status,
            preset: self.preset.unwrap_or_default(),
            from: optional_date(self.from.as_deref(), "from")?,
            to: optional_date(self.to.as_deref(), "to")?,
        })
    }
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [{
        "date": "2026-02-05",
        "employee_id": 27,
        "emp_no": "EMP027",
        "employee_name": "Aji Fajar Permana",
        "branch_id": 2,
        "branch_name": "Klaten",
        "branch_code": "CBG_002",
        "check_in": "08:25",
        "check_out": "16:02",
        "late_minutes": 15,
        "radius_meters": 200.0,
        "location_flag": "ok",
        "shift_detected": "SHIFT_1",
        "in_distance_meters": 12.4,
        "out_distance_meters": 18.9,
        "in_ok": true,
        "out_ok": true,
        "resolved_status": "late"
    }],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct AttendanceListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<EnrichedRow>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Loads, reconciles and filters attendance rows for `filters` as of
/// `today`. `branch_scope` limits every read to one branch.
pub async fn load_enriched<S: AttendanceStore>(
    store: &S,
    filters: &AttendanceFilters,
    branch_scope: Option<u64>,
    today: NaiveDate,
) -> AppResult<Vec<EnrichedRow>> {
    let bounds = resolve_date_range(filters.preset, today, filters.from, filters.to);

    let branches: HashMap<u64, _> = store
        .branches()
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let employees: HashMap<u64, _> = store
        .employees(branch_scope)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let rule_sets = rule_sets_by_branch(store.shift_rules(branch_scope).await?)?;
    let logs = store.attendance_logs(bounds, branch_scope).await?;
    let approvals = store.approvals(bounds).await?;

    let days = assemble_days(&logs, &employees, &branches);
    let rows = enrich(&days, &approvals, &rule_sets, &branches);

    tracing::debug!(
        punches = logs.len(),
        days = days.len(),
        approvals = approvals.len(),
        "Attendance reconciled"
    );

    Ok(apply_filters(rows, filters, today))
}

/// Enriched attendance rows
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance rows", body = AttendanceListResponse),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Shift rules of a branch overlap")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<impl Responder> {
    let scope = auth.branch_scope(None)?;
    let filters = query.filters()?;
    let paging = Paging::new(query.page, query.per_page);

    let rows = load_enriched(store.get_ref(), &filters, scope, Local::now().date_naive()).await?;
    let total = rows.len() as i64;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: paging.slice(rows),
        page: paging.page as u32,
        per_page: paging.per_page as u32,
        total,
    }))
}

/// CSV export of the filtered attendance rows
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<impl Responder> {
    let scope = auth.branch_scope(None)?;
    let filters = query.filters()?;
    let today = Local::now().date_naive();

    let rows = load_enriched(store.get_ref(), &filters, scope, today).await?;
    let csv = to_csv(&rows).map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = auth.user_id, rows = rows.len(), "Attendance exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format!("attendance-{today}.csv"))],
        })
        .body(csv))
}
