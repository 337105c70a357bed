use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult, ConflictCode};
use crate::model::approval::{ApprovalType, NewApproval};
use crate::model::attendance::{FinalStatus, NewPunch, PunchFlag, PunchKind};
use crate::model::kiosk_session::KioskSession;
use crate::repository::AttendanceStore;
use crate::repository::mysql::MySqlStore;
use crate::service::kiosk::{assess_punch, check_in_late_minutes, check_in_rule, parse_mode};
use crate::service::shift::{ShiftRuleSet, requested_rule};
use crate::utils::time::{format_clock, hhmm_opt};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PunchRequest {
    /// Shift the employee says they are working; detected from the clock when absent
    #[serde(default, alias = "shiftCode")]
    #[schema(example = "SHIFT_1")]
    pub shift_code: Option<String>,
    /// NORMAL | OFFSITE | WFH
    #[serde(default)]
    #[schema(example = "NORMAL")]
    pub mode: Option<String>,
    #[serde(default)]
    #[schema(example = -7.7051)]
    pub lat: Option<f64>,
    #[serde(default)]
    #[schema(example = 110.6061)]
    pub lng: Option<f64>,
    /// Reference to an already stored selfie
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl PunchRequest {
    fn coords(&self) -> Option<(f64, f64)> {
        self.lat
            .zip(self.lng)
            .filter(|(lat, lng)| lat.is_finite() && lng.is_finite())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PunchReceipt {
    pub ok: bool,
    #[schema(example = 41)]
    pub id: u64,
    #[schema(example = "Checked in")]
    pub message: String,
    #[schema(example = "SHIFT_1")]
    pub shift_code: Option<String>,
    #[schema(example = 15)]
    pub late_minutes: u32,
    #[schema(example = 12.4)]
    pub distance_meters: Option<f64>,
    pub flags: Vec<PunchFlag>,
    pub final_status: FinalStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApprovalRequest {
    #[serde(rename = "type")]
    pub kind: ApprovalType,
    #[schema(example = "2026-02-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(default)]
    #[schema(example = "Forgot to check out")]
    pub reason: Option<String>,
    #[serde(default, with = "hhmm_opt")]
    #[schema(example = "07:55", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[serde(default, with = "hhmm_opt")]
    #[schema(example = "16:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    #[serde(default)]
    pub distance_meters: Option<f64>,
}

fn blank_to_none(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Unique-key violations mean a concurrent punch won the race.
fn duplicate_as(code: ConflictCode, message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
            AppError::conflict(code, message)
        }
        _ => AppError::from(e),
    }
}

fn punch_message(kind: PunchKind, status: FinalStatus) -> String {
    let action = match kind {
        PunchKind::In => "Checked in",
        PunchKind::Out => "Checked out",
    };
    match status {
        FinalStatus::Valid => action.to_string(),
        FinalStatus::NeedReview => format!("{action}, pending review of location data"),
    }
}

pub async fn record_check_in<S: AttendanceStore>(
    store: &S,
    session: &KioskSession,
    req: &PunchRequest,
    now: NaiveDateTime,
) -> AppResult<PunchReceipt> {
    let mode = parse_mode(req.mode.as_deref())?.unwrap_or_default();
    let employee_id = session.employee.id;
    let branch = &session.branch;
    let date = now.date();
    let at = now.time().with_nanosecond(0).unwrap_or(now.time());

    if let Some(existing) = store.punch_for_day(employee_id, date, PunchKind::In).await? {
        return Err(AppError::conflict(
            ConflictCode::AlreadyCheckedIn,
            format!("Already checked in today at {}", format_clock(existing.punched_at)),
        ));
    }

    let rules = store.shift_rules(Some(branch.id)).await?;
    let rule_set = ShiftRuleSet::new(branch.id, rules.clone());
    let rule = match &rule_set {
        Ok(set) => check_in_rule(set, req.shift_code.as_deref(), at),
        Err(overlap) => {
            // An explicit shift still identifies one rule.
            let rule = requested_rule(&rules, branch.id, req.shift_code.as_deref())
                .ok_or_else(|| AppError::from(overlap.clone()))?;
            tracing::warn!(
                branch_id = branch.id,
                error = %overlap,
                shift_code = %rule.code,
                "Shift rules overlap, using requested shift"
            );
            Some(rule)
        }
    };
    let late = check_in_late_minutes(at, rule);
    if let Some(reason) = late.reason() {
        tracing::debug!(employee_id, branch_id = branch.id, ?reason, "Late minutes defaulted to zero");
    }

    let assessment = assess_punch(mode, req.coords(), branch);
    let punch = NewPunch {
        employee_id,
        branch_id: branch.id,
        date,
        punched_at: at,
        kind: PunchKind::In,
        shift_code: rule
            .map(|r| r.code.clone())
            .or_else(|| blank_to_none(req.shift_code.as_deref())),
        mode,
        lat: req.lat,
        lng: req.lng,
        distance_meters: assessment.distance_meters,
        late_minutes: late.value(),
        flags: assessment.flags,
        final_status: assessment.final_status,
        photo: blank_to_none(req.photo.as_deref()),
        note: blank_to_none(req.note.as_deref()),
    };

    let id = store
        .insert_punch(&punch)
        .await
        .map_err(duplicate_as(ConflictCode::AlreadyCheckedIn, "Already checked in today"))?;

    tracing::info!(
        punch_id = id,
        employee_id,
        branch_id = branch.id,
        late_minutes = punch.late_minutes,
        final_status = %punch.final_status,
        "Check-in recorded"
    );

    Ok(PunchReceipt {
        ok: true,
        id,
        message: punch_message(PunchKind::In, punch.final_status),
        shift_code: punch.shift_code,
        late_minutes: punch.late_minutes,
        distance_meters: punch.distance_meters,
        flags: punch.flags,
        final_status: punch.final_status,
    })
}

pub async fn record_check_out<S: AttendanceStore>(
    store: &S,
    session: &KioskSession,
    req: &PunchRequest,
    now: NaiveDateTime,
) -> AppResult<PunchReceipt> {
    let requested_mode = parse_mode(req.mode.as_deref())?;
    let employee_id = session.employee.id;
    let branch = &session.branch;
    let date = now.date();
    let at = now.time().with_nanosecond(0).unwrap_or(now.time());

    let Some(check_in) = store.punch_for_day(employee_id, date, PunchKind::In).await? else {
        return Err(AppError::conflict(
            ConflictCode::NoCheckin,
            "No check-in found for today",
        ));
    };
    if store.punch_for_day(employee_id, date, PunchKind::Out).await?.is_some() {
        return Err(AppError::conflict(
            ConflictCode::AlreadyCheckedOut,
            "Already checked out today",
        ));
    }

    let mode = requested_mode.or_else(|| check_in.mode()).unwrap_or_default();
    let assessment = assess_punch(mode, req.coords(), branch);
    let punch = NewPunch {
        employee_id,
        branch_id: branch.id,
        date,
        punched_at: at,
        kind: PunchKind::Out,
        shift_code: check_in.shift_code.clone(),
        mode,
        lat: req.lat,
        lng: req.lng,
        distance_meters: assessment.distance_meters,
        late_minutes: 0,
        flags: assessment.flags,
        final_status: assessment.final_status,
        photo: blank_to_none(req.photo.as_deref()),
        note: blank_to_none(req.note.as_deref()),
    };

    let id = store
        .insert_punch(&punch)
        .await
        .map_err(duplicate_as(ConflictCode::AlreadyCheckedOut, "Already checked out today"))?;

    tracing::info!(
        punch_id = id,
        employee_id,
        branch_id = branch.id,
        final_status = %punch.final_status,
        "Check-out recorded"
    );

    Ok(PunchReceipt {
        ok: true,
        id,
        message: punch_message(PunchKind::Out, punch.final_status),
        shift_code: punch.shift_code,
        late_minutes: 0,
        distance_meters: punch.distance_meters,
        flags: punch.flags,
        final_status: punch.final_status,
    })
}

/// Stores an exception request as `pending` for a reviewer.
pub async fn submit_request<S: AttendanceStore>(
    store: &S,
    session: &KioskSession,
    req: &ApprovalRequest,
) -> AppResult<u64> {
    if req.kind == ApprovalType::ManualCorrection && req.check_in.is_none() && req.check_out.is_none() {
        return Err(AppError::validation(
            "CORRECTION_TIME_REQUIRED",
            "A manual correction needs a check-in or check-out time",
        ));
    }

    let approval = NewApproval {
        employee_id: session.employee.id,
        date: req.date,
        kind: req.kind,
        reason: blank_to_none(req.reason.as_deref()),
        check_in: req.check_in,
        check_out: req.check_out,
        distance_meters: req.distance_meters,
        radius_meters: (req.kind == ApprovalType::OutsideRadius).then_some(session.branch.radius_meters),
    };

    let id = store.insert_approval(&approval).await?;
    tracing::info!(approval_id = id, employee_id = approval.employee_id, kind = %approval.kind, "Approval requested");
    Ok(id)
}

/// Kiosk check-in
#[utoipa::path(
    post,
    path = "/kiosk/check-in",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Check-in recorded", body = PunchReceipt),
        (status = 400, description = "Invalid mode"),
        (status = 401, description = "Missing, unknown or expired kiosk token"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "ok": false,
            "code": "ALREADY_CHECKED_IN",
            "message": "Already checked in today at 07:58"
        }))
    ),
    security(("kiosk_token" = [])),
    tag = "Kiosk"
)]
pub async fn check_in(
    session: KioskSession,
    store: web::Data<MySqlStore>,
    body: web::Json<PunchRequest>,
) -> AppResult<impl Responder> {
    let receipt = record_check_in(store.get_ref(), &session, &body, Local::now().naive_local()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// Kiosk check-out
#[utoipa::path(
    post,
    path = "/kiosk/check-out",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Check-out recorded", body = PunchReceipt),
        (status = 400, description = "Invalid mode"),
        (status = 401, description = "Missing, unknown or expired kiosk token"),
        (status = 409, description = "No check-in today, or already checked out")
    ),
    security(("kiosk_token" = [])),
    tag = "Kiosk"
)]
pub async fn check_out(
    session: KioskSession,
    store: web::Data<MySqlStore>,
    body: web::Json<PunchRequest>,
) -> AppResult<impl Responder> {
    let receipt = record_check_out(store.get_ref(), &session, &body, Local::now().naive_local()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// Submit an exception request
#[utoipa::path(
    post,
    path = "/kiosk/requests",
    request_body = ApprovalRequest,
    responses(
        (status = 201, description = "Request stored as pending", body = Object, example = json!({
            "ok": true,
            "id": 12,
            "status": "pending"
        })),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing, unknown or expired kiosk token")
    ),
    security(("kiosk_token" = [])),
    tag = "Kiosk"
)]
pub async fn create_request(
    session: KioskSession,
    store: web::Data<MySqlStore>,
    body: web::Json<ApprovalRequest>,
) -> AppResult<impl Responder> {
    let id = submit_request(store.get_ref(), &session, &body).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "ok": true,
        "id": id,
        "status": "pending"
    })))
}
