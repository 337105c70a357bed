use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Paging, unless_all};
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult, ConflictCode};
use crate::model::approval::{ApprovalRecord, ApprovalStatus};
use crate::repository::mysql::MySqlStore;
use crate::repository::{ApprovalQuery, AttendanceStore};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ApprovalFilter {
    #[schema(example = 27)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// pending | approved | rejected, or ALL
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

impl ApprovalFilter {
    /// `branch_id` is the caller's branch scope, not a user filter.
    pub fn query(&self, branch_id: Option<u64>) -> AppResult<ApprovalQuery> {
        let status = unless_all(self.status.as_deref())
            .map(|s| {
                s.parse::<ApprovalStatus>().map_err(|_| {
                    AppError::validation("INVALID_STATUS", format!("Unknown approval status `{s}`"))
                })
            })
            .transpose()?;
        let paging = Paging::new(self.page, self.per_page);

        Ok(ApprovalQuery {
            employee_id: self.employee_id,
            branch_id,
            status,
            page: paging.page,
            per_page: paging.per_page,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct ApprovalListResponse {
    pub data: Vec<ApprovalRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Moves a pending approval to `status`; anything else is a conflict.
/// A scoped caller may only decide approvals of its own branch.
pub async fn decide<S: AttendanceStore>(
    store: &S,
    id: u64,
    status: ApprovalStatus,
    branch_scope: Option<u64>,
) -> AppResult<()> {
    if let Some(own) = branch_scope {
        if store.approval_branch(id).await?.is_some_and(|b| b != own) {
            return Err(AppError::Forbidden("Approval belongs to another branch".to_string()));
        }
    }

    if store.decide_approval(id, status).await? {
        Ok(())
    } else {
        Err(AppError::conflict(
            ConflictCode::ApprovalNotPending,
            "Approval not found or already processed",
        ))
    }
}

/// List approval requests
#[utoipa::path(
    get,
    path = "/api/approvals",
    params(ApprovalFilter),
    responses(
        (status = 200, description = "Paginated approval list", body = ApprovalListResponse),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn list_approvals(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    filter: web::Query<ApprovalFilter>,
) -> AppResult<impl Responder> {
    auth.require_reviewer()?;
    let scope = auth.branch_scope(None)?;

    let query = filter.query(scope)?;
    let (data, total) = store.list_approvals(&query).await?;

    Ok(HttpResponse::Ok().json(ApprovalListResponse {
        data,
        page: query.page as u32,
        per_page: query.per_page as u32,
        total,
    }))
}

/// Approve a pending request
#[utoipa::path(
    put,
    path = "/api/approvals/{approval_id}/approve",
    params(
        ("approval_id" = u64, Path, description = "ID of the approval to approve")
    ),
    responses(
        (status = 200, description = "Approved", body = Object, example = json!({
            "ok": true,
            "message": "Approval approved"
        })),
        (status = 409, description = "Approval not found or already processed", body = Object, example = json!({
            "ok": false,
            "code": "APPROVAL_NOT_PENDING",
            "message": "Approval not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn approve(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_reviewer()?;
    let scope = auth.branch_scope(None)?;

    let approval_id = path.into_inner();
    decide(store.get_ref(), approval_id, ApprovalStatus::Approved, scope).await?;

    tracing::info!(approval_id, user_id = auth.user_id, "Approval approved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "message": "Approval approved"
    })))
}

/// Reject a pending request
#[utoipa::path(
    put,
    path = "/api/approvals/{approval_id}/reject",
    params(
        ("approval_id" = u64, Path, description = "ID of the approval to reject")
    ),
    responses(
        (status = 200, description = "Rejected", body = Object, example = json!({
            "ok": true,
            "message": "Approval rejected"
        })),
        (status = 409, description = "Approval not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn reject(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> AppResult<impl Responder> {
    auth.require_reviewer()?;
    let scope = auth.branch_scope(None)?;

    let approval_id = path.into_inner();
    decide(store.get_ref(), approval_id, ApprovalStatus::Rejected, scope).await?;

    tracing::info!(approval_id, user_id = auth.user_id, "Approval rejected");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "message": "Approval rejected"
    })))
}
