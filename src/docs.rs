use crate::api::approvals::{ApprovalFilter, ApprovalListResponse};
use crate::api::attendance::{AttendanceListResponse, AttendanceQuery};
use crate::api::kiosk::{ApprovalRequest, PunchReceipt, PunchRequest};
use crate::api::payroll::PayrollQuery;
use crate::model::approval::{ApprovalRecord, ApprovalStatus, ApprovalType};
use crate::model::attendance::{AttendanceStatus, FinalStatus, PunchFlag, PunchMode};
use crate::model::branch::Branch;
use crate::model::payroll::{PayrollPreview, PayrollRow, PayrollSummary};
use crate::service::filter::DatePreset;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "kiosk_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Payroll Preview API",
        version = "1.0.0",
        description = r#"
## Branch Attendance Service

Kiosk punches, exception approvals and the reviewer views built on top of them.

### 🔹 Key Features
- **Kiosk**
  - Check-in and check-out with geofence and shift evaluation
  - Exception requests (missing punch, outside radius, leave, manual correction)
- **Attendance**
  - Day rows reconciled with approved requests, filterable and exportable as CSV
- **Approvals**
  - Review queue, approve or reject pending requests
- **Payroll**
  - Per-employee preview of presence, lateness and deductions

### 🔐 Security
Reviewer endpoints take a **JWT Bearer** token (ADMIN or SPV).
Kiosk endpoints take the kiosk session token as a Bearer token.

### 📦 Response Format
- JSON-based RESTful responses
- Errors as `{ "ok": false, "code": "...", "message": "..." }`
"#,
    ),
    paths(
        crate::api::kiosk::check_in,
        crate::api::kiosk::check_out,
        crate::api::kiosk::create_request,

        crate::api::attendance::list_attendance,
        crate::api::attendance::export_attendance,

        crate::api::approvals::list_approvals,
        crate::api::approvals::approve,
        crate::api::approvals::reject,

        crate::api::payroll::payroll_preview
    ),
    components(
        schemas(
            PunchRequest,
            PunchReceipt,
            ApprovalRequest,
            AttendanceQuery,
            AttendanceListResponse,
            ApprovalFilter,
            ApprovalListResponse,
            ApprovalRecord,
            ApprovalType,
            ApprovalStatus,
            PayrollQuery,
            PayrollPreview,
            PayrollRow,
            PayrollSummary,
            Branch,
            DatePreset,
            PunchMode,
            PunchFlag,
            FinalStatus,
            AttendanceStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Kiosk", description = "Kiosk punch and request APIs"),
        (name = "Attendance", description = "Reconciled attendance APIs"),
        (name = "Approvals", description = "Exception review APIs"),
        (name = "Payroll", description = "Payroll preview APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/kiosk/check-in",
            "/kiosk/check-out",
            "/kiosk/requests",
            "/api/attendance",
            "/api/attendance/export",
            "/api/approvals",
            "/api/approvals/{approval_id}/approve",
            "/api/approvals/{approval_id}/reject",
            "/api/payroll/preview",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
        assert!(schemes.contains_key("kiosk_token"));
    }
}
