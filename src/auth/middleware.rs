use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::AuthUser;
use crate::auth::jwt::{bearer_token, verify_token};
use crate::config::Config;
use crate::error::AppError;

fn reject(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response().map_into_boxed_body())
}

/// Verifies the bearer token of every request in a protected scope and
/// stores the resulting [`AuthUser`] in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(config) = req.app_data::<Data<Config>>().cloned() else {
        return Ok(reject(req, AppError::Internal("App config missing".to_string())));
    };

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return Ok(reject(
            req,
            AppError::unauthorized("NO_TOKEN", "Missing Authorization header"),
        ));
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return Ok(reject(
                req,
                AppError::unauthorized("INVALID_TOKEN", "Invalid or expired token"),
            ));
        }
    };

    let user = AuthUser::from(claims);
    if !user.role.can_review() {
        return Ok(reject(req, AppError::Forbidden("Admin/Supervisor only".to_string())));
    }

    req.extensions_mut().insert(user);

    next.call(req).await
}
