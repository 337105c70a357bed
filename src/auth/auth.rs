use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::{bearer_token, verify_token};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::Claims;

/// A verified back-office user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Branch a supervisor is assigned to
    pub branch_id: Option<u64>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role: claims.role,
            employee_id: claims.employee_id,
            branch_id: claims.branch_id,
        }
    }
}

fn authenticate(req: &HttpRequest) -> AppResult<AuthUser> {
    // set by auth_middleware on protected scopes
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::unauthorized("NO_TOKEN", "Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".to_string()))?;

    verify_token(token, &config.jwt_secret)
        .map(AuthUser::from)
        .map_err(|_| AppError::unauthorized("INVALID_TOKEN", "Invalid or expired token"))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".to_string()))
        }
    }

    pub fn require_reviewer(&self) -> AppResult<()> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin/Supervisor only".to_string()))
        }
    }

    /// Branch the caller may see. Admins see what they ask for; supervisors
    /// are pinned to their own branch.
    pub fn branch_scope(&self, requested: Option<u64>) -> AppResult<Option<u64>> {
        match self.role {
            Role::Admin => Ok(requested),
            Role::Spv => {
                let own = self
                    .branch_id
                    .ok_or_else(|| AppError::Forbidden("Supervisor has no branch".to_string()))?;
                match requested {
                    Some(b) if b != own => Err(AppError::Forbidden("Other branch".to_string())),
                    _ => Ok(Some(own)),
                }
            }
            Role::Staff => Err(AppError::Forbidden("Admin/Supervisor only".to_string())),
        }
    }
}
