use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono::{Local, NaiveDateTime};
use futures::future::LocalBoxFuture;

use crate::auth::jwt::bearer_token;
use crate::error::{AppError, AppResult};
use crate::model::kiosk_session::KioskSession;
use crate::repository::AttendanceStore;
use crate::repository::mysql::MySqlStore;

/// Looks up the kiosk session behind `token` and checks it is still valid
/// at `now`.
pub async fn resolve_session<S: AttendanceStore>(
    store: &S,
    token: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<KioskSession> {
    let token = token.ok_or_else(|| AppError::unauthorized("NO_TOKEN", "Kiosk token missing"))?;

    let session = store
        .kiosk_session(token)
        .await?
        .ok_or_else(|| AppError::unauthorized("INVALID_TOKEN", "Kiosk token not recognised"))?;

    if session.is_expired(now) {
        tracing::debug!(session_id = session.id, "Kiosk session expired");
        return Err(AppError::unauthorized("EXPIRED", "Kiosk session expired"));
    }

    Ok(session)
}

impl FromRequest for KioskSession {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req.headers()).map(str::to_owned);
        let store = req.app_data::<Data<MySqlStore>>().cloned();

        Box::pin(async move {
            let store = store.ok_or_else(|| AppError::Internal("Store missing".to_string()))?;
            resolve_session(store.get_ref(), token.as_deref(), Local::now().naive_local()).await
        })
    }
}
