use crate::{
    api::{approvals, attendance, kiosk, payroll},
    auth::middleware::auth_middleware,
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::time::Duration;

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-scope rate limits, built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    kiosk: LimiterConfig,
    protected: LimiterConfig,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            kiosk: build_limiter(config.rate_kiosk_per_min).context("Invalid kiosk rate limit")?,
            protected: build_limiter(config.rate_protected_per_min)
                .context("Invalid protected rate limit")?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Option<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .period(Duration::from_millis(per_ms))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

// Malformed bodies and query strings share the `{ok, code, message}` envelope.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation("INVALID_BODY", err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::validation("INVALID_QUERY", err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.app_data(json_config()).app_data(query_config());

    // Kiosk routes, authenticated by kiosk session token
    cfg.service(
        web::scope(&config.kiosk_prefix)
            .wrap(Governor::new(&limiters.kiosk))
            .service(web::resource("/check-in").route(web::post().to(kiosk::check_in)))
            .service(web::resource("/check-out").route(web::post().to(kiosk::check_out)))
            .service(web::resource("/requests").route(web::post().to(kiosk::create_request))),
    );

    // Reviewer routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limiters.protected)) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/export
                    .service(
                        web::resource("/export").route(web::get().to(attendance::export_attendance)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll/preview
                    .service(web::resource("/preview").route(web::get().to(payroll::payroll_preview))),
            )
            .service(
                web::scope("/approvals")
                    // /approvals
                    .service(web::resource("").route(web::get().to(approvals::list_approvals)))
                    // /approvals/{id}/approve
                    .service(web::resource("/{id}/approve").route(web::put().to(approvals::approve)))
                    // /approvals/{id}/reject
                    .service(web::resource("/{id}/reject").route(web::put().to(approvals::reject))),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_zero_and_large_rates() {
        assert!(build_limiter(0).is_some());
        assert!(build_limiter(60).is_some());
        assert!(build_limiter(120_000).is_some());
    }
}
