use actix_web::{HttpRequest, HttpResponse, post, web};
use serde_json::json;

use super::AppState;
use crate::error::ApiError;

const SECRET_HEADER: &str = "x-cron-secret";

/// Shared-secret gate for the trigger interface. A missing server-side
/// secret is a configuration fault; a mismatch is a generic 401 with no
/// hint about why.
fn authorize(req: &HttpRequest, state: &AppState) -> Result<(), ApiError> {
    let expected = state.cron_secret.as_deref().ok_or(ApiError::SecretNotConfigured)?;
    let provided = req.headers().get(SECRET_HEADER).and_then(|value| value.to_str().ok());

    if provided != Some(expected) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// Run one check cycle now. Idempotent from the caller's point of view:
/// external cron triggers can fire this alongside the internal scheduler.
#[post("/cycle/run")]
pub async fn run_cycle(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    authorize(&req, &state)?;

    let summary = state.runner.run_once().await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[post("/scheduler/start")]
pub async fn start_scheduler(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    authorize(&req, &state)?;

    let started = state.scheduler.start().await;
    Ok(HttpResponse::Ok().json(json!({
        "running": state.scheduler.is_running(),
        "started": started,
    })))
}

#[post("/scheduler/stop")]
pub async fn stop_scheduler(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    authorize(&req, &state)?;

    let stopped = state.scheduler.stop().await;
    Ok(HttpResponse::Ok().json(json!({
        "running": state.scheduler.is_running(),
        "stopped": stopped,
    })))
}
