use actix_web::{HttpResponse, get, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;

const DEFAULT_ROLLUP_DAYS: u32 = 7;
const MAX_ROLLUP_DAYS: u32 = 90;

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate(raw.to_string()))
}

#[get("/endpoints")]
pub async fn list_endpoints(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let endpoints = state.store.list_endpoints().await?;
    Ok(HttpResponse::Ok().json(endpoints))
}

/// Day detail for one endpoint on one reporting-timezone calendar date.
/// A valid endpoint/date pair with no recorded checks yields a structured
/// no-data body, never an error and never 0% uptime.
#[get("/endpoints/{id}/day/{date}")]
pub async fn day_detail(
    path: web::Path<(Uuid, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (endpoint_id, raw_date) = path.into_inner();
    let date = parse_date(&raw_date)?;

    state
        .store
        .get_endpoint(endpoint_id)
        .await?
        .ok_or(ApiError::UnknownEndpoint(endpoint_id))?;

    match state.aggregator.day_detail(endpoint_id, date).await? {
        Some(detail) => Ok(HttpResponse::Ok().json(detail)),
        None => Ok(HttpResponse::Ok().json(json!({
            "no_data": true,
            "endpoint_id": endpoint_id,
            "date": date,
        }))),
    }
}

#[derive(Debug, Deserialize)]
pub struct RollupQuery {
    pub days: Option<u32>,
    pub end: Option<String>,
}

/// Multi-day status rollup across every endpoint, bucketed by
/// reporting-timezone calendar day.
#[get("/status")]
pub async fn status_rollup(
    query: web::Query<RollupQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_ROLLUP_DAYS);
    if days == 0 || days > MAX_ROLLUP_DAYS {
        return Err(ApiError::InvalidParameter(format!(
            "days must be between 1 and {MAX_ROLLUP_DAYS}"
        )));
    }

    let end_date = match &query.end {
        Some(raw) => parse_date(raw)?,
        None => state.aggregator.today(),
    };

    let series = state.aggregator.status_rollup(end_date, days).await?;
    Ok(HttpResponse::Ok().json(json!({
        "end_date": end_date,
        "days": days,
        "endpoints": series,
    })))
}
