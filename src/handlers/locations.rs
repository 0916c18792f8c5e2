use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{HourException, HoursType, Location, WeeklyHours};
use crate::services::hours;
use crate::state::AppState;

// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = {
        let db = state.db.lock().unwrap();
        queries::list_locations(&db)?
    };
    Ok(Json(locations))
}

// POST /api/locations
#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub address: Option<String>,
    pub hours_type: Option<String>,
}

pub async fn create_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let hours_type = match body.hours_type.as_deref() {
        None => HoursType::Scheduled,
        Some(raw) => HoursType::parse(raw)
            .ok_or_else(|| AppError::Validation("invalid hours_type".to_string()))?,
    };

    let location = {
        let db = state.db.lock().unwrap();
        let id = queries::create_location(&db, body.name.trim(), body.address.as_deref(), hours_type)?;
        queries::get_location(&db, id)?.ok_or(AppError::NotFound("location"))?
    };

    Ok((StatusCode::CREATED, Json(location)))
}

// GET /api/locations/:id/hours
pub async fn list_weekly_hours(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<i64>,
) -> Result<Json<Vec<WeeklyHours>>, AppError> {
    let rows = {
        let db = state.db.lock().unwrap();
        queries::list_weekly_hours(&db, location_id)?
    };
    Ok(Json(rows))
}

// POST /api/locations/:id/hours
#[derive(Deserialize)]
pub struct UpsertWeeklyHoursRequest {
    pub weekday: u8,
    #[serde(default)]
    pub is_closed: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

pub async fn upsert_weekly_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(location_id): Path<i64>,
    Json(body): Json<UpsertWeeklyHoursRequest>,
) -> Result<Json<WeeklyHours>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    if body.weekday > 6 {
        return Err(AppError::Validation(
            "weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
        ));
    }
    check_bounds(body.is_closed, body.open_time.as_deref(), body.close_time.as_deref())?;

    let row = {
        let db = state.db.lock().unwrap();
        queries::get_location(&db, location_id)?.ok_or(AppError::NotFound("location"))?;
        queries::upsert_weekly_hours(
            &db,
            location_id,
            body.weekday,
            body.is_closed,
            body.open_time.as_deref(),
            body.close_time.as_deref(),
        )?;
        queries::get_weekly_hours(&db, location_id, body.weekday)?
            .ok_or(AppError::NotFound("weekly hours"))?
    };

    Ok(Json(row))
}

// GET /api/locations/:id/exceptions
pub async fn list_exceptions(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<i64>,
) -> Result<Json<Vec<HourException>>, AppError> {
    let rows = {
        let db = state.db.lock().unwrap();
        queries::list_hour_exceptions(&db, location_id)?
    };
    Ok(Json(rows))
}

// POST /api/locations/:id/exceptions
#[derive(Deserialize)]
pub struct UpsertExceptionRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_closed: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub reason: Option<String>,
}

pub async fn upsert_exception(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(location_id): Path<i64>,
    Json(body): Json<UpsertExceptionRequest>,
) -> Result<Json<HourException>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    check_bounds(body.is_closed, body.open_time.as_deref(), body.close_time.as_deref())?;

    let row = {
        let db = state.db.lock().unwrap();
        queries::get_location(&db, location_id)?.ok_or(AppError::NotFound("location"))?;
        queries::upsert_hour_exception(
            &db,
            location_id,
            body.date,
            body.is_closed,
            body.open_time.as_deref(),
            body.close_time.as_deref(),
            body.reason.as_deref(),
        )?;
        queries::get_hour_exception(&db, location_id, body.date)?
            .ok_or(AppError::NotFound("hour exception"))?
    };

    Ok(Json(row))
}

// DELETE /api/locations/:id/exceptions/:exception_id
pub async fn delete_exception(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((location_id, exception_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_hour_exception(&db, location_id, exception_id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound("hour exception"))
    }
}

// Open and close bounds are required, and must parse, unless the row
// marks the day closed.
fn check_bounds(
    is_closed: bool,
    open_time: Option<&str>,
    close_time: Option<&str>,
) -> Result<(), AppError> {
    if is_closed {
        return Ok(());
    }
    let (Some(open), Some(close)) = (open_time, close_time) else {
        return Err(AppError::Validation(
            "open_time and close_time are required unless closed".to_string(),
        ));
    };
    if hours::parse_bound(open).is_none() || hours::parse_bound(close).is_none() {
        return Err(AppError::Validation(
            "open_time and close_time must be HH:MM".to_string(),
        ));
    }
    Ok(())
}
