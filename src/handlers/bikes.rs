use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Bike, BikeStatus};
use crate::services::availability;
use crate::services::clock;
use crate::services::hours;
use crate::services::notify;
use crate::state::AppState;

// GET /api/bikes
//
// Plain fleet list by default. With location_id, date, start_time and
// duration (hours) the list narrows to bikes free for that window,
// buffer included.
#[derive(Deserialize)]
pub struct ListBikesQuery {
    pub location_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub duration: Option<f64>,
}

pub async fn list_bikes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBikesQuery>,
) -> Result<Json<Vec<Bike>>, AppError> {
    let wants_window =
        query.date.is_some() || query.start_time.is_some() || query.duration.is_some();
    if !wants_window {
        let bikes = {
            let db = state.db.lock().unwrap();
            queries::list_bikes(&db, query.location_id)?
        };
        return Ok(Json(bikes));
    }

    let (Some(location_id), Some(date), Some(start_time), Some(duration)) = (
        query.location_id,
        query.date,
        query.start_time.as_deref(),
        query.duration,
    ) else {
        return Err(AppError::Validation(
            "location_id, date, start_time and duration are all required to filter by availability"
                .to_string(),
        ));
    };

    let start_time = hours::parse_bound(start_time)
        .ok_or_else(|| AppError::Validation("start_time must be HH:MM".to_string()))?;
    let minutes = (duration * 60.0).round() as i64;
    if minutes <= 0 {
        return Err(AppError::Validation("duration must be positive".to_string()));
    }
    // Reservations never span a local day, so longer windows cannot match.
    if minutes > 24 * 60 {
        return Err(AppError::Validation(
            "duration must not exceed 24 hours".to_string(),
        ));
    }
    let start = clock::local_to_utc(date, start_time, state.config.timezone).ok_or_else(|| {
        AppError::Validation("start time does not exist on this date".to_string())
    })?;
    let end = start + Duration::minutes(minutes);
    let (buffered_start, buffered_end) = availability::buffered_window(start, end);

    let bikes = {
        let db = state.db.lock().unwrap();
        queries::list_available_bikes(
            &db,
            location_id,
            &buffered_start.naive_utc(),
            &buffered_end.naive_utc(),
        )?
    };
    Ok(Json(bikes))
}

// POST /api/bikes
#[derive(Deserialize)]
pub struct CreateBikeRequest {
    pub code: String,
    pub name: Option<String>,
    pub location_id: i64,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_bike(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBikeRequest>,
) -> Result<(StatusCode, Json<Bike>), AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    if body.code.trim().is_empty() {
        return Err(AppError::Validation("code is required".to_string()));
    }
    let status = match body.status.as_deref() {
        None => BikeStatus::Available,
        Some(raw) => BikeStatus::parse(raw)
            .ok_or_else(|| AppError::Validation("invalid bike status".to_string()))?,
    };

    let bike = {
        let db = state.db.lock().unwrap();
        queries::get_location(&db, body.location_id)?.ok_or(AppError::NotFound("location"))?;
        let id = queries::create_bike(
            &db,
            body.code.trim(),
            body.name.as_deref(),
            body.location_id,
            status,
            body.notes.as_deref(),
        )?;
        queries::get_bike(&db, id)?.ok_or(AppError::NotFound("bike"))?
    };

    Ok((StatusCode::CREATED, Json(bike)))
}

// POST /api/bikes/:id/status
#[derive(Deserialize)]
pub struct UpdateBikeStatusRequest {
    pub status: String,
}

pub async fn update_bike_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(bike_id): Path<i64>,
    Json(body): Json<UpdateBikeStatusRequest>,
) -> Result<Json<Bike>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    let status = BikeStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("invalid bike status".to_string()))?;

    let bike = {
        let db = state.db.lock().unwrap();
        if !queries::update_bike_status(&db, bike_id, status)? {
            return Err(AppError::NotFound("bike"));
        }
        queries::get_bike(&db, bike_id)?.ok_or(AppError::NotFound("bike"))?
    };

    notify::emit(
        &state,
        "bike.status_changed",
        "bike",
        &bike.id.to_string(),
        serde_json::json!({ "bike_id": bike.id, "status": bike.status }),
    )
    .await;

    Ok(Json(bike))
}
