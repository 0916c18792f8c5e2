use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::errors::AppError;
use crate::services::timebar::{self, TimebarSlot};
use crate::state::AppState;

// GET /api/availability/timebar
#[derive(Deserialize)]
pub struct TimebarQuery {
    pub location_id: i64,
    pub date: NaiveDate,
    pub duration: Option<f64>,
}

#[derive(Serialize)]
pub struct TimebarResponse {
    pub location_id: i64,
    pub date: NaiveDate,
    pub duration: f64,
    pub slots: Vec<TimebarSlot>,
}

pub async fn get_timebar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TimebarQuery>,
) -> Result<Json<TimebarResponse>, AppError> {
    auth::authenticate(&state, &headers).await?;

    let duration = query.duration.unwrap_or(1.0);
    let minutes = (duration * 60.0).round() as i64;
    if minutes <= 0 {
        return Err(AppError::Validation("duration must be positive".to_string()));
    }
    // The slot grid covers a single day; longer durations can never fit.
    if minutes > 24 * 60 {
        return Err(AppError::Validation(
            "duration must not exceed 24 hours".to_string(),
        ));
    }

    let slots = {
        let db = state.db.lock().unwrap();
        timebar::timebar(&db, state.config.timezone, query.location_id, query.date, minutes)?
    };

    Ok(Json(TimebarResponse {
        location_id: query.location_id,
        date: query.date,
        duration,
        slots,
    }))
}
