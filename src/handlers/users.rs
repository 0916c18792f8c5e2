use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::booking;
use crate::services::notify;
use crate::state::AppState;

// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    if !caller.is_admin() && caller.id != user_id {
        return Err(AppError::Forbidden);
    }

    let user = {
        let db = state.db.lock().unwrap();
        queries::get_user(&db, user_id)?
    };
    user.map(Json).ok_or(AppError::NotFound("user"))
}

// POST /api/users/:id/balance
#[derive(Deserialize)]
pub struct AdjustBalanceRequest {
    pub delta_cents: i64,
    pub note: Option<String>,
}

pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Json(body): Json<AdjustBalanceRequest>,
) -> Result<Json<User>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    let user = {
        let mut db = state.db.lock().unwrap();
        booking::adjust_balance(&mut db, user_id, body.delta_cents, body.note.as_deref())?
    };

    notify::emit(
        &state,
        "user.balance_changed",
        "user",
        &user.id.to_string(),
        serde_json::json!({
            "user_id": user.id,
            "delta_cents": body.delta_cents,
            "balance_cents": user.balance_cents,
        }),
    )
    .await;

    Ok(Json(user))
}
