use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::errors::AppError;
use crate::services::pricing;
use crate::state::AppState;

#[derive(Serialize, Deserialize)]
pub struct PricingSettings {
    pub fee_cents: i64,
}

// GET /api/settings/pricing
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PricingSettings>, AppError> {
    let fee_cents = {
        let db = state.db.lock().unwrap();
        pricing::reservation_fee_cents(&db, &state.config)?
    };
    Ok(Json(PricingSettings { fee_cents }))
}

// PUT /api/settings/pricing
pub async fn update_pricing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PricingSettings>,
) -> Result<Json<PricingSettings>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    if body.fee_cents < 0 {
        return Err(AppError::Validation(
            "fee_cents must not be negative".to_string(),
        ));
    }

    let fee_cents = {
        let db = state.db.lock().unwrap();
        pricing::set_reservation_fee_cents(&db, body.fee_cents)?;
        pricing::reservation_fee_cents(&db, &state.config)?
    };
    Ok(Json(PricingSettings { fee_cents }))
}
