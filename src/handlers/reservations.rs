use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Reservation, ReservationStatus, Transaction};
use crate::services::booking;
use crate::services::notify;
use crate::state::AppState;

// GET /api/reservations
#[derive(Deserialize)]
pub struct ListReservationsQuery {
    pub volunteer_id: Option<i64>,
    pub bike_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            ReservationStatus::parse(raw)
                .ok_or_else(|| AppError::Validation("invalid reservation status".to_string()))?,
        ),
    };

    let reservations = {
        let db = state.db.lock().unwrap();
        queries::list_reservations(
            &db,
            queries::ReservationFilter {
                volunteer_id: query.volunteer_id,
                bike_id: query.bike_id,
                location_id: query.location_id,
                status: status.map(|s| s.as_str()),
            },
        )?
    };
    Ok(Json(reservations))
}

// GET /api/reservations/:id
pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = {
        let db = state.db.lock().unwrap();
        queries::get_reservation(&db, &reservation_id)?
    };
    reservation.map(Json).ok_or(AppError::NotFound("reservation"))
}

// POST /api/reservations
#[derive(Deserialize)]
pub struct BookReservationRequest {
    pub bike_id: i64,
    pub location_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub reservation: Reservation,
    pub transaction: Transaction,
    pub paid: bool,
}

pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookReservationRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let caller = auth::authenticate(&state, &headers).await?;

    let outcome = {
        let mut db = state.db.lock().unwrap();
        booking::book(
            &mut db,
            &state.config,
            &booking::NewReservation {
                bike_id: body.bike_id,
                location_id: body.location_id,
                volunteer_id: caller.id,
                start: body.start,
                end: body.end,
            },
        )?
    };

    notify::emit(
        &state,
        "booking.confirmed",
        "reservation",
        &outcome.reservation.id,
        serde_json::json!({
            "reservation_id": outcome.reservation.id,
            "bike_id": outcome.reservation.bike_id,
            "location_id": outcome.reservation.location_id,
            "volunteer_id": outcome.reservation.volunteer_id,
        }),
    )
    .await;
    let tx_event = if outcome.paid {
        "transaction.paid"
    } else {
        "transaction.created"
    };
    notify::emit(
        &state,
        tx_event,
        "transaction",
        &outcome.transaction.id.to_string(),
        serde_json::json!({
            "transaction_id": outcome.transaction.id,
            "reservation_id": outcome.reservation.id,
            "amount_cents": outcome.transaction.amount_cents,
            "status": outcome.transaction.status,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            reservation: outcome.reservation,
            transaction: outcome.transaction,
            paid: outcome.paid,
        }),
    ))
}

// PUT /api/reservations/:id
#[derive(Deserialize)]
pub struct UpdateReservationRequest {
    pub status: String,
}

pub async fn update_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reservation_id): Path<String>,
    Json(body): Json<UpdateReservationRequest>,
) -> Result<Json<Reservation>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;

    let new_status = ReservationStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("invalid reservation status".to_string()))?;

    let reservation = {
        let mut db = state.db.lock().unwrap();
        booking::update_status(&mut db, &caller, &reservation_id, new_status)?
    };
    Ok(Json(reservation))
}

// DELETE /api/reservations/:id
#[derive(Serialize)]
pub struct CancelResponse {
    pub reservation: Reservation,
    pub refunded_cents: i64,
    pub refund_transaction: Option<Transaction>,
}

pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reservation_id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;

    let outcome = {
        let mut db = state.db.lock().unwrap();
        booking::cancel(&mut db, &caller, &reservation_id)?
    };

    notify::emit(
        &state,
        "booking.canceled",
        "reservation",
        &outcome.reservation.id,
        serde_json::json!({
            "reservation_id": outcome.reservation.id,
            "refunded_cents": outcome.refunded_cents,
        }),
    )
    .await;

    Ok(Json(CancelResponse {
        reservation: outcome.reservation,
        refunded_cents: outcome.refunded_cents,
        refund_transaction: outcome.refund_transaction,
    }))
}
