use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Transaction, TransactionStatus};
use crate::services::notify;
use crate::state::AppState;

// GET /api/transactions
#[derive(Deserialize)]
pub struct ListTransactionsQuery {
    pub user_id: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let transactions = {
        let db = state.db.lock().unwrap();
        queries::list_transactions(&db, query.user_id, limit)?
    };
    Ok(Json(transactions))
}

// POST /api/transactions/:id/status
//
// Bookkeeping correction only. Flipping a status moves no money; refunds
// go through reservation cancellation.
#[derive(Deserialize)]
pub struct UpdateTransactionStatusRequest {
    pub status: String,
}

pub async fn update_transaction_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(transaction_id): Path<i64>,
    Json(body): Json<UpdateTransactionStatusRequest>,
) -> Result<Json<Transaction>, AppError> {
    let caller = auth::authenticate(&state, &headers).await?;
    auth::require_admin(&caller)?;

    let status = TransactionStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("invalid transaction status".to_string()))?;

    let transaction = {
        let db = state.db.lock().unwrap();
        if !queries::update_transaction_status(&db, transaction_id, status)? {
            return Err(AppError::NotFound("transaction"));
        }
        queries::get_transaction(&db, transaction_id)?.ok_or(AppError::NotFound("transaction"))?
    };

    notify::emit(
        &state,
        "transaction.status_changed",
        "transaction",
        &transaction.id.to_string(),
        serde_json::json!({
            "transaction_id": transaction.id,
            "status": transaction.status,
        }),
    )
    .await;

    Ok(Json(transaction))
}
