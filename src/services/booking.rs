use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::auth::Caller;
use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Reservation, ReservationStatus, Role, Transaction, TransactionStatus, User};
use crate::services::{availability, pricing};

pub struct NewReservation {
    pub bike_id: i64,
    pub location_id: i64,
    pub volunteer_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug)]
pub struct BookingOutcome {
    pub reservation: Reservation,
    pub transaction: Transaction,
    pub paid: bool,
}

/// Books a reservation and charges the flat fee in one database
/// transaction. Validation runs inside the same transaction that inserts
/// the row, so two rival requests for the same bike can never both pass
/// the overlap check and commit.
///
/// The fee becomes a pending payment transaction plus its balancing
/// ledger pair; when the volunteer balance covers the fee it is settled
/// immediately from balance. A rejection or failure rolls everything
/// back and leaves no trace.
pub fn book(
    conn: &mut Connection,
    config: &AppConfig,
    req: &NewReservation,
) -> Result<BookingOutcome, AppError> {
    let tx = conn.transaction()?;

    availability::validate_reservation(
        &tx,
        config.timezone,
        req.bike_id,
        req.location_id,
        req.start,
        req.end,
    )?;

    let now = Utc::now().naive_utc();
    let reservation = Reservation {
        id: uuid::Uuid::new_v4().to_string(),
        bike_id: req.bike_id,
        location_id: req.location_id,
        volunteer_id: req.volunteer_id,
        start_datetime: req.start.naive_utc(),
        end_datetime: req.end.naive_utc(),
        status: ReservationStatus::Booked,
        created_at: now,
        updated_at: now,
    };
    queries::create_reservation(&tx, &reservation)?;

    let fee = pricing::reservation_fee_cents(&tx, config)?;
    let tx_id = queries::insert_transaction(
        &tx,
        &queries::NewTransaction {
            user_id: Some(req.volunteer_id),
            reservation_id: Some(&reservation.id),
            amount_cents: fee,
            currency: &config.currency,
            status: TransactionStatus::Pending,
            payment_method: None,
            provider_response: None,
        },
    )?;
    queries::insert_ledger_entry(&tx, Some(tx_id), "revenue", fee, Some("Reservation fee"))?;
    queries::insert_ledger_entry(&tx, Some(tx_id), "bank", -fee, Some("Reservation payment"))?;

    let user = queries::get_user(&tx, req.volunteer_id)?.ok_or(AppError::NotFound("user"))?;
    let mut paid = false;
    if user.balance_cents >= fee {
        queries::adjust_user_balance(&tx, req.volunteer_id, -fee)?;
        let provider_response = serde_json::json!({ "method": "balance" });
        queries::mark_transaction_paid(&tx, tx_id, "balance", &provider_response)?;
        paid = true;
    }

    let transaction =
        queries::get_transaction(&tx, tx_id)?.ok_or(AppError::NotFound("transaction"))?;

    tx.commit()?;

    Ok(BookingOutcome {
        reservation,
        transaction,
        paid,
    })
}

#[derive(Debug)]
pub struct CancelOutcome {
    pub reservation: Reservation,
    pub refunded_cents: i64,
    pub refund_transaction: Option<Transaction>,
}

/// Cancels a reservation and refunds the latest settled charge to the
/// volunteer balance. Only the owning volunteer or an admin may cancel;
/// an unknown id reports not-found before any authorization verdict.
pub fn cancel(
    conn: &mut Connection,
    caller: &Caller,
    reservation_id: &str,
) -> Result<CancelOutcome, AppError> {
    let tx = conn.transaction()?;

    let Some(reservation) = queries::get_reservation(&tx, reservation_id)? else {
        return Err(AppError::NotFound("reservation"));
    };

    if caller.role != Role::Admin && caller.id != reservation.volunteer_id {
        return Err(AppError::Forbidden);
    }

    if reservation.status == ReservationStatus::Canceled {
        return Err(AppError::Validation(
            "Reservation is already canceled".to_string(),
        ));
    }

    queries::update_reservation_status(&tx, reservation_id, ReservationStatus::Canceled)?;

    let mut refunded_cents = 0;
    let mut refund_transaction = None;
    if let Some(paid_tx) = queries::latest_paid_transaction_for_reservation(&tx, reservation_id)? {
        let amount = paid_tx.amount_cents;
        queries::adjust_user_balance(&tx, reservation.volunteer_id, amount)?;

        let provider_response = serde_json::json!({ "refunded_from": paid_tx.id });
        let refund_id = queries::insert_transaction(
            &tx,
            &queries::NewTransaction {
                user_id: Some(reservation.volunteer_id),
                reservation_id: Some(reservation_id),
                amount_cents: amount,
                currency: &paid_tx.currency,
                status: TransactionStatus::Paid,
                payment_method: Some("balance_refund"),
                provider_response: Some(&provider_response),
            },
        )?;
        queries::insert_ledger_entry(
            &tx,
            Some(refund_id),
            "refunds",
            -amount,
            Some("Reservation refund to balance"),
        )?;
        queries::insert_ledger_entry(
            &tx,
            Some(refund_id),
            "user_balance",
            amount,
            Some("Balance credit for canceled reservation"),
        )?;

        refunded_cents = amount;
        refund_transaction = queries::get_transaction(&tx, refund_id)?;
    }

    let reservation =
        queries::get_reservation(&tx, reservation_id)?.ok_or(AppError::NotFound("reservation"))?;

    tx.commit()?;

    Ok(CancelOutcome {
        reservation,
        refunded_cents,
        refund_transaction,
    })
}

/// Administrative status corrections between BOOKED and COMPLETED.
/// CANCELED is terminal and only reachable through `cancel`, which is
/// the path that releases the slot and refunds the fee.
pub fn update_status(
    conn: &mut Connection,
    caller: &Caller,
    reservation_id: &str,
    new_status: ReservationStatus,
) -> Result<Reservation, AppError> {
    let tx = conn.transaction()?;

    let Some(reservation) = queries::get_reservation(&tx, reservation_id)? else {
        return Err(AppError::NotFound("reservation"));
    };

    if caller.role != Role::Admin && caller.id != reservation.volunteer_id {
        return Err(AppError::Forbidden);
    }

    if new_status == ReservationStatus::Canceled {
        return Err(AppError::Validation(
            "Use DELETE to cancel a reservation".to_string(),
        ));
    }
    if reservation.status == ReservationStatus::Canceled {
        return Err(AppError::Validation("Reservation is canceled".to_string()));
    }

    queries::update_reservation_status(&tx, reservation_id, new_status)?;
    let updated =
        queries::get_reservation(&tx, reservation_id)?.ok_or(AppError::NotFound("reservation"))?;

    tx.commit()?;
    Ok(updated)
}

/// Manual balance credit or debit, recorded with a balancing ledger pair
/// so account totals still sum to zero. Top-ups are funded from "bank";
/// debits land on "adjustments".
pub fn adjust_balance(
    conn: &mut Connection,
    user_id: i64,
    delta_cents: i64,
    note: Option<&str>,
) -> Result<User, AppError> {
    if delta_cents == 0 {
        return Err(AppError::Validation(
            "delta_cents must be non-zero".to_string(),
        ));
    }

    let tx = conn.transaction()?;

    if !queries::adjust_user_balance(&tx, user_id, delta_cents)? {
        return Err(AppError::NotFound("user"));
    }
    let note = note.unwrap_or("Manual balance adjustment");
    let counter_account = if delta_cents > 0 { "bank" } else { "adjustments" };
    queries::insert_ledger_entry(&tx, None, "user_balance", delta_cents, Some(note))?;
    queries::insert_ledger_entry(&tx, None, counter_account, -delta_cents, Some(note))?;

    let user = queries::get_user(&tx, user_id)?.ok_or(AppError::NotFound("user"))?;
    tx.commit()?;
    Ok(user)
}
