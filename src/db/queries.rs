use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{named_params, params, Connection};

use crate::models::{
    Bike, BikeStatus, HourException, HoursType, LedgerEntry, Location, Reservation,
    ReservationStatus, Role, Transaction, TransactionStatus, User, WeeklyHours,
};

// ── Users & tokens ──

pub fn create_user(
    conn: &Connection,
    email: &str,
    name: &str,
    role: Role,
    balance_cents: i64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, name, role, balance_cents) VALUES (?1, ?2, ?3, ?4)",
        params![email, name, role.as_str(), balance_cents],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, email, name, role, balance_cents, is_active FROM users WHERE id = ?1",
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT u.id, u.email, u.name, u.role, u.balance_cents, u.is_active
         FROM api_tokens t JOIN users u ON u.id = t.user_id
         WHERE t.token = ?1",
        params![token],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_api_token(conn: &Connection, token: &str, user_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO api_tokens (token, user_id) VALUES (?1, ?2)",
        params![token, user_id],
    )?;
    Ok(())
}

/// Applies a signed delta to a user balance. Returns false when the user
/// does not exist. Callers are responsible for writing the matching
/// ledger rows in the same database transaction.
pub fn adjust_user_balance(conn: &Connection, user_id: i64, delta_cents: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET balance_cents = balance_cents + ?1 WHERE id = ?2",
        params![delta_cents, user_id],
    )?;
    Ok(count > 0)
}

// ── Locations ──

pub fn create_location(
    conn: &Connection,
    name: &str,
    address: Option<&str>,
    hours_type: HoursType,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO locations (name, address, hours_type) VALUES (?1, ?2, ?3)",
        params![name, address, hours_type.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_location(conn: &Connection, id: i64) -> anyhow::Result<Option<Location>> {
    let result = conn.query_row(
        "SELECT id, name, address, hours_type, created_at FROM locations WHERE id = ?1",
        params![id],
        |row| Ok(parse_location_row(row)),
    );

    match result {
        Ok(location) => Ok(Some(location?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_locations(conn: &Connection) -> anyhow::Result<Vec<Location>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, hours_type, created_at FROM locations ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_location_row(row)))?;

    let mut locations = vec![];
    for row in rows {
        locations.push(row??);
    }
    Ok(locations)
}

// ── Weekly hours & exceptions ──

pub fn upsert_weekly_hours(
    conn: &Connection,
    location_id: i64,
    weekday: u8,
    is_closed: bool,
    open_time: Option<&str>,
    close_time: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO location_weekly_hours (location_id, weekday, is_closed, open_time, close_time)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(location_id, weekday) DO UPDATE SET
           is_closed = excluded.is_closed,
           open_time = excluded.open_time,
           close_time = excluded.close_time",
        params![location_id, weekday, is_closed, open_time, close_time],
    )?;
    Ok(())
}

pub fn get_weekly_hours(
    conn: &Connection,
    location_id: i64,
    weekday: u8,
) -> anyhow::Result<Option<WeeklyHours>> {
    let result = conn.query_row(
        "SELECT id, location_id, weekday, is_closed, open_time, close_time
         FROM location_weekly_hours WHERE location_id = ?1 AND weekday = ?2",
        params![location_id, weekday],
        |row| Ok(parse_weekly_row(row)),
    );

    match result {
        Ok(hours) => Ok(Some(hours?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_weekly_hours(conn: &Connection, location_id: i64) -> anyhow::Result<Vec<WeeklyHours>> {
    let mut stmt = conn.prepare(
        "SELECT id, location_id, weekday, is_closed, open_time, close_time
         FROM location_weekly_hours WHERE location_id = ?1 ORDER BY weekday ASC",
    )?;
    let rows = stmt.query_map(params![location_id], |row| Ok(parse_weekly_row(row)))?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row??);
    }
    Ok(hours)
}

pub fn upsert_hour_exception(
    conn: &Connection,
    location_id: i64,
    date: NaiveDate,
    is_closed: bool,
    open_time: Option<&str>,
    close_time: Option<&str>,
    reason: Option<&str>,
) -> anyhow::Result<i64> {
    let date_str = date.format("%Y-%m-%d").to_string();
    conn.execute(
        "INSERT INTO location_hour_exceptions (location_id, date, is_closed, open_time, close_time, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(location_id, date) DO UPDATE SET
           is_closed = excluded.is_closed,
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           reason = excluded.reason",
        params![location_id, date_str, is_closed, open_time, close_time, reason],
    )?;

    let id = conn.query_row(
        "SELECT id FROM location_hour_exceptions WHERE location_id = ?1 AND date = ?2",
        params![location_id, date_str],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub fn get_hour_exception(
    conn: &Connection,
    location_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Option<HourException>> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let result = conn.query_row(
        "SELECT id, location_id, date, is_closed, open_time, close_time, reason
         FROM location_hour_exceptions WHERE location_id = ?1 AND date = ?2",
        params![location_id, date_str],
        |row| Ok(parse_exception_row(row)),
    );

    match result {
        Ok(exception) => Ok(Some(exception?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_hour_exceptions(
    conn: &Connection,
    location_id: i64,
) -> anyhow::Result<Vec<HourException>> {
    let mut stmt = conn.prepare(
        "SELECT id, location_id, date, is_closed, open_time, close_time, reason
         FROM location_hour_exceptions WHERE location_id = ?1 ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(params![location_id], |row| Ok(parse_exception_row(row)))?;

    let mut exceptions = vec![];
    for row in rows {
        exceptions.push(row??);
    }
    Ok(exceptions)
}

pub fn delete_hour_exception(
    conn: &Connection,
    location_id: i64,
    exception_id: i64,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM location_hour_exceptions WHERE id = ?1 AND location_id = ?2",
        params![exception_id, location_id],
    )?;
    Ok(count > 0)
}

// ── Bikes ──

pub fn create_bike(
    conn: &Connection,
    code: &str,
    name: Option<&str>,
    location_id: i64,
    status: BikeStatus,
    notes: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bikes (code, name, location_id, status, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![code, name, location_id, status.as_str(), notes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bike(conn: &Connection, id: i64) -> anyhow::Result<Option<Bike>> {
    let result = conn.query_row(
        "SELECT id, code, name, location_id, status, notes, created_at FROM bikes WHERE id = ?1",
        params![id],
        |row| Ok(parse_bike_row(row)),
    );

    match result {
        Ok(bike) => Ok(Some(bike?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bikes(conn: &Connection, location_id: Option<i64>) -> anyhow::Result<Vec<Bike>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match location_id {
        Some(location_id) => (
            "SELECT id, code, name, location_id, status, notes, created_at
             FROM bikes WHERE location_id = ?1 ORDER BY code ASC"
                .to_string(),
            vec![Box::new(location_id) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            "SELECT id, code, name, location_id, status, notes, created_at
             FROM bikes ORDER BY code ASC"
                .to_string(),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_bike_row(row)))?;

    let mut bikes = vec![];
    for row in rows {
        bikes.push(row??);
    }
    Ok(bikes)
}

pub fn update_bike_status(conn: &Connection, id: i64, status: BikeStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bikes SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

// ── Reservations ──

/// Overlap test against active reservations within a buffered window.
/// Half-open semantics: reservations that merely touch the window
/// boundary do not overlap. Every availability decision in the crate
/// (conflict probe, timebar counts, bike list filter) goes through
/// this one condition.
fn overlap_condition(alias: &str) -> String {
    format!(
        "{a}.status IN ('BOOKED', 'COMPLETED') \
         AND NOT ({a}.end_datetime <= :buffered_start OR {a}.start_datetime >= :buffered_end)",
        a = alias
    )
}

pub fn has_conflicting_reservation(
    conn: &Connection,
    bike_id: i64,
    buffered_start: &NaiveDateTime,
    buffered_end: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM reservations r WHERE r.bike_id = :bike_id AND {}",
        overlap_condition("r")
    );

    let count: i64 = conn.query_row(
        &sql,
        named_params! {
            ":bike_id": bike_id,
            ":buffered_start": fmt_dt(buffered_start),
            ":buffered_end": fmt_dt(buffered_end),
        },
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_available_bikes(
    conn: &Connection,
    location_id: i64,
    buffered_start: &NaiveDateTime,
    buffered_end: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM bikes b
         WHERE b.location_id = :location_id AND b.status = 'AVAILABLE'
           AND NOT EXISTS (
             SELECT 1 FROM reservations r WHERE r.bike_id = b.id AND {}
           )",
        overlap_condition("r")
    );

    let count: i64 = conn.query_row(
        &sql,
        named_params! {
            ":location_id": location_id,
            ":buffered_start": fmt_dt(buffered_start),
            ":buffered_end": fmt_dt(buffered_end),
        },
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_available_bikes(
    conn: &Connection,
    location_id: i64,
    buffered_start: &NaiveDateTime,
    buffered_end: &NaiveDateTime,
) -> anyhow::Result<Vec<Bike>> {
    let sql = format!(
        "SELECT b.id, b.code, b.name, b.location_id, b.status, b.notes, b.created_at
         FROM bikes b
         WHERE b.location_id = :location_id AND b.status = 'AVAILABLE'
           AND NOT EXISTS (
             SELECT 1 FROM reservations r WHERE r.bike_id = b.id AND {}
           )
         ORDER BY b.code ASC",
        overlap_condition("r")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        named_params! {
            ":location_id": location_id,
            ":buffered_start": fmt_dt(buffered_start),
            ":buffered_end": fmt_dt(buffered_end),
        },
        |row| Ok(parse_bike_row(row)),
    )?;

    let mut bikes = vec![];
    for row in rows {
        bikes.push(row??);
    }
    Ok(bikes)
}

pub fn create_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations (id, bike_id, location_id, volunteer_id, start_datetime, end_datetime, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reservation.id,
            reservation.bike_id,
            reservation.location_id,
            reservation.volunteer_id,
            fmt_dt(&reservation.start_datetime),
            fmt_dt(&reservation.end_datetime),
            reservation.status.as_str(),
            fmt_dt(&reservation.created_at),
            fmt_dt(&reservation.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_reservation(conn: &Connection, id: &str) -> anyhow::Result<Option<Reservation>> {
    let result = conn.query_row(
        "SELECT id, bike_id, location_id, volunteer_id, start_datetime, end_datetime, status, created_at, updated_at
         FROM reservations WHERE id = ?1",
        params![id],
        |row| Ok(parse_reservation_row(row)),
    );

    match result {
        Ok(reservation) => Ok(Some(reservation?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReservationFilter<'a> {
    pub volunteer_id: Option<i64>,
    pub bike_id: Option<i64>,
    pub location_id: Option<i64>,
    pub status: Option<&'a str>,
}

pub fn list_reservations(
    conn: &Connection,
    filter: ReservationFilter,
) -> anyhow::Result<Vec<Reservation>> {
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(volunteer_id) = filter.volunteer_id {
        params_vec.push(Box::new(volunteer_id));
        clauses.push(format!("volunteer_id = ?{}", params_vec.len()));
    }
    if let Some(bike_id) = filter.bike_id {
        params_vec.push(Box::new(bike_id));
        clauses.push(format!("bike_id = ?{}", params_vec.len()));
    }
    if let Some(location_id) = filter.location_id {
        params_vec.push(Box::new(location_id));
        clauses.push(format!("location_id = ?{}", params_vec.len()));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.to_string()));
        clauses.push(format!("status = ?{}", params_vec.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT id, bike_id, location_id, volunteer_id, start_datetime, end_datetime, status, created_at, updated_at
         FROM reservations{where_clause} ORDER BY start_datetime DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_dt(&now), id],
    )?;
    Ok(count > 0)
}

// ── Transactions & ledger ──

pub struct NewTransaction<'a> {
    pub user_id: Option<i64>,
    pub reservation_id: Option<&'a str>,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub status: TransactionStatus,
    pub payment_method: Option<&'a str>,
    pub provider_response: Option<&'a serde_json::Value>,
}

pub fn insert_transaction(conn: &Connection, tx: &NewTransaction) -> anyhow::Result<i64> {
    let provider_response = match tx.provider_response {
        Some(value) => Some(serde_json::to_string(value)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO transactions (user_id, reservation_id, amount_cents, currency, status, payment_method, provider_response)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tx.user_id,
            tx.reservation_id,
            tx.amount_cents,
            tx.currency,
            tx.status.as_str(),
            tx.payment_method,
            provider_response,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, id: i64) -> anyhow::Result<Option<Transaction>> {
    let result = conn.query_row(
        "SELECT id, user_id, reservation_id, amount_cents, currency, status, payment_method, provider_response, created_at
         FROM transactions WHERE id = ?1",
        params![id],
        |row| Ok(parse_transaction_row(row)),
    );

    match result {
        Ok(tx) => Ok(Some(tx?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_transactions(
    conn: &Connection,
    user_id: Option<i64>,
    limit: i64,
) -> anyhow::Result<Vec<Transaction>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match user_id {
        Some(user_id) => (
            "SELECT id, user_id, reservation_id, amount_cents, currency, status, payment_method, provider_response, created_at
             FROM transactions WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(user_id) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, user_id, reservation_id, amount_cents, currency, status, payment_method, provider_response, created_at
             FROM transactions ORDER BY id DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_transaction_row(row)))?;

    let mut transactions = vec![];
    for row in rows {
        transactions.push(row??);
    }
    Ok(transactions)
}

pub fn mark_transaction_paid(
    conn: &Connection,
    id: i64,
    payment_method: &str,
    provider_response: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE transactions SET status = 'paid', payment_method = ?1, provider_response = ?2 WHERE id = ?3",
        params![payment_method, serde_json::to_string(provider_response)?, id],
    )?;
    Ok(())
}

pub fn update_transaction_status(
    conn: &Connection,
    id: i64,
    status: TransactionStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE transactions SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

/// Most recent settled charge for a reservation. Refund rows are excluded
/// so a refund is never itself refunded.
pub fn latest_paid_transaction_for_reservation(
    conn: &Connection,
    reservation_id: &str,
) -> anyhow::Result<Option<Transaction>> {
    let result = conn.query_row(
        "SELECT id, user_id, reservation_id, amount_cents, currency, status, payment_method, provider_response, created_at
         FROM transactions
         WHERE reservation_id = ?1 AND status = 'paid'
           AND COALESCE(payment_method, '') != 'balance_refund'
         ORDER BY id DESC LIMIT 1",
        params![reservation_id],
        |row| Ok(parse_transaction_row(row)),
    );

    match result {
        Ok(tx) => Ok(Some(tx?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_ledger_entry(
    conn: &Connection,
    transaction_id: Option<i64>,
    account: &str,
    amount_cents: i64,
    note: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO ledger_entries (transaction_id, account, amount_cents, note)
         VALUES (?1, ?2, ?3, ?4)",
        params![transaction_id, account, amount_cents, note],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_ledger_entries_for_transaction(
    conn: &Connection,
    transaction_id: i64,
) -> anyhow::Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, transaction_id, account, amount_cents, note, created_at
         FROM ledger_entries WHERE transaction_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![transaction_id], |row| Ok(parse_ledger_row(row)))?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row??);
    }
    Ok(entries)
}

// ── App settings ──

pub fn get_setting(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value_text FROM app_settings WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO app_settings (key, value_text, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
           value_text = excluded.value_text,
           updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

// ── Row parsers ──

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: Role::from_str(&role_str),
        balance_cents: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn parse_location_row(row: &rusqlite::Row) -> anyhow::Result<Location> {
    let hours_type_str: String = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        hours_type: HoursType::parse(&hours_type_str).unwrap_or(HoursType::Scheduled),
        created_at: parse_dt(&created_at_str),
    })
}

fn parse_weekly_row(row: &rusqlite::Row) -> anyhow::Result<WeeklyHours> {
    Ok(WeeklyHours {
        id: row.get(0)?,
        location_id: row.get(1)?,
        weekday: row.get(2)?,
        is_closed: row.get(3)?,
        open_time: row.get(4)?,
        close_time: row.get(5)?,
    })
}

fn parse_exception_row(row: &rusqlite::Row) -> anyhow::Result<HourException> {
    let date_str: String = row.get(2)?;
    Ok(HourException {
        id: row.get(0)?,
        location_id: row.get(1)?,
        date: parse_date(&date_str),
        is_closed: row.get(3)?,
        open_time: row.get(4)?,
        close_time: row.get(5)?,
        reason: row.get(6)?,
    })
}

fn parse_bike_row(row: &rusqlite::Row) -> anyhow::Result<Bike> {
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(6)?;
    Ok(Bike {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        location_id: row.get(3)?,
        status: BikeStatus::parse(&status_str).unwrap_or(BikeStatus::OutOfService),
        notes: row.get(5)?,
        created_at: parse_dt(&created_at_str),
    })
}

fn parse_reservation_row(row: &rusqlite::Row) -> anyhow::Result<Reservation> {
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;
    Ok(Reservation {
        id: row.get(0)?,
        bike_id: row.get(1)?,
        location_id: row.get(2)?,
        volunteer_id: row.get(3)?,
        start_datetime: parse_dt(&start_str),
        end_datetime: parse_dt(&end_str),
        status: ReservationStatus::parse(&status_str).unwrap_or(ReservationStatus::Booked),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

fn parse_transaction_row(row: &rusqlite::Row) -> anyhow::Result<Transaction> {
    let status_str: String = row.get(5)?;
    let provider_response_str: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        reservation_id: row.get(2)?,
        amount_cents: row.get(3)?,
        currency: row.get(4)?,
        status: TransactionStatus::parse(&status_str).unwrap_or(TransactionStatus::Pending),
        payment_method: row.get(6)?,
        provider_response: provider_response_str.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: parse_dt(&created_at_str),
    })
}

fn parse_ledger_row(row: &rusqlite::Row) -> anyhow::Result<LedgerEntry> {
    let created_at_str: String = row.get(5)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        account: row.get(2)?,
        amount_cents: row.get(3)?,
        note: row.get(4)?,
        created_at: parse_dt(&created_at_str),
    })
}

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}
