use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;

pub const RESERVATION_FEE_KEY: &str = "reservation_fee_cents";

/// Flat fee in effect right now. The admin-set settings row wins,
/// otherwise the env-seeded config default applies.
pub fn reservation_fee_cents(conn: &Connection, config: &AppConfig) -> Result<i64, AppError> {
    if let Some(raw) = queries::get_setting(conn, RESERVATION_FEE_KEY)? {
        match raw.parse::<i64>() {
            Ok(cents) => return Ok(cents),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparseable reservation fee setting");
            }
        }
    }
    Ok(config.reservation_fee_cents)
}

pub fn set_reservation_fee_cents(conn: &Connection, cents: i64) -> Result<(), AppError> {
    queries::set_setting(conn, RESERVATION_FEE_KEY, &cents.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_config() -> AppConfig {
        AppConfig {
            port: 0,
            database_url: ":memory:".to_string(),
            timezone: chrono_tz::Europe::Amsterdam,
            reservation_fee_cents: 1000,
            currency: "EUR".to_string(),
            notification_webhooks: vec![],
        }
    }

    #[test]
    fn test_defaults_to_config_fee() {
        let conn = db::init_db(":memory:").unwrap();
        let fee = reservation_fee_cents(&conn, &test_config()).unwrap();
        assert_eq!(fee, 1000);
    }

    #[test]
    fn test_setting_overrides_config() {
        let conn = db::init_db(":memory:").unwrap();
        set_reservation_fee_cents(&conn, 250).unwrap();
        let fee = reservation_fee_cents(&conn, &test_config()).unwrap();
        assert_eq!(fee, 250);
    }

    #[test]
    fn test_garbage_setting_falls_back() {
        let conn = db::init_db(":memory:").unwrap();
        queries::set_setting(&conn, RESERVATION_FEE_KEY, "not-a-number").unwrap();
        let fee = reservation_fee_cents(&conn, &test_config()).unwrap();
        assert_eq!(fee, 1000);
    }
}
