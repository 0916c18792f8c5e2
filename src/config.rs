use std::env;

use chrono_tz::Tz;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Project-wide time zone for opening hours and day boundaries.
    pub timezone: Tz,
    /// Flat reservation fee, used when no `app_settings` override exists.
    pub reservation_fee_cents: i64,
    pub currency: String,
    pub notification_webhooks: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "duofiets.db".to_string()),
            timezone: env::var("TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Europe::Amsterdam),
            reservation_fee_cents: env::var("RESERVATION_FEE_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "EUR".to_string()),
            notification_webhooks: env::var("NOTIFICATION_WEBHOOKS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
