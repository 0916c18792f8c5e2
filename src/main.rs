use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use duofiets::auth::TokenTableAuth;
use duofiets::config::AppConfig;
use duofiets::db;
use duofiets::handlers;
use duofiets::services::notify::WebhookNotifier;
use duofiets::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    tracing::info!(
        timezone = %config.timezone,
        fee_cents = config.reservation_fee_cents,
        "duofiets booking service starting"
    );

    let state = Arc::new(AppState {
        db: db.clone(),
        config: config.clone(),
        auth: Box::new(TokenTableAuth::new(db)),
        notifier: Box::new(WebhookNotifier::new(config.notification_webhooks.clone())),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/api/locations/:id/hours",
            get(handlers::locations::list_weekly_hours)
                .post(handlers::locations::upsert_weekly_hours),
        )
        .route(
            "/api/locations/:id/exceptions",
            get(handlers::locations::list_exceptions).post(handlers::locations::upsert_exception),
        )
        .route(
            "/api/locations/:id/exceptions/:exception_id",
            delete(handlers::locations::delete_exception),
        )
        .route(
            "/api/bikes",
            get(handlers::bikes::list_bikes).post(handlers::bikes::create_bike),
        )
        .route(
            "/api/bikes/:id/status",
            post(handlers::bikes::update_bike_status),
        )
        .route(
            "/api/reservations",
            get(handlers::reservations::list_reservations)
                .post(handlers::reservations::create_reservation),
        )
        .route(
            "/api/reservations/:id",
            get(handlers::reservations::get_reservation)
                .put(handlers::reservations::update_reservation)
                .delete(handlers::reservations::cancel_reservation),
        )
        .route(
            "/api/availability/timebar",
            get(handlers::availability::get_timebar),
        )
        .route(
            "/api/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/transactions/:id/status",
            post(handlers::transactions::update_transaction_status),
        )
        .route("/api/users/:id", get(handlers::users::get_user))
        .route(
            "/api/users/:id/balance",
            post(handlers::users::adjust_balance),
        )
        .route(
            "/api/settings/pricing",
            get(handlers::settings::get_pricing).put(handlers::settings::update_pricing),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
