use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::services::notify::Notifier;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub auth: Box<dyn AuthProvider>,
    pub notifier: Box<dyn Notifier>,
}
