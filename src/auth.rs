use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identity behind the Bearer token. Token issuance is not part of this
/// service; tokens are provisioned straight into the database.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Option<Caller>;
}

pub struct TokenTableAuth {
    db: Arc<Mutex<Connection>>,
}

impl TokenTableAuth {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthProvider for TokenTableAuth {
    async fn verify(&self, token: &str) -> Option<Caller> {
        let db = self.db.lock().unwrap();
        match queries::get_user_by_token(&db, token) {
            Ok(Some(user)) if user.is_active => Some(Caller {
                id: user.id,
                role: user.role,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "token lookup failed");
                None
            }
        }
    }
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    state.auth.verify(token).await.ok_or(AppError::Unauthorized)
}

pub fn require_admin(caller: &Caller) -> Result<(), AppError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> (Arc<Mutex<Connection>>, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let user_id =
            queries::create_user(&conn, "vol@example.org", "Vol", Role::Volunteer, 0).unwrap();
        queries::insert_api_token(&conn, "secret-token", user_id).unwrap();
        (Arc::new(Mutex::new(conn)), user_id)
    }

    #[tokio::test]
    async fn test_token_lookup_resolves_caller() {
        let (db, user_id) = setup();
        let auth = TokenTableAuth::new(db);

        let caller = auth.verify("secret-token").await.unwrap();
        assert_eq!(caller.id, user_id);
        assert_eq!(caller.role, Role::Volunteer);

        assert!(auth.verify("wrong-token").await.is_none());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let (db, user_id) = setup();
        {
            let conn = db.lock().unwrap();
            conn.execute(
                "UPDATE users SET is_active = 0 WHERE id = ?1",
                rusqlite::params![user_id],
            )
            .unwrap();
        }

        let auth = TokenTableAuth::new(db);
        assert!(auth.verify("secret-token").await.is_none());
    }
}
