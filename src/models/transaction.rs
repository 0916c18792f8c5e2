use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: Option<i64>,
    pub reservation_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub provider_response: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "paid" => Some(TransactionStatus::Paid),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// One signed line of a double-entry group. Rows created together under a
/// transaction always sum to zero across accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub transaction_id: Option<i64>,
    pub account: String,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}
