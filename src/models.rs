//! Domain types and wire schemas for the account-transaction API
//!
//! - `LockingMode` / `TransactionType`: run and request enums
//! - `TransactionRequest`: outbound POST body, one per iteration
//! - `AccountSnapshot`: read-only view of account state (GET endpoint)
//! - `TransactionReply` / `AccountView`: typed decode of the POST reply
//! - `TransactionOutcome`: classification result, one of four categories

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Concurrency-control discipline exercised by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockingMode {
    Optimistic,
    Pessimistic,
}

impl LockingMode {
    /// Parse the wire spelling (`OPTIMISTIC` / `PESSIMISTIC`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPTIMISTIC" => Some(LockingMode::Optimistic),
            "PESSIMISTIC" => Some(LockingMode::Pessimistic),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockingMode::Optimistic => write!(f, "OPTIMISTIC"),
            LockingMode::Pessimistic => write!(f, "PESSIMISTIC"),
        }
    }
}

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "DEPOSIT"),
            TransactionType::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

// ============================================================================
// Outbound request
// ============================================================================

/// One transaction request, built fresh per iteration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub r#type: TransactionType,
    /// Integer amount in [1, 100]
    pub amount: u32,
    /// Always copied from the run configuration
    pub locking_mode: LockingMode,
    /// Correlation tag, `{TYPE}_{MODE}`
    pub reason: String,
}

// ============================================================================
// Inbound wire schemas
// ============================================================================

/// Envelope wrapping account reads: `{ code, message, data }`.
/// Only `data` matters to the harness.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// Read-only view of external account state. Not owned by the harness.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub balance: Decimal,
    /// Monotonic optimistic-concurrency token
    pub version: i64,
    pub owner_name: String,
    /// 3-letter code
    pub currency: String,
}

/// Typed decode of a 200 transaction reply. Every field is optional so a
/// malformed success (status 200, required field absent) decodes cleanly
/// and classifies as a validation error instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReply {
    pub account: Option<AccountView>,
    pub transaction_id: Option<String>,
}

/// Account state embedded in a transaction reply
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Option<String>,
    pub balance: Option<Decimal>,
    pub version: Option<i64>,
    pub owner_name: Option<String>,
    pub currency: Option<String>,
}

/// Raw HTTP response prior to classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

// ============================================================================
// Classification result
// ============================================================================

/// Exactly one category per completed iteration. Derived, never persisted.
#[derive(Debug, Clone)]
pub enum TransactionOutcome {
    Success {
        account: AccountView,
        transaction_id: String,
    },
    /// 409: expected contention under OPTIMISTIC, anomalous under PESSIMISTIC
    VersionConflict,
    /// 400, or a 200 with required reply fields missing
    ValidationError(String),
    /// Any other status, unparseable body, or transport failure.
    /// `status` is None when the request never completed.
    OtherError {
        status: Option<u16>,
        detail: String,
    },
}

impl TransactionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionOutcome::Success { .. } => "success",
            TransactionOutcome::VersionConflict => "version_conflict",
            TransactionOutcome::ValidationError(_) => "validation_error",
            TransactionOutcome::OtherError { .. } => "other_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locking_mode_parse() {
        assert_eq!(LockingMode::parse("OPTIMISTIC"), Some(LockingMode::Optimistic));
        assert_eq!(LockingMode::parse("PESSIMISTIC"), Some(LockingMode::Pessimistic));
        assert_eq!(LockingMode::parse("optimistic"), None);
        assert_eq!(LockingMode::parse(""), None);
    }

    #[test]
    fn test_request_serializes_wire_spelling() {
        let request = TransactionRequest {
            r#type: TransactionType::Deposit,
            amount: 42,
            locking_mode: LockingMode::Optimistic,
            reason: "DEPOSIT_OPTIMISTIC".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "DEPOSIT");
        assert_eq!(json["amount"], 42);
        assert_eq!(json["lockingMode"], "OPTIMISTIC");
        assert_eq!(json["reason"], "DEPOSIT_OPTIMISTIC");
    }

    #[test]
    fn test_reply_decodes_with_missing_fields() {
        let reply: TransactionReply = serde_json::from_str(r#"{"account":{"id":"a1"}}"#).unwrap();
        assert!(reply.account.is_some());
        assert!(reply.transaction_id.is_none());
        assert!(reply.account.unwrap().balance.is_none());
    }

    #[test]
    fn test_snapshot_decodes_envelope() {
        let body = r#"{"code":200,"message":"ok","data":{"balance":"150.00","version":7,"ownerName":"Alice","currency":"USD"}}"#;
        let envelope: ApiEnvelope<AccountSnapshot> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.version, 7);
        assert_eq!(envelope.data.currency, "USD");
    }
}
