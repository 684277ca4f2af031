//! Response classification
//!
//! Maps a raw reply (or transport failure) to exactly one
//! `TransactionOutcome`. Priority order:
//!
//! 1. 200 with `account.id` and `transactionId` present -> Success;
//!    200 with either missing -> ValidationError (malformed success)
//! 2. 409 -> VersionConflict
//! 3. 400 -> ValidationError, detail from `message`, else `error`, else raw body
//! 4. anything else, unparseable 200 body, or transport failure -> OtherError
//!
//! A parse failure can never escape unclassified.

use tracing::{error, info, warn};

use crate::error::ClientError;
use crate::models::{
    LockingMode, RawResponse, TransactionOutcome, TransactionReply, TransactionRequest,
};

pub fn classify(result: Result<RawResponse, ClientError>) -> TransactionOutcome {
    let raw = match result {
        Ok(raw) => raw,
        Err(e) => {
            return TransactionOutcome::OtherError {
                status: None,
                detail: e.to_string(),
            };
        }
    };

    match raw.status {
        200 => classify_success_body(&raw.body),
        409 => TransactionOutcome::VersionConflict,
        400 => TransactionOutcome::ValidationError(extract_detail(&raw.body)),
        status => TransactionOutcome::OtherError {
            status: Some(status),
            detail: extract_detail(&raw.body),
        },
    }
}

/// Status was 200; the body decides between genuine and malformed success
fn classify_success_body(body: &str) -> TransactionOutcome {
    let reply: TransactionReply = match serde_json::from_str(body) {
        Ok(reply) => reply,
        Err(e) => {
            return TransactionOutcome::OtherError {
                status: Some(200),
                detail: format!("unparseable response body: {e}"),
            };
        }
    };

    match (reply.account, reply.transaction_id) {
        (Some(account), Some(transaction_id)) if account.id.is_some() => {
            TransactionOutcome::Success {
                account,
                transaction_id,
            }
        }
        _ => TransactionOutcome::ValidationError("missing required fields in response".to_string()),
    }
}

/// Best-effort error detail: `message`, else `error`, else the raw body text
fn extract_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    body.to_string()
}

/// One log line per iteration, shaped by the outcome
pub fn log_outcome(mode: LockingMode, request: &TransactionRequest, outcome: &TransactionOutcome) {
    match outcome {
        TransactionOutcome::Success {
            account,
            transaction_id,
        } => {
            let currency = account.currency.as_deref().unwrap_or("?");
            let balance = account
                .balance
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string());
            info!(
                "TX:{} | {} {} {} | balance: {} {} (v{})",
                transaction_id,
                request.r#type,
                request.amount,
                currency,
                balance,
                currency,
                account.version.unwrap_or(-1),
            );
        }
        TransactionOutcome::VersionConflict => match mode {
            LockingMode::Optimistic => info!(
                "[CONFLICT] version conflict for {} {}",
                request.r#type, request.amount
            ),
            // Pessimistic writers block instead of failing on staleness;
            // a 409 here points at the service, not at contention
            LockingMode::Pessimistic => warn!(
                "[CONFLICT] unexpected 409 under PESSIMISTIC for {} {}",
                request.r#type, request.amount
            ),
        },
        TransactionOutcome::ValidationError(detail) => {
            error!(
                "[ERROR 400] {} {} failed: {}",
                request.r#type, request.amount, detail
            );
        }
        TransactionOutcome::OtherError { status, detail } => {
            let status = status.map_or_else(|| "transport".to_string(), |s| s.to_string());
            error!(
                "[ERROR {}] {} {} failed: {}",
                status, request.r#type, request.amount, detail
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &str) -> Result<RawResponse, ClientError> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_200_with_both_fields_is_success() {
        let outcome = classify(raw(
            200,
            r#"{"account":{"id":"a1","balance":"150.00","version":3,"currency":"USD"},"transactionId":"t1"}"#,
        ));
        match outcome {
            TransactionOutcome::Success {
                account,
                transaction_id,
            } => {
                assert_eq!(transaction_id, "t1");
                assert_eq!(account.id.as_deref(), Some("a1"));
                assert_eq!(account.version, Some(3));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn test_200_missing_transaction_id_is_validation_error() {
        let outcome = classify(raw(200, r#"{"account":{"id":"a1"}}"#));
        match outcome {
            TransactionOutcome::ValidationError(detail) => {
                assert_eq!(detail, "missing required fields in response");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_200_missing_account_id_is_validation_error() {
        let outcome = classify(raw(
            200,
            r#"{"account":{"balance":"1.00"},"transactionId":"t1"}"#,
        ));
        assert!(matches!(outcome, TransactionOutcome::ValidationError(_)));
    }

    #[test]
    fn test_200_unparseable_body_is_other_error() {
        let outcome = classify(raw(200, "<html>gateway error</html>"));
        match outcome {
            TransactionOutcome::OtherError { status, .. } => assert_eq!(status, Some(200)),
            other => panic!("expected OtherError, got {other:?}"),
        }
    }

    #[test]
    fn test_409_is_version_conflict() {
        let outcome = classify(raw(409, r#"{"message":"stale version"}"#));
        assert!(matches!(outcome, TransactionOutcome::VersionConflict));
    }

    #[test]
    fn test_400_detail_from_message_field() {
        let outcome = classify(raw(400, r#"{"message":"insufficient funds"}"#));
        match outcome {
            TransactionOutcome::ValidationError(detail) => {
                assert_eq!(detail, "insufficient funds");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_400_detail_falls_back_to_error_then_raw() {
        let outcome = classify(raw(400, r#"{"error":"Bad Request"}"#));
        assert!(matches!(
            outcome,
            TransactionOutcome::ValidationError(d) if d == "Bad Request"
        ));

        let outcome = classify(raw(400, "not json at all"));
        assert!(matches!(
            outcome,
            TransactionOutcome::ValidationError(d) if d == "not json at all"
        ));
    }

    #[test]
    fn test_other_status_is_other_error() {
        let outcome = classify(raw(503, r#"{"message":"overloaded"}"#));
        match outcome {
            TransactionOutcome::OtherError { status, detail } => {
                assert_eq!(status, Some(503));
                assert_eq!(detail, "overloaded");
            }
            other => panic!("expected OtherError, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_failure_is_other_error_without_status() {
        let outcome = classify(Err(ClientError::Transport("connection reset".to_string())));
        match outcome {
            TransactionOutcome::OtherError { status, detail } => {
                assert_eq!(status, None);
                assert!(detail.contains("connection reset"));
            }
            other => panic!("expected OtherError, got {other:?}"),
        }
    }
}
