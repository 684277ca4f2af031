//! HTTP client for the account service
//!
//! Two operations: read account state and submit a transaction. Transaction
//! replies are returned raw (status + body) so classification stays in one
//! place; transport failures surface as `ClientError` and never abort the run.

use std::time::Duration;

use tracing::debug;

use crate::config::RunConfig;
use crate::error::ClientError;
use crate::models::{AccountSnapshot, ApiEnvelope, RawResponse, TransactionRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AccountClient {
    http: reqwest::Client,
    account_url: String,
    transaction_url: String,
}

impl AccountClient {
    pub fn new(config: &RunConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;

        let account_url = format!("{}/api/accounts/{}", config.base_url, config.account_id);
        let transaction_url = format!("{account_url}/transaction");

        Ok(Self {
            http,
            account_url,
            transaction_url,
        })
    }

    /// GET current account state and decode the `{ data: ... }` envelope
    pub async fn fetch_account(&self) -> Result<AccountSnapshot, ClientError> {
        let response = self
            .http
            .get(&self.account_url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }

        let envelope: ApiEnvelope<AccountSnapshot> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(envelope.data)
    }

    /// POST one transaction and return the raw reply. Blocks until the
    /// response arrives or the transport gives up; any HTTP status is Ok here,
    /// only a failed exchange is Err.
    pub async fn submit(&self, request: &TransactionRequest) -> Result<RawResponse, ClientError> {
        debug!(
            "submitting {} {} ({})",
            request.r#type, request.amount, request.reason
        );

        let response = self
            .http
            .post(&self.transaction_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LockingMode;

    fn config(base_url: &str) -> RunConfig {
        RunConfig {
            base_url: base_url.to_string(),
            account_id: "acct-1".to_string(),
            mode: LockingMode::Optimistic,
            actors: 1,
            iterations: 1,
            max_duration: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_urls_built_from_config() {
        let client = AccountClient::new(&config("http://svc:8080")).unwrap();
        assert_eq!(client.account_url, "http://svc:8080/api/accounts/acct-1");
        assert_eq!(
            client.transaction_url,
            "http://svc:8080/api/accounts/acct-1/transaction"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        // Grab a free port, then close it so the connection is refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = AccountClient::new(&config(&format!("http://127.0.0.1:{port}"))).unwrap();
        let request = TransactionRequest {
            r#type: crate::models::TransactionType::Deposit,
            amount: 1,
            locking_mode: LockingMode::Optimistic,
            reason: "DEPOSIT_OPTIMISTIC".to_string(),
        };
        let err = client.submit(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
