//! TransactionStore client
//!
//! The store owns transaction records and their persistence; the tracker
//! only creates, re-fetches and retries transactions through this interface.

use crate::config::StoreConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::transaction::{NewTransaction, Transaction, TransactionId};

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Interface to the external TransactionStore service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Create a transaction; the store assigns the id and initial status.
    async fn create(&self, new: &NewTransaction) -> TrackerResult<Transaction>;

    /// Fetch the current state of a transaction.
    async fn status(&self, id: &TransactionId) -> TrackerResult<Transaction>;

    /// Ask the store to retry a failed transaction. The store may answer
    /// with a different transaction than the one retried.
    async fn retry(&self, id: &TransactionId) -> TrackerResult<Transaction>;

    /// Reachability probe for readiness checks.
    async fn ping(&self) -> bool {
        true
    }
}

/// Retry responses wrap the transaction in an envelope.
#[derive(Debug, Deserialize)]
struct RetryResponse {
    transaction: Transaction,
}

/// HTTP implementation of [`TransactionStore`]
pub struct HttpTransactionStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransactionStore {
    pub fn new(config: &StoreConfig) -> TrackerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response body, mapping non-success statuses to errors.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> TrackerResult<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(TrackerError::Store {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TransactionStore for HttpTransactionStore {
    async fn create(&self, new: &NewTransaction) -> TrackerResult<Transaction> {
        debug!(
            source_chain = %new.source_chain,
            destination_chain = %new.destination_chain,
            "creating transaction"
        );
        let response = self
            .client
            .post(self.url("/transactions"))
            .json(new)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn status(&self, id: &TransactionId) -> TrackerResult<Transaction> {
        let response = self
            .client
            .get(self.url(&format!("/transactions/{}", id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn retry(&self, id: &TransactionId) -> TrackerResult<Transaction> {
        debug!(tx_id = %id, "retrying transaction");
        let response = self
            .client
            .post(self.url(&format!("/transactions/{}/retry", id)))
            .send()
            .await?;
        let RetryResponse { transaction } = Self::decode(response).await?;
        Ok(transaction)
    }

    async fn ping(&self) -> bool {
        // Any HTTP answer means the store is reachable, even an error status.
        self.client.get(&self.base_url).send().await.is_ok()
    }
}
