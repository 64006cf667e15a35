//! Bridge transaction data model
//!
//! Transactions are created and owned by the external TransactionStore; the
//! tracker only mirrors what the store reports. Status moves forward through
//! pending -> source_confirmed -> destination_confirmed -> completed, or to
//! failed from any non-terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned transaction identifier.
///
/// The store is free to hand out numeric or string identifiers; the tracker
/// treats them as opaque and only echoes them back into request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Number(n) => write!(f, "{}", n),
            TransactionId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for TransactionId {
    fn from(n: i64) -> Self {
        TransactionId::Number(n)
    }
}

impl From<i32> for TransactionId {
    fn from(n: i32) -> Self {
        TransactionId::Number(n.into())
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => TransactionId::Number(n),
            Err(_) => TransactionId::Text(s.to_string()),
        }
    }
}

/// Lifecycle status of a bridge transaction as reported by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    SourceConfirmed,
    DestinationConfirmed,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// Terminal statuses end the polling loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Position in the forward sequence. Failed ranks last since it is
    /// reachable from any non-terminal status.
    pub fn rank(&self) -> u8 {
        match self {
            TransactionStatus::Pending => 0,
            TransactionStatus::SourceConfirmed => 1,
            TransactionStatus::DestinationConfirmed => 2,
            TransactionStatus::Completed => 3,
            TransactionStatus::Failed => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::SourceConfirmed => "source_confirmed",
            TransactionStatus::DestinationConfirmed => "destination_confirmed",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cross-chain transaction mirrored from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub status: TransactionStatus,
    /// Hash of the confirmed transaction on the source chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tx_hash: Option<String>,
    /// Hash of the confirmed transaction on the destination chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_tx_hash: Option<String>,
    /// Failure reason, only meaningful when status is failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Opaque diagnostic payload supplied by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(id: impl Into<TransactionId>, status: TransactionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            source_tx_hash: None,
            destination_tx_hash: None,
            error: None,
            data: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Creation payload forwarded verbatim to the store.
///
/// Chain identifiers, amount and wallet address are opaque to the tracker;
/// any additional fields the UI sends ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub source_chain: String,
    pub destination_chain: String,
    pub amount: String,
    pub wallet_address: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_format_is_snake_case() {
        let json = serde_json::to_string(&TransactionStatus::SourceConfirmed).unwrap();
        assert_eq!(json, "\"source_confirmed\"");

        let status: TransactionStatus =
            serde_json::from_str("\"destination_confirmed\"").unwrap();
        assert_eq!(status, TransactionStatus::DestinationConfirmed);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::SourceConfirmed.is_terminal());
        assert!(!TransactionStatus::DestinationConfirmed.is_terminal());
    }

    #[test]
    fn status_ranks_forward() {
        assert!(TransactionStatus::Pending.rank() < TransactionStatus::SourceConfirmed.rank());
        assert!(
            TransactionStatus::SourceConfirmed.rank()
                < TransactionStatus::DestinationConfirmed.rank()
        );
        assert!(
            TransactionStatus::DestinationConfirmed.rank() < TransactionStatus::Completed.rank()
        );
    }

    #[test]
    fn transaction_id_accepts_numeric_and_string_ids() {
        let tx: Transaction =
            serde_json::from_str(r#"{"id": 1, "status": "pending"}"#).unwrap();
        assert_eq!(tx.id, TransactionId::Number(1));
        assert_eq!(tx.id.to_string(), "1");

        let tx: Transaction =
            serde_json::from_str(r#"{"id": "tx-abc", "status": "pending"}"#).unwrap();
        assert_eq!(tx.id, TransactionId::Text("tx-abc".to_string()));
        assert_eq!(tx.id.to_string(), "tx-abc");
    }

    #[test]
    fn new_transaction_carries_extra_fields() {
        let json = r#"{
            "source_chain": "ethereum",
            "destination_chain": "arbitrum",
            "amount": "1500000000000000000",
            "wallet_address": "0x4b2c9f00cb2b1f8f2a87411e7f2d4a7c9ea3c111",
            "proposal_id": 42
        }"#;
        let new: NewTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(new.source_chain, "ethereum");
        assert_eq!(new.extra.get("proposal_id").unwrap(), 42);

        let back = serde_json::to_value(&new).unwrap();
        assert_eq!(back["proposal_id"], 42);
    }
}
