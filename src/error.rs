//! Error Types
//!
//! One enum per layer. Gateway errors pass through the store unmodified;
//! the reconciliation layer wraps them once more with the affected card.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::CardId;

/// Mutation kinds shared by patches, notifications and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a persistence gateway
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("card not found: {0}")]
    NotFound(CardId),
    #[error("invalid record: {0}")]
    Invalid(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures of the server-synced store, one variant per operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("failed to load cards")]
    Fetch(#[source] GatewayError),
    #[error("failed to create card")]
    Create(#[source] GatewayError),
    #[error("failed to update card {id}")]
    Update {
        id: CardId,
        #[source]
        source: GatewayError,
    },
    #[error("failed to delete card {id}")]
    Delete {
        id: CardId,
        #[source]
        source: GatewayError,
    },
}

impl StoreError {
    /// The gateway error this failure wraps
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            StoreError::Fetch(source) | StoreError::Create(source) => source,
            StoreError::Update { source, .. } | StoreError::Delete { source, .. } => source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A settled optimistic operation whose server call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} of card {card_id} failed: {}", .source.gateway_error())]
pub struct SyncError {
    pub operation: Operation,
    pub card_id: CardId,
    #[source]
    pub source: StoreError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_message_names_operation_and_card() {
        let err = SyncError {
            operation: Operation::Update,
            card_id: CardId::from("42"),
            source: StoreError::Update {
                id: CardId::from("42"),
                source: GatewayError::Transport("connection reset".to_string()),
            },
        };
        assert_eq!(err.to_string(), "update of card 42 failed: transport error: connection reset");
        assert_eq!(
            err.source.gateway_error(),
            &GatewayError::Transport("connection reset".to_string())
        );
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Add.to_string(), "add");
        assert_eq!(serde_json::to_string(&Operation::Delete).unwrap(), "\"delete\"");
    }
}
