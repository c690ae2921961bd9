//! Sync Configuration
//!
//! Tunables of the reconciliation layer and its user-facing strings.

use crate::error::Operation;
use crate::models::DEFAULT_TEMP_PREFIX;

/// Messages shown for each operation outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub created: String,
    pub updated: String,
    pub deleted: String,
    pub add_failed: String,
    pub update_failed: String,
    pub delete_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            created: "Card created successfully".to_string(),
            updated: "Card updated successfully".to_string(),
            deleted: "Card deleted successfully".to_string(),
            add_failed: "Failed to add card".to_string(),
            update_failed: "Failed to update card".to_string(),
            delete_failed: "Failed to delete card".to_string(),
        }
    }
}

impl Messages {
    pub fn success(&self, operation: Operation) -> &str {
        match operation {
            Operation::Add => &self.created,
            Operation::Update => &self.updated,
            Operation::Delete => &self.deleted,
        }
    }

    pub fn failure(&self, operation: Operation) -> &str {
        match operation {
            Operation::Add => &self.add_failed,
            Operation::Update => &self.update_failed,
            Operation::Delete => &self.delete_failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Prefix of locally generated card ids
    pub temp_id_prefix: String,
    /// Buffer size of the notification channel
    pub notification_capacity: usize,
    pub messages: Messages,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            temp_id_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            notification_capacity: 64,
            messages: Messages::default(),
        }
    }
}
