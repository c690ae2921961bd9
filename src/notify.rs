//! Notifications
//!
//! Side-channel feed of toast-style outcomes, backed by a
//! `tokio::sync::broadcast` channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Operation;
use crate::models::CardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Outcome of one settled operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub operation: Operation,
    pub card_id: CardId,
    /// User-facing text
    pub message: String,
    /// Underlying error text for error notifications
    pub detail: Option<String>,
}

impl Notification {
    pub fn success(operation: Operation, card_id: CardId, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            operation,
            card_id,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(
        operation: Operation,
        card_id: CardId,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::Error,
            operation,
            card_id,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Fan-out sender for [`Notification`]s
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// When the buffer is full the oldest notifications are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishing with no subscribers drops the notification
    pub fn publish(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}
