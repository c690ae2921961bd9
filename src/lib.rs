//! Card Board
//!
//! Optimistic card list for a personal card board:
//! - models: cards, drafts and change sets
//! - gateway: persistence gateway trait and an in-memory implementation
//! - store: authoritative, server-synced cache
//! - optimistic: reconciliation layer shown to the user
//! - notify: success/error side channel
//! - reorder: drag-end moves and position assignment

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod optimistic;
#[cfg(feature = "leptos")]
pub mod reactive;
pub mod reorder;
pub mod store;

pub use config::{Messages, SyncConfig};
pub use error::{GatewayError, Operation, StoreError, SyncError};
pub use gateway::{CardGateway, MemoryGateway};
pub use models::{Card, CardChanges, CardColor, CardDraft, CardId, CardSize, CardType, ValidationError};
pub use notify::{Notification, NotificationKind, Notifier};
pub use optimistic::{compute_view, Intent, OptimisticCards, Patch, PatchKind};
pub use store::CardStore;
