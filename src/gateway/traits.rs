//! Gateway Trait
//!
//! The four calls the card store makes against the backend. A single call
//! is never partially applied; any of them may fail with a transport or
//! authorization error.

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::{Card, CardChanges, CardDraft, CardId};

/// CRUD over a user's card collection
#[async_trait]
pub trait CardGateway: Send + Sync {
    /// All cards of `owner`, ordered by `position` ascending then `created_at` descending
    async fn list(&self, owner: &str) -> GatewayResult<Vec<Card>>;

    /// Persist a new card; the server assigns id, timestamps and records `owner`
    async fn create(&self, owner: &str, draft: &CardDraft) -> GatewayResult<Card>;

    /// Apply a partial update and return the full stored record
    async fn update(&self, id: &CardId, changes: &CardChanges) -> GatewayResult<Card>;

    /// Remove a card by id
    async fn delete(&self, id: &CardId) -> GatewayResult<()>;
}
