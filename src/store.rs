//! Server-Synced Card Store
//!
//! Authoritative cache of the server's card list plus thin CRUD wrappers.
//! These wrappers are the only place network side effects happen; the
//! cache only changes after the gateway confirms.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::gateway::CardGateway;
use crate::models::{sort_cards, Card, CardChanges, CardDraft, CardId};

#[derive(Default)]
struct Cache {
    cards: Vec<Card>,
    loaded: bool,
}

/// Last-known server state for one signed-in user
pub struct CardStore<G> {
    gateway: Arc<G>,
    owner: String,
    cache: RwLock<Cache>,
}

impl<G: CardGateway> CardStore<G> {
    pub fn new(gateway: Arc<G>, owner: impl Into<String>) -> Self {
        Self {
            gateway,
            owner: owner.into(),
            cache: RwLock::new(Cache::default()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Snapshot of the authoritative list
    pub fn cards(&self) -> Vec<Card> {
        self.read().cards.clone()
    }

    /// Whether a list fetch has succeeded at least once
    pub fn has_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Fetch all cards for the owner and replace the cache
    pub async fn list(&self) -> StoreResult<Vec<Card>> {
        log::debug!("Fetching cards for {}", self.owner);
        let mut cards = self.gateway.list(&self.owner).await.map_err(|e| {
            log::warn!("Error fetching cards: {}", e);
            StoreError::Fetch(e)
        })?;
        sort_cards(&mut cards);

        let mut cache = self.write();
        cache.cards = cards.clone();
        cache.loaded = true;
        log::debug!("Loaded {} cards", cards.len());
        Ok(cards)
    }

    /// Re-run the list fetch
    pub async fn refresh(&self) -> StoreResult<Vec<Card>> {
        self.list().await
    }

    /// Persist a new card and prepend the server's record to the cache
    pub async fn create(&self, draft: &CardDraft) -> StoreResult<Card> {
        log::debug!("Creating card {:?}", draft.title);
        let card = self.gateway.create(&self.owner, draft).await.map_err(|e| {
            log::warn!("Error creating card: {}", e);
            StoreError::Create(e)
        })?;

        let mut cache = self.write();
        cache.cards.retain(|c| c.id != card.id);
        cache.cards.insert(0, card.clone());
        sort_cards(&mut cache.cards);
        Ok(card)
    }

    /// Send the full card state and replace the cached entry with the result
    pub async fn update(&self, card: &Card) -> StoreResult<Card> {
        log::debug!("Updating card {}", card.id);
        let changes = CardChanges::from(card);
        let updated = self.gateway.update(&card.id, &changes).await.map_err(|e| {
            log::warn!("Error updating card {}: {}", card.id, e);
            StoreError::Update { id: card.id.clone(), source: e }
        })?;

        let mut cache = self.write();
        if let Some(entry) = cache.cards.iter_mut().find(|c| c.id == updated.id) {
            *entry = updated.clone();
        }
        sort_cards(&mut cache.cards);
        Ok(updated)
    }

    /// Remove a card on the server, then from the cache
    pub async fn delete(&self, id: &CardId) -> StoreResult<()> {
        log::debug!("Deleting card {}", id);
        self.gateway.delete(id).await.map_err(|e| {
            log::warn!("Error deleting card {}: {}", id, e);
            StoreError::Delete { id: id.clone(), source: e }
        })?;

        self.write().cards.retain(|c| &c.id != id);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Cache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, Operation};
    use crate::gateway::MemoryGateway;
    use crate::models::CardSize;

    fn store() -> (Arc<MemoryGateway>, CardStore<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::starting_at(1));
        let store = CardStore::new(gateway.clone(), "alice");
        (gateway, store)
    }

    #[tokio::test]
    async fn test_list_marks_loaded_and_fills_cache() {
        let (gateway, store) = store();
        gateway.create("alice", &CardDraft::new("A", "a")).await.unwrap();
        assert!(!store.has_loaded());

        let cards = store.list().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert!(store.has_loaded());
        assert_eq!(store.cards(), cards);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_cache() {
        let (gateway, store) = store();
        store.create(&CardDraft::new("A", "a")).await.unwrap();
        gateway.set_offline(true);

        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(GatewayError::Transport(_))));
        assert_eq!(store.cards().len(), 1);
        assert!(!store.has_loaded());
    }

    #[tokio::test]
    async fn test_create_prepends_server_record() {
        let (_gateway, store) = store();
        store.create(&CardDraft::new("first", "a")).await.unwrap();
        let second = store.create(&CardDraft::new("second", "b")).await.unwrap();

        let cards = store.cards();
        assert_eq!(cards[0], second);
        assert_eq!(cards[1].title, "first");
    }

    #[tokio::test]
    async fn test_update_replaces_entry_and_keeps_order_invariant() {
        let (_gateway, store) = store();
        let a = store.create(&CardDraft::new("A", "a")).await.unwrap();
        let b = store.create(&CardDraft::new("B", "b")).await.unwrap();
        assert_eq!(store.cards()[0].id, b.id);

        let mut moved = b.clone();
        moved.position = 5;
        moved.size = CardSize::TwoByTwo;
        let updated = store.update(&moved).await.unwrap();

        let cards = store.cards();
        assert_eq!(cards[0].id, a.id);
        assert_eq!(cards[1], updated);
        assert_eq!(cards[1].size, CardSize::TwoByTwo);
    }

    #[tokio::test]
    async fn test_failed_mutations_leave_cache_untouched() {
        let (gateway, store) = store();
        let card = store.create(&CardDraft::new("A", "a")).await.unwrap();
        let before = store.cards();

        gateway.fail_operation(Operation::Add);
        gateway.fail_card(card.id.clone());

        assert!(matches!(store.create(&CardDraft::new("B", "b")).await, Err(StoreError::Create(_))));
        let mut changed = card.clone();
        changed.title = "changed".to_string();
        assert!(matches!(store.update(&changed).await, Err(StoreError::Update { .. })));
        assert!(matches!(store.delete(&card.id).await, Err(StoreError::Delete { .. })));

        assert_eq!(store.cards(), before);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let (_gateway, store) = store();
        let card = store.create(&CardDraft::new("A", "a")).await.unwrap();
        store.delete(&card.id).await.unwrap();
        assert!(store.cards().is_empty());
    }
}
