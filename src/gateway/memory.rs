//! In-Memory Gateway
//!
//! Process-local card collection with failure injection. Backs tests and
//! demos where no real backend is available.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::traits::CardGateway;
use crate::error::{GatewayError, GatewayResult, Operation};
use crate::models::{sort_cards, Card, CardChanges, CardDraft, CardId};

#[derive(Default)]
struct MemoryState {
    cards: Vec<Card>,
    next_id: u64,
    last_created: Option<DateTime<Utc>>,
    offline: bool,
    failing_operations: HashSet<Operation>,
    failing_cards: HashSet<CardId>,
}

/// Gateway keeping every card in a mutex-guarded vector
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Ids are assigned sequentially from `first_id`
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: first_id,
                ..Default::default()
            }),
        }
    }

    /// Seed the collection with existing records
    pub fn with_cards(self, cards: Vec<Card>) -> Self {
        {
            let mut state = self.lock();
            state.last_created = cards.iter().map(|c| c.created_at).max();
            state.cards = cards;
        }
        self
    }

    /// Make every call fail with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Make every call of this kind fail
    pub fn fail_operation(&self, operation: Operation) {
        self.lock().failing_operations.insert(operation);
    }

    /// Make every update or delete of this card fail
    pub fn fail_card(&self, id: impl Into<CardId>) {
        self.lock().failing_cards.insert(id.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.offline = false;
        state.failing_operations.clear();
        state.failing_cards.clear();
    }

    /// Snapshot of every stored card regardless of owner
    pub fn snapshot(&self) -> Vec<Card> {
        self.lock().cards.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn check(&self, operation: Option<Operation>, id: Option<&CardId>) -> GatewayResult<()> {
        if self.offline {
            return Err(GatewayError::Transport("gateway offline".to_string()));
        }
        if operation.is_some_and(|op| self.failing_operations.contains(&op)) {
            return Err(GatewayError::Transport("injected failure".to_string()));
        }
        if id.is_some_and(|id| self.failing_cards.contains(id)) {
            return Err(GatewayError::Transport("injected failure".to_string()));
        }
        Ok(())
    }

    /// Strictly increasing creation time so ordering ties stay deterministic
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match self.last_created {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created = Some(created);
        created
    }
}

#[async_trait]
impl CardGateway for MemoryGateway {
    async fn list(&self, owner: &str) -> GatewayResult<Vec<Card>> {
        let state = self.lock();
        state.check(None, None)?;
        let mut cards: Vec<Card> = state
            .cards
            .iter()
            .filter(|card| card.owner == owner)
            .cloned()
            .collect();
        sort_cards(&mut cards);
        Ok(cards)
    }

    async fn create(&self, owner: &str, draft: &CardDraft) -> GatewayResult<Card> {
        let mut state = self.lock();
        state.check(Some(Operation::Add), None)?;

        let id = CardId::new(state.next_id.to_string());
        state.next_id += 1;
        let created_at = state.next_created_at();
        let mut card = Card::speculative(id, draft.clone(), created_at);
        card.owner = owner.to_string();

        state.cards.push(card.clone());
        Ok(card)
    }

    async fn update(&self, id: &CardId, changes: &CardChanges) -> GatewayResult<Card> {
        let mut state = self.lock();
        state.check(Some(Operation::Update), Some(id))?;

        let card = state
            .cards
            .iter_mut()
            .find(|card| &card.id == id)
            .ok_or_else(|| GatewayError::NotFound(id.clone()))?;
        card.apply_changes(changes);
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn delete(&self, id: &CardId) -> GatewayResult<()> {
        let mut state = self.lock();
        state.check(Some(Operation::Delete), Some(id))?;

        let before = state.cards.len();
        state.cards.retain(|card| &card.id != id);
        if state.cards.len() == before {
            return Err(GatewayError::NotFound(id.clone()));
        }
        Ok(())
    }
}
