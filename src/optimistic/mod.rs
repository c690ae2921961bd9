//! Optimistic Reconciliation Layer
//!
//! Shows the user's intents immediately and converges to the store's
//! authoritative list once every in-flight operation settles.
//!
//! Every operation follows the same three phases:
//! - apply: push a patch and raise the loading flag (synchronous, at call time)
//! - await: the single gateway round-trip through [`CardStore`]
//! - settle: drop exactly that patch and lower the flag, success or failure
//!
//! Failures never reach the caller. They remove the patch, which reverts the
//! view, and go out on the notification channel instead.

mod loading;
mod patch;


use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::future::{self, BoxFuture};
use tokio::sync::broadcast;

pub use loading::LoadingFlags;
pub use patch::{compute_view, Patch, PatchId, PatchKind};

use crate::config::SyncConfig;
use crate::error::{Operation, StoreError, StoreResult, SyncError};
use crate::gateway::CardGateway;
use crate::models::{register_temp_prefix, Card, CardDraft, CardId};
use crate::notify::{Notification, Notifier};
use crate::reorder::assign_positions;
use crate::store::CardStore;

/// Process-wide sequence appended to temporary ids
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// User intents accepted by [`OptimisticCards::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add(CardDraft),
    Update(Card),
    Delete(CardId),
    /// The full list in its new order
    Reorder(Vec<Card>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&[Card]) + Send + Sync>;

#[derive(Default)]
struct State {
    patches: Vec<Patch>,
    loading: LoadingFlags,
    next_patch: u64,
    /// Bumped for every view handed to listeners
    version: u64,
}

/// Listener hand-off; one caller at a time drains `pending`
#[derive(Default)]
struct Delivery {
    pending: Option<(u64, Vec<Card>)>,
    delivered: u64,
    running: bool,
}

struct Inner<G> {
    store: CardStore<G>,
    config: SyncConfig,
    notifier: Notifier,
    state: Mutex<State>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    delivery: Mutex<Delivery>,
    next_listener: AtomicU64,
}

/// Handle to one session's reconciliation state; clones share it
pub struct OptimisticCards<G> {
    inner: Arc<Inner<G>>,
}

impl<G> Clone for OptimisticCards<G> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<G: CardGateway + 'static> OptimisticCards<G> {
    pub fn new(store: CardStore<G>, config: SyncConfig) -> Self {
        let notifier = Notifier::new(config.notification_capacity);
        register_temp_prefix(&config.temp_id_prefix);
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                notifier,
                state: Mutex::new(State::default()),
                listeners: Mutex::new(Vec::new()),
                delivery: Mutex::new(Delivery::default()),
                next_listener: AtomicU64::new(0),
            }),
        }
    }

    /// Layer over a fresh store for `owner` with default configuration
    pub fn for_owner(gateway: Arc<G>, owner: impl Into<String>) -> Self {
        Self::new(CardStore::new(gateway, owner), SyncConfig::default())
    }

    // ========================
    // Reads
    // ========================

    /// Authoritative list with every pending patch applied
    pub fn current_view(&self) -> Vec<Card> {
        let state = self.state();
        compute_view(&self.inner.store.cards(), &state.patches)
    }

    /// True for ids minted by this layer's configured prefix
    pub fn is_temporary(&self, id: &CardId) -> bool {
        id.has_prefix(&self.inner.config.temp_id_prefix)
    }

    pub fn is_loading(&self, id: &CardId) -> bool {
        self.state().loading.is_loading(id)
    }

    pub fn loading_ids(&self) -> Vec<CardId> {
        self.state().loading.loading_ids()
    }

    /// Patches still waiting on the server, in issuance order
    pub fn pending_patches(&self) -> Vec<Patch> {
        self.state().patches.clone()
    }

    pub fn authoritative(&self) -> Vec<Card> {
        self.inner.store.cards()
    }

    pub fn store(&self) -> &CardStore<G> {
        &self.inner.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Side channel of success and error notifications
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    // ========================
    // Listeners
    // ========================

    /// Call `listener` with the recomputed view after every change
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&[Card]) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, Arc::new(listener)));
        id
    }

    /// Returns false when the listener was already removed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    // ========================
    // Intents
    // ========================

    /// Fetch the authoritative list; failures go back to the caller
    pub async fn load(&self) -> StoreResult<Vec<Card>> {
        let cards = self.inner.store.list().await?;
        self.publish_view();
        Ok(cards)
    }

    pub fn dispatch(&self, intent: Intent) -> BoxFuture<'static, ()> {
        match intent {
            Intent::Add(draft) => Box::pin(self.add_card(draft)),
            Intent::Update(card) => Box::pin(self.update_card(card)),
            Intent::Delete(id) => Box::pin(self.delete_card(id)),
            Intent::Reorder(order) => Box::pin(self.reorder_cards(order)),
        }
    }

    /// Show `draft` at the top under a temporary id, then create it on the server
    pub fn add_card(&self, draft: CardDraft) -> impl Future<Output = ()> + Send + 'static {
        let temp_id = self.next_temp_id();
        let card = Card::speculative(temp_id.clone(), draft.clone(), Utc::now());
        let patch_id = self.apply(|id| Patch::add(id, card));

        let this = self.clone();
        async move {
            let result = this.inner.store.create(&draft).await;
            let confirmed_id = result.as_ref().map(|c| c.id.clone()).unwrap_or_else(|_| temp_id.clone());
            this.settle(patch_id, &temp_id, Operation::Add, confirmed_id, result.map(|_| ()));
        }
    }

    /// Show the new state of `card` in place, then persist it
    pub fn update_card(&self, card: Card) -> impl Future<Output = ()> + Send + 'static {
        let card_id = card.id.clone();
        let patch_id = self.apply(|id| Patch::update(id, card.clone()));

        let this = self.clone();
        async move {
            let result = this.inner.store.update(&card).await.map(|_| ());
            this.settle(patch_id, &card_id, Operation::Update, card_id.clone(), result);
        }
    }

    /// Hide the card, then delete it on the server
    pub fn delete_card(&self, id: CardId) -> impl Future<Output = ()> + Send + 'static {
        let patch_id = self.apply(|patch_id| Patch::delete(patch_id, id.clone()));

        let this = self.clone();
        async move {
            let result = this.inner.store.delete(&id).await;
            this.settle(patch_id, &id, Operation::Delete, id.clone(), result);
        }
    }

    /// Give each card its index as position and update the ones that moved
    ///
    /// The updates run concurrently and settle independently, so a partial
    /// failure leaves a partially reordered list.
    pub fn reorder_cards(&self, order: Vec<Card>) -> impl Future<Output = ()> + Send + 'static {
        let updates: Vec<_> = assign_positions(&order)
            .into_iter()
            .map(|card| self.update_card(card))
            .collect();
        log::debug!("Reorder issued {} position updates", updates.len());

        async move {
            future::join_all(updates).await;
        }
    }

    // ========================
    // Phases
    // ========================

    fn apply(&self, build: impl FnOnce(PatchId) -> Patch) -> PatchId {
        let patch_id = {
            let mut state = self.state();
            let patch_id = PatchId(state.next_patch);
            state.next_patch += 1;
            let patch = build(patch_id);
            log::debug!("Applying {} {} for card {}", patch.operation(), patch_id, patch.target);
            state.loading.start(&patch.target);
            state.patches.push(patch);
            patch_id
        };
        self.publish_view();
        patch_id
    }

    fn settle(
        &self,
        patch_id: PatchId,
        target: &CardId,
        operation: Operation,
        confirmed_id: CardId,
        result: Result<(), StoreError>,
    ) {
        {
            let mut state = self.state();
            state.patches.retain(|patch| patch.id != patch_id);
            state.loading.finish(target);
        }
        self.publish_view();

        let messages = &self.inner.config.messages;
        let notification = match result {
            Ok(()) => {
                log::info!("{} of card {} confirmed", operation, confirmed_id);
                Notification::success(operation, confirmed_id, messages.success(operation))
            }
            Err(source) => {
                let error = SyncError { operation, card_id: target.clone(), source };
                log::warn!("{}", error);
                Notification::error(operation, target.clone(), messages.failure(operation), error.to_string())
            }
        };
        self.inner.notifier.publish(notification);
    }

    /// Snapshot the view under the state lock and hand it to listeners
    ///
    /// Only the newest snapshot is ever delivered. A publish made while
    /// another caller is delivering, including from inside a listener, is
    /// picked up by that caller's loop.
    fn publish_view(&self) {
        if self.listeners().is_empty() {
            return;
        }
        let snapshot = {
            let mut state = self.state();
            state.version += 1;
            (state.version, compute_view(&self.inner.store.cards(), &state.patches))
        };

        {
            let mut delivery = self.delivery();
            let newest = delivery.pending.as_ref().map_or(delivery.delivered, |(v, _)| *v);
            if snapshot.0 > newest {
                delivery.pending = Some(snapshot);
            }
            if delivery.running {
                return;
            }
            delivery.running = true;
        }

        loop {
            let view = {
                let mut delivery = self.delivery();
                match delivery.pending.take() {
                    Some((version, view)) if version > delivery.delivered => {
                        delivery.delivered = version;
                        view
                    }
                    _ => {
                        delivery.running = false;
                        return;
                    }
                }
            };
            let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| l.clone()).collect();
            for listener in listeners {
                listener(&view);
            }
        }
    }

    fn next_temp_id(&self) -> CardId {
        let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        CardId::new(format!(
            "{}-{}-{}",
            self.inner.config.temp_id_prefix,
            Utc::now().timestamp_millis(),
            sequence
        ))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delivery(&self) -> MutexGuard<'_, Delivery> {
        self.inner.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
