//! Leptos Binding
//!
//! Mirrors the reconciliation layer into signals for fine-grained reactivity.

use leptos::prelude::*;

use crate::gateway::CardGateway;
use crate::models::{Card, CardId};
use crate::optimistic::{ListenerId, OptimisticCards};

/// Signals fed by an [`OptimisticCards`] subscription
pub struct ReactiveCards<G: CardGateway + 'static> {
    layer: OptimisticCards<G>,
    listener: ListenerId,
    view: ArcRwSignal<Vec<Card>>,
    /// Bumped on every change so loading flags can be re-read
    version: ArcRwSignal<u32>,
}

impl<G: CardGateway + 'static> ReactiveCards<G> {
    pub fn bind(layer: &OptimisticCards<G>) -> Self {
        let view = ArcRwSignal::new(layer.current_view());
        let version = ArcRwSignal::new(0u32);

        let (view_sink, version_sink) = (view.clone(), version.clone());
        let listener = layer.subscribe(move |cards| {
            view_sink.set(cards.to_vec());
            version_sink.update(|v| *v = v.wrapping_add(1));
        });

        Self { layer: layer.clone(), listener, view, version }
    }

    pub fn cards(&self) -> ArcReadSignal<Vec<Card>> {
        self.view.read_only()
    }

    pub fn version(&self) -> ArcReadSignal<u32> {
        self.version.read_only()
    }

    /// Tracks the version signal, so effects re-run when flags change
    pub fn is_loading(&self, id: &CardId) -> bool {
        self.version.track();
        self.layer.is_loading(id)
    }
}

impl<G: CardGateway + 'static> Drop for ReactiveCards<G> {
    fn drop(&mut self) {
        self.layer.unsubscribe(self.listener);
    }
}
