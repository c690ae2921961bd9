//! Optimistic Patches
//!
//! Pending mutations overlaid on the authoritative list, and the pure
//! reduction that derives the visible view from them.

use std::fmt;

use crate::error::Operation;
use crate::models::{Card, CardId};

/// Identity of one patch, distinct from the card it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub u64);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchKind {
    /// Speculative new card, prepended when its id is not yet present
    Add(Card),
    /// Full replacement state for an existing card
    Update(Card),
    /// Hides the target card
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub id: PatchId,
    pub target: CardId,
    pub kind: PatchKind,
}

impl Patch {
    pub fn add(id: PatchId, card: Card) -> Self {
        Self { id, target: card.id.clone(), kind: PatchKind::Add(card) }
    }

    pub fn update(id: PatchId, card: Card) -> Self {
        Self { id, target: card.id.clone(), kind: PatchKind::Update(card) }
    }

    pub fn delete(id: PatchId, target: CardId) -> Self {
        Self { id, target, kind: PatchKind::Delete }
    }

    pub fn operation(&self) -> Operation {
        match self.kind {
            PatchKind::Add(_) => Operation::Add,
            PatchKind::Update(_) => Operation::Update,
            PatchKind::Delete => Operation::Delete,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match &self.kind {
            PatchKind::Add(card) | PatchKind::Update(card) => Some(card),
            PatchKind::Delete => None,
        }
    }
}

/// Fold `patches`, in issuance order, over the authoritative list
pub fn compute_view(authoritative: &[Card], patches: &[Patch]) -> Vec<Card> {
    patches.iter().fold(authoritative.to_vec(), |mut view, patch| {
        match &patch.kind {
            PatchKind::Add(card) => {
                if !view.iter().any(|c| c.id == card.id) {
                    view.insert(0, card.clone());
                }
            }
            PatchKind::Update(card) => {
                for entry in view.iter_mut().filter(|c| c.id == patch.target) {
                    *entry = card.clone();
                }
            }
            PatchKind::Delete => view.retain(|c| c.id != patch.target),
        }
        view
    })
}
