//! Reorder Helpers
//!
//! Drag-end array moves and sequential position assignment.

use crate::models::{Card, CardId};

/// Move `active_id` to the index currently held by `over_id`
///
/// Returns `None` when either id is missing or both are the same card.
pub fn move_card(cards: &[Card], active_id: &CardId, over_id: &CardId) -> Option<Vec<Card>> {
    if active_id == over_id {
        return None;
    }
    let from = cards.iter().position(|c| &c.id == active_id)?;
    let to = cards.iter().position(|c| &c.id == over_id)?;

    let mut moved = cards.to_vec();
    let card = moved.remove(from);
    moved.insert(to, card);
    Some(moved)
}

/// Set each card's position to its index, returning only the cards that changed
pub fn assign_positions(order: &[Card]) -> Vec<Card> {
    order
        .iter()
        .enumerate()
        .filter_map(|(index, card)| {
            let position = i32::try_from(index).ok()?;
            (card.position != position).then(|| Card { position, ..card.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardDraft;
    use chrono::Utc;

    fn cards(ids: &[&str]) -> Vec<Card> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let mut card = Card::speculative(CardId::from(*id), CardDraft::new(*id, "x"), Utc::now());
                card.position = i as i32;
                card
            })
            .collect()
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_move_forward_and_backward() {
        let list = cards(&["a", "b", "c", "d"]);
        let moved = move_card(&list, &CardId::from("a"), &CardId::from("c")).unwrap();
        assert_eq!(ids(&moved), vec!["b", "c", "a", "d"]);

        let moved = move_card(&list, &CardId::from("d"), &CardId::from("b")).unwrap();
        assert_eq!(ids(&moved), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_move_rejects_missing_or_same_ids() {
        let list = cards(&["a", "b"]);
        assert!(move_card(&list, &CardId::from("a"), &CardId::from("a")).is_none());
        assert!(move_card(&list, &CardId::from("a"), &CardId::from("z")).is_none());
    }

    #[test]
    fn test_assign_positions_returns_changed_cards_only() {
        let list = cards(&["a", "b", "c", "d"]);
        let order = move_card(&list, &CardId::from("c"), &CardId::from("b")).unwrap();
        let changed = assign_positions(&order);

        assert_eq!(ids(&changed), vec!["c", "b"]);
        assert_eq!(changed[0].position, 1);
        assert_eq!(changed[1].position, 2);
    }
}
