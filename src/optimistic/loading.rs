//! Per-card loading flags, counted so overlapping operations on one id
//! keep the flag raised until the last of them settles.

use std::collections::HashMap;

use crate::models::CardId;

#[derive(Debug, Default, Clone)]
pub struct LoadingFlags {
    in_flight: HashMap<CardId, usize>,
}

impl LoadingFlags {
    pub fn start(&mut self, id: &CardId) {
        *self.in_flight.entry(id.clone()).or_default() += 1;
    }

    pub fn finish(&mut self, id: &CardId) {
        if let Some(count) = self.in_flight.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(id);
            }
        }
    }

    pub fn is_loading(&self, id: &CardId) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn loading_ids(&self) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self.in_flight.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_stays_raised_until_last_finish() {
        let mut flags = LoadingFlags::default();
        let id = CardId::from("1");
        flags.start(&id);
        flags.start(&id);
        flags.finish(&id);
        assert!(flags.is_loading(&id));
        flags.finish(&id);
        assert!(!flags.is_loading(&id));
        assert!(flags.is_idle());
    }

    #[test]
    fn test_finish_unknown_id_is_ignored() {
        let mut flags = LoadingFlags::default();
        flags.finish(&CardId::from("missing"));
        flags.start(&CardId::from("b"));
        flags.start(&CardId::from("a"));
        assert_eq!(flags.loading_ids(), vec![CardId::from("a"), CardId::from("b")]);
    }
}
