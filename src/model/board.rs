//! The ordered collection model: the full card set of the active project.
//!
//! A pure in-memory projection — no operation here performs network I/O.
//! Only the mutation engine and the push merger write to it.

use crate::model::types::Card;

/// Holds every card of the active project. Ordering within a column is
/// derived from each card's `position`; intermediate drag states may carry
/// duplicate or gap positions, which is tolerated because the engine
/// re-derives dense positions from list order at the next reorder.
#[derive(Debug, Clone, Default)]
pub struct BoardModel {
    cards: Vec<Card>,
}

impl BoardModel {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Cards of `column`, sorted by position ascending. The sort is stable,
    /// so equal intermediate positions keep their insertion order.
    pub fn cards_in_column(&self, column: &str) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.cards.iter().filter(|c| c.column == column).collect();
        cards.sort_by_key(|c| c.position);
        cards
    }

    pub fn count_in_column(&self, column: &str) -> usize {
        self.cards.iter().filter(|c| c.column == column).count()
    }

    pub fn get(&self, card_id: i64) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn get_mut(&mut self, card_id: i64) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    /// Replace the whole working set (project load, search response).
    pub fn replace(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }

    /// Insert or update a card by id.
    pub fn upsert(&mut self, card: Card) {
        match self.cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card,
            None => self.cards.push(card),
        }
    }

    /// Remove a card by id, returning it if present.
    pub fn remove(&mut self, card_id: i64) -> Option<Card> {
        let idx = self.cards.iter().position(|c| c.id == card_id)?;
        Some(self.cards.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}
