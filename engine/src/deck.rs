use rand::rng;
use rand::seq::SliceRandom;

use crate::cards::{Card, Rank, Suit};
use crate::error::GameError;

/// A shuffled stack of cards, drawn from the top (back of the `Vec`) down.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A freshly shuffled 52-card deck.
    pub fn new() -> Self {
        let mut deck = Deck { cards: Vec::with_capacity(52) };
        deck.reset();
        deck
    }

    /// Repopulates with all 52 cards and shuffles. Called at the start of
    /// every hand so no state leaks between hands.
    pub fn reset(&mut self) {
        self.cards.clear();
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                self.cards.push(Card::new(rank, suit));
            }
        }
        self.shuffle();
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rng());
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn draw_card(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::DeckExhausted)
    }

    pub fn draw_many(&mut self, amount: usize) -> Result<Vec<Card>, GameError> {
        if amount > self.cards.len() {
            return Err(GameError::DeckExhausted);
        }
        let mut drawn = Vec::with_capacity(amount);
        for _ in 0..amount {
            drawn.push(self.draw_card()?);
        }
        Ok(drawn)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fresh_deck_has_fifty_two_unique_cards() {
        let deck = Deck::new();
        assert_eq!(deck.len(), 52);
        let unique: HashSet<_> = deck.cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn draw_card_shrinks_deck_and_is_exhaustible() {
        let mut deck = Deck::new();
        for _ in 0..52 {
            assert!(deck.draw_card().is_ok());
        }
        assert!(deck.is_empty());
        assert_eq!(deck.draw_card(), Err(GameError::DeckExhausted));
    }

    #[test]
    fn draw_many_rejects_more_than_remaining() {
        let mut deck = Deck::new();
        assert!(deck.draw_many(53).is_err());
        assert_eq!(deck.draw_many(52).unwrap().len(), 52);
    }

    #[test]
    fn reset_restores_full_deck() {
        let mut deck = Deck::new();
        deck.draw_many(40).unwrap();
        deck.reset();
        assert_eq!(deck.len(), 52);
    }
}
