use crate::color::Color;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::VecDeque;

/// The shared draw pile of colored train cards.
///
/// Cards are drawn from the front; `draw` never errors, returning fewer
/// cards than requested (possibly none) once the deck is exhausted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Deck(VecDeque<Color>);

impl Deck {
    /// Builds a shuffled deck of `count` cards, drawn uniformly from the four colors.
    pub fn random(count: usize) -> Self {
        let mut cards: Vec<Color> = (0..count).map(|_| *Color::ALL.choose(&mut thread_rng()).unwrap()).collect();
        cards.shuffle(&mut thread_rng());
        Self(cards.into())
    }

    /// Builds a deck from an explicit, ordered sequence of cards (front first); used by
    /// tests and embedders that want a deterministic deck.
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        Self(colors.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Draws up to `count` cards from the front of the deck.
    pub fn draw(&mut self, count: usize) -> Vec<Color> {
        let mut drawn = Vec::with_capacity(count.min(self.0.len()));
        for _ in 0..count {
            match self.0.pop_front() {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_from_front_in_order() {
        let mut deck = Deck::from_colors([Color::Red, Color::Blue, Color::Green]);
        assert_eq!(deck.draw(2), vec![Color::Red, Color::Blue]);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn draw_past_exhaustion_returns_fewer_cards() {
        let mut deck = Deck::from_colors([Color::Red]);
        assert_eq!(deck.draw(5), vec![Color::Red]);
        assert_eq!(deck.draw(5), Vec::<Color>::new());
        assert!(deck.is_empty());
    }

    #[test]
    fn random_deck_has_requested_size() {
        let deck = Deck::random(250);
        assert_eq!(deck.len(), 250);
    }
}
