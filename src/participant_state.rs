use crate::color::Color;
use crate::connection::Connection;
use crate::destination::Destination;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A participant's private view of their own progress in a game: the
/// connections they own, their hand, remaining rails, and assigned
/// destinations. Held by the referee, one per participant, and updated after
/// every turn.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParticipantGameState {
    pub owned: HashSet<Connection>,
    pub cards: HashMap<Color, u32>,
    pub rails: u32,
    pub destinations: HashSet<Destination>,
}

impl ParticipantGameState {
    pub fn new(rails: u32, destinations: HashSet<Destination>) -> Self {
        let cards = Color::ALL.into_iter().map(|c| (c, 0)).collect();
        Self { owned: HashSet::new(), cards, rails, destinations }
    }

    pub fn total_cards(&self) -> u32 {
        self.cards.values().sum()
    }

    pub fn add_cards(&mut self, drawn: &[Color]) {
        for card in drawn {
            *self.cards.entry(*card).or_insert(0) += 1;
        }
    }
}

/// Everything a participant is told about a game once it is their turn: their
/// own resources plus every opponent's acquired connections, rotated so
/// index 0 is the opponent who plays immediately after them.
#[derive(Clone, Debug)]
pub struct ParticipantView {
    pub owned: HashSet<Connection>,
    pub cards: HashMap<Color, u32>,
    pub rails: u32,
    pub destinations: HashSet<Destination>,
    pub opponents: Vec<HashSet<Connection>>,
}

impl Serialize for ParticipantView {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut destinations: Vec<&Destination> = self.destinations.iter().collect();
        destinations.sort();
        let mut owned: Vec<&Connection> = self.owned.iter().collect();
        owned.sort();

        let mut this_player = serde_json::Map::new();
        this_player.insert(
            "destination1".into(),
            serde_json::to_value(destinations.first().map(|d| {
                let (a, b) = d.cities();
                vec![a.name.clone(), b.name.clone()]
            }))
            .unwrap(),
        );
        this_player.insert(
            "destination2".into(),
            serde_json::to_value(destinations.get(1).map(|d| {
                let (a, b) = d.cities();
                vec![a.name.clone(), b.name.clone()]
            }))
            .unwrap(),
        );
        this_player.insert("rails".into(), self.rails.into());
        let cards: HashMap<String, u32> = self.cards.iter().map(|(c, n)| (c.to_string(), *n)).collect();
        this_player.insert("cards".into(), serde_json::to_value(cards).unwrap());
        this_player.insert("acquired".into(), serde_json::to_value(&owned).unwrap());

        let opponent_acquireds: Vec<Vec<&Connection>> = self
            .opponents
            .iter()
            .map(|acquired| {
                let mut sorted: Vec<&Connection> = acquired.iter().collect();
                sorted.sort();
                sorted
            })
            .collect();

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("this", &this_player)?;
        map.serialize_entry("acquired", &opponent_acquireds)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;

    fn city(name: &str) -> City {
        City::new(name, 0, 0)
    }

    #[test]
    fn new_state_has_zeroed_hand_for_every_color() {
        let destinations = HashSet::from([Destination::new(city("A"), city("B")).unwrap()]);
        let state = ParticipantGameState::new(45, destinations);
        assert_eq!(state.cards.len(), 4);
        assert_eq!(state.total_cards(), 0);
    }

    #[test]
    fn add_cards_tallies_by_color() {
        let mut state = ParticipantGameState::new(45, HashSet::new());
        state.add_cards(&[Color::Red, Color::Red, Color::Blue]);
        assert_eq!(state.cards[&Color::Red], 2);
        assert_eq!(state.cards[&Color::Blue], 1);
    }

    #[test]
    fn view_serializes_this_and_acquired_keys() {
        let view = ParticipantView {
            owned: HashSet::new(),
            cards: Color::ALL.into_iter().map(|c| (c, 0)).collect(),
            rails: 45,
            destinations: HashSet::from([Destination::new(city("A"), city("B")).unwrap()]),
            opponents: vec![HashSet::new()],
        };
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("this").is_some());
        assert!(value.get("acquired").is_some());
    }
}
