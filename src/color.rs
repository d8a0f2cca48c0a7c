use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four colors a connection can require and a train card can be.
///
/// Declared in alphabetical order so that the derived `Ord` matches the
/// lexicographic tie-break on a color's JSON name required when two
/// connections are otherwise equal (see [`crate::connection::Connection`]).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Green,
    Red,
    White,
}

impl Color {
    /// All four colors, in the same order used for tie-breaking and for
    /// dealing a shuffled deck.
    pub const ALL: [Color; 4] = [Color::Blue, Color::Green, Color::Red, Color::White];

    fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Red => "red",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_alphabetical() {
        let mut colors = Color::ALL.to_vec();
        colors.sort();
        assert_eq!(colors, vec![Color::Blue, Color::Green, Color::Red, Color::White]);
    }

    #[test]
    fn serializes_to_lowercase_name() {
        assert_eq!(serde_json::to_string(&Color::Blue).unwrap(), "\"blue\"");
        assert_eq!(serde_json::to_string(&Color::White).unwrap(), "\"white\"");
    }

    #[test]
    fn display_matches_json_value() {
        assert_eq!(Color::Red.to_string(), "red");
    }
}
