use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A city on a map, named and placed at a relative position within the
/// map's bounding box (see [`crate::map::Map::width`]/[`height`](crate::map::Map::height)).
///
/// Unlike the fixed 36-city board this crate's ancestor shipped, a `City`
/// here is just data: maps are supplied at runtime, not hardcoded.
#[derive(Clone, Debug, Eq, Serialize)]
pub struct City {
    pub name: String,
    pub x: u32,
    pub y: u32,
}

impl City {
    pub fn new(name: impl Into<String>, x: u32, y: u32) -> Self {
        Self { name: name.into(), x, y }
    }

    /// Whether this city's coordinates fall within a `width` x `height` canvas.
    pub fn in_bounds(&self, width: u32, height: u32) -> bool {
        self.x <= width && self.y <= height
    }
}

// Two cities are the same city iff they share a name; a valid map never
// gives two cities the same name, so comparing positions would be moot.
impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl std::hash::Hash for City {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for City {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for City {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
