use crate::city::City;
use crate::color::Color;
use serde::Serialize;
use std::fmt;

/// Lengths a connection's rail segment may have, in cards/rails required to claim it.
pub const VALID_LENGTHS: [u32; 3] = [3, 4, 5];

/// A single colored rail segment joining two distinct cities.
///
/// Cities are stored in canonical order (`city_a.name < city_b.name`), and
/// the fields are declared `(city_a, city_b, length, color)` specifically so
/// the derived `Ord` reproduces the tie-break spelled out for connections:
/// smaller city name, then the other city name, then length, then color name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Connection {
    pub city_a: City,
    pub city_b: City,
    pub length: u32,
    pub color: Color,
}

/// Returned when a connection is built from two cities that share a name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("a connection must join two distinct cities")]
pub struct SameCityError;

impl Connection {
    /// Builds a connection, canonicalizing city order.
    ///
    /// `length` is not validated against [`VALID_LENGTHS`] here: a [`crate::map::Map`]
    /// validates the connections it is constructed with as a whole, so a
    /// length outside the usual range is rejected at that boundary instead
    /// of duplicating the check on every call site.
    pub fn new(city_a: City, city_b: City, color: Color, length: u32) -> Result<Self, SameCityError> {
        if city_a == city_b {
            return Err(SameCityError);
        }
        let (city_a, city_b) = if city_a <= city_b {
            (city_a, city_b)
        } else {
            (city_b, city_a)
        };
        Ok(Self { city_a, city_b, length, color })
    }

    /// The two cities this connection joins, in canonical order.
    pub fn cities(&self) -> (&City, &City) {
        (&self.city_a, &self.city_b)
    }

    pub fn touches(&self, city: &City) -> bool {
        &self.city_a == city || &self.city_b == city
    }

    /// The city on the other end of this connection from `city`, if it touches it at all.
    pub fn other_end(&self, city: &City) -> Option<&City> {
        if &self.city_a == city {
            Some(&self.city_b)
        } else if &self.city_b == city {
            Some(&self.city_a)
        } else {
            None
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({}, {})", self.city_a, self.city_b, self.color, self.length)
    }
}

impl Serialize for Connection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&self.city_a.name)?;
        tup.serialize_element(&self.city_b.name)?;
        tup.serialize_element(&self.color)?;
        tup.serialize_element(&self.length)?;
        tup.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> City {
        City::new(name, 0, 0)
    }

    #[test]
    fn canonicalizes_city_order() {
        let conn = Connection::new(city("New York"), city("Boston"), Color::Blue, 3).unwrap();
        assert_eq!(conn.city_a.name, "Boston");
        assert_eq!(conn.city_b.name, "New York");
    }

    #[test]
    fn rejects_self_loop() {
        assert!(Connection::new(city("Boston"), city("Boston"), Color::Blue, 3).is_err());
    }

    #[test]
    fn orders_by_city_then_length_then_color() {
        let a = Connection::new(city("Boston"), city("New York"), Color::Blue, 3).unwrap();
        let b = Connection::new(city("Boston"), city("New York"), Color::Red, 3).unwrap();
        assert!(a < b);
    }

    #[test]
    fn serializes_as_wire_tuple() {
        let conn = Connection::new(city("New York"), city("Boston"), Color::Blue, 3).unwrap();
        let json = serde_json::to_string(&conn).unwrap();
        assert_eq!(json, "[\"Boston\",\"New York\",\"blue\",3]");
    }
}
