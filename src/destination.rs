use crate::city::City;
use serde::Serialize;
use std::cmp::Ordering;

/// A pair of cities a participant is privately tasked with connecting.
///
/// Cities are kept in canonical order (`city_a.name < city_b.name`) for the
/// same reason [`crate::connection::Connection`] does: it lets `Ord` fall
/// out of field order instead of a hand-written comparator.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Destination {
    pub city_a: City,
    pub city_b: City,
}

/// Returned when a destination is built from two cities that share a name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("a destination must join two distinct cities")]
pub struct SameCityError;

impl Destination {
    pub fn new(city_a: City, city_b: City) -> Result<Self, SameCityError> {
        if city_a == city_b {
            return Err(SameCityError);
        }
        let (city_a, city_b) = if city_a <= city_b {
            (city_a, city_b)
        } else {
            (city_b, city_a)
        };
        Ok(Self { city_a, city_b })
    }

    pub fn cities(&self) -> (&City, &City) {
        (&self.city_a, &self.city_b)
    }
}

impl PartialOrd for Destination {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Destination {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.city_a, &self.city_b).cmp(&(&other.city_a, &other.city_b))
    }
}

impl Serialize for Destination {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.city_a.name)?;
        tup.serialize_element(&self.city_b.name)?;
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
        let d = Destination::new(city("Seattle"), city("Boston")).unwrap();
        assert_eq!(d.city_a.name, "Boston");
        assert_eq!(d.city_b.name, "Seattle");
    }

    #[test]
    fn serializes_as_wire_tuple() {
        let d = Destination::new(city("Seattle"), city("Boston")).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "[\"Boston\",\"Seattle\"]");
    }
}
