use crate::connection::Connection;
use crate::error::Cheating;
use crate::participant::Participant;
use crate::referee::RefereeState;
use serde_json::Value;

/// The two actions a participant may take on their turn.
///
/// Kept as a closed, two-variant enum (not a trait object) because the set
/// of moves is fixed by the game's rules, while the operations performed on
/// a move (checking legality, applying it, serializing it) are expected to
/// grow — exactly the shape a visitor dispatch is meant for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Move {
    DrawCards,
    AcquireConnection(Connection),
}

/// A operation performed on a [`Move`], dispatched to the variant-specific method.
pub trait MoveVisitor {
    type Output;

    fn visit_draw_cards(&mut self) -> Self::Output;
    fn visit_acquire_connection(&mut self, connection: &Connection) -> Self::Output;
}

impl Move {
    pub fn accept<V: MoveVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Move::DrawCards => visitor.visit_draw_cards(),
            Move::AcquireConnection(connection) => visitor.visit_acquire_connection(connection),
        }
    }
}

/// Checks whether a move is legal against the active participant's current
/// state, without mutating anything. Drawing cards is always legal — it is
/// the engine's job to keep the game moving, so only the acquisition move
/// needs a real rule check.
pub struct LegalityVisitor<'a> {
    pub state: &'a RefereeState,
}

impl MoveVisitor for LegalityVisitor<'_> {
    type Output = bool;

    fn visit_draw_cards(&mut self) -> bool {
        true
    }

    fn visit_acquire_connection(&mut self, connection: &Connection) -> bool {
        self.state.can_active_participant_acquire(connection)
    }
}

/// Applies a move to the referee's authoritative state, mutating it in
/// place. Returns whether the state actually changed, or [`Cheating`] if the
/// move was illegal. Must only ever be called from behind
/// [`crate::participant::guarded_call`]: drawing cards calls back into the
/// active participant's [`Participant::more`], which is itself untrusted code.
pub struct ApplyVisitor<'a> {
    pub state: &'a mut RefereeState,
    pub active: &'a mut dyn Participant,
}

impl MoveVisitor for ApplyVisitor<'_> {
    type Output = Result<bool, Cheating>;

    fn visit_draw_cards(&mut self) -> Result<bool, Cheating> {
        let drawn = self.state.draw_for_active(crate::referee::CARDS_ON_DRAW);
        let changed = !drawn.is_empty();
        self.active.more(&drawn);
        Ok(changed)
    }

    fn visit_acquire_connection(&mut self, connection: &Connection) -> Result<bool, Cheating> {
        if !self.state.can_active_participant_acquire(connection) {
            return Err(Cheating(format!("cannot acquire connection {connection}")));
        }
        self.state.acquire_for_active(connection.clone());
        Ok(true)
    }
}

/// Renders a move in the wire format participants and spectators see:
/// `"more cards"` for a draw, or the connection's own tuple encoding for an acquisition.
pub struct SerializeVisitor;

impl MoveVisitor for SerializeVisitor {
    type Output = Value;

    fn visit_draw_cards(&mut self) -> Value {
        Value::String("more cards".to_string())
    }

    fn visit_acquire_connection(&mut self, connection: &Connection) -> Value {
        serde_json::to_value(connection).expect("connection always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_cards_serializes_to_more_cards_string() {
        let value = Move::DrawCards.accept(&mut SerializeVisitor);
        assert_eq!(value, Value::String("more cards".to_string()));
    }

    #[test]
    fn acquire_connection_serializes_to_connection_tuple() {
        use crate::city::City;
        use crate::color::Color;

        let connection =
            Connection::new(City::new("Boston", 0, 0), City::new("New York", 0, 0), Color::Blue, 3).unwrap();
        let value = Move::AcquireConnection(connection).accept(&mut SerializeVisitor);
        assert_eq!(value, serde_json::json!(["Boston", "New York", "blue", 3]));
    }
}
