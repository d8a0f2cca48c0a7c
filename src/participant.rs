use crate::color::Color;
use crate::destination::Destination;
use crate::map::Map;
use crate::participant_state::ParticipantView;
use crate::r#move::Move;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// The behavior a game or tournament participant must implement.
///
/// Every method but [`name`](Participant::name) represents untrusted code:
/// it may panic, loop, or return nonsense. Callers must never invoke these
/// directly — always go through [`guarded_call`], the single funnel that
/// isolates a misbehaving implementation from the engine driving it.
pub trait Participant {
    /// The participant's display name. Must never fail; implementations are
    /// expected to cache this locally.
    fn name(&self) -> String;

    /// Hands the participant the game map, their starting rail count, and initial hand.
    fn setup(&mut self, map: &Map, rails: u32, cards: &HashMap<Color, u32>);

    /// Offers a set of destinations; the participant returns the ones it does *not* want.
    fn pick(&mut self, options: &std::collections::HashSet<Destination>) -> std::collections::HashSet<Destination>;

    /// Asks the participant for their move, given their current view of the game.
    fn play(&mut self, view: &ParticipantView) -> Move;

    /// Hands the participant newly drawn cards.
    fn more(&mut self, cards: &[Color]);

    /// Tells the participant whether they won the game. Called exactly once, at game end.
    fn win(&mut self, won: bool);

    /// Tells the participant they have entered a tournament; they suggest a map in response.
    fn start(&mut self) -> Map;

    /// Tells the participant whether they won the tournament. Called exactly once, at tournament end.
    fn end(&mut self, won: bool);
}

/// Marker for a participant call that panicked or otherwise could not be
/// trusted to have completed. Carries no payload: the only thing the engine
/// does with a misbehaving participant is boot or ban them, never inspect
/// the failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParticipantFailure;

impl fmt::Display for ParticipantFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("participant call panicked or returned an invalid value")
    }
}
impl std::error::Error for ParticipantFailure {}

/// The single point of control for calling into untrusted participant code.
///
/// Wraps the call in [`std::panic::catch_unwind`] so a panicking
/// participant cannot bring down the referee or manager driving it. The
/// `AssertUnwindSafe` is sound here because the caller always boots the
/// participant immediately after a failure and never relies on any state
/// the closure may have left half-mutated.
pub fn guarded_call<F, T>(f: F) -> Result<T, ParticipantFailure>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| ParticipantFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_call_passes_through_normal_results() {
        assert_eq!(guarded_call(|| 1 + 1), Ok(2));
    }

    #[test]
    fn guarded_call_catches_panics() {
        let result: Result<(), _> = guarded_call(|| panic!("participant misbehaved"));
        assert_eq!(result, Err(ParticipantFailure));
    }
}
