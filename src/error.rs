/// Errors that can prevent a referee or manager from ever starting play.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("a game needs between {min} and {max} participants, got {got}")]
    WrongParticipantCount { min: usize, max: usize, got: usize },
    #[error("map does not offer enough feasible destinations for this many participants")]
    InsufficientDestinations,
    #[error("a tournament needs at least {min} participants, got {got}")]
    TooFewParticipants { min: usize, got: usize },
}

/// Raised internally when a move reaches [`crate::r#move::ApplyVisitor`]
/// without first passing [`crate::r#move::LegalityVisitor`]. Always caught
/// by the referee and converted into a boot; never escapes to a caller.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("illegal move: {0}")]
pub struct Cheating(pub String);
