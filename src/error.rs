use thiserror::Error;

/// Caller-contract violations. Game-rule edge cases (not enough meter,
/// grab out of range, a special already running) never error, they no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("entity {0} is not registered")]
    EntityNotFound(u64),
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
}
