use thiserror::Error;

/// Structural validation errors raised while turning fragments into metric
/// values or block configuration. Raised once, at compile time — callers are
/// expected to reject the offending statement rather than recover from it.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("timer duration must be non-zero, got {0}ms")]
    ZeroDuration(i64),
    #[error("rep scheme must not be empty")]
    EmptyRepScheme,
    #[error("rep scheme entry must be greater than zero, got {0}")]
    NonPositiveRepSchemeEntry(u32),
    #[error("rounds count must be at least 1, got {0}")]
    NonPositiveRoundsCount(i64),
    #[error("interval duration must be greater than zero, got {0}ms")]
    NonPositiveIntervalDuration(i64),
}
