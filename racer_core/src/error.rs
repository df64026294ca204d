//! Library error type.

use std::fmt;

/// Errors surfaced by the simulation core.
///
/// Per-frame problems (hand dropout, out-of-range values, spawn conflicts)
/// are absorbed where they happen and never show up here.
#[derive(Clone, Debug, PartialEq)]
pub enum CoreError {
    /// The landmark source could not be acquired at startup.
    SensorUnavailable(String),
    /// A startup tunable is inconsistent.
    InvalidConfig(String),
    /// A landmark frame did not contain the expected number of points.
    MalformedLandmarks { expected: usize, got: usize },
    /// An operation that needs a running session was attempted outside one.
    NotRunning,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::SensorUnavailable(why) =>
                write!(f, "landmark source unavailable: {}", why),
            CoreError::InvalidConfig(why) =>
                write!(f, "invalid configuration: {}", why),
            CoreError::MalformedLandmarks { expected, got } =>
                write!(f, "malformed landmark frame: expected {} points, got {}", expected, got),
            CoreError::NotRunning =>
                write!(f, "game loop is not running"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_cause() {
        let e = CoreError::SensorUnavailable("no device".into());
        assert_eq!(e.to_string(), "landmark source unavailable: no device");
        let e = CoreError::MalformedLandmarks { expected: 21, got: 3 };
        assert!(e.to_string().contains("expected 21"));
    }
}
