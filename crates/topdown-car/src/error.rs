//! Error types for the topdown-car crate.

use std::fmt;

use crate::world::BodyHandle;

/// Result type for topdown-car operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or loading a simulation.
///
/// Stepping a constructed simulation never fails; every variant here is
/// raised at construction or load time.
#[derive(Debug)]
pub enum Error {
    /// The vehicle spec does not describe exactly four wheels.
    WheelCount {
        /// Number of wheels found in the spec.
        actual: usize,
    },
    /// Two wheels claim the same role.
    DuplicateWheel {
        /// Debug name of the repeated role.
        position: &'static str,
    },
    /// A placement has non-finite coordinates or non-positive extents.
    InvalidPlacement {
        /// Which placement was rejected.
        context: String,
        /// Description of what was invalid.
        detail: String,
    },
    /// Fewer or more observers than bodies that need one.
    ObserverCount {
        /// Number of observers the spec requires.
        expected: usize,
        /// Number of observers supplied.
        actual: usize,
    },
    /// The physics backend was handed a handle it never issued.
    UnknownBody(BodyHandle),
    /// The physics backend rejected a joint or fixture definition.
    InvalidConstraint {
        /// The kind of constraint being created.
        kind: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// A command name did not match any known steer or control value.
    UnknownCommand {
        /// The command family being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
    /// Reading a spec or writing telemetry failed.
    Io(std::io::Error),
    /// A spec file could not be parsed.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WheelCount { actual } => {
                write!(f, "vehicle spec must have exactly 4 wheels, got {actual}")
            }
            Error::DuplicateWheel { position } => {
                write!(f, "wheel position {position} appears more than once")
            }
            Error::InvalidPlacement { context, detail } => {
                write!(f, "invalid {context} placement: {detail}")
            }
            Error::ObserverCount { expected, actual } => {
                write!(f, "expected {expected} pose observers, got {actual}")
            }
            Error::UnknownBody(handle) => write!(f, "unknown body handle {handle}"),
            Error::InvalidConstraint { kind, detail } => {
                write!(f, "invalid {kind}: {detail}")
            }
            Error::UnknownCommand { kind, value } => {
                write!(f, "unknown {kind} command '{value}'")
            }
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Json(e) => write!(f, "spec parse error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
