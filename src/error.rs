//! Error types.
//!
//! Construction of a model reports a [`ValidationError`]; a model that failed to build
//! is never observable. Each scoring or decoding call reports an [`InputError`], which
//! leaves the model intact and usable for the next call.
use thiserror::Error;

/// Which distribution of a model an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Initial,
    /// A row of the transition matrix, indexed by the source state.
    Transition(usize),
    /// A row of the emission matrix, indexed by the hidden state.
    Emission(usize),
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distribution::Initial => write!(f, "initial distribution"),
            Distribution::Transition(row) => write!(f, "transition row {}", row),
            Distribution::Emission(row) => write!(f, "emission row {}", row),
        }
    }
}

/// A model could not be built from the given parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{dist} sums to {sum}, not 1 within {tolerance}")]
    NotNormalized {
        dist: Distribution,
        sum: f64,
        tolerance: f64,
    },
    #[error("{dist} has invalid probability {value} at {index}")]
    InvalidProbability {
        dist: Distribution,
        index: usize,
        value: f64,
    },
    #[error("label {0:?} appears more than once in the alphabet")]
    DuplicateLabel(String),
    #[error("the model has no emission matrix")]
    MissingEmission,
    #[error("tolerance must be a finite, non-negative number, found {0}")]
    InvalidTolerance(f64),
}

/// A call received input it cannot score or decode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown label {label:?} at position {position}")]
    UnknownLabel { position: usize, label: String },
    #[error("state index {index} at position {position} is out of range (n_states = {n_states})")]
    InvalidState {
        position: usize,
        index: usize,
        n_states: usize,
    },
    #[error("the label sequence is empty")]
    EmptySequence,
    #[error("the observation sequence is empty")]
    EmptyObservations,
    #[error("observation {symbol} at position {position} is out of range (n_symbols = {n_symbols})")]
    InvalidObservation {
        position: usize,
        symbol: usize,
        n_symbols: usize,
    },
    #[error("the observations have probability zero under the model")]
    ZeroLikelihood,
}

/// Errors surfaced by the command line front end.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
