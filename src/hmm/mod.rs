//! A tiny implementation of discrete hidden Markov models.
//!
//! [`HmmEngine`] borrows a [`ProbabilityModel`] with an emission matrix and runs the usual
//! algorithms on it: simulation, Viterbi, and forward/backward with posterior decoding.
//! All of them work in log-space on a (states x length) DP table owned by the call,
//! so Viterbi and forward/backward run in O(|S|^2 T) time and O(|S| T) space.
//! Observations are emission indices; use `encode_observations` to translate labels.
pub mod forward_backward;
pub mod simulate;
pub mod viterbi;
pub use forward_backward::ForwardBackward;
pub use simulate::Trajectory;
pub use viterbi::ViterbiPath;

use crate::alphabet::Alphabet;
use crate::error::{InputError, ValidationError};
use crate::model::ProbabilityModel;
use rand::distributions::WeightedIndex;

#[derive(Debug, Clone, Copy)]
pub struct HmmEngine<'a> {
    model: &'a ProbabilityModel,
    symbols: &'a Alphabet,
    emission_samplers: &'a [WeightedIndex<f64>],
}

impl<'a> HmmEngine<'a> {
    /// Fails if the model has no emission matrix.
    pub fn new(model: &'a ProbabilityModel) -> Result<Self, ValidationError> {
        match (model.symbols(), model.emission_samplers()) {
            (Some(symbols), Some(emission_samplers)) => Ok(Self {
                model,
                symbols,
                emission_samplers,
            }),
            _ => Err(ValidationError::MissingEmission),
        }
    }
    pub fn model(&self) -> &'a ProbabilityModel {
        self.model
    }
    pub fn n_states(&self) -> usize {
        self.model.n_states()
    }
    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }
    pub fn symbols(&self) -> &'a Alphabet {
        self.symbols
    }
    /// Translate emission labels into indices.
    pub fn encode_observations<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, InputError> {
        self.symbols.encode(labels)
    }
    /// Same as `encode_observations`, one label per character.
    pub fn encode_observations_str(&self, seq: &str) -> Result<Vec<usize>, InputError> {
        self.symbols.encode_chars(seq)
    }
    // Every call checks its input here, before any table is allocated.
    fn validate_observations(&self, observations: &[usize]) -> Result<(), InputError> {
        if observations.is_empty() {
            return Err(InputError::EmptyObservations);
        }
        let n_symbols = self.n_symbols();
        match observations
            .iter()
            .enumerate()
            .find(|(_, &o)| n_symbols <= o)
        {
            Some((position, &symbol)) => Err(InputError::InvalidObservation {
                position,
                symbol,
                n_symbols,
            }),
            None => Ok(()),
        }
    }
}
