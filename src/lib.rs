//! Discrete hidden Markov models: scoring, decoding, and simulation with fixed parameters.
//!
//! Build a [`ProbabilityModel`] once, then borrow it from a [`MarkovScorer`] to score state
//! sequences of a plain Markov chain, or from an [`HmmEngine`] to simulate, run Viterbi,
//! and compute forward/backward and posterior probabilities.
//!
//! ```
//! use hmmcore::{HmmEngine, ProbabilityModel};
//! let model = ProbabilityModel::hidden_markov(
//!     &["G", "I"],
//!     &["A", "C", "T", "G"],
//!     &[0.99, 0.01],
//!     &[vec![0.99, 0.01], vec![0.05, 0.95]],
//!     &[vec![0.4, 0.1, 0.4, 0.1], vec![0.2, 0.3, 0.2, 0.3]],
//! )
//! .unwrap();
//! let engine = HmmEngine::new(&model).unwrap();
//! let obs = engine.encode_observations_str("ACTG").unwrap();
//! let result = engine.viterbi(&obs).unwrap();
//! assert_eq!(result.path.len(), 4);
//! ```
#[macro_use]
extern crate log;
pub mod alphabet;
pub mod dptable;
pub mod error;
pub mod hmm;
pub mod logspace;
pub mod markov;
pub mod model;

pub use alphabet::Alphabet;
pub use dptable::DPTable;
pub use error::{InputError, ValidationError};
pub use hmm::{ForwardBackward, HmmEngine, Trajectory, ViterbiPath};
pub use markov::MarkovScorer;
pub use model::{ModelConfig, ModelParameters, ProbabilityModel};
