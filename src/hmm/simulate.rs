//! Sampling a hidden path and its observations.
use super::HmmEngine;
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A simulated pair of hidden states and observed symbols, both of the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trajectory {
    pub hidden: Vec<usize>,
    pub observed: Vec<usize>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.hidden.len()
    }
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }
}

impl<'a> HmmEngine<'a> {
    /// Simulate `len` steps. The hidden path starts from the initial distribution and
    /// follows the transition rows; then each hidden state emits one symbol.
    /// All randomness comes from `rng`, so a seeded generator gives a reproducible result.
    pub fn simulate<R: Rng>(&self, len: usize, rng: &mut R) -> Trajectory {
        let mut hidden = Vec::with_capacity(len);
        if 0 < len {
            hidden.push(self.model.initial_sampler().sample(rng));
        }
        for i in 1..len {
            let next = self.model.transition_sampler(hidden[i - 1]).sample(rng);
            hidden.push(next);
        }
        let observed: Vec<_> = hidden
            .iter()
            .map(|&state| self.emission_samplers[state].sample(rng))
            .collect();
        Trajectory { hidden, observed }
    }
    /// Render a trajectory with the model's labels.
    pub fn trajectory_labels(&self, trajectory: &Trajectory) -> (Vec<&'a str>, Vec<&'a str>) {
        let hidden = self.model.states().decode(&trajectory.hidden);
        let observed = self.symbols.decode(&trajectory.observed);
        (hidden, observed)
    }
}
