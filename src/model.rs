//! Validated probability models.
//!
//! A [`ProbabilityModel`] holds an initial distribution, a transition matrix and,
//! for hidden Markov models, an emission matrix. Every distribution is checked at
//! construction and cached in log-space, so scoring never touches the raw values.
//! Once built, a model is never mutated and can be shared between threads.
use crate::alphabet::Alphabet;
use crate::error::{Distribution, ValidationError};
use crate::logspace::log;
use rand::distributions::WeightedIndex;
use serde::{Deserialize, Serialize};

/// Default tolerance of a chain-only model, such as a substitution table.
pub const CHAIN_TOLERANCE: f64 = 1e-2;
/// Default tolerance of a full hidden Markov model.
pub const HMM_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
/// Configurations
pub struct ModelConfig {
    /// Each distribution should sum up to 1 within this value.
    pub tolerance: f64,
}

impl ModelConfig {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
    pub fn chain() -> Self {
        Self::new(CHAIN_TOLERANCE)
    }
    pub fn hmm() -> Self {
        Self::new(HMM_TOLERANCE)
    }
    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl std::default::Default for ModelConfig {
    fn default() -> Self {
        Self::hmm()
    }
}

/// Raw parameters of a model, in probability space.
/// `transition[i][j]` is Pr{i -> j} and `emission[i][k]` is Pr{k | i}.
/// This is what a model file contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    pub initial: Vec<f64>,
    pub transition: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission: Option<Vec<Vec<f64>>>,
}

impl ModelParameters {
    /// Parameters of a Markov chain, without emissions.
    pub fn chain<S: AsRef<str>>(states: &[S], initial: &[f64], transition: &[Vec<f64>]) -> Self {
        Self {
            states: states.iter().map(|x| x.as_ref().to_string()).collect(),
            symbols: None,
            initial: initial.to_vec(),
            transition: transition.to_vec(),
            emission: None,
        }
    }
    /// Parameters of a hidden Markov model.
    pub fn hidden<S: AsRef<str>, T: AsRef<str>>(
        states: &[S],
        symbols: &[T],
        initial: &[f64],
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
    ) -> Self {
        Self {
            states: states.iter().map(|x| x.as_ref().to_string()).collect(),
            symbols: Some(symbols.iter().map(|x| x.as_ref().to_string()).collect()),
            initial: initial.to_vec(),
            transition: transition.to_vec(),
            emission: Some(emission.to_vec()),
        }
    }
}

/// Uniform initial distribution over `n` states.
pub fn uniform_initial(n: usize) -> Vec<f64> {
    vec![(n as f64).recip(); n]
}

#[derive(Debug, Clone)]
struct Emission {
    symbols: Alphabet,
    // [state * n_symbols + symbol]
    probs: Vec<f64>,
    log_probs: Vec<f64>,
    samplers: Vec<WeightedIndex<f64>>,
}

/// A validated, immutable Markov model.
#[derive(Debug, Clone)]
pub struct ProbabilityModel {
    states: Alphabet,
    tolerance: f64,
    initial: Vec<f64>,
    log_initial: Vec<f64>,
    initial_sampler: WeightedIndex<f64>,
    // [from * n_states + to] = Pr{from -> to}
    transition: Vec<f64>,
    log_transition: Vec<f64>,
    transition_samplers: Vec<WeightedIndex<f64>>,
    emission: Option<Emission>,
}

// Check a distribution entry-wise and as a whole, and return a sampler for it.
fn check_distribution(
    probs: &[f64],
    dist: Distribution,
    tolerance: f64,
) -> Result<WeightedIndex<f64>, ValidationError> {
    if let Some((index, &value)) = probs
        .iter()
        .enumerate()
        .find(|(_, &x)| !x.is_finite() || x < 0f64 || 1f64 < x)
    {
        return Err(ValidationError::InvalidProbability { dist, index, value });
    }
    let sum: f64 = probs.iter().sum();
    let not_normalized = ValidationError::NotNormalized {
        dist,
        sum,
        tolerance,
    };
    if tolerance < (sum - 1f64).abs() {
        return Err(not_normalized);
    }
    WeightedIndex::new(probs).map_err(|_| not_normalized)
}

fn check_shape(what: &'static str, expected: usize, found: usize) -> Result<(), ValidationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ValidationError::ShapeMismatch {
            what,
            expected,
            found,
        })
    }
}

impl ProbabilityModel {
    /// Validate the parameters and build a model.
    /// Nothing is returned unless every distribution passes.
    pub fn new(params: &ModelParameters, config: &ModelConfig) -> Result<Self, ValidationError> {
        let tolerance = config.tolerance;
        if !tolerance.is_finite() || tolerance < 0f64 {
            return Err(ValidationError::InvalidTolerance(tolerance));
        }
        let states = Alphabet::new(&params.states)?;
        let n = states.len();
        if n == 0 {
            return Err(ValidationError::ShapeMismatch {
                what: "state alphabet",
                expected: 1,
                found: 0,
            });
        }
        check_shape("initial distribution", n, params.initial.len())?;
        check_shape("transition rows", n, params.transition.len())?;
        for row in params.transition.iter() {
            check_shape("transition columns", n, row.len())?;
        }
        let initial_sampler = check_distribution(&params.initial, Distribution::Initial, tolerance)?;
        let transition_samplers = params
            .transition
            .iter()
            .enumerate()
            .map(|(i, row)| check_distribution(row, Distribution::Transition(i), tolerance))
            .collect::<Result<Vec<_>, _>>()?;
        let emission = match (params.symbols.as_ref(), params.emission.as_ref()) {
            (Some(symbols), Some(emission)) => {
                Some(Self::check_emission(symbols, emission, n, tolerance)?)
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ValidationError::ShapeMismatch {
                    what: "emission rows",
                    expected: n,
                    found: 0,
                })
            }
            (None, Some(emission)) => {
                return Err(ValidationError::ShapeMismatch {
                    what: "emission alphabet",
                    expected: emission.first().map(|row| row.len()).unwrap_or(0),
                    found: 0,
                })
            }
        };
        let initial = params.initial.clone();
        let transition: Vec<f64> = params.transition.iter().flatten().copied().collect();
        let log_initial = initial.iter().map(|&x| log(x)).collect();
        let log_transition = transition.iter().map(|&x| log(x)).collect();
        debug!(
            "MODEL\t{}\t{}\t{}",
            n,
            emission.as_ref().map(|e| e.symbols.len()).unwrap_or(0),
            tolerance
        );
        Ok(Self {
            states,
            tolerance,
            initial,
            log_initial,
            initial_sampler,
            transition,
            log_transition,
            transition_samplers,
            emission,
        })
    }
    fn check_emission(
        symbols: &[String],
        emission: &[Vec<f64>],
        n: usize,
        tolerance: f64,
    ) -> Result<Emission, ValidationError> {
        let symbols = Alphabet::new(symbols)?;
        let m = symbols.len();
        if m == 0 {
            return Err(ValidationError::ShapeMismatch {
                what: "emission alphabet",
                expected: 1,
                found: 0,
            });
        }
        check_shape("emission rows", n, emission.len())?;
        for row in emission.iter() {
            check_shape("emission columns", m, row.len())?;
        }
        let samplers = emission
            .iter()
            .enumerate()
            .map(|(i, row)| check_distribution(row, Distribution::Emission(i), tolerance))
            .collect::<Result<Vec<_>, _>>()?;
        let probs: Vec<f64> = emission.iter().flatten().copied().collect();
        let log_probs = probs.iter().map(|&x| log(x)).collect();
        Ok(Emission {
            symbols,
            probs,
            log_probs,
            samplers,
        })
    }
    /// A Markov chain with the default chain tolerance.
    pub fn markov_chain<S: AsRef<str>>(
        states: &[S],
        initial: &[f64],
        transition: &[Vec<f64>],
    ) -> Result<Self, ValidationError> {
        let params = ModelParameters::chain(states, initial, transition);
        Self::new(&params, &ModelConfig::chain())
    }
    /// A hidden Markov model with the default HMM tolerance.
    pub fn hidden_markov<S: AsRef<str>, T: AsRef<str>>(
        states: &[S],
        symbols: &[T],
        initial: &[f64],
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
    ) -> Result<Self, ValidationError> {
        let params = ModelParameters::hidden(states, symbols, initial, transition, emission);
        Self::new(&params, &ModelConfig::hmm())
    }
    /// Export the parameters back in probability space.
    pub fn parameters(&self) -> ModelParameters {
        let n = self.n_states();
        let transition = self.transition.chunks_exact(n).map(|x| x.to_vec()).collect();
        let (symbols, emission) = match self.emission.as_ref() {
            Some(e) => {
                let rows = e.probs.chunks_exact(e.symbols.len());
                (
                    Some(e.symbols.labels().to_vec()),
                    Some(rows.map(|x| x.to_vec()).collect()),
                )
            }
            None => (None, None),
        };
        ModelParameters {
            states: self.states.labels().to_vec(),
            symbols,
            initial: self.initial.clone(),
            transition,
            emission,
        }
    }
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
    /// Number of emission symbols. Zero for a chain-only model.
    pub fn n_symbols(&self) -> usize {
        self.emission.as_ref().map(|e| e.symbols.len()).unwrap_or(0)
    }
    pub fn has_emission(&self) -> bool {
        self.emission.is_some()
    }
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
    pub fn states(&self) -> &Alphabet {
        &self.states
    }
    pub fn symbols(&self) -> Option<&Alphabet> {
        self.emission.as_ref().map(|e| &e.symbols)
    }
    pub fn initial(&self, state: usize) -> f64 {
        self.initial[state]
    }
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transition[from * self.n_states() + to]
    }
    /// Pr{symbol | state}. Zero for a chain-only model.
    pub fn emission(&self, state: usize, symbol: usize) -> f64 {
        match self.emission.as_ref() {
            Some(e) => e.probs[state * e.symbols.len() + symbol],
            None => 0f64,
        }
    }
    pub fn log_initial(&self, state: usize) -> f64 {
        self.log_initial[state]
    }
    pub fn log_transition(&self, from: usize, to: usize) -> f64 {
        self.log_transition[from * self.n_states() + to]
    }
    /// Log transition probabilities out of `from`.
    pub fn log_transition_row(&self, from: usize) -> &[f64] {
        let n = self.n_states();
        &self.log_transition[from * n..(from + 1) * n]
    }
    /// log Pr{symbol | state}. `LOG_ZERO` for a chain-only model.
    pub fn log_emission(&self, state: usize, symbol: usize) -> f64 {
        match self.emission.as_ref() {
            Some(e) => e.log_probs[state * e.symbols.len() + symbol],
            None => crate::logspace::LOG_ZERO,
        }
    }
    pub(crate) fn initial_sampler(&self) -> &WeightedIndex<f64> {
        &self.initial_sampler
    }
    pub(crate) fn transition_sampler(&self, from: usize) -> &WeightedIndex<f64> {
        &self.transition_samplers[from]
    }
    pub(crate) fn emission_samplers(&self) -> Option<&[WeightedIndex<f64>]> {
        self.emission.as_ref().map(|e| e.samplers.as_slice())
    }
}

impl std::fmt::Display for ProbabilityModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n = self.n_states();
        writeln!(f, "States:{}", self.states.labels().join("\t"))?;
        let init: Vec<_> = self.initial.iter().map(|x| format!("{:.3}", x)).collect();
        writeln!(f, "Initial:{}", init.join("\t"))?;
        writeln!(f, "Transition:")?;
        for row in self.transition.chunks_exact(n) {
            let probs: Vec<_> = row.iter().map(|x| format!("{:.3}", x)).collect();
            writeln!(f, "{}", probs.join("\t"))?;
        }
        if let Some(e) = self.emission.as_ref() {
            writeln!(f, "Symbols:{}", e.symbols.labels().join("\t"))?;
            write!(f, "Emission:")?;
            for row in e.probs.chunks_exact(e.symbols.len()) {
                let probs: Vec<_> = row.iter().map(|x| format!("{:.3}", x)).collect();
                write!(f, "\n{}", probs.join("\t"))?;
            }
        }
        Ok(())
    }
}
