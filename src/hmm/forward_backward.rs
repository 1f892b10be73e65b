//! Forward, backward, and posterior probabilities.
//! Both recursions keep one value per state and time step; the total likelihood
//! is taken once from the last column of the forward table.
use super::HmmEngine;
use crate::dptable::DPTable;
use crate::error::InputError;
use crate::logspace::{argmax, logsumexp, logsumexp_iter, LOG_ZERO};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of the forward-backward algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardBackward {
    /// log Pr{o_0..o_t, s_t = i}.
    pub alpha: DPTable,
    /// log Pr{o_(t+1)..o_(T-1) | s_t = i}.
    pub beta: DPTable,
    /// log Pr{o_0..o_(T-1)}.
    pub log_likelihood: f64,
    /// Pr{s_t = i | o_0..o_(T-1)}, in probability space. Each column sums to 1.
    pub posterior: DPTable,
}

impl ForwardBackward {
    /// The most probable state at each step, with its posterior probability.
    /// Ties go to the lowest state index.
    pub fn decode(&self) -> Vec<(usize, f64)> {
        self.posterior
            .columns()
            .map(|column| argmax(column.iter().copied()))
            .collect()
    }
}

impl<'a> HmmEngine<'a> {
    /// Forward algorithm. Return the forward table and the total log-likelihood.
    /// If the observations are impossible under the model, the likelihood is `LOG_ZERO`.
    pub fn forward(&self, observations: &[usize]) -> Result<(DPTable, f64), InputError> {
        self.validate_observations(observations)?;
        let alpha = self.forward_inner(observations);
        let lk = logsumexp(alpha.column(observations.len() - 1));
        Ok((alpha, lk))
    }
    /// Backward algorithm. Return the backward table.
    pub fn backward(&self, observations: &[usize]) -> Result<DPTable, InputError> {
        self.validate_observations(observations)?;
        Ok(self.backward_inner(observations))
    }
    /// log Pr{observations}.
    pub fn log_likelihood(&self, observations: &[usize]) -> Result<f64, InputError> {
        self.forward(observations).map(|x| x.1)
    }
    /// Forward, backward, and the posterior probability of each state at each step.
    /// It fails with `ZeroLikelihood` when the observations can not be generated,
    /// because the posterior is undefined then.
    pub fn forward_backward(&self, observations: &[usize]) -> Result<ForwardBackward, InputError> {
        self.validate_observations(observations)?;
        let alpha = self.forward_inner(observations);
        let log_likelihood = logsumexp(alpha.column(observations.len() - 1));
        if log_likelihood == LOG_ZERO {
            return Err(InputError::ZeroLikelihood);
        }
        let beta = self.backward_inner(observations);
        let (n, len) = (self.n_states(), observations.len());
        let mut posterior = DPTable::new(n, len, 0f64);
        for t in 0..len {
            for i in 0..n {
                posterior[(i, t)] = (alpha[(i, t)] + beta[(i, t)] - log_likelihood).exp();
            }
        }
        debug!("FB\t{}\t{:.3}", len, log_likelihood);
        Ok(ForwardBackward {
            alpha,
            beta,
            log_likelihood,
            posterior,
        })
    }
    /// Posterior decoding: the most probable state at each step, with its probability.
    pub fn posterior_decode(&self, observations: &[usize]) -> Result<Vec<(usize, f64)>, InputError> {
        self.forward_backward(observations).map(|fb| fb.decode())
    }
    /// Same as `forward_backward`, on labels of the emission alphabet.
    pub fn forward_backward_labels<S: AsRef<str>>(
        &self,
        labels: &[S],
    ) -> Result<ForwardBackward, InputError> {
        let observations = self.encode_observations(labels)?;
        self.forward_backward(&observations)
    }
    /// Log-likelihoods of many independent sequences, in parallel.
    pub fn log_likelihood_batch<T: AsRef<[usize]> + Sync>(
        &self,
        sequences: &[T],
    ) -> Vec<Result<f64, InputError>> {
        sequences
            .par_iter()
            .map(|obs| self.log_likelihood(obs.as_ref()))
            .collect()
    }
    fn forward_inner(&self, observations: &[usize]) -> DPTable {
        let model = self.model;
        let n = self.n_states();
        let mut alpha = DPTable::new(n, observations.len(), LOG_ZERO);
        for i in 0..n {
            alpha[(i, 0)] = model.log_initial(i) + model.log_emission(i, observations[0]);
        }
        for (t, &obs) in observations.iter().enumerate().skip(1) {
            for i in 0..n {
                let prev = alpha.column(t - 1);
                let lk = logsumexp_iter((0..n).map(|k| prev[k] + model.log_transition(k, i)));
                alpha[(i, t)] = lk + model.log_emission(i, obs);
            }
        }
        alpha
    }
    fn backward_inner(&self, observations: &[usize]) -> DPTable {
        let model = self.model;
        let n = self.n_states();
        let len = observations.len();
        let mut beta = DPTable::new(n, len, LOG_ZERO);
        beta.column_mut(len - 1).iter_mut().for_each(|x| *x = 0f64);
        for t in (0..len - 1).rev() {
            let obs = observations[t + 1];
            for i in 0..n {
                let next = beta.column(t + 1);
                let row = model.log_transition_row(i);
                let lk = logsumexp_iter(
                    (0..n).map(|k| row[k] + model.log_emission(k, obs) + next[k]),
                );
                beta[(i, t)] = lk;
            }
        }
        beta
    }
}
