use super::HmmEngine;
use crate::dptable::DPTable;
use crate::error::InputError;
use crate::logspace::{argmax, LOG_ZERO};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The most likely hidden path, with the best log-score of the path at each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViterbiPath {
    pub path: Vec<usize>,
    /// `scores[t]` is the best log-score of any path ending in `path[t]` at time `t`.
    pub scores: Vec<f64>,
}

impl ViterbiPath {
    pub fn len(&self) -> usize {
        self.path.len()
    }
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
    /// Joint log probability of the path and the observations.
    pub fn log_probability(&self) -> f64 {
        self.scores.last().copied().unwrap_or(LOG_ZERO)
    }
}

impl<'a> HmmEngine<'a> {
    /// Return the maximum likelihood hidden path.
    /// In the recursion and at the end, ties are broken toward the lowest state index.
    pub fn viterbi(&self, observations: &[usize]) -> Result<ViterbiPath, InputError> {
        self.validate_observations(observations)?;
        let (score, trace) = self.viterbi_table(observations);
        let len = observations.len();
        let n = self.n_states();
        let (mut state, best) = argmax(score.column(len - 1).iter().copied());
        let mut path = vec![0; len];
        path[len - 1] = state;
        for t in (0..len - 1).rev() {
            state = trace[(t + 1) * n + state];
            path[t] = state;
        }
        let scores: Vec<_> = path
            .iter()
            .enumerate()
            .map(|(t, &s)| score.get(s, t))
            .collect();
        trace!("VITERBI\t{}\t{:.3}", len, best);
        Ok(ViterbiPath { path, scores })
    }
    // Fill the score table and the traceback. trace[t * n + i] is the best predecessor of i at t.
    fn viterbi_table(&self, observations: &[usize]) -> (DPTable, Vec<usize>) {
        let model = self.model;
        let n = self.n_states();
        let len = observations.len();
        let mut score = DPTable::new(n, len, LOG_ZERO);
        let mut trace = vec![0; n * len];
        for i in 0..n {
            score[(i, 0)] = model.log_initial(i) + model.log_emission(i, observations[0]);
        }
        for (t, &obs) in observations.iter().enumerate().skip(1) {
            for i in 0..n {
                let (k, max) = argmax((0..n).map(|k| score[(k, t - 1)] + model.log_transition(k, i)));
                score[(i, t)] = max + model.log_emission(i, obs);
                trace[t * n + i] = k;
            }
        }
        (score, trace)
    }
    /// Decode labels of the emission alphabet.
    pub fn viterbi_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<ViterbiPath, InputError> {
        let observations = self.encode_observations(labels)?;
        self.viterbi(&observations)
    }
    /// Decode many independent sequences in parallel.
    pub fn viterbi_batch<T: AsRef<[usize]> + Sync>(
        &self,
        sequences: &[T],
    ) -> Vec<Result<ViterbiPath, InputError>> {
        sequences
            .par_iter()
            .map(|obs| self.viterbi(obs.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{all_paths, gene_model, sparse_model};
    use super::*;
    use crate::model::ProbabilityModel;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    fn brute_force(model: &ProbabilityModel, obs: &[usize]) -> (Vec<usize>, f64) {
        all_paths(model, obs)
            .into_iter()
            .fold((vec![], LOG_ZERO), |best, (path, lk)| {
                if best.1 < lk {
                    (path, lk)
                } else {
                    best
                }
            })
    }
    #[test]
    fn gene_actg() {
        let model = gene_model();
        let engine = HmmEngine::new(&model).unwrap();
        let obs = engine.encode_observations_str("ACTG").unwrap();
        assert_eq!(obs, vec![0, 1, 2, 3]);
        let result = engine.viterbi(&obs).unwrap();
        assert_eq!(result.path.len(), 4);
        assert_eq!(result.scores.len(), 4);
        let (_, best) = brute_force(&model, &obs);
        assert!((result.scores[3] - best).abs() < 1e-10, "{},{}", result.scores[3], best);
        assert_eq!(result.log_probability(), result.scores[3]);
        // The Gene state dominates this short sequence.
        assert_eq!(result.path, vec![0, 0, 0, 0]);
        let by_label = engine.viterbi_labels(&["A", "C", "T", "G"]).unwrap();
        assert_eq!(by_label, result);
    }
    #[test]
    fn scores_follow_path() {
        let model = gene_model();
        let engine = HmmEngine::new(&model).unwrap();
        let obs = vec![1, 3, 1, 3, 0, 2];
        let result = engine.viterbi(&obs).unwrap();
        let (score, _) = engine.viterbi_table(&obs);
        for (t, &s) in result.path.iter().enumerate() {
            assert_eq!(result.scores[t], score.get(s, t));
        }
        // Scores are in chronological order, so they never increase.
        for w in result.scores.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }
    #[test]
    fn matches_brute_force() {
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(3290);
        for model in vec![gene_model(), sparse_model()] {
            let engine = HmmEngine::new(&model).unwrap();
            for len in 1..=4 {
                for _ in 0..10 {
                    let traj = engine.simulate(len, &mut rng);
                    let result = engine.viterbi(&traj.observed).unwrap();
                    let (_, best) = brute_force(&model, &traj.observed);
                    assert!((result.log_probability() - best).abs() < 1e-10);
                    // The decoded path attains the optimum.
                    let lk = all_paths(&model, &traj.observed)
                        .into_iter()
                        .find(|(path, _)| path == &result.path)
                        .map(|x| x.1)
                        .unwrap();
                    assert!((lk - best).abs() < 1e-10);
                }
            }
        }
    }
    #[test]
    fn tie_break_lowest_index() {
        // Two states which are indistinguishable.
        let model = ProbabilityModel::hidden_markov(
            &["a", "b"],
            &["0", "1"],
            &[0.5, 0.5],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
        )
        .unwrap();
        let engine = HmmEngine::new(&model).unwrap();
        let obs = vec![0, 1, 1, 0, 1];
        for _ in 0..10 {
            let result = engine.viterbi(&obs).unwrap();
            assert_eq!(result.path, vec![0; 5]);
        }
        // The tie in the recursion is between the predecessors of state 2.
        let model = ProbabilityModel::hidden_markov(
            &["a", "b", "c"],
            &["0", "1"],
            &[0.5, 0.5, 0.0],
            &[
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0],
            ],
            &[vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        let engine = HmmEngine::new(&model).unwrap();
        let result = engine.viterbi(&[0, 1, 1]).unwrap();
        assert_eq!(result.path, vec![0, 2, 2]);
        assert!((result.log_probability() - 0.5f64.ln()).abs() < 1e-12);
    }
    #[test]
    fn impossible_observations() {
        let model = sparse_model();
        let engine = HmmEngine::new(&model).unwrap();
        // Only y can start and emit `c`.
        let result = engine.viterbi(&[2]).unwrap();
        assert_eq!(result.path, vec![1]);
        // Some predecessors are impossible, which must not poison the table.
        let result = engine.viterbi(&[0, 0, 2]).unwrap();
        assert!(result.scores.iter().all(|x| !x.is_nan()));
    }
    #[test]
    fn errors() {
        let model = gene_model();
        let engine = HmmEngine::new(&model).unwrap();
        assert_eq!(engine.viterbi(&[]), Err(InputError::EmptyObservations));
        assert_eq!(
            engine.viterbi(&[0, 1, 4, 2]),
            Err(InputError::InvalidObservation {
                position: 2,
                symbol: 4,
                n_symbols: 4
            })
        );
        assert!(engine.viterbi_labels(&["A", "N"]).is_err());
        // The model is still usable.
        assert!(engine.viterbi(&[0, 1]).is_ok());
    }
    #[test]
    fn batch() {
        let model = gene_model();
        let engine = HmmEngine::new(&model).unwrap();
        let seqs: Vec<Vec<usize>> = vec![vec![0, 1, 2], vec![], vec![3, 3, 3, 1]];
        let results = engine.viterbi_batch(&seqs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], engine.viterbi(&seqs[0]));
        assert_eq!(results[1], Err(InputError::EmptyObservations));
        assert_eq!(results[2], engine.viterbi(&seqs[2]));
    }
}
