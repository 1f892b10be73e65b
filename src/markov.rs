//! Likelihood of a sequence of states under a first-order Markov chain.
//! There are no emissions here: the sequence *is* the state path.
use crate::error::InputError;
use crate::model::ProbabilityModel;
use rayon::prelude::*;

/// Scores state sequences against a borrowed model.
#[derive(Debug, Clone, Copy)]
pub struct MarkovScorer<'a> {
    model: &'a ProbabilityModel,
}

impl<'a> MarkovScorer<'a> {
    pub fn new(model: &'a ProbabilityModel) -> Self {
        Self { model }
    }
    pub fn model(&self) -> &'a ProbabilityModel {
        self.model
    }
    /// log Pr{labels}. Each label is translated through the state alphabet.
    pub fn log_likelihood<S: AsRef<str>>(&self, labels: &[S]) -> Result<f64, InputError> {
        if labels.is_empty() {
            return Err(InputError::EmptySequence);
        }
        let states = self.model.states().encode(labels)?;
        Ok(self.log_likelihood_inner(&states))
    }
    /// Same as `log_likelihood`, one label per character.
    pub fn log_likelihood_str(&self, seq: &str) -> Result<f64, InputError> {
        if seq.is_empty() {
            return Err(InputError::EmptySequence);
        }
        let states = self.model.states().encode_chars(seq)?;
        Ok(self.log_likelihood_inner(&states))
    }
    /// log Pr{states} for already-encoded state indices.
    pub fn log_likelihood_indices(&self, states: &[usize]) -> Result<f64, InputError> {
        if states.is_empty() {
            return Err(InputError::EmptySequence);
        }
        let n_states = self.model.n_states();
        if let Some((position, &index)) = states.iter().enumerate().find(|(_, &s)| n_states <= s)
        {
            return Err(InputError::InvalidState {
                position,
                index,
                n_states,
            });
        }
        Ok(self.log_likelihood_inner(states))
    }
    fn log_likelihood_inner(&self, states: &[usize]) -> f64 {
        let init = self.model.log_initial(states[0]);
        let trans: f64 = states
            .windows(2)
            .map(|w| self.model.log_transition(w[0], w[1]))
            .sum();
        init + trans
    }
    /// Score many sequences in parallel. The i-th result corresponds to the i-th input.
    pub fn log_likelihood_batch<T: AsRef<str> + Sync>(&self, seqs: &[T]) -> Vec<Result<f64, InputError>> {
        seqs.par_iter()
            .map(|seq| self.log_likelihood_str(seq.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logspace::LOG_ZERO;
    use crate::model::uniform_initial;
    fn weather() -> ProbabilityModel {
        ProbabilityModel::markov_chain(
            &["S", "R", "C"],
            &[0.5, 0.3, 0.2],
            &[
                vec![0.7, 0.1, 0.2],
                vec![0.3, 0.4, 0.3],
                vec![0.0, 0.5, 0.5],
            ],
        )
        .unwrap()
    }
    #[test]
    fn single_label_is_initial() {
        let model = weather();
        let scorer = MarkovScorer::new(&model);
        for (i, label) in ["S", "R", "C"].iter().enumerate() {
            let lk = scorer.log_likelihood(&[label]).unwrap();
            assert_eq!(lk, model.log_initial(i));
        }
    }
    #[test]
    fn chain_sum() {
        let model = weather();
        let scorer = MarkovScorer::new(&model);
        let lk = scorer.log_likelihood_str("SSRC").unwrap();
        let answer = 0.5f64.ln() + 0.7f64.ln() + 0.1f64.ln() + 0.3f64.ln();
        assert!((lk - answer).abs() < 1e-12, "{},{}", lk, answer);
        let lk2 = scorer.log_likelihood(&["S", "S", "R", "C"]).unwrap();
        assert_eq!(lk, lk2);
        let lk3 = scorer.log_likelihood_indices(&[0, 0, 1, 2]).unwrap();
        assert_eq!(lk, lk3);
    }
    #[test]
    fn zero_transition() {
        let model = weather();
        let scorer = MarkovScorer::new(&model);
        assert_eq!(scorer.log_likelihood_str("CS").unwrap(), LOG_ZERO);
    }
    #[test]
    fn errors() {
        let model = weather();
        let scorer = MarkovScorer::new(&model);
        assert_eq!(
            scorer.log_likelihood::<&str>(&[]).unwrap_err(),
            InputError::EmptySequence
        );
        assert_eq!(
            scorer.log_likelihood_str("").unwrap_err(),
            InputError::EmptySequence
        );
        assert_eq!(
            scorer.log_likelihood_str("SXR").unwrap_err(),
            InputError::UnknownLabel {
                position: 1,
                label: "X".to_string()
            }
        );
        assert_eq!(
            scorer.log_likelihood_indices(&[0, 3]).unwrap_err(),
            InputError::InvalidState {
                position: 1,
                index: 3,
                n_states: 3
            }
        );
        // The model is still usable.
        assert!(scorer.log_likelihood_str("SR").is_ok());
    }
    #[test]
    fn protein_chain() {
        let aa = "ARNDCQEGHILKMFPSTWYV";
        let states: Vec<String> = aa.chars().map(|c| c.to_string()).collect();
        let n = states.len();
        let transition: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let mut row = vec![0.5 / (n - 1) as f64; n];
                row[i] = 0.5;
                row
            })
            .collect();
        let model = ProbabilityModel::markov_chain(&states, &uniform_initial(n), &transition).unwrap();
        let scorer = MarkovScorer::new(&model);
        let lk = scorer.log_likelihood_str("MAFIKEESED").unwrap();
        let other = (0.5 / 19f64).ln();
        // One self transition: E -> E.
        let answer = (20f64).recip().ln() + 8f64 * other + 0.5f64.ln();
        assert!((lk - answer).abs() < 1e-9, "{},{}", lk, answer);
    }
    #[test]
    fn batch() {
        let model = weather();
        let scorer = MarkovScorer::new(&model);
        let seqs = vec!["SSR", "", "RRC", "SQ"];
        let lks = scorer.log_likelihood_batch(&seqs);
        assert_eq!(lks.len(), 4);
        assert_eq!(lks[0], scorer.log_likelihood_str("SSR"));
        assert_eq!(lks[1], Err(InputError::EmptySequence));
        assert_eq!(lks[2], scorer.log_likelihood_str("RRC"));
        assert!(lks[3].is_err());
    }
}
