//! Ordered label sets. The position of a label is its index in every matrix of a model.
use crate::error::{InputError, ValidationError};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Alphabet {
    /// Build an alphabet. Labels must be unique.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self, ValidationError> {
        let labels: Vec<String> = labels.iter().map(|x| x.as_ref().to_string()).collect();
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(ValidationError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels, index })
    }
    /// One label per character, e.g. `"ACGT"`.
    pub fn from_chars(chars: &str) -> Result<Self, ValidationError> {
        let labels: Vec<String> = chars.chars().map(|c| c.to_string()).collect();
        Self::new(&labels)
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|x| x.as_str())
    }
    /// Translate labels into indices. An unknown label is an error.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, InputError> {
        labels
            .iter()
            .enumerate()
            .map(|(position, label)| {
                let label = label.as_ref();
                self.index_of(label).ok_or_else(|| InputError::UnknownLabel {
                    position,
                    label: label.to_string(),
                })
            })
            .collect()
    }
    /// Translate a string, one label per character.
    pub fn encode_chars(&self, seq: &str) -> Result<Vec<usize>, InputError> {
        let mut buf = [0u8; 4];
        seq.chars()
            .enumerate()
            .map(|(position, c)| {
                let label: &str = c.encode_utf8(&mut buf);
                self.index_of(label).ok_or_else(|| InputError::UnknownLabel {
                    position,
                    label: label.to_string(),
                })
            })
            .collect()
    }
    /// Translate indices back into labels. Out-of-range indices are rendered as `?`.
    pub fn decode(&self, indices: &[usize]) -> Vec<&str> {
        indices
            .iter()
            .map(|&i| self.label(i).unwrap_or("?"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn index_in_order() {
        let abc = Alphabet::from_chars("ACTG").unwrap();
        assert_eq!(abc.len(), 4);
        assert_eq!(abc.index_of("A"), Some(0));
        assert_eq!(abc.index_of("G"), Some(3));
        assert_eq!(abc.label(2), Some("T"));
        assert_eq!(abc.encode_chars("ACTG").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(abc.decode(&[3, 2, 1, 0]).concat(), "GTCA");
    }
    #[test]
    fn word_labels() {
        let abc = Alphabet::new(&["Gene", "Intergenic"]).unwrap();
        assert_eq!(abc.encode(&["Intergenic", "Gene"]).unwrap(), vec![1, 0]);
    }
    #[test]
    fn duplicate_label() {
        let err = Alphabet::from_chars("ACCT").unwrap_err();
        assert_eq!(err, ValidationError::DuplicateLabel("C".to_string()));
    }
    #[test]
    fn unknown_label() {
        let abc = Alphabet::from_chars("ACGT").unwrap();
        let err = abc.encode_chars("ACNT").unwrap_err();
        assert_eq!(
            err,
            InputError::UnknownLabel {
                position: 2,
                label: "N".to_string()
            }
        );
        assert!(abc.encode(&["A", "X"]).is_err());
    }
}
