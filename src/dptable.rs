use serde::{Deserialize, Serialize};

/// A (states x length) DP table. `table[(i, t)]` is the value of state `i` at time `t`.
/// Cells of the same time step are contiguous, so a whole column can be borrowed at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DPTable {
    states: usize,
    length: usize,
    data: Vec<f64>,
}

impl DPTable {
    pub fn new(states: usize, length: usize, default: f64) -> Self {
        Self {
            states,
            length,
            data: vec![default; states * length],
        }
    }
    pub fn states(&self) -> usize {
        self.states
    }
    pub fn len(&self) -> usize {
        self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    fn get_index(&self, state: usize, t: usize) -> usize {
        assert!(state < self.states && t < self.length);
        t * self.states + state
    }
    pub fn get(&self, state: usize, t: usize) -> f64 {
        self.data[self.get_index(state, t)]
    }
    pub fn get_mut(&mut self, state: usize, t: usize) -> &mut f64 {
        let index = self.get_index(state, t);
        &mut self.data[index]
    }
    /// All states at time `t`.
    pub fn column(&self, t: usize) -> &[f64] {
        let start = t * self.states;
        &self.data[start..start + self.states]
    }
    pub fn column_mut(&mut self, t: usize) -> &mut [f64] {
        let start = t * self.states;
        &mut self.data[start..start + self.states]
    }
    pub fn columns(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.states.max(1))
    }
}

impl std::ops::Index<(usize, usize)> for DPTable {
    type Output = f64;
    fn index(&self, (state, t): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(state, t)]
    }
}

impl std::ops::IndexMut<(usize, usize)> for DPTable {
    fn index_mut(&mut self, (state, t): (usize, usize)) -> &mut Self::Output {
        self.get_mut(state, t)
    }
}
