//! Forest parameter grids.

use crate::domain::{ForestParams, GridKind};

/// Axis values for each forest hyperparameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl ParamGrid {
    /// The full production grid (108 candidates).
    pub fn full() -> Self {
        Self {
            n_estimators: vec![100, 200, 300],
            max_depth: vec![Some(10), Some(15), Some(20), None],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
        }
    }

    /// A small grid for smoke runs and tests.
    pub fn quick() -> Self {
        Self {
            n_estimators: vec![50],
            max_depth: vec![Some(5), None],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1, 4],
        }
    }

    pub fn for_kind(kind: GridKind) -> Self {
        match kind {
            GridKind::Full => Self::full(),
            GridKind::Quick => Self::quick(),
        }
    }

    /// Cartesian product; the last axis varies fastest.
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        out.push(ForestParams {
                            n_estimators,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_grid_has_expected_size() {
        let grid = ParamGrid::full();
        assert_eq!(grid.len(), 108);
        assert_eq!(grid.candidates().len(), 108);
    }

    #[test]
    fn last_axis_varies_fastest() {
        let c = ParamGrid::quick().candidates();
        assert_eq!(c.len(), 4);
        assert_eq!(c[0].min_samples_leaf, 1);
        assert_eq!(c[1].min_samples_leaf, 4);
        assert_eq!(c[0].max_depth, Some(5));
        assert_eq!(c[2].max_depth, None);
    }
}
