//! Stratified partitioning: hold-out splits and k-fold cross-validation.
//!
//! Both preserve the class ratio of the input labels. Index lists are returned
//! sorted so downstream row selection keeps the original row order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::AppError;

/// Row indices on each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle each class with `seed` and hold out `round(test_size * class_count)`
/// rows per class.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<Split, AppError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::config(format!("Invalid split size: {test_size}.")));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0u8, 1u8] {
        let mut idx: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if idx.len() < 2 {
            return Err(AppError::insufficient_data(format!(
                "Class {class} has {} row(s); need at least 2 to stratify.",
                idx.len()
            )));
        }
        idx.shuffle(&mut rng);
        let n_test = ((idx.len() as f64 * test_size).round() as usize).clamp(1, idx.len() - 1);
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Deterministic stratified k-fold: the i-th row of each class goes to fold
/// `i % k`. Each returned split uses one fold as `test`.
pub fn stratified_kfold(labels: &[u8], k: usize) -> Result<Vec<Split>, AppError> {
    if k < 2 {
        return Err(AppError::config("Cross-validation needs at least 2 folds."));
    }

    let mut fold_of = vec![0usize; labels.len()];
    for class in [0u8, 1u8] {
        let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if members.len() < k {
            return Err(AppError::insufficient_data(format!(
                "Class {class} has {} row(s); need at least {k} for {k}-fold CV.",
                members.len()
            )));
        }
        for (pos, &row) in members.iter().enumerate() {
            fold_of[row] = pos % k;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            Split { train, test }
        })
        .collect())
}

/// Pick `indices` out of `items`, cloning in index order.
pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_neg: usize, n_pos: usize) -> Vec<u8> {
        let mut y = vec![0u8; n_neg];
        y.extend(vec![1u8; n_pos]);
        y
    }

    #[test]
    fn split_preserves_class_ratio() {
        let y = labels(60, 40);
        let split = stratified_split(&y, 0.2, 1).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let test_pos = split.test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(test_pos, 8);
    }

    #[test]
    fn split_is_disjoint_and_covers_all_rows() {
        let y = labels(33, 17);
        let split = stratified_split(&y, 0.25, 9).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn split_depends_on_seed_only() {
        let y = labels(30, 30);
        assert_eq!(
            stratified_split(&y, 0.2, 5).unwrap(),
            stratified_split(&y, 0.2, 5).unwrap()
        );
    }

    #[test]
    fn split_rejects_single_class() {
        let y = labels(10, 1);
        assert_eq!(stratified_split(&y, 0.2, 1).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn kfold_folds_are_stratified_and_disjoint() {
        let y = labels(50, 25);
        let folds = stratified_kfold(&y, 5).unwrap();
        assert_eq!(folds.len(), 5);
        for split in &folds {
            assert_eq!(split.test.len(), 15);
            assert_eq!(split.test.iter().filter(|&&i| y[i] == 1).count(), 5);
            assert!(split.test.iter().all(|i| !split.train.contains(i)));
        }
    }
}
