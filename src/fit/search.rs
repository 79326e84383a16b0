//! Cross-validated grid search over forest parameters.
//!
//! Every candidate is scored with the same stratified folds and the same seed,
//! so scores are comparable and the search is reproducible.

use log::{debug, info, warn};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::data::stratified_kfold;
use crate::domain::ForestParams;
use crate::error::AppError;
use crate::fit::grid::ParamGrid;
use crate::math::roc_auc;
use crate::models::{Classifier, RandomForest};

/// Cross-validation outcome for one grid point.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub idx: usize,
    pub params: ForestParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Output of the search: the refit best model plus all candidate scores.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    pub best_model: RandomForest,
    pub scores: Vec<CandidateScore>,
}

pub fn grid_search(
    x: &DMatrix<f64>,
    y: &[u8],
    grid: &ParamGrid,
    folds: usize,
    seed: u64,
) -> Result<SearchResult, AppError> {
    if grid.is_empty() {
        return Err(AppError::config("Parameter grid is empty."));
    }
    if x.nrows() != y.len() {
        return Err(AppError::model("Feature rows and labels differ in length."));
    }

    let splits = stratified_kfold(y, folds)?;
    let fold_data: Vec<_> = splits
        .iter()
        .map(|s| {
            (
                x.select_rows(s.train.iter()),
                s.train.iter().map(|&i| y[i]).collect::<Vec<u8>>(),
                x.select_rows(s.test.iter()),
                s.test.iter().map(|&i| y[i]).collect::<Vec<u8>>(),
            )
        })
        .collect();

    let candidates = grid.candidates();
    info!(
        "fitting {folds} folds for each of {} candidates, totalling {} fits",
        candidates.len(),
        folds * candidates.len()
    );

    // Evaluate each candidate independently (parallel).
    let mut scores: Vec<CandidateScore> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &params)| {
            let mut fold_scores = Vec::with_capacity(fold_data.len());
            for (x_tr, y_tr, x_te, y_te) in &fold_data {
                let model = match RandomForest::fit(x_tr, y_tr, params, seed) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("candidate {idx} ({params}) dropped: {e}");
                        return None;
                    }
                };
                let Some(auc) = roc_auc(y_te, &model.predict_proba(x_te)) else {
                    warn!("candidate {idx} ({params}) dropped: fold holds a single class");
                    return None;
                };
                fold_scores.push(auc);
            }
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!("candidate {idx} ({params}): mean ROC-AUC {mean_score:.4}");
            Some(CandidateScore {
                idx,
                params,
                fold_scores,
                mean_score,
            })
        })
        .collect();

    if scores.is_empty() {
        return Err(AppError::model("No grid candidate could be scored."));
    }
    scores.sort_by_key(|s| s.idx);

    // Deterministic selection: highest mean score; ties go to the earlier grid index.
    let mut best = &scores[0];
    for s in &scores[1..] {
        if s.mean_score > best.mean_score {
            best = s;
        }
    }
    let best_params = best.params;
    let best_score = best.mean_score;

    let best_model = RandomForest::fit(x, y, best_params, seed)?;

    Ok(SearchResult {
        best_params,
        best_score,
        best_model,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data(n: usize) -> (DMatrix<f64>, Vec<u8>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let label = u8::from(i % 3 == 0);
            // Signal in column 0, noise in column 1.
            data.push(f64::from(label) * 2.0 + (i % 5) as f64 * 0.3);
            data.push((i * 7 % 11) as f64);
            y.push(label);
        }
        (DMatrix::from_row_slice(n, 2, &data), y)
    }

    fn small_grid() -> ParamGrid {
        ParamGrid {
            n_estimators: vec![10],
            max_depth: vec![Some(1), Some(3)],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
        }
    }

    #[test]
    fn scores_every_candidate_in_grid_order() {
        let (x, y) = toy_data(60);
        let result = grid_search(&x, &y, &small_grid(), 3, 1).unwrap();
        assert_eq!(result.scores.len(), 2);
        assert_eq!(result.scores[0].idx, 0);
        assert_eq!(result.scores[1].fold_scores.len(), 3);
        assert!(result.best_score >= result.scores.iter().map(|s| s.mean_score).fold(0.0, f64::max) - 1e-12);
        assert!(result.best_score > 0.9);
        assert_eq!(result.best_model.params, result.best_params);
    }

    #[test]
    fn search_is_reproducible() {
        let (x, y) = toy_data(45);
        let a = grid_search(&x, &y, &small_grid(), 3, 7).unwrap();
        let b = grid_search(&x, &y, &small_grid(), 3, 7).unwrap();
        assert_eq!(a.best_params, b.best_params);
        assert_eq!(a.best_model, b.best_model);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let (x, y) = toy_data(30);
        let grid = ParamGrid {
            n_estimators: vec![],
            ..small_grid()
        };
        assert_eq!(grid_search(&x, &y, &grid, 3, 1).unwrap_err().exit_code(), 2);
    }
}
