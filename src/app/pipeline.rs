//! The training pipeline.
//!
//! load -> split (train / validation / test) -> fit preprocessing on train ->
//! grid search -> evaluate -> bundle
//!
//! `train_on` is the pure part (no file I/O) so it can be exercised with
//! in-memory data; `run_training` adds dataset acquisition and persistence.

use chrono::Utc;
use log::{info, warn};
use nalgebra::DMatrix;

use crate::data::{ensure_dataset, stratified_split, take};
use crate::domain::{DECISION_THRESHOLD, TrainConfig};
use crate::error::AppError;
use crate::features::Preprocessor;
use crate::fit::{ParamGrid, SearchResult, grid_search};
use crate::io::{
    BundleMetadata, EvalMetrics, LabeledData, MetricsReport, ModelBundle, load_dataset, partition_fields,
    save_bundle, write_metrics_json,
};
use crate::math::{ClassificationReport, accuracy, classification_report, f1_score, roc_auc, threshold};
use crate::models::Classifier;

/// All computed outputs of a single training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub n_positive: usize,
    pub n_negative: usize,
    pub n_train: usize,
    pub n_val: usize,
    pub n_test: usize,
    pub search: SearchResult,
    pub validation: EvalMetrics,
    pub test: EvalMetrics,
    pub test_report: ClassificationReport,
    pub bundle: ModelBundle,
}

/// Execute the full training pipeline and persist the bundle.
pub fn run_training(config: &TrainConfig) -> Result<TrainingRun, AppError> {
    config.validate()?;

    if let Some(url) = &config.data_url {
        ensure_dataset(url, &config.data_path)?;
    }

    info!("[1/5] loading data from {}", config.data_path.display());
    let data = load_dataset(&config.data_path)?;
    for e in &data.row_errors {
        warn!("skipped line {}: {}", e.line, e.message);
    }

    let run = train_on(&data, config)?;

    info!("saving bundle to {}", config.output_path.display());
    save_bundle(&config.output_path, &run.bundle)?;

    if let Some(path) = &config.report_path {
        let report = MetricsReport {
            best_params: run.search.best_params,
            cv_roc_auc: run.search.best_score,
            validation: run.validation,
            test: run.test,
            test_report: &run.test_report,
            categorical: &run.bundle.preprocessor.categorical,
            numerical: &run.bundle.preprocessor.numerical,
        };
        write_metrics_json(path, &report)?;
        info!("wrote metrics report to {}", path.display());
    }

    Ok(run)
}

/// Train and evaluate on already-loaded data.
pub fn train_on(data: &LabeledData, config: &TrainConfig) -> Result<TrainingRun, AppError> {
    config.validate()?;
    info!(
        "{} rows ({} positive, {} negative)",
        data.stats.n_rows, data.stats.n_positive, data.stats.n_negative
    );

    let (categorical, numerical) = partition_fields(&data.columns, &data.records);
    info!("categorical features: {categorical:?}");
    info!("numerical features: {numerical:?}");

    info!("[2/5] splitting data");
    let outer = stratified_split(&data.labels, config.test_size, config.seed)?;
    let full_train_labels = take(&data.labels, &outer.train);
    let inner = stratified_split(&full_train_labels, config.val_size, config.seed)?;
    let train_idx: Vec<usize> = inner.train.iter().map(|&i| outer.train[i]).collect();
    let val_idx: Vec<usize> = inner.test.iter().map(|&i| outer.train[i]).collect();
    let test_idx = outer.test;
    info!(
        "train={} validation={} test={}",
        train_idx.len(),
        val_idx.len(),
        test_idx.len()
    );

    info!("[3/5] encoding and scaling features");
    let train_records = take(&data.records, &train_idx);
    let preprocessor = Preprocessor::fit(&train_records, categorical, numerical)?;
    let x_train = preprocessor.transform(&train_records)?;
    let x_val = preprocessor.transform(&take(&data.records, &val_idx))?;
    let x_test = preprocessor.transform(&take(&data.records, &test_idx))?;
    let y_train = take(&data.labels, &train_idx);
    let y_val = take(&data.labels, &val_idx);
    let y_test = take(&data.labels, &test_idx);
    info!("final feature width: {}", preprocessor.n_features());

    info!("[4/5] grid search");
    let grid = ParamGrid::for_kind(config.grid);
    let search = grid_search(&x_train, &y_train, &grid, config.folds, config.seed)?;
    info!(
        "best parameters: {} (CV ROC-AUC {:.4})",
        search.best_params, search.best_score
    );

    info!("[5/5] evaluating");
    let (validation, _) = evaluate(&search.best_model, &x_val, &y_val)?;
    let (test, test_report) = evaluate(&search.best_model, &x_test, &y_test)?;

    let metadata = BundleMetadata {
        trained_at: Utc::now(),
        seed: config.seed,
        best_params: search.best_params,
        cv_roc_auc: search.best_score,
        validation,
        test,
    };
    let bundle = ModelBundle::new(preprocessor, search.best_model.clone(), Some(metadata));
    bundle.validate()?;

    Ok(TrainingRun {
        rows_read: data.rows_read,
        rows_skipped: data.row_errors.len(),
        n_positive: data.stats.n_positive,
        n_negative: data.stats.n_negative,
        n_train: train_idx.len(),
        n_val: val_idx.len(),
        n_test: test_idx.len(),
        search,
        validation,
        test,
        test_report,
        bundle,
    })
}

/// Headline metrics plus the full report for one partition.
pub fn evaluate<C: Classifier>(
    model: &C,
    x: &DMatrix<f64>,
    y: &[u8],
) -> Result<(EvalMetrics, ClassificationReport), AppError> {
    let proba = model.predict_proba(x);
    let pred = threshold(&proba, DECISION_THRESHOLD);
    let auc = roc_auc(y, &proba)
        .ok_or_else(|| AppError::insufficient_data("Evaluation partition contains a single class."))?;
    let metrics = EvalMetrics {
        accuracy: accuracy(y, &pred),
        f1: f1_score(y, &pred),
        roc_auc: auc,
    };
    Ok((metrics, classification_report(y, &pred)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BinaryPolicy, GridKind};
    use crate::io::read_dataset;
    use crate::predict::Predictor;
    use std::path::PathBuf;

    /// Seeded synthetic dataset where age, angina and slope drive the label.
    fn synthetic_csv(n: usize) -> String {
        let mut out = String::from(
            "Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease\n",
        );
        let pains = ["ASY", "NAP", "ATA", "TA"];
        let ecgs = ["Normal", "ST", "LVH"];
        for i in 0..n {
            let sick = i % 5 < 2;
            let age = if sick { 55 + i % 15 } else { 35 + i % 15 };
            let sex = if i % 2 == 0 { "M" } else { "F" };
            let pain = if sick { "ASY" } else { pains[1 + i % 3] };
            let angina = if sick { "Y" } else { "N" };
            let slope = if sick { "Flat" } else { "Up" };
            let oldpeak = if sick { 1.5 + (i % 4) as f64 * 0.5 } else { (i % 3) as f64 * 0.2 };
            out.push_str(&format!(
                "{age},{sex},{pain},{},{},{},{},{},{angina},{oldpeak},{slope},{}\n",
                120 + i % 40,
                180 + i % 120,
                i % 2,
                ecgs[i % 3],
                if sick { 110 + i % 20 } else { 150 + i % 30 },
                u8::from(sick),
            ));
        }
        out
    }

    fn config() -> TrainConfig {
        TrainConfig {
            data_path: PathBuf::from("unused.csv"),
            data_url: None,
            output_path: PathBuf::from("unused.json"),
            report_path: None,
            seed: 1,
            test_size: 0.2,
            val_size: 0.25,
            folds: 5,
            grid: GridKind::Quick,
        }
    }

    #[test]
    fn partitions_are_roughly_60_20_20() {
        let data = read_dataset(synthetic_csv(200).as_bytes()).unwrap();
        let run = train_on(&data, &config()).unwrap();
        assert_eq!(run.n_train + run.n_val + run.n_test, 200);
        assert_eq!(run.n_test, 40);
        assert_eq!(run.n_val, 40);
        assert_eq!(run.n_train, 120);
    }

    #[test]
    fn separable_data_trains_a_strong_model() {
        let data = read_dataset(synthetic_csv(200).as_bytes()).unwrap();
        let run = train_on(&data, &config()).unwrap();
        assert!(run.search.best_score > 0.95);
        assert!(run.test.roc_auc > 0.95);
        assert!(run.test.accuracy > 0.9);
        assert_eq!(run.search.scores.len(), ParamGrid::quick().len());
        assert_eq!(
            run.bundle.preprocessor.categorical,
            vec!["ChestPainType", "RestingECG", "ST_Slope"]
        );
    }

    #[test]
    fn trained_bundle_serves_consistent_predictions() {
        let data = read_dataset(synthetic_csv(150).as_bytes()).unwrap();
        let run = train_on(&data, &config()).unwrap();
        let predictor = Predictor::new(run.bundle, BinaryPolicy::Strict);

        let patient = serde_json::json!({
            "Age": 65, "Sex": "M", "ChestPainType": "ASY", "RestingBP": 160,
            "Cholesterol": 350, "FastingBS": 1, "RestingECG": "ST", "MaxHR": 110,
            "ExerciseAngina": "Y", "Oldpeak": 3.5, "ST_Slope": "Flat"
        });
        let result = predictor.predict(&patient).unwrap();
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(result.heart_disease, result.probability >= 0.5);
        assert_eq!(
            result.risk_level,
            crate::domain::RiskLevel::from_probability(result.probability)
        );
    }

    #[test]
    fn run_training_writes_a_loadable_bundle() {
        let dir = std::env::temp_dir().join(format!("heart-risk-train-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let data_path = dir.join("heart.csv");
        std::fs::write(&data_path, synthetic_csv(120)).unwrap();

        let mut cfg = config();
        cfg.data_path = data_path;
        cfg.output_path = dir.join("model.json");
        cfg.report_path = Some(dir.join("metrics.json"));

        let run = run_training(&cfg).unwrap();
        let loaded = crate::io::load_bundle(&cfg.output_path).unwrap();
        assert_eq!(loaded.model, run.bundle.model);
        assert!(dir.join("metrics.json").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
