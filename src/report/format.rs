//! Formatted terminal output for a training run.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays free of presentation concerns
//! - output changes are localized

use crate::app::pipeline::TrainingRun;
use crate::io::EvalMetrics;
use crate::math::{AverageMetrics, ClassificationReport};

/// Format the full run summary (dataset stats, features, search, evaluation).
pub fn format_training_summary(run: &TrainingRun) -> String {
    let mut out = String::new();
    let pre = &run.bundle.preprocessor;

    out.push_str("=== heart-risk - Random Forest Training ===\n");
    out.push_str(&format!(
        "Rows: read={} skipped={} | positive={} negative={}\n",
        run.rows_read, run.rows_skipped, run.n_positive, run.n_negative
    ));
    out.push_str(&format!(
        "Split: train={} validation={} test={}\n",
        run.n_train, run.n_val, run.n_test
    ));
    out.push_str(&format!("Categorical: {}\n", pre.categorical.join(", ")));
    out.push_str(&format!("Numerical  : {}\n", pre.numerical.join(", ")));
    out.push_str(&format!("Feature width: {}\n", pre.n_features()));

    out.push_str("\nGrid search:\n");
    out.push_str(&format!("- candidates: {}\n", run.search.scores.len()));
    out.push_str(&format!("- best params: {}\n", run.search.best_params));
    out.push_str(&format!("- best CV ROC-AUC: {:.4}\n", run.search.best_score));

    out.push_str("\nValidation:\n");
    out.push_str(&format_eval(&run.validation));
    out.push_str("\nTest:\n");
    out.push_str(&format_eval(&run.test));

    out.push_str("\nTest classification report:\n");
    out.push_str(&format_classification_report(&run.test_report));
    out
}

fn format_eval(m: &EvalMetrics) -> String {
    format!(
        "- accuracy: {:.4}\n- f1      : {:.4}\n- ROC-AUC : {:.4}\n",
        m.accuracy, m.f1, m.roc_auc
    )
}

/// Per-class precision / recall / f1 / support table with averages.
pub fn format_classification_report(report: &ClassificationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:>9} {:>9} {:>9} {:>9}\n",
        "", "precision", "recall", "f1-score", "support"
    ));
    out.push('\n');

    for c in &report.classes {
        out.push_str(&format!(
            "{:<14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            c.label, c.precision, c.recall, c.f1, c.support
        ));
    }
    out.push('\n');

    let total = report.weighted_avg.support;
    out.push_str(&format!(
        "{:<14} {:>9} {:>9} {:>9.2} {:>9}\n",
        "accuracy", "", "", report.accuracy, total
    ));
    out.push_str(&avg_row("macro avg", &report.macro_avg));
    out.push_str(&avg_row("weighted avg", &report.weighted_avg));
    out
}

fn avg_row(label: &str, m: &AverageMetrics) -> String {
    format!(
        "{:<14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
        label, m.precision, m.recall, m.f1, m.support
    )
}
