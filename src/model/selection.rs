//! Candidate evaluation, cross-validation and grid search
//!
//! Candidates are compared by ROC-AUC on the held-out split. Grid points are
//! scored by mean stratified k-fold ROC-AUC on the training split, evaluated
//! in parallel and collected in grid order, so the first best point wins on
//! ties regardless of thread scheduling.

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::Serialize;

use super::boosting::{GradientBoosting, GradientBoostingParams};
use super::forest::{RandomForest, RandomForestParams};
use super::logistic::LogisticRegression;
use super::metrics::{
    mean_std, roc_auc, roc_curve, ClassificationReport, ConfusionMatrix, RocCurve,
};
use super::{Classifier, ModelError};
use crate::pipeline::split::{Split, StratifiedKFold};

/// A fitted candidate and its held-out performance
#[derive(Debug, Clone)]
pub struct ModelResult {
    pub name: String,
    pub classifier: Classifier,
    pub auc: f64,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub roc: RocCurve,
    /// Test-split probabilities in test-row order
    pub proba: Vec<f64>,
}

/// Fit `classifier` on the training data and score it on the test data
pub fn fit_and_evaluate(
    name: impl Into<String>,
    mut classifier: Classifier,
    x_train: &Array2<f64>,
    y_train: &[f64],
    x_test: &Array2<f64>,
    y_test: &[f64],
) -> Result<ModelResult, ModelError> {
    classifier.fit(x_train, y_train)?;
    evaluate(name, classifier, x_test, y_test)
}

/// Score an already fitted classifier on held-out data
pub fn evaluate(
    name: impl Into<String>,
    classifier: Classifier,
    x_test: &Array2<f64>,
    y_test: &[f64],
) -> Result<ModelResult, ModelError> {
    let proba = classifier.predict_proba(x_test)?;
    let y_pred: Vec<f64> = proba
        .iter()
        .map(|&p| if p >= 0.5 { 1.0 } else { 0.0 })
        .collect();
    let confusion = ConfusionMatrix::from_predictions(y_test, &y_pred);

    Ok(ModelResult {
        name: name.into(),
        auc: roc_auc(y_test, &proba),
        report: ClassificationReport::from_confusion(&confusion),
        roc: roc_curve(y_test, &proba),
        confusion,
        classifier,
        proba,
    })
}

/// Index of the highest-AUC result; the earliest wins ties
pub fn best_index(results: &[ModelResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        match best {
            Some(b) if results[b].auc >= r.auc || r.auc.is_nan() => {}
            _ => best = Some(i),
        }
    }
    best
}

fn take_rows(x: &Array2<f64>, y: &[f64], rows: &[usize]) -> (Array2<f64>, Vec<f64>) {
    (x.select(Axis(0), rows), rows.iter().map(|&i| y[i]).collect())
}

/// ROC-AUC of `template` refitted on each fold
pub fn cross_val_auc(
    template: &Classifier,
    x: &Array2<f64>,
    y: &[f64],
    folds: &[Split],
) -> Result<Vec<f64>, ModelError> {
    folds
        .iter()
        .map(|fold| {
            let (x_train, y_train) = take_rows(x, y, &fold.train);
            let (x_test, y_test) = take_rows(x, y, &fold.test);
            let mut model = template.clone();
            model.fit(&x_train, &y_train)?;
            Ok(roc_auc(&y_test, &model.predict_proba(&x_test)?))
        })
        .collect()
}

/// Mean CV score of one grid point
#[derive(Debug, Clone, Serialize)]
pub struct GridPoint {
    pub params: String,
    pub mean_auc: f64,
    pub std_auc: f64,
}

/// Outcome of a grid search; `best` is unfitted
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best: Classifier,
    pub best_score: f64,
    pub points: Vec<GridPoint>,
}

/// Score every candidate by mean k-fold ROC-AUC and return the best
pub fn grid_search(
    candidates: Vec<Classifier>,
    x: &Array2<f64>,
    y: &[f64],
    cv: &StratifiedKFold,
) -> anyhow::Result<GridSearchResult> {
    if candidates.is_empty() {
        anyhow::bail!("Grid search needs at least one candidate");
    }
    let folds = cv.split(y)?;

    let scored: Vec<(f64, f64)> = candidates
        .par_iter()
        .map(|candidate| {
            let scores = cross_val_auc(candidate, x, y, &folds)?;
            Ok(mean_std(&scores))
        })
        .collect::<Result<_, ModelError>>()?;

    let mut best = 0;
    for (i, (mean, _)) in scored.iter().enumerate() {
        if *mean > scored[best].0 {
            best = i;
        }
    }

    let points = candidates
        .iter()
        .zip(scored.iter())
        .map(|(c, &(mean_auc, std_auc))| GridPoint {
            params: c.describe_params(),
            mean_auc,
            std_auc,
        })
        .collect();

    Ok(GridSearchResult {
        best_score: scored[best].0,
        best: candidates[best].clone(),
        points,
    })
}

/// Random forest grid: n_estimators x max_depth x min_samples_split
pub fn random_forest_grid(seed: u64) -> Vec<Classifier> {
    let mut grid = Vec::new();
    for n_estimators in [100, 200] {
        for max_depth in [None, Some(10), Some(20)] {
            for min_samples_split in [2, 5, 10] {
                grid.push(Classifier::RandomForest(RandomForest::new(RandomForestParams {
                    n_estimators,
                    max_depth,
                    min_samples_split,
                    seed,
                    ..RandomForestParams::default()
                })));
            }
        }
    }
    grid
}

/// Gradient boosting grid: n_estimators x learning_rate x max_depth
pub fn gradient_boosting_grid(max_depths: &[usize], seed: u64) -> Vec<Classifier> {
    let mut grid = Vec::new();
    for n_estimators in [100, 200] {
        for learning_rate in [0.05, 0.1] {
            for &max_depth in max_depths {
                grid.push(Classifier::GradientBoosting(GradientBoosting::new(
                    GradientBoostingParams {
                        n_estimators,
                        learning_rate,
                        max_depth,
                        seed,
                        ..GradientBoostingParams::default()
                    },
                )));
            }
        }
    }
    grid
}

/// Depths searched when tuning gradient boosting for attrition
pub const ATTRITION_GB_DEPTHS: [usize; 3] = [3, 5, 7];

/// Depths searched for the retention model
pub const RETENTION_GB_DEPTHS: [usize; 3] = [3, 4, 5];

/// Untuned candidates compared for attrition, in comparison order
pub fn attrition_candidates(seed: u64) -> Vec<Classifier> {
    vec![
        Classifier::LogisticRegression(LogisticRegression::new()),
        Classifier::RandomForest(RandomForest::new(RandomForestParams {
            seed,
            ..RandomForestParams::default()
        })),
        Classifier::GradientBoosting(GradientBoosting::new(GradientBoostingParams {
            seed,
            ..GradientBoostingParams::default()
        })),
    ]
}

/// Tuning grid for a winning candidate; logistic regression is not tuned
pub fn tuning_grid(winner: &Classifier, seed: u64) -> Option<Vec<Classifier>> {
    match winner {
        Classifier::LogisticRegression(_) => None,
        Classifier::RandomForest(_) => Some(random_forest_grid(seed)),
        Classifier::GradientBoosting(_) => {
            Some(gradient_boosting_grid(&ATTRITION_GB_DEPTHS, seed))
        }
    }
}

/// Cross-validation summary of one model
#[derive(Debug, Clone, Serialize)]
pub struct CvSummary {
    pub model: String,
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

/// Full record of the attrition model selection
#[derive(Debug, Clone)]
pub struct Selection {
    pub results: Vec<ModelResult>,
    pub best: usize,
    pub cv: Option<CvSummary>,
    pub grid: Option<GridSearchResult>,
}

impl Selection {
    pub fn best_result(&self) -> &ModelResult {
        &self.results[self.best]
    }
}

/// Compare the candidates, cross-validate and tune the winner, then pick
/// the highest-AUC entry overall
///
/// `cv` drives the winner's CV report; the grid search deals its folds
/// unshuffled.
pub fn select_attrition_model(
    x_train: &Array2<f64>,
    y_train: &[f64],
    x_test: &Array2<f64>,
    y_test: &[f64],
    cv: &StratifiedKFold,
    seed: u64,
) -> anyhow::Result<Selection> {
    let mut results = attrition_candidates(seed)
        .into_iter()
        .map(|c| {
            let name = c.name();
            fit_and_evaluate(name, c, x_train, y_train, x_test, y_test)
        })
        .collect::<Result<Vec<_>, ModelError>>()?;

    let winner = best_index(&results)
        .ok_or_else(|| anyhow::anyhow!("No candidate models were evaluated"))?;

    let folds = cv.split(y_train)?;
    let scores = cross_val_auc(&results[winner].classifier, x_train, y_train, &folds)?;
    let (mean, std) = mean_std(&scores);
    let cv_summary = CvSummary {
        model: results[winner].name.clone(),
        scores,
        mean,
        std,
    };

    let mut grid = None;
    if let Some(candidates) = tuning_grid(&results[winner].classifier, seed) {
        let search = grid_search(candidates, x_train, y_train, &cv.unshuffled())?;
        let tuned_name = format!("{} (Tuned)", results[winner].name);
        let tuned = fit_and_evaluate(
            tuned_name,
            search.best.clone(),
            x_train,
            y_train,
            x_test,
            y_test,
        )?;
        results.push(tuned);
        grid = Some(search);
    }

    let best = best_index(&results)
        .ok_or_else(|| anyhow::anyhow!("No candidate models were evaluated"))?;

    Ok(Selection {
        results,
        best,
        cv: Some(cv_summary),
        grid,
    })
}

/// Grid-search gradient boosting over unshuffled folds for the retention
/// label and evaluate the refitted best point
pub fn select_retention_model(
    x_train: &Array2<f64>,
    y_train: &[f64],
    x_test: &Array2<f64>,
    y_test: &[f64],
    cv: &StratifiedKFold,
    seed: u64,
) -> anyhow::Result<Selection> {
    let search = grid_search(
        gradient_boosting_grid(&RETENTION_GB_DEPTHS, seed),
        x_train,
        y_train,
        &cv.unshuffled(),
    )?;
    let result = fit_and_evaluate(
        "Gradient Boosting",
        search.best.clone(),
        x_train,
        y_train,
        x_test,
        y_test,
    )?;

    Ok(Selection {
        results: vec![result],
        best: 0,
        cv: None,
        grid: Some(search),
    })
}
