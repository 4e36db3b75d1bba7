//! Shapley-value explanations by permutation sampling
//!
//! For each explained row and each sampled permutation, features are switched
//! one at a time from a background row to the explained row and the change in
//! predicted probability is credited to the switched feature. Each background
//! row is paired with exactly one permutation, so for every row the
//! attributions sum to `f(x) - mean(f(background))`.

use ndarray::{Array1, Array2, Axis};
use rand::seq::index;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use super::{check_features, Classifier, ModelError};

/// Sampling budget of an explanation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapConfig {
    /// Rows explained, drawn from the explanation set
    pub n_samples: usize,
    /// Permutations per row; also the number of background rows
    pub n_permutations: usize,
    pub seed: u64,
}

impl Default for ShapConfig {
    fn default() -> Self {
        Self {
            n_samples: 100,
            n_permutations: 50,
            seed: 42,
        }
    }
}

/// Attributions for a sample of rows
#[derive(Debug, Clone)]
pub struct ShapExplanation {
    pub feature_names: Vec<String>,
    /// Explained rows (feature space), one per attribution row
    pub samples: Array2<f64>,
    /// Row indices of `samples` within the explanation set
    pub sample_rows: Vec<usize>,
    /// `n_samples x n_features` attributions
    pub values: Array2<f64>,
    /// Mean predicted probability over the background rows
    pub base_value: f64,
    /// Predicted probability of each explained row
    pub predictions: Vec<f64>,
}

/// One feature's contribution to a single prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: String,
    pub value: f64,
    pub shap: f64,
}

impl ShapExplanation {
    /// Mean |attribution| per feature, largest first
    pub fn mean_abs(&self) -> Vec<(String, f64)> {
        let means = self.values.mapv(f64::abs).mean_axis(Axis(0));
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(means.map_or_else(Vec::new, |m| m.to_vec()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Column indices of the `k` features with the largest mean |attribution|
    pub fn top_feature_indices(&self, k: usize) -> Vec<usize> {
        let ranked = self.mean_abs();
        ranked
            .iter()
            .take(k)
            .filter_map(|(name, _)| self.feature_names.iter().position(|n| n == name))
            .collect()
    }

    /// Position (within the sample) of the highest predicted probability
    pub fn highest_risk_sample(&self) -> Option<usize> {
        self.predictions
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(i, _)| i)
    }

    /// Contributions for one sampled row, largest |attribution| first
    pub fn breakdown(&self, sample: usize) -> Vec<Contribution> {
        let mut contributions: Vec<Contribution> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| Contribution {
                feature: name.clone(),
                value: self.samples[[sample, j]],
                shap: self.values[[sample, j]],
            })
            .collect();
        contributions.sort_by(|a, b| b.shap.abs().total_cmp(&a.shap.abs()));
        contributions
    }
}

/// Sample `n` distinct rows of `0..total` (all of them when `n >= total`),
/// returned in ascending order
fn sample_rows(total: usize, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut rows = if n >= total {
        (0..total).collect()
    } else {
        index::sample(rng, total, n).into_vec()
    };
    rows.sort_unstable();
    rows
}

/// Explain `classifier` on rows of `x_explain` against rows of
/// `x_background`
pub fn explain(
    classifier: &Classifier,
    x_background: &Array2<f64>,
    x_explain: &Array2<f64>,
    feature_names: &[String],
    config: &ShapConfig,
) -> Result<ShapExplanation, ModelError> {
    let n_features = feature_names.len();
    check_features(x_background, n_features)?;
    check_features(x_explain, n_features)?;
    if x_background.nrows() == 0 || x_explain.nrows() == 0 || config.n_permutations == 0 {
        return Err(ModelError::EmptyData);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let explain_rows = sample_rows(x_explain.nrows(), config.n_samples, &mut rng);
    let background_rows = sample_rows(x_background.nrows(), config.n_permutations, &mut rng);

    let samples = x_explain.select(Axis(0), &explain_rows);
    let background = x_background.select(Axis(0), &background_rows);
    let base_value = {
        let p = classifier.predict_proba(&background)?;
        p.iter().sum::<f64>() / p.len() as f64
    };
    let predictions = classifier.predict_proba(&samples)?;

    let rows: Vec<Array1<f64>> = (0..samples.nrows())
        .into_par_iter()
        .map(|s| {
            let mut row_rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1 + s as u64));
            attribute_row(classifier, samples.row(s).to_owned(), &background, &mut row_rng)
        })
        .collect::<Result<_, ModelError>>()?;

    let mut values = Array2::<f64>::zeros((samples.nrows(), n_features));
    for (s, row) in rows.into_iter().enumerate() {
        values.row_mut(s).assign(&row);
    }

    Ok(ShapExplanation {
        feature_names: feature_names.to_vec(),
        samples,
        sample_rows: explain_rows,
        values,
        base_value,
        predictions,
    })
}

/// Average marginal contributions of one row over one permutation per
/// background row
fn attribute_row(
    classifier: &Classifier,
    x: Array1<f64>,
    background: &Array2<f64>,
    rng: &mut ChaCha8Rng,
) -> Result<Array1<f64>, ModelError> {
    let n_features = x.len();
    let mut phi = Array1::<f64>::zeros(n_features);
    let mut order: Vec<usize> = (0..n_features).collect();

    for base in background.rows() {
        order.shuffle(rng);

        // path[k] has the first k features of `order` taken from x
        let mut path = Array2::<f64>::zeros((n_features + 1, n_features));
        let mut current = base.to_owned();
        path.row_mut(0).assign(&current);
        for (k, &j) in order.iter().enumerate() {
            current[j] = x[j];
            path.row_mut(k + 1).assign(&current);
        }

        let proba = classifier.predict_proba(&path)?;
        for (k, &j) in order.iter().enumerate() {
            phi[j] += proba[k + 1] - proba[k];
        }
    }

    Ok(phi / background.nrows() as f64)
}
