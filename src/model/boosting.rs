//! Gradient boosting classifier with binomial deviance loss
//!
//! Starts from the log-odds of the training prior, then adds one regression
//! tree per round fitted on the residuals `y - p`. Leaves take a Newton step
//! `sum(y - p) / sum(p * (1 - p))` and every tree is shrunk by the learning
//! rate.

use std::fmt;

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{BinnedMatrix, RegressionTree, TreeParams};
use super::{check_features, check_training_data, normalize, sigmoid, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl fmt::Display for GradientBoostingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_estimators={}, learning_rate={}, max_depth={}",
            self.n_estimators, self.learning_rate, self.max_depth
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub params: GradientBoostingParams,
    trees: Vec<RegressionTree>,
    /// Log-odds of the training prior
    init_score: f64,
    n_features: usize,
    importances: Option<Vec<f64>>,
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new(GradientBoostingParams::default())
    }
}

impl GradientBoosting {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            init_score: 0.0,
            n_features: 0,
            importances: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let data = BinnedMatrix::from_matrix(x);

        let prior = y.iter().sum::<f64>() / n_samples as f64;
        let init_score = (prior / (1.0 - prior)).ln();

        let tree_params = TreeParams {
            max_depth: Some(self.params.max_depth),
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: None,
        };
        // all features are considered, so the RNG is never drawn from
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        let mut raw = vec![init_score; n_samples];
        let mut residuals = vec![0.0; n_samples];
        let mut hessians = vec![0.0; n_samples];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut importances = vec![0.0; n_features];

        for _ in 0..self.params.n_estimators {
            for i in 0..n_samples {
                let p = sigmoid(raw[i]);
                residuals[i] = y[i] - p;
                hessians[i] = p * (1.0 - p);
            }

            let tree = RegressionTree::fit(
                &data,
                (0..n_samples).collect(),
                &residuals,
                Some(&hessians),
                &tree_params,
                &mut rng,
            );

            for (i, score) in raw.iter_mut().enumerate() {
                *score += self.params.learning_rate * tree.predict_binned(&data, i);
            }

            let mut per_tree = tree.importances().to_vec();
            normalize(&mut per_tree);
            for (total, v) in importances.iter_mut().zip(per_tree) {
                *total += v;
            }

            trees.push(tree);
        }
        normalize(&mut importances);

        self.trees = trees;
        self.init_score = init_score;
        self.n_features = n_features;
        self.importances = Some(importances);
        Ok(())
    }

    /// Raw additive score (log-odds) for every row
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        if self.importances.is_none() {
            return Err(ModelError::NotFitted);
        }
        check_features(x, self.n_features)?;

        let lr = self.params.learning_rate;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.init_score
                    + self
                        .trees
                        .iter()
                        .map(|t| lr * t.predict_row(row))
                        .sum::<f64>()
            })
            .collect())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(sigmoid)
            .collect())
    }

    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Array2<f64>, Vec<f64>) {
        let x = Array2::from_shape_fn((80, 3), |(i, j)| match j {
            0 => (i % 20) as f64,
            1 => ((i * 13) % 17) as f64,
            _ => 1.0,
        });
        let y = (0..80).map(|i| if i % 20 >= 12 { 1.0 } else { 0.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_boosting_learns_threshold() {
        let (x, y) = dataset();
        let mut model = GradientBoosting::new(GradientBoostingParams {
            n_estimators: 30,
            ..GradientBoostingParams::default()
        });
        model.fit(&x, &y).unwrap();

        assert_eq!(model.n_trees(), 30);
        let proba = model.predict_proba(&x).unwrap();
        for (p, label) in proba.iter().zip(y.iter()) {
            if *label == 1.0 {
                assert!(*p > 0.8, "positive scored {}", p);
            } else {
                assert!(*p < 0.2, "negative scored {}", p);
            }
        }

        let importances = model.feature_importances().unwrap();
        assert!(importances[0] > 0.9);
        assert_eq!(importances[2], 0.0);
    }

    #[test]
    fn test_zero_rounds_predicts_prior() {
        let (x, y) = dataset();
        let mut model = GradientBoosting::new(GradientBoostingParams {
            n_estimators: 0,
            ..GradientBoostingParams::default()
        });
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!((proba[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = dataset();
        let y = vec![0.0; 80];
        assert_eq!(
            GradientBoosting::default().fit(&x, &y),
            Err(ModelError::SingleClass)
        );
    }

    #[test]
    fn test_unfitted_model_errors() {
        let (x, _) = dataset();
        assert_eq!(
            GradientBoosting::default().predict_proba(&x),
            Err(ModelError::NotFitted)
        );
    }
}
