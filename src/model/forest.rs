//! Random forest classifier
//!
//! Bootstrap-sampled trees built in parallel, each with its own ChaCha RNG
//! seeded from the forest seed and the tree index, so the fitted forest does
//! not depend on thread scheduling.

use std::fmt;

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{BinnedMatrix, RegressionTree, TreeParams};
use super::{check_features, check_training_data, normalize, ModelError};

/// Number of features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`
    Sqrt,
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::All => n_features,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl fmt::Display for RandomForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}",
            self.n_estimators, depth, self.min_samples_split
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: RandomForestParams,
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Option<Vec<f64>>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(RandomForestParams::default())
    }
}

impl RandomForest {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: 0,
            importances: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), ModelError> {
        check_training_data(x, y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let data = BinnedMatrix::from_matrix(x);

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: Some(self.params.max_features.resolve(n_features)),
        };
        let base_seed = self.params.seed;
        let bootstrap = self.params.bootstrap;

        let trees: Vec<RegressionTree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));
                let rows: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                RegressionTree::fit(&data, rows, y, None, &tree_params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            let mut per_tree = tree.importances().to_vec();
            normalize(&mut per_tree);
            for (total, v) in importances.iter_mut().zip(per_tree) {
                *total += v;
            }
        }
        normalize(&mut importances);

        self.trees = trees;
        self.n_features = n_features;
        self.importances = Some(importances);
        Ok(())
    }

    /// Mean of the trees' leaf class-1 frequencies
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_features(x, self.n_features)?;

        let n_trees = self.trees.len() as f64;
        Ok((0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                self.trees
                    .iter()
                    .map(|t| t.predict_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }

    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
