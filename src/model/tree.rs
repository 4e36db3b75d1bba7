//! CART regression tree over histogram-binned features
//!
//! Both ensembles share this tree. A random forest fits it on 0/1 labels, so
//! the variance criterion equals the Gini criterion and each leaf holds the
//! class-1 frequency. Gradient boosting fits it on residuals and passes
//! hessians so leaves take a Newton step instead of the mean.

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on distinct bins per feature
pub const MAX_BINS: usize = 256;

/// Gains below this are treated as no improvement
const MIN_GAIN: f64 = 1e-12;

/// Feature matrix quantized to at most [`MAX_BINS`] bins per column
///
/// A value falls in bin `b` when `cuts[b - 1] < v <= cuts[b]`, so the split
/// "bin <= b" is the same as the raw-value split "v <= cuts[b]".
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    /// Column-major bin indices
    bins: Vec<u8>,
    cuts: Vec<Vec<f64>>,
    n_rows: usize,
}

impl BinnedMatrix {
    pub fn from_matrix(x: &Array2<f64>) -> Self {
        let (n_rows, n_features) = x.dim();
        let mut bins = Vec::with_capacity(n_rows * n_features);
        let mut cuts = Vec::with_capacity(n_features);

        for column in x.columns() {
            let feature_cuts = compute_cuts(column);
            bins.extend(
                column
                    .iter()
                    .map(|&v| feature_cuts.partition_point(|&c| c < v) as u8),
            );
            cuts.push(feature_cuts);
        }

        Self { bins, cuts, n_rows }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.cuts.len()
    }

    #[inline]
    fn bin(&self, row: usize, feature: usize) -> usize {
        self.bins[feature * self.n_rows + row] as usize
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len() + 1
    }
}

/// Split candidates for one column
///
/// Few distinct values: midpoints between consecutive values. Otherwise
/// midpoints at evenly spaced quantiles.
fn compute_cuts(column: ArrayView1<f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();

    if sorted.len() <= MAX_BINS {
        return sorted.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let n = sorted.len();
    let mut cuts: Vec<f64> = (1..MAX_BINS)
        .map(|k| {
            let i = k * n / MAX_BINS;
            (sorted[i - 1] + sorted[i]) / 2.0
        })
        .collect();
    cuts.dedup();
    cuts
}

/// Growth limits of one tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled at each node; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Bin index equivalent of `threshold`, used while training
        #[serde(skip)]
        bin: usize,
        left: usize,
        right: usize,
    },
}

/// Fitted tree stored as a flat node arena; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total squared-error decrease attributed to each feature
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    bin: usize,
    gain: f64,
}

impl RegressionTree {
    /// Grow a tree on `rows` of `data` (rows may repeat, as in a bootstrap)
    ///
    /// With `hessians`, leaf values are `sum(target) / sum(hessian)`;
    /// otherwise the mean target.
    pub fn fit(
        data: &BinnedMatrix,
        rows: Vec<usize>,
        targets: &[f64],
        hessians: Option<&[f64]>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            importances: vec![0.0; data.n_features()],
        };
        tree.grow(data, rows, targets, hessians, params, rng, 0);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        data: &BinnedMatrix,
        rows: Vec<usize>,
        targets: &[f64],
        hessians: Option<&[f64]>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
        depth: usize,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: leaf_value(&rows, targets, hessians),
        });

        let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || rows.len() < params.min_samples_split.max(2) {
            return id;
        }

        let Some(best) = find_best_split(data, &rows, targets, params, rng) else {
            return id;
        };

        self.importances[best.feature] += best.gain;

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| data.bin(r, best.feature) <= best.bin);

        let left = self.grow(data, left_rows, targets, hessians, params, rng, depth + 1);
        let right = self.grow(data, right_rows, targets, hessians, params, rng, depth + 1);

        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: data.cuts[best.feature][best.bin],
            bin: best.bin,
            left,
            right,
        };
        id
    }

    /// Leaf value for one raw feature row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Leaf value for a row of the matrix the tree was trained on
    pub fn predict_binned(&self, data: &BinnedMatrix, row: usize) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    bin,
                    left,
                    right,
                    ..
                } => {
                    id = if data.bin(row, *feature) <= *bin {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn leaf_value(rows: &[usize], targets: &[f64], hessians: Option<&[f64]>) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let sum: f64 = rows.iter().map(|&r| targets[r]).sum();
    match hessians {
        Some(h) => {
            let denom: f64 = rows.iter().map(|&r| h[r]).sum();
            if denom.abs() < 1e-150 {
                0.0
            } else {
                sum / denom
            }
        }
        None => sum / rows.len() as f64,
    }
}

/// Best variance-reduction split over the sampled features
///
/// Gain is `S_l^2/n_l + S_r^2/n_r - S^2/n`, the decrease in squared error.
/// Ties keep the first candidate in feature order, then bin order.
fn find_best_split(
    data: &BinnedMatrix,
    rows: &[usize],
    targets: &[f64],
    params: &TreeParams,
    rng: &mut ChaCha8Rng,
) -> Option<BestSplit> {
    let n_features = data.n_features();
    let mut features: Vec<usize> = match params.max_features {
        Some(m) if m < n_features => index::sample(rng, n_features, m.max(1)).into_vec(),
        _ => (0..n_features).collect(),
    };
    features.sort_unstable();

    let n = rows.len() as f64;
    let total: f64 = rows.iter().map(|&r| targets[r]).sum();
    let parent_score = total * total / n;
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<BestSplit> = None;
    let mut sums = [0.0f64; MAX_BINS];
    let mut counts = [0usize; MAX_BINS];

    for feature in features {
        let n_bins = data.n_bins(feature);
        if n_bins < 2 {
            continue;
        }
        sums[..n_bins].fill(0.0);
        counts[..n_bins].fill(0);
        for &r in rows {
            let b = data.bin(r, feature);
            sums[b] += targets[r];
            counts[b] += 1;
        }

        let mut left_sum = 0.0;
        let mut left_count = 0usize;
        for b in 0..n_bins - 1 {
            left_sum += sums[b];
            left_count += counts[b];
            let right_count = rows.len() - left_count;
            if left_count < min_leaf {
                continue;
            }
            if right_count < min_leaf {
                break;
            }
            if counts[b] == 0 {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - parent_score;

            if gain > MIN_GAIN && best.as_ref().map_or(true, |s| gain > s.gain) {
                best = Some(BestSplit { feature, bin: b, gain });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    #[test]
    fn test_cuts_are_midpoints_for_few_values() {
        let x = array![[1.0], [2.0], [2.0], [4.0]];
        let data = BinnedMatrix::from_matrix(&x);
        assert_eq!(data.cuts[0], vec![1.5, 3.0]);
        assert_eq!(data.bin(0, 0), 0);
        assert_eq!(data.bin(2, 0), 1);
        assert_eq!(data.bin(3, 0), 2);
    }

    #[test]
    fn test_cuts_capped_for_many_values() {
        let x = Array2::from_shape_fn((1000, 1), |(i, _)| i as f64);
        let data = BinnedMatrix::from_matrix(&x);
        assert!(data.n_bins(0) <= MAX_BINS);
        assert!(data.n_bins(0) > 100);
    }

    #[test]
    fn test_tree_separates_classes() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let data = BinnedMatrix::from_matrix(&x);

        let tree = RegressionTree::fit(&data, (0..6).collect(), &y, None, &TreeParams::default(), &mut rng());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_row(array![2.5, 0.0].view()), 0.0);
        assert_eq!(tree.predict_row(array![9.0, 0.0].view()), 1.0);
        assert!(tree.importances()[0] > 0.0);
        assert_eq!(tree.importances()[1], 0.0);
        for r in 0..6 {
            assert_eq!(tree.predict_binned(&data, r), y[r]);
        }
    }

    #[test]
    fn test_max_depth_zero_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 1.0, 0.0, 1.0];
        let data = BinnedMatrix::from_matrix(&x);
        let params = TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        };

        let tree = RegressionTree::fit(&data, (0..4).collect(), &y, None, &params, &mut rng());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(array![1.0].view()), 0.5);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = [1.0, 0.0, 0.0, 0.0, 0.0];
        let data = BinnedMatrix::from_matrix(&x);
        let params = TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        };

        let tree = RegressionTree::fit(&data, (0..5).collect(), &y, None, &params, &mut rng());
        // the lone positive cannot be isolated
        assert!(tree.predict_row(array![1.0].view()) < 1.0);
    }

    #[test]
    fn test_newton_leaf_values() {
        let x = array![[1.0], [2.0]];
        let residuals = [0.5, 0.5];
        let hessians = [0.25, 0.25];
        let data = BinnedMatrix::from_matrix(&x);
        let tree = RegressionTree::fit(
            &data,
            vec![0, 1],
            &residuals,
            Some(&hessians),
            &TreeParams::default(),
            &mut rng(),
        );
        assert_eq!(tree.predict_row(array![1.0].view()), 2.0);
    }
}
