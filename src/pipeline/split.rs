//! Stratified train/test split and stratified k-fold
//!
//! Both splitters shuffle each class separately with a seeded ChaCha RNG so
//! that the same labels and seed always produce the same partition.

use std::collections::BTreeMap;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of one train/test partition, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Row indices per class label, in row order
fn class_indices(y: &[f64]) -> BTreeMap<i64, Vec<usize>> {
    let mut classes: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        classes.entry(label as i64).or_default().push(i);
    }
    classes
}

/// Hold out `round(n_class * test_size)` rows of every class
pub fn stratified_train_test_split(y: &[f64], test_size: f64, seed: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        anyhow::bail!("test_size must be in (0, 1), got {}", test_size);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();

    for (_, mut indices) in class_indices(y) {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_size).round() as usize;
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        anyhow::bail!(
            "Split of {} rows with test_size {} leaves an empty partition",
            y.len(),
            test_size
        );
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Stratified k-fold splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    /// Same number of folds, rows dealt in their original order
    pub fn unshuffled(&self) -> Self {
        Self {
            shuffle: false,
            ..*self
        }
    }

    /// Folds over positions `0..y.len()`
    ///
    /// Rows of each class are dealt round-robin across folds, so every fold
    /// receives a near-equal share of each class.
    pub fn split(&self, y: &[f64]) -> Result<Vec<Split>> {
        if self.n_splits < 2 {
            anyhow::bail!("n_splits must be at least 2, got {}", self.n_splits);
        }

        let classes = class_indices(y);
        if let Some((label, rows)) = classes.iter().find(|(_, r)| r.len() < self.n_splits) {
            anyhow::bail!(
                "Class {} has only {} row(s), fewer than n_splits = {}",
                label,
                rows.len(),
                self.n_splits
            );
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut fold_of = vec![0usize; y.len()];
        for (_, mut indices) in classes {
            if self.shuffle {
                indices.shuffle(&mut rng);
            }
            for (k, &i) in indices.iter().enumerate() {
                fold_of[i] = k % self.n_splits;
            }
        }

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| fold_of[i] == fold);
                Split { train, test }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_pos: usize, n_neg: usize) -> Vec<f64> {
        let mut y = vec![1.0; n_pos];
        y.extend(vec![0.0; n_neg]);
        y
    }

    #[test]
    fn test_split_preserves_class_ratio() {
        let y = labels(40, 160);
        let split = stratified_train_test_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 40);
        assert_eq!(split.train.len(), 160);
        let test_pos = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_pos, 8);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let y = labels(30, 70);
        let a = stratified_train_test_split(&y, 0.25, 7).unwrap();
        let b = stratified_train_test_split(&y, 0.25, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.test.iter().all(|i| !a.train.contains(i)));
        assert_eq!(a.train.len() + a.test.len(), 100);

        let c = stratified_train_test_split(&y, 0.25, 8).unwrap();
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        assert!(stratified_train_test_split(&[0.0, 1.0], 0.0, 1).is_err());
        assert!(stratified_train_test_split(&[0.0, 1.0], 1.0, 1).is_err());
    }

    #[test]
    fn test_kfold_covers_every_row_once() {
        let y = labels(12, 38);
        let folds = StratifiedKFold::new(5, 42).split(&y).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0; y.len()];
        for fold in &folds {
            for &i in &fold.test {
                seen[i] += 1;
            }
            assert_eq!(fold.train.len() + fold.test.len(), y.len());
            let pos = fold.test.iter().filter(|&&i| y[i] == 1.0).count();
            assert!(pos == 2 || pos == 3);
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_kfold_rejects_tiny_class() {
        let y = labels(2, 20);
        assert!(StratifiedKFold::new(5, 1).split(&y).is_err());
        assert!(StratifiedKFold::new(1, 1).split(&y).is_err());
    }

    #[test]
    fn test_unshuffled_folds_ignore_seed() {
        let y = labels(6, 12);
        let a = StratifiedKFold::new(3, 1).unshuffled().split(&y).unwrap();
        let b = StratifiedKFold::new(3, 99).unshuffled().split(&y).unwrap();
        assert_eq!(a, b);
        // positives 0..6 and negatives 6..18 dealt in order
        assert_eq!(a[0].test, vec![0, 3, 6, 9, 12, 15]);

        let shuffled = StratifiedKFold::new(3, 99).split(&y).unwrap();
        assert_ne!(shuffled, a);
    }
}
