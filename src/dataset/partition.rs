//! K-fold partitioning of a sample collection.
//!
//! Folds are contiguous index ranges over either the original order or a
//! seeded permutation of it. The first `n % k` folds hold one extra sample,
//! so fold sizes differ by at most one.

use crate::core::error::{PredictionBiasError, Result};
use crate::core::types::FoldIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Train/test indices of one fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSplit {
    /// Fold number, 0-based
    pub fold: FoldIndex,
    /// Indices of the training samples, ascending
    pub train_indices: Vec<usize>,
    /// Indices of the test samples, in permutation order
    pub test_indices: Vec<usize>,
}

impl FoldSplit {
    /// Gather the training and test items of this fold.
    pub fn select<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        let train = self.train_indices.iter().map(|&i| items[i].clone()).collect();
        let test = self.test_indices.iter().map(|&i| items[i].clone()).collect();
        (train, test)
    }
}

/// K-fold splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    num_folds: usize,
    shuffle: bool,
    random_seed: u64,
}

impl KFold {
    /// Create a splitter; `num_folds` must be at least 2.
    pub fn new(num_folds: usize, shuffle: bool, random_seed: u64) -> Result<Self> {
        if num_folds < 2 {
            return Err(PredictionBiasError::invalid_parameter(
                "num_folds",
                num_folds.to_string(),
                "must be at least 2",
            ));
        }
        Ok(KFold {
            num_folds,
            shuffle,
            random_seed,
        })
    }

    /// Number of folds.
    pub fn num_folds(&self) -> usize {
        self.num_folds
    }

    /// Split `num_samples` indices into train/test folds.
    pub fn split(&self, num_samples: usize) -> Result<Vec<FoldSplit>> {
        if self.num_folds > num_samples {
            return Err(PredictionBiasError::invalid_parameter(
                "num_folds",
                self.num_folds.to_string(),
                format!("cannot exceed the number of samples ({})", num_samples),
            ));
        }

        let mut order: Vec<usize> = (0..num_samples).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.random_seed);
            order.shuffle(&mut rng);
        }

        let base = num_samples / self.num_folds;
        let remainder = num_samples % self.num_folds;

        let mut splits = Vec::with_capacity(self.num_folds);
        let mut start = 0;
        for fold in 0..self.num_folds {
            let size = base + usize::from(fold < remainder);
            let end = start + size;

            let test_indices = order[start..end].to_vec();
            let mut train_indices: Vec<usize> = order[..start]
                .iter()
                .chain(order[end..].iter())
                .copied()
                .collect();
            train_indices.sort_unstable();

            splits.push(FoldSplit {
                fold,
                train_indices,
                test_indices,
            });
            start = end;
        }

        Ok(splits)
    }
}
