//! Seeded train/validation partitioning.
//!
//! [`split`] is the K-fold contract: the row indices `0..n` are shuffled
//! once with the seed and the shuffled order is cut into `k` contiguous
//! groups whose sizes differ by at most one (the first `n % k` groups get
//! the extra row). Group `i` is the validation set of fold `i`; the rest,
//! in shuffled order, is its training set.
//!
//! ```
//! use tuner::resample::split;
//!
//! let folds = split(10, 3, 42).unwrap();
//! assert_eq!(folds.len(), 3);
//! let sizes: Vec<usize> = folds.iter().map(|f| f.validation.len()).collect();
//! assert_eq!(sizes, vec![4, 3, 3]);
//! ```

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// One train/validation partition of the row indices `0..n`.
///
/// `train` and `validation` are disjoint and together cover `0..n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    /// Position of this fold in its partition.
    pub index: usize,
    /// Rows to fit on.
    pub train: Vec<usize>,
    /// Rows to score on.
    pub validation: Vec<usize>,
}

impl Fold {
    /// Maps this fold's indices through `rows`.
    ///
    /// Inner folds are computed over positions `0..rows.len()` of an outer
    /// training set; this turns them back into dataset row indices.
    #[must_use]
    pub fn remap(&self, rows: &[usize]) -> Self {
        Self {
            index: self.index,
            train: self.train.iter().map(|&i| rows[i]).collect(),
            validation: self.validation.iter().map(|&i| rows[i]).collect(),
        }
    }
}

/// Splits `0..n_samples` into `k` seeded folds.
///
/// The result depends only on `(n_samples, k, seed)`.
///
/// # Errors
///
/// Returns [`Error::InvalidFoldCount`] when `k < 2` and
/// [`Error::InsufficientSamples`] when `k > n_samples`.
pub fn split(n_samples: usize, k: usize, seed: u64) -> Result<Vec<Fold>> {
    if k < 2 {
        return Err(Error::InvalidFoldCount(k));
    }
    if k > n_samples {
        return Err(Error::InsufficientSamples {
            n_splits: k,
            n_samples,
        });
    }

    let order = shuffled(n_samples, seed);
    let base = n_samples / k;
    let extra = n_samples % k;

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for index in 0..k {
        let size = base + usize::from(index < extra);
        let end = start + size;
        let validation = order[start..end].to_vec();
        let train = order[..start]
            .iter()
            .chain(&order[end..])
            .copied()
            .collect();
        folds.push(Fold {
            index,
            train,
            validation,
        });
        start = end;
    }
    Ok(folds)
}

fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

/// How a set of rows is partitioned into folds.
///
/// [`Resampler::k_fold`] is the standard choice. [`Resampler::holdout`]
/// yields a single train/validation split and exists for the degraded
/// one-outer-fold mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resampler {
    /// Shuffled K-fold cross-validation.
    KFold {
        /// Number of folds (at least 2).
        k: usize,
        /// Shuffle seed.
        seed: u64,
    },
    /// A single shuffled split holding out `fraction` of the rows.
    Holdout {
        /// Share of rows in the validation set, in (0, 1).
        fraction: f64,
        /// Shuffle seed.
        seed: u64,
    },
}

impl Resampler {
    #[must_use]
    pub fn k_fold(k: usize, seed: u64) -> Self {
        Self::KFold { k, seed }
    }

    #[must_use]
    pub fn holdout(fraction: f64, seed: u64) -> Self {
        Self::Holdout { fraction, seed }
    }

    /// Number of folds this resampler produces.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        match self {
            Self::KFold { k, .. } => *k,
            Self::Holdout { .. } => 1,
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        match self {
            Self::KFold { seed, .. } | Self::Holdout { seed, .. } => *seed,
        }
    }

    /// Returns a copy with the seed replaced.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        match self {
            Self::KFold { k, .. } => Self::KFold { k, seed },
            Self::Holdout { fraction, .. } => Self::Holdout { fraction, seed },
        }
    }

    /// Partitions `0..n_samples`.
    ///
    /// # Errors
    ///
    /// K-fold errors are those of [`split`]. Holdout returns
    /// [`Error::InvalidHoldoutFraction`] unless the fraction lies in (0, 1)
    /// and leaves at least one row on each side.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        match *self {
            Self::KFold { k, seed } => split(n_samples, k, seed),
            Self::Holdout { fraction, seed } => {
                let n_validation = (n_samples as f64 * fraction).round() as usize;
                if !(fraction > 0.0 && fraction < 1.0)
                    || n_validation == 0
                    || n_validation >= n_samples
                {
                    return Err(Error::InvalidHoldoutFraction {
                        fraction,
                        n_samples,
                    });
                }
                let order = shuffled(n_samples, seed);
                Ok(vec![Fold {
                    index: 0,
                    train: order[n_validation..].to_vec(),
                    validation: order[..n_validation].to_vec(),
                }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_all_rows() {
        for (n, k) in [(10, 3), (7, 7), (100, 5), (11, 2)] {
            let folds = split(n, k, 1).unwrap();
            let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.validation.clone()).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..n).collect::<Vec<_>>());
            for fold in &folds {
                assert_eq!(fold.train.len() + fold.validation.len(), n);
                assert!(fold.train.iter().all(|i| !fold.validation.contains(i)));
            }
        }
    }

    #[test]
    fn first_groups_take_the_remainder() {
        let sizes: Vec<usize> = split(11, 4, 0)
            .unwrap()
            .iter()
            .map(|f| f.validation.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 3, 2]);
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        assert_eq!(split(50, 5, 9).unwrap(), split(50, 5, 9).unwrap());
        assert_ne!(split(50, 5, 9).unwrap(), split(50, 5, 10).unwrap());
    }

    #[test]
    fn rejects_bad_fold_counts() {
        assert!(matches!(split(10, 1, 0), Err(Error::InvalidFoldCount(1))));
        assert!(matches!(
            split(3, 4, 0),
            Err(Error::InsufficientSamples {
                n_splits: 4,
                n_samples: 3
            })
        ));
    }

    #[test]
    fn holdout_yields_one_fold() {
        let folds = Resampler::holdout(0.2, 3).split(20).unwrap();
        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].validation.len(), 4);
        assert_eq!(folds[0].train.len(), 16);
        assert!(Resampler::holdout(1.0, 3).split(20).is_err());
        assert!(Resampler::holdout(0.01, 3).split(20).is_err());
    }

    #[test]
    fn remap_translates_positions() {
        let fold = Fold {
            index: 0,
            train: vec![0, 2],
            validation: vec![1],
        };
        let mapped = fold.remap(&[10, 20, 30]);
        assert_eq!(mapped.train, vec![10, 30]);
        assert_eq!(mapped.validation, vec![20]);
    }
}
