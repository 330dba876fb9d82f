//! Repeated k-fold cross-validation.
//!
//! This module provides the resampling scheme the study fixes: k folds,
//! re-partitioned `n_repeats` times with fresh shuffles, and a
//! `cross_validate` runner producing per-fold accuracies.

use crate::dataset::ClassTable;
use crate::error::{MuestreoError, Result};
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Per-fold scores from cross-validation.
#[derive(Debug, Clone)]
pub struct CvScores {
    /// Score for each fold, all repeats concatenated.
    pub scores: Vec<f64>,
}

impl CvScores {
    /// Mean score across folds.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    /// Standard deviation of fold scores.
    #[must_use]
    pub fn std(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .scores
            .iter()
            .map(|&s| (s - mean).powi(2))
            .sum::<f64>()
            / self.scores.len() as f64;
        variance.sqrt()
    }

    /// Minimum fold score.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.scores.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Maximum fold score.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Repeated K-Fold cross-validator.
///
/// Each repeat shuffles the row indices with a seed derived from the
/// random state plus the repeat number, then splits them into
/// `n_splits` consecutive folds. Every fold serves once as the test set
/// within its repeat.
///
/// # Examples
///
/// ```
/// use muestreo::resampling::RepeatedKFold;
///
/// let cv = RepeatedKFold::new(5, 2).with_random_state(7);
/// let splits = cv.split(50);
/// assert_eq!(splits.len(), 10); // 5 folds x 2 repeats
/// ```
#[derive(Debug, Clone)]
pub struct RepeatedKFold {
    n_splits: usize,
    n_repeats: usize,
    random_state: Option<u64>,
}

impl RepeatedKFold {
    /// Creates a repeated k-fold splitter.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds per repeat. Must be at least 2.
    /// * `n_repeats` - Number of re-partitioning rounds. Must be at least 1.
    #[must_use]
    pub fn new(n_splits: usize, n_repeats: usize) -> Self {
        Self {
            n_splits,
            n_repeats,
            random_state: None,
        }
    }

    /// Sets the random state for reproducible shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Returns the number of folds per repeat.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Returns the number of repeats.
    #[must_use]
    pub fn n_repeats(&self) -> usize {
        self.n_repeats
    }

    /// Generates train/test indices for every fold of every repeat.
    ///
    /// Returns `n_splits * n_repeats` (train, test) pairs, repeats in
    /// order, folds in order within each repeat. Fold sizes differ by at
    /// most one; the remainder goes to the leading folds.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut result = Vec::with_capacity(self.n_splits * self.n_repeats);

        for repeat in 0..self.n_repeats {
            let mut indices: Vec<usize> = (0..n_samples).collect();
            match self.random_state {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(repeat as u64));
                    indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = rand::thread_rng();
                    indices.shuffle(&mut rng);
                }
            }

            let fold_size = n_samples / self.n_splits;
            let remainder = n_samples % self.n_splits;
            let mut start = 0;

            for fold in 0..self.n_splits {
                let current = if fold < remainder {
                    fold_size + 1
                } else {
                    fold_size
                };
                let end = start + current;

                let test: Vec<usize> = indices[start..end].to_vec();
                let mut train = Vec::with_capacity(n_samples - current);
                train.extend_from_slice(&indices[..start]);
                train.extend_from_slice(&indices[end..]);

                result.push((train, test));
                start = end;
            }
        }

        result
    }
}

/// Run repeated k-fold cross-validation on a classifier.
///
/// Clones and trains the model on each fold's training rows, scoring on
/// the held-out rows. A fold whose training slice lost a label level
/// surfaces the trainer's error; there is no retry.
///
/// # Errors
///
/// Returns an error if the table has fewer rows than folds, or if any
/// fold's fit fails.
pub fn cross_validate<M>(model: &M, table: &ClassTable, cv: &RepeatedKFold) -> Result<CvScores>
where
    M: Classifier + Clone,
{
    if cv.n_splits < 2 {
        return Err(MuestreoError::invalid_parameter(
            "n_splits",
            cv.n_splits,
            ">= 2",
        ));
    }
    if table.n_rows() < cv.n_splits {
        return Err(MuestreoError::invalid_parameter(
            "n_rows",
            table.n_rows(),
            &format!(">= {} folds", cv.n_splits),
        ));
    }

    let splits = cv.split(table.n_rows());
    let mut scores = Vec::with_capacity(splits.len());

    for (train_idx, test_idx) in splits {
        let train = table.subset(&train_idx)?;
        let test = table.subset(&test_idx)?;

        let mut fold_model = model.clone();
        fold_model.fit(&train)?;
        scores.push(fold_model.score(&test));
    }

    Ok(CvScores { scores })
}
