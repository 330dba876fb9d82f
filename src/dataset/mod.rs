//! Labeled tabular dataset container.
//!
//! Provides a minimal labeled table for classification workflows: named
//! numeric feature columns stored row-major, plus a categorical label
//! column encoded as indices into an explicit list of level names.

use crate::error::{MuestreoError, Result};
use serde::{Deserialize, Serialize};

/// A labeled table for classification.
///
/// Features are stored row-major as `f32`; labels index into the table's
/// level-name list. Construction validates shapes, so every accessor can
/// assume a consistent table.
///
/// # Examples
///
/// ```
/// use muestreo::dataset::ClassTable;
///
/// let table = ClassTable::new(
///     vec!["x1".to_string(), "x2".to_string()],
///     vec!["0".to_string(), "1".to_string()],
///     vec![0.5, 1.0, -0.3, 0.0],
///     vec![1, 0],
/// ).expect("shapes are consistent");
/// assert_eq!(table.n_rows(), 2);
/// assert_eq!(table.n_cols(), 3); // label + 2 features
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTable {
    feature_names: Vec<String>,
    levels: Vec<String>,
    features: Vec<f32>,
    labels: Vec<usize>,
}

impl ClassTable {
    /// Creates a new table from named feature columns and encoded labels.
    ///
    /// `features` is row-major with `labels.len() * feature_names.len()`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature buffer length does not match, if a
    /// label indexes past the level list, if names are empty or duplicated,
    /// or if there are no levels.
    pub fn new(
        feature_names: Vec<String>,
        levels: Vec<String>,
        features: Vec<f32>,
        labels: Vec<usize>,
    ) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(MuestreoError::empty_input("feature names"));
        }
        if levels.is_empty() {
            return Err(MuestreoError::empty_input("label levels"));
        }
        if features.len() != labels.len() * feature_names.len() {
            return Err(MuestreoError::invalid_parameter(
                "features",
                features.len(),
                &format!("{} rows x {} columns", labels.len(), feature_names.len()),
            ));
        }

        let mut names: Vec<&str> = feature_names.iter().map(String::as_str).collect();
        names.sort_unstable();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(format!("duplicate feature column {:?}", pair[0]).into());
            }
        }

        if let Some(&bad) = labels.iter().find(|&&l| l >= levels.len()) {
            return Err(MuestreoError::invalid_parameter(
                "label",
                bad,
                &format!("< {} levels", levels.len()),
            ));
        }

        Ok(Self {
            feature_names,
            levels,
            features,
            labels,
        })
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Returns the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Returns the number of columns including the label.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.feature_names.len() + 1
    }

    /// Returns the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Returns the label level names.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Returns the encoded label column.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Gets a feature value at (row, feature column).
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn feature(&self, row: usize, col: usize) -> f32 {
        assert!(col < self.n_features(), "feature column out of bounds");
        self.features[row * self.n_features() + col]
    }

    /// Returns the feature slice for one row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn row_features(&self, row: usize) -> &[f32] {
        let w = self.n_features();
        &self.features[row * w..(row + 1) * w]
    }

    /// Returns one feature column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn feature_column(&self, name: &str) -> Result<Vec<f32>> {
        let col = self
            .feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| MuestreoError::Other(format!("no feature column {name:?}")))?;
        Ok((0..self.n_rows()).map(|r| self.feature(r, col)).collect())
    }

    /// Counts rows per label level.
    #[must_use]
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.levels.len()];
        for &l in &self.labels {
            counts[l] += 1;
        }
        counts
    }

    /// Builds a new table containing the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of bounds.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let w = self.n_features();
        let mut features = Vec::with_capacity(indices.len() * w);
        let mut labels = Vec::with_capacity(indices.len());

        for &idx in indices {
            if idx >= self.n_rows() {
                return Err(MuestreoError::invalid_parameter(
                    "row index",
                    idx,
                    &format!("< {}", self.n_rows()),
                ));
            }
            features.extend_from_slice(self.row_features(idx));
            labels.push(self.labels[idx]);
        }

        Ok(Self {
            feature_names: self.feature_names.clone(),
            levels: self.levels.clone(),
            features,
            labels,
        })
    }

    /// Drops label levels that have no rows, re-encoding the label column.
    ///
    /// Sub-sampling a dataset can leave a level with zero occurrences;
    /// trainers reject such empty levels, so they are pruned explicitly
    /// before fitting.
    #[must_use]
    pub fn prune_unused_levels(&self) -> Self {
        let counts = self.label_counts();
        let mut remap = vec![usize::MAX; self.levels.len()];
        let mut kept = Vec::new();

        for (old, (name, &count)) in self.levels.iter().zip(counts.iter()).enumerate() {
            if count > 0 {
                remap[old] = kept.len();
                kept.push(name.clone());
            }
        }

        Self {
            feature_names: self.feature_names.clone(),
            levels: kept,
            features: self.features.clone(),
            labels: self.labels.iter().map(|&l| remap[l]).collect(),
        }
    }
}
