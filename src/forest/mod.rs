//! Decision tree and random forest classifiers.
//!
//! The study fits one fixed model family: a random forest with a
//! single-point hyperparameter configuration (mtry = 3, gini splits,
//! minimum leaf size 1). The forest here is deliberately compact: CART
//! trees with per-split feature subsampling, bootstrap aggregation, and
//! majority voting.

use crate::dataset::ClassTable;
use crate::error::{MuestreoError, Result};
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// The fixed hyperparameter point the study evaluates.
///
/// There is no tuning search: the "grid" has exactly one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestHyperparams {
    /// Number of trees in the forest.
    pub n_estimators: usize,
    /// Features sampled per split.
    pub mtry: usize,
    /// Minimum rows per leaf.
    pub min_samples_leaf: usize,
}

impl Default for ForestHyperparams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            mtry: 3,
            min_samples_leaf: 1,
        }
    }
}

impl ForestHyperparams {
    /// Builds a forest for these hyperparameters with the given seed.
    #[must_use]
    pub fn build(&self, random_state: u64) -> RandomForestClassifier {
        RandomForestClassifier::new(self.n_estimators)
            .with_mtry(self.mtry)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_random_state(random_state)
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A CART-style decision tree with gini splits.
///
/// Supports per-split random feature subsampling (`mtry`), which the
/// forest relies on for decorrelated trees.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    root: Option<TreeNode>,
    mtry: Option<usize>,
    min_samples_leaf: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
}

impl DecisionTreeClassifier {
    /// Creates an unfitted tree with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            mtry: None,
            min_samples_leaf: 1,
            max_depth: None,
            random_state: None,
        }
    }

    /// Sets the number of features sampled per split.
    #[must_use]
    pub fn with_mtry(mut self, mtry: usize) -> Self {
        self.mtry = Some(mtry);
        self
    }

    /// Sets the minimum rows per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Caps the tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the random state for reproducible feature subsampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Predicts the class for a single feature row.
    ///
    /// Returns class 0 if the tree has not been fitted.
    #[must_use]
    pub fn predict_row(&self, features: &[f32]) -> usize {
        let mut node = match &self.root {
            Some(n) => n,
            None => return 0,
        };
        loop {
            match node {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn feature_candidates(&self, n_features: usize, rng: &mut StdRng) -> Vec<usize> {
        match self.mtry {
            Some(m) if m < n_features => {
                let mut indices: Vec<usize> = (0..n_features).collect();
                let (chosen, _) = indices.partial_shuffle(rng, m);
                chosen.to_vec()
            }
            _ => (0..n_features).collect(),
        }
    }

    fn best_split(
        &self,
        table: &ClassTable,
        indices: &[usize],
        candidates: &[usize],
        parent_gini: f64,
    ) -> Option<(usize, f32)> {
        let n = indices.len();
        let n_levels = table.levels().len();
        let mut best = parent_gini - 1e-12;
        let mut split = None;

        for &feature in candidates {
            let mut pairs: Vec<(f32, usize)> = indices
                .iter()
                .map(|&i| (table.feature(i, feature), table.labels()[i]))
                .collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left = vec![0usize; n_levels];
            let mut right = vec![0usize; n_levels];
            for &(_, label) in &pairs {
                right[label] += 1;
            }

            for i in 0..n - 1 {
                let (value, label) = pairs[i];
                left[label] += 1;
                right[label] -= 1;

                if value == pairs[i + 1].0 {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if weighted < best {
                    best = weighted;
                    // The midpoint of two adjacent floats can round up to
                    // the right value; fall back to the left value so the
                    // split always separates the boundary.
                    let mut threshold = (value + pairs[i + 1].0) / 2.0;
                    if threshold >= pairs[i + 1].0 {
                        threshold = value;
                    }
                    split = Some((feature, threshold));
                }
            }
        }

        split
    }

    fn grow(
        &self,
        table: &ClassTable,
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> TreeNode {
        let counts = count_labels(table, indices);
        let majority = argmax(&counts);
        let parent_gini = gini(&counts, indices.len());

        let depth_capped = self.max_depth.map_or(false, |d| depth >= d);
        if parent_gini == 0.0 || indices.len() < 2 * self.min_samples_leaf.max(1) || depth_capped {
            return TreeNode::Leaf { class: majority };
        }

        let candidates = self.feature_candidates(table.n_features(), rng);
        match self.best_split(table, indices, &candidates, parent_gini) {
            None => TreeNode::Leaf { class: majority },
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| table.feature(i, feature) <= threshold);
                TreeNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(table, &left_idx, depth + 1, rng)),
                    right: Box::new(self.grow(table, &right_idx, depth + 1, rng)),
                }
            }
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, table: &ClassTable) -> Result<()> {
        if table.n_rows() == 0 {
            return Err(MuestreoError::empty_input("training table"));
        }
        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let indices: Vec<usize> = (0..table.n_rows()).collect();
        self.root = Some(self.grow(table, &indices, 0, &mut rng));
        Ok(())
    }

    fn predict(&self, table: &ClassTable) -> Vec<usize> {
        (0..table.n_rows())
            .map(|i| self.predict_row(table.row_features(i)))
            .collect()
    }
}

/// Bootstrap + majority-vote ensemble of decision trees.
///
/// # Examples
///
/// ```
/// use muestreo::prelude::*;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let config = SimulationConfig::new(0.3, 0.0).unwrap();
/// let mut rng = StdRng::seed_from_u64(7);
/// let table = generate(300, &config, &mut rng).unwrap();
///
/// let mut forest = RandomForestClassifier::new(25)
///     .with_mtry(3)
///     .with_random_state(7);
/// forest.fit(&table).unwrap();
/// assert_eq!(forest.predict(&table).len(), 300);
/// ```
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    mtry: Option<usize>,
    min_samples_leaf: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
    n_levels: usize,
}

impl RandomForestClassifier {
    /// Creates an unfitted forest with `n_estimators` trees.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            mtry: None,
            min_samples_leaf: 1,
            max_depth: None,
            random_state: None,
            n_levels: 0,
        }
    }

    /// Sets the number of features sampled per split.
    #[must_use]
    pub fn with_mtry(mut self, mtry: usize) -> Self {
        self.mtry = Some(mtry);
        self
    }

    /// Sets the minimum rows per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Caps the depth of every tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the random state for reproducible bootstrap and splits.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }
}

impl Classifier for RandomForestClassifier {
    /// Fits the forest.
    ///
    /// Rejects a table carrying a label level with zero rows. Callers
    /// sub-sampling a finite dataset should prune unused levels first.
    fn fit(&mut self, table: &ClassTable) -> Result<()> {
        if table.n_rows() == 0 {
            return Err(MuestreoError::empty_input("training table"));
        }
        for (level, &count) in table.levels().iter().zip(table.label_counts().iter()) {
            if count == 0 {
                return Err(MuestreoError::MissingLabelLevel {
                    level: level.clone(),
                });
            }
        }

        self.n_levels = table.levels().len();
        self.trees = Vec::with_capacity(self.n_estimators);

        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s.wrapping_add(i as u64));
            let sample_indices = bootstrap_sample(table.n_rows(), seed);
            let sample = table.subset(&sample_indices)?;

            let mut tree = DecisionTreeClassifier::new()
                .with_min_samples_leaf(self.min_samples_leaf);
            if let Some(mtry) = self.mtry {
                tree = tree.with_mtry(mtry);
            }
            if let Some(depth) = self.max_depth {
                tree = tree.with_max_depth(depth);
            }
            if let Some(seed) = seed {
                tree = tree.with_random_state(seed);
            }

            tree.fit(&sample)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, table: &ClassTable) -> Vec<usize> {
        let n_levels = self.n_levels.max(1);
        (0..table.n_rows())
            .map(|i| {
                let features = table.row_features(i);
                let mut votes = vec![0usize; n_levels];
                for tree in &self.trees {
                    let class = tree.predict_row(features);
                    if class < n_levels {
                        votes[class] += 1;
                    }
                }
                argmax(&votes)
            })
            .collect()
    }
}

/// Draws `n` indices with replacement.
fn bootstrap_sample(n: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

fn count_labels(table: &ClassTable, indices: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; table.levels().len()];
    for &i in indices {
        counts[table.labels()[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let mut impurity = 1.0;
    for &c in counts {
        let p = c as f64 / n as f64;
        impurity -= p * p;
    }
    impurity
}

fn argmax(counts: &[usize]) -> usize {
    let mut best_class = 0;
    let mut best_count = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best_count = count;
            best_class = class;
        }
    }
    best_class
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_table(n_per_class: usize) -> ClassTable {
        // Class 0 clusters near x = 0, class 1 near x = 10.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let wiggle = (i % 5) as f32 * 0.1;
            features.extend_from_slice(&[wiggle, 1.0]);
            labels.push(0);
            features.extend_from_slice(&[10.0 + wiggle, 2.0]);
            labels.push(1);
        }
        ClassTable::new(
            vec!["x1".to_string(), "x2".to_string()],
            vec!["0".to_string(), "1".to_string()],
            features,
            labels,
        )
        .expect("valid table")
    }

    #[test]
    fn test_tree_fits_separable_data() {
        let table = separable_table(20);
        let mut tree = DecisionTreeClassifier::new().with_random_state(7);
        tree.fit(&table).expect("fits");
        assert!(tree.score(&table) > 0.99);
    }

    #[test]
    fn test_tree_depth_zero_predicts_majority() {
        let table = ClassTable::new(
            vec!["x1".to_string()],
            vec!["0".to_string(), "1".to_string()],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1, 1, 1, 0, 0],
        )
        .expect("valid table");

        let mut tree = DecisionTreeClassifier::new().with_max_depth(0);
        tree.fit(&table).expect("fits");
        assert_eq!(tree.predict(&table), vec![1; 5]);
    }

    #[test]
    fn test_tree_rejects_empty_table() {
        let table = separable_table(5);
        let empty = table.subset(&[]).expect("empty subset is valid");
        let mut tree = DecisionTreeClassifier::new();
        assert!(tree.fit(&empty).is_err());
    }

    #[test]
    fn test_tree_constant_features_fall_back_to_majority() {
        let table = ClassTable::new(
            vec!["x1".to_string()],
            vec!["0".to_string(), "1".to_string()],
            vec![3.0, 3.0, 3.0],
            vec![0, 0, 1],
        )
        .expect("valid table");

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&table).expect("fits");
        assert_eq!(tree.predict(&table), vec![0, 0, 0]);
    }

    #[test]
    fn test_forest_fits_separable_data() {
        let table = separable_table(25);
        let mut forest = RandomForestClassifier::new(15).with_random_state(7);
        forest.fit(&table).expect("fits");
        assert!(forest.score(&table) > 0.95);
    }

    #[test]
    fn test_forest_rejects_empty_label_level() {
        let table = ClassTable::new(
            vec!["x1".to_string()],
            vec!["bad".to_string(), "normal".to_string(), "good".to_string()],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0, 0, 1, 1],
        )
        .expect("valid table");

        let mut forest = RandomForestClassifier::new(5).with_random_state(7);
        let err = forest.fit(&table).expect_err("level \"good\" is empty");
        assert!(matches!(err, MuestreoError::MissingLabelLevel { .. }));

        let mut forest = RandomForestClassifier::new(5).with_random_state(7);
        forest
            .fit(&table.prune_unused_levels())
            .expect("pruned table fits");
    }

    #[test]
    fn test_forest_deterministic_for_random_state() {
        let table = separable_table(15);

        let mut a = RandomForestClassifier::new(10)
            .with_mtry(1)
            .with_random_state(42);
        a.fit(&table).expect("fits");
        let mut b = RandomForestClassifier::new(10)
            .with_mtry(1)
            .with_random_state(42);
        b.fit(&table).expect("fits");

        assert_eq!(a.predict(&table), b.predict(&table));
    }

    #[test]
    fn test_hyperparams_default_is_study_point() {
        let params = ForestHyperparams::default();
        assert_eq!(params.n_estimators, 500);
        assert_eq!(params.mtry, 3);
        assert_eq!(params.min_samples_leaf, 1);
    }

    #[test]
    fn test_hyperparams_build() {
        let params = ForestHyperparams {
            n_estimators: 8,
            mtry: 2,
            min_samples_leaf: 1,
        };
        let mut forest = params.build(7);
        forest.fit(&separable_table(10)).expect("fits");
        assert_eq!(forest.trees.len(), 8);
    }

    #[test]
    fn test_bootstrap_sample_deterministic() {
        let a = bootstrap_sample(50, Some(7));
        let b = bootstrap_sample(50, Some(7));
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 50));
    }

    #[test]
    fn test_gini_bounds() {
        assert_eq!(gini(&[10, 0], 10), 0.0);
        assert!((gini(&[5, 5], 10) - 0.5).abs() < 1e-12);
        assert_eq!(gini(&[], 0), 0.0);
    }
}
