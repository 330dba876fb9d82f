//! Core traits for classifiers.
//!
//! These traits define the API contract the cross-validation and
//! evaluation machinery is written against, so the driver can be tested
//! with deterministic stubs instead of a real training algorithm.

use crate::dataset::ClassTable;
use crate::error::Result;

/// A trainable classifier over a [`ClassTable`].
///
/// `score` defaults to classification accuracy in `[0, 1]`.
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
/// let table = generate(200, &config, &mut rng).unwrap();
///
/// let mut model = RandomForestClassifier::new(25).with_random_state(7);
/// model.fit(&table).unwrap();
/// let acc = model.score(&table);
/// assert!(acc > 0.5);
/// ```
pub trait Classifier {
    /// Fits the model to a labeled table.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (empty table, a label level with
    /// no training rows, etc.).
    fn fit(&mut self, table: &ClassTable) -> Result<()>;

    /// Predicts encoded labels for every row.
    fn predict(&self, table: &ClassTable) -> Vec<usize>;

    /// Computes classification accuracy against the table's labels.
    fn score(&self, table: &ClassTable) -> f64 {
        let predictions = self.predict(table);
        if predictions.is_empty() {
            return 0.0;
        }
        let correct = predictions
            .iter()
            .zip(table.labels())
            .filter(|(p, t)| p == t)
            .count();
        correct as f64 / predictions.len() as f64
    }
}
