//! The evaluation driver: accuracy as a function of sample size.
//!
//! For each size in a configured sequence, the driver draws repeated
//! independent datasets, fits a classifier under repeated k-fold
//! cross-validation, and records one scalar (the mean CV accuracy on
//! the percentage scale) per (size, repeat) iteration, in exactly that
//! nested order. Dataset supply and training are injected capabilities,
//! so the driver is testable against deterministic stubs.

use crate::dataset::ClassTable;
use crate::error::{MuestreoError, Result};
use crate::forest::ForestHyperparams;
use crate::resampling::{cross_validate, RepeatedKFold};
use crate::results::{ResultRow, ResultTable};
use crate::simulate::{generate, SimulationConfig};
use crate::wine::WineQuality;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// The study's default sample-size sequence.
pub const DEFAULT_SIZES: [usize; 6] = [20, 100, 500, 1000, 2000, 5000];

/// Configuration of one progressive-sampling run.
///
/// # Examples
///
/// ```
/// use muestreo::curve::CurveConfig;
///
/// let config = CurveConfig::new(vec![20, 100], 3)
///     .expect("sizes strictly increasing")
///     .with_folds(5)
///     .with_cv_repeats(2)
///     .with_seed(7);
/// assert_eq!(config.sizes(), &[20, 100]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CurveConfig {
    sizes: Vec<usize>,
    repeats: usize,
    folds: usize,
    cv_repeats: usize,
    seed: u64,
}

impl CurveConfig {
    /// Creates a validated configuration with the study's CV defaults
    /// (5 folds, 6 CV repeats, seed 7).
    ///
    /// # Errors
    ///
    /// Returns an error if `sizes` is empty or not strictly increasing,
    /// if any size is zero, or if `repeats` is zero.
    pub fn new(sizes: Vec<usize>, repeats: usize) -> Result<Self> {
        if sizes.is_empty() {
            return Err(MuestreoError::empty_input("sample-size sequence"));
        }
        if sizes[0] == 0 {
            return Err(MuestreoError::invalid_parameter("sizes[0]", 0, "> 0"));
        }
        for pair in sizes.windows(2) {
            if pair[1] <= pair[0] {
                return Err(MuestreoError::invalid_parameter(
                    "sizes",
                    format!("{} after {}", pair[1], pair[0]),
                    "strictly increasing",
                ));
            }
        }
        if repeats == 0 {
            return Err(MuestreoError::invalid_parameter("repeats", repeats, ">= 1"));
        }

        Ok(Self {
            sizes,
            repeats,
            folds: 5,
            cv_repeats: 6,
            seed: 7,
        })
    }

    /// The simulated-data preset: default sizes, 30 repeats, 5x6 CV.
    #[must_use]
    pub fn simulated_defaults() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            repeats: 30,
            folds: 5,
            cv_repeats: 6,
            seed: 7,
        }
    }

    /// The wine-data preset: the lighter 5x2 CV the study uses on the
    /// finite real dataset.
    #[must_use]
    pub fn wine_defaults() -> Self {
        Self {
            cv_repeats: 2,
            ..Self::simulated_defaults()
        }
    }

    /// Sets the fold count.
    #[must_use]
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    /// Sets the cross-validation repeat count.
    #[must_use]
    pub fn with_cv_repeats(mut self, cv_repeats: usize) -> Self {
        self.cv_repeats = cv_repeats;
        self
    }

    /// Sets the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the sample-size sequence.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Returns the repeat count per size.
    #[must_use]
    pub fn repeats(&self) -> usize {
        self.repeats
    }

    /// Returns the fold count.
    #[must_use]
    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Returns the CV repeat count.
    #[must_use]
    pub fn cv_repeats(&self) -> usize {
        self.cv_repeats
    }

    /// Returns the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derives the (dataset, cv, trainer) seeds for one iteration.
    ///
    /// Each iteration gets three consecutive seeds off a stride-3
    /// counter, so every random consumer is independently seeded and a
    /// parallel implementation could re-derive them per unit of work.
    fn iteration_seeds(&self, size_idx: usize, repeat: usize) -> (u64, u64, u64) {
        let iteration = (size_idx * self.repeats + (repeat - 1)) as u64;
        let base = self.seed.wrapping_add(iteration.wrapping_mul(3));
        (base, base.wrapping_add(1), base.wrapping_add(2))
    }
}

/// Supplies one dataset per (size, repeat) iteration.
pub trait DatasetSource {
    /// Produces the dataset for the given iteration.
    ///
    /// `seed` is derived deterministically by the driver; sources that
    /// draw fresh data must use it so runs are reproducible.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be produced.
    fn draw(&mut self, size: usize, repeat: usize, seed: u64) -> Result<ClassTable>;
}

/// Draws a fresh simulated dataset for every iteration.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    config: SimulationConfig,
}

impl SimulatedSource {
    /// Creates a source for the given simulation configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl DatasetSource for SimulatedSource {
    fn draw(&mut self, size: usize, _repeat: usize, seed: u64) -> Result<ClassTable> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(size, &self.config, &mut rng)
    }
}

/// Serves pre-built disjoint partitions of the wine dataset.
///
/// All partitions are materialized up front from the master seed, so the
/// j-th repeat at a given size always receives the j-th partition.
#[derive(Debug, Clone)]
pub struct PartitionedSource {
    partitions: HashMap<usize, Vec<ClassTable>>,
}

impl PartitionedSource {
    /// Partitions the wine dataset for every configured size.
    ///
    /// # Errors
    ///
    /// Returns an error if any size's `size * repeats` budget exceeds
    /// the dataset.
    pub fn from_wine(wine: &WineQuality, config: &CurveConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed());
        let mut partitions = HashMap::new();
        for &size in config.sizes() {
            partitions.insert(size, wine.partition_disjoint(size, config.repeats(), &mut rng)?);
        }
        Ok(Self { partitions })
    }
}

impl DatasetSource for PartitionedSource {
    fn draw(&mut self, size: usize, repeat: usize, _seed: u64) -> Result<ClassTable> {
        let idx = repeat
            .checked_sub(1)
            .ok_or_else(|| MuestreoError::invalid_parameter("repeat", repeat, ">= 1"))?;
        self.partitions
            .get(&size)
            .and_then(|groups| groups.get(idx))
            .cloned()
            .ok_or_else(|| {
                MuestreoError::Other(format!(
                    "no partition for sample_size {size} repeat {repeat}"
                ))
            })
    }
}

/// Produces one scalar mean CV accuracy per dataset.
pub trait CvTrainer {
    /// Fits under the given resampling scheme and returns the mean
    /// accuracy across all folds, in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any fold fails to fit.
    fn mean_cv_accuracy(&self, table: &ClassTable, cv: &RepeatedKFold, seed: u64) -> Result<f64>;
}

/// The study's trainer: a random forest at the fixed hyperparameter
/// point, cross-validated.
#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    params: ForestHyperparams,
}

impl ForestTrainer {
    /// Creates a trainer for the given hyperparameters.
    #[must_use]
    pub fn new(params: ForestHyperparams) -> Self {
        Self { params }
    }
}

impl CvTrainer for ForestTrainer {
    fn mean_cv_accuracy(&self, table: &ClassTable, cv: &RepeatedKFold, seed: u64) -> Result<f64> {
        let forest = self.params.build(seed);
        Ok(cross_validate(&forest, table, cv)?.mean())
    }
}

/// Runs the progressive-sampling evaluation.
///
/// Outer loop: sizes in configured order. Inner loop: repeats `1..=R`.
/// Each iteration draws a dataset, measures mean CV accuracy, and
/// appends one row on the percentage scale. Iteration order is part of
/// the contract: rows land in the table exactly as iterated, and the
/// whole run is a pure function of the configuration (determinism law).
///
/// Any iteration failure aborts the run; no partial table is returned.
///
/// # Errors
///
/// Returns the first error from dataset supply or training.
///
/// # Examples
///
/// ```
/// use muestreo::prelude::*;
///
/// let config = CurveConfig::new(vec![20, 40], 2)
///     .unwrap()
///     .with_folds(4)
///     .with_cv_repeats(1)
///     .with_seed(7);
/// let mut source = SimulatedSource::new(SimulationConfig::new(0.2, 0.0).unwrap());
/// let trainer = ForestTrainer::new(ForestHyperparams {
///     n_estimators: 5,
///     mtry: 3,
///     min_samples_leaf: 1,
/// });
///
/// let table = run(&config, &mut source, &trainer).unwrap();
/// assert_eq!(table.len(), 4);
/// ```
pub fn run<S, T>(config: &CurveConfig, source: &mut S, trainer: &T) -> Result<ResultTable>
where
    S: DatasetSource,
    T: CvTrainer,
{
    let mut results = ResultTable::new();

    for (size_idx, &size) in config.sizes().iter().enumerate() {
        for repeat in 1..=config.repeats() {
            let (data_seed, cv_seed, trainer_seed) = config.iteration_seeds(size_idx, repeat);

            let table = source.draw(size, repeat, data_seed)?;
            let cv = RepeatedKFold::new(config.folds(), config.cv_repeats())
                .with_random_state(cv_seed);
            let accuracy = trainer.mean_cv_accuracy(&table, &cv, trainer_seed)?;

            results.push(ResultRow {
                sample_size: size,
                repeat,
                mean_accuracy: 100.0 * accuracy,
            })?;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trainer stub: a deterministic function of the dataset size and
    /// seed, no training at all.
    #[derive(Debug, Clone)]
    struct StubTrainer;

    impl CvTrainer for StubTrainer {
        fn mean_cv_accuracy(
            &self,
            table: &ClassTable,
            _cv: &RepeatedKFold,
            seed: u64,
        ) -> Result<f64> {
            Ok(((table.n_rows() + seed as usize % 13) as f64) / 10_000.0)
        }
    }

    /// Source stub: tiny constant tables, records the sizes requested.
    #[derive(Debug, Default)]
    struct StubSource {
        requests: Vec<(usize, usize, u64)>,
    }

    impl DatasetSource for StubSource {
        fn draw(&mut self, size: usize, repeat: usize, seed: u64) -> Result<ClassTable> {
            self.requests.push((size, repeat, seed));
            ClassTable::new(
                vec!["x1".to_string()],
                vec!["0".to_string(), "1".to_string()],
                (0..size).map(|i| i as f32).collect(),
                (0..size).map(|i| i % 2).collect(),
            )
        }
    }

    #[test]
    fn test_config_rejects_bad_sequences() {
        assert!(CurveConfig::new(vec![], 3).is_err());
        assert!(CurveConfig::new(vec![0, 10], 3).is_err());
        assert!(CurveConfig::new(vec![10, 10], 3).is_err());
        assert!(CurveConfig::new(vec![100, 20], 3).is_err());
        assert!(CurveConfig::new(vec![20, 100], 0).is_err());
    }

    #[test]
    fn test_presets_differ_only_in_cv_repeats() {
        let simulated = CurveConfig::simulated_defaults();
        let wine = CurveConfig::wine_defaults();
        assert_eq!(simulated.cv_repeats(), 6);
        assert_eq!(wine.cv_repeats(), 2);
        assert_eq!(simulated.sizes(), wine.sizes());
        assert_eq!(simulated.repeats(), wine.repeats());
    }

    #[test]
    fn test_run_nested_order() {
        let config = CurveConfig::new(vec![20, 100], 3).expect("valid config");
        let mut source = StubSource::default();
        let table = run(&config, &mut source, &StubTrainer).expect("runs");

        assert_eq!(table.len(), 6);
        let sizes: Vec<usize> = table.rows().iter().map(|r| r.sample_size).collect();
        let repeats: Vec<usize> = table.rows().iter().map(|r| r.repeat).collect();
        assert_eq!(sizes, vec![20, 20, 20, 100, 100, 100]);
        assert_eq!(repeats, vec![1, 2, 3, 1, 2, 3]);

        // The source saw the same nested order it produced rows in.
        let requested: Vec<(usize, usize)> =
            source.requests.iter().map(|&(s, r, _)| (s, r)).collect();
        assert_eq!(
            requested,
            vec![(20, 1), (20, 2), (20, 3), (100, 1), (100, 2), (100, 3)]
        );
    }

    #[test]
    fn test_run_accuracy_is_percentage_scaled() {
        let config = CurveConfig::new(vec![50], 1).expect("valid config");
        let mut source = StubSource::default();
        let table = run(&config, &mut source, &StubTrainer).expect("runs");

        let row = table.rows()[0];
        // StubTrainer returns a fraction; the driver scales by 100.
        assert!(row.mean_accuracy > 0.0 && row.mean_accuracy <= 100.0);
    }

    #[test]
    fn test_iteration_seeds_are_distinct() {
        let config = CurveConfig::new(vec![20, 100], 3).expect("valid config");
        let mut seen = Vec::new();
        for size_idx in 0..2 {
            for repeat in 1..=3 {
                let (a, b, c) = config.iteration_seeds(size_idx, repeat);
                seen.extend_from_slice(&[a, b, c]);
            }
        }
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total, "iteration seeds collide");
    }

    #[test]
    fn test_run_is_deterministic_for_seed() {
        let config = CurveConfig::new(vec![20, 40], 2)
            .expect("valid config")
            .with_folds(4)
            .with_cv_repeats(1)
            .with_seed(11);
        let simulation = SimulationConfig::new(0.2, 0.0).expect("valid");
        let trainer = ForestTrainer::new(ForestHyperparams {
            n_estimators: 3,
            mtry: 2,
            min_samples_leaf: 1,
        });

        let mut source1 = SimulatedSource::new(simulation);
        let mut source2 = SimulatedSource::new(simulation);
        let a = run(&config, &mut source1, &trainer).expect("runs");
        let b = run(&config, &mut source2, &trainer).expect("runs");
        assert_eq!(a, b);
    }

    #[test]
    fn test_simulated_source_seed_controls_draw() {
        let mut source = SimulatedSource::new(SimulationConfig::new(0.2, 0.0).expect("valid"));
        let a = source.draw(30, 1, 1).expect("draws");
        let b = source.draw(30, 1, 2).expect("draws");
        let c = source.draw(30, 1, 1).expect("draws");
        assert_eq!(a, c, "same seed reproduces the draw");
        assert_ne!(a, b, "different seeds draw different data");
    }

    #[test]
    fn test_partitioned_source_serves_each_repeat_once() {
        let mut raw = String::from("\"alcohol\";\"quality\"\n");
        for i in 0..120 {
            raw.push_str(&format!("{}.0;{}\n", i + 1, 4 + (i % 5)));
        }
        let wine = WineQuality::parse(&raw).expect("parses");

        let config = CurveConfig::new(vec![10, 20], 3).expect("valid config");
        let mut source = PartitionedSource::from_wine(&wine, &config).expect("partitions");

        let first = source.draw(10, 1, 0).expect("partition exists");
        let again = source.draw(10, 1, 0).expect("partition exists");
        assert_eq!(first, again, "repeat index addresses a fixed partition");

        assert!(source.draw(10, 4, 0).is_err(), "repeat out of range");
        assert!(source.draw(15, 1, 0).is_err(), "unknown size");
    }

    #[test]
    fn test_partitioned_source_rejects_oversized_budget() {
        let wine = WineQuality::parse("\"a\";\"quality\"\n1.0;5\n2.0;6\n3.0;7\n").expect("parses");
        let config = CurveConfig::new(vec![10], 2).expect("valid config");
        assert!(PartitionedSource::from_wine(&wine, &config).is_err());
    }
}
