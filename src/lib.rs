//! Muestreo: progressive sampling for stable accuracy estimates.
//!
//! Muestreo answers one empirical question: how large a training sample
//! does a classifier need before its cross-validated accuracy estimate
//! stops wobbling? It simulates (or partitions) labeled data at a
//! sequence of increasing sample sizes, repeatedly fits a random forest
//! under repeated k-fold cross-validation, and summarizes how the
//! accuracy spread shrinks as samples grow.
//!
//! # Quick Start
//!
//! ```
//! use muestreo::prelude::*;
//!
//! // A weak, learnable signal.
//! let simulation = SimulationConfig::new(0.2, 0.0).unwrap();
//!
//! // Two sample sizes, two repeats each, light CV so the example is fast.
//! let config = CurveConfig::new(vec![30, 60], 2)
//!     .unwrap()
//!     .with_folds(3)
//!     .with_cv_repeats(1)
//!     .with_seed(7);
//!
//! let mut source = SimulatedSource::new(simulation);
//! let trainer = ForestTrainer::new(ForestHyperparams {
//!     n_estimators: 10,
//!     mtry: 3,
//!     min_samples_leaf: 1,
//! });
//!
//! let results = run(&config, &mut source, &trainer).unwrap();
//! assert_eq!(results.len(), 4);
//!
//! for summary in results.summarize() {
//!     assert!(summary.min <= summary.mean && summary.mean <= summary.max);
//! }
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: Labeled table container with explicit label levels
//! - [`simulate`]: Synthetic data with tunable signal strength
//! - [`wine`]: Wine-quality dataset adapter with disjoint partitioning
//! - [`forest`]: Decision tree and random forest classifiers
//! - [`resampling`]: Repeated k-fold cross-validation
//! - [`curve`]: The evaluation driver (sizes x repeats)
//! - [`results`]: Result table, summaries, recompute-vs-cache gate
//! - [`report`]: ASCII scatter chart, summary table, stopping rule
//! - [`error`]: Crate error type

pub mod curve;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod prelude;
pub mod report;
pub mod resampling;
pub mod results;
pub mod simulate;
pub mod traits;
pub mod wine;
