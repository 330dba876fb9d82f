//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use muestreo::prelude::*;
//! ```

pub use crate::curve::{
    run, CurveConfig, CvTrainer, DatasetSource, ForestTrainer, PartitionedSource, SimulatedSource,
};
pub use crate::dataset::ClassTable;
pub use crate::error::{MuestreoError, Result};
pub use crate::forest::{DecisionTreeClassifier, ForestHyperparams, RandomForestClassifier};
pub use crate::report::{render_summary_table, stable_sample_size, ScatterChart};
pub use crate::resampling::{cross_validate, CvScores, RepeatedKFold};
pub use crate::results::{load_or_run, ResultRow, ResultTable, RunMode, SizeSummary};
pub use crate::simulate::{generate, SimulationConfig};
pub use crate::traits::Classifier;
pub use crate::wine::WineQuality;
