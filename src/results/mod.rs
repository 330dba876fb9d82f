//! Result accumulation, summary statistics, and the cached-run gate.
//!
//! The evaluation driver appends one row per (sample size, repeat)
//! iteration; this module owns that table, its per-size min/mean/max
//! reduction, and the explicit recompute-vs-load-cached persistence gate.

use crate::error::{MuestreoError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One evaluation outcome: the mean cross-validated accuracy for a
/// single (sample size, repeat) iteration, on the percentage scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Training-sample size evaluated.
    #[serde(rename = "Sample_size")]
    pub sample_size: usize,
    /// 1-based repeat index within this sample size.
    pub repeat: usize,
    /// Mean CV accuracy in [0, 100].
    #[serde(rename = "Mean_accuracy")]
    pub mean_accuracy: f64,
}

/// Append-only, ordered sequence of result rows.
///
/// Rows keep the exact nested iteration order the driver produced them
/// in (sizes ascending, repeats ascending within a size), which makes
/// runs with the same seed byte-comparable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns an error if a row with the same (sample size, repeat)
    /// pair is already present.
    pub fn push(&mut self, row: ResultRow) -> Result<()> {
        if self
            .rows
            .iter()
            .any(|r| r.sample_size == row.sample_size && r.repeat == row.repeat)
        {
            return Err(MuestreoError::Other(format!(
                "duplicate result row for sample_size {} repeat {}",
                row.sample_size, row.repeat
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Groups rows by sample size and reduces to min/mean/max accuracy.
    ///
    /// Sizes appear in first-seen order; the reduction is pure and the
    /// table is left untouched.
    #[must_use]
    pub fn summarize(&self) -> Vec<SizeSummary> {
        let mut summaries: Vec<SizeSummary> = Vec::new();

        for row in &self.rows {
            match summaries
                .iter_mut()
                .find(|s| s.sample_size == row.sample_size)
            {
                Some(summary) => summary.absorb(row.mean_accuracy),
                None => summaries.push(SizeSummary::seed(row.sample_size, row.mean_accuracy)),
            }
        }

        for summary in &mut summaries {
            summary.mean = summary.sum / summary.count as f64;
        }
        summaries
    }

    /// Persists the table as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads a previously persisted table, verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`MuestreoError::CacheMiss`] if the artifact does not
    /// exist, or a serialization error if it cannot be decoded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MuestreoError::cache_miss(path));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Per-size accuracy summary, derived and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeSummary {
    /// Sample size the summary covers.
    pub sample_size: usize,
    /// Minimum mean accuracy across repeats.
    pub min: f64,
    /// Mean of mean accuracies across repeats.
    pub mean: f64,
    /// Maximum mean accuracy across repeats.
    pub max: f64,
    count: usize,
    sum: f64,
}

impl SizeSummary {
    fn seed(sample_size: usize, value: f64) -> Self {
        Self {
            sample_size,
            min: value,
            mean: value,
            max: value,
            count: 1,
            sum: value,
        }
    }

    fn absorb(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    /// Number of repeats this summary aggregates.
    #[must_use]
    pub fn repeats(&self) -> usize {
        self.count
    }

    /// Spread between the best and worst repeat, in percentage points.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }
}

/// Whether to run the evaluation or trust the persisted artifact.
///
/// An explicit two-variant operation selected by configuration, not an
/// ambient boolean flag checked at multiple points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run the evaluation and overwrite the artifact.
    Recompute,
    /// Load the artifact verbatim; a missing artifact is a fatal error.
    LoadCached,
}

/// Memoization gate over a full evaluation run.
///
/// With [`RunMode::LoadCached`] the persisted table is returned as-is:
/// no staleness check, no silent fallback to recomputation. With
/// [`RunMode::Recompute`] the closure runs and its result is persisted
/// before being returned.
///
/// # Errors
///
/// Returns [`MuestreoError::CacheMiss`] for `LoadCached` without an
/// artifact, or any error from the closure or from persistence.
pub fn load_or_run<P, F>(mode: RunMode, path: P, run: F) -> Result<ResultTable>
where
    P: AsRef<Path>,
    F: FnOnce() -> Result<ResultTable>,
{
    match mode {
        RunMode::LoadCached => ResultTable::load(path),
        RunMode::Recompute => {
            let table = run()?;
            table.save(path)?;
            Ok(table)
        }
    }
}
