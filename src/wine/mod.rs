//! White-wine quality dataset adapter.
//!
//! Loads the semicolon-delimited wine-quality file, collapses the ordinal
//! quality score to three levels (bad / normal / good), and supports the
//! disjoint partitioning the study uses so sub-samples of a finite
//! dataset stay uncorrelated.

use crate::dataset::ClassTable;
use crate::error::{MuestreoError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Header name of the ordinal score column in the raw file.
pub const QUALITY_COLUMN: &str = "quality";

/// The derived label levels, in encoding order.
pub const LEVELS: [&str; 3] = ["bad", "normal", "good"];

/// The wine-quality dataset with its derived 3-level label.
///
/// Immutable after load: the quality column is consumed by the label
/// derivation and dropped from the feature set.
///
/// # Examples
///
/// ```
/// use muestreo::wine::WineQuality;
///
/// let raw = "\
/// \"alcohol\";\"sulphates\";\"quality\"
/// 9.4;0.45;5
/// 10.1;0.56;6
/// 12.8;0.82;7
/// ";
/// let wine = WineQuality::parse(raw).expect("well-formed file");
/// assert_eq!(wine.table().labels(), &[0, 1, 2]); // bad, normal, good
/// assert_eq!(wine.table().n_features(), 2); // quality column dropped
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WineQuality {
    table: ClassTable,
}

impl WineQuality {
    /// Parses the semicolon-delimited raw text.
    ///
    /// The header row names the columns; one must be `quality`. Quality
    /// scores below 6 become `"bad"`, exactly 6 `"normal"`, above 6
    /// `"good"`.
    ///
    /// # Errors
    ///
    /// Returns a [`MuestreoError::Parse`] with the offending 1-based line
    /// number on malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate();
        let (_, header) = lines.next().ok_or(MuestreoError::Parse {
            line: 1,
            message: "missing header row".to_string(),
        })?;

        let columns: Vec<String> = header
            .split(';')
            .map(|c| c.trim().trim_matches('"').to_string())
            .collect();
        let quality_col = columns
            .iter()
            .position(|c| c == QUALITY_COLUMN)
            .ok_or_else(|| MuestreoError::Parse {
                line: 1,
                message: format!("no {QUALITY_COLUMN:?} column in header"),
            })?;

        let feature_names: Vec<String> = columns
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != quality_col)
            .map(|(_, name)| name.clone())
            .collect();

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(';').collect();
            if fields.len() != columns.len() {
                return Err(MuestreoError::Parse {
                    line: idx + 1,
                    message: format!("expected {} fields, got {}", columns.len(), fields.len()),
                });
            }

            for (col, field) in fields.iter().enumerate() {
                let value: f64 = field.trim().parse().map_err(|_| MuestreoError::Parse {
                    line: idx + 1,
                    message: format!("not a number: {field:?}"),
                })?;
                if col == quality_col {
                    labels.push(quality_level(value));
                } else {
                    features.push(value as f32);
                }
            }
        }

        let table = ClassTable::new(
            feature_names,
            LEVELS.iter().map(|s| (*s).to_string()).collect(),
            features,
            labels,
        )?;
        Ok(Self { table })
    }

    /// Loads and parses the raw file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or parse failure.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Reads and parses the raw text from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or parse failure.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Returns the transformed, immutable table.
    #[must_use]
    pub fn table(&self) -> &ClassTable {
        &self.table
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    /// Persists the transformed table as JSON so later runs can skip the
    /// raw parse.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    pub fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(&self.table)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads a previously cached transformed table.
    ///
    /// # Errors
    ///
    /// Returns [`MuestreoError::CacheMiss`] if the artifact does not
    /// exist.
    pub fn load_cache<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MuestreoError::cache_miss(path));
        }
        let json = fs::read_to_string(path)?;
        let table: ClassTable = serde_json::from_str(&json)?;
        Ok(Self { table })
    }

    /// Draws `size * repeats` distinct rows without replacement and
    /// assigns each to exactly one of `repeats` disjoint partitions.
    ///
    /// Partition sizes vary slightly around `size` because assignment is
    /// uniform per row; partitions never overlap. Each partition is
    /// level-pruned, so a partition that failed to materialize rows for
    /// some level can still be fitted.
    ///
    /// # Errors
    ///
    /// Returns an error if `size * repeats` exceeds the dataset, or if
    /// `size` or `repeats` is zero.
    pub fn partition_disjoint(
        &self,
        size: usize,
        repeats: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<ClassTable>> {
        if size == 0 {
            return Err(MuestreoError::invalid_parameter("size", size, "> 0"));
        }
        if repeats == 0 {
            return Err(MuestreoError::invalid_parameter("repeats", repeats, "> 0"));
        }
        let budget = size * repeats;
        if budget > self.n_rows() {
            return Err(MuestreoError::invalid_parameter(
                "size * repeats",
                budget,
                &format!("<= {} rows", self.n_rows()),
            ));
        }

        let mut indices: Vec<usize> = (0..self.n_rows()).collect();
        indices.shuffle(rng);
        indices.truncate(budget);

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); repeats];
        for idx in indices {
            groups[rng.gen_range(0..repeats)].push(idx);
        }

        groups
            .into_iter()
            .map(|group| Ok(self.table.subset(&group)?.prune_unused_levels()))
            .collect()
    }
}

fn quality_level(quality: f64) -> usize {
    if quality < 6.0 {
        0
    } else if quality > 6.0 {
        2
    } else {
        1
    }
}
