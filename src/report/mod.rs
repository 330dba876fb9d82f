//! Terminal reporting: scatter chart, summary table, stopping rule.
//!
//! The chart is a text artifact: accuracy on a fixed 0-100 axis against
//! an ordinal x-axis of configured sample sizes, with deterministic
//! jitter so repeated points at the same accuracy stay visible.

use crate::results::{ResultTable, SizeSummary};
use std::fmt::Write as _;

/// Default stability tolerance, in percentage points of accuracy.
///
/// A size whose repeats span at most this much is considered to give a
/// stable estimate.
pub const STABILITY_TOLERANCE_POINTS: f64 = 1.0;

const CHART_ROWS: usize = 21; // 0..=100 in steps of 5
const COL_WIDTH: usize = 9;
const POINTS_PER_ROW: f64 = 5.0;

/// Jittered scatter of mean CV accuracy against sample size.
///
/// # Examples
///
/// ```
/// use muestreo::results::{ResultRow, ResultTable};
/// use muestreo::report::ScatterChart;
///
/// let mut table = ResultTable::new();
/// table.push(ResultRow { sample_size: 20, repeat: 1, mean_accuracy: 58.0 }).unwrap();
/// table.push(ResultRow { sample_size: 100, repeat: 1, mean_accuracy: 61.5 }).unwrap();
///
/// let chart = ScatterChart::new(&table).with_trend(true);
/// let rendered = chart.render();
/// assert!(rendered.contains("100"));
/// ```
#[derive(Debug, Clone)]
pub struct ScatterChart {
    sizes: Vec<usize>,
    points: Vec<(usize, usize, f64)>,
    trend: bool,
}

impl ScatterChart {
    /// Builds a chart from a result table.
    #[must_use]
    pub fn new(table: &ResultTable) -> Self {
        let mut sizes = Vec::new();
        let mut points = Vec::new();
        for row in table.rows() {
            if !sizes.contains(&row.sample_size) {
                sizes.push(row.sample_size);
            }
            points.push((row.sample_size, row.repeat, row.mean_accuracy));
        }
        Self {
            sizes,
            points,
            trend: false,
        }
    }

    /// Enables the per-size trend overlay (`+` at the size's mean).
    #[must_use]
    pub fn with_trend(mut self, trend: bool) -> Self {
        self.trend = trend;
        self
    }

    /// Renders the chart into a `String`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Mean CV accuracy (%) by sample size");

        if self.sizes.is_empty() {
            let _ = writeln!(out, "  (no results)");
            return out;
        }

        let width = self.sizes.len() * COL_WIDTH;
        let mut grid = vec![vec![' '; width]; CHART_ROWS];

        for &(size, repeat, accuracy) in &self.points {
            let size_idx = self
                .sizes
                .iter()
                .position(|&s| s == size)
                .expect("sizes collected from the same rows");
            let row = value_to_row(accuracy);
            let col = jittered_column(size_idx, size, repeat);
            grid[row][col] = if grid[row][col] == ' ' { 'o' } else { '@' };
        }

        if self.trend {
            for (size_idx, &size) in self.sizes.iter().enumerate() {
                let values: Vec<f64> = self
                    .points
                    .iter()
                    .filter(|(s, _, _)| *s == size)
                    .map(|(_, _, a)| *a)
                    .collect();
                if values.is_empty() {
                    continue;
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let col = size_idx * COL_WIDTH + COL_WIDTH / 2;
                grid[value_to_row(mean)][col] = '+';
            }
        }

        for (r, row) in grid.iter().enumerate() {
            let value = 100 - r * POINTS_PER_ROW as usize;
            let line: String = row.iter().collect();
            if value % 20 == 0 {
                let _ = writeln!(out, "{value:>3} ┤{line}");
            } else {
                let _ = writeln!(out, "    │{line}");
            }
        }

        let _ = writeln!(out, "    └{}", "─".repeat(width));
        let mut labels = String::from("     ");
        for &size in &self.sizes {
            labels.push_str(&format!("{:^1$}", size, COL_WIDTH));
        }
        let _ = writeln!(out, "{}", labels.trim_end());

        out
    }
}

fn value_to_row(accuracy: f64) -> usize {
    let clamped = accuracy.clamp(0.0, 100.0);
    (((100.0 - clamped) / POINTS_PER_ROW).round() as usize).min(CHART_ROWS - 1)
}

/// Deterministic horizontal jitter within a size's column.
fn jittered_column(size_idx: usize, size: usize, repeat: usize) -> usize {
    let half = (COL_WIDTH / 2) as i64;
    let jitter = ((size * 31 + repeat * 17) % (COL_WIDTH - 2)) as i64 - (half - 1);
    let base = (size_idx * COL_WIDTH) as i64 + half;
    (base + jitter)
        .clamp(
            (size_idx * COL_WIDTH) as i64,
            ((size_idx + 1) * COL_WIDTH - 1) as i64,
        ) as usize
}

/// Renders the per-size min/mean/max summary as a table.
#[must_use]
pub fn render_summary_table(summaries: &[SizeSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>11} {:>8} {:>8} {:>8} {:>8}",
        "Sample size", "Min", "Mean", "Max", "Spread"
    );
    let _ = writeln!(out, "{}", "─".repeat(48));
    for s in summaries {
        let _ = writeln!(
            out,
            "{:>11} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            s.sample_size,
            s.min,
            s.mean,
            s.max,
            s.spread()
        );
    }
    out
}

/// Explicit stopping rule for declaring an accuracy estimate stable.
///
/// Returns the smallest sample size whose across-repeat spread
/// (max - min of mean CV accuracy) is within `tolerance_points` and
/// stays within it at every larger configured size, so a single lucky
/// size cannot be declared stable ahead of a noisy larger one.
#[must_use]
pub fn stable_sample_size(summaries: &[SizeSummary], tolerance_points: f64) -> Option<usize> {
    let mut candidate = None;
    for summary in summaries {
        if summary.spread() <= tolerance_points {
            if candidate.is_none() {
                candidate = Some(summary.sample_size);
            }
        } else {
            candidate = None;
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ResultRow, ResultTable};

    fn table_with(rows: &[(usize, usize, f64)]) -> ResultTable {
        let mut table = ResultTable::new();
        for &(sample_size, repeat, mean_accuracy) in rows {
            table
                .push(ResultRow {
                    sample_size,
                    repeat,
                    mean_accuracy,
                })
                .expect("unique rows");
        }
        table
    }

    fn summaries_with_spreads(spreads: &[f64]) -> Vec<SizeSummary> {
        // Build real summaries through the table so min/max are honest.
        let mut rows = Vec::new();
        for (i, &spread) in spreads.iter().enumerate() {
            let size = (i + 1) * 100;
            rows.push((size, 1, 60.0 - spread / 2.0));
            rows.push((size, 2, 60.0 + spread / 2.0));
        }
        table_with(&rows).summarize()
    }

    #[test]
    fn test_chart_renders_axis_and_labels() {
        let table = table_with(&[(20, 1, 55.0), (20, 2, 62.0), (100, 1, 60.5)]);
        let chart = ScatterChart::new(&table).with_trend(true);
        let rendered = chart.render();

        assert!(rendered.contains("100 ┤"));
        assert!(rendered.contains("  0 ┤"));
        assert!(rendered.contains("20"));
        assert!(rendered.contains("o"));
        assert!(rendered.contains('+'), "trend overlay missing");
        assert_eq!(rendered.lines().count(), 1 + CHART_ROWS + 2);
    }

    #[test]
    fn test_chart_empty_table() {
        let rendered = ScatterChart::new(&ResultTable::new()).render();
        assert!(rendered.contains("(no results)"));
    }

    #[test]
    fn test_chart_is_deterministic() {
        let table = table_with(&[(20, 1, 55.0), (20, 2, 55.0), (20, 3, 55.0)]);
        let a = ScatterChart::new(&table).render();
        let b = ScatterChart::new(&table).render();
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_to_row_bounds() {
        assert_eq!(value_to_row(100.0), 0);
        assert_eq!(value_to_row(0.0), CHART_ROWS - 1);
        assert_eq!(value_to_row(150.0), 0);
        assert_eq!(value_to_row(-5.0), CHART_ROWS - 1);
    }

    #[test]
    fn test_jitter_stays_in_column() {
        for size_idx in 0..4 {
            for repeat in 1..=30 {
                let col = jittered_column(size_idx, 500, repeat);
                assert!(col >= size_idx * COL_WIDTH);
                assert!(col < (size_idx + 1) * COL_WIDTH);
            }
        }
    }

    #[test]
    fn test_summary_table_lists_every_size() {
        let summaries = summaries_with_spreads(&[4.0, 2.0]);
        let rendered = render_summary_table(&summaries);
        assert!(rendered.contains("100"));
        assert!(rendered.contains("200"));
        assert!(rendered.contains("Spread"));
    }

    #[test]
    fn test_stable_sample_size_monotone_suffix() {
        let summaries = summaries_with_spreads(&[12.0, 3.0, 0.8, 0.5]);
        assert_eq!(stable_sample_size(&summaries, 1.0), Some(300));
    }

    #[test]
    fn test_stable_sample_size_skips_lucky_early_size() {
        // Size 200 looks stable but 300 is noisy again, so only 400 counts.
        let summaries = summaries_with_spreads(&[2.0, 0.5, 1.5, 0.9]);
        assert_eq!(stable_sample_size(&summaries, 1.0), Some(400));
    }

    #[test]
    fn test_stable_sample_size_none_when_always_noisy() {
        let summaries = summaries_with_spreads(&[5.0, 4.0, 3.0]);
        assert_eq!(stable_sample_size(&summaries, 1.0), None);
    }

    #[test]
    fn test_stable_sample_size_first_when_all_stable() {
        let summaries = summaries_with_spreads(&[0.5, 0.4, 0.3]);
        assert_eq!(stable_sample_size(&summaries, 1.0), Some(100));
    }
}
