//! Simulated classification data with a tunable, weak signal.
//!
//! The generator produces a balanced binary label, one continuous feature,
//! three discrete noise features, and one signal-bearing binary feature
//! whose success probability depends on the conjunction of the label and
//! the sign of the continuous feature. `relevance` controls how far the
//! four subpopulation probabilities sit from 0.5; `interaction` splits
//! them further by sign.

use crate::dataset::ClassTable;
use crate::error::{MuestreoError, Result};
use rand::rngs::StdRng;
use rand::Rng;

/// Configuration for the simulated generator.
///
/// Construction is fail-fast: a relevance/interaction combination that
/// pushes any subpopulation success probability outside [0, 1] is rejected
/// rather than clamped.
///
/// # Examples
///
/// ```
/// use muestreo::simulate::SimulationConfig;
///
/// let config = SimulationConfig::new(0.1, 0.0).expect("probabilities stay in [0, 1]");
/// assert_eq!(config.subpopulation_probabilities(), [0.4, 0.4, 0.6, 0.6]);
///
/// assert!(SimulationConfig::new(0.45, 0.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    relevance: f64,
    interaction: f64,
}

impl SimulationConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `relevance` is outside `[0, 0.5)` or if any of
    /// the four subpopulation probabilities leaves `[0, 1]`.
    pub fn new(relevance: f64, interaction: f64) -> Result<Self> {
        if !(0.0..0.5).contains(&relevance) {
            return Err(MuestreoError::invalid_parameter(
                "relevance",
                relevance,
                "[0, 0.5)",
            ));
        }

        let config = Self {
            relevance,
            interaction,
        };
        for p in config.subpopulation_probabilities() {
            if !(0.0..=1.0).contains(&p) {
                return Err(MuestreoError::DegenerateProbability {
                    probability: p,
                    relevance,
                    interaction,
                });
            }
        }
        Ok(config)
    }

    /// Returns the configured relevance.
    #[must_use]
    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    /// Returns the configured interaction offset.
    #[must_use]
    pub fn interaction(&self) -> f64 {
        self.interaction
    }

    /// The four x2 success probabilities, ordered
    /// (y=1, x1<0), (y=1, x1>=0), (y=0, x1<0), (y=0, x1>=0).
    #[must_use]
    pub fn subpopulation_probabilities(&self) -> [f64; 4] {
        [
            0.5 - self.relevance - self.interaction,
            0.5 - self.relevance + self.interaction,
            0.5 + self.relevance - self.interaction,
            0.5 + self.relevance + self.interaction,
        ]
    }

    fn signal_probability(&self, label: usize, x1: f32) -> f64 {
        let probs = self.subpopulation_probabilities();
        match (label, x1 < 0.0) {
            (1, true) => probs[0],
            (1, false) => probs[1],
            (0, true) => probs[2],
            _ => probs[3],
        }
    }
}

impl Default for SimulationConfig {
    /// The study's default: a weak signal, no interaction.
    fn default() -> Self {
        Self {
            relevance: 0.1,
            interaction: 0.0,
        }
    }
}

/// Generates a simulated dataset of exactly `n` rows.
///
/// Columns: binary label (levels `"0"`/`"1"`), continuous `x1`, binary
/// signal feature `x2`, and discrete-uniform noise features `x3` in
/// {1..4}, `x4` in {1..10}, `x5` in {1..20}.
///
/// # Errors
///
/// Returns an error if `n == 0`.
pub fn generate(n: usize, config: &SimulationConfig, rng: &mut StdRng) -> Result<ClassTable> {
    if n == 0 {
        return Err(MuestreoError::invalid_parameter("n", n, "> 0"));
    }

    let mut features = Vec::with_capacity(n * 5);
    let mut labels = Vec::with_capacity(n);

    for _ in 0..n {
        let label = usize::from(rng.gen_bool(0.5));
        let x1 = randn(rng) as f32;
        let x2 = if rng.gen_bool(config.signal_probability(label, x1)) {
            1.0
        } else {
            0.0
        };
        let x3 = rng.gen_range(1..=4) as f32;
        let x4 = rng.gen_range(1..=10) as f32;
        let x5 = rng.gen_range(1..=20) as f32;

        features.extend_from_slice(&[x1, x2, x3, x4, x5]);
        labels.push(label);
    }

    ClassTable::new(
        ["x1", "x2", "x3", "x4", "x5"]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        vec!["0".to_string(), "1".to_string()],
        features,
        labels,
    )
}

/// Sample a standard normal using the Box-Muller transform.
fn randn(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-10);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_config_no_signal() {
        let config = SimulationConfig::new(0.0, 0.0).expect("valid");
        assert_eq!(config.subpopulation_probabilities(), [0.5; 4]);
    }

    #[test]
    fn test_config_weak_signal_offsets() {
        let config = SimulationConfig::new(0.1, 0.0).expect("valid");
        assert_eq!(config.subpopulation_probabilities(), [0.4, 0.4, 0.6, 0.6]);
    }

    #[test]
    fn test_config_interaction_splits_by_sign() {
        let config = SimulationConfig::new(0.1, 0.05).expect("valid");
        let probs = config.subpopulation_probabilities();
        assert!((probs[0] - 0.35).abs() < 1e-12);
        assert!((probs[1] - 0.45).abs() < 1e-12);
        assert!((probs[2] - 0.55).abs() < 1e-12);
        assert!((probs[3] - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_config_rejects_degenerate_probability() {
        let err = SimulationConfig::new(0.45, 0.1).expect_err("probability leaves [0, 1]");
        assert!(matches!(err, MuestreoError::DegenerateProbability { .. }));
    }

    #[test]
    fn test_config_rejects_relevance_out_of_range() {
        assert!(SimulationConfig::new(0.5, 0.0).is_err());
        assert!(SimulationConfig::new(-0.1, 0.0).is_err());
    }

    #[test]
    fn test_generate_shape() {
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let table = generate(250, &config, &mut rng).expect("generates");

        assert_eq!(table.n_rows(), 250);
        assert_eq!(table.n_cols(), 6);
        assert_eq!(table.levels(), &["0".to_string(), "1".to_string()]);
        assert!(table.labels().iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_generate_rejects_zero_rows() {
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(generate(0, &config, &mut rng).is_err());
    }

    #[test]
    fn test_generate_noise_feature_ranges() {
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let table = generate(2000, &config, &mut rng).expect("generates");

        for (name, lo, hi) in [("x3", 1.0, 4.0), ("x4", 1.0, 10.0), ("x5", 1.0, 20.0)] {
            let col = table.feature_column(name).expect("column exists");
            assert!(col.iter().all(|&v| (lo..=hi).contains(&v) && v.fract() == 0.0));
        }

        let x2 = table.feature_column("x2").expect("column exists");
        assert!(x2.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_generate_is_deterministic_for_seed() {
        let config = SimulationConfig::new(0.2, 0.05).expect("valid");
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let a = generate(100, &config, &mut rng1).expect("generates");
        let b = generate(100, &config, &mut rng2).expect("generates");
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_is_balanced_in_expectation() {
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let table = generate(20_000, &config, &mut rng).expect("generates");

        let ones = table.labels().iter().filter(|&&l| l == 1).count();
        let rate = ones as f64 / table.n_rows() as f64;
        assert!((rate - 0.5).abs() < 0.02, "label rate {rate} far from 0.5");
    }

    /// Empirical x2 success rates per (label, sign(x1)) subpopulation.
    fn subpopulation_rates(table: &ClassTable) -> [f64; 4] {
        let x1 = table.feature_column("x1").expect("column exists");
        let x2 = table.feature_column("x2").expect("column exists");
        let mut hits = [0usize; 4];
        let mut totals = [0usize; 4];

        for (i, &label) in table.labels().iter().enumerate() {
            let idx = match (label, x1[i] < 0.0) {
                (1, true) => 0,
                (1, false) => 1,
                (0, true) => 2,
                _ => 3,
            };
            totals[idx] += 1;
            if x2[i] == 1.0 {
                hits[idx] += 1;
            }
        }

        let mut rates = [0.0; 4];
        for i in 0..4 {
            rates[i] = hits[i] as f64 / totals[i] as f64;
        }
        rates
    }

    #[test]
    fn test_no_signal_rates_converge_to_half() {
        let config = SimulationConfig::new(0.0, 0.0).expect("valid");
        let mut rng = StdRng::seed_from_u64(19);
        let table = generate(20_000, &config, &mut rng).expect("generates");

        for rate in subpopulation_rates(&table) {
            assert!((rate - 0.5).abs() < 0.03, "rate {rate} far from 0.5");
        }
    }

    #[test]
    fn test_weak_signal_rates_match_configured_offsets() {
        let config = SimulationConfig::new(0.1, 0.0).expect("valid");
        let mut rng = StdRng::seed_from_u64(23);
        let table = generate(20_000, &config, &mut rng).expect("generates");

        let rates = subpopulation_rates(&table);
        for (rate, expected) in rates.iter().zip([0.4, 0.4, 0.6, 0.6]) {
            assert!(
                (rate - expected).abs() < 0.03,
                "rate {rate} far from {expected}"
            );
        }
    }
}
