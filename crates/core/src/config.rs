//! Run configuration for the ALNS optimization loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weights combining a log's bookkeeping into a single score:
/// `volume_used * usage + saw_dust * dust + volume_unused * unused`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreWeights {
    /// Reward per unit of board area placed.
    pub usage: f64,
    /// Penalty (usually negative) per unit of kerf loss.
    pub dust: f64,
    /// Penalty (usually negative or zero) per unit of unused area.
    pub unused: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            usage: 1.0,
            dust: -0.0001,
            unused: 0.0,
        }
    }
}

/// Configuration for a single optimization run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunConfig {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Iterations at the start of the run that only repair and tuck, to
    /// saturate an initially sparse layout.
    pub fill_up_iterations: usize,
    /// Initial temperature.
    pub starting_temperature: f64,
    /// Geometric decay factor applied on non-improving iterations (< 1).
    pub temperature_sensitivity: f64,
    /// Destroy-operator invocations per main-phase iteration at full
    /// temperature.
    pub destroy_degree: usize,
    /// Repair-operator invocations per iteration at full temperature.
    pub repair_degree: usize,
    /// Lower bound on the temperature-modulated destroy degree.
    pub min_destroy_degree: usize,
    /// Lower bound on the temperature-modulated repair degree.
    pub min_repair_degree: usize,
    /// Retry budget inside a single operator invocation.
    pub max_attempts: usize,
    /// Margin a clone's score must gain over the live log to be accepted;
    /// damps oscillation around equal-score states.
    pub acceptance_tolerance: f64,
    /// Score combination weights.
    pub score_weights: ScoreWeights,
    /// Performance multiplier applied to a method after a successful call.
    pub method_success_multiplier: f64,
    /// Performance multiplier applied after a failed call (< 1).
    pub method_failure_multiplier: f64,
    /// Scale the multipliers by the method's running success ratio.
    pub scale_by_success_ratio: bool,
    /// Floor for method performance, keeps every operator selectable.
    pub min_method_performance: f64,
    /// RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            fill_up_iterations: 5,
            starting_temperature: 100.0,
            temperature_sensitivity: 0.98,
            destroy_degree: 3,
            repair_degree: 8,
            min_destroy_degree: 1,
            min_repair_degree: 5,
            max_attempts: 15,
            acceptance_tolerance: 1e-4,
            score_weights: ScoreWeights::default(),
            method_success_multiplier: 1.1,
            method_failure_multiplier: 0.91,
            scale_by_success_ratio: false,
            min_method_performance: 0.05,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the warm-up length.
    pub fn with_fill_up_iterations(mut self, iterations: usize) -> Self {
        self.fill_up_iterations = iterations;
        self
    }

    /// Sets the temperature schedule.
    pub fn with_temperature(mut self, starting: f64, sensitivity: f64) -> Self {
        self.starting_temperature = starting.max(0.0);
        self.temperature_sensitivity = sensitivity.clamp(0.0, 1.0);
        self
    }

    /// Sets the destroy/repair degrees.
    pub fn with_degrees(mut self, destroy: usize, repair: usize) -> Self {
        self.destroy_degree = destroy.max(1);
        self.repair_degree = repair.max(1);
        self
    }

    /// Sets the degree floors.
    pub fn with_min_degrees(mut self, destroy: usize, repair: usize) -> Self {
        self.min_destroy_degree = destroy;
        self.min_repair_degree = repair;
        self
    }

    /// Sets the per-operator retry budget.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the acceptance margin.
    pub fn with_acceptance_tolerance(mut self, tolerance: f64) -> Self {
        self.acceptance_tolerance = tolerance;
        self
    }

    /// Sets the score weights.
    pub fn with_score_weights(mut self, weights: ScoreWeights) -> Self {
        self.score_weights = weights;
        self
    }

    /// Sets the method performance multipliers.
    pub fn with_method_multipliers(mut self, success: f64, failure: f64) -> Self {
        self.method_success_multiplier = success.max(0.0);
        self.method_failure_multiplier = failure.max(0.0);
        self
    }

    /// Enables scaling the multipliers by the running success ratio.
    pub fn with_success_ratio_scaling(mut self, enabled: bool) -> Self {
        self.scale_by_success_ratio = enabled;
        self
    }

    /// Sets the RNG seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Degree for the current temperature: scales linearly with
    /// `temperature / starting_temperature`, floored at `minimum`.
    pub fn degree_at(&self, base: usize, minimum: usize, temperature: f64) -> usize {
        if self.starting_temperature <= 0.0 {
            return minimum.max(1);
        }
        let scaled = (base as f64 * (temperature / self.starting_temperature)).ceil();
        (scaled.max(0.0) as usize).max(minimum).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_parameters() {
        let config = RunConfig::default();
        assert_eq!(config.max_iterations, 200);
        assert_eq!(config.fill_up_iterations, 5);
        assert!((config.starting_temperature - 100.0).abs() < 1e-9);
        assert!((config.temperature_sensitivity - 0.98).abs() < 1e-9);
        assert_eq!(config.max_attempts, 15);
        assert!((config.score_weights.usage - 1.0).abs() < 1e-9);
        assert!((config.score_weights.dust + 0.0001).abs() < 1e-9);
        assert_eq!(config.score_weights.unused, 0.0);
    }

    #[test]
    fn test_builder() {
        let config = RunConfig::new()
            .with_max_iterations(50)
            .with_temperature(80.0, 0.99)
            .with_degrees(4, 10)
            .with_min_degrees(2, 6)
            .with_max_attempts(7)
            .with_seed(42);

        assert_eq!(config.max_iterations, 50);
        assert!((config.starting_temperature - 80.0).abs() < 1e-9);
        assert!((config.temperature_sensitivity - 0.99).abs() < 1e-9);
        assert_eq!(config.destroy_degree, 4);
        assert_eq!(config.repair_degree, 10);
        assert_eq!(config.min_destroy_degree, 2);
        assert_eq!(config.min_repair_degree, 6);
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_degree_modulation() {
        let config = RunConfig::default().with_degrees(4, 8).with_min_degrees(1, 5);

        // Full temperature: full degree.
        assert_eq!(config.degree_at(4, 1, 100.0), 4);
        // Half temperature: half degree.
        assert_eq!(config.degree_at(4, 1, 50.0), 2);
        // Near zero: floored at the minimum.
        assert_eq!(config.degree_at(4, 1, 0.1), 1);
        assert_eq!(config.degree_at(8, 5, 0.1), 5);
    }
}
