//! Adaptive operator selection.
//!
//! Operators are grouped by goal (destroy, repair, tuck) into a
//! [`MethodPool`]. Each pool member carries a performance value that grows on
//! success and decays on failure; selection is roulette-wheel over the
//! normalized performances, so operators that keep delivering get called more
//! often without ever starving the rest (performance is floored).

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use sawmill_core::config::RunConfig;
use sawmill_core::metrics::MethodRecord;

/// Destroy operator tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOp {
    /// Remove one shape, biased toward odd-shaped pieces.
    Random,
    /// Remove a spatial cluster around a seed shape.
    Cluster,
    /// Clear out the least occupied sampled rectangle.
    Subspace,
}

/// Repair operator tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOp {
    /// Grow a rectangle out of a random free point and repack it.
    RandomPointExpansion,
    /// Replace one shape with a strictly larger catalog type.
    SingleExtension,
    /// Pack the free rectangle next to a random shape's corner.
    BuddyExtension,
}

/// One operator and its adaptation state.
#[derive(Debug, Clone)]
struct Method<T> {
    op: T,
    name: &'static str,
    performance: f64,
    probability: f64,
    times_called: u64,
    times_attempted: u64,
    times_succeeded: u64,
    elapsed: Duration,
}

/// A goal group of operators sharing one selection distribution.
#[derive(Debug, Clone)]
pub struct MethodPool<T> {
    methods: Vec<Method<T>>,
}

impl<T: Copy + PartialEq> MethodPool<T> {
    /// Builds a pool with uniform initial probabilities.
    pub fn new(entries: Vec<(T, &'static str)>) -> Self {
        let n = entries.len().max(1);
        let methods = entries
            .into_iter()
            .map(|(op, name)| Method {
                op,
                name,
                performance: 1.0,
                probability: 1.0 / n as f64,
                times_called: 0,
                times_attempted: 0,
                times_succeeded: 0,
                elapsed: Duration::ZERO,
            })
            .collect();
        Self { methods }
    }

    /// Roulette-wheel selection over the current probabilities.
    pub fn select(&self, rng: &mut StdRng) -> T {
        let total: f64 = self.methods.iter().map(|m| m.probability).sum();
        let mut target = rng.gen_range(0.0..total.max(f64::MIN_POSITIVE));
        for method in &self.methods {
            if target < method.probability {
                return method.op;
            }
            target -= method.probability;
        }
        self.methods[self.methods.len() - 1].op
    }

    /// Books one invocation outcome: counters, then the performance
    /// multiplier from the config (optionally scaled by the operator's
    /// running success ratio), floored so no operator starves.
    pub fn record(
        &mut self,
        op: T,
        attempts: u64,
        succeeded: bool,
        elapsed: Duration,
        config: &RunConfig,
    ) {
        let Some(method) = self.methods.iter_mut().find(|m| m.op == op) else {
            return;
        };
        method.times_called += 1;
        method.times_attempted += attempts;
        method.elapsed += elapsed;
        if succeeded {
            method.times_succeeded += 1;
        }

        let mut multiplier = if succeeded {
            config.method_success_multiplier
        } else {
            config.method_failure_multiplier
        };
        if config.scale_by_success_ratio && method.times_called > 0 {
            let ratio = method.times_succeeded as f64 / method.times_called as f64;
            multiplier = 1.0 + (multiplier - 1.0) * ratio;
        }
        method.performance = (method.performance * multiplier).max(config.min_method_performance);
        log::debug!(
            "method {}: success={succeeded}, performance now {:.4}",
            method.name,
            method.performance
        );
    }

    /// Renormalizes probabilities to sum to 1 across the pool.
    pub fn renormalize(&mut self) {
        let total: f64 = self.methods.iter().map(|m| m.performance).sum();
        if total <= 0.0 {
            let uniform = 1.0 / self.methods.len().max(1) as f64;
            for method in &mut self.methods {
                method.probability = uniform;
            }
            return;
        }
        for method in &mut self.methods {
            method.probability = method.performance / total;
        }
    }

    /// Report rows for the current iteration.
    pub fn snapshot(&self, iteration: usize) -> Vec<MethodRecord> {
        self.methods
            .iter()
            .map(|m| MethodRecord {
                iteration,
                method: m.name.to_string(),
                probability: m.probability,
                times_called: m.times_called,
                times_attempted: m.times_attempted,
                times_succeeded: m.times_succeeded,
                elapsed_ms: m.elapsed.as_millis() as u64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn pool() -> MethodPool<DestroyOp> {
        MethodPool::new(vec![
            (DestroyOp::Random, "random_destroy"),
            (DestroyOp::Cluster, "cluster_destroy"),
            (DestroyOp::Subspace, "subspace_destroy"),
        ])
    }

    #[test]
    fn test_initial_probabilities_uniform() {
        let pool = pool();
        let records = pool.snapshot(0);
        assert_eq!(records.len(), 3);
        for r in &records {
            assert!((r.probability - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_success_raises_probability() {
        let config = RunConfig::default();
        let mut pool = pool();
        for _ in 0..5 {
            pool.record(DestroyOp::Random, 1, true, Duration::ZERO, &config);
            pool.record(DestroyOp::Cluster, 1, false, Duration::ZERO, &config);
            pool.record(DestroyOp::Subspace, 1, false, Duration::ZERO, &config);
        }
        pool.renormalize();
        let records = pool.snapshot(0);
        let total: f64 = records.iter().map(|r| r.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(records[0].probability > records[1].probability);
        assert_eq!(records[0].times_succeeded, 5);
        assert_eq!(records[1].times_succeeded, 0);
    }

    #[test]
    fn test_performance_floor_keeps_operator_selectable() {
        let config = RunConfig::default();
        let mut pool = pool();
        for _ in 0..200 {
            pool.record(DestroyOp::Cluster, 1, false, Duration::ZERO, &config);
        }
        pool.renormalize();
        let records = pool.snapshot(0);
        assert!(records[1].probability > 0.0);
    }

    #[test]
    fn test_select_returns_pool_member() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let op = pool.select(&mut rng);
            assert!(matches!(
                op,
                DestroyOp::Random | DestroyOp::Cluster | DestroyOp::Subspace
            ));
        }
    }
}
