//! The ALNS driver: log selection, the destroy/repair/tuck batch on a clone,
//! improvement-only acceptance and the temperature schedule.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sawmill_core::config::{RunConfig, ScoreWeights};
use sawmill_core::error::Result;
use sawmill_core::log::Log;
use sawmill_core::metrics::{IterationRecord, PlacementRecord, RunReport};
use sawmill_core::shape::{Catalog, IdGen};

use crate::constructor;
use crate::destroy;
use crate::methods::{DestroyOp, MethodPool, RepairOp};
use crate::repair;
use crate::tuck::{self, TuckDirection};

/// Owns the run session: catalog, logs, configuration, id allocation and the
/// RNG.
///
/// Each iteration works on a clone of one selected log; the clone replaces
/// the live log only when its score improves by at least the configured
/// tolerance, so committed states only ever get better.
pub struct Optimizer {
    catalog: Catalog,
    logs: Vec<Log>,
    config: RunConfig,
    ids: IdGen,
    rng: StdRng,
}

impl Optimizer {
    /// Creates an optimizer over the given logs. The RNG is seeded from the
    /// config, or from entropy when no seed is set.
    pub fn new(catalog: Catalog, logs: Vec<Log>, config: RunConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            logs,
            config,
            ids: IdGen::new(),
            rng,
        }
    }

    /// The current committed logs.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Consumes the optimizer, yielding the final logs.
    pub fn into_logs(self) -> Vec<Log> {
        self.logs
    }

    /// Greedily constructs every still-empty log and scores all logs.
    /// Idempotent; `run` calls it first.
    pub fn seed(&mut self) -> Result<()> {
        for log in &mut self.logs {
            if log.is_empty() {
                constructor::greedy_construct(log, &self.catalog, &mut self.ids)?;
            }
            log.score = score(log, &self.config.score_weights);
            log::info!(
                "log {}: seeded at efficiency {:.3}, score {:.1}",
                log.id(),
                log.efficiency(),
                log.score
            );
        }
        Ok(())
    }

    /// Runs the full optimization: greedy construction of every empty log,
    /// then the ALNS loop until the iteration budget is exhausted or the
    /// temperature reaches zero.
    pub fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new();

        self.seed()?;

        // Operator pools live for one run; their statistics reset with it.
        let mut destroy_pool = MethodPool::new(vec![
            (DestroyOp::Random, "random_destroy"),
            (DestroyOp::Cluster, "cluster_destroy"),
            (DestroyOp::Subspace, "subspace_destroy"),
        ]);
        let mut repair_pool = MethodPool::new(vec![
            (RepairOp::RandomPointExpansion, "random_point_expansion"),
            (RepairOp::SingleExtension, "single_extension"),
            (RepairOp::BuddyExtension, "buddy_extension"),
        ]);
        let mut tuck_pool = MethodPool::new(vec![
            (TuckDirection::Center, "tuck_center"),
            (TuckDirection::Left, "tuck_left"),
            (TuckDirection::Right, "tuck_right"),
            (TuckDirection::Up, "tuck_up"),
            (TuckDirection::Down, "tuck_down"),
        ]);

        let mut temperature = self.config.starting_temperature;
        let mut iterations_run = 0;

        for iteration in 0..self.config.max_iterations {
            if temperature <= 0.0 || self.logs.is_empty() {
                break;
            }
            iterations_run = iteration + 1;

            let index = select_log(&self.logs, &mut self.rng);
            let mut clone = self.logs[index].clone();

            // Warm-up iterations only add material; destroying a sparse
            // fresh layout would just churn.
            if iteration >= self.config.fill_up_iterations {
                let degree = self.config.degree_at(
                    self.config.destroy_degree,
                    self.config.min_destroy_degree,
                    temperature,
                );
                for _ in 0..degree {
                    let op = destroy_pool.select(&mut self.rng);
                    let clock = Instant::now();
                    let (attempts, success) = run_destroy(
                        op,
                        &mut clone,
                        &self.catalog,
                        &self.config,
                        &mut self.rng,
                    )?;
                    destroy_pool.record(op, attempts, success, clock.elapsed(), &self.config);
                }
            }

            let degree = self.config.degree_at(
                self.config.repair_degree,
                self.config.min_repair_degree,
                temperature,
            );
            for _ in 0..degree {
                let op = repair_pool.select(&mut self.rng);
                let clock = Instant::now();
                let (attempts, success) = run_repair(
                    op,
                    &mut clone,
                    &self.catalog,
                    &self.config,
                    &mut self.ids,
                    &mut self.rng,
                )?;
                repair_pool.record(op, attempts, success, clock.elapsed(), &self.config);

                let direction = tuck_pool.select(&mut self.rng);
                let clock = Instant::now();
                let moved = tuck::tuck(&mut clone, direction, &mut self.rng)?;
                tuck_pool.record(direction, 1, moved, clock.elapsed(), &self.config);
            }

            let old_score = self.logs[index].score;
            let new_score = score(&clone, &self.config.score_weights);
            clone.score = new_score;

            if new_score >= old_score + self.config.acceptance_tolerance {
                clone.is_feasible()?;
                let delta = new_score - old_score;
                log::info!(
                    "iteration {iteration}: accepted log {} at score {new_score:.1} (+{delta:.1})",
                    clone.id()
                );
                self.logs[index] = clone;
                if new_score.abs() > f64::EPSILON {
                    temperature *= 1.0 + delta / new_score;
                }
            } else {
                temperature *= self.config.temperature_sensitivity;
            }

            destroy_pool.renormalize();
            repair_pool.renormalize();
            tuck_pool.renormalize();
            report.methods.extend(destroy_pool.snapshot(iteration));
            report.methods.extend(repair_pool.snapshot(iteration));
            report.methods.extend(tuck_pool.snapshot(iteration));
            for log in &self.logs {
                report.iterations.push(IterationRecord {
                    iteration,
                    log_id: log.id(),
                    score: log.score,
                    saw_dust: log.saw_dust(),
                    volume_used: log.volume_used(),
                    efficiency: log.efficiency(),
                });
            }
        }

        for log in &self.logs {
            for shape in log.shapes() {
                report.placements.push(PlacementRecord {
                    log_id: log.id(),
                    shape_type_id: shape.type_id,
                    x: shape.x,
                    y: shape.y,
                });
            }
        }
        report.iterations_run = iterations_run;
        report.final_temperature = temperature;
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "run finished after {iterations_run} iterations in {}ms, final temperature {temperature:.2}",
            report.elapsed_ms
        );
        Ok(report)
    }
}

/// Invokes one destroy operator with its internal retry budget.
fn run_destroy(
    op: DestroyOp,
    clone: &mut Log,
    catalog: &Catalog,
    config: &RunConfig,
    rng: &mut StdRng,
) -> Result<(u64, bool)> {
    for attempt in 1..=config.max_attempts {
        let success = match op {
            DestroyOp::Random => destroy::random_destroy(clone, rng),
            DestroyOp::Cluster => destroy::cluster_destroy(clone, catalog, rng),
            DestroyOp::Subspace => destroy::subspace_destroy(clone, catalog, rng)?,
        };
        if success {
            return Ok((attempt as u64, true));
        }
    }
    Ok((config.max_attempts as u64, false))
}

/// Invokes one repair operator with its internal retry budget.
fn run_repair(
    op: RepairOp,
    clone: &mut Log,
    catalog: &Catalog,
    config: &RunConfig,
    ids: &mut IdGen,
    rng: &mut StdRng,
) -> Result<(u64, bool)> {
    for attempt in 1..=config.max_attempts {
        let success = match op {
            RepairOp::RandomPointExpansion => {
                repair::random_point_expansion(clone, catalog, ids, rng, config.max_attempts)?
            }
            RepairOp::SingleExtension => repair::single_extension(clone, catalog, ids, rng)?,
            RepairOp::BuddyExtension => repair::buddy_extension(clone, catalog, ids, rng)?,
        };
        if success {
            return Ok((attempt as u64, true));
        }
    }
    Ok((config.max_attempts as u64, false))
}

/// Combined log score under the configured weights.
fn score(log: &Log, weights: &ScoreWeights) -> f64 {
    log.volume_used() * weights.usage
        + log.saw_dust() * weights.dust
        + log.volume_unused() * weights.unused
}

/// Roulette selection over the logs' relative inefficiency.
fn select_log(logs: &[Log], rng: &mut StdRng) -> usize {
    let total: f64 = logs.iter().map(Log::selection_weight).sum();
    if total <= 0.0 {
        return rng.gen_range(0..logs.len());
    }
    let mut target = rng.gen_range(0.0..total);
    for (index, log) in logs.iter().enumerate() {
        if target < log.selection_weight() {
            return index;
        }
        target -= log.selection_weight();
    }
    logs.len() - 1
}
