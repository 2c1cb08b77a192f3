//! Fitness evaluation for organisms.
//!
//! Evaluation is the only step that writes an organism's fitness. It may run
//! on a rayon worker pool; evaluators must therefore be pure and `Sync`, and
//! the resulting fitness values never depend on the executor used.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::schema::{Genome, Objective};

use super::error::{EvaluatorError, EvolutionError};
use super::organism::Organism;

/// Scores a genome. Higher is fitter.
pub trait FitnessEvaluator: Send + Sync {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluatorError>;
}

impl<F> FitnessEvaluator for F
where
    F: Fn(&Genome) -> f64 + Send + Sync,
{
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluatorError> {
        Ok(self(genome))
    }
}

/// Where fitness evaluations run.
pub struct Executor {
    pool: Option<ThreadPool>,
}

impl Executor {
    /// Evaluate in the calling thread, in population order.
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Evaluate on a dedicated worker pool.
    ///
    /// `workers = None` uses the available hardware concurrency.
    pub fn parallel(workers: Option<usize>) -> Result<Self, EvolutionError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("fitness-{i}"));
        if let Some(n) = workers {
            if n == 0 {
                return Err(EvolutionError::InvalidParameter(
                    "worker count must be at least 1".to_string(),
                ));
            }
            builder = builder.num_threads(n);
        }
        Ok(Self {
            pool: Some(builder.build()?),
        })
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("workers", &self.workers())
            .field("parallel", &self.is_parallel())
            .finish()
    }
}

/// Evaluate every organism whose fitness is unset.
///
/// Each pending organism is scored exactly once. `on_evaluated` receives the
/// running count of finished evaluations and may be called from worker
/// threads. The first evaluator error aborts the call.
pub fn evaluate_fitness<E, F>(
    organisms: &mut [Organism],
    evaluator: &E,
    executor: &Executor,
    on_evaluated: F,
) -> Result<usize, EvolutionError>
where
    E: FitnessEvaluator + ?Sized,
    F: Fn(usize) + Sync,
{
    let completed = AtomicUsize::new(0);
    let score = |organism: &mut Organism| -> Result<(), EvolutionError> {
        let fitness = evaluator
            .evaluate(organism.genome())
            .map_err(EvolutionError::Evaluator)?;
        organism.set_fitness(fitness);
        on_evaluated(completed.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(())
    };

    match &executor.pool {
        Some(pool) => pool.install(|| {
            organisms
                .par_iter_mut()
                .filter(|o| o.fitness().is_none())
                .try_for_each(score)
        })?,
        None => organisms
            .iter_mut()
            .filter(|o| o.fitness().is_none())
            .try_for_each(score)?,
    }

    Ok(completed.into_inner())
}

/// Error returned by the built-in objectives.
#[derive(Debug, thiserror::Error)]
pub enum ObjectiveError {
    #[error("Gene '{0}' is missing or not numeric")]
    NotNumeric(String),
    #[error("Denominator gene '{0}' is zero")]
    ZeroDenominator(String),
}

impl FitnessEvaluator for Objective {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluatorError> {
        let numeric = |name: &str| {
            genome
                .get_f64(name)
                .ok_or_else(|| ObjectiveError::NotNumeric(name.to_string()))
        };

        match self {
            Objective::Ratio {
                numerator,
                denominator,
            } => {
                let den = numeric(denominator.as_str())?;
                if den == 0.0 {
                    return Err(ObjectiveError::ZeroDenominator(denominator.clone()).into());
                }
                Ok(numeric(numerator.as_str())? / den)
            }
            Objective::Sum => Ok(genome.iter().filter_map(|(_, v)| v.as_f64()).sum()),
            Objective::Target { target } => {
                let mut squared = 0.0;
                for (name, wanted) in target {
                    let d = numeric(name.as_str())? - wanted;
                    squared += d * d;
                }
                Ok(1.0 / (1.0 + squared.sqrt()))
            }
        }
    }
}
