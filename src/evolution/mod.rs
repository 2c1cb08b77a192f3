//! Evolutionary search over named gene spaces.
//!
//! # Overview
//!
//! - **Gene space** (`gene_space`): the admissible values of every gene
//! - **Organisms** (`organism`): genomes with cached fitness, breeding and mutation
//! - **Fitness** (`fitness`): the evaluator trait and sequential/parallel executors
//! - **Selection** (`selection`): fitness-proportionate roulette wheel
//! - **Population** (`population`): the generational evolve loop
//! - **History** (`history`): per-generation fitness and the running best
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use natural_selection::evolution::{EvolveParams, GeneSpace, Population};
//! use natural_selection::schema::{GeneValue, Genome};
//!
//! let space = Arc::new(GeneSpace::new([
//!     ("x", (1..100).map(GeneValue::Int).collect()),
//!     ("y", (1..100).map(GeneValue::Int).collect()),
//! ])?);
//!
//! let fitness = |g: &Genome| g.get_f64("x").unwrap_or(0.0) / g.get_f64("y").unwrap_or(1.0);
//! let mut population = Population::builder(space, fitness)
//!     .size(20)
//!     .random_seed(42)
//!     .build()?;
//!
//! let history = population.evolve(&EvolveParams {
//!     generations: 10,
//!     ..Default::default()
//! })?;
//!
//! if let Some(best) = history.fittest() {
//!     println!("Best genome {} with fitness {:.3}", best.genome, best.fitness);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod fitness;
mod gene_space;
mod history;
mod organism;
mod population;
mod progress;
mod selection;

pub use error::{EvaluatorError, EvolutionError, InvalidFitness, ValidationError};
pub use fitness::{Executor, FitnessEvaluator, ObjectiveError, evaluate_fitness};
pub use gene_space::GeneSpace;
pub use history::{Fittest, GenerationRecord, GenerationStats, History};
pub use organism::Organism;
pub use population::{EvolveParams, Population, PopulationBuilder};
pub use progress::{Progress, ProgressCallback};
pub use selection::FitnessWheel;
