//! Natural Selection - Generic evolutionary optimisation over named gene spaces.
//!
//! A gene space maps gene names to their admissible values. A population of
//! organisms drawn from it is evolved generation by generation: fitness is
//! evaluated by a caller-supplied function (optionally on a worker pool),
//! breeders are sampled proportionally to fitness, and their children, with
//! occasional mutation, form the next generation. Every generation is
//! recorded in a [`History`](evolution::History) together with the best
//! genome found so far.
//!
//! # Architecture
//!
//! - `schema`: Gene values, genomes and JSON run configuration
//! - `evolution`: Gene space, organisms, selection and the evolve loop
//!
//! See the [`evolution`] module for a complete example.

pub mod evolution;
pub mod schema;

// Re-export commonly used types
pub use evolution::{EvolveParams, EvolutionError, GeneSpace, History, Population};
pub use schema::{EvolutionConfig, GeneValue, Genome};
