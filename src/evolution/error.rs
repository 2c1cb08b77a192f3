//! Error types for evolutionary search.

use crate::schema::GeneValue;

/// Boxed error returned by caller-supplied fitness evaluators.
pub type EvaluatorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A genome (or gene space definition) does not match its schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Gene '{gene}' has an empty domain")]
    EmptyDomain { gene: String },
    #[error("Gene '{gene}' is defined more than once")]
    DuplicateGene { gene: String },
    #[error("Genome is missing gene '{gene}'")]
    MissingGene { gene: String },
    #[error("Genome has gene '{gene}' which is not part of the gene space")]
    UnknownGene { gene: String },
    #[error("Value {value} is not in the domain of gene '{gene}'")]
    ValueOutOfDomain { gene: String, value: GeneValue },
}

/// Fitness values that cannot be normalised into selection probabilities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidFitness {
    #[error("Organism {index} has not been evaluated")]
    Unevaluated { index: usize },
    #[error("Organism {index} has non-finite fitness {value}")]
    NonFinite { index: usize, value: f64 },
    #[error("Organism {index} has negative fitness {value}")]
    Negative { index: usize, value: f64 },
    #[error("Total fitness {total} must be positive")]
    NonPositiveTotal { total: f64 },
}

/// Errors raised by gene spaces, organisms and populations.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Genome validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("The two organisms are not of the same gene space")]
    IncompatibleGenus,
    #[error("Invalid fitness: {0}")]
    InvalidFitness(#[from] InvalidFitness),
    #[error("Fitness evaluator failed: {0}")]
    Evaluator(#[source] EvaluatorError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("History entry has {genomes} genomes but {fitnesses} fitness values")]
    HistoryMismatch { genomes: usize, fitnesses: usize },
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
