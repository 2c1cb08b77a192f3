//! Run configuration for the `natural-selection` binary.
//!
//! A configuration describes the gene space, the population, the evolve
//! parameters and a built-in objective. It is loaded from JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{GeneValue, Genome};
use crate::evolution::{EvolveParams, GeneSpace, ValidationError};

/// Top-level configuration of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Gene name to domain.
    pub genes: BTreeMap<String, DomainSpec>,
    /// Population settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Generational loop settings.
    #[serde(default)]
    pub evolve: EvolveConfig,
    /// Where fitness is evaluated.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Fitness function.
    #[serde(default)]
    pub objective: Objective,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            genes: BTreeMap::from([
                ("x".to_string(), DomainSpec::IntRange { start: 1, end: 100 }),
                ("y".to_string(), DomainSpec::IntRange { start: 1, end: 100 }),
            ]),
            population: PopulationConfig::default(),
            evolve: EvolveConfig::default(),
            execution: ExecutionConfig::default(),
            objective: Objective::default(),
            random_seed: None,
        }
    }
}

/// Upper bound on the number of values a single domain may expand to.
pub const MAX_DOMAIN_LEN: usize = 1 << 20;

/// Admissible values of one gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainSpec {
    /// Integers in `start..end`.
    IntRange { start: i64, end: i64 },
    /// `steps` evenly spaced floats from `start` to `end`, both included.
    FloatGrid { start: f64, end: f64, steps: usize },
    /// An explicit list of values.
    Values { values: Vec<GeneValue> },
}

impl DomainSpec {
    /// Number of values the domain expands to, `None` if it overflows `usize`.
    pub fn len(&self) -> Option<usize> {
        match self {
            DomainSpec::IntRange { start, end } if start >= end => Some(0),
            DomainSpec::IntRange { start, end } => end
                .checked_sub(*start)
                .and_then(|n| usize::try_from(n).ok()),
            DomainSpec::FloatGrid { steps, .. } => Some(*steps),
            DomainSpec::Values { values } => Some(values.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Expand into the list of admissible values.
    pub fn values(&self) -> Vec<GeneValue> {
        match self {
            DomainSpec::IntRange { start, end } => (*start..*end).map(GeneValue::Int).collect(),
            DomainSpec::FloatGrid { start, end, steps } => match steps {
                0 => Vec::new(),
                1 => vec![GeneValue::Float(*start)],
                n => {
                    let step = (end - start) / (n - 1) as f64;
                    (0..*n)
                        .map(|i| GeneValue::Float(start + step * i as f64))
                        .collect()
                }
            },
            DomainSpec::Values { values } => values.clone(),
        }
    }
}

/// Population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Organisms per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Fixed genome for every organism of generation 0.
    #[serde(default)]
    pub initial_genome: Option<Genome>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            initial_genome: None,
        }
    }
}

fn default_population_size() -> usize {
    50
}

/// Generational loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolveConfig {
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Share of the population drawn as breeders.
    #[serde(default = "default_breeding_fraction")]
    pub breeding_fraction: f64,
    /// Probability that a child is mutated.
    #[serde(default = "default_mutation_fraction")]
    pub mutation_fraction: f64,
    /// Per-gene redraw probability of a mutated child.
    #[serde(default)]
    pub gene_mutation_rate: Option<f64>,
}

impl Default for EvolveConfig {
    fn default() -> Self {
        Self {
            generations: default_generations(),
            breeding_fraction: default_breeding_fraction(),
            mutation_fraction: default_mutation_fraction(),
            gene_mutation_rate: None,
        }
    }
}

fn default_generations() -> usize {
    10
}
fn default_breeding_fraction() -> f64 {
    0.2
}
fn default_mutation_fraction() -> f64 {
    0.5
}

/// Fitness evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Worker threads; defaults to the available hardware concurrency.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            workers: None,
        }
    }
}

fn default_parallel() -> bool {
    true
}

/// Built-in fitness functions available from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Objective {
    /// `numerator / denominator`.
    Ratio {
        numerator: String,
        denominator: String,
    },
    /// Sum of all numeric genes.
    Sum,
    /// `1 / (1 + distance)` to the target values.
    Target { target: BTreeMap<String, f64> },
}

impl Default for Objective {
    fn default() -> Self {
        Self::Ratio {
            numerator: "x".to_string(),
            denominator: "y".to_string(),
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid domain for gene '{gene}': {reason}")]
    InvalidDomain { gene: String, reason: String },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid gene space: {0}")]
    Validation(#[from] ValidationError),
}

impl EvolutionConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_domains()?;

        if self.population.size == 0 {
            return Err(ConfigError::InvalidParameter(
                "population size must be at least 1".to_string(),
            ));
        }
        if self.execution.workers == Some(0) {
            return Err(ConfigError::InvalidParameter(
                "workers must be at least 1".to_string(),
            ));
        }

        let check_fraction = |value: f64, name: &str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidParameter(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };
        check_fraction(self.evolve.breeding_fraction, "breeding_fraction")?;
        check_fraction(self.evolve.mutation_fraction, "mutation_fraction")?;
        if let Some(rate) = self.evolve.gene_mutation_rate {
            check_fraction(rate, "gene_mutation_rate")?;
        }

        if let Some(genome) = &self.population.initial_genome {
            self.gene_space()?.validate(genome)?;
        }
        Ok(())
    }

    /// Check every gene domain is non-empty, finite and at most
    /// [`MAX_DOMAIN_LEN`] values long.
    pub fn validate_domains(&self) -> Result<(), ConfigError> {
        for (gene, domain) in &self.genes {
            let invalid = |reason: String| ConfigError::InvalidDomain {
                gene: gene.clone(),
                reason,
            };
            match domain {
                DomainSpec::IntRange { start, end } if start >= end => {
                    return Err(invalid(format!("empty range {start}..{end}")));
                }
                DomainSpec::FloatGrid { start, end, steps } => {
                    if *steps == 0 {
                        return Err(invalid("steps must be positive".to_string()));
                    }
                    if !start.is_finite() || !end.is_finite() {
                        return Err(invalid("bounds must be finite".to_string()));
                    }
                }
                DomainSpec::Values { values } if values.is_empty() => {
                    return Err(invalid("no values".to_string()));
                }
                _ => {}
            }
            match domain.len() {
                Some(len) if len <= MAX_DOMAIN_LEN => {}
                _ => {
                    return Err(invalid(format!("more than {MAX_DOMAIN_LEN} values")));
                }
            }
        }
        Ok(())
    }

    /// Build the gene space described by `genes`.
    pub fn gene_space(&self) -> Result<GeneSpace, ConfigError> {
        self.validate_domains()?;
        let space = GeneSpace::new(
            self.genes
                .iter()
                .map(|(name, domain)| (name.clone(), domain.values())),
        )?;
        Ok(space)
    }

    /// Evolve parameters for the population.
    pub fn evolve_params(&self) -> EvolveParams {
        EvolveParams {
            generations: self.evolve.generations,
            breeding_fraction: self.evolve.breeding_fraction,
            mutation_fraction: self.evolve.mutation_fraction,
            gene_mutation_rate: self.evolve.gene_mutation_rate,
            parallel: self.execution.parallel,
            workers: self.execution.workers,
        }
    }
}
