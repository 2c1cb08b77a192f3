//! Append-only record of every evaluated generation.

use serde::{Deserialize, Serialize};

use crate::schema::Genome;

use super::error::EvolutionError;

/// Genomes and fitness values of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub genomes: Vec<Genome>,
    pub fitnesses: Vec<f64>,
}

/// Best genome seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fittest {
    pub genome: Genome,
    pub fitness: f64,
    /// Generation in which the genome was first recorded.
    pub generation: usize,
}

/// Summary statistics of one generation's fitness values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Fitness history of an evolution run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<GenerationRecord>,
    fittest: Option<Fittest>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generation and update the running best.
    ///
    /// The running best only changes on a strictly greater fitness, so ties
    /// keep the genome seen first. NaN never becomes the best.
    pub fn add_entry(
        &mut self,
        genomes: Vec<Genome>,
        fitnesses: Vec<f64>,
    ) -> Result<&mut Self, EvolutionError> {
        if genomes.len() != fitnesses.len() {
            return Err(EvolutionError::HistoryMismatch {
                genomes: genomes.len(),
                fitnesses: fitnesses.len(),
            });
        }

        let generation = self.entries.len();
        let mut best = self.fittest.as_ref().map(|f| f.fitness);
        let mut improved = None;
        for (i, &fitness) in fitnesses.iter().enumerate() {
            let better = match best {
                Some(current) => fitness > current,
                None => !fitness.is_nan(),
            };
            if better {
                best = Some(fitness);
                improved = Some(i);
            }
        }
        if let Some(i) = improved {
            self.fittest = Some(Fittest {
                genome: genomes[i].clone(),
                fitness: fitnesses[i],
                generation,
            });
        }

        self.entries.push(GenerationRecord { genomes, fitnesses });
        Ok(self)
    }

    pub fn entries(&self) -> &[GenerationRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fittest(&self) -> Option<&Fittest> {
        self.fittest.as_ref()
    }

    /// Fitness values per generation, for plotting.
    pub fn fitnesses(&self) -> impl Iterator<Item = &[f64]> {
        self.entries.iter().map(|e| e.fitnesses.as_slice())
    }

    /// Mean, standard deviation and range per generation.
    ///
    /// Generations without finite fitness values yield `None`.
    pub fn generation_stats(&self) -> Vec<Option<GenerationStats>> {
        self.fitnesses().map(GenerationStats::from_values).collect()
    }
}

impl GenerationStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}
