//! Gene space: the schema of admissible values for each named gene.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::prelude::*;

use crate::schema::{GeneValue, Genome};

use super::error::ValidationError;
use super::organism::Organism;

/// Immutable mapping from gene name to its non-empty domain of values.
///
/// Organisms keep an `Arc` to the gene space they were created from; two
/// organisms are compatible for breeding only when they share the same
/// instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneSpace {
    genes: BTreeMap<String, Vec<GeneValue>>,
}

impl GeneSpace {
    /// Create a gene space, rejecting empty domains and repeated gene names.
    pub fn new<I, K>(genes: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Vec<GeneValue>)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, domain) in genes {
            let name = name.into();
            if domain.is_empty() {
                return Err(ValidationError::EmptyDomain { gene: name });
            }
            if map.contains_key(&name) {
                return Err(ValidationError::DuplicateGene { gene: name });
            }
            map.insert(name, domain);
        }
        Ok(Self { genes: map })
    }

    /// Gene names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(String::as_str)
    }

    pub fn domain(&self, gene: &str) -> Option<&[GeneValue]> {
        self.genes.get(gene).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Create `count` organisms with every gene drawn uniformly from its domain.
    pub fn create_organisms<R>(self: &Arc<Self>, count: usize, rng: &mut R) -> Vec<Organism>
    where
        R: Rng + ?Sized,
    {
        self.create_organisms_with(count, rng, |_| {})
    }

    /// Like [`create_organisms`](Self::create_organisms), reporting the number
    /// created so far after each organism.
    pub fn create_organisms_with<R, F>(
        self: &Arc<Self>,
        count: usize,
        rng: &mut R,
        mut on_created: F,
    ) -> Vec<Organism>
    where
        R: Rng + ?Sized,
        F: FnMut(usize),
    {
        (0..count)
            .map(|i| {
                let organism = Organism::new_unchecked(Arc::clone(self), self.random_genome(rng));
                on_created(i + 1);
                organism
            })
            .collect()
    }

    /// Create an organism from a fixed genome after validating it.
    pub fn construct_with_genome(
        self: &Arc<Self>,
        genome: Genome,
    ) -> Result<Organism, ValidationError> {
        self.validate(&genome)?;
        Ok(Organism::new_unchecked(Arc::clone(self), genome))
    }

    /// Check that the genome has exactly this space's genes with admissible values.
    pub fn validate(&self, genome: &Genome) -> Result<(), ValidationError> {
        if let Some(unknown) = genome.names().find(|name| !self.genes.contains_key(*name)) {
            return Err(ValidationError::UnknownGene {
                gene: unknown.to_string(),
            });
        }
        for (name, domain) in &self.genes {
            let value = genome.get(name).ok_or_else(|| ValidationError::MissingGene {
                gene: name.clone(),
            })?;
            if !domain.contains(value) {
                return Err(ValidationError::ValueOutOfDomain {
                    gene: name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Derive a new gene space with `remove` dropped and `add` inserted.
    ///
    /// Added genes replace existing genes of the same name. The result is a
    /// separate gene space; organisms of the two cannot be bred together.
    pub fn derive<I, K>(&self, add: I, remove: &[&str]) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Vec<GeneValue>)>,
        K: Into<String>,
    {
        let added: Vec<(String, Vec<GeneValue>)> =
            add.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let kept: Vec<(String, Vec<GeneValue>)> = self
            .genes
            .iter()
            .filter(|(name, _)| {
                !remove.contains(&name.as_str()) && !added.iter().any(|(new, _)| new == *name)
            })
            .map(|(name, domain)| (name.clone(), domain.clone()))
            .collect();
        Self::new(kept.into_iter().chain(added))
    }

    pub(crate) fn random_genome<R>(&self, rng: &mut R) -> Genome
    where
        R: Rng + ?Sized,
    {
        let mut genome = Genome::new();
        for (name, domain) in &self.genes {
            genome.insert(name.clone(), random_value(domain, rng));
        }
        genome
    }

    pub(crate) fn domains(&self) -> impl Iterator<Item = (&str, &[GeneValue])> {
        self.genes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Uniform draw from a domain. Domains are non-empty by construction.
pub(crate) fn random_value<R>(domain: &[GeneValue], rng: &mut R) -> GeneValue
where
    R: Rng + ?Sized,
{
    domain[rng.gen_range(0..domain.len())].clone()
}
