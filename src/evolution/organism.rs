//! Organisms: candidate solutions of a gene space.

use std::sync::Arc;

use rand::prelude::*;

use crate::schema::Genome;

use super::error::EvolutionError;
use super::gene_space::{GeneSpace, random_value};

/// One candidate solution: a genome plus its cached fitness.
///
/// Fitness is unset until the population evaluates the organism and is
/// cleared again whenever the genome changes.
#[derive(Debug, Clone)]
pub struct Organism {
    genus: Arc<GeneSpace>,
    genome: Genome,
    fitness: Option<f64>,
}

impl Organism {
    /// Caller guarantees `genome` is valid for `genus`.
    pub(crate) fn new_unchecked(genus: Arc<GeneSpace>, genome: Genome) -> Self {
        Self {
            genus,
            genome,
            fitness: None,
        }
    }

    pub fn genus(&self) -> &Arc<GeneSpace> {
        &self.genus
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Breed with another organism of the same gene space.
    ///
    /// Each gene of the child is taken from one of the two parents with
    /// equal probability. Parents are left untouched.
    pub fn breed<R>(&self, other: &Organism, rng: &mut R) -> Result<Organism, EvolutionError>
    where
        R: Rng + ?Sized,
    {
        if !Arc::ptr_eq(&self.genus, &other.genus) {
            return Err(EvolutionError::IncompatibleGenus);
        }

        let genome = self
            .genome
            .iter()
            .zip(other.genome.iter())
            .map(|((name, mine), (_, theirs))| {
                let value = if rng.gen_bool(0.5) { mine } else { theirs };
                (name, value.clone())
            })
            .collect();

        Ok(Organism::new_unchecked(Arc::clone(&self.genus), genome))
    }

    /// Redraw each gene with probability `gene_probability`.
    ///
    /// The probability is clamped to `[0, 1]`; NaN counts as 0. The new value
    /// is drawn uniformly from the whole domain and may equal the old one.
    /// Fitness is always reset.
    pub fn mutate<R>(&mut self, gene_probability: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let gene_probability = if gene_probability.is_nan() {
            0.0
        } else {
            gene_probability.clamp(0.0, 1.0)
        };
        for (name, domain) in self.genus.domains() {
            if rng.r#gen::<f64>() < gene_probability
                && let Some(value) = self.genome.get_mut(name)
            {
                *value = random_value(domain, rng);
            }
        }
        self.fitness = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GeneValue;

    fn space() -> Arc<GeneSpace> {
        Arc::new(
            GeneSpace::new([
                ("x", (0..10).map(GeneValue::Int).collect()),
                ("y", (0..10).map(GeneValue::Int).collect()),
                (
                    "act",
                    vec!["relu".into(), "tanh".into(), "sigmoid".into()],
                ),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_breed_inherits_from_parents() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(7);
        let organisms = space.create_organisms(20, &mut rng);

        for pair in organisms.chunks(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let child = a.breed(b, &mut rng).unwrap();
            assert!(child.fitness().is_none());
            assert!(space.validate(child.genome()).is_ok());
            for (name, value) in child.genome().iter() {
                assert!(
                    Some(value) == a.genome().get(name) || Some(value) == b.genome().get(name),
                    "gene {name} was not inherited"
                );
            }
        }
    }

    #[test]
    fn test_breed_leaves_parents_untouched() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(3);
        let mut parents = space.create_organisms(2, &mut rng);
        parents[0].set_fitness(1.5);
        let before = parents[0].genome().clone();

        let _child = parents[0].breed(&parents[1], &mut rng).unwrap();
        assert_eq!(parents[0].genome(), &before);
        assert_eq!(parents[0].fitness(), Some(1.5));
    }

    #[test]
    fn test_breed_across_gene_spaces_fails() {
        let a = space();
        // Equal contents, different instance
        let b = Arc::new(GeneSpace::clone(&a));
        let mut rng = StdRng::seed_from_u64(0);
        let x = a.create_organisms(1, &mut rng).remove(0);
        let y = b.create_organisms(1, &mut rng).remove(0);

        assert!(matches!(
            x.breed(&y, &mut rng),
            Err(EvolutionError::IncompatibleGenus)
        ));
    }

    #[test]
    fn test_mutate_resets_fitness() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(11);
        let mut organism = space.create_organisms(1, &mut rng).remove(0);

        organism.set_fitness(2.0);
        organism.mutate(0.0, &mut rng);
        assert!(organism.fitness().is_none());

        organism.set_fitness(2.0);
        organism.mutate(1.0, &mut rng);
        assert!(organism.fitness().is_none());
        assert!(space.validate(organism.genome()).is_ok());
    }

    #[test]
    fn test_mutate_zero_probability_keeps_genome() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(5);
        let mut organism = space.create_organisms(1, &mut rng).remove(0);
        let before = organism.genome().clone();
        organism.mutate(0.0, &mut rng);
        assert_eq!(organism.genome(), &before);
    }

    #[test]
    fn test_mutate_clamps_probability() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(21);
        let organism = space.create_organisms(1, &mut rng).remove(0);

        for probability in [-0.5, f64::NAN, f64::NEG_INFINITY] {
            let mut mutated = organism.clone();
            mutated.mutate(probability, &mut rng);
            assert_eq!(mutated.genome(), organism.genome());
        }

        let mut above = organism.clone();
        let mut full = organism.clone();
        above.mutate(7.0, &mut StdRng::seed_from_u64(4));
        full.mutate(1.0, &mut StdRng::seed_from_u64(4));
        assert_eq!(above.genome(), full.genome());
        assert!(space.validate(above.genome()).is_ok());
    }

    #[test]
    fn test_full_mutation_changes_most_genes() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(99);
        let mut organism = space.create_organisms(1, &mut rng).remove(0);

        let trials = 2000;
        let mut changed_x = 0;
        for _ in 0..trials {
            let before = organism.genome().get("x").cloned();
            organism.mutate(1.0, &mut rng);
            if organism.genome().get("x").cloned() != before {
                changed_x += 1;
            }
        }
        // Domain of 10 values: a redraw hits a new value 90% of the time
        let share = changed_x as f64 / trials as f64;
        assert!((share - 0.9).abs() < 0.05, "share = {share}");
    }
}
