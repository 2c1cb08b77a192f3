//! Population and the generational evolve loop.

use std::sync::Arc;

use log::{debug, info, trace};
use rand::prelude::*;

use crate::schema::Genome;

use super::error::{EvolutionError, InvalidFitness};
use super::fitness::{Executor, FitnessEvaluator, evaluate_fitness};
use super::gene_space::GeneSpace;
use super::history::{GenerationStats, History};
use super::organism::Organism;
use super::progress::{Progress, ProgressCallback};
use super::selection::FitnessWheel;

/// Parameters of one [`Population::evolve`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolveParams {
    /// Number of generations to run.
    pub generations: usize,
    /// Share of the population drawn as breeders (at least two are drawn).
    pub breeding_fraction: f64,
    /// Probability that a child is mutated at all.
    pub mutation_fraction: f64,
    /// Per-gene redraw probability of a mutated child.
    /// `None` uses `1 / gene_count`.
    pub gene_mutation_rate: Option<f64>,
    /// Evaluate fitness on a worker pool.
    pub parallel: bool,
    /// Worker pool size; `None` uses the available hardware concurrency.
    pub workers: Option<usize>,
}

impl Default for EvolveParams {
    fn default() -> Self {
        Self {
            generations: 1,
            breeding_fraction: 0.2,
            mutation_fraction: 0.5,
            gene_mutation_rate: None,
            parallel: true,
            workers: None,
        }
    }
}

impl EvolveParams {
    pub fn validate(&self) -> Result<(), EvolutionError> {
        let check = |value: f64, name: &str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionError::InvalidParameter(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };
        check(self.breeding_fraction, "breeding_fraction")?;
        check(self.mutation_fraction, "mutation_fraction")?;
        if let Some(rate) = self.gene_mutation_rate {
            check(rate, "gene_mutation_rate")?;
        }
        if self.workers == Some(0) {
            return Err(EvolutionError::InvalidParameter(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of breeders drawn for a population of `size`.
    pub fn breeders(&self, size: usize) -> usize {
        ((size as f64 * self.breeding_fraction).ceil() as usize).max(2)
    }
}

/// Builder for [`Population`].
pub struct PopulationBuilder<E> {
    genus: Arc<GeneSpace>,
    evaluator: E,
    size: usize,
    random_seed: Option<u64>,
    initial_genome: Option<Genome>,
    progress: Option<ProgressCallback>,
}

impl<E: FitnessEvaluator> PopulationBuilder<E> {
    /// Number of organisms per generation.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Seed the single random source of the population.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Start every organism of generation 0 from this genome instead of
    /// drawing random ones.
    pub fn initial_genome(mut self, genome: Genome) -> Self {
        self.initial_genome = Some(genome);
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn build(self) -> Result<Population<E>, EvolutionError> {
        if self.size == 0 {
            return Err(EvolutionError::InvalidParameter(
                "population size must be at least 1".to_string(),
            ));
        }

        let mut rng = match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let size = self.size;
        let progress = self.progress;
        let report = |completed| {
            if let Some(cb) = &progress {
                cb(&Progress::Created {
                    completed,
                    total: size,
                });
            }
        };

        let organisms = match self.initial_genome {
            Some(genome) => {
                let seed = self.genus.construct_with_genome(genome)?;
                (1..=size)
                    .map(|n| {
                        report(n);
                        seed.clone()
                    })
                    .collect()
            }
            None => self.genus.create_organisms_with(size, &mut rng, report),
        };

        Ok(Population {
            genus: self.genus,
            size,
            evaluator: self.evaluator,
            organisms,
            rng,
            progress,
        })
    }
}

/// A generation of organisms together with its fitness function.
pub struct Population<E> {
    genus: Arc<GeneSpace>,
    size: usize,
    evaluator: E,
    organisms: Vec<Organism>,
    rng: StdRng,
    progress: Option<ProgressCallback>,
}

impl<E: FitnessEvaluator> Population<E> {
    pub fn builder(genus: Arc<GeneSpace>, evaluator: E) -> PopulationBuilder<E> {
        PopulationBuilder {
            genus,
            evaluator,
            size: 100,
            random_seed: None,
            initial_genome: None,
            progress: None,
        }
    }

    pub fn genus(&self) -> &Arc<GeneSpace> {
        &self.genus
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Current generation.
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Replace the progress callback.
    pub fn set_progress(&mut self, callback: Option<ProgressCallback>) {
        self.progress = callback;
    }

    fn report(&self, progress: Progress) {
        if let Some(cb) = &self.progress {
            cb(&progress);
        }
    }

    /// Evaluate every organism of the current generation without a fitness.
    ///
    /// Returns the number of evaluator calls made.
    pub fn evaluate_fitness(&mut self, executor: &Executor) -> Result<usize, EvolutionError> {
        let total = self
            .organisms
            .iter()
            .filter(|o| o.fitness().is_none())
            .count();
        let progress = &self.progress;
        evaluate_fitness(&mut self.organisms, &self.evaluator, executor, |completed| {
            if let Some(cb) = progress {
                cb(&Progress::Evaluated { completed, total });
            }
        })
    }

    /// Fitness of every organism, in population order.
    fn fitnesses(&self) -> Result<Vec<f64>, InvalidFitness> {
        self.organisms
            .iter()
            .enumerate()
            .map(|(index, o)| o.fitness().ok_or(InvalidFitness::Unevaluated { index }))
            .collect()
    }

    /// Draw `amount` organisms with probability proportional to fitness.
    ///
    /// Draws are independent and with replacement. Organisms not yet
    /// evaluated are evaluated first, in the calling thread.
    pub fn select_fit(&mut self, amount: usize) -> Result<Vec<Organism>, EvolutionError> {
        self.evaluate_fitness(&Executor::sequential())?;
        let wheel = FitnessWheel::new(&self.fitnesses()?)?;

        let mut selected = Vec::with_capacity(amount);
        for completed in 1..=amount {
            let index = wheel.sample(&mut self.rng);
            trace!("selected organism {index}");
            selected.push(self.organisms[index].clone());
            self.report(Progress::Selected {
                completed,
                total: amount,
            });
        }
        Ok(selected)
    }

    /// Run the generational loop and return what was recorded.
    ///
    /// Each generation is evaluated, recorded, sampled for breeders and then
    /// replaced by `size` children. With zero generations the population is
    /// left untouched.
    pub fn evolve(&mut self, params: &EvolveParams) -> Result<History, EvolutionError> {
        params.validate()?;
        let mut history = History::new();
        if params.generations == 0 {
            return Ok(history);
        }

        let executor = if params.parallel {
            Executor::parallel(params.workers)?
        } else {
            Executor::sequential()
        };
        let gene_rate = params
            .gene_mutation_rate
            .unwrap_or_else(|| 1.0 / self.genus.len().max(1) as f64);
        let breeders = params.breeders(self.size);

        info!(
            "Evolving {} organisms for {} generations ({} breeders, {} workers)",
            self.size,
            params.generations,
            breeders,
            executor.workers()
        );

        for generation in 0..params.generations {
            self.evaluate_fitness(&executor)?;

            let fitnesses = self.fitnesses()?;
            let genomes = self.organisms.iter().map(|o| o.genome().clone()).collect();
            if let Some(stats) = GenerationStats::from_values(&fitnesses) {
                debug!(
                    "Generation {}: best={:.4} mean={:.4} std={:.4}",
                    generation, stats.max, stats.mean, stats.std
                );
            }
            history.add_entry(genomes, fitnesses)?;

            let parents = self.select_fit(breeders)?;
            let mut children = Vec::with_capacity(self.size);
            for _ in 0..self.size {
                let a = &parents[self.rng.gen_range(0..parents.len())];
                let b = &parents[self.rng.gen_range(0..parents.len())];
                let mut child = a.breed(b, &mut self.rng)?;
                if self.rng.r#gen::<f64>() < params.mutation_fraction {
                    child.mutate(gene_rate, &mut self.rng);
                }
                children.push(child);
            }
            self.organisms = children;

            let best_fitness = history.fittest().map_or(f64::NAN, |f| f.fitness);
            self.report(Progress::GenerationComplete {
                generation: generation + 1,
                total: params.generations,
                best_fitness,
            });
        }

        if let Some(best) = history.fittest() {
            info!(
                "Evolution finished: best fitness {:.4} in generation {}",
                best.fitness, best.generation
            );
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::schema::GeneValue;

    fn number_space() -> Arc<GeneSpace> {
        Arc::new(
            GeneSpace::new([
                ("x", (1..100).map(GeneValue::Int).collect()),
                ("y", (1..100).map(GeneValue::Int).collect()),
            ])
            .unwrap(),
        )
    }

    fn ratio(genome: &Genome) -> f64 {
        genome.get_f64("x").unwrap() / genome.get_f64("y").unwrap()
    }

    fn params(generations: usize, parallel: bool) -> EvolveParams {
        EvolveParams {
            generations,
            breeding_fraction: 0.2,
            mutation_fraction: 0.2,
            parallel,
            ..Default::default()
        }
    }

    #[test]
    fn test_builder_rejects_empty_population() {
        let result = Population::builder(number_space(), ratio).size(0).build();
        assert!(matches!(result, Err(EvolutionError::InvalidParameter(_))));
    }

    #[test]
    fn test_initial_genome_override() {
        let genome = Genome::new().with("x", 10).with("y", 20);
        let population = Population::builder(number_space(), ratio)
            .size(5)
            .initial_genome(genome.clone())
            .build()
            .unwrap();
        assert_eq!(population.organisms().len(), 5);
        assert!(population.organisms().iter().all(|o| o.genome() == &genome));

        let invalid = Population::builder(number_space(), ratio)
            .initial_genome(Genome::new().with("x", 10))
            .build();
        assert!(matches!(invalid, Err(EvolutionError::Validation(_))));
    }

    #[test]
    fn test_zero_generations() {
        let mut population = Population::builder(number_space(), ratio)
            .size(10)
            .random_seed(1)
            .build()
            .unwrap();
        let before: Vec<Genome> = population
            .organisms()
            .iter()
            .map(|o| o.genome().clone())
            .collect();

        let history = population.evolve(&params(0, false)).unwrap();
        assert!(history.is_empty());
        assert!(history.fittest().is_none());

        let after: Vec<Genome> = population
            .organisms()
            .iter()
            .map(|o| o.genome().clone())
            .collect();
        assert_eq!(before, after);
        assert!(population.organisms().iter().all(|o| o.fitness().is_none()));
    }

    #[test]
    fn test_select_fit_draws_from_population() {
        let mut population = Population::builder(number_space(), ratio)
            .size(15)
            .random_seed(8)
            .build()
            .unwrap();
        let selected = population.select_fit(40).unwrap();
        assert_eq!(selected.len(), 40);
        for organism in &selected {
            assert!(organism.fitness().is_some());
            assert!(
                population
                    .organisms()
                    .iter()
                    .any(|o| o.genome() == organism.genome())
            );
        }
    }

    #[test]
    fn test_select_fit_rejects_zero_fitness() {
        let mut population = Population::builder(number_space(), |_: &Genome| 0.0)
            .size(5)
            .random_seed(2)
            .build()
            .unwrap();
        assert!(matches!(
            population.select_fit(3),
            Err(EvolutionError::InvalidFitness(
                InvalidFitness::NonPositiveTotal { .. }
            ))
        ));
    }

    #[test]
    fn test_evolve_aborts_on_nan_fitness() {
        let mut population = Population::builder(number_space(), |_: &Genome| f64::NAN)
            .size(5)
            .random_seed(2)
            .build()
            .unwrap();
        let result = population.evolve(&params(3, false));
        assert!(matches!(
            result,
            Err(EvolutionError::InvalidFitness(InvalidFitness::NonFinite { .. }))
        ));
    }

    #[test]
    fn test_invalid_params() {
        let mut population = Population::builder(number_space(), ratio)
            .size(5)
            .build()
            .unwrap();
        let bad = EvolveParams {
            breeding_fraction: 1.5,
            ..params(1, false)
        };
        assert!(matches!(
            population.evolve(&bad),
            Err(EvolutionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_breeder_count() {
        let p = params(1, false);
        assert_eq!(p.breeders(20), 4);
        assert_eq!(p.breeders(3), 2);
        assert_eq!(p.breeders(1), 2);
        let all = EvolveParams {
            breeding_fraction: 1.0,
            ..p
        };
        assert_eq!(all.breeders(7), 7);
    }

    #[test]
    fn test_each_child_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let evaluator = move |genome: &Genome| {
            counter.fetch_add(1, Ordering::Relaxed);
            ratio(genome)
        };

        let mut population = Population::builder(number_space(), evaluator)
            .size(12)
            .random_seed(4)
            .build()
            .unwrap();
        population.evolve(&params(5, true)).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 12 * 5);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let run = |parallel: bool| {
            let mut population = Population::builder(number_space(), ratio)
                .size(20)
                .random_seed(1234)
                .build()
                .unwrap();
            population.evolve(&params(6, parallel)).unwrap()
        };

        let first = run(false);
        let second = run(false);
        let parallel = run(true);
        assert_eq!(first, second);
        assert_eq!(first, parallel);
    }

    #[test]
    fn test_progress_is_reported() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut population = Population::builder(number_space(), ratio)
            .size(6)
            .random_seed(3)
            .progress(Box::new(move |p: &Progress| sink.lock().unwrap().push(*p)))
            .build()
            .unwrap();
        population.evolve(&params(2, false)).unwrap();

        let events = events.lock().unwrap();
        let created = events
            .iter()
            .filter(|p| matches!(p, Progress::Created { .. }))
            .count();
        let completed: Vec<usize> = events
            .iter()
            .filter_map(|p| match p {
                Progress::GenerationComplete { generation, .. } => Some(*generation),
                _ => None,
            })
            .collect();
        assert_eq!(created, 6);
        assert_eq!(completed, vec![1, 2]);
        assert!(events.contains(&Progress::Selected {
            completed: 2,
            total: 2
        }));
    }

    #[test]
    fn test_ratio_scenario() {
        let mut population = Population::builder(number_space(), ratio)
            .size(20)
            .random_seed(42)
            .build()
            .unwrap();
        let history = population.evolve(&params(10, true)).unwrap();

        assert_eq!(history.len(), 10);
        assert!(history.entries().iter().all(|e| e.genomes.len() == 20));
        assert_eq!(population.organisms().len(), 20);

        let first_best = history.entries()[0]
            .fitnesses
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let best = history.fittest().unwrap();
        assert!(best.fitness >= first_best);
        assert!((best.fitness - ratio(&best.genome)).abs() < 1e-12);
    }
}
