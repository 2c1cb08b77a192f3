//! Fitness-proportionate (roulette wheel) selection.
//!
//! Fitness values are normalised into probabilities, ordered from most to
//! least likely and accumulated. A uniform sample `u` in `[0, 1)` selects the
//! first slot whose cumulative probability strictly exceeds `u`.

use rand::prelude::*;

use super::error::InvalidFitness;

/// Cumulative probability table over a set of fitness values.
#[derive(Debug, Clone)]
pub struct FitnessWheel {
    /// Original indices, most probable first.
    order: Vec<usize>,
    /// Cumulative probabilities parallel to `order`.
    cumulative: Vec<f64>,
}

impl FitnessWheel {
    /// Build the wheel, failing on values that cannot be normalised.
    pub fn new(fitnesses: &[f64]) -> Result<Self, InvalidFitness> {
        for (index, &value) in fitnesses.iter().enumerate() {
            if !value.is_finite() {
                return Err(InvalidFitness::NonFinite { index, value });
            }
            if value < 0.0 {
                return Err(InvalidFitness::Negative { index, value });
            }
        }

        let total: f64 = fitnesses.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(InvalidFitness::NonPositiveTotal { total });
        }

        let mut order: Vec<usize> = (0..fitnesses.len()).collect();
        // Stable: equal probabilities keep population order
        order.sort_by(|&a, &b| fitnesses[b].total_cmp(&fitnesses[a]));

        let mut acc = 0.0;
        let cumulative = order
            .iter()
            .map(|&i| {
                acc += fitnesses[i] / total;
                acc
            })
            .collect();

        Ok(Self { order, cumulative })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index of the first slot whose cumulative probability exceeds `u`.
    ///
    /// Rounding can leave the last cumulative value just below 1.0; samples
    /// past it fall into the last non-empty slot.
    pub fn index_for(&self, u: f64) -> usize {
        let slot = self.cumulative.partition_point(|&c| c <= u);
        let slot = if slot < self.cumulative.len() {
            slot
        } else {
            self.last_live_slot()
        };
        self.order[slot]
    }

    /// Draw one index with probability proportional to its fitness.
    pub fn sample<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        self.index_for(rng.r#gen::<f64>())
    }

    /// Draw `amount` independent indices, with replacement.
    pub fn sample_many<R>(&self, amount: usize, rng: &mut R) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        (0..amount).map(|_| self.sample(rng)).collect()
    }

    fn last_live_slot(&self) -> usize {
        // Zero-fitness slots sit at the end and add no probability mass
        let mut slot = self.cumulative.len() - 1;
        while slot > 0 && self.cumulative[slot] == self.cumulative[slot - 1] {
            slot -= 1;
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_descending_order() {
        let wheel = FitnessWheel::new(&[1.0, 3.0, 6.0]).unwrap();
        assert_eq!(wheel.order, vec![2, 1, 0]);
        assert!((wheel.cumulative[0] - 0.6).abs() < 1e-12);
        assert!((wheel.cumulative[1] - 0.9).abs() < 1e-12);
        assert!((wheel.cumulative[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_for_boundaries() {
        let wheel = FitnessWheel::new(&[1.0, 3.0, 6.0]).unwrap();
        assert_eq!(wheel.index_for(0.0), 2);
        assert_eq!(wheel.index_for(0.59), 2);
        // Strictly exceeds: 0.6 belongs to the next slot
        assert_eq!(wheel.index_for(0.6), 1);
        assert_eq!(wheel.index_for(0.95), 0);
        assert_eq!(wheel.index_for(0.999_999), 0);
    }

    #[test]
    fn test_rounding_never_selects_zero_fitness() {
        let wheel = FitnessWheel::new(&[0.0, 0.1, 0.2, 0.0]).unwrap();
        assert_eq!(wheel.index_for(1.0), 1);
    }

    #[test]
    fn test_invalid_fitness() {
        assert!(matches!(
            FitnessWheel::new(&[1.0, f64::NAN]),
            Err(InvalidFitness::NonFinite { index: 1, .. })
        ));
        assert!(matches!(
            FitnessWheel::new(&[f64::INFINITY]),
            Err(InvalidFitness::NonFinite { index: 0, .. })
        ));
        assert!(matches!(
            FitnessWheel::new(&[2.0, -1.0]),
            Err(InvalidFitness::Negative { index: 1, .. })
        ));
        assert!(matches!(
            FitnessWheel::new(&[0.0, 0.0]),
            Err(InvalidFitness::NonPositiveTotal { .. })
        ));
        assert!(matches!(
            FitnessWheel::new(&[]),
            Err(InvalidFitness::NonPositiveTotal { .. })
        ));
        assert!(matches!(
            FitnessWheel::new(&[f64::MAX, f64::MAX]),
            Err(InvalidFitness::NonPositiveTotal { .. })
        ));
    }

    #[test]
    fn test_dominant_organism_share() {
        let mut fitnesses = vec![99.0];
        fitnesses.extend(std::iter::repeat_n(1.0, 9));
        let wheel = FitnessWheel::new(&fitnesses).unwrap();

        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 10_000;
        let hits = wheel
            .sample_many(draws, &mut rng)
            .into_iter()
            .filter(|&i| i == 0)
            .count();
        let share = hits as f64 / draws as f64;
        // 99 / 108 with a standard error below 0.003
        assert!((share - 99.0 / 108.0).abs() < 0.015, "share = {share}");
    }

    proptest! {
        #[test]
        fn prop_samples_have_positive_fitness(
            fitnesses in prop::collection::vec(0.0f64..100.0, 1..30),
            u in 0.0f64..1.0,
        ) {
            prop_assume!(fitnesses.iter().sum::<f64>() > 0.0);
            let wheel = FitnessWheel::new(&fitnesses).unwrap();
            let index = wheel.index_for(u);
            prop_assert!(index < fitnesses.len());
            prop_assert!(fitnesses[index] > 0.0);
        }
    }
}
