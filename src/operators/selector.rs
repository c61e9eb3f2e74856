use ndarray::Array1;
use rand::prelude::SliceRandom;
use rand::{Rng, RngCore};

use crate::core::PError;

/// A trait implementing methods to choose individuals from a population for reproduction. The
/// selectors work on the population fitness vector and return the row indices of the chosen
/// individuals; an individual may be drawn more than once.
pub trait Selector {
    /// The selector name, used in error messages.
    ///
    /// returns: `String`
    fn name(&self) -> String;

    /// Select a number of individuals equal to `number_of_parents`, with replacement.
    ///
    /// # Arguments
    ///
    /// * `fitness`: The fitness of each individual. Larger values are preferred.
    /// * `number_of_parents`: The number of individuals to select.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<Vec<usize>, PError>`. The row indices of the selected individuals.
    fn select(
        &self,
        fitness: &Array1<f64>,
        number_of_parents: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<usize>, PError> {
        if fitness.is_empty() {
            return Err(PError::SelectorOperator(
                self.name(),
                "the population is empty and no individual can be selected".to_string(),
            ));
        }
        let mut winners = Vec::with_capacity(number_of_parents);
        for _ in 0..number_of_parents {
            winners.push(self.select_fit_individual(fitness, rng)?);
        }
        Ok(winners)
    }

    /// Select the index of one fit individual.
    ///
    /// # Arguments
    ///
    /// * `fitness`: The fitness of each individual.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<usize, PError>`
    fn select_fit_individual(
        &self,
        fitness: &Array1<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<usize, PError>;
}

/// Tournament selection method between multiple competitors for choosing individuals from a
/// population for reproduction. `number_of_competitors` individuals are randomly drawn from the
/// population and the one with the largest fitness becomes a parent; ties are resolved at random.
/// More tournaments are run to select more individuals.
pub struct TournamentSelector {
    /// The number of competitors in each tournament. For example, 2 to run a binary tournament.
    number_of_competitors: usize,
}

impl TournamentSelector {
    /// Create a new tournament.
    ///
    /// # Arguments
    ///
    /// * `number_of_competitors`: The number of competitors in the tournament. Use 2 to run a
    ///   binary tournament.
    ///
    /// returns: `TournamentSelector`
    pub fn new(number_of_competitors: usize) -> Self {
        Self {
            number_of_competitors,
        }
    }
}

impl Selector for TournamentSelector {
    fn name(&self) -> String {
        "TournamentSelector".to_string()
    }

    fn select_fit_individual(
        &self,
        fitness: &Array1<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<usize, PError> {
        if self.number_of_competitors < 1 {
            return Err(PError::SelectorOperator(
                self.name(),
                "at least one competitor is needed in the tournament".to_string(),
            ));
        }

        let mut winner = rng.gen_range(0..fitness.len());
        for _ in 1..self.number_of_competitors {
            let competitor = rng.gen_range(0..fitness.len());
            if fitness[competitor] > fitness[winner] {
                winner = competitor;
            } else if fitness[competitor] == fitness[winner] {
                // randomly select the winner
                winner = *[winner, competitor].choose(rng).unwrap();
            }
        }
        Ok(winner)
    }
}

/// Fitness-proportionate selection. The probability of an individual being drawn is its fitness
/// divided by the population fitness total; all the fitness values must be non-negative with a
/// positive total.
pub struct RouletteWheelSelector;

impl Selector for RouletteWheelSelector {
    fn name(&self) -> String {
        "RouletteWheelSelector".to_string()
    }

    fn select_fit_individual(
        &self,
        fitness: &Array1<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<usize, PError> {
        if fitness.iter().any(|v| *v < 0.0) {
            return Err(PError::SelectorOperator(
                self.name(),
                "the fitness values must be non-negative".to_string(),
            ));
        }
        let total: f64 = fitness.sum();
        if total <= 0.0 {
            return Err(PError::SelectorOperator(
                self.name(),
                "the population fitness total must be positive".to_string(),
            ));
        }

        let threshold = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (index, value) in fitness.iter().enumerate() {
            cumulative += value;
            if cumulative > threshold {
                return Ok(index);
            }
        }
        Ok(fitness.len() - 1)
    }
}

#[cfg(test)]
mod test {
    use ndarray::{array, Array1};

    use crate::core::utils::get_rng;
    use crate::operators::{RouletteWheelSelector, Selector, TournamentSelector};

    #[test]
    /// The selector returns the requested number of valid indices.
    fn test_tournament_selection_size() {
        let fitness = Array1::ones(10);
        let selector = TournamentSelector::new(2);
        let mut rng = get_rng(Some(1));

        let selected = selector.select(&fitness, 25, &mut rng).unwrap();
        assert_eq!(selected.len(), 25);
        assert!(selected.iter().all(|i| *i < 10));
    }

    #[test]
    /// An individual with a much larger fitness wins most tournaments.
    fn test_tournament_selection_pressure() {
        let fitness = array![1.0, 1.0, 1.0, 100.0];
        let selector = TournamentSelector::new(2);
        let mut rng = get_rng(Some(1));

        let selected = selector.select(&fitness, 200, &mut rng).unwrap();
        let wins = selected.iter().filter(|i| **i == 3).count();
        assert!(wins > 60, "individual #3 won {wins} tournaments only");
    }

    #[test]
    /// The roulette wheel rejects invalid fitness vectors.
    fn test_roulette_wheel_errors() {
        let selector = RouletteWheelSelector;
        let mut rng = get_rng(Some(1));

        assert!(selector.select(&array![1.0, -1.0], 2, &mut rng).is_err());
        assert!(selector.select(&array![0.0, 0.0], 2, &mut rng).is_err());
        assert!(selector.select(&Array1::ones(0), 2, &mut rng).is_err());
    }

    #[test]
    /// Zero-fitness individuals are never drawn by the roulette wheel.
    fn test_roulette_wheel_selection() {
        let fitness = array![0.0, 1.0, 0.0, 3.0];
        let selector = RouletteWheelSelector;
        let mut rng = get_rng(Some(1));

        let selected = selector.select(&fitness, 100, &mut rng).unwrap();
        assert!(selected.iter().all(|i| *i == 1 || *i == 3));
    }
}
