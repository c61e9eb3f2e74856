use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use ndarray::{Array2, Axis};
use rand::RngCore;
use serde::Serialize;

use crate::algorithms::{Algorithm, ExportHistory, StoppingConditionType};
use crate::core::utils::get_rng;
use crate::core::{PError, Population, Problem};
use crate::operators::{SegmentVariation, Selector, TournamentSelector};
use crate::utils::{
    non_dominated_sort, DasDennis, ReferencePointGenerator, ReferencePointSet,
};

use crate::algorithms::nsga3::associate::associate_to_reference_points;
use crate::algorithms::nsga3::niching::{BoundaryMember, Niching};
use crate::algorithms::nsga3::normalise::Normalise;

mod associate;
mod niching;
mod normalise;

/// Select exactly `num` members from the combined population using the reference-point-based
/// niching procedure of the NSGA-III paper. Members on the levels before the boundary one are
/// admitted unconditionally; the boundary level is filled by balancing the niche counts of the
/// reference points.
///
/// # Arguments
///
/// * `signed_objectives`: The sign-adjusted objectives of the combined population.
/// * `levels`: The non-domination level of each member. Members without a level are never
///   selected.
/// * `boundary_level`: The level that only partially fits in the new population.
/// * `num`: The number of members to select.
/// * `reference_points`: The reference-point set.
/// * `fast`: Whether to break niche ties pseudo-randomly instead of deterministically.
/// * `ideal_point`: The coordinates of the ideal point from the previous evolution. This is
///   updated by the normalisation step.
/// * `rng`: The random number generator.
///
/// returns: `Result<Vec<bool>, PError>`. The row-selection mask with exactly `num` flags set.
#[allow(clippy::too_many_arguments)]
pub(crate) fn select_with_reference_points(
    signed_objectives: &Array2<f64>,
    levels: &[Option<usize>],
    boundary_level: usize,
    num: usize,
    reference_points: &ReferencePointSet,
    fast: bool,
    ideal_point: &mut Vec<f64>,
    rng: &mut dyn RngCore,
) -> Result<Vec<bool>, PError> {
    let name = "NSGA3-Select".to_string();
    if levels.len() != signed_objectives.nrows() {
        return Err(PError::DataModelViolation(format!(
            "the level vector has {} entries but the objective matrix has {} rows",
            levels.len(),
            signed_objectives.nrows()
        )));
    }

    // the candidate set S_t holds every ranked member
    let candidates: Vec<usize> = levels
        .iter()
        .enumerate()
        .filter_map(|(row, level)| level.map(|_| row))
        .collect();
    if candidates.len() < num {
        return Err(PError::SurvivalOperator(
            name,
            format!(
                "only {} members are ranked but {num} must be selected",
                candidates.len()
            ),
        ));
    }

    // normalise the candidate objectives and associate them to the reference points
    let candidate_objectives = signed_objectives.select(Axis(0), &candidates);
    let outcome = Normalise::new(ideal_point, &candidate_objectives)?.calculate()?;
    let associations = associate_to_reference_points(&outcome.normalised, &reference_points.points)?;

    // admit every member before the boundary level and collect the boundary pool
    let mut mask = vec![false; signed_objectives.nrows()];
    let mut selected_count = 0;
    let mut rho_j: HashMap<usize, usize> =
        (0..reference_points.points.len()).map(|j| (j, 0)).collect();
    let mut pool: Vec<BoundaryMember> = Vec::new();

    for (candidate_index, row) in candidates.iter().enumerate() {
        let level = levels[*row].unwrap();
        let association = &associations[candidate_index];
        if level < boundary_level {
            mask[*row] = true;
            selected_count += 1;
            *rho_j.get_mut(&association.ref_point_index).unwrap() += 1;
        } else if level == boundary_level {
            pool.push(BoundaryMember {
                row: *row,
                ref_point_index: association.ref_point_index,
                distance: association.distance,
            });
        }
    }

    // fill the remaining slots from the boundary level by niche-count balancing
    if selected_count < num {
        Niching::new(&mut mask, pool, num - selected_count, &mut rho_j, fast, rng)?
            .calculate()?;
    }

    let total = mask.iter().filter(|selected| **selected).count();
    if total != num {
        return Err(PError::SurvivalOperator(
            "NSGA3-Select".to_string(),
            format!("{total} members were selected instead of {num}"),
        ));
    }
    Ok(mask)
}

/// Input arguments for the multi-chromosome NSGA3 algorithm.
pub struct NSGA3Arg {
    /// The condition causing the evolution to stop.
    pub stopping_condition: StoppingConditionType,
    /// The probability that a pair of rows of a chromosome segment takes part in the
    /// recombination, one entry per segment. All probabilities default to 1 when `None`.
    pub recombination_probabilities: Option<Vec<f64>>,
    /// The probability that a row of a chromosome segment is mutated, one entry per segment. All
    /// probabilities default to 1 when `None`.
    pub mutation_probabilities: Option<Vec<f64>>,
    /// The number of competitors in the tournaments sampling the parents. This defaults to 2
    /// (binary tournament).
    pub number_of_competitors: Option<usize>,
    /// Whether the niche ties in the survivor selection are broken pseudo-randomly, which is
    /// faster than the exhaustive deterministic policy. This defaults to `true`.
    pub fast_niching: Option<bool>,
    /// The options to configure the export of the population history. When `None`, no data is
    /// exported during the evolution.
    pub export_history: Option<ExportHistory>,
    /// The seed used in the random number generator (RNG). You can specify a seed in case you
    /// want to try to reproduce results. NSGA3 is a stochastic algorithm that relies on a RNG at
    /// different steps (when sampling the parents, during the variation and when breaking niche
    /// ties) and, as such, may lead to slightly different solutions. The seed is randomly picked
    /// when this is `None`.
    pub seed: Option<u64>,
}

/// The algorithm options exported with the population snapshots.
#[derive(Serialize, Debug)]
pub struct NSGA3Options {
    /// The population size requested by the user.
    pub requested_population_size: usize,
    /// The population size adjusted to the reference-point set.
    pub number_of_individuals: usize,
    /// The recombination probability of each chromosome segment.
    pub recombination_probabilities: Vec<f64>,
    /// The mutation probability of each chromosome segment.
    pub mutation_probabilities: Vec<f64>,
    /// Whether the niche ties are broken pseudo-randomly.
    pub fast_niching: bool,
    /// The seed used in the random number generator.
    pub seed: Option<u64>,
}

/// The Non-dominated Sorting Genetic Algorithm (NSGA3) for populations whose decision variables
/// are split into independently-encoded chromosome segments.
///
/// Each generation the algorithm samples the parents by tournament on the population fitness
/// vector, recombines and mutates every chromosome segment with the operator pair fixed by the
/// segment encoding (see [`SegmentVariation`]), evaluates the offspring batch in one call and
/// selects the survivors by non-dominated sorting followed by reference-point niching. The
/// population size is adjusted at initialisation to match the cardinality of the reference-point
/// set.
///
/// Implemented based on:
/// > K. Deb and H. Jain. An Evolutionary Many-Objective Optimization Algorithm Using
/// > Reference-Point-Based Nondominated Sorting Approach, Part I: Solving Problems With Box
/// > Constraints. IEEE Transactions on Evolutionary Computation, vol. 18, no. 4, pp. 577-601,
/// > 2014, doi: 10.1109/TEVC.2013.2281535.
pub struct NSGA3 {
    /// The problem being solved.
    problem: Arc<dyn Problem>,
    /// The evolving population.
    population: Population,
    /// The number of individuals of each generation. This is set at initialisation from the
    /// reference-point set and generally differs from the requested population size.
    number_of_individuals: usize,
    /// The reference points, generated at initialisation.
    reference_points: Option<ReferencePointSet>,
    /// The generator building the reference-point set for the requested population size.
    reference_point_generator: Box<dyn ReferencePointGenerator>,
    /// The recombination and mutation pair of each chromosome segment.
    segment_variations: Vec<SegmentVariation>,
    /// The operator sampling the parents from the population fitness vector.
    selector: TournamentSelector,
    /// The coordinates of the ideal point, tracked across the whole evolution.
    ideal_point: Vec<f64>,
    /// The evolution step.
    generation: usize,
    /// The number of objective-function evaluations performed so far.
    number_of_function_evaluations: usize,
    /// The condition causing the evolution to stop.
    stopping_condition: StoppingConditionType,
    /// The time when the algorithm started.
    start_time: Instant,
    /// The configuration of the population-history export.
    export_history: Option<ExportHistory>,
    /// Whether the niche ties are broken pseudo-randomly.
    fast_niching: bool,
    /// The seed used in the random number generator.
    seed: Option<u64>,
    /// The random number generator.
    rng: Box<dyn RngCore>,
}

impl NSGA3 {
    /// Initialise the multi-chromosome NSGA3 algorithm. This selects the recombination and
    /// mutation operator pair of every chromosome segment from its encoding and validates the
    /// probability overrides.
    ///
    /// # Arguments
    ///
    /// * `problem`: The problem being solved.
    /// * `population`: The population to evolve, with the chromosome segments already defined.
    ///   The chromosomes are generated when the algorithm is initialised, once the population
    ///   size is adjusted to the reference-point set.
    /// * `options`: The [`NSGA3Arg`] arguments to customise the algorithm behaviour.
    ///
    /// returns: `Result<NSGA3, PError>`
    pub fn new(
        problem: Arc<dyn Problem>,
        population: Population,
        options: NSGA3Arg,
    ) -> Result<Self, PError> {
        let name = "NSGA3".to_string();
        if problem.number_of_objectives() < 2 {
            return Err(PError::AlgorithmInit(
                name,
                "at least 2 objectives are required".to_string(),
            ));
        }
        if population.chromosome_count() == 0 {
            return Err(PError::AlgorithmInit(
                name,
                "the population must hold at least one chromosome segment".to_string(),
            ));
        }

        // derive the operator pair of each segment from its encoding
        let mut segment_variations = Vec::with_capacity(population.chromosome_count());
        for segment in population.segments() {
            segment_variations.push(SegmentVariation::for_encoding(segment.encoding())?);
        }

        // apply the probability overrides
        if let Some(probabilities) = &options.recombination_probabilities {
            if probabilities.len() != segment_variations.len() {
                return Err(PError::Configuration(
                    name,
                    format!(
                        "{} recombination probabilities were provided for {} chromosome segments",
                        probabilities.len(),
                        segment_variations.len()
                    ),
                ));
            }
            for (variation, probability) in segment_variations.iter_mut().zip(probabilities) {
                variation.set_recombination_probability(*probability)?;
            }
        }
        if let Some(probabilities) = &options.mutation_probabilities {
            if probabilities.len() != segment_variations.len() {
                return Err(PError::Configuration(
                    name,
                    format!(
                        "{} mutation probabilities were provided for {} chromosome segments",
                        probabilities.len(),
                        segment_variations.len()
                    ),
                ));
            }
            for (variation, probability) in segment_variations.iter_mut().zip(probabilities) {
                variation.set_mutation_probability(*probability)?;
            }
        }

        info!(
            "Created the NSGA3 algorithm with {} chromosome segments and {} requested individuals",
            population.chromosome_count(),
            population.requested_size()
        );
        let number_of_individuals = population.requested_size();
        Ok(Self {
            problem,
            population,
            number_of_individuals,
            reference_points: None,
            reference_point_generator: Box::new(DasDennis),
            segment_variations,
            selector: TournamentSelector::new(options.number_of_competitors.unwrap_or(2)),
            ideal_point: vec![],
            generation: 0,
            number_of_function_evaluations: 0,
            stopping_condition: options.stopping_condition,
            start_time: Instant::now(),
            export_history: options.export_history,
            fast_niching: options.fast_niching.unwrap_or(true),
            seed: options.seed,
            rng: get_rng(options.seed),
        })
    }

    /// Replace the generator building the reference-point set. This must be called before the
    /// algorithm is initialised; the default generator produces a Das & Dennis lattice fitting
    /// the requested population size.
    ///
    /// # Arguments
    ///
    /// * `generator`: The reference-point generator to use.
    pub fn set_reference_point_generator(&mut self, generator: Box<dyn ReferencePointGenerator>) {
        self.reference_point_generator = generator;
    }

    /// Get the reference points, available once the algorithm has been initialised.
    ///
    /// returns: `Option<&ReferencePointSet>`
    pub fn reference_points(&self) -> Option<&ReferencePointSet> {
        self.reference_points.as_ref()
    }

    /// Evaluate the phenotype of a population with one call to the problem and store the
    /// objective and constraint matrices. This returns an error if the evaluation fails, the
    /// returned matrices are not aligned row-for-row with the phenotype or an objective is NaN.
    ///
    /// # Arguments
    ///
    /// * `problem`: The problem being solved.
    /// * `population`: The population to evaluate.
    ///
    /// returns: `Result<(), PError>`
    fn evaluate_population(
        problem: &Arc<dyn Problem>,
        population: &mut Population,
    ) -> Result<(), PError> {
        debug!("Evaluating {} individuals", population.len());
        let result = problem
            .evaluate(population.phenotype())
            .map_err(|e| PError::Evaluation(e.to_string()))?;

        if result.objectives.nrows() != population.len() {
            return Err(PError::DataModelViolation(format!(
                "the evaluation returned {} objective rows for {} individuals",
                result.objectives.nrows(),
                population.len()
            )));
        }
        if result.objectives.ncols() != problem.number_of_objectives() {
            return Err(PError::DataModelViolation(format!(
                "the evaluation returned {} objective columns for {} problem objectives",
                result.objectives.ncols(),
                problem.number_of_objectives()
            )));
        }
        if result.objectives.iter().any(|v| v.is_nan()) {
            return Err(PError::NaN("the objective matrix".to_string()));
        }
        population.set_objectives(result.objectives)?;

        match (result.constraint_violation, problem.number_of_constraints()) {
            (None, 0) => (),
            (Some(_), 0) => {
                return Err(PError::DataModelViolation(
                    "the evaluation returned constraint values for an unconstrained problem"
                        .to_string(),
                ))
            }
            (None, constraints) => {
                return Err(PError::DataModelViolation(format!(
                    "the evaluation returned no constraint values for a problem with {constraints} constraints"
                )))
            }
            (Some(cv), constraints) => {
                if cv.ncols() != constraints {
                    return Err(PError::DataModelViolation(format!(
                        "the evaluation returned {} constraint columns for {constraints} problem constraints",
                        cv.ncols()
                    )));
                }
                population.set_constraint_violation(cv)?;
            }
        }
        Ok(())
    }

    /// Re-insert the combined parent and offspring members to produce the next generation's
    /// population of exactly `self.number_of_individuals` members. The combined set is ranked by
    /// constrained non-dominated sorting on the sign-adjusted objectives; levels before the
    /// boundary one survive unconditionally and the boundary level is filled by reference-point
    /// niching.
    ///
    /// # Arguments
    ///
    /// * `offspring`: The evaluated offspring population.
    ///
    /// returns: `Result<Population, PError>`. The next generation's population.
    fn reinsertion(&mut self, offspring: &Population) -> Result<Population, PError> {
        let reference_points = self.reference_points.as_ref().ok_or_else(|| {
            PError::AlgorithmRun(
                "NSGA3".to_string(),
                "the reference points have not been generated yet".to_string(),
            )
        })?;

        let combined = self.population.merge(offspring)?;
        let num = self.number_of_individuals;
        if num > combined.len() {
            return Err(PError::InsufficientIndividuals(num, combined.len()));
        }

        let signed = combined.signed_objectives(&self.problem.objective_directions())?;
        let sort_results = non_dominated_sort(&signed, combined.constraint_violation(), num)?;
        debug!(
            "Ranked {} members up to level {}",
            sort_results.ranked, sort_results.boundary_level
        );

        let mask = select_with_reference_points(
            &signed,
            &sort_results.levels,
            sort_results.boundary_level,
            num,
            reference_points,
            self.fast_niching,
            &mut self.ideal_point,
            self.rng.as_mut(),
        )?;
        combined.select_by_mask(&mask)
    }
}

impl Display for NSGA3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NSGA3 at generation #{}", self.generation)
    }
}

impl Algorithm<NSGA3Options> for NSGA3 {
    /// Generate the reference points, resize the population to the cardinality of the point set,
    /// create and decode the initial chromosomes and evaluate the initial population. The
    /// evaluation counter is reset to the adjusted population size.
    ///
    /// return: `Result<(), PError>`
    fn initialise(&mut self) -> Result<(), PError> {
        info!("Generating the reference points");
        let reference_points = self.reference_point_generator.generate(
            self.problem.number_of_objectives(),
            self.population.requested_size(),
        )?;
        if reference_points.adjusted_population_size != self.population.requested_size() {
            info!(
                "Adjusted the population size from {} to {} to match the reference-point set",
                self.population.requested_size(),
                reference_points.adjusted_population_size
            );
        }
        self.number_of_individuals = reference_points.adjusted_population_size;

        info!("Generating and evaluating the initial population");
        self.population
            .init_chromosomes(self.number_of_individuals, self.rng.as_mut())?;
        Self::evaluate_population(&self.problem, &mut self.population)?;

        self.number_of_function_evaluations = self.population.len();
        self.ideal_point = vec![f64::INFINITY; self.problem.number_of_objectives()];
        self.reference_points = Some(reference_points);
        self.generation = 0;
        info!("Initial evaluation completed");
        Ok(())
    }

    /// Evolve the population by one generation: sample the parents by tournament on the fitness
    /// vector, vary every chromosome segment independently, decode and evaluate the offspring
    /// batch and re-insert the survivors.
    ///
    /// return: `Result<(), PError>`
    fn evolve(&mut self) -> Result<(), PError> {
        debug!("Sampling {} parents", self.number_of_individuals);
        let parent_indices = self.selector.select(
            self.population.fitness(),
            self.number_of_individuals,
            self.rng.as_mut(),
        )?;
        let mut offspring = self.population.select_by_indices(&parent_indices)?;

        debug!("Varying each chromosome segment");
        for (index, variation) in self.segment_variations.iter().enumerate() {
            let varied = variation.apply(
                offspring.chromosome(index)?,
                offspring.segment(index)?,
                self.rng.as_mut(),
            )?;
            offspring.set_chromosome(index, varied)?;
        }

        debug!("Decoding and evaluating the offspring");
        offspring.decode()?;
        Self::evaluate_population(&self.problem, &mut offspring)?;
        self.number_of_function_evaluations += offspring.len();

        debug!("Selecting the survivors");
        self.population = self.reinsertion(&offspring)?;
        self.generation += 1;
        Ok(())
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn number_of_function_evaluations(&self) -> usize {
        self.number_of_function_evaluations
    }

    fn name(&self) -> String {
        "NSGA3".to_string()
    }

    fn start_time(&self) -> &Instant {
        &self.start_time
    }

    fn stopping_condition(&self) -> &StoppingConditionType {
        &self.stopping_condition
    }

    fn population(&self) -> &Population {
        &self.population
    }

    fn problem(&self) -> Arc<dyn Problem> {
        self.problem.clone()
    }

    fn export_history(&self) -> Option<&ExportHistory> {
        self.export_history.as_ref()
    }

    fn algorithm_options(&self) -> NSGA3Options {
        NSGA3Options {
            requested_population_size: self.population.requested_size(),
            number_of_individuals: self.number_of_individuals,
            recombination_probabilities: self
                .segment_variations
                .iter()
                .map(|v| v.recombination_probability())
                .collect(),
            mutation_probabilities: self
                .segment_variations
                .iter()
                .map(|v| v.mutation_probability())
                .collect(),
            fast_niching: self.fast_niching,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::sync::Arc;
    use std::time::Duration;

    use ndarray::{Array2, Axis};

    use crate::algorithms::{
        Algorithm, MaxDuration, MaxGeneration, StoppingConditionType, NSGA3, NSGA3Arg,
    };
    use crate::core::utils::population_from_objectives;
    use crate::core::{EvaluationResult, ObjectiveDirection, PError, Population, Problem, Segment};
    use crate::utils::{DasDennis, ReferencePointGenerator};

    /// A problem minimising the distance of the two phenotype values from two targets.
    #[derive(Debug)]
    struct DummyProblem {
        constraints: usize,
    }

    impl Problem for DummyProblem {
        fn objective_directions(&self) -> Vec<ObjectiveDirection> {
            vec![ObjectiveDirection::Minimise; 2]
        }

        fn number_of_constraints(&self) -> usize {
            self.constraints
        }

        fn evaluate(&self, phenotype: &Array2<f64>) -> Result<EvaluationResult, Box<dyn Error>> {
            let mut objectives = Array2::zeros((phenotype.nrows(), 2));
            for (i, row) in phenotype.axis_iter(Axis(0)).enumerate() {
                objectives[[i, 0]] = row[0];
                objectives[[i, 1]] = 1.0 - row[0];
            }
            let constraint_violation = match self.constraints {
                0 => None,
                _ => Some(Array2::zeros((phenotype.nrows(), self.constraints))),
            };
            Ok(EvaluationResult {
                objectives,
                constraint_violation,
            })
        }
    }

    fn algorithm(population: Population, constraints: usize) -> NSGA3 {
        let args = NSGA3Arg {
            stopping_condition: StoppingConditionType::MaxGeneration(MaxGeneration(10)),
            recombination_probabilities: None,
            mutation_probabilities: None,
            number_of_competitors: None,
            fast_niching: None,
            export_history: None,
            seed: Some(1),
        };
        NSGA3::new(Arc::new(DummyProblem { constraints }), population, args).unwrap()
    }

    /// Prepare an algorithm for direct reinsertion tests: the parents become the current
    /// population and the reference points are generated for `num` individuals.
    fn algorithm_with_parents(parents: Population, num: usize, constraints: usize) -> NSGA3 {
        let template = Population::new(parents.segments().to_vec(), num).unwrap();
        let mut algorithm = algorithm(template, constraints);
        algorithm.population = parents;
        algorithm.number_of_individuals = num;
        algorithm.ideal_point = vec![f64::INFINITY; 2];
        algorithm.reference_points = Some(DasDennis.generate(2, num).unwrap());
        algorithm
    }

    #[test]
    /// The reinsertion returns exactly `num` members and admits every member of the levels
    /// dominating the boundary one.
    fn test_reinsertion_size_and_levels() {
        let parents = population_from_objectives(
            vec![
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![2.0, 2.0],
                vec![3.0, 3.0],
            ],
            None,
        );
        let offspring = population_from_objectives(
            vec![
                vec![0.5, 0.5],
                vec![4.0, 4.0],
                vec![5.0, 5.0],
                vec![6.0, 6.0],
            ],
            None,
        );

        let mut algorithm = algorithm_with_parents(parents, 4, 0);
        let next = algorithm.reinsertion(&offspring).unwrap();
        assert_eq!(next.len(), 4);

        // the first front ([0, 1], [1, 0] and [0.5, 0.5]) dominates the boundary level and is
        // fully admitted
        let objectives = next.objectives().unwrap();
        for front_member in [[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]] {
            assert!(
                objectives
                    .axis_iter(Axis(0))
                    .any(|row| row[0] == front_member[0] && row[1] == front_member[1]),
                "{front_member:?} was excluded by the niching"
            );
        }
    }

    #[test]
    /// The reinsertion fails when the target exceeds the combined population size.
    fn test_reinsertion_insufficient_individuals() {
        let parents = population_from_objectives(vec![vec![0.0, 1.0], vec![1.0, 0.0]], None);
        let offspring = population_from_objectives(vec![vec![0.5, 0.5], vec![2.0, 2.0]], None);

        let mut algorithm = algorithm_with_parents(parents, 10, 0);
        let result = algorithm.reinsertion(&offspring);
        assert!(matches!(
            result,
            Err(PError::InsufficientIndividuals(10, 4))
        ));
    }

    #[test]
    /// With feasible parents and infeasible offspring, the reinsertion only keeps the parents:
    /// the constraint violation dominates the sorting.
    fn test_reinsertion_constrained() {
        let parents = population_from_objectives(
            vec![
                vec![10.0, 10.0],
                vec![11.0, 9.0],
                vec![12.0, 8.0],
                vec![13.0, 7.0],
            ],
            Some(vec![vec![-1.0], vec![-1.0], vec![0.0], vec![-0.5]]),
        );
        // the offspring have far better objectives but all violate the constraint
        let offspring = population_from_objectives(
            vec![
                vec![0.0, 0.0],
                vec![0.1, 0.1],
                vec![0.2, 0.2],
                vec![0.3, 0.3],
            ],
            Some(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]),
        );

        let mut algorithm = algorithm_with_parents(parents, 4, 1);
        let next = algorithm.reinsertion(&offspring).unwrap();
        assert_eq!(next.len(), 4);

        // every survivor is a feasible parent
        let objectives = next.objectives().unwrap();
        for row in objectives.axis_iter(Axis(0)) {
            assert!(row[0] >= 10.0, "an infeasible offspring survived: {row:?}");
        }
    }

    #[test]
    /// The probability overrides are validated against the segment count.
    fn test_probability_override_validation() {
        let segments = vec![
            Segment::permutation(5, 0).unwrap(),
            Segment::real(vec![0.0], vec![1.0]).unwrap(),
        ];
        let population = Population::new(segments, 10).unwrap();

        let args = NSGA3Arg {
            stopping_condition: StoppingConditionType::MaxDuration(MaxDuration(
                Duration::from_secs(1),
            )),
            // one probability for two segments
            recombination_probabilities: Some(vec![0.9]),
            mutation_probabilities: None,
            number_of_competitors: None,
            fast_niching: None,
            export_history: None,
            seed: None,
        };
        let result = NSGA3::new(Arc::new(DummyProblem { constraints: 0 }), population, args);
        assert!(result.is_err());
    }

    #[test]
    /// The reinsertion fails before the algorithm is initialised.
    fn test_reinsertion_requires_initialisation() {
        let parents = population_from_objectives(vec![vec![0.0, 1.0], vec![1.0, 0.0]], None);
        let offspring = population_from_objectives(vec![vec![0.5, 0.5], vec![2.0, 2.0]], None);

        let template = Population::new(parents.segments().to_vec(), 2).unwrap();
        let mut algorithm = algorithm(template, 0);
        algorithm.population = parents;
        assert!(algorithm.reinsertion(&offspring).is_err());
    }

    #[test]
    /// `terminated` is a query with no side effects on the population or the counters.
    fn test_terminated_is_side_effect_free() {
        let segments = vec![Segment::real(vec![0.0], vec![1.0]).unwrap()];
        let population = Population::new(segments, 4).unwrap();
        let mut algorithm = algorithm(population, 0);
        algorithm.initialise().unwrap();

        let nfe = algorithm.number_of_function_evaluations();
        let generation = algorithm.generation();
        let size = algorithm.population().len();
        for _ in 0..3 {
            assert!(!algorithm.terminated());
        }
        assert_eq!(algorithm.number_of_function_evaluations(), nfe);
        assert_eq!(algorithm.generation(), generation);
        assert_eq!(algorithm.population().len(), size);
    }
}
