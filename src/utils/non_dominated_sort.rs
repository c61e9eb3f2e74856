use log::debug;
use ndarray::Array2;

use crate::core::PError;
use crate::operators::{total_violation, ConstrainedDominance, PreferredSolution};

/// Outputs of the non-dominated sort algorithm.
#[derive(Debug)]
pub struct NonDominatedSortResults {
    /// The non-domination level of each individual, starting from 1 for the first front. The
    /// sorting stops once `limit` individuals have been ranked, so individuals on worse fronts
    /// may carry no level.
    pub levels: Vec<Option<usize>>,
    /// The last level needed to reach at least `limit` individuals. Individuals on this level may
    /// only partially fit in the next generation and undergo niche-based selection.
    pub boundary_level: usize,
    /// The number of ranked individuals across all levels up to `boundary_level`.
    pub ranked: usize,
}

/// Non-dominated fast sorting from the NSGA-II paper (with complexity $O(M * N^2)$, where `M` is
/// the number of objectives and `N` the number of individuals), bounded to rank only as many
/// complete fronts as needed to cover `limit` individuals.
///
/// Solutions are compared with the constrained-dominance relation (see
/// [`ConstrainedDominance`]): individuals violating the constraints always rank behind feasible
/// ones, so feasible solutions fill the first fronts regardless of their objectives.
///
/// Implemented based on paragraph 3A in:
/// > K. Deb, A. Pratap, S. Agarwal and T. Meyarivan, "A fast and elitist multi-objective genetic
/// > algorithm: NSGA-II," in IEEE Transactions on Evolutionary Computation, vol. 6, no. 2, pp.
/// > 182-197, April 2002, doi: 10.1109/4235.996017.
///
/// # Arguments
///
/// * `objectives`: The objective matrix, one row per individual. The columns must already be
///   sign-adjusted so that every objective is minimised.
/// * `constraint_violation`: The constraint-violation matrix, one row per individual. `None` for
///   unconstrained problems.
/// * `limit`: The number of individuals to rank. The sorting stops once the ranked fronts cover
///   at least this many individuals.
///
/// returns: `Result<NonDominatedSortResults, PError>`.
pub fn non_dominated_sort(
    objectives: &Array2<f64>,
    constraint_violation: Option<&Array2<f64>>,
    limit: usize,
) -> Result<NonDominatedSortResults, PError> {
    let name = "fast non-dominated sort".to_string();
    let number_of_individuals = objectives.nrows();
    if number_of_individuals < 2 {
        return Err(PError::SurvivalOperator(
            name,
            format!("at least 2 individuals are needed for sorting, but {number_of_individuals} given"),
        ));
    }
    if limit == 0 || limit > number_of_individuals {
        return Err(PError::SurvivalOperator(
            name,
            format!(
                "the number of individuals to rank ({limit}) must be between 1 and the population size ({number_of_individuals})"
            ),
        ));
    }
    if let Some(cv) = constraint_violation {
        if cv.nrows() != number_of_individuals {
            return Err(PError::DataModelViolation(format!(
                "the constraint matrix has {} rows but the objective matrix has {number_of_individuals}",
                cv.nrows()
            )));
        }
    }

    let rows: Vec<Vec<f64>> = objectives.rows().into_iter().map(|r| r.to_vec()).collect();
    let violations: Option<Vec<f64>> = constraint_violation
        .map(|cv| cv.rows().into_iter().map(|r| total_violation(&r.to_vec())).collect());
    let violation_of = |index: usize| violations.as_ref().map(|v| v[index]);

    // this set contains all the individuals being dominated by an individual `p`. This is `S_p`
    // in the paper
    let mut dominated_solutions: Vec<Vec<usize>> = vec![Vec::new(); number_of_individuals];
    // number of individuals that dominate `p`. When the counter is 0, `p` is non-dominated. This
    // is `n_p` in the paper
    let mut domination_counter: Vec<usize> = vec![0; number_of_individuals];

    // the front of given rank containing non-dominated solutions
    let mut current_front: Vec<usize> = Vec::new();
    let mut levels: Vec<Option<usize>> = vec![None; number_of_individuals];

    for pi in 0..number_of_individuals {
        for qi in pi..number_of_individuals {
            match ConstrainedDominance::compare(
                &rows[pi],
                violation_of(pi),
                &rows[qi],
                violation_of(qi),
            ) {
                PreferredSolution::First => {
                    // `p` dominates `q` - add `q` to the set of solutions dominated by `p`
                    dominated_solutions[pi].push(qi);
                    domination_counter[qi] += 1;
                }
                PreferredSolution::Second => {
                    // `q` dominates `p`
                    dominated_solutions[qi].push(pi);
                    domination_counter[pi] += 1;
                }
                PreferredSolution::MutuallyPreferred => {
                    // skip this
                }
            }
        }

        // the solution `p` is not dominated by any other; it belongs to the first front
        if domination_counter[pi] == 0 {
            current_front.push(pi);
            levels[pi] = Some(1);
        }
    }

    // collect the fronts until enough individuals are ranked
    let mut level: usize = 1;
    let mut ranked = current_front.len();
    while ranked < limit {
        let mut next_front: Vec<usize> = Vec::new();
        // loop individuals in the current non-dominated front
        for pi in current_front.iter() {
            // loop solutions that are dominated by `p` in the current front
            for qi in dominated_solutions[*pi].iter() {
                // decrement the domination count for individual `q`
                domination_counter[*qi] -= 1;

                // if the counter is 0 then `q` is not dominated by any individual in the
                // subsequent fronts and it belongs to the next front
                if domination_counter[*qi] == 0 {
                    next_front.push(*qi);
                    levels[*qi] = Some(level + 1);
                }
            }
        }

        if next_front.is_empty() {
            return Err(PError::SurvivalOperator(
                "fast non-dominated sort".to_string(),
                format!("only {ranked} individuals could be ranked out of the {limit} requested"),
            ));
        }
        level += 1;
        ranked += next_front.len();
        current_front = next_front;
    }

    debug!("Ranked {ranked} individuals over {level} levels");
    Ok(NonDominatedSortResults {
        levels,
        boundary_level: level,
        ranked,
    })
}

#[cfg(test)]
mod test {
    use ndarray::Array2;

    use crate::utils::non_dominated_sort;

    fn objectives_matrix(values: Vec<[f64; 2]>) -> Array2<f64> {
        let flat: Vec<f64> = values.iter().flatten().copied().collect();
        Array2::from_shape_vec((values.len(), 2), flat).unwrap()
    }

    #[test]
    /// Test the non-dominated sorting. The resulting fronts and ranks were manually calculated by
    /// plotting the objective values.
    fn test_sorting_2obj() {
        let objectives = objectives_matrix(vec![
            [1.1, 8.1],
            [2.1, 6.1],
            [3.1, 4.1],
            [3.1, 7.1],
            [5.1, 3.1],
            [5.1, 5.1],
            [7.1, 7.1],
            [8.1, 2.1],
            [10.1, 6.1],
            [11.1, 1.1],
            [11.1, 3.1],
        ]);
        let result = non_dominated_sort(&objectives, None, objectives.nrows()).unwrap();

        // non-dominated front
        for idx in [0, 1, 2, 4, 7, 9] {
            assert_eq!(result.levels[idx], Some(1));
        }
        // other fronts
        for idx in [3, 5, 10] {
            assert_eq!(result.levels[idx], Some(2));
        }
        for idx in [6, 8] {
            assert_eq!(result.levels[idx], Some(3));
        }

        assert_eq!(result.boundary_level, 3);
        assert_eq!(result.ranked, 11);
    }

    #[test]
    /// The sorting stops once the ranked fronts cover the requested limit; worse fronts carry no
    /// level.
    fn test_bounded_sorting() {
        let objectives = objectives_matrix(vec![
            [1.1, 8.1],
            [2.1, 6.1],
            [3.1, 4.1],
            [3.1, 7.1],
            [5.1, 3.1],
            [5.1, 5.1],
            [7.1, 7.1],
            [8.1, 2.1],
            [10.1, 6.1],
            [11.1, 1.1],
            [11.1, 3.1],
        ]);

        // the first front holds 6 individuals and covers the limit
        let result = non_dominated_sort(&objectives, None, 5).unwrap();
        assert_eq!(result.boundary_level, 1);
        assert_eq!(result.ranked, 6);
        for idx in [3, 5, 6, 8, 10] {
            assert_eq!(result.levels[idx], None);
        }

        // two fronts are needed to cover 7 individuals
        let result = non_dominated_sort(&objectives, None, 7).unwrap();
        assert_eq!(result.boundary_level, 2);
        assert_eq!(result.ranked, 9);
        for idx in [6, 8] {
            assert_eq!(result.levels[idx], None);
        }
    }

    #[test]
    /// Individuals violating the constraints rank behind all the feasible ones, regardless of
    /// their objective values.
    fn test_constrained_sorting() {
        let objectives = objectives_matrix(vec![
            [0.0, 0.0],
            [1.0, 1.0],
            [10.0, 10.0],
            [20.0, 20.0],
        ]);
        // the two best solutions are infeasible
        let cv = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, -1.0, 0.0]).unwrap();

        let result = non_dominated_sort(&objectives, Some(&cv), 4).unwrap();

        // feasible solutions fill the first front
        assert_eq!(result.levels[2], Some(1));
        assert_eq!(result.levels[3], Some(2));
        // infeasible solutions are sorted by their total violation
        assert_eq!(result.levels[0], Some(3));
        assert_eq!(result.levels[1], Some(4));
    }

    #[test]
    /// Invalid inputs are rejected.
    fn test_input_validation() {
        let objectives = objectives_matrix(vec![[1.0, 1.0], [2.0, 2.0]]);
        assert!(non_dominated_sort(&objectives, None, 0).is_err());
        assert!(non_dominated_sort(&objectives, None, 3).is_err());

        let one_row = objectives_matrix(vec![[1.0, 1.0]]);
        assert!(non_dominated_sort(&one_row, None, 1).is_err());

        let cv = Array2::zeros((3, 1));
        assert!(non_dominated_sort(&objectives, Some(&cv), 2).is_err());
    }
}
