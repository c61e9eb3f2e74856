/// The preferred solution resulting from a binary comparison.
#[derive(Debug, PartialOrd, PartialEq)]
pub enum PreferredSolution {
    /// The first solution is preferred.
    First,
    /// The second solution is preferred.
    Second,
    /// The two solutions are mutually preferred.
    MutuallyPreferred,
}

/// Calculate the total amount of constraint violation of one individual. Only positive entries
/// count as violations.
///
/// # Arguments
///
/// * `constraint_violation`: The constraint-violation row of the individual.
///
/// returns: `f64`
pub fn total_violation(constraint_violation: &[f64]) -> f64 {
    constraint_violation.iter().map(|v| v.max(0.0)).sum()
}

/// This assesses the Pareto dominance between two solutions $S_1$ and $S_2$ and their constraint
/// violations in constrained multi-objective optimisation problems. A solution $S_1$
/// constraint-dominates $S_2$ if:
/// 1) $S_1$ is feasible but $S_2$ is not;
/// 2) both $S_1$ and $S_2$ are infeasible and $CV(S_1) < CV(S_2)$ (where $CV$ is the total
///    constraint violation); or
/// 3) both are feasible and $S_1$ Pareto-dominates $S_2$.
///
/// See:
///  - Kalyanmoy Deb & Samir Agrawal. (2002). <https://doi.org/10.1007/978-3-7091-6384-9_40>.
///  - Shuang Li, Ke Li, Wei Li. (2022). <https://doi.org/10.48550/arXiv.2205.14349>.
pub struct ConstrainedDominance;

impl ConstrainedDominance {
    /// Get the dominance relation between two solutions. The objective values must already be
    /// sign-adjusted so that every objective is minimised.
    ///
    /// # Arguments
    ///
    /// * `first_objectives`: The objective values of the first solution.
    /// * `first_violation`: The total constraint violation of the first solution. `None` for
    ///   unconstrained problems.
    /// * `second_objectives`: The objective values of the second solution.
    /// * `second_violation`: The total constraint violation of the second solution.
    ///
    /// returns: `PreferredSolution`. The dominance relation between solution 1 and 2.
    pub fn compare(
        first_objectives: &[f64],
        first_violation: Option<f64>,
        second_objectives: &[f64],
        second_violation: Option<f64>,
    ) -> PreferredSolution {
        // at least one solution is not feasible (step 1-2)
        if let (Some(cv1), Some(cv2)) = (first_violation, second_violation) {
            if cv1 != cv2 {
                if cv1 <= 0.0 {
                    // solution 1 is feasible and dominates
                    return PreferredSolution::First;
                } else if cv2 <= 0.0 {
                    // solution 2 is feasible and dominates
                    return PreferredSolution::Second;
                } else if cv1 < cv2 {
                    return PreferredSolution::First;
                } else {
                    return PreferredSolution::Second;
                }
            }
        }

        // check Pareto dominance using all the objectives (step 3)
        let mut relation = PreferredSolution::MutuallyPreferred;
        for (v1, v2) in first_objectives.iter().zip(second_objectives) {
            if v1 < v2 {
                if relation == PreferredSolution::Second {
                    // mutually dominated
                    return PreferredSolution::MutuallyPreferred;
                }
                relation = PreferredSolution::First;
            } else if v1 > v2 {
                if relation == PreferredSolution::First {
                    // mutually dominated
                    return PreferredSolution::MutuallyPreferred;
                }
                relation = PreferredSolution::Second;
            }
        }

        relation
    }
}
