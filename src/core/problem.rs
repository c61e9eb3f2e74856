use std::error::Error;
use std::fmt::Debug;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Whether an objective should be minimised or maximised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    /// Minimise an objective.
    Minimise,
    /// Maximise an objective.
    Maximise,
}

impl ObjectiveDirection {
    /// Get the sign used to convert an objective value to a minimised one. Values of maximised
    /// objectives are multiplied by `-1` so that the selection machinery can always minimise.
    ///
    /// returns: `f64`
    pub fn sign(&self) -> f64 {
        match self {
            ObjectiveDirection::Minimise => 1.0,
            ObjectiveDirection::Maximise => -1.0,
        }
    }
}

/// The data returned by an evaluation of a whole population.
#[derive(Debug)]
pub struct EvaluationResult {
    /// The objective values, one row per individual and one column per objective.
    pub objectives: Array2<f64>,
    /// The constraint violations, one row per individual and one column per constraint. Positive
    /// entries are violations, entries at or below `0` mean the constraint is satisfied. `None`
    /// for unconstrained problems.
    pub constraint_violation: Option<Array2<f64>>,
}

/// The trait to define an optimisation problem. The problem evaluates the decoded decision
/// variables (the phenotype matrix) of a whole population in one call and reports the objective
/// values and, for constrained problems, the constraint violations, row-for-row with the input.
///
/// # Example
/// ```
/// use std::error::Error;
/// use ndarray::{Array2, Axis};
/// use polygene::core::{EvaluationResult, ObjectiveDirection, Problem};
///
/// /// Minimise the sum and the spread of the decision variables.
/// #[derive(Debug)]
/// struct SumProblem;
///
/// impl Problem for SumProblem {
///     fn objective_directions(&self) -> Vec<ObjectiveDirection> {
///         vec![ObjectiveDirection::Minimise; 2]
///     }
///
///     fn evaluate(&self, phenotype: &Array2<f64>) -> Result<EvaluationResult, Box<dyn Error>> {
///         let mut objectives = Array2::zeros((phenotype.nrows(), 2));
///         for (i, row) in phenotype.axis_iter(Axis(0)).enumerate() {
///             let mean = row.mean().unwrap_or(0.0);
///             objectives[[i, 0]] = row.sum();
///             objectives[[i, 1]] = row.iter().map(|v| (v - mean).abs()).sum();
///         }
///         Ok(EvaluationResult {
///             objectives,
///             constraint_violation: None,
///         })
///     }
/// }
/// ```
pub trait Problem: Debug {
    /// The direction of each problem objective.
    ///
    /// returns: `Vec<ObjectiveDirection>`
    fn objective_directions(&self) -> Vec<ObjectiveDirection>;

    /// The number of problem objectives.
    ///
    /// returns: `usize`
    fn number_of_objectives(&self) -> usize {
        self.objective_directions().len()
    }

    /// The number of problem constraints. Unconstrained problems return `0`.
    ///
    /// returns: `usize`
    fn number_of_constraints(&self) -> usize {
        0
    }

    /// Evaluate the phenotype of a whole population. The returned matrices must have one row per
    /// phenotype row; the algorithm rejects misaligned results.
    ///
    /// # Arguments
    ///
    /// * `phenotype`: The decoded decision variables, one row per individual.
    ///
    /// returns: `Result<EvaluationResult, Box<dyn Error>>`
    fn evaluate(&self, phenotype: &Array2<f64>) -> Result<EvaluationResult, Box<dyn Error>>;
}

/// The problem configuration exported to JSON.
#[derive(Serialize, Deserialize, Debug)]
pub struct ProblemExport {
    /// The number of objectives.
    pub number_of_objectives: usize,
    /// The direction of each objective.
    pub objective_directions: Vec<ObjectiveDirection>,
    /// The number of constraints.
    pub number_of_constraints: usize,
}

impl ProblemExport {
    /// Export the configuration of a problem.
    ///
    /// # Arguments
    ///
    /// * `problem`: The problem being solved.
    ///
    /// returns: `ProblemExport`
    pub fn from_problem(problem: &dyn Problem) -> Self {
        Self {
            number_of_objectives: problem.number_of_objectives(),
            objective_directions: problem.objective_directions(),
            number_of_constraints: problem.number_of_constraints(),
        }
    }
}

/// Problems used in the examples and the tests.
pub mod builtin_problems {
    use std::error::Error;

    use ndarray::{Array2, Axis};

    use crate::core::{EvaluationResult, ObjectiveDirection, PError, Problem};

    /// The DTLZ1 problem, with a linear Pareto front on the hyper-plane crossing each objective
    /// axis at 0.5.
    ///
    /// Implemented based on:
    /// > K. Deb, L. Thiele, M. Laumanns and E. Zitzler. Scalable test problems for evolutionary
    /// > multiobjective optimization. Evolutionary Multiobjective Optimization, pp. 105-145,
    /// > Springer, 2005. <https://doi.org/10.1007/1-84628-137-7_6>
    #[derive(Debug)]
    pub struct Dtlz1Problem {
        /// The number of decision variables.
        number_of_variables: usize,
        /// The number of objectives.
        number_of_objectives: usize,
    }

    impl Dtlz1Problem {
        /// Create the DTLZ1 problem. All the variables are bounded between 0 and 1.
        ///
        /// # Arguments
        ///
        /// * `number_of_variables`: The number of decision variables.
        /// * `number_of_objectives`: The number of objectives. This must be smaller than the
        ///   number of variables.
        ///
        /// returns: `Result<Dtlz1Problem, PError>`
        pub fn new(
            number_of_variables: usize,
            number_of_objectives: usize,
        ) -> Result<Self, PError> {
            if number_of_objectives < 2 {
                return Err(PError::Configuration(
                    "DTLZ1".to_string(),
                    "at least 2 objectives are required".to_string(),
                ));
            }
            if number_of_variables < number_of_objectives {
                return Err(PError::Configuration(
                    "DTLZ1".to_string(),
                    format!(
                        "the number of variables ({number_of_variables}) must be at least the number of objectives ({number_of_objectives})"
                    ),
                ));
            }
            Ok(Self {
                number_of_variables,
                number_of_objectives,
            })
        }
    }

    impl Problem for Dtlz1Problem {
        fn objective_directions(&self) -> Vec<ObjectiveDirection> {
            vec![ObjectiveDirection::Minimise; self.number_of_objectives]
        }

        fn evaluate(&self, phenotype: &Array2<f64>) -> Result<EvaluationResult, Box<dyn Error>> {
            let m = self.number_of_objectives;
            let k = self.number_of_variables - m + 1;
            let mut objectives = Array2::zeros((phenotype.nrows(), m));

            for (i, x) in phenotype.axis_iter(Axis(0)).enumerate() {
                let g: f64 = 100.0
                    * (k as f64
                        + x.iter()
                            .skip(m - 1)
                            .map(|v| {
                                (v - 0.5).powi(2) - (20.0 * std::f64::consts::PI * (v - 0.5)).cos()
                            })
                            .sum::<f64>());

                for oi in 0..m {
                    let mut f = 0.5 * (1.0 + g);
                    for x_j in x.iter().take(m - 1 - oi) {
                        f *= x_j;
                    }
                    if oi > 0 {
                        f *= 1.0 - x[m - 1 - oi];
                    }
                    objectives[[i, oi]] = f;
                }
            }

            Ok(EvaluationResult {
                objectives,
                constraint_violation: None,
            })
        }
    }

    /// A bi-objective mixed-encoding problem over an assignment order and a vector of effort
    /// levels. The phenotype holds a permutation of `tasks` values followed by `levels` numbers
    /// between 0 and 1. The first objective rewards orders close to the identity with low effort;
    /// the second rewards reversed orders with high effort, so the two objectives conflict along
    /// both chromosome segments and the trade-off along the effort axis is non-linear.
    #[derive(Debug)]
    pub struct MixedAssignmentProblem {
        /// The number of tasks in the assignment order.
        tasks: usize,
        /// The number of effort levels.
        levels: usize,
        /// The largest mean effort allowed by the problem constraint, if any.
        effort_cap: Option<f64>,
    }

    impl MixedAssignmentProblem {
        /// Create the problem without constraints.
        ///
        /// # Arguments
        ///
        /// * `tasks`: The number of tasks in the assignment order.
        /// * `levels`: The number of effort levels.
        ///
        /// returns: `Result<MixedAssignmentProblem, PError>`
        pub fn new(tasks: usize, levels: usize) -> Result<Self, PError> {
            if tasks < 2 || levels == 0 {
                return Err(PError::Configuration(
                    "mixed assignment".to_string(),
                    "at least 2 tasks and 1 effort level are required".to_string(),
                ));
            }
            Ok(Self {
                tasks,
                levels,
                effort_cap: None,
            })
        }

        /// Add a constraint capping the mean effort level.
        ///
        /// # Arguments
        ///
        /// * `cap`: The largest mean effort allowed. Solutions above the cap violate the
        ///   constraint by the exceedance.
        ///
        /// returns: `MixedAssignmentProblem`
        pub fn with_effort_cap(mut self, cap: f64) -> Self {
            self.effort_cap = Some(cap);
            self
        }

        /// The largest possible total displacement of a permutation from the identity order.
        fn max_displacement(&self) -> f64 {
            let n = self.tasks;
            ((n * n) / 2) as f64
        }
    }

    impl Problem for MixedAssignmentProblem {
        fn objective_directions(&self) -> Vec<ObjectiveDirection> {
            vec![ObjectiveDirection::Minimise; 2]
        }

        fn number_of_constraints(&self) -> usize {
            self.effort_cap.is_some() as usize
        }

        fn evaluate(&self, phenotype: &Array2<f64>) -> Result<EvaluationResult, Box<dyn Error>> {
            let mut objectives = Array2::zeros((phenotype.nrows(), 2));
            let mut violations = self
                .effort_cap
                .map(|_| Array2::zeros((phenotype.nrows(), 1)));

            for (i, row) in phenotype.axis_iter(Axis(0)).enumerate() {
                let displacement: f64 = row
                    .iter()
                    .take(self.tasks)
                    .enumerate()
                    .map(|(j, p)| (p - j as f64).abs())
                    .sum();
                let disorder = displacement / self.max_displacement();

                let effort: f64 = row.iter().skip(self.tasks).sum::<f64>() / self.levels as f64;

                objectives[[i, 0]] = disorder + effort;
                objectives[[i, 1]] = (1.0 - disorder) + (1.0 - effort).powi(2);

                if let (Some(cv), Some(cap)) = (violations.as_mut(), self.effort_cap) {
                    cv[[i, 0]] = effort - cap;
                }
            }

            Ok(EvaluationResult {
                objectives,
                constraint_violation: violations,
            })
        }
    }

    #[cfg(test)]
    mod test {
        use float_cmp::assert_approx_eq;
        use ndarray::array;

        use crate::core::problem::builtin_problems::{Dtlz1Problem, MixedAssignmentProblem};
        use crate::core::Problem;

        #[test]
        /// The DTLZ1 objectives sum to 0.5 (1 + g) for any solution; on the Pareto front
        /// (x_i = 0.5 for the distance variables) they sum to 0.5 exactly.
        fn test_dtlz1_front() {
            let problem = Dtlz1Problem::new(7, 3).unwrap();
            let phenotype = array![[0.2, 0.7, 0.5, 0.5, 0.5, 0.5, 0.5]];
            let result = problem.evaluate(&phenotype).unwrap();

            let sum: f64 = result.objectives.row(0).iter().sum();
            assert_approx_eq!(f64, sum, 0.5, epsilon = 1e-6);
        }

        #[test]
        /// The constrained variant reports the exceedance of the mean effort.
        fn test_mixed_assignment_constraint() {
            let problem = MixedAssignmentProblem::new(3, 2)
                .unwrap()
                .with_effort_cap(0.5);
            assert_eq!(problem.number_of_constraints(), 1);

            // identity order, mean effort 0.8
            let phenotype = array![[0.0, 1.0, 2.0, 0.7, 0.9]];
            let result = problem.evaluate(&phenotype).unwrap();
            let cv = result.constraint_violation.unwrap();
            assert_approx_eq!(f64, cv[[0, 0]], 0.3, epsilon = 1e-9);

            // the identity order with low effort minimises the first objective
            assert_approx_eq!(f64, result.objectives[[0, 0]], 0.8, epsilon = 1e-9);
        }
    }
}
