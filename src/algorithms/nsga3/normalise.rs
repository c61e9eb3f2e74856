use log::debug;
use ndarray::{Array2, Axis};

use crate::core::PError;
use crate::utils::{
    solve_linear_system, vector_max, vector_min, LinearSolverTolerance,
};

/// This implements "Algorithm 2" in the paper which normalises the candidate members using the
/// adaptive ideal point and the intercepts of the hyper-plane passing through the extreme points
/// and crossing the objective space axis. Steps 8-10 are ignored because this implementation
/// directly uses Das and Dennis's approach with already-normalised reference points.
///
/// This procedure:
///  - updates the ideal point. The new coordinates may differ from the original point if any
///    objective, calculated at the current evolution, is lower than the one at the previous
///    evolution.
///  - scales the objectives with respect to the new ideal point and the hyper-plane intercepts.
pub(crate) struct Normalise<'a> {
    /// The coordinates of the ideal point from the previous evolution.
    ideal_point: &'a mut Vec<f64>,
    /// The sign-adjusted objectives of the candidate members, one row per candidate.
    objectives: &'a Array2<f64>,
}

/// The data calculated by the normalisation algorithm.
pub(crate) struct NormalisationOutcome {
    /// The normalised objectives, row-aligned with the candidate members.
    pub normalised: Array2<f64>,
    /// The extreme points used to calculate the hyper-plane intercepts.
    #[allow(dead_code)]
    pub extreme_points: Vec<Vec<f64>>,
    /// The objective intercepts of the plane.
    #[allow(dead_code)]
    pub intercepts: Vec<f64>,
}

impl<'a> Normalise<'a> {
    /// Build the [`Normalise`] struct.
    ///
    /// # Arguments
    ///
    /// * `ideal_point`: The coordinates of the ideal point from the previous evolution.
    /// * `objectives`: The sign-adjusted objectives of the members to normalise.
    ///
    /// returns: `Result<Normalise, PError>`
    pub fn new(
        ideal_point: &'a mut Vec<f64>,
        objectives: &'a Array2<f64>,
    ) -> Result<Self, PError> {
        let name = "NSGA3-Normalise".to_string();
        if objectives.nrows() == 0 {
            return Err(PError::AlgorithmRun(
                name,
                "the objective matrix is empty".to_string(),
            ));
        }
        if ideal_point.len() != objectives.ncols() {
            return Err(PError::AlgorithmRun(
                name,
                format!(
                    "the ideal point has {} coordinates but the problem has {} objectives",
                    ideal_point.len(),
                    objectives.ncols()
                ),
            ));
        }

        Ok(Normalise {
            ideal_point,
            objectives,
        })
    }

    /// Normalise the candidate members using "Algorithm 2" from the paper. Objectives are first
    /// translated with respect to the new ideal point and then scaled using the intercepts of the
    /// linear hyper-plane passing through the extreme points.
    ///
    /// This updates the ideal point stored by the algorithm.
    ///
    /// returns: `Result<NormalisationOutcome, PError>`. The normalised objectives and the points
    /// calculated in the normalisation.
    pub fn calculate(&mut self) -> Result<NormalisationOutcome, PError> {
        let number_of_objectives = self.objectives.ncols();

        // Step 2 - calculate the new ideal point (based on paragraph IV-C), as the minimum value
        // for each objective from the start of the algorithm evolution up to the current
        // evolution step.
        for j in 0..number_of_objectives {
            let new_min = vector_min(&self.objectives.column(j).to_vec())?;
            // update the point coordinate if it is smaller
            if new_min < self.ideal_point[j] {
                self.ideal_point[j] = new_min;
            }
        }
        debug!("Set ideal point to {:?}", self.ideal_point);

        // Step 3 - translate the objectives with respect to the ideal point. This implements the
        // calculation of `f'_j(x)` in section IV-C of the paper.
        let mut translated = self.objectives.clone();
        for (j, coordinate) in self.ideal_point.iter().enumerate() {
            translated.column_mut(j).mapv_inplace(|v| v - coordinate);
        }

        // Step 4 - calculate the vector of extreme points
        let mut extreme_points = vec![];
        for j in 0..number_of_objectives {
            // extreme point z_j_max for the current objective
            let mut weights = vec![10.0_f64.powi(-6); number_of_objectives];
            weights[j] = 1.0;

            let mut min_value = f64::INFINITY; // minimum ASF
            let mut row_index = 0; // index of the member with minimum ASF
            for (x_idx, row) in translated.axis_iter(Axis(0)).enumerate() {
                let value = Self::asf(&row.to_vec(), &weights)?;
                if value < min_value {
                    min_value = value;
                    row_index = x_idx;
                }
            }
            extreme_points.push(translated.row(row_index).to_vec());
        }
        debug!("Set extreme points to {:?}", extreme_points);

        // Step 6 - compute the intercepts a_j with the least-square method
        let intercept_result = Self::calculate_plane_intercepts(&extreme_points, None)?;
        let intercepts: Vec<f64> = match intercept_result {
            None => {
                // no solution found or intercepts are too small - get the worst (max) value for
                // each translated objective
                Self::calculate_max_objectives(&translated)?
            }
            Some(i) => {
                debug!("Found intercepts {:?}", i);
                i
            }
        };

        // Step 7 - normalise the objectives (f_n). The denominator differs from Eq. 5 in the
        // paper because the intercepts are already calculated using the translated objectives.
        let mut normalised = translated;
        for (j, intercept) in intercepts.iter().enumerate() {
            normalised.column_mut(j).mapv_inplace(|v| v / intercept);
        }

        Ok(NormalisationOutcome {
            normalised,
            extreme_points,
            intercepts,
        })
    }

    /// Use the least square method to calculate the coefficients of the equation of the plane
    /// passing through the vector of `points`. For example, for a 3D system the equation being
    /// used is: $ax + by + cz = 1$. The coefficient vector $x = [a, b, c]$ is found by solving
    /// the linear system $A \cdot x = b$ where `A` is
    ///
    ///          | x_0   y_0   z_0 |
    ///      A = | x_1   y_1   z_1 |
    ///          |       ...       |
    ///          | x_n   y_n   z_n |
    /// `n` the size of `points` and $b = [1, 1, 1]$. The intercepts are then calculated as the
    /// inverse of `x` as $1/x$. For example for the z-axis intercept (with x=0 and y=0), the
    /// point is found by solving $cz = 1$ or $1/x\[2\]$.
    ///
    /// # Arguments
    ///
    /// * `points`: The point coordinates passing through the plane to calculate.
    /// * `tolerance`: The tolerance of the linear solver to accept whether the found solution is
    ///   acceptable.
    ///
    /// returns: `Result<Option<Vec<f64>>, PError>`: The $ a_i $ intercept values for each axis
    /// (see Fig. 2 in the paper) or `None` if the intercepts are close to `0` or no solution was
    /// found.
    fn calculate_plane_intercepts(
        points: &[Vec<f64>],
        tolerance: Option<LinearSolverTolerance>,
    ) -> Result<Option<Vec<f64>>, PError> {
        let b = vec![1.0; points.len()];
        let plane_coefficients = match solve_linear_system(points, &b, tolerance) {
            Ok(coefficients) => coefficients,
            Err(e) => {
                debug!("The intercept solve failed because: {e}");
                return Ok(None);
            }
        };
        debug!("Plane coefficients {:?}", plane_coefficients);

        let intercepts: Vec<f64> = plane_coefficients.iter().map(|v| 1.0 / v).collect();

        // check that the intercepts are above the minimum threshold
        if intercepts.iter().all(|v| *v >= 10_f64.powi(-3)) {
            Ok(Some(intercepts))
        } else {
            Ok(None)
        }
    }

    /// Calculate the maximum value for each translated objective, used as intercept fallback.
    ///
    /// # Arguments
    ///
    /// * `translated`: The translated objectives.
    ///
    /// return: `Result<Vec<f64>, PError>`
    fn calculate_max_objectives(translated: &Array2<f64>) -> Result<Vec<f64>, PError> {
        let mut max_points = vec![];
        for j in 0..translated.ncols() {
            let mut obj_j_values = translated.column(j).to_vec();
            obj_j_values.push(f64::EPSILON);
            max_points.push(vector_max(&obj_j_values)?);
        }
        debug!("Using maximum points as intercepts {:?}", max_points);
        Ok(max_points)
    }

    /// Calculate the achievement scalarising function with weight vector `w`. This is Eq. 4 in
    /// the paper.
    ///
    /// # Arguments
    ///
    /// * `translated_objective`: The translated objectives for one member. This is f'_j(x).
    /// * `weights`: The weight vector.
    ///
    /// returns: `Result<f64, PError>`
    fn asf(translated_objective: &[f64], weights: &[f64]) -> Result<f64, PError> {
        let asf: Vec<f64> = translated_objective
            .iter()
            .zip(weights)
            .map(|(x, w)| x / w)
            .collect();
        vector_max(&asf)
    }
}
