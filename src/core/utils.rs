use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Get the random number generator. If no seed is provided, this is randomly generated.
///
/// # Arguments
///
/// * `seed`: The optional seed number.
///
/// returns: `Box<dyn RngCore>`
pub(crate) fn get_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    let rng = match seed {
        None => ChaCha8Rng::from_entropy(),
        Some(s) => ChaCha8Rng::seed_from_u64(s),
    };
    Box::new(rng)
}

/// Compare two arrays of floats within an absolute tolerance. This is only used in tests.
///
/// # Arguments
///
/// * `calculated`: The calculated values.
/// * `expected`: The expected values.
/// * `epsilon`: The absolute tolerance. Defaults to `0.0001`.
#[cfg(test)]
pub(crate) fn assert_approx_array_eq(calculated: &[f64], expected: &[f64], epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(0.0001);
    assert_eq!(
        calculated.len(),
        expected.len(),
        "The array lengths do not match"
    );
    for (i, (c, e)) in calculated.iter().zip(expected).enumerate() {
        assert!(
            (c - e).abs() <= epsilon,
            "Value at index {i} is {c} but {e} was expected"
        );
    }
}

/// Build an evaluated population from a matrix of objective values and optional constraint
/// violations. The population uses one dummy real segment; only the objective and constraint
/// matrices matter to the sorting and selection tests using this helper.
#[cfg(test)]
pub(crate) fn population_from_objectives(
    objectives: Vec<Vec<f64>>,
    constraint_violation: Option<Vec<Vec<f64>>>,
) -> crate::core::Population {
    use ndarray::Array2;

    use crate::core::{Population, Segment};

    let size = objectives.len();
    let columns = objectives[0].len();
    let segments = vec![Segment::real(vec![0.0], vec![1.0]).unwrap()];
    let mut population = Population::new(segments, size).unwrap();
    let mut rng = get_rng(Some(0));
    population.init_chromosomes(size, &mut rng).unwrap();

    let flat: Vec<f64> = objectives.into_iter().flatten().collect();
    let objectives = Array2::from_shape_vec((size, columns), flat).unwrap();
    population.set_objectives(objectives).unwrap();

    if let Some(cv) = constraint_violation {
        let columns = cv[0].len();
        let flat: Vec<f64> = cv.into_iter().flatten().collect();
        let cv = Array2::from_shape_vec((size, columns), flat).unwrap();
        population.set_constraint_violation(cv).unwrap();
    }
    population
}
