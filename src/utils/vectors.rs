use crate::core::PError;

/// Returns the index of the smallest value and the value itself. When more values share the
/// minimum, the index of the first one is returned.
///
/// # Arguments
///
/// * `data`: The vector.
///
/// returns: `(usize, f64)`
pub fn argmin(data: &[f64]) -> (usize, f64) {
    let mut min_index = 0;
    let mut min_value = f64::INFINITY;
    for (index, value) in data.iter().enumerate() {
        if *value < min_value {
            min_index = index;
            min_value = *value;
        }
    }
    (min_index, min_value)
}

/// Calculate the vector minimum value.
///
/// # Arguments
///
/// * `v`: The vector.
///
/// returns: `Result<f64, PError>`
pub fn vector_min(v: &[f64]) -> Result<f64, PError> {
    Ok(*v
        .iter()
        .min_by(|a, b| a.total_cmp(b))
        .ok_or(PError::Generic(
            "Cannot calculate vector min value".to_string(),
        ))?)
}

/// Calculate the vector maximum value.
///
/// # Arguments
///
/// * `v`: The vector.
///
/// returns: `Result<f64, PError>`
pub fn vector_max(v: &[f64]) -> Result<f64, PError> {
    Ok(*v
        .iter()
        .max_by(|a, b| a.total_cmp(b))
        .ok_or(PError::Generic(
            "Cannot calculate vector max value".to_string(),
        ))?)
}

/// Returns `true` if two arrays are element-wise equal within a tolerance. This behaves as the
/// numpy implementation at <https://numpy.org/doc/stable/reference/generated/numpy.allclose.html>.
///
/// # Arguments
///
/// * `a`: First vector to compare.
/// * `b`: Second vector to compare.
/// * `r_tol`: The relative tolerance parameter.
/// * `a_tol`: The absolute tolerance parameter.
///
/// returns: `bool`
pub fn all_close(a: &[f64], b: &[f64], r_tol: Option<f64>, a_tol: Option<f64>) -> bool {
    let r_tol = r_tol.unwrap_or(1e-05);
    let a_tol = a_tol.unwrap_or(1e-08);

    a.iter()
        .zip(b)
        .all(|(v1, v2)| (v1 - v2).abs() <= (a_tol + r_tol * v2.abs()))
}
