use log::debug;
use ndarray::{Array2, Axis};

use crate::core::PError;
use crate::utils::{argmin, perpendicular_distance};

/// The association between one candidate member and its closest reference point.
#[derive(Clone, Debug)]
pub(crate) struct Association {
    /// The index of the associated reference point.
    pub ref_point_index: usize,
    /// The perpendicular distance between the member and the reference-point line.
    pub distance: f64,
}

/// This implements "Algorithm 3" in the paper which associates each member's normalised
/// objectives to the closest reference-point line.
///
/// # Arguments
///
/// * `normalised`: The normalised objectives, one row per candidate member.
/// * `reference_points`: The reference points to associate the members to. The point coordinates
///   must be between 0 and 1.
///
/// returns: `Result<Vec<Association>, PError>`. One association per row of `normalised`.
pub(crate) fn associate_to_reference_points(
    normalised: &Array2<f64>,
    reference_points: &[Vec<f64>],
) -> Result<Vec<Association>, PError> {
    let name = "NSGA3-Associate".to_string();
    if reference_points.is_empty() {
        return Err(PError::AlgorithmRun(
            name,
            "at least one reference point is required".to_string(),
        ));
    }
    // check reference point values
    for point in reference_points {
        check_bounds(point)?;
    }

    let mut associations = Vec::with_capacity(normalised.nrows());
    for (row_index, row) in normalised.axis_iter(Axis(0)).enumerate() {
        let member = row.to_vec();
        // calculate the distances to all the reference-point lines
        let distances = reference_points
            .iter()
            .map(|ref_point| {
                perpendicular_distance(ref_point, &member).map_err(|e| {
                    PError::AlgorithmRun(
                        name.clone(),
                        format!("cannot calculate the vector distance because: {e}"),
                    )
                })
            })
            .collect::<Result<Vec<f64>, PError>>()?;

        // step 8 - get the reference point with the lowest distance
        let (ref_point_index, distance) = argmin(&distances);
        debug!(
            "Associated member #{row_index} {member:?} to reference point #{ref_point_index} - distance = {distance}"
        );
        associations.push(Association {
            ref_point_index,
            distance,
        });
    }
    Ok(associations)
}

/// Check that the values in a reference point are between 0 and 1 (i.e. all the values have been
/// normalised).
///
/// # Arguments
///
/// * `point`: The reference point coordinates to check.
///
/// returns: `Result<(), PError>`
fn check_bounds(point: &[f64]) -> Result<(), PError> {
    if point.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err(PError::AlgorithmRun(
            "NSGA3-Associate".to_string(),
            format!("the values of the reference point {point:?} must be between 0 and 1"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;
    use ndarray::array;

    use crate::algorithms::nsga3::associate::associate_to_reference_points;
    use crate::utils::{NumberOfPartitions, SimplexLattice};

    #[test]
    /// Test that the correct distances and reference-point associations are calculated.
    fn test_simple_association() {
        let lattice = SimplexLattice::new(3, &NumberOfPartitions::OneLayer(4)).unwrap();
        let ref_points = lattice.get_weights();

        let normalised = array![[0.95, 0.15, 0.15], [0.1, 0.9, 0.1]];
        let associations = associate_to_reference_points(&normalised, &ref_points).unwrap();

        // 1st member maps to the point on the first objective axis
        assert_eq!(ref_points[associations[0].ref_point_index], vec![1.0, 0.0, 0.0]);
        assert_approx_eq!(f64, associations[0].distance, 0.212132034355, epsilon = 0.0001);

        // 2nd member maps to the point on the second objective axis
        assert_eq!(ref_points[associations[1].ref_point_index], vec![0.0, 1.0, 0.0]);
        assert_approx_eq!(f64, associations[1].distance, 0.1414213562, epsilon = 0.0001);
    }

    #[test]
    /// Reference points outside the unit range are rejected.
    fn test_invalid_reference_points() {
        let normalised = array![[0.5, 0.5]];
        let ref_points = vec![vec![1.2, 0.0]];
        assert!(associate_to_reference_points(&normalised, &ref_points).is_err());
        assert!(associate_to_reference_points(&normalised, &[]).is_err());
    }
}
