use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::PError;

/// Calculate the binomial coefficient. This gives the number of `k`-subsets possible out of a
/// set of `n` distinct items. See <https://mathworld.wolfram.com/BinomialCoefficient.html>. Code
/// adapted from <https://blog.plover.com/math/choose.html>.
///
/// # Arguments
///
/// * `n`: The number of possibilities.
/// * `k`: The number of outcomes.
///
/// returns: `u64`
fn binomial_coefficient(mut n: u64, k: u64) -> u64 {
    let mut r: u64 = 1;
    if k > n {
        0
    } else {
        for d in 1..=k {
            r *= n;
            n -= 1;
            r /= d;
        }
        r
    }
}

/// Define the number of partitions for the two layers.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TwoLayerPartitions {
    /// This is the number of partitions to use in the boundary layer.
    pub boundary_layer: usize,
    /// This is the number of partitions to use in the inner layer.
    pub inner_layer: usize,
    /// Control the size of the inner layer. This defaults to 0.5 which means that the maximum
    /// points on each objective axis will be located at 0.5 instead of 1 (as in the boundary
    /// layer).
    pub scaling: Option<f64>,
}

/// Define the number of partitions to use to generate the reference points. You can create:
///  - 1 layer or set of points with a constant uniform gap with [`NumberOfPartitions::OneLayer`].
///  - 2 layers of points with each layer having a different gap with
///    [`NumberOfPartitions::TwoLayers`]. Use this approach if you are trying to solve a problem
///    with many objectives (4 or more) and want to reduce the number of reference points to use.
#[derive(Serialize, Clone, Deserialize, Debug)]
pub enum NumberOfPartitions {
    /// Create only one layer of points by specifying the number of uniform gaps between two
    /// consecutive points along all objective axis on the hyper-plane.
    OneLayer(usize),
    /// Create two sets of points with two different gap values. The two sets are generated
    /// independently and merged into one final set.
    TwoLayers(TwoLayerPartitions),
}

/// Derive the reference points or weights using the methodology suggested in Section 5.2 in the
/// Das & Dennis (1998) paper:
///
/// > Indraneel Das and J. E. Dennis. Normal-Boundary Intersection: A New Method for Generating
/// > the Pareto Surface in Nonlinear Multicriteria Optimization Problems. SIAM Journal on
/// > Optimization. 1998 8:3, 631-657. <https://doi.org/10.1137/S1052623496307510>
///
/// # Example
/// ```
/// use polygene::core::PError;
/// use polygene::utils::{NumberOfPartitions, SimplexLattice};
///
/// fn main() -> Result<(), PError> {
///     // Consider the case of a 3D hyper-plane with 3 objectives where each objective axis is
///     // split into 5 gaps of equal size.
///     let partitions = NumberOfPartitions::OneLayer(5);
///     let lattice = SimplexLattice::new(3, &partitions)?;
///
///     // This returns the coordinates of the reference points between 0 and 1
///     println!("Total points = {:?}", lattice.number_of_points());
///     println!("Points = {:?}", lattice.get_weights());
///     Ok(())
/// }
/// ```
pub struct SimplexLattice {
    /// The number of problem objectives.
    number_of_objectives: usize,
    /// The number of uniform gaps between two consecutive points along all objective axis on the
    /// hyper-plane. With this option you can create one or two layers of points with different
    /// spacing.
    number_of_partitions: NumberOfPartitions,
}

impl SimplexLattice {
    /// Initialise the Das & Dennis approach to calculate reference points or weights.
    ///
    /// # Arguments
    ///
    /// * `number_of_objectives`: The number of problem objectives.
    /// * `number_of_partitions`: The number of uniform gaps between two consecutive points along
    ///   all objective axis on the hyper-plane.
    ///
    /// returns: `Result<SimplexLattice, PError>`
    pub fn new(
        number_of_objectives: usize,
        number_of_partitions: &NumberOfPartitions,
    ) -> Result<Self, PError> {
        if number_of_objectives < 2 {
            return Err(PError::Configuration(
                "reference points".to_string(),
                "at least 2 objectives are required".to_string(),
            ));
        }
        match &number_of_partitions {
            NumberOfPartitions::OneLayer(partitions) => {
                if *partitions == 0 {
                    return Err(PError::Configuration(
                        "reference points".to_string(),
                        "at least 1 partition is required".to_string(),
                    ));
                }
            }
            NumberOfPartitions::TwoLayers(layers) => {
                if layers.boundary_layer == 0 || layers.inner_layer == 0 {
                    return Err(PError::Configuration(
                        "reference points".to_string(),
                        "at least 1 partition is required in each layer".to_string(),
                    ));
                }
                if let Some(scaling) = layers.scaling {
                    if scaling < f64::EPSILON {
                        return Err(PError::Configuration(
                            "reference points".to_string(),
                            "the inner layer scaling factor must be larger than 0".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(SimplexLattice {
            number_of_objectives,
            number_of_partitions: number_of_partitions.clone(),
        })
    }

    /// Determine the number of reference points on the unit simplex from Section 5.2 of the
    /// [Das & Dennis's paper](https://doi.org/10.1137/S1052623496307510).
    ///
    /// returns: `u64`. The number of reference points.
    pub fn number_of_points(&self) -> u64 {
        let m = self.number_of_objectives as u64;
        match &self.number_of_partitions {
            // Binomial coefficient of M + p - 1 and p, where M is the number of objectives and
            // p the number of partitions
            NumberOfPartitions::OneLayer(partitions) => {
                binomial_coefficient(m + *partitions as u64 - 1, *partitions as u64)
            }
            NumberOfPartitions::TwoLayers(layers) => {
                // sum the two layers
                binomial_coefficient(m + layers.boundary_layer as u64 - 1, layers.boundary_layer as u64)
                    + binomial_coefficient(m + layers.inner_layer as u64 - 1, layers.inner_layer as u64)
            }
        }
    }

    /// Generate the vector of reference points.
    ///
    /// return: `Vec<Vec<f64>>`. The vector of points of size [`SimplexLattice::number_of_points`].
    /// Each nested vector, of size equal to the number of objectives, contains the point
    /// coordinates (between 0 and 1) for each objective.
    pub fn get_weights(&self) -> Vec<Vec<f64>> {
        match &self.number_of_partitions {
            NumberOfPartitions::OneLayer(partitions) => {
                let mut final_weights: Vec<Vec<f64>> = vec![];
                let mut initial_empty_weight: Vec<usize> = vec![0; self.number_of_objectives];
                // start from the first objective
                self.recursive_weights(
                    &mut final_weights,
                    &mut initial_empty_weight,
                    *partitions,
                    *partitions,
                    0,
                );
                final_weights
            }
            NumberOfPartitions::TwoLayers(layers) => {
                // create the boundary layer
                let mut final_weights: Vec<Vec<f64>> = vec![];
                let mut initial_empty_weight: Vec<usize> = vec![0; self.number_of_objectives];
                self.recursive_weights(
                    &mut final_weights,
                    &mut initial_empty_weight,
                    layers.boundary_layer,
                    layers.boundary_layer,
                    0,
                );

                let mut inner_points: Vec<Vec<f64>> = vec![];
                let mut initial_empty_weight: Vec<usize> = vec![0; self.number_of_objectives];
                self.recursive_weights(
                    &mut inner_points,
                    &mut initial_empty_weight,
                    layers.inner_layer,
                    layers.inner_layer,
                    0,
                );

                // shrink the inner layer towards the simplex centroid and then merge it
                let scaling = layers.scaling.unwrap_or(0.5);
                for inner_point in inner_points {
                    let new_point = inner_point
                        .iter()
                        .map(|value| (1.0 / self.number_of_objectives as f64 + value) * scaling)
                        .collect();
                    final_weights.push(new_point);
                }
                final_weights
            }
        }
    }

    /// Calculate the coordinates for each reference point recursively for each objective and
    /// partition index.
    ///
    /// # Arguments
    ///
    /// * `final_weights`: The vector collecting the final points.
    /// * `weight`: The vector for one point. This must have a size equal to the number of
    ///   objectives.
    /// * `left_partitions`: The number of partitions left to process for the objective.
    /// * `number_of_partitions`: The number of total partitions.
    /// * `obj_index`: The objective index being processed.
    fn recursive_weights(
        &self,
        final_weights: &mut Vec<Vec<f64>>,
        weight: &mut Vec<usize>,
        left_partitions: usize,
        number_of_partitions: usize,
        obj_index: usize,
    ) {
        for k in 0..=left_partitions {
            if obj_index != self.number_of_objectives - 1 {
                // keep processing the left partitions for the next objective
                weight[obj_index] = k;
                self.recursive_weights(
                    final_weights,
                    weight,
                    left_partitions - k,
                    number_of_partitions,
                    obj_index + 1,
                )
            } else {
                // process the last point and update the final weight vector when all the
                // objectives have been exhausted
                weight[obj_index] = left_partitions;
                final_weights.push(
                    weight
                        .iter()
                        .map(|v| *v as f64 / number_of_partitions as f64)
                        .collect(),
                );
                break;
            }
        }
    }
}

/// A set of reference points on the objective-space unit simplex, paired with the population size
/// the algorithm must use. Uniform point constructions only yield certain cardinalities, so the
/// adjusted size generally differs from the size originally requested by the user.
#[derive(Clone, Debug)]
pub struct ReferencePointSet {
    /// The coordinates of each reference point.
    pub points: Vec<Vec<f64>>,
    /// The population size consistent with the point set.
    pub adjusted_population_size: usize,
}

/// The trait to implement a generator of uniform reference points for a requested population
/// size.
pub trait ReferencePointGenerator {
    /// Generate the reference points for a problem with `number_of_objectives` objectives and a
    /// requested population size. The returned set carries the adjusted population size the
    /// algorithm must use in place of the requested one.
    ///
    /// # Arguments
    ///
    /// * `number_of_objectives`: The number of problem objectives.
    /// * `requested_size`: The population size requested by the user.
    ///
    /// returns: `Result<ReferencePointSet, PError>`
    fn generate(
        &self,
        number_of_objectives: usize,
        requested_size: usize,
    ) -> Result<ReferencePointSet, PError>;
}

/// The default reference-point generator, building a [`SimplexLattice`] whose cardinality best
/// fits the requested population size. The generator picks the largest one-layer partition count
/// whose point count does not exceed the request; when that partition count drops below the
/// number of objectives (so all the points would sit on the simplex boundary), a scaled inner
/// layer is added while it still fits.
pub struct DasDennis;

impl ReferencePointGenerator for DasDennis {
    fn generate(
        &self,
        number_of_objectives: usize,
        requested_size: usize,
    ) -> Result<ReferencePointSet, PError> {
        if number_of_objectives < 2 {
            return Err(PError::Configuration(
                "reference points".to_string(),
                "at least 2 objectives are required".to_string(),
            ));
        }
        if requested_size == 0 {
            return Err(PError::Configuration(
                "reference points".to_string(),
                "the requested population size must be at least 1".to_string(),
            ));
        }
        let m = number_of_objectives as u64;

        // largest number of boundary gaps whose lattice does not exceed the requested size
        let mut boundary = 1_usize;
        while binomial_coefficient(boundary as u64 + m, m - 1) <= requested_size as u64 {
            boundary += 1;
        }
        let boundary_points = binomial_coefficient(boundary as u64 + m - 1, m - 1);

        let partitions = if boundary < number_of_objectives {
            // all the boundary points sit on the simplex edges; add an inner layer while the
            // total still fits the request
            let mut inner = 0_usize;
            while boundary_points + binomial_coefficient(inner as u64 + m, m - 1)
                <= requested_size as u64
            {
                inner += 1;
            }
            if inner > 0 {
                NumberOfPartitions::TwoLayers(TwoLayerPartitions {
                    boundary_layer: boundary,
                    inner_layer: inner,
                    scaling: None,
                })
            } else {
                NumberOfPartitions::OneLayer(boundary)
            }
        } else {
            NumberOfPartitions::OneLayer(boundary)
        };

        let lattice = SimplexLattice::new(number_of_objectives, &partitions)?;
        let points = lattice.get_weights();
        let adjusted_population_size = points.len();
        debug!(
            "Generated {adjusted_population_size} reference points for {requested_size} requested individuals"
        );
        Ok(ReferencePointSet {
            points,
            adjusted_population_size,
        })
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use crate::utils::reference_points::binomial_coefficient;
    use crate::utils::{
        DasDennis, NumberOfPartitions, ReferencePointGenerator, SimplexLattice, TwoLayerPartitions,
    };

    #[test]
    fn test_binomial_coefficient() {
        assert_eq!(binomial_coefficient(6, 2), 15);
        assert_eq!(binomial_coefficient(14, 2), 91);
        assert_eq!(binomial_coefficient(2, 5), 0);
    }

    #[test]
    /// The number of lattice points follows the binomial formula and matches the generated set.
    fn test_lattice_cardinality() {
        let lattice = SimplexLattice::new(3, &NumberOfPartitions::OneLayer(5)).unwrap();
        assert_eq!(lattice.number_of_points(), 21);

        let points = lattice.get_weights();
        assert_eq!(points.len(), 21);

        // every point sits on the unit simplex
        for point in &points {
            let sum: f64 = point.iter().sum();
            assert_approx_eq!(f64, sum, 1.0, epsilon = 1e-9);
            assert!(point.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    /// Two-layer points include the scaled inner layer and stay within the unit range.
    fn test_two_layer_lattice() {
        let layers = TwoLayerPartitions {
            boundary_layer: 2,
            inner_layer: 1,
            scaling: None,
        };
        let lattice = SimplexLattice::new(3, &NumberOfPartitions::TwoLayers(layers)).unwrap();
        assert_eq!(lattice.number_of_points(), 6 + 3);

        let points = lattice.get_weights();
        assert_eq!(points.len(), 9);
        for point in &points {
            assert!(point.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        // the inner layer is shrunk towards the centroid: the coordinates of a scaled point sum
        // to (1 + 1) * 0.5
        let inner_sum: f64 = points[6].iter().sum();
        assert_approx_eq!(f64, inner_sum, 1.0, epsilon = 1e-9);
    }

    #[test]
    /// The generator adjusts the population size to the nearest lattice cardinality below the
    /// request.
    fn test_adjusted_population_size() {
        // 2 objectives: a lattice of n points exists for every n
        let set = DasDennis.generate(2, 20).unwrap();
        assert_eq!(set.adjusted_population_size, 20);
        assert_eq!(set.points.len(), 20);

        // 3 objectives: cardinalities are 1, 3, 6, 10, 15, 21, ...
        let set = DasDennis.generate(3, 20).unwrap();
        assert_eq!(set.adjusted_population_size, 15);

        let set = DasDennis.generate(3, 91).unwrap();
        assert_eq!(set.adjusted_population_size, 91);
    }

    #[test]
    /// With many objectives a single boundary layer is too coarse and an inner layer is added.
    fn test_two_layer_policy() {
        let set = DasDennis.generate(5, 10).unwrap();
        // boundary layer with 1 gap (5 points) plus an inner layer with 1 gap (5 points)
        assert_eq!(set.adjusted_population_size, 10);

        for point in &set.points {
            assert!(point.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    /// Invalid configurations are rejected.
    fn test_input_validation() {
        assert!(SimplexLattice::new(1, &NumberOfPartitions::OneLayer(5)).is_err());
        assert!(SimplexLattice::new(3, &NumberOfPartitions::OneLayer(0)).is_err());
        assert!(DasDennis.generate(3, 0).is_err());
    }
}
