use std::collections::HashMap;

use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;
use rand::prelude::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::core::{Encoding, PError, Segment};

/// Trait to define a recombination operator over a chromosome matrix. Consecutive rows are paired
/// for mating (rows 0-1, 2-3 and so on) and each pair takes part in the crossover with the
/// provided probability; with an odd row count the last row is left untouched. The output matrix
/// always has the same number of rows as the input.
pub trait Recombination {
    /// The operator name, used in error messages.
    ///
    /// returns: `String`
    fn name(&self) -> String;

    /// Recombine the chromosomes of a segment.
    ///
    /// # Arguments
    ///
    /// * `chromosomes`: The segment chromosome matrix.
    /// * `segment`: The segment descriptor.
    /// * `probability`: The probability that a pair of rows takes part in the crossover.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<Array2<f64>, PError>`. The recombined chromosome matrix.
    fn recombine(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError>;
}

/// Check that a crossover probability is a number between 0 and 1.
fn check_probability(name: &str, probability: f64) -> Result<(), PError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(PError::CrossoverOperator(
            name.to_string(),
            format!("the crossover probability {probability} must be a number between 0 and 1"),
        ));
    }
    Ok(())
}

/// The Partially-Matched Crossover (PMX) operator for permutation-encoded segments. A slice of
/// each parent is copied into the opposite child and the duplicated values outside the slice are
/// repaired through the position-wise mapping between the two slices, so both children remain
/// valid permutations.
///
/// Implemented based on:
/// > D. E. Goldberg and R. Lingle. Alleles, loci and the travelling salesman problem. In
/// > Proceedings of the 1st International Conference on Genetic Algorithms, pp. 154-159, 1985.
pub struct PartiallyMatchedCrossover;

impl PartiallyMatchedCrossover {
    /// Build one PMX child. The child takes `p2`'s values inside the matched slice and `p1`'s
    /// values elsewhere, replacing duplicates by following the slice mapping.
    ///
    /// # Arguments
    ///
    /// * `p1`: The first parent row.
    /// * `p2`: The second parent row.
    /// * `start`: The start of the matched slice.
    /// * `end`: The end (exclusive) of the matched slice.
    ///
    /// returns: `Vec<f64>`
    fn pmx_child(p1: &[f64], p2: &[f64], start: usize, end: usize) -> Vec<f64> {
        let mut child = p1.to_vec();
        let mut mapping: HashMap<OrderedFloat<f64>, f64> = HashMap::new();
        for k in start..end {
            child[k] = p2[k];
            mapping.insert(OrderedFloat(p2[k]), p1[k]);
        }

        for k in (0..start).chain(end..p1.len()) {
            let mut value = p1[k];
            // follow the mapping until the value no longer clashes with the copied slice
            while let Some(mapped) = mapping.get(&OrderedFloat(value)) {
                value = *mapped;
            }
            child[k] = value;
        }
        child
    }
}

impl Recombination for PartiallyMatchedCrossover {
    fn name(&self) -> String {
        "PartiallyMatchedCrossover".to_string()
    }

    fn recombine(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;
        if segment.encoding() != Encoding::Permutation {
            return Err(PError::CrossoverOperator(
                self.name(),
                "the PMX operator only works with permutation-encoded segments".to_string(),
            ));
        }

        let width = chromosomes.ncols();
        let mut output = chromosomes.clone();
        for pair in 0..chromosomes.nrows() / 2 {
            let (i, j) = (2 * pair, 2 * pair + 1);
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }

            let mut start = rng.gen_range(0..width);
            let mut end = rng.gen_range(0..width);
            if start > end {
                (start, end) = (end, start);
            }
            // the matched slice includes the end position
            end += 1;

            let p1 = chromosomes.row(i).to_vec();
            let p2 = chromosomes.row(j).to_vec();
            let c1 = Self::pmx_child(&p1, &p2, start, end);
            let c2 = Self::pmx_child(&p2, &p1, start, end);
            output.row_mut(i).assign(&Array1::from(c1));
            output.row_mut(j).assign(&Array1::from(c2));
        }
        Ok(output)
    }
}

/// The uniform crossover operator for binary segments. Each gene of a mating pair is swapped
/// between the two children with a probability of 0.5.
pub struct UniformCrossover;

impl Recombination for UniformCrossover {
    fn name(&self) -> String {
        "UniformCrossover".to_string()
    }

    fn recombine(
        &self,
        chromosomes: &Array2<f64>,
        _segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;

        let mut output = chromosomes.clone();
        for pair in 0..chromosomes.nrows() / 2 {
            let (i, j) = (2 * pair, 2 * pair + 1);
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }
            for c in 0..chromosomes.ncols() {
                if rng.gen_bool(0.5) {
                    let tmp = output[[i, c]];
                    output[[i, c]] = output[[j, c]];
                    output[[j, c]] = tmp;
                }
            }
        }
        Ok(output)
    }
}

/// Input arguments for [`SimulatedBinaryCrossover`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SimulatedBinaryCrossoverArgs {
    /// The distribution index for crossover (this is the eta_c in the paper). This directly
    /// controls the spread of children. If a large value is selected, the resulting children will
    /// have a higher probability of being close to their parents; a small value generates distant
    /// offsprings.
    pub distribution_index: f64,
    /// The probability that a variable belonging to both parents is used in the crossover. The
    /// paper uses 0.5, meaning that each variable in a solution has a 50% chance of changing its
    /// value.
    pub variable_probability: f64,
}

impl Default for SimulatedBinaryCrossoverArgs {
    /// Default parameters for the Simulated Binary Crossover (SBX) with a distribution index of
    /// 15 and variable probability of `0.5`.
    fn default() -> Self {
        Self {
            distribution_index: 15.0,
            variable_probability: 0.5,
        }
    }
}

/// Simulated Binary Crossover (SBX) operator for segments of bounded real or integer variables.
///
/// Implemented based on:
/// > Kalyanmoy Deb, Karthik Sindhya, and Tatsuya Okabe. 2007. Self-adaptive
/// > simulated binary crossover for real-parameter optimization. In Proceedings of the 9th annual
/// > conference on Genetic and evolutionary computation (GECCO '07). Association for Computing
/// > Machinery, New York, NY, USA, 1187-1194. <https://doi.org/10.1145/1276958.1277190>
///
/// # Integer support
/// Since the original method does not provide support for integer variables, this has been added
/// by using the truncation procedure proposed in section 2.4 of:
/// > Deep, Kusum & Singh, Krishna & Kansal, M. & Mohan, Chander. (2009). A real coded genetic
/// > algorithm for solving integer and mixed integer optimization problems. Applied Mathematics
/// > and Computation. 212. 505-518. 10.1016/j.amc.2009.02.044.
pub struct SimulatedBinaryCrossover {
    /// The distribution index for crossover. This is the eta_c in the paper.
    distribution_index: f64,
    /// The probability that a variable belonging to both parents is used in the crossover.
    variable_probability: f64,
}

impl SimulatedBinaryCrossover {
    /// Initialise the Simulated Binary Crossover (SBX) operator.
    ///
    /// # Arguments
    ///
    /// * `args`: The operator input parameters. See [`SimulatedBinaryCrossoverArgs`].
    ///
    /// returns: `Result<SimulatedBinaryCrossover, PError>`
    pub fn new(args: SimulatedBinaryCrossoverArgs) -> Result<Self, PError> {
        let name = "SimulatedBinaryCrossover".to_string();
        if args.distribution_index < 0.0 {
            return Err(PError::CrossoverOperator(
                name,
                format!(
                    "the distribution index {} must be a positive number",
                    args.distribution_index
                ),
            ));
        }
        if !(0.0..=1.0).contains(&args.variable_probability) {
            return Err(PError::CrossoverOperator(
                name,
                format!(
                    "the variable probability {} must be a number between 0 and 1",
                    args.variable_probability
                ),
            ));
        }

        Ok(Self {
            distribution_index: args.distribution_index,
            variable_probability: args.variable_probability,
        })
    }

    /// Perform the crossover for one variable from two parents.
    ///
    /// # Arguments
    ///
    /// * `v1`: The variable value from the first parent.
    /// * `v2`: The variable value from the second parent.
    /// * `y_lower`: The variable lower bound.
    /// * `y_upper`: The variable upper bound.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Option<(f64, f64)>`. The two values to assign to the children. If the difference
    /// between the two parent values is too small `None` is returned and no crossover is
    /// performed.
    fn crossover_variables(
        &self,
        v1: f64,
        v2: f64,
        y_lower: f64,
        y_upper: f64,
        rng: &mut dyn RngCore,
    ) -> Option<(f64, f64)> {
        // do not perform crossover if variables have the same value
        if f64::abs(v1 - v2) < f64::EPSILON {
            return None;
        }

        // get the lowest value between the two parents
        let (y1, y2) = if v1 < v2 { (v1, v2) } else { (v2, v1) };
        let delta_y = y2 - y1;
        let prob = rng.gen_range(0.0..=1.0);

        // first child
        let beta = 1.0 + (2.0 * (y1 - y_lower) / delta_y);
        let alpha = 2.0 - f64::powf(beta, -(self.distribution_index + 1.0));
        let mut new_v1 = 0.5 * ((y1 + y2) - self.betaq(prob, alpha) * delta_y);
        // make sure value is within bounds
        new_v1 = f64::min(f64::max(new_v1, y_lower), y_upper);

        // second child
        let beta = 1.0 + (2.0 * (y_upper - y2) / delta_y);
        let alpha = 2.0 - f64::powf(beta, -(self.distribution_index + 1.0));
        let mut new_v2 = 0.5 * ((y1 + y2) + self.betaq(prob, alpha) * delta_y);
        // make sure value is within bounds
        new_v2 = f64::min(f64::max(new_v2, y_lower), y_upper);

        // randomly swap the values
        if matches!([0, 1].choose(rng).unwrap(), 0) {
            (new_v1, new_v2) = (new_v2, new_v1);
        }
        Some((new_v1, new_v2))
    }

    /// Calculate the betaq coefficient.
    ///
    /// # Arguments
    ///
    /// * `prob`: The probability.
    /// * `alpha`: The alpha coefficient.
    ///
    /// returns: `f64`
    fn betaq(&self, prob: f64, alpha: f64) -> f64 {
        if prob <= (1.0 / alpha) {
            f64::powf(prob * alpha, 1.0 / (self.distribution_index + 1.0))
        } else {
            f64::powf(
                1.0 / (2.0 - prob * alpha),
                1.0 / (self.distribution_index + 1.0),
            )
        }
    }
}

impl Recombination for SimulatedBinaryCrossover {
    fn name(&self) -> String {
        "SimulatedBinaryCrossover".to_string()
    }

    fn recombine(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;
        if segment.encoding() != Encoding::RealInteger {
            return Err(PError::CrossoverOperator(
                self.name(),
                "the SBX operator only works with real or integer variables".to_string(),
            ));
        }

        let lower = segment.lower_bounds();
        let upper = segment.upper_bounds();
        let integer = segment.integer_flags();
        let mut output = chromosomes.clone();

        for pair in 0..chromosomes.nrows() / 2 {
            let (i, j) = (2 * pair, 2 * pair + 1);
            // do not apply crossover if probability is not reached
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }

            for c in 0..chromosomes.ncols() {
                // each variable in a solution has a `self.variable_probability` chance of
                // changing its value
                if rng.gen_range(0.0..=1.0) > self.variable_probability {
                    continue;
                }
                match self.crossover_variables(
                    chromosomes[[i, c]],
                    chromosomes[[j, c]],
                    lower[c],
                    upper[c],
                    rng,
                ) {
                    None => continue,
                    Some((mut new_v1, mut new_v2)) => {
                        if integer[c] {
                            // truncation procedure for integers. Get the integer part then get
                            // same or +1 with a probability threshold of 0.5 to add randomness.
                            new_v1 = new_v1.trunc();
                            if rng.gen_range(0.0..=1.0) < 0.5 {
                                new_v1 += 1.0;
                            }
                            new_v2 = new_v2.trunc();
                            if rng.gen_range(0.0..=1.0) < 0.5 {
                                new_v2 += 1.0;
                            }
                            new_v1 = new_v1.clamp(lower[c], upper[c]);
                            new_v2 = new_v2.clamp(lower[c], upper[c]);
                        }
                        output[[i, c]] = new_v1;
                        output[[j, c]] = new_v2;
                    }
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod test {
    use ndarray::{array, Axis};

    use crate::core::utils::get_rng;
    use crate::core::Segment;
    use crate::operators::{
        PartiallyMatchedCrossover, Recombination, SimulatedBinaryCrossover,
        SimulatedBinaryCrossoverArgs, UniformCrossover,
    };

    #[test]
    /// The PMX repair keeps both children as valid permutations.
    fn test_pmx_keeps_permutations() {
        let segment = Segment::permutation(8, 0).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(10, &mut rng);

        let pmx = PartiallyMatchedCrossover;
        let children = pmx.recombine(&chromosomes, &segment, 1.0, &mut rng).unwrap();

        assert_eq!(children.nrows(), chromosomes.nrows());
        for row in children.axis_iter(Axis(0)) {
            let mut values: Vec<i64> = row.iter().map(|v| *v as i64).collect();
            values.sort();
            assert_eq!(values, (0..8).collect::<Vec<i64>>());
        }
    }

    #[test]
    /// Test the PMX mapping repair on a known pair of parents.
    fn test_pmx_child() {
        let p1 = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let p2 = [5.0, 4.0, 3.0, 2.0, 1.0, 0.0];

        // matched slice covers positions 2..4 -> child takes [3, 2] from p2
        let child = PartiallyMatchedCrossover::pmx_child(&p1, &p2, 2, 4);
        assert_eq!(child, vec![0.0, 1.0, 3.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    /// The uniform crossover only moves genes between the two mates.
    fn test_uniform_crossover() {
        let segment = Segment::binary_gray(vec![0.0], vec![1.0], vec![6]).unwrap();
        let chromosomes = array![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
        ];
        let mut rng = get_rng(Some(1));

        let children = UniformCrossover
            .recombine(&chromosomes, &segment, 1.0, &mut rng)
            .unwrap();

        assert_eq!(children.nrows(), 2);
        for c in 0..6 {
            // genes are swapped or kept, never duplicated
            assert_eq!(children[[0, c]] + children[[1, c]], 1.0);
        }
    }

    #[test]
    /// Test that the SBX operator generates new variables within the bounds.
    fn test_sbx_crossover() {
        let segment = Segment::real(vec![0.0, -5.0], vec![10.0, 5.0]).unwrap();
        let chromosomes = array![[2.0, -4.0], [8.0, 4.0]];

        let args = SimulatedBinaryCrossoverArgs {
            distribution_index: 1.0,
            // always force crossover
            variable_probability: 1.0,
        };
        let sbx = SimulatedBinaryCrossover::new(args).unwrap();
        let mut rng = get_rng(Some(1));
        let children = sbx.recombine(&chromosomes, &segment, 1.0, &mut rng).unwrap();

        assert_eq!(children.nrows(), 2);
        for i in 0..2 {
            assert!((0.0..=10.0).contains(&children[[i, 0]]));
            assert!((-5.0..=5.0).contains(&children[[i, 1]]));
        }
        // crossover always performed because the variable probability is 1
        assert_ne!(children, chromosomes);
    }

    #[test]
    /// Check that the input arguments to the SBX operator are valid.
    fn test_sbx_args() {
        assert!(SimulatedBinaryCrossover::new(SimulatedBinaryCrossoverArgs {
            distribution_index: -2.0,
            variable_probability: 0.5,
        })
        .is_err());
        assert!(SimulatedBinaryCrossover::new(SimulatedBinaryCrossoverArgs {
            distribution_index: 1.0,
            variable_probability: -0.5,
        })
        .is_err());
    }

    #[test]
    /// Operators reject segments with the wrong encoding.
    fn test_wrong_encoding() {
        let mut rng = get_rng(Some(1));
        let real = Segment::real(vec![0.0], vec![1.0]).unwrap();
        let chromosomes = array![[0.1], [0.9]];
        assert!(PartiallyMatchedCrossover
            .recombine(&chromosomes, &real, 1.0, &mut rng)
            .is_err());

        let perm = Segment::permutation(2, 0).unwrap();
        let chromosomes = array![[0.0, 1.0], [1.0, 0.0]];
        let sbx = SimulatedBinaryCrossover::new(Default::default()).unwrap();
        assert!(sbx.recombine(&chromosomes, &perm, 1.0, &mut rng).is_err());
    }
}
