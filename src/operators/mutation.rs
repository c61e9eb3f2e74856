use ndarray::Array2;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::core::{Encoding, PError, Segment};

/// Trait to define a mutation operator over a chromosome matrix. Each row is mutated with the
/// provided probability; the output matrix always has the same number of rows as the input.
pub trait Mutation {
    /// The operator name, used in error messages.
    ///
    /// returns: `String`
    fn name(&self) -> String;

    /// Mutate the chromosomes of a segment.
    ///
    /// # Arguments
    ///
    /// * `chromosomes`: The segment chromosome matrix.
    /// * `segment`: The segment descriptor.
    /// * `probability`: The probability that a row is mutated.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<Array2<f64>, PError>`. The mutated chromosome matrix.
    fn mutate(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError>;
}

/// Check that a mutation probability is a number between 0 and 1.
fn check_probability(name: &str, probability: f64) -> Result<(), PError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(PError::MutationOperator(
            name.to_string(),
            format!("the mutation probability {probability} must be a number between 0 and 1"),
        ));
    }
    Ok(())
}

/// The inversion mutation operator for permutation-encoded segments. A random slice of the
/// chromosome is reversed, which preserves the permutation while changing the relative order of
/// its values.
pub struct InversionMutation;

impl Mutation for InversionMutation {
    fn name(&self) -> String {
        "InversionMutation".to_string()
    }

    fn mutate(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;
        if segment.encoding() != Encoding::Permutation {
            return Err(PError::MutationOperator(
                self.name(),
                "the inversion operator only works with permutation-encoded segments".to_string(),
            ));
        }

        let width = chromosomes.ncols();
        let mut output = chromosomes.clone();
        for i in 0..chromosomes.nrows() {
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }
            let mut start = rng.gen_range(0..width);
            let mut end = rng.gen_range(0..width);
            if start > end {
                (start, end) = (end, start);
            }

            let mut row = output.row_mut(i);
            let mut a = start;
            let mut b = end;
            while a < b {
                row.swap(a, b);
                a += 1;
                b -= 1;
            }
        }
        Ok(output)
    }
}

/// The bit-flip mutation operator for binary segments. Within a mutated row, each bit is flipped
/// with a fixed probability defaulting to the inverse of the chromosome width (one bit flipped
/// per chromosome on average).
pub struct BitFlipMutation {
    /// The probability of flipping each bit of a mutated row. When `None`, `1` divided by the
    /// chromosome width is used.
    flip_probability: Option<f64>,
}

impl BitFlipMutation {
    /// Initialise the bit-flip mutation operator. This returns an error if the probability is
    /// outside the [0, 1] range.
    ///
    /// # Arguments
    ///
    /// * `flip_probability`: The probability of flipping each bit of a mutated row. Set to `None`
    ///   to flip one bit per chromosome on average.
    ///
    /// returns: `Result<BitFlipMutation, PError>`
    pub fn new(flip_probability: Option<f64>) -> Result<Self, PError> {
        if let Some(p) = flip_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(PError::MutationOperator(
                    "BitFlipMutation".to_string(),
                    format!("the bit flip probability {p} must be a number between 0 and 1"),
                ));
            }
        }
        Ok(Self { flip_probability })
    }
}

impl Mutation for BitFlipMutation {
    fn name(&self) -> String {
        "BitFlipMutation".to_string()
    }

    fn mutate(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;
        if segment.encoding() != Encoding::BinaryGray {
            return Err(PError::MutationOperator(
                self.name(),
                "the bit flip operator only works with binary segments".to_string(),
            ));
        }

        let width = chromosomes.ncols();
        let flip_probability = self.flip_probability.unwrap_or(1.0 / width as f64);
        let mut output = chromosomes.clone();
        for i in 0..chromosomes.nrows() {
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }
            for c in 0..width {
                if rng.gen_range(0.0..=1.0) <= flip_probability {
                    output[[i, c]] = 1.0 - output[[i, c]];
                }
            }
        }
        Ok(output)
    }
}

/// Input arguments for [`PolynomialMutation`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PolynomialMutationArgs {
    /// A user-defined parameter to control the mutation. This is eta_m in the paper, and it is
    /// suggested its value to be in the [20, 100] range.
    pub index_parameter: f64,
    /// The probability of mutating each variable of a mutated row. When `None`, `1` divided by
    /// the number of segment variables is used (i.e. each variable has the same probability of
    /// being mutated).
    pub variable_probability: Option<f64>,
}

impl Default for PolynomialMutationArgs {
    /// Initialise the Polynomial Mutation (PM) operator with the default parameters: a
    /// distribution index of `20` and one mutated variable per chromosome on average.
    fn default() -> Self {
        Self {
            index_parameter: 20.0,
            variable_probability: None,
        }
    }
}

/// The Polynomial Mutation (PM) operator for segments of bounded real or integer variables.
///
/// Adapted from [Deb & Deb (2014)](https://dl.acm.org/doi/10.1504/IJAISC.2014.059280), full
/// text available at <https://www.egr.msu.edu/~kdeb/papers/k2012016.pdf>.
///
/// # Integer support
/// Since the original method does not provide support for integer variables, this has been added
/// by using the truncation procedure proposed in section 2.4 of:
/// > Deep, Kusum & Singh, Krishna & Kansal, M. & Mohan, Chander. (2009). A real coded genetic
/// > algorithm for solving integer and mixed integer optimization problems. Applied Mathematics
/// > and Computation. 212. 505-518. 10.1016/j.amc.2009.02.044.
pub struct PolynomialMutation {
    /// The user-defined parameter to control the mutation.
    index_parameter: f64,
    /// The probability of mutating each variable of a mutated row.
    variable_probability: Option<f64>,
}

impl PolynomialMutation {
    /// Initialise the Polynomial Mutation (PM) operator. This returns an error if the probability
    /// is outside the [0, 1] range.
    ///
    /// # Arguments
    ///
    /// * `args`: The operator input parameters. See [`PolynomialMutationArgs`].
    ///
    /// returns: `Result<PolynomialMutation, PError>`
    pub fn new(args: PolynomialMutationArgs) -> Result<Self, PError> {
        if let Some(p) = args.variable_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(PError::MutationOperator(
                    "PolynomialMutation".to_string(),
                    format!("the variable probability {p} must be a number between 0 and 1"),
                ));
            }
        }
        Ok(Self {
            index_parameter: args.index_parameter,
            variable_probability: args.variable_probability,
        })
    }

    /// Perform the mutation of one variable.
    ///
    /// # Arguments
    ///
    /// * `y`: The variable value to mutate.
    /// * `y_lower`: The variable lower bound.
    /// * `y_upper`: The variable upper bound.
    /// * `rng`: The random number generator.
    ///
    /// returns: `f64`
    fn mutate_variable(&self, y: f64, y_lower: f64, y_upper: f64, rng: &mut dyn RngCore) -> f64 {
        let delta_y = y_upper - y_lower;
        if delta_y < f64::EPSILON {
            return y;
        }
        let prob = rng.gen_range(0.0..=1.0);

        // this is delta_l or delta_r
        let delta = if prob <= 0.5 {
            let bl = (y - y_lower) / delta_y;
            let b =
                2.0 * prob + (1.0 - 2.0 * prob) * f64::powf(1.0 - bl, self.index_parameter + 1.0);
            f64::powf(b, 1.0 / (self.index_parameter + 1.0)) - 1.0
        } else {
            let bu = (y_upper - y) / delta_y;
            let b = 2.0 * (1.0 - prob)
                + 2.0 * (prob - 0.5) * f64::powf(1.0 - bu, self.index_parameter + 1.0);
            1.0 - f64::powf(b, 1.0 / (self.index_parameter + 1.0))
        };

        // adjust the variable
        let new_y = y + delta * delta_y;
        f64::min(f64::max(new_y, y_lower), y_upper)
    }
}

impl Mutation for PolynomialMutation {
    fn name(&self) -> String {
        "PolynomialMutation".to_string()
    }

    fn mutate(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        check_probability(&self.name(), probability)?;
        if segment.encoding() != Encoding::RealInteger {
            return Err(PError::MutationOperator(
                self.name(),
                "the PM operator only works with real or integer variables".to_string(),
            ));
        }

        let lower = segment.lower_bounds();
        let upper = segment.upper_bounds();
        let integer = segment.integer_flags();
        let variable_probability = self
            .variable_probability
            .unwrap_or(1.0 / chromosomes.ncols() as f64);

        let mut output = chromosomes.clone();
        for i in 0..chromosomes.nrows() {
            if rng.gen_range(0.0..=1.0) > probability {
                continue;
            }
            for c in 0..chromosomes.ncols() {
                if rng.gen_range(0.0..=1.0) > variable_probability {
                    continue;
                }
                let mut new_y = self.mutate_variable(output[[i, c]], lower[c], upper[c], rng);
                if integer[c] {
                    // truncate then add 1 with a probability threshold of 0.5 to add randomness
                    new_y = new_y.trunc();
                    if rng.gen_range(0.0..=1.0) < 0.5 {
                        new_y += 1.0;
                    }
                    new_y = new_y.clamp(lower[c], upper[c]);
                }
                output[[i, c]] = new_y;
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
        BitFlipMutation, InversionMutation, Mutation, PolynomialMutation, PolynomialMutationArgs,
    };

    #[test]
    /// The inversion mutation keeps every row a valid permutation.
    fn test_inversion_keeps_permutations() {
        let segment = Segment::permutation(7, 0).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(15, &mut rng);

        let mutated = InversionMutation
            .mutate(&chromosomes, &segment, 1.0, &mut rng)
            .unwrap();

        assert_eq!(mutated.nrows(), chromosomes.nrows());
        for row in mutated.axis_iter(Axis(0)) {
            let mut values: Vec<i64> = row.iter().map(|v| *v as i64).collect();
            values.sort();
            assert_eq!(values, (0..7).collect::<Vec<i64>>());
        }
    }

    #[test]
    /// The bit flip mutation only produces 0 and 1 genes.
    fn test_bit_flip() {
        let segment = Segment::binary_gray(vec![0.0], vec![1.0], vec![8]).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(10, &mut rng);

        let operator = BitFlipMutation::new(Some(0.5)).unwrap();
        let mutated = operator
            .mutate(&chromosomes, &segment, 1.0, &mut rng)
            .unwrap();

        assert_eq!(mutated.nrows(), chromosomes.nrows());
        assert!(mutated.iter().all(|v| *v == 0.0 || *v == 1.0));
        assert_ne!(mutated, chromosomes);
    }

    #[test]
    /// Test that the PM operator mutates variables within their bounds.
    fn test_polynomial_mutation() {
        let segment = Segment::real(vec![0.0, -10.0], vec![1000.0, 20.0]).unwrap();
        let chromosomes = array![[0.2, 0.0], [800.0, 3.0]];

        let args = PolynomialMutationArgs {
            index_parameter: 1.0,
            // always force mutation
            variable_probability: Some(1.0),
        };
        let pm = PolynomialMutation::new(args).unwrap();
        let mut rng = get_rng(Some(1));
        let mutated = pm.mutate(&chromosomes, &segment, 1.0, &mut rng).unwrap();

        // mutation always performed because the variable probability is 1
        for i in 0..2 {
            assert!((0.0..=1000.0).contains(&mutated[[i, 0]]));
            assert!((-10.0..=20.0).contains(&mutated[[i, 1]]));
            assert_ne!(mutated[[i, 0]], chromosomes[[i, 0]]);
        }
    }

    #[test]
    /// Probabilities outside [0, 1] are rejected.
    fn test_invalid_probabilities() {
        assert!(BitFlipMutation::new(Some(1.5)).is_err());
        assert!(PolynomialMutation::new(PolynomialMutationArgs {
            index_parameter: 20.0,
            variable_probability: Some(-0.1),
        })
        .is_err());

        let segment = Segment::permutation(5, 0).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(4, &mut rng);
        assert!(InversionMutation
            .mutate(&chromosomes, &segment, 1.5, &mut rng)
            .is_err());
    }
}
