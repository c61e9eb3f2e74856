use ndarray::{Array1, Array2};
use rand::prelude::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::core::PError;

/// Maximum number of bits a Gray-coded variable may use. Larger widths lose precision when the
/// decoded integer is stored as `f64`.
const MAX_BITS: usize = 30;

/// The genetic representation of one chromosome segment. Each segment of a
/// [`crate::core::Population`] is encoded and varied independently; the encoding determines the
/// recombination and mutation operators applied to the segment matrix during the evolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// Each row is a permutation of a contiguous set of integer values.
    Permutation,
    /// Each row is a string of bits; each decision variable spans a fixed number of columns and is
    /// decoded from Gray code to a bounded number.
    BinaryGray,
    /// Each row stores the decision variables directly as bounded real (or rounded integer)
    /// numbers.
    RealInteger,
}

/// The decoding descriptor for one chromosome segment. This carries the variable bounds and the
/// encoding-specific data (bit widths for Gray-coded segments, rounding flags for integer
/// variables) needed to generate random chromosomes and to decode a chromosome matrix into the
/// phenotype columns consumed by the objective function.
///
/// # Example
/// ```
/// use polygene::core::{PError, Segment};
///
/// fn main() -> Result<(), PError> {
///     // a tour visiting 5 locations labelled 0 to 4
///     let tour = Segment::permutation(5, 0)?;
///     assert_eq!(tour.chromosome_width(), 5);
///
///     // 3 real numbers between 0 and 1
///     let weights = Segment::real(vec![0.0; 3], vec![1.0; 3])?;
///     assert_eq!(weights.decision_variables(), 3);
///
///     // 2 Gray-coded numbers using 8 bits each
///     let levels = Segment::binary_gray(vec![0.0, -1.0], vec![10.0, 1.0], vec![8, 8])?;
///     assert_eq!(levels.chromosome_width(), 16);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// The segment encoding.
    encoding: Encoding,
    /// The lower bound of each decision variable.
    lower: Vec<f64>,
    /// The upper bound of each decision variable.
    upper: Vec<f64>,
    /// Whether a decision variable must be rounded to the nearest integer after decoding.
    integer: Vec<bool>,
    /// The number of chromosome bits used by each decision variable. Empty unless the encoding is
    /// [`Encoding::BinaryGray`].
    bits: Vec<usize>,
}

impl Segment {
    /// Create a permutation-encoded segment whose rows are permutations of the integer values
    /// `first_value..first_value + length`.
    ///
    /// # Arguments
    ///
    /// * `length`: The number of values in the permutation.
    /// * `first_value`: The smallest value in the permutation.
    ///
    /// returns: `Result<Segment, PError>`
    pub fn permutation(length: usize, first_value: i64) -> Result<Self, PError> {
        if length < 2 {
            return Err(PError::Configuration(
                "permutation segment".to_string(),
                format!("the permutation length ({length}) must be at least 2"),
            ));
        }
        let lower = vec![first_value as f64; length];
        let upper = vec![(first_value + length as i64 - 1) as f64; length];
        Ok(Self {
            encoding: Encoding::Permutation,
            lower,
            upper,
            integer: vec![true; length],
            bits: vec![],
        })
    }

    /// Create a real-encoded segment with the provided variable bounds.
    ///
    /// # Arguments
    ///
    /// * `lower`: The lower bound of each decision variable.
    /// * `upper`: The upper bound of each decision variable.
    ///
    /// returns: `Result<Segment, PError>`
    pub fn real(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, PError> {
        let integer = vec![false; lower.len()];
        Self::real_integer(lower, upper, integer)
    }

    /// Create a real-encoded segment where some variables are rounded to integers after decoding.
    ///
    /// # Arguments
    ///
    /// * `lower`: The lower bound of each decision variable.
    /// * `upper`: The upper bound of each decision variable.
    /// * `integer`: Whether each decision variable is rounded to the nearest integer.
    ///
    /// returns: `Result<Segment, PError>`
    pub fn real_integer(
        lower: Vec<f64>,
        upper: Vec<f64>,
        integer: Vec<bool>,
    ) -> Result<Self, PError> {
        let segment = Self {
            encoding: Encoding::RealInteger,
            lower,
            upper,
            integer,
            bits: vec![],
        };
        segment.check_bounds("real segment")?;
        if segment.integer.len() != segment.lower.len() {
            return Err(PError::Configuration(
                "real segment".to_string(),
                format!(
                    "the number of integer flags ({}) must match the number of variables ({})",
                    segment.integer.len(),
                    segment.lower.len()
                ),
            ));
        }
        Ok(segment)
    }

    /// Create a Gray-coded binary segment. Each decision variable uses `bits` chromosome columns
    /// and decodes to a number between its lower and upper bound.
    ///
    /// # Arguments
    ///
    /// * `lower`: The lower bound of each decision variable.
    /// * `upper`: The upper bound of each decision variable.
    /// * `bits`: The number of bits used by each decision variable (between 1 and 30).
    ///
    /// returns: `Result<Segment, PError>`
    pub fn binary_gray(lower: Vec<f64>, upper: Vec<f64>, bits: Vec<usize>) -> Result<Self, PError> {
        let integer = vec![false; lower.len()];
        Self::binary_gray_integer(lower, upper, bits, integer)
    }

    /// Create a Gray-coded binary segment where some variables are rounded to integers after
    /// decoding. See [`Segment::binary_gray`].
    pub fn binary_gray_integer(
        lower: Vec<f64>,
        upper: Vec<f64>,
        bits: Vec<usize>,
        integer: Vec<bool>,
    ) -> Result<Self, PError> {
        let segment = Self {
            encoding: Encoding::BinaryGray,
            lower,
            upper,
            integer,
            bits,
        };
        segment.check_bounds("binary segment")?;
        if segment.bits.len() != segment.lower.len() {
            return Err(PError::Configuration(
                "binary segment".to_string(),
                format!(
                    "the number of bit widths ({}) must match the number of variables ({})",
                    segment.bits.len(),
                    segment.lower.len()
                ),
            ));
        }
        if segment.integer.len() != segment.lower.len() {
            return Err(PError::Configuration(
                "binary segment".to_string(),
                format!(
                    "the number of integer flags ({}) must match the number of variables ({})",
                    segment.integer.len(),
                    segment.lower.len()
                ),
            ));
        }
        for (vi, b) in segment.bits.iter().enumerate() {
            if *b == 0 || *b > MAX_BITS {
                return Err(PError::Configuration(
                    "binary segment".to_string(),
                    format!("variable #{vi} must use between 1 and {MAX_BITS} bits, {b} given"),
                ));
            }
        }
        Ok(segment)
    }

    /// Check that the segment defines at least one variable and that every lower bound is not
    /// larger than the matching upper bound.
    fn check_bounds(&self, name: &str) -> Result<(), PError> {
        if self.lower.is_empty() {
            return Err(PError::Configuration(
                name.to_string(),
                "at least one decision variable is required".to_string(),
            ));
        }
        if self.lower.len() != self.upper.len() {
            return Err(PError::Configuration(
                name.to_string(),
                format!(
                    "the number of lower bounds ({}) must match the number of upper bounds ({})",
                    self.lower.len(),
                    self.upper.len()
                ),
            ));
        }
        for (vi, (lb, ub)) in self.lower.iter().zip(&self.upper).enumerate() {
            if lb > ub {
                return Err(PError::Configuration(
                    name.to_string(),
                    format!("the lower bound of variable #{vi} ({lb}) is above its upper bound ({ub})"),
                ));
            }
        }
        Ok(())
    }

    /// Get the segment encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get the number of decision variables described by the segment.
    pub fn decision_variables(&self) -> usize {
        self.lower.len()
    }

    /// Get the number of columns in the segment chromosome matrix. For Gray-coded segments this is
    /// the total number of bits; for the other encodings one column stores one decision variable.
    pub fn chromosome_width(&self) -> usize {
        match self.encoding {
            Encoding::BinaryGray => self.bits.iter().sum(),
            _ => self.lower.len(),
        }
    }

    /// Get the lower bound of each decision variable.
    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    /// Get the upper bound of each decision variable.
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    /// Get the integer-rounding flag of each decision variable.
    pub fn integer_flags(&self) -> &[bool] {
        &self.integer
    }

    /// Generate a matrix of random chromosomes for the segment. Permutation rows are random
    /// shuffles of the value range, binary rows are uniform bits and real rows are sampled
    /// uniformly within the variable bounds.
    ///
    /// # Arguments
    ///
    /// * `size`: The number of chromosomes (matrix rows) to generate.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Array2<f64>`
    pub fn sample_chromosomes(&self, size: usize, rng: &mut dyn RngCore) -> Array2<f64> {
        let width = self.chromosome_width();
        let mut chromosomes = Array2::zeros((size, width));
        for row in 0..size {
            let values: Vec<f64> = match self.encoding {
                Encoding::Permutation => {
                    let mut values: Vec<f64> =
                        (0..width).map(|k| self.lower[0] + k as f64).collect();
                    values.shuffle(rng);
                    values
                }
                Encoding::BinaryGray => (0..width)
                    .map(|_| if rng.gen_bool(0.5) { 1.0 } else { 0.0 })
                    .collect(),
                Encoding::RealInteger => (0..width)
                    .map(|vi| {
                        let value = rng.gen_range(self.lower[vi]..=self.upper[vi]);
                        if self.integer[vi] {
                            value.round()
                        } else {
                            value
                        }
                    })
                    .collect(),
            };
            chromosomes.row_mut(row).assign(&Array1::from(values));
        }
        chromosomes
    }

    /// Decode a chromosome matrix into the phenotype columns for the segment. Permutation and
    /// real chromosomes decode to themselves (with integer rounding where requested); Gray-coded
    /// chromosomes are converted to binary and scaled to the variable bounds.
    ///
    /// # Arguments
    ///
    /// * `chromosomes`: The segment chromosome matrix.
    ///
    /// returns: `Result<Array2<f64>, PError>`
    pub fn decode(&self, chromosomes: &Array2<f64>) -> Result<Array2<f64>, PError> {
        let width = self.chromosome_width();
        if chromosomes.ncols() != width {
            return Err(PError::DataModelViolation(format!(
                "the chromosome matrix has {} columns but the segment requires {}",
                chromosomes.ncols(),
                width
            )));
        }

        let size = chromosomes.nrows();
        let mut phenotype = Array2::zeros((size, self.decision_variables()));
        match self.encoding {
            Encoding::Permutation => phenotype.assign(chromosomes),
            Encoding::RealInteger => {
                phenotype.assign(chromosomes);
                for (vi, is_integer) in self.integer.iter().enumerate() {
                    if *is_integer {
                        phenotype.column_mut(vi).mapv_inplace(|v| v.round());
                    }
                }
            }
            Encoding::BinaryGray => {
                for row in 0..size {
                    let mut offset = 0;
                    for (vi, b) in self.bits.iter().enumerate() {
                        let gray: Vec<bool> = (offset..offset + b)
                            .map(|c| chromosomes[[row, c]] >= 0.5)
                            .collect();
                        let mut value =
                            self.lower[vi] + gray_to_fraction(&gray) * (self.upper[vi] - self.lower[vi]);
                        if self.integer[vi] {
                            value = value.round();
                        }
                        phenotype[[row, vi]] = value;
                        offset += b;
                    }
                }
            }
        }
        Ok(phenotype)
    }
}

/// Convert a Gray-coded bit string (most significant bit first) to a fraction between 0 and 1.
///
/// # Arguments
///
/// * `gray`: The Gray-coded bits.
///
/// returns: `f64`
fn gray_to_fraction(gray: &[bool]) -> f64 {
    let mut integer: u64 = 0;
    let mut bit = false;
    for g in gray {
        bit ^= g;
        integer = (integer << 1) | bit as u64;
    }
    let max_value = (1_u64 << gray.len()) - 1;
    if max_value == 0 {
        0.0
    } else {
        integer as f64 / max_value as f64
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;
    use ndarray::{array, Axis};

    use crate::core::utils::get_rng;
    use crate::core::{Encoding, Segment};

    #[test]
    /// Random permutation chromosomes contain each value exactly once.
    fn test_permutation_sampling() {
        let segment = Segment::permutation(6, 1).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(10, &mut rng);

        assert_eq!(chromosomes.nrows(), 10);
        for row in chromosomes.axis_iter(Axis(0)) {
            let mut values: Vec<i64> = row.iter().map(|v| *v as i64).collect();
            values.sort();
            assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
        }
    }

    #[test]
    /// Real chromosomes are sampled within the variable bounds.
    fn test_real_sampling() {
        let segment = Segment::real(vec![-1.0, 10.0], vec![1.0, 20.0]).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(20, &mut rng);

        for row in chromosomes.axis_iter(Axis(0)) {
            assert!((-1.0..=1.0).contains(&row[0]));
            assert!((10.0..=20.0).contains(&row[1]));
        }
    }

    #[test]
    /// Gray-coded chromosomes decode to the scaled variable range.
    fn test_gray_decoding() {
        let segment = Segment::binary_gray(vec![0.0], vec![7.0], vec![3]).unwrap();

        // Gray 101 -> binary 110 -> 6
        let chromosomes = array![[1.0, 0.0, 1.0]];
        let phenotype = segment.decode(&chromosomes).unwrap();
        assert_approx_eq!(f64, phenotype[[0, 0]], 6.0, epsilon = 1e-9);

        // Gray 111 -> binary 101 -> 5
        let chromosomes = array![[1.0, 1.0, 1.0]];
        let phenotype = segment.decode(&chromosomes).unwrap();
        assert_approx_eq!(f64, phenotype[[0, 0]], 5.0, epsilon = 1e-9);

        // all zeros and all ones map to the range ends
        let chromosomes = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let phenotype = segment.decode(&chromosomes).unwrap();
        assert_approx_eq!(f64, phenotype[[0, 0]], 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, phenotype[[1, 0]], 7.0, epsilon = 1e-9);
    }

    #[test]
    /// Integer variables are rounded after decoding.
    fn test_integer_rounding() {
        let segment =
            Segment::real_integer(vec![0.0, 0.0], vec![10.0, 10.0], vec![false, true]).unwrap();
        let chromosomes = array![[1.4, 1.4], [2.6, 2.6]];
        let phenotype = segment.decode(&chromosomes).unwrap();

        assert_approx_eq!(f64, phenotype[[0, 0]], 1.4);
        assert_approx_eq!(f64, phenotype[[0, 1]], 1.0);
        assert_approx_eq!(f64, phenotype[[1, 1]], 3.0);
    }

    #[test]
    /// Invalid segment descriptors are rejected at construction.
    fn test_invalid_segments() {
        assert!(Segment::permutation(1, 0).is_err());
        assert!(Segment::real(vec![1.0], vec![0.0]).is_err());
        assert!(Segment::real(vec![], vec![]).is_err());
        assert!(Segment::real(vec![0.0, 0.0], vec![1.0]).is_err());
        assert!(Segment::binary_gray(vec![0.0], vec![1.0], vec![0]).is_err());
        assert!(Segment::binary_gray(vec![0.0], vec![1.0], vec![40]).is_err());
        assert!(Segment::binary_gray(vec![0.0], vec![1.0], vec![4, 4]).is_err());
    }

    #[test]
    /// The chromosome width accounts for the bit expansion of Gray-coded variables.
    fn test_chromosome_width() {
        let segment = Segment::binary_gray(vec![0.0, 0.0], vec![1.0, 1.0], vec![8, 4]).unwrap();
        assert_eq!(segment.encoding(), Encoding::BinaryGray);
        assert_eq!(segment.decision_variables(), 2);
        assert_eq!(segment.chromosome_width(), 12);

        let segment = Segment::permutation(5, 0).unwrap();
        assert_eq!(segment.chromosome_width(), 5);
    }

    #[test]
    /// Decoding rejects a chromosome matrix with the wrong number of columns.
    fn test_decode_wrong_width() {
        let segment = Segment::binary_gray(vec![0.0], vec![1.0], vec![4]).unwrap();
        let chromosomes = array![[1.0, 0.0]];
        assert!(segment.decode(&chromosomes).is_err());
    }
}
