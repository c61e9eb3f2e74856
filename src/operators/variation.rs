use ndarray::Array2;
use rand::RngCore;

use crate::core::{Encoding, PError, Segment};
use crate::operators::{
    BitFlipMutation, InversionMutation, Mutation, PartiallyMatchedCrossover, PolynomialMutation,
    PolynomialMutationArgs, Recombination, SimulatedBinaryCrossover,
    SimulatedBinaryCrossoverArgs, UniformCrossover,
};

/// The recombination and mutation pair applied to one chromosome segment, with the probabilities
/// used when the pair is invoked. The operators are fixed by the segment encoding:
///
/// | Encoding                     | Recombination                  | Mutation              |
/// |------------------------------|--------------------------------|-----------------------|
/// | [`Encoding::Permutation`]    | partially-matched crossover    | inversion             |
/// | [`Encoding::BinaryGray`]     | uniform crossover              | bit flip              |
/// | [`Encoding::RealInteger`]    | simulated binary crossover     | polynomial mutation   |
///
/// Segments are varied independently: the operators of segment `i` never read the chromosomes of
/// another segment, so the row alignment across segments is preserved by construction.
pub struct SegmentVariation {
    /// The recombination operator.
    recombination: Box<dyn Recombination>,
    /// The mutation operator.
    mutation: Box<dyn Mutation>,
    /// The probability that a pair of rows takes part in the recombination.
    recombination_probability: f64,
    /// The probability that a row is mutated.
    mutation_probability: f64,
}

impl SegmentVariation {
    /// Create the variation pair for a segment encoding, with both probabilities set to 1 (full
    /// intensity).
    ///
    /// # Arguments
    ///
    /// * `encoding`: The segment encoding.
    ///
    /// returns: `Result<SegmentVariation, PError>`
    pub fn for_encoding(encoding: Encoding) -> Result<Self, PError> {
        let (recombination, mutation): (Box<dyn Recombination>, Box<dyn Mutation>) = match encoding
        {
            Encoding::Permutation => (
                Box::new(PartiallyMatchedCrossover),
                Box::new(InversionMutation),
            ),
            Encoding::BinaryGray => (
                Box::new(UniformCrossover),
                Box::new(BitFlipMutation::new(None)?),
            ),
            Encoding::RealInteger => (
                Box::new(SimulatedBinaryCrossover::new(
                    SimulatedBinaryCrossoverArgs::default(),
                )?),
                Box::new(PolynomialMutation::new(PolynomialMutationArgs::default())?),
            ),
        };
        Ok(Self {
            recombination,
            mutation,
            recombination_probability: 1.0,
            mutation_probability: 1.0,
        })
    }

    /// Set the probability that a pair of rows takes part in the recombination. This returns an
    /// error if the probability is outside the [0, 1] range.
    ///
    /// # Arguments
    ///
    /// * `probability`: The recombination probability.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_recombination_probability(&mut self, probability: f64) -> Result<(), PError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(PError::Configuration(
                "segment variation".to_string(),
                format!(
                    "the recombination probability {probability} must be a number between 0 and 1"
                ),
            ));
        }
        self.recombination_probability = probability;
        Ok(())
    }

    /// Set the probability that a row is mutated. This returns an error if the probability is
    /// outside the [0, 1] range.
    ///
    /// # Arguments
    ///
    /// * `probability`: The mutation probability.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_mutation_probability(&mut self, probability: f64) -> Result<(), PError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(PError::Configuration(
                "segment variation".to_string(),
                format!("the mutation probability {probability} must be a number between 0 and 1"),
            ));
        }
        self.mutation_probability = probability;
        Ok(())
    }

    /// Get the recombination probability.
    pub fn recombination_probability(&self) -> f64 {
        self.recombination_probability
    }

    /// Get the mutation probability.
    pub fn mutation_probability(&self) -> f64 {
        self.mutation_probability
    }

    /// Recombine and then mutate a segment chromosome matrix. This returns an error if an
    /// operator changes the number of rows, since that would break the row correspondence with
    /// the other segments.
    ///
    /// # Arguments
    ///
    /// * `chromosomes`: The segment chromosome matrix.
    /// * `segment`: The segment descriptor.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<Array2<f64>, PError>`. The varied chromosome matrix.
    pub fn apply(
        &self,
        chromosomes: &Array2<f64>,
        segment: &Segment,
        rng: &mut dyn RngCore,
    ) -> Result<Array2<f64>, PError> {
        let rows = chromosomes.nrows();

        let recombined = self.recombination.recombine(
            chromosomes,
            segment,
            self.recombination_probability,
            rng,
        )?;
        if recombined.nrows() != rows {
            return Err(PError::DataModelViolation(format!(
                "the {} operator returned {} rows instead of {rows}",
                self.recombination.name(),
                recombined.nrows()
            )));
        }

        let mutated =
            self.mutation
                .mutate(&recombined, segment, self.mutation_probability, rng)?;
        if mutated.nrows() != rows {
            return Err(PError::DataModelViolation(format!(
                "the {} operator returned {} rows instead of {rows}",
                self.mutation.name(),
                mutated.nrows()
            )));
        }
        Ok(mutated)
    }
}

#[cfg(test)]
mod test {
    use ndarray::Axis;

    use crate::core::utils::get_rng;
    use crate::core::{Encoding, Segment};
    use crate::operators::SegmentVariation;

    #[test]
    /// The variation pair preserves the row count and the encoding domain for every encoding.
    fn test_variation_row_count() {
        let mut rng = get_rng(Some(1));
        let cases = vec![
            Segment::permutation(6, 0).unwrap(),
            Segment::binary_gray(vec![0.0, 0.0], vec![1.0, 1.0], vec![4, 4]).unwrap(),
            Segment::real(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]).unwrap(),
        ];

        for segment in cases {
            let chromosomes = segment.sample_chromosomes(9, &mut rng);
            let variation = SegmentVariation::for_encoding(segment.encoding()).unwrap();
            let varied = variation.apply(&chromosomes, &segment, &mut rng).unwrap();

            assert_eq!(varied.nrows(), 9);
            assert_eq!(varied.ncols(), segment.chromosome_width());

            if segment.encoding() == Encoding::Permutation {
                for row in varied.axis_iter(Axis(0)) {
                    let mut values: Vec<i64> = row.iter().map(|v| *v as i64).collect();
                    values.sort();
                    assert_eq!(values, (0..6).collect::<Vec<i64>>());
                }
            }
        }
    }

    #[test]
    /// Probability overrides are validated.
    fn test_probability_overrides() {
        let mut variation = SegmentVariation::for_encoding(Encoding::RealInteger).unwrap();
        variation.set_recombination_probability(0.8).unwrap();
        variation.set_mutation_probability(0.2).unwrap();
        assert_eq!(variation.recombination_probability(), 0.8);
        assert_eq!(variation.mutation_probability(), 0.2);

        assert!(variation.set_recombination_probability(1.2).is_err());
        assert!(variation.set_mutation_probability(-0.1).is_err());
    }

    #[test]
    /// With a zero probability the chromosomes pass through unchanged.
    fn test_zero_probability() {
        let segment = Segment::real(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let mut rng = get_rng(Some(1));
        let chromosomes = segment.sample_chromosomes(6, &mut rng);

        let mut variation = SegmentVariation::for_encoding(Encoding::RealInteger).unwrap();
        variation.set_recombination_probability(0.0).unwrap();
        variation.set_mutation_probability(0.0).unwrap();

        let varied = variation.apply(&chromosomes, &segment, &mut rng).unwrap();
        assert_eq!(varied, chromosomes);
    }
}
