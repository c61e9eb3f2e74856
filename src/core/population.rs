use ndarray::{concatenate, Array1, Array2, Axis};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::core::{ObjectiveDirection, PError, Segment};

/// A population of candidate solutions for one generation. The decision variables of each
/// individual are split into one or more independently-encoded chromosome segments; the population
/// stores one chromosome matrix per segment together with the decoded phenotype matrix, the
/// objective matrix, the constraint-violation matrix (for constrained problems) and the fitness
/// vector used when sampling parents.
///
/// Row `i` of every matrix refers to the same individual. Every operation offered by this struct
/// (merging, sub-setting, decoding, resizing) reorders or copies all the matrices together so the
/// row correspondence is never broken.
#[derive(Clone, Debug)]
pub struct Population {
    /// The descriptor of each chromosome segment. Fixed at construction.
    segments: Vec<Segment>,
    /// The population size requested by the caller. The algorithm may resize the population (for
    /// example to match a reference-point set); `len()` returns the actual size.
    requested_size: usize,
    /// One chromosome matrix per segment. All matrices have the same number of rows.
    chromosomes: Vec<Array2<f64>>,
    /// The decoded decision variables, one column per variable across all segments.
    phenotype: Array2<f64>,
    /// The objective values, available once the population has been evaluated.
    objectives: Option<Array2<f64>>,
    /// The constraint violations (positive entries are violations). Only available for constrained
    /// problems after an evaluation.
    constraint_violation: Option<Array2<f64>>,
    /// The fitness assigned to each individual, used to sample parents. This defaults to `1` and
    /// is owned by the caller's fitness-assignment scheme; the algorithm only reads it.
    fitness: Array1<f64>,
}

/// The population data exported to JSON.
#[derive(Serialize, Deserialize, Debug)]
pub struct PopulationExport {
    /// The decoded decision variables of each individual.
    pub phenotype: Vec<Vec<f64>>,
    /// The objective values of each individual.
    pub objectives: Option<Vec<Vec<f64>>>,
    /// The constraint violations of each individual.
    pub constraint_violation: Option<Vec<Vec<f64>>>,
    /// The fitness of each individual.
    pub fitness: Vec<f64>,
}

/// Convert a matrix to nested vectors for serialisation.
fn to_nested_vec(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|r| r.to_vec()).collect()
}

impl Population {
    /// Create an empty population with the provided chromosome segments. Chromosomes are
    /// generated later by [`Population::init_chromosomes`], typically when the algorithm adjusts
    /// the population size to its reference-point set.
    ///
    /// # Arguments
    ///
    /// * `segments`: The descriptor of each chromosome segment. At least one is required.
    /// * `requested_size`: The number of individuals the caller asks for.
    ///
    /// returns: `Result<Population, PError>`
    pub fn new(segments: Vec<Segment>, requested_size: usize) -> Result<Self, PError> {
        if segments.is_empty() {
            return Err(PError::Configuration(
                "population".to_string(),
                "at least one chromosome segment is required".to_string(),
            ));
        }
        if requested_size == 0 {
            return Err(PError::Configuration(
                "population".to_string(),
                "the requested population size must be at least 1".to_string(),
            ));
        }

        let total_variables: usize = segments.iter().map(|s| s.decision_variables()).sum();
        let chromosomes = segments
            .iter()
            .map(|s| Array2::zeros((0, s.chromosome_width())))
            .collect();
        Ok(Self {
            segments,
            requested_size,
            chromosomes,
            phenotype: Array2::zeros((0, total_variables)),
            objectives: None,
            constraint_violation: None,
            fitness: Array1::ones(0),
        })
    }

    /// Get the number of individuals in the population.
    pub fn len(&self) -> usize {
        self.phenotype.nrows()
    }

    /// Whether the population holds no individuals.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the population size requested at construction, before any adjustment made by the
    /// algorithm.
    pub fn requested_size(&self) -> usize {
        self.requested_size
    }

    /// Get the number of chromosome segments.
    pub fn chromosome_count(&self) -> usize {
        self.segments.len()
    }

    /// Get the segment descriptors.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Get the descriptor of one segment. This returns an error if the segment does not exist.
    ///
    /// # Arguments
    ///
    /// * `index`: The segment index.
    ///
    /// returns: `Result<&Segment, PError>`
    pub fn segment(&self, index: usize) -> Result<&Segment, PError> {
        self.segments
            .get(index)
            .ok_or(PError::NonExistingIndex("segment".to_string(), index))
    }

    /// Get the chromosome matrix of one segment. This returns an error if the segment does not
    /// exist.
    ///
    /// # Arguments
    ///
    /// * `index`: The segment index.
    ///
    /// returns: `Result<&Array2<f64>, PError>`
    pub fn chromosome(&self, index: usize) -> Result<&Array2<f64>, PError> {
        self.chromosomes
            .get(index)
            .ok_or(PError::NonExistingIndex("segment".to_string(), index))
    }

    /// Replace the chromosome matrix of one segment. The new matrix must have the same number of
    /// rows as the population and the column count required by the segment.
    ///
    /// # Arguments
    ///
    /// * `index`: The segment index.
    /// * `chromosomes`: The new chromosome matrix.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_chromosome(&mut self, index: usize, chromosomes: Array2<f64>) -> Result<(), PError> {
        let segment = self.segment(index)?;
        if chromosomes.ncols() != segment.chromosome_width() {
            return Err(PError::DataModelViolation(format!(
                "the chromosome matrix for segment #{index} has {} columns but the segment requires {}",
                chromosomes.ncols(),
                segment.chromosome_width()
            )));
        }
        if chromosomes.nrows() != self.len() {
            return Err(PError::DataModelViolation(format!(
                "the chromosome matrix for segment #{index} has {} rows but the population contains {} individuals",
                chromosomes.nrows(),
                self.len()
            )));
        }
        self.chromosomes[index] = chromosomes;
        Ok(())
    }

    /// Get the phenotype matrix.
    pub fn phenotype(&self) -> &Array2<f64> {
        &self.phenotype
    }

    /// Get the objective matrix, if the population has been evaluated.
    pub fn objectives(&self) -> Option<&Array2<f64>> {
        self.objectives.as_ref()
    }

    /// Get the constraint-violation matrix, if the problem is constrained and the population has
    /// been evaluated.
    pub fn constraint_violation(&self) -> Option<&Array2<f64>> {
        self.constraint_violation.as_ref()
    }

    /// Get the fitness vector.
    pub fn fitness(&self) -> &Array1<f64> {
        &self.fitness
    }

    /// Set the objective matrix. This returns an error if the matrix row count does not match the
    /// population size.
    ///
    /// # Arguments
    ///
    /// * `objectives`: The objective matrix, one row per individual.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_objectives(&mut self, objectives: Array2<f64>) -> Result<(), PError> {
        if objectives.nrows() != self.len() {
            return Err(PError::DataModelViolation(format!(
                "the objective matrix has {} rows but the population contains {} individuals",
                objectives.nrows(),
                self.len()
            )));
        }
        self.objectives = Some(objectives);
        Ok(())
    }

    /// Set the constraint-violation matrix. This returns an error if the matrix row count does not
    /// match the population size.
    ///
    /// # Arguments
    ///
    /// * `constraint_violation`: The constraint-violation matrix, one row per individual. Positive
    ///   entries are violations.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_constraint_violation(
        &mut self,
        constraint_violation: Array2<f64>,
    ) -> Result<(), PError> {
        if constraint_violation.nrows() != self.len() {
            return Err(PError::DataModelViolation(format!(
                "the constraint matrix has {} rows but the population contains {} individuals",
                constraint_violation.nrows(),
                self.len()
            )));
        }
        self.constraint_violation = Some(constraint_violation);
        Ok(())
    }

    /// Set the fitness vector. This returns an error if the vector length does not match the
    /// population size.
    ///
    /// # Arguments
    ///
    /// * `fitness`: The fitness of each individual. Larger values are preferred by the selectors.
    ///
    /// returns: `Result<(), PError>`
    pub fn set_fitness(&mut self, fitness: Array1<f64>) -> Result<(), PError> {
        if fitness.len() != self.len() {
            return Err(PError::DataModelViolation(format!(
                "the fitness vector has {} entries but the population contains {} individuals",
                fitness.len(),
                self.len()
            )));
        }
        self.fitness = fitness;
        Ok(())
    }

    /// Generate random chromosomes for every segment and decode the phenotype. This resizes the
    /// population to `size` individuals, discards any previous objective and constraint values and
    /// resets the fitness vector to `1`.
    ///
    /// # Arguments
    ///
    /// * `size`: The new population size.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<(), PError>`
    pub fn init_chromosomes(&mut self, size: usize, rng: &mut dyn RngCore) -> Result<(), PError> {
        self.chromosomes = self
            .segments
            .iter()
            .map(|s| s.sample_chromosomes(size, rng))
            .collect();
        self.objectives = None;
        self.constraint_violation = None;
        self.fitness = Array1::ones(size);

        // sets the phenotype with the correct row count before decoding
        let total_variables: usize = self.segments.iter().map(|s| s.decision_variables()).sum();
        self.phenotype = Array2::zeros((size, total_variables));
        self.decode()
    }

    /// Rebuild the phenotype matrix by decoding every chromosome segment. This must be called
    /// after the chromosome matrices are changed by the variation operators.
    ///
    /// returns: `Result<(), PError>`
    pub fn decode(&mut self) -> Result<(), PError> {
        let mut columns: Vec<Array2<f64>> = Vec::with_capacity(self.segments.len());
        for (segment, chromosomes) in self.segments.iter().zip(&self.chromosomes) {
            columns.push(segment.decode(chromosomes)?);
        }
        let views: Vec<_> = columns.iter().map(|c| c.view()).collect();
        self.phenotype = concatenate(Axis(1), &views)
            .map_err(|e| PError::DataModelViolation(e.to_string()))?;
        Ok(())
    }

    /// Merge this population with another one. The returned population contains the individuals
    /// of `self` followed by the individuals of `other`; every matrix is the row-wise
    /// concatenation of the two operands. The populations must share the same segment descriptors
    /// and both must either carry or miss objective and constraint values.
    ///
    /// # Arguments
    ///
    /// * `other`: The population to append.
    ///
    /// returns: `Result<Population, PError>`
    pub fn merge(&self, other: &Population) -> Result<Population, PError> {
        if self.segments != other.segments {
            return Err(PError::DataModelViolation(
                "cannot merge populations with different chromosome segments".to_string(),
            ));
        }

        let mut chromosomes = Vec::with_capacity(self.segments.len());
        for (a, b) in self.chromosomes.iter().zip(&other.chromosomes) {
            let merged = concatenate(Axis(0), &[a.view(), b.view()])
                .map_err(|e| PError::DataModelViolation(e.to_string()))?;
            chromosomes.push(merged);
        }

        let phenotype = concatenate(Axis(0), &[self.phenotype.view(), other.phenotype.view()])
            .map_err(|e| PError::DataModelViolation(e.to_string()))?;

        let objectives = match (&self.objectives, &other.objectives) {
            (Some(a), Some(b)) => Some(
                concatenate(Axis(0), &[a.view(), b.view()])
                    .map_err(|e| PError::DataModelViolation(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(PError::DataModelViolation(
                    "cannot merge an evaluated population with an unevaluated one".to_string(),
                ))
            }
        };

        let constraint_violation = match (&self.constraint_violation, &other.constraint_violation)
        {
            (Some(a), Some(b)) => Some(
                concatenate(Axis(0), &[a.view(), b.view()])
                    .map_err(|e| PError::DataModelViolation(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(PError::DataModelViolation(
                    "cannot merge populations where only one carries constraint values".to_string(),
                ))
            }
        };

        let fitness = concatenate(Axis(0), &[self.fitness.view(), other.fitness.view()])
            .map_err(|e| PError::DataModelViolation(e.to_string()))?;

        Ok(Population {
            segments: self.segments.clone(),
            requested_size: self.requested_size,
            chromosomes,
            phenotype,
            objectives,
            constraint_violation,
            fitness,
        })
    }

    /// Create a new population containing the individuals at the provided row indices, in order.
    /// An index may appear more than once to duplicate an individual. This returns an error if an
    /// index is out of range.
    ///
    /// # Arguments
    ///
    /// * `indices`: The row indices of the individuals to keep.
    ///
    /// returns: `Result<Population, PError>`
    pub fn select_by_indices(&self, indices: &[usize]) -> Result<Population, PError> {
        for index in indices {
            if *index >= self.len() {
                return Err(PError::NonExistingIndex("individual".to_string(), *index));
            }
        }

        let chromosomes = self
            .chromosomes
            .iter()
            .map(|c| c.select(Axis(0), indices))
            .collect();
        Ok(Population {
            segments: self.segments.clone(),
            requested_size: self.requested_size,
            chromosomes,
            phenotype: self.phenotype.select(Axis(0), indices),
            objectives: self.objectives.as_ref().map(|o| o.select(Axis(0), indices)),
            constraint_violation: self
                .constraint_violation
                .as_ref()
                .map(|cv| cv.select(Axis(0), indices)),
            fitness: self.fitness.select(Axis(0), indices),
        })
    }

    /// Create a new population containing the individuals whose mask entry is `true`. This returns
    /// an error if the mask length does not match the population size.
    ///
    /// # Arguments
    ///
    /// * `mask`: One flag per individual.
    ///
    /// returns: `Result<Population, PError>`
    pub fn select_by_mask(&self, mask: &[bool]) -> Result<Population, PError> {
        if mask.len() != self.len() {
            return Err(PError::DataModelViolation(format!(
                "the selection mask has {} entries but the population contains {} individuals",
                mask.len(),
                self.len()
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| if *keep { Some(i) } else { None })
            .collect();
        self.select_by_indices(&indices)
    }

    /// Get the objective matrix with every column multiplied by the direction sign, so that all
    /// the objectives are minimised. This returns an error if the population has not been
    /// evaluated or the number of directions does not match the objective columns.
    ///
    /// # Arguments
    ///
    /// * `directions`: The direction of each problem objective.
    ///
    /// returns: `Result<Array2<f64>, PError>`
    pub fn signed_objectives(
        &self,
        directions: &[ObjectiveDirection],
    ) -> Result<Array2<f64>, PError> {
        let objectives = self.objectives.as_ref().ok_or(PError::DataModelViolation(
            "the population has not been evaluated yet".to_string(),
        ))?;
        if objectives.ncols() != directions.len() {
            return Err(PError::DataModelViolation(format!(
                "the objective matrix has {} columns but {} objective directions are defined",
                objectives.ncols(),
                directions.len()
            )));
        }

        let mut signed = objectives.clone();
        for (oi, direction) in directions.iter().enumerate() {
            let sign = direction.sign();
            signed.column_mut(oi).mapv_inplace(|v| v * sign);
        }
        Ok(signed)
    }

    /// Export the population data for serialisation.
    ///
    /// returns: `PopulationExport`
    pub fn serialise(&self) -> PopulationExport {
        PopulationExport {
            phenotype: to_nested_vec(&self.phenotype),
            objectives: self.objectives.as_ref().map(to_nested_vec),
            constraint_violation: self.constraint_violation.as_ref().map(to_nested_vec),
            fitness: self.fitness.to_vec(),
        }
    }
}

#[cfg(test)]
mod test {
    use ndarray::{array, Array2};

    use crate::core::utils::get_rng;
    use crate::core::{ObjectiveDirection, Population, Segment};

    fn two_segment_population(size: usize) -> Population {
        let segments = vec![
            Segment::permutation(4, 0).unwrap(),
            Segment::real(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap(),
        ];
        let mut population = Population::new(segments, size).unwrap();
        let mut rng = get_rng(Some(1));
        population.init_chromosomes(size, &mut rng).unwrap();
        population
    }

    #[test]
    /// Initialising the chromosomes generates aligned matrices and decodes the phenotype.
    fn test_init_chromosomes() {
        let population = two_segment_population(8);

        assert_eq!(population.len(), 8);
        assert_eq!(population.chromosome_count(), 2);
        assert_eq!(population.chromosome(0).unwrap().nrows(), 8);
        assert_eq!(population.chromosome(1).unwrap().nrows(), 8);
        assert_eq!(population.phenotype().nrows(), 8);
        assert_eq!(population.phenotype().ncols(), 6);
        assert_eq!(population.fitness().len(), 8);
        assert!(population.objectives().is_none());
    }

    #[test]
    /// Merging appends the second population's rows after the first one's across all arrays.
    fn test_merge() {
        let mut p = two_segment_population(3);
        let mut q = two_segment_population(2);
        p.set_objectives(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
            .unwrap();
        q.set_objectives(array![[7.0, 8.0], [9.0, 10.0]]).unwrap();

        let merged = p.merge(&q).unwrap();
        assert_eq!(merged.len(), p.len() + q.len());

        for i in 0..p.len() {
            assert_eq!(merged.phenotype().row(i), p.phenotype().row(i));
            assert_eq!(
                merged.chromosome(0).unwrap().row(i),
                p.chromosome(0).unwrap().row(i)
            );
            assert_eq!(
                merged.objectives().unwrap().row(i),
                p.objectives().unwrap().row(i)
            );
        }
        for i in 0..q.len() {
            let k = p.len() + i;
            assert_eq!(merged.phenotype().row(k), q.phenotype().row(i));
            assert_eq!(
                merged.chromosome(1).unwrap().row(k),
                q.chromosome(1).unwrap().row(i)
            );
            assert_eq!(
                merged.objectives().unwrap().row(k),
                q.objectives().unwrap().row(i)
            );
        }
    }

    #[test]
    /// Merging rejects populations with different segments or evaluation states.
    fn test_merge_errors() {
        let p = two_segment_population(3);

        let other_segments = vec![Segment::permutation(4, 0).unwrap()];
        let mut other = Population::new(other_segments, 3).unwrap();
        let mut rng = get_rng(Some(2));
        other.init_chromosomes(3, &mut rng).unwrap();
        assert!(p.merge(&other).is_err());

        let mut evaluated = two_segment_population(3);
        evaluated
            .set_objectives(Array2::zeros((3, 2)))
            .unwrap();
        assert!(p.merge(&evaluated).is_err());
    }

    #[test]
    /// Sub-setting by indices duplicates and reorders every array in the same way.
    fn test_select_by_indices() {
        let mut p = two_segment_population(4);
        p.set_objectives(array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]])
            .unwrap();

        let indices = vec![2, 0, 2, 3];
        let subset = p.select_by_indices(&indices).unwrap();

        assert_eq!(subset.len(), indices.len());
        for (k, i) in indices.iter().enumerate() {
            assert_eq!(subset.phenotype().row(k), p.phenotype().row(*i));
            assert_eq!(
                subset.chromosome(0).unwrap().row(k),
                p.chromosome(0).unwrap().row(*i)
            );
            assert_eq!(
                subset.chromosome(1).unwrap().row(k),
                p.chromosome(1).unwrap().row(*i)
            );
            assert_eq!(
                subset.objectives().unwrap().row(k),
                p.objectives().unwrap().row(*i)
            );
        }

        assert!(p.select_by_indices(&[4]).is_err());
    }

    #[test]
    /// Sub-setting by mask keeps the flagged individuals only.
    fn test_select_by_mask() {
        let p = two_segment_population(4);
        let subset = p.select_by_mask(&[true, false, false, true]).unwrap();

        assert_eq!(subset.len(), 2);
        assert_eq!(subset.phenotype().row(0), p.phenotype().row(0));
        assert_eq!(subset.phenotype().row(1), p.phenotype().row(3));

        assert!(p.select_by_mask(&[true, false]).is_err());
    }

    #[test]
    /// Signed objectives flip the columns of maximised objectives.
    fn test_signed_objectives() {
        let mut p = two_segment_population(2);
        p.set_objectives(array![[1.0, 2.0], [3.0, 4.0]]).unwrap();

        let signed = p
            .signed_objectives(&[ObjectiveDirection::Minimise, ObjectiveDirection::Maximise])
            .unwrap();
        assert_eq!(signed, array![[1.0, -2.0], [3.0, -4.0]]);

        // direction count mismatch
        assert!(p.signed_objectives(&[ObjectiveDirection::Minimise]).is_err());
    }

    #[test]
    /// Row-count mismatches in the setters are rejected.
    fn test_setter_validation() {
        let mut p = two_segment_population(3);
        assert!(p.set_objectives(Array2::zeros((2, 2))).is_err());
        assert!(p.set_constraint_violation(Array2::zeros((4, 1))).is_err());
        assert!(p.set_fitness(ndarray::Array1::ones(2)).is_err());
        assert!(p.set_chromosome(0, Array2::zeros((3, 9))).is_err());
        assert!(p.set_chromosome(0, Array2::zeros((2, 4))).is_err());
        assert!(p.set_chromosome(5, Array2::zeros((3, 4))).is_err());
    }
}
