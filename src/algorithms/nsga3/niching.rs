use std::collections::HashMap;

use log::debug;
use rand::prelude::SliceRandom;
use rand::RngCore;

use crate::core::PError;

/// A member of the boundary level that may be added to the new population during the niching.
#[derive(Clone, Debug)]
pub(crate) struct BoundaryMember {
    /// The row index of the member in the combined population.
    pub row: usize,
    /// The index of the associated reference point.
    pub ref_point_index: usize,
    /// The perpendicular distance to the associated reference-point line.
    pub distance: f64,
}

/// This implements "Algorithm 4" in the paper which adds members from the boundary level to the
/// new population based on the reference-point association and minimum distance.
///
/// Members are drawn one at a time from the niche (the reference point) with the fewest
/// associated survivors. When `fast` is enabled, ties between niches are broken at random and an
/// already-occupied niche picks a random associated member; with `fast` disabled the behaviour is
/// deterministic (lowest reference-point index and closest member first).
pub(crate) struct Niching<'a> {
    /// The row-selection mask over the combined population being built. Rows selected by the
    /// niching are flagged `true`.
    mask: &'a mut [bool],
    /// The members of the boundary level not yet added to the new population. This is `F_l` in
    /// the paper.
    pool: Vec<BoundaryMember>,
    /// The number of members to add to the new population to complete the evolution.
    missing_item_count: usize,
    /// The map from the reference-point index to the number of its associated members already in
    /// the new population.
    rho_j: &'a mut HashMap<usize, usize>,
    /// Whether to break niche ties pseudo-randomly.
    fast: bool,
    /// The random number generator.
    rng: &'a mut dyn RngCore,
}

impl<'a> Niching<'a> {
    /// Niching algorithm.
    ///
    /// # Arguments
    ///
    /// * `mask`: The row-selection mask over the combined population, already flagging the
    ///   members of the levels before the boundary one.
    /// * `pool`: The members of the boundary level.
    /// * `number_of_members_to_add`: The number of members to add to the mask from `pool`.
    /// * `rho_j`: The map containing the reference-point indexes as keys and the number of
    ///   associated members already selected.
    /// * `fast`: Whether to break niche ties pseudo-randomly.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Result<Niching, PError>`
    pub fn new(
        mask: &'a mut [bool],
        pool: Vec<BoundaryMember>,
        number_of_members_to_add: usize,
        rho_j: &'a mut HashMap<usize, usize>,
        fast: bool,
        rng: &'a mut dyn RngCore,
    ) -> Result<Self, PError> {
        let name = "NSGA3-Niching".to_string();
        if rho_j.is_empty() {
            return Err(PError::AlgorithmRun(
                name,
                "the niche-count map is empty".to_string(),
            ));
        }
        if pool.len() < number_of_members_to_add {
            return Err(PError::AlgorithmRun(
                name,
                format!(
                    "the number of members to add ({number_of_members_to_add}) is larger than the boundary level size ({})",
                    pool.len()
                ),
            ));
        }

        Ok(Self {
            mask,
            pool,
            missing_item_count: number_of_members_to_add,
            rho_j,
            fast,
            rng,
        })
    }

    /// Add new members to the selection mask by draining items from the boundary pool. Reference
    /// points not associated with any member in the pool are excluded from the current evolution
    /// by removing them from the niche-count map.
    ///
    /// return: `Result<(), PError>`
    pub fn calculate(&mut self) -> Result<(), PError> {
        let name = "NSGA3-Niching".to_string();
        let mut k = 1;
        debug!("Number of members to choose {}", self.missing_item_count);

        while k <= self.missing_item_count {
            debug!("Adding member {k}/{} to new population", self.missing_item_count);

            // step 3 - get the minimum niche count among the reference points still in play.
            // Points with no association in the pool are excluded by removing them from rho_j
            // later (Z_r = Z_r/{j_hat}, step 15)
            let min_rho_j = *self
                .rho_j
                .iter()
                .min_by(|(_, v1), (_, v2)| v1.cmp(v2))
                .ok_or_else(|| {
                    PError::AlgorithmRun(name.clone(), "the niche-count map is empty".to_string())
                })?
                .1;

            // step 3 - collect all the reference-point indexes with the minimum niche count
            let mut j_min_set: Vec<usize> = self
                .rho_j
                .iter()
                .filter_map(|(ref_index, ref_counter)| {
                    if *ref_counter == min_rho_j {
                        Some(*ref_index)
                    } else {
                        None
                    }
                })
                .collect();

            // step 4 - get the reference point with the minimum association counter
            let j_hat = if self.fast {
                // select a point randomly when the set size is > 1
                *j_min_set
                    .choose(&mut self.rng)
                    .ok_or_else(|| {
                        PError::AlgorithmRun(name.clone(), "empty j_min_set".to_string())
                    })?
            } else {
                j_min_set.sort();
                *j_min_set
                    .first()
                    .ok_or_else(|| {
                        PError::AlgorithmRun(name.clone(), "empty j_min_set".to_string())
                    })?
            };
            debug!("Selected reference point j_hat=#{j_hat}");

            // step 5 - members in the pool linked to the current reference point
            let i_j: Vec<usize> = self
                .pool
                .iter()
                .enumerate()
                .filter_map(|(index, member)| {
                    if member.ref_point_index == j_hat {
                        Some(index)
                    } else {
                        None
                    }
                })
                .collect();
            debug!("Found {} potential members associated with it", i_j.len());

            if !i_j.is_empty() {
                // step 6 - select a member from the boundary level
                let pool_index = if min_rho_j == 0 || !self.fast {
                    // steps 7-8 - no selected member is associated with j_hat yet; add the
                    // member with the shortest distance to the reference line
                    *i_j.iter()
                        .min_by(|a, b| self.pool[**a].distance.total_cmp(&self.pool[**b].distance))
                        .unwrap()
                } else {
                    // step 10 - the niche is already occupied; choose a random member
                    *i_j.choose(&mut self.rng).unwrap()
                };

                // step 12a - mark the reference point as associated to a new member
                *self.rho_j.get_mut(&j_hat).unwrap() += 1;

                // step 12b - add the new member and remove it from the pool
                let member = self.pool.remove(pool_index);
                debug!(
                    "Added member #{} to the new population - reference point #{j_hat}",
                    member.row
                );
                self.mask[member.row] = true;

                // step 13
                k += 1;
            } else {
                // step 15 - no member in the pool is associated with the reference point, which
                // will have no linked member at this evolution. Exclude it.
                debug!("Excluding reference point #{j_hat} - no candidates associated with it");
                self.rho_j.remove(&j_hat);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use crate::algorithms::nsga3::niching::{BoundaryMember, Niching};
    use crate::core::utils::get_rng;

    #[test]
    /// Check that the niching (1) adds the closest member when the reference point is not
    /// already associated with a selected member; (2) reference points without pool members are
    /// excluded from the algorithm.
    fn test_niching_rho0() {
        // 2 selected members linked to 2 out of 4 reference points
        let mut mask = vec![true, true, false, false];
        let mut rho_j: HashMap<usize, usize> = HashMap::new();
        rho_j.insert(0, 1);
        rho_j.insert(1, 1);
        rho_j.insert(2, 0);
        rho_j.insert(3, 0);

        // both pool members are linked to reference point #2 but the first one is closer
        let pool = vec![
            BoundaryMember {
                row: 2,
                ref_point_index: 2,
                distance: 0.4,
            },
            BoundaryMember {
                row: 3,
                ref_point_index: 2,
                distance: 0.9,
            },
        ];

        let mut rng = get_rng(Some(1));
        let mut n = Niching::new(&mut mask, pool, 1, &mut rho_j, true, &mut rng).unwrap();
        n.calculate().unwrap();

        // the counter for reference point #2 has increased
        assert_eq!(rho_j[&2_usize], 1_usize);
        // the closest member is added to the mask
        assert_eq!(mask, vec![true, true, true, false]);
    }

    #[test]
    /// Check that the niching adds a member associated with an occupied reference point when no
    /// empty niche has candidates. With the deterministic tie-break the closest member wins.
    fn test_niching_rho1() {
        let mut mask = vec![true, true, false, false];
        let mut rho_j: HashMap<usize, usize> = HashMap::new();
        rho_j.insert(0, 1);
        rho_j.insert(1, 1);
        // reference point #2 has no pool member and is excluded during the run
        rho_j.insert(2, 0);

        // both pool members are linked to the occupied reference point #1; the second one is
        // closer
        let pool = vec![
            BoundaryMember {
                row: 2,
                ref_point_index: 1,
                distance: 99.0,
            },
            BoundaryMember {
                row: 3,
                ref_point_index: 1,
                distance: 0.9,
            },
        ];

        let mut rng = get_rng(Some(1));
        let mut n = Niching::new(&mut mask, pool, 1, &mut rho_j, false, &mut rng).unwrap();
        n.calculate().unwrap();

        // the counter for reference point #1 has increased and the closest member was selected
        assert_eq!(rho_j[&1_usize], 2_usize);
        assert_eq!(mask, vec![true, true, false, true]);
        // the unassociated reference point was excluded
        assert!(!rho_j.contains_key(&2_usize));
    }

    #[test]
    /// The niching rejects a pool smaller than the number of members to add.
    fn test_niching_pool_too_small() {
        let mut mask = vec![false, false];
        let mut rho_j: HashMap<usize, usize> = HashMap::new();
        rho_j.insert(0, 0);

        let pool = vec![BoundaryMember {
            row: 0,
            ref_point_index: 0,
            distance: 0.1,
        }];
        let mut rng = get_rng(Some(1));
        assert!(Niching::new(&mut mask, pool, 2, &mut rho_j, true, &mut rng).is_err());
    }
}
