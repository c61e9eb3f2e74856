//! polygene is a framework to solve multi-objective optimisation problems whose decision
//! variables are split into independently-encoded chromosome segments (for example a
//! permutation next to a set of real numbers and a Gray-coded bit string). The library provides
//! the multi-chromosome NSGA3 genetic algorithm, where each segment is recombined and mutated
//! with the operator pair fixed by its encoding and the survivors are selected by non-dominated
//! sorting combined with reference-point niching.
//!
//! To solve a problem you need to:
//!  - implement the [`crate::core::Problem`] trait to evaluate the decoded decision variables of
//!    a whole population;
//!  - describe the chromosome segments with [`crate::core::Segment`] and build a
//!    [`crate::core::Population`];
//!  - configure the [`crate::algorithms::NSGA3`] algorithm with [`crate::algorithms::NSGA3Arg`]
//!    and call [`crate::algorithms::Algorithm::run`].
//!
//! The population size is adjusted at initialisation to match the cardinality of the uniform
//! reference-point set (see [`crate::utils::DasDennis`]); the adjusted size, not the requested
//! one, is used for the rest of the evolution.
pub mod algorithms;
pub mod core;
pub mod operators;
pub mod utils;
