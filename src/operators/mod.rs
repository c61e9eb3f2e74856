pub use comparison::{total_violation, ConstrainedDominance, PreferredSolution};
pub use crossover::{
    PartiallyMatchedCrossover, Recombination, SimulatedBinaryCrossover,
    SimulatedBinaryCrossoverArgs, UniformCrossover,
};
pub use mutation::{
    BitFlipMutation, InversionMutation, Mutation, PolynomialMutation, PolynomialMutationArgs,
};
pub use selector::{RouletteWheelSelector, Selector, TournamentSelector};
pub use variation::SegmentVariation;

pub mod comparison;
pub mod crossover;
pub mod mutation;
pub mod selector;
pub mod variation;
