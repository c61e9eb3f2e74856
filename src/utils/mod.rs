pub use algebra::{
    dot_product, perpendicular_distance, solve_linear_system, vector_magnitude,
    LinearSolverTolerance,
};
pub use non_dominated_sort::{non_dominated_sort, NonDominatedSortResults};
pub use reference_points::{
    DasDennis, NumberOfPartitions, ReferencePointGenerator, ReferencePointSet, SimplexLattice,
    TwoLayerPartitions,
};
pub use vectors::{all_close, argmin, vector_max, vector_min};

mod algebra;
mod non_dominated_sort;
mod reference_points;
pub(crate) mod vectors;
