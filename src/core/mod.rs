pub use encoding::{Encoding, Segment};
pub use error::PError;
pub use population::{Population, PopulationExport};
pub use problem::{
    builtin_problems, EvaluationResult, ObjectiveDirection, Problem, ProblemExport,
};

mod encoding;
mod error;
mod population;
mod problem;
pub(crate) mod utils;
