pub use algorithm::{Algorithm, AlgorithmSerialisedExport, Elapsed, ExportHistory};
pub use nsga3::{NSGA3, NSGA3Arg, NSGA3Options};
pub use stopping_condition::{
    CustomStoppingCondition, MaxDuration, MaxFunctionEvaluations, MaxGeneration,
    StoppingCondition, StoppingConditionType,
};

mod algorithm;
mod nsga3;
mod stopping_condition;
