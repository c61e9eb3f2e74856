use thiserror::Error;

#[derive(Error, Debug)]
/// Errors raised by the library.
pub enum PError {
    #[error("The following error occurred: {0}")]
    Generic(String),
    #[error("Invalid configuration for {0}: {1}")]
    Configuration(String, String),
    #[error("The reinsertion step needs {0} individuals but only {1} are available")]
    InsufficientIndividuals(usize, usize),
    #[error("The population arrays are misaligned: {0}")]
    DataModelViolation(String),
    #[error("The {0} index {1} does not exist")]
    NonExistingIndex(String, usize),
    #[error("An error occurred when evaluating a solution: {0}")]
    Evaluation(String),
    #[error("NaN detected in {0}. This may be an error in the user-defined evaluation function")]
    NaN(String),
    #[error("An error occurred in the crossover operator '{0}': {1}")]
    CrossoverOperator(String, String),
    #[error("An error occurred in the mutation operator '{0}': {1}")]
    MutationOperator(String, String),
    #[error("An error occurred in the selector operator '{0}': {1}")]
    SelectorOperator(String, String),
    #[error("An error occurred in the survival operator '{0}': {1}")]
    SurvivalOperator(String, String),
    #[error("An error occurred when initialising {0}: {1}")]
    AlgorithmInit(String, String),
    #[error("An error occurred when running {0}: {1}")]
    AlgorithmRun(String, String),
    #[error("An error occurred when exporting the algorithm data: {0}")]
    AlgorithmExport(String),
}
