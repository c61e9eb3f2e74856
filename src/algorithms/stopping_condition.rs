use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::core::Population;

/// Trait to define a condition that causes an algorithm to terminate.
pub trait StoppingCondition<T: PartialOrd> {
    /// The target value of the stopping condition.
    fn target(&self) -> T;

    /// Whether the stopping condition is met.
    fn is_met(&self, current: T) -> bool {
        self.target() <= current
    }

    /// A name describing the stopping condition.
    fn name() -> String;
}

/// Number of generations after which a genetic algorithm terminates.
#[derive(Clone)]
pub struct MaxGeneration(pub usize);

impl StoppingCondition<usize> for MaxGeneration {
    fn target(&self) -> usize {
        self.0
    }

    fn name() -> String {
        "maximum number of generations".to_string()
    }
}

/// Number of objective-function evaluations after which a genetic algorithm terminates.
#[derive(Clone)]
pub struct MaxFunctionEvaluations(pub usize);

impl StoppingCondition<usize> for MaxFunctionEvaluations {
    fn target(&self) -> usize {
        self.0
    }

    fn name() -> String {
        "maximum number of function evaluations".to_string()
    }
}

/// Elapsed time after which a genetic algorithm terminates.
#[derive(Clone)]
pub struct MaxDuration(pub Duration);

impl StoppingCondition<Duration> for MaxDuration {
    fn target(&self) -> Duration {
        self.0
    }

    fn name() -> String {
        "maximum duration".to_string()
    }
}

/// A user-defined predicate over the current population that causes an algorithm to terminate
/// when it returns `true`.
pub struct CustomStoppingCondition {
    /// A name describing the condition, used in the log messages.
    name: String,
    /// The predicate evaluated against the population at each generation.
    predicate: Box<dyn Fn(&Population) -> bool>,
}

impl CustomStoppingCondition {
    /// Create a custom stopping condition.
    ///
    /// # Arguments
    ///
    /// * `name`: A name describing the condition.
    /// * `predicate`: The predicate evaluated against the population at each generation. The
    ///   evolution stops when it returns `true`.
    ///
    /// returns: `CustomStoppingCondition`
    pub fn new<F: Fn(&Population) -> bool + 'static>(name: &str, predicate: F) -> Self {
        Self {
            name: name.to_string(),
            predicate: Box::new(predicate),
        }
    }

    /// Whether the condition is met for the provided population.
    ///
    /// # Arguments
    ///
    /// * `population`: The population at the current generation.
    ///
    /// returns: `bool`
    pub fn is_met(&self, population: &Population) -> bool {
        (self.predicate)(population)
    }

    /// A name describing the stopping condition.
    pub fn name(&self) -> String {
        self.name.clone()
    }
}

impl Debug for CustomStoppingCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomStoppingCondition({})", self.name)
    }
}

/// The type of stopping condition. Pick one type to inform the algorithm how/when it should
/// terminate the population evolution.
pub enum StoppingConditionType {
    /// Set a maximum duration
    MaxDuration(MaxDuration),
    /// Set a maximum number of generations
    MaxGeneration(MaxGeneration),
    /// Set a maximum number of objective-function evaluations
    MaxFunctionEvaluations(MaxFunctionEvaluations),
    /// Set a custom predicate over the current population
    Custom(CustomStoppingCondition),
}

impl StoppingConditionType {
    /// A name describing the stopping condition.
    pub fn name(&self) -> String {
        match self {
            StoppingConditionType::MaxDuration(_) => MaxDuration::name(),
            StoppingConditionType::MaxGeneration(_) => MaxGeneration::name(),
            StoppingConditionType::MaxFunctionEvaluations(_) => MaxFunctionEvaluations::name(),
            StoppingConditionType::Custom(c) => c.name(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::algorithms::{
        CustomStoppingCondition, MaxDuration, MaxFunctionEvaluations, MaxGeneration,
        StoppingCondition,
    };
    use crate::core::utils::population_from_objectives;

    #[test]
    fn test_counter_conditions() {
        assert!(!MaxGeneration(100).is_met(99));
        assert!(MaxGeneration(100).is_met(100));
        assert!(MaxGeneration(100).is_met(101));

        assert!(!MaxFunctionEvaluations(1000).is_met(999));
        assert!(MaxFunctionEvaluations(1000).is_met(1000));
    }

    #[test]
    fn test_duration_condition() {
        let condition = MaxDuration(Duration::from_secs(60));
        assert!(!condition.is_met(Duration::from_secs(59)));
        assert!(condition.is_met(Duration::from_secs(61)));
    }

    #[test]
    fn test_custom_condition() {
        let population = population_from_objectives(vec![vec![1.0, 2.0], vec![3.0, 4.0]], None);
        let condition = CustomStoppingCondition::new("small population", |p| p.len() < 5);
        assert!(condition.is_met(&population));
        assert_eq!(condition.name(), "small population");
    }
}
