use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use log::LevelFilter;

use polygene::algorithms::{Algorithm, MaxGeneration, StoppingConditionType, NSGA3, NSGA3Arg};
use polygene::core::builtin_problems::Dtlz1Problem;
use polygene::core::{Population, Segment};

/// Solve the DTLZ1 problem from Deb et al. (2013) with 3 objectives. The decision variables use
/// one real-encoded chromosome segment.
///
/// Make sure to compile this in release mode to speed up the calculation:
///
/// `cargo run --example nsga3_dtlz1 --release`
fn main() -> Result<(), Box<dyn Error>> {
    // Add log
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let number_objectives = 3;
    let k: usize = 5;
    let number_variables: usize = number_objectives + k - 1; // M + k - 1 with k = 5 (Section Va)
    let problem = Arc::new(Dtlz1Problem::new(number_variables, number_objectives)?);

    // all the variables are bounded between 0 and 1
    let segments = vec![Segment::real(
        vec![0.0; number_variables],
        vec![1.0; number_variables],
    )?];
    // the size is adjusted to the reference-point lattice when the algorithm starts
    let population = Population::new(segments, 92)?;

    let args = NSGA3Arg {
        stopping_condition: StoppingConditionType::MaxGeneration(MaxGeneration(400)),
        recombination_probabilities: None,
        mutation_probabilities: None,
        number_of_competitors: None,
        fast_niching: None,
        export_history: None,
        seed: Some(1),
    };

    // Initialise and run the algorithm
    let mut algo = NSGA3::new(problem, population, args)?;
    algo.run()?;

    // Export the last results to a JSON file
    let destination = PathBuf::from(&env::current_dir()?).join("demos").join("results");
    algo.save_to_json(&destination, Some("DTLZ1_3obj"))?;

    Ok(())
}
