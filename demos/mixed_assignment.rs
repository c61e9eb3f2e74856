use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use log::LevelFilter;

use polygene::algorithms::{Algorithm, MaxGeneration, StoppingConditionType, NSGA3, NSGA3Arg};
use polygene::core::builtin_problems::MixedAssignmentProblem;
use polygene::core::{Population, Segment};

/// Solve the mixed assignment problem with three chromosome segments: the assignment order is
/// permutation-encoded, the effort levels are real-encoded and an extra set of coarse levels is
/// Gray-coded with 8 bits per variable. Each segment is recombined and mutated with the operator
/// pair fixed by its encoding.
///
/// `cargo run --example mixed_assignment --release`
fn main() -> Result<(), Box<dyn Error>> {
    // Add log
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let tasks = 12;
    let real_levels = 4;
    let coarse_levels = 2;
    let problem = Arc::new(MixedAssignmentProblem::new(tasks, real_levels + coarse_levels)?);

    let segments = vec![
        Segment::permutation(tasks, 0)?,
        Segment::real(vec![0.0; real_levels], vec![1.0; real_levels])?,
        Segment::binary_gray(vec![0.0; coarse_levels], vec![1.0; coarse_levels], vec![8; 2])?,
    ];
    let population = Population::new(segments, 50)?;

    let args = NSGA3Arg {
        stopping_condition: StoppingConditionType::MaxGeneration(MaxGeneration(200)),
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

    // Print the objectives of the final population
    let population = algo.population();
    if let Some(objectives) = population.objectives() {
        println!("Objectives of the final {} individuals:", population.len());
        for row in objectives.rows() {
            println!("  f1 = {:.4} - f2 = {:.4}", row[0], row[1]);
        }
    }

    // Export the last results to a JSON file
    let destination = PathBuf::from(&env::current_dir()?).join("demos").join("results");
    algo.save_to_json(&destination, Some("MixedAssignment"))?;

    Ok(())
}
