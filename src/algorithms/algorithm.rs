use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithms::{StoppingCondition, StoppingConditionType};
use crate::core::{PError, Population, PopulationExport, Problem, ProblemExport};

#[derive(Serialize, Deserialize, Debug)]
/// The data with the elapsed time.
pub struct Elapsed {
    /// Elapsed hours.
    hours: u64,
    /// Elapsed minutes.
    minutes: u64,
    /// Elapsed seconds.
    seconds: u64,
}

#[derive(Serialize, Debug)]
/// The struct used to export an algorithm serialised data.
pub struct AlgorithmSerialisedExport<T: Serialize> {
    /// Specific options for an algorithm.
    pub options: T,
    /// The problem configuration.
    pub problem: ProblemExport,
    /// The population at the current generation.
    pub population: PopulationExport,
    /// The generation the export was collected at.
    pub generation: usize,
    /// The number of objective-function evaluations performed up to the current generation.
    pub number_of_function_evaluations: usize,
    /// The algorithm name.
    pub algorithm: String,
    /// The time when the data was exported.
    pub exported_on: DateTime<Utc>,
    /// The time taken to reach the `generation`.
    pub took: Elapsed,
}

/// A struct with the options to configure the individual's history export. Export may be enabled
/// in an algorithm to save objectives, constraints and solutions to a file each time the
/// generation counter increases by a certain step provided in `generation_step`. Exporting
/// history may be useful to track convergence and inspect an algorithm evolution.
#[derive(Clone, Debug)]
pub struct ExportHistory {
    /// Export the algorithm data each time the generation counter increases by the provided step.
    generation_step: usize,
    /// Serialise the algorithm history and export the results to a JSON file in the given folder.
    destination: PathBuf,
}

impl ExportHistory {
    /// Initialise the export history configuration. This returns an error if the destination
    /// folder does not exist.
    ///
    /// # Arguments
    ///
    /// * `generation_step`: export the algorithm data each time the generation counter in a
    ///   genetic algorithm increases by the provided step.
    /// * `destination`: serialise the algorithm history and export the results to a JSON file in
    ///   the given folder.
    ///
    /// returns: `Result<ExportHistory, PError>`
    pub fn new(generation_step: usize, destination: &str) -> Result<Self, PError> {
        let destination = PathBuf::from(destination);
        if !destination.exists() {
            return Err(PError::Generic(format!(
                "The destination folder '{:?}' does not exist",
                destination
            )));
        }
        Ok(Self {
            generation_step,
            destination,
        })
    }

    /// Get the configured generation step.
    pub fn generation_step(&self) -> usize {
        self.generation_step
    }

    /// Get the configured destination folder.
    pub fn destination(&self) -> &PathBuf {
        &self.destination
    }
}

/// The trait to use to implement an algorithm.
pub trait Algorithm<AlgorithmOptions: Serialize>: Display {
    /// Initialise the algorithm.
    ///
    /// return: `Result<(), PError>`
    fn initialise(&mut self) -> Result<(), PError>;

    /// Evolve the population by one generation.
    ///
    /// return: `Result<(), PError>`
    fn evolve(&mut self) -> Result<(), PError>;

    /// Return the current step of the algorithm evolution.
    ///
    /// return: `usize`.
    fn generation(&self) -> usize;

    /// Return the number of objective-function evaluations performed so far. The counter is reset
    /// when the algorithm is initialised and it then grows by the offspring size at every
    /// generation; it is never decremented.
    ///
    /// return: `usize`.
    fn number_of_function_evaluations(&self) -> usize;

    /// Return the algorithm name.
    ///
    /// return: `String`.
    fn name(&self) -> String;

    /// Get the time when the algorithm started.
    ///
    /// return: `&Instant`.
    fn start_time(&self) -> &Instant;

    /// Return the stopping condition.
    ///
    /// return: `&StoppingConditionType`.
    fn stopping_condition(&self) -> &StoppingConditionType;

    /// Return the evolved population.
    ///
    /// return: `&Population`.
    fn population(&self) -> &Population;

    /// Return the problem.
    ///
    /// return: `Arc<dyn Problem>`.
    fn problem(&self) -> Arc<dyn Problem>;

    /// Return the history export configuration, if provided by the algorithm.
    ///
    /// return: `Option<&ExportHistory>`.
    fn export_history(&self) -> Option<&ExportHistory>;

    /// Return the algorithm options being used.
    ///
    /// return: `AlgorithmOptions`.
    fn algorithm_options(&self) -> AlgorithmOptions;

    /// Whether the configured stopping condition is met. This is a query with no side effects:
    /// the population and the algorithm counters are left untouched.
    ///
    /// return: `bool`.
    fn terminated(&self) -> bool {
        match self.stopping_condition() {
            StoppingConditionType::MaxDuration(t) => t.is_met(self.start_time().elapsed()),
            StoppingConditionType::MaxGeneration(t) => t.is_met(self.generation()),
            StoppingConditionType::MaxFunctionEvaluations(t) => {
                t.is_met(self.number_of_function_evaluations())
            }
            StoppingConditionType::Custom(t) => t.is_met(self.population()),
        }
    }

    /// Get the elapsed hours, minutes and seconds since the start of the algorithm.
    ///
    /// return: `[u64; 3]`. An array with the number of elapsed hours, minutes and seconds.
    fn elapsed(&self) -> [u64; 3] {
        let duration = self.start_time().elapsed();
        let seconds = duration.as_secs() % 60;
        let minutes = (duration.as_secs() / 60) % 60;
        let hours = (duration.as_secs() / 60) / 60;
        [hours, minutes, seconds]
    }

    /// Format the elapsed time as string.
    ///
    /// return: `String`.
    fn elapsed_as_string(&self) -> String {
        let [hours, minutes, seconds] = self.elapsed();
        format!(
            "{:0>2} hours, {:0>2} minutes and {:0>2} seconds",
            hours, minutes, seconds
        )
    }

    /// Run the algorithm. The stopping condition is checked before each generation; when it is
    /// already met at the start no evolution takes place.
    ///
    /// return: `Result<(), PError>`
    fn run(&mut self) -> Result<(), PError> {
        info!("Starting {}", self.name());
        self.initialise()?;
        // export at init
        if let Some(export) = self.export_history() {
            self.save_to_json(&export.destination, Some("Init"))?;
        }

        let mut history_gen_step: usize = 0;
        while !self.terminated() {
            info!("Generation #{}", self.generation() + 1);
            self.evolve()?;
            info!(
                "Evolved generation #{} - Elapsed Time: {}",
                self.generation(),
                self.elapsed_as_string()
            );
            debug!("========================");

            // export history
            if let Some(export) = self.export_history() {
                if history_gen_step >= export.generation_step {
                    self.save_to_json(&export.destination, None)?;
                    history_gen_step = 0;
                } else {
                    history_gen_step += 1;
                }
            }
        }

        info!(
            "Stopping evolution because the {} was reached",
            self.stopping_condition().name()
        );
        info!("Took {}", self.elapsed_as_string());

        // save last file
        if let Some(export) = self.export_history() {
            self.save_to_json(&export.destination, Some("Final"))?;
        }
        Ok(())
    }

    /// Save the algorithm data (the population phenotype, objectives and constraint violations,
    /// the problem configuration, ...) to a JSON file. This returns an error if the file cannot
    /// be saved.
    ///
    /// # Arguments
    ///
    /// * `destination`: The path to the destination folder.
    /// * `file_prefix`: A prefix to prepend at the beginning of the file name. "History" when
    ///   `None`.
    ///
    /// return `Result<(), PError>`
    fn save_to_json(&self, destination: &PathBuf, file_prefix: Option<&str>) -> Result<(), PError> {
        let file_prefix = file_prefix.unwrap_or("History");

        let [hours, minutes, seconds] = self.elapsed();
        let export = AlgorithmSerialisedExport {
            options: self.algorithm_options(),
            problem: ProblemExport::from_problem(self.problem().as_ref()),
            population: self.population().serialise(),
            generation: self.generation(),
            number_of_function_evaluations: self.number_of_function_evaluations(),
            algorithm: self.name(),
            exported_on: Utc::now(),
            took: Elapsed {
                hours,
                minutes,
                seconds,
            },
        };
        let data = serde_json::to_string_pretty(&export).map_err(|e| {
            PError::AlgorithmExport(format!(
                "The following error occurred while converting the history struct: {e}"
            ))
        })?;

        let mut file = destination.to_owned();
        file.push(format!(
            "{}_{}_gen{}.json",
            file_prefix,
            self.name(),
            self.generation()
        ));

        info!("Saving JSON file {:?}", file);
        fs::write(file, data).map_err(|e| {
            PError::AlgorithmExport(format!(
                "The following error occurred while exporting the history JSON file: {e}",
            ))
        })?;
        Ok(())
    }
}
