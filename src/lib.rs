//! # HGS-BSRP
//!
//! A hybrid genetic search for the bike-share repositioning problem with
//! broken-bike repair: capacity-limited trucks rebalance usable bikes while
//! repairmen fix broken bikes in place, all under a shared working-time
//! budget.
//!
//! The algorithm evolves route chromosomes for both vehicle kinds; a greedy
//! compiler turns each route into concrete per-stop quantities, and the
//! evaluator replays every vehicle's actions in global chronological order
//! to price dissatisfaction, emissions and capacity violations. Population
//! diversity and an adaptive constraint penalty keep feasible and
//! infeasible candidates evolving side by side.

pub mod compiler;
pub mod config;
pub mod evaluator;
pub mod genetic;
pub mod individual;
pub mod instance;
pub mod local_search;
pub mod population;
pub mod schedule;
pub mod utils;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::genetic::Genetic;
use crate::individual::Individual;
use crate::instance::Instance;
use crate::local_search::LocalSearch;
use crate::population::Population;

/// Iterations without improvement between diversification rounds.
const DIVERSIFICATION_INTERVAL: u32 = 1000;
/// Iterations between progress traces.
const TRACE_INTERVAL: u32 = 100;

/// The main structure orchestrating the hybrid genetic search.
pub struct HgsAlgorithm {
    pub instance: Instance,
    pub config: Config,
    pub population: Population,
    pub best_individual: Option<Individual>,
    pub run_time: Duration,
    pub iterations: u32,
    pub iterations_without_improvement: u32,
    pub genetic: Genetic,
    pub local_search: LocalSearch,
    rng: ChaCha8Rng,
    start_time: Instant,
}

impl HgsAlgorithm {
    /// Create a new search instance for the given problem and configuration.
    pub fn new(instance: Instance, config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        HgsAlgorithm {
            instance,
            population: Population::new(&config),
            config,
            best_individual: None,
            run_time: Duration::from_secs(0),
            iterations: 0,
            iterations_without_improvement: 0,
            genetic: Genetic,
            local_search: LocalSearch::new(),
            rng,
            start_time: Instant::now(),
        }
    }

    /// Build the initial population, regenerating whole batches until at
    /// least one feasible individual exists.
    pub fn initialize(&mut self) {
        self.population.generate_initial(
            &self.instance,
            &self.config,
            &self.local_search,
            self.start_time,
            &mut self.rng,
        );
        while self.population.feasible.is_empty() {
            self.population.generate_initial(
                &self.instance,
                &self.config,
                &self.local_search,
                self.start_time,
                &mut self.rng,
            );
        }
        self.best_individual = self.population.best_feasible().cloned();
    }

    /// Run the search until the termination criteria are met and return the
    /// best feasible individual found.
    pub fn run(&mut self) -> &Individual {
        self.start_time = Instant::now();

        info!("building initial population");
        self.initialize();
        self.population.update_all_biased_fitness();
        let mut best_obj = self
            .best_individual
            .as_ref()
            .map(|ind| ind.eval.obj_val)
            .unwrap_or(f64::INFINITY);
        info!("initial population done, best objective {:.4}", best_obj);

        while !self.should_terminate() {
            let parent_a = self.population.binary_tournament(&mut self.rng).clone();
            let parent_b = self.population.binary_tournament(&mut self.rng).clone();
            let mut offspring = self.genetic.crossover(
                &parent_a,
                &parent_b,
                &self.instance,
                &self.config,
                self.population.penalty_capacity,
                &mut self.rng,
            );

            self.local_search.run(
                &mut offspring,
                &self.instance,
                &self.config,
                self.population.penalty_capacity,
                &mut self.rng,
            );
            self.population.insert(offspring.clone(), &self.config);

            let mut improved = false;
            if offspring.eval.is_feasible && offspring.eval.obj_val < best_obj {
                best_obj = offspring.eval.obj_val;
                self.best_individual = Some(offspring.clone());
                improved = true;
            }

            // half of the infeasible offspring get a repair attempt under an
            // escalated penalty
            if !offspring.eval.is_feasible && self.rng.gen_bool(0.5) {
                let saved_penalty = self.population.penalty_capacity;
                self.population.penalty_capacity *= 10.0;
                self.local_search.run(
                    &mut offspring,
                    &self.instance,
                    &self.config,
                    self.population.penalty_capacity,
                    &mut self.rng,
                );
                self.population.insert(offspring.clone(), &self.config);
                if !offspring.eval.is_feasible {
                    self.population.penalty_capacity *= 10.0;
                    self.local_search.run(
                        &mut offspring,
                        &self.instance,
                        &self.config,
                        self.population.penalty_capacity,
                        &mut self.rng,
                    );
                    self.population.insert(offspring.clone(), &self.config);
                }
                self.population.penalty_capacity = saved_penalty;
            }

            self.iterations += 1;
            if improved {
                self.iterations_without_improvement = 0;
            } else {
                self.iterations_without_improvement += 1;
            }

            if self.iterations_without_improvement > 0
                && self.iterations_without_improvement % DIVERSIFICATION_INTERVAL == 0
            {
                debug!(
                    "diversifying after {} non-improving iterations",
                    self.iterations_without_improvement
                );
                self.population
                    .diversification(&self.instance, &self.config, &mut self.rng);
                self.population.update_all_biased_fitness();
            }

            if self.iterations > 0
                && self.iterations % self.config.nb_iter_penalty_management == 0
            {
                self.population.adjust_penalty(&self.config);
                self.population.reset_latest();
            }

            if self.iterations % TRACE_INTERVAL == 0 {
                debug!(
                    "iteration {}, non-improving {}, best {:.4}, elapsed {:.1}s",
                    self.iterations,
                    self.iterations_without_improvement,
                    best_obj,
                    self.start_time.elapsed().as_secs_f64()
                );
            }
        }

        self.run_time = self.start_time.elapsed();
        info!(
            "search finished after {} iterations in {:.2}s, best objective {:.4}",
            self.iterations,
            self.run_time.as_secs_f64(),
            best_obj
        );
        self.best_individual.as_ref().unwrap()
    }

    /// Check the termination criteria between iterations.
    fn should_terminate(&self) -> bool {
        if self.iterations_without_improvement > self.config.nb_iter_no_imp {
            return true;
        }
        if let Some(time_limit) = self.config.time_limit {
            if self.start_time.elapsed() >= time_limit {
                return true;
            }
        }
        false
    }
}
