//! Configuration parameters for the bike-share repositioning solver.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Problem and algorithm settings consumed by every component of the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of stations, excluding the depot
    pub nb_clients: usize,
    /// Number of trucks in the fleet
    pub nb_vehicles: usize,
    /// Number of repairmen in the fleet
    pub nb_repairmen: usize,
    /// Carrying capacity of each truck (usable + broken bikes)
    pub vehicle_capacity: i32,
    /// Time to repair one bike in place
    pub repair_time: f64,
    /// Time for a single loading or unloading movement
    pub loading_time: f64,
    /// Total working-time budget of each vehicle and repairman
    pub time_budget: f64,
    /// Minimum subpopulation size (μ)
    pub mu: usize,
    /// Number of offspring in a generation (λ)
    pub lambda: usize,
    /// Iterations between penalty-coefficient updates
    pub nb_iter_penalty_management: u32,
    /// Target proportion of feasible individuals among recent insertions
    pub target_feasible: f64,
    /// Iterations without improvement before termination
    pub nb_iter_no_imp: u32,
    /// Initial penalty for one unit of capacity excess
    pub penalty_capacity: f64,
    /// Optional wall-clock limit for the whole search
    pub time_limit: Option<Duration>,
    /// Consecutive non-improving repeats tolerated for a successful operator
    pub it_edu: u32,
    /// Seed for the random source; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nb_clients: 10,
            nb_vehicles: 1,
            nb_repairmen: 1,
            vehicle_capacity: 25,
            repair_time: 300.0,
            loading_time: 60.0,
            time_budget: 7200.0,
            mu: 25,
            lambda: 40,
            nb_iter_penalty_management: 100,
            target_feasible: 0.2,
            nb_iter_no_imp: 5000,
            penalty_capacity: 100.0,
            time_limit: None,
            it_edu: 40,
            seed: None,
        }
    }
}

impl Config {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the number of stations (excluding the depot).
    pub fn with_nb_clients(mut self, n: usize) -> Self {
        self.nb_clients = n;
        self
    }

    /// Set the number of trucks.
    pub fn with_nb_vehicles(mut self, n: usize) -> Self {
        self.nb_vehicles = n;
        self
    }

    /// Set the number of repairmen.
    pub fn with_nb_repairmen(mut self, n: usize) -> Self {
        self.nb_repairmen = n;
        self
    }

    /// Set the truck carrying capacity.
    pub fn with_vehicle_capacity(mut self, capacity: i32) -> Self {
        self.vehicle_capacity = capacity;
        self
    }

    /// Set the per-bike repair time.
    pub fn with_repair_time(mut self, t: f64) -> Self {
        self.repair_time = t;
        self
    }

    /// Set the per-movement loading time.
    pub fn with_loading_time(mut self, t: f64) -> Self {
        self.loading_time = t;
        self
    }

    /// Set the working-time budget.
    pub fn with_time_budget(mut self, t: f64) -> Self {
        self.time_budget = t;
        self
    }

    /// Set the minimum subpopulation size.
    pub fn with_mu(mut self, mu: usize) -> Self {
        self.mu = mu;
        self
    }

    /// Set the generation size.
    pub fn with_lambda(mut self, lambda: usize) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the penalty-management interval.
    pub fn with_nb_iter_penalty_management(mut self, n: u32) -> Self {
        self.nb_iter_penalty_management = n;
        self
    }

    /// Set the target proportion of feasible individuals.
    pub fn with_target_feasible(mut self, ratio: f64) -> Self {
        self.target_feasible = ratio;
        self
    }

    /// Set the non-improvement termination threshold.
    pub fn with_nb_iter_no_imp(mut self, n: u32) -> Self {
        self.nb_iter_no_imp = n;
        self
    }

    /// Set the initial capacity penalty.
    pub fn with_penalty_capacity(mut self, penalty: f64) -> Self {
        self.penalty_capacity = penalty;
        self
    }

    /// Set the wall-clock limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the adaptive-repeat tolerance of the local search.
    pub fn with_it_edu(mut self, n: u32) -> Self {
        self.it_edu = n;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
