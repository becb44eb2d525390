//! The route-to-schedule compiler: turns an abstract station visit order
//! into a concrete, time- and capacity-feasible sequence of pickup,
//! delivery and repair actions, mutating the network inventory in place.

pub mod allotment;
pub mod amendment;
pub mod repairman;
pub mod truck;
pub mod unsat;

pub use amendment::{amend_repairman_schedule, amend_truck_schedule};
pub use repairman::compile_repairman_route;
pub use truck::compile_truck_route;

use crate::config::Config;

/// Largest number of bikes that can be loaded (or unloaded) within the
/// remaining time; each movement costs two loading-time units.
pub fn max_load_by_time(config: &Config, remaining: f64) -> i32 {
    (remaining / config.loading_time / 2.0).floor() as i32
}

/// Largest number of bikes that can be repaired within the remaining time.
pub fn max_repair_by_time(config: &Config, remaining: f64) -> i32 {
    (remaining / config.repair_time).floor() as i32
}
