//! Feasibility checking and objective computation: all vehicle schedules are
//! replayed in global chronological order against the initial inventories.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::instance::{Instance, Inventory};
use crate::schedule::{Action, RepairStop, TruckStop, RPM_TRAVEL_FACTOR};

/// Weight of user dissatisfaction in the objective.
const DISSAT_WEIGHT: f64 = 2.0;
/// Weight of truck emissions in the objective.
const EMISSION_WEIGHT: f64 = 0.06;
/// Tie-breaking weight of total route and operation time in the objective.
const TIME_WEIGHT: f64 = 1e-8;

/// CO2-equivalent mass per litre of diesel.
const CO2_PER_LITRE: f64 = 2.61;
/// Base fuel consumption rate of an empty truck, litres per minute.
const FUEL_RATE_EMPTY: f64 = 0.252;
/// Additional fuel consumption rate per bike on board.
const FUEL_RATE_PER_BIKE: f64 = 0.0003;
/// Conversion of the per-hour fuel figure to the emission unit.
const EMISSION_SCALE: f64 = 0.42;

/// Evaluation of one candidate solution. Derived, never hand-edited: it is
/// recomputed whenever the chromosomes change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eval {
    /// Scalar objective value (lower is better)
    pub obj_val: f64,
    /// True if the replay never violated an inventory bound
    pub is_feasible: bool,
    /// Total user dissatisfaction at the final station states
    pub dissat: f64,
    /// Total truck emissions over all legs
    pub emission: f64,
    /// Accumulated magnitude of inventory-bound violations
    pub capacity_excess: f64,
    /// Total truck travel time
    pub route_time_trk: f64,
    /// Total repairman travel time
    pub route_time_rpm: f64,
    /// Total truck loading/unloading time
    pub operation_time_trk: f64,
    /// Total repair time
    pub operation_time_rpm: f64,
    /// Per-station dissatisfaction at the final state, when feasible
    pub dissatisfaction: Vec<f64>,
    /// Rank-based composite of quality and diversity (population-assigned)
    pub biased_fitness: f64,
    /// Rank by objective value within the subpopulation, 1-based
    pub rank_fit: usize,
    /// Rank by similarity within the subpopulation, 1-based
    pub rank_sim: usize,
    /// Number of route arcs shared with other members of the subpopulation
    pub similarity: usize,
}

impl Eval {
    /// Recompute the objective from the stored cost components under the
    /// given capacity penalty.
    pub fn compute_objective(&mut self, penalty_capacity: f64) {
        self.obj_val = DISSAT_WEIGHT * self.dissat
            + EMISSION_WEIGHT * self.emission
            + TIME_WEIGHT
                * (self.route_time_trk
                    + self.route_time_rpm
                    + self.operation_time_trk
                    + self.operation_time_rpm)
            + penalty_capacity * self.capacity_excess;
    }
}

/// Stamp arrival times on every stop, merge all schedules into one stream
/// ordered by arrival time, and replay it against the initial inventories.
///
/// A station state is infeasible when its usable or broken count drops below
/// zero or their sum exceeds the station capacity; violation magnitudes
/// accumulate into `capacity_excess` and are penalized in the objective
/// rather than rejected, so infeasible solutions stay comparable.
pub fn evaluate(
    config: &Config,
    instance: &Instance,
    truck_schedules: &mut [Vec<TruckStop>],
    rpm_schedules: &mut [Vec<RepairStop>],
    penalty_capacity: f64,
) -> Eval {
    let mut eval = Eval {
        is_feasible: true,
        ..Eval::default()
    };
    let mut stream: Vec<Action> = Vec::new();

    for scheme in truck_schedules.iter_mut() {
        let mut arrival = 0.0;
        let mut prev_station = 0;
        scheme[0].arrival_time = 0.0;
        let initial_load =
            f64::from(scheme[0].load_usable + scheme[0].load_broken) * config.loading_time;
        let mut operation_time = initial_load;
        arrival += initial_load;
        let mut emission = 0.0;
        let mut route_time = 0.0;
        for j in 1..scheme.len() {
            let leg = instance.distance(prev_station, scheme[j].station);
            arrival += leg;
            scheme[j].arrival_time = arrival;
            arrival += config.loading_time * f64::from(scheme[j].movements());
            emission += CO2_PER_LITRE
                * (FUEL_RATE_EMPTY
                    + FUEL_RATE_PER_BIKE
                        * f64::from(
                            scheme[j - 1].onboard_usable + scheme[j - 1].onboard_broken,
                        ))
                * leg
                / 60.0
                * EMISSION_SCALE;
            route_time += leg;
            operation_time += config.loading_time * f64::from(scheme[j].movements());
            prev_station = scheme[j].station;
            stream.push(Action::Truck(scheme[j].clone()));
        }
        eval.emission += emission;
        eval.route_time_trk += route_time;
        eval.operation_time_trk += operation_time;
    }

    for scheme in rpm_schedules.iter_mut() {
        let mut arrival = 0.0;
        let mut prev_station = 0;
        scheme[0].arrival_time = 0.0;
        let mut route_time = 0.0;
        let mut operation_time = 0.0;
        for j in 1..scheme.len() {
            let leg = instance.distance(prev_station, scheme[j].station) * RPM_TRAVEL_FACTOR;
            arrival += leg;
            scheme[j].arrival_time = arrival;
            let repair_time = f64::from(scheme[j].repaired) * config.repair_time;
            arrival += repair_time;
            route_time += leg;
            operation_time += repair_time;
            prev_station = scheme[j].station;
            stream.push(Action::Repairman(scheme[j].clone()));
        }
        eval.route_time_rpm += route_time;
        eval.operation_time_rpm += operation_time;
    }

    stream.sort_by(|a, b| a.arrival_time().partial_cmp(&b.arrival_time()).unwrap());

    let mut state = Inventory::from_instance(instance);
    for action in &stream {
        let station = action.station();
        if station == 0 {
            continue;
        }
        match action {
            Action::Repairman(stop) => {
                state.usable[station] += stop.repaired;
                state.broken[station] -= stop.repaired;
            }
            Action::Truck(stop) => {
                state.usable[station] -= stop.load_usable;
                state.broken[station] -= stop.load_broken;
                state.usable[station] += stop.unload_usable;
                state.broken[station] += stop.unload_broken;
            }
        }
        let capacity = instance.stations[station].capacity;
        let usable = state.usable[station];
        let broken = state.broken[station];
        if usable < 0 || broken < 0 || usable + broken > capacity {
            eval.is_feasible = false;
            eval.capacity_excess -= f64::from(
                usable.min(0) + broken.min(0) + (capacity - usable - broken).min(0),
            );
        }
    }

    if eval.is_feasible {
        for station in 1..=instance.nb_clients {
            let usable = state.usable[station];
            let broken = state.broken[station];
            if usable >= 0
                && broken >= 0
                && usable + broken <= instance.stations[station].capacity
            {
                let dissat = instance.dissat(station, usable, broken);
                eval.dissat += dissat;
                eval.dissatisfaction.push(dissat);
            }
        }
    }

    eval.compute_objective(penalty_capacity);
    eval
}
