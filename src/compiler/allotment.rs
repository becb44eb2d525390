//! Distribution of the route's slack time over its stations, and removal of
//! low-priority stations from routes whose travel alone exhausts the budget.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::instance::{Instance, Inventory};
use crate::schedule::{Route, RPM_TRAVEL_FACTOR};

/// Per-station work summary used while sizing the time allotments.
struct StationTask {
    station: usize,
    priority: f64,
    required_time: f64,
    max_op_time: f64,
    insufficient_time: f64,
}

/// Compute the per-station operating-time allotment for a route.
///
/// The route's slack (time budget minus travel) is distributed over its
/// distinct stations proportionally to their priority. A station whose share
/// exceeds the time its outstanding work actually needs donates the excess
/// into a pool, which is then handed to under-allotted stations in
/// descending-priority order. When the slack does not even cover one
/// operating unit, the lowest-priority stations are removed from the route
/// first (see [`trim_route`]); removed stations still take part in the
/// proportional split.
///
/// Returns the allotment indexed by station id. The route may be shortened.
pub fn allot_operating_time(
    config: &Config,
    instance: &Instance,
    inventory: &Inventory,
    route: &mut Route,
    is_rpm: bool,
) -> Vec<f64> {
    let single_op_time = if is_rpm {
        config.repair_time
    } else {
        2.0 * config.loading_time
    };

    let mut priority_vec = vec![0.0; instance.nb_clients + 1];
    for i in 1..route.len() {
        let s = route[i];
        if s != 0 {
            priority_vec[s] = if is_rpm {
                instance.priority_rpm(s, inventory.usable[s], inventory.broken[s])
            } else {
                instance.priority(s, inventory.usable[s], inventory.broken[s])
            };
        }
    }

    let distinct: BTreeSet<usize> = route.iter().copied().collect();
    let mut tasks: Vec<StationTask> = Vec::with_capacity(distinct.len());
    for &node in &distinct {
        if node == 0 {
            continue;
        }
        let required_time = if is_rpm {
            f64::from(inventory.broken[node]) * config.repair_time
        } else {
            let load_u = (inventory.usable[node] - instance.stations[node].target_usable).max(0);
            let unload_u = (instance.stations[node].target_usable - inventory.usable[node]).max(0);
            let load_b = inventory.broken[node];
            2.0 * f64::from(load_u + load_b + unload_u) * config.loading_time
        };
        tasks.push(StationTask {
            station: node,
            priority: priority_vec[node],
            required_time,
            max_op_time: 0.0,
            insufficient_time: 0.0,
        });
    }

    let operating_time = trim_route(config, instance, route, &priority_vec, is_rpm);

    let priority_sum: f64 = tasks.iter().map(|t| t.priority).sum();
    let mut extra_time = 0.0;
    for task in tasks.iter_mut() {
        task.max_op_time = if priority_sum > 0.0 {
            operating_time * task.priority / priority_sum
        } else {
            0.0
        };
        if task.max_op_time < task.required_time {
            task.insufficient_time = task.required_time - task.max_op_time;
        } else {
            extra_time += task.max_op_time - task.required_time;
            task.max_op_time = task.required_time;
        }
    }

    tasks.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());
    for task in tasks.iter_mut() {
        if extra_time <= single_op_time {
            break;
        }
        if task.insufficient_time > 0.0 {
            let granted = task.insufficient_time.min(extra_time);
            task.max_op_time += granted;
            extra_time -= granted;
        }
    }

    let mut max_op_time = vec![0.0; instance.nb_clients + 1];
    for task in &tasks {
        max_op_time[task.station] = task.max_op_time;
    }
    max_op_time
}

/// Subtract the route's travel time from the time budget and, while the
/// remainder cannot fit a single operating unit, remove the lowest-priority
/// station (its last occurrence) from the route. Returns the remaining
/// operating time.
pub fn trim_route(
    config: &Config,
    instance: &Instance,
    route: &mut Route,
    priority_vec: &[f64],
    is_rpm: bool,
) -> f64 {
    let boundary = if is_rpm {
        config.repair_time
    } else {
        2.0 * config.loading_time
    };
    let factor = if is_rpm { RPM_TRAVEL_FACTOR } else { 1.0 };

    let mut operating_time = config.time_budget;
    for i in 1..route.len() {
        operating_time -= instance.distance(route[i - 1], route[i]) * factor;
    }
    if operating_time >= boundary {
        return operating_time;
    }

    let mut by_priority: Vec<(usize, f64)> = Vec::new();
    for i in 1..route.len() {
        if route[i] != 0 {
            by_priority.push((route[i], priority_vec[route[i]]));
        }
    }
    by_priority.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    for (station, _) in by_priority {
        if operating_time >= boundary {
            break;
        }
        if let Some(index) = route.iter().rposition(|&s| s == station) {
            // splice the travel legs around the removed stop
            if index > 0 {
                operating_time += instance.distance(route[index - 1], route[index]) * factor;
            }
            if index < route.len() - 1 {
                operating_time += instance.distance(route[index], route[index + 1]) * factor;
            }
            if index > 0 && index < route.len() - 1 {
                operating_time -= instance.distance(route[index - 1], route[index + 1]) * factor;
            }
            route.remove(index);
        }
    }
    operating_time
}
