//! Post-compilation amendment: spend whatever is left of the time budget on
//! extra repairs and top-up transfers at under-served stations.

use std::collections::HashSet;

use crate::compiler::{max_load_by_time, max_repair_by_time};
use crate::config::Config;
use crate::instance::{Instance, Inventory};
use crate::schedule::{RepairStop, TruckStop, RPM_TRAVEL_FACTOR};

/// Repair quantity in `0..=max_repair` that minimizes the station's
/// dissatisfaction at its current inventory state.
fn best_response_repair(
    instance: &Instance,
    inventory: &Inventory,
    station: usize,
    max_repair: i32,
) -> i32 {
    let usable = inventory.usable[station];
    let broken = inventory.broken[station];
    let mut min_dissat = instance.dissat(station, usable, broken);
    let mut actual = 0;
    for q in 0..=max_repair {
        let dissat = instance.dissat(station, usable + q, broken - q);
        if dissat < min_dissat {
            min_dissat = dissat;
            actual = q;
        }
    }
    actual
}

/// Use the repairman's residual time for extra repairs: first grant
/// best-response quantities to visited stations ranked by the marginal
/// dissatisfaction reduction of one repair, then insert unvisited stations
/// with broken stock at their cheapest route position while the remaining
/// slack still allows at least one repair.
pub fn amend_repairman_schedule(
    config: &Config,
    instance: &Instance,
    scheme: &mut Vec<RepairStop>,
    inventory: &mut Inventory,
    visited: &HashSet<usize>,
) {
    let mut total_time = 0.0;
    let mut ranked: Vec<(usize, f64)> = Vec::new();
    for i in 1..scheme.len() {
        let station = scheme[i].station;
        total_time += instance.distance(scheme[i - 1].station, station) * RPM_TRAVEL_FACTOR;
        total_time += f64::from(scheme[i].repaired) * config.repair_time;
        if station != 0 && inventory.broken[station] > 0 {
            let usable = inventory.usable[station];
            let broken = inventory.broken[station];
            let gain = instance.dissat(station, usable, broken)
                - instance.dissat(station, usable + 1, broken - 1);
            if gain > 0.0 {
                ranked.push((station, gain));
            }
        }
    }
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let mut extra_time = config.time_budget - total_time;
    while extra_time > 0.0 && !ranked.is_empty() {
        let (station, _) = ranked.remove(0);
        if let Some(pos) = scheme[1..]
            .iter()
            .position(|stop| stop.station == station)
            .map(|p| p + 1)
        {
            let max_repair = inventory.broken[station]
                .min(max_repair_by_time(config, extra_time));
            let actual = best_response_repair(instance, inventory, station, max_repair);
            scheme[pos].repaired += actual;
            inventory.usable[station] += actual;
            inventory.broken[station] -= actual;
            extra_time -= f64::from(actual) * config.repair_time;
        }
    }

    // Stations with broken stock that no repairman visits are candidates
    // for insertion at the position adding the least travel time.
    let mut insertable: Vec<(usize, f64)> = Vec::new();
    for station in 1..=instance.nb_clients {
        if inventory.broken[station] > 0 && !visited.contains(&station) {
            let usable = inventory.usable[station];
            let broken = inventory.broken[station];
            let gain = instance.dissat(station, usable, broken)
                - instance.dissat(station, usable + 1, broken - 1);
            if gain > 0.0 {
                insertable.push((station, gain));
            }
        }
    }
    insertable.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    while extra_time > config.repair_time && !insertable.is_empty() {
        let (chosen, _) = insertable.remove(0);
        let mut min_insertion_time = (instance.distance(scheme[0].station, chosen)
            + instance.distance(chosen, scheme[1].station)
            - instance.distance(scheme[0].station, scheme[1].station))
            * RPM_TRAVEL_FACTOR;
        let mut insert_idx = 1;
        for i in 1..scheme.len() {
            let insertion_time = (instance.distance(scheme[i - 1].station, chosen)
                + instance.distance(chosen, scheme[i].station)
                - instance.distance(scheme[i - 1].station, scheme[i].station))
                * RPM_TRAVEL_FACTOR;
            if insertion_time < min_insertion_time {
                min_insertion_time = insertion_time;
                insert_idx = i;
            }
        }
        if extra_time - min_insertion_time > config.repair_time {
            scheme.insert(insert_idx, RepairStop::at(chosen));
            extra_time -= min_insertion_time;
            let max_repair = inventory.broken[chosen]
                .min(max_repair_by_time(config, extra_time));
            let actual = best_response_repair(instance, inventory, chosen, max_repair);
            scheme[insert_idx].repaired += actual;
            inventory.usable[chosen] += actual;
            inventory.broken[chosen] -= actual;
            extra_time -= f64::from(actual) * config.repair_time;
        }
    }
}

/// Use the truck's residual time to move more bikes: for each visited
/// station still holding an imbalance, ranked by priority, top up the
/// loading at its stop and unload at a downstream depot, bounded by the
/// smallest residual truck capacity on the way.
pub fn amend_truck_schedule(
    config: &Config,
    instance: &Instance,
    scheme: &mut [TruckStop],
    inventory: &mut Inventory,
) {
    let cap = config.vehicle_capacity;
    let mut total_time = config.loading_time * f64::from(scheme[0].movements());
    let mut ranked: Vec<(usize, usize, f64)> = Vec::new();
    for i in 1..scheme.len() {
        let station = scheme[i].station;
        total_time += instance.distance(scheme[i - 1].station, station);
        total_time += config.loading_time * f64::from(scheme[i].movements());
        if station != 0
            && (inventory.usable[station] != instance.stations[station].target_usable
                || inventory.broken[station] > 0)
        {
            let priority = instance.priority(
                station,
                inventory.usable[station],
                inventory.broken[station],
            );
            ranked.push((station, i, priority));
        }
    }
    ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());

    let mut extra_time = config.time_budget - total_time;
    while extra_time >= 2.0 * config.loading_time && !ranked.is_empty() {
        let (station, idx, _) = ranked.remove(0);
        let target = instance.stations[station].target_usable;
        let provider = (inventory.usable[station] - target).max(0);
        if provider > 0 {
            let mut next_depot = idx;
            let mut min_residual =
                cap - scheme[idx].onboard_usable - scheme[idx].onboard_broken;
            for i in idx..scheme.len() {
                let stop_station = scheme[i].station;
                let mut deviation = (instance.stations[stop_station].target_usable
                    - inventory.usable[stop_station])
                    .max(0);
                if stop_station == 0 || deviation > 0 {
                    next_depot = i;
                    if stop_station == 0 {
                        deviation = 9999;
                    }
                }
                min_residual =
                    min_residual.min(cap - scheme[i].onboard_usable - scheme[i].onboard_broken);
                let added = deviation
                    .min(min_residual)
                    .min(inventory.usable[station] - target)
                    .min(max_load_by_time(config, extra_time));
                min_residual -= added;
                scheme[idx].load_usable += added;
                inventory.usable[station] -= added;
                scheme[next_depot].unload_usable += added;
                for stop in scheme[idx..next_depot].iter_mut() {
                    stop.onboard_usable += added;
                }
                extra_time -= 2.0 * f64::from(added) * config.loading_time;
            }
        }

        if extra_time >= 2.0 * config.loading_time && inventory.broken[station] > 0 {
            let mut next_depot = idx;
            for i in idx..scheme.len() {
                if scheme[i].station == 0 {
                    next_depot = i;
                    break;
                }
            }
            let mut min_residual =
                cap - scheme[idx].onboard_usable - scheme[idx].onboard_broken;
            for i in idx..next_depot {
                min_residual =
                    min_residual.min(cap - scheme[i].onboard_usable - scheme[i].onboard_broken);
            }
            let added = min_residual
                .min(inventory.broken[station])
                .min(max_load_by_time(config, extra_time));
            scheme[idx].load_broken += added;
            inventory.broken[station] -= added;
            scheme[next_depot].unload_broken += added;
            for stop in scheme[idx..next_depot].iter_mut() {
                stop.onboard_broken += added;
            }
            extra_time -= 2.0 * f64::from(added) * config.loading_time;
        }
    }
}
