//! A candidate solution: one route per truck and per repairman, plus the
//! schedules and evaluation derived from them.

use std::collections::HashSet;

use rand::Rng;

use crate::compiler::{
    amend_repairman_schedule, amend_truck_schedule, compile_repairman_route,
    compile_truck_route, max_repair_by_time,
};
use crate::config::Config;
use crate::evaluator::{evaluate, Eval};
use crate::instance::{Instance, Inventory};
use crate::schedule::{RepairStop, Route, TruckStop, RPM_TRAVEL_FACTOR};
use crate::utils::combine_consecutive_duplicates;

/// An individual of the genetic population. The chromosomes are the only
/// identity-bearing state; schedules and evaluation are derived and rebuilt
/// whenever the chromosomes change.
#[derive(Debug, Clone)]
pub struct Individual {
    /// One route per truck
    pub chrom_trk: Vec<Route>,
    /// One route per repairman
    pub chrom_rpm: Vec<Route>,
    /// Compiled stop sequence per truck, 1:1 with the route positions
    pub truck_schedules: Vec<Vec<TruckStop>>,
    /// Compiled stop sequence per repairman, 1:1 with the route positions
    pub rpm_schedules: Vec<Vec<RepairStop>>,
    pub eval: Eval,
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.chrom_rpm == other.chrom_rpm && self.chrom_trk == other.chrom_trk
    }
}

impl Eq for Individual {}

impl Individual {
    /// Build a fresh individual with randomly constructed greedy routes.
    pub fn random<R: Rng>(
        instance: &Instance,
        config: &Config,
        penalty_capacity: f64,
        rng: &mut R,
    ) -> Self {
        let mut inventory = Inventory::from_instance(instance);
        let chrom_rpm = random_repairman_routes(config, instance, &mut inventory, rng);
        let chrom_trk = random_truck_routes(config, instance, &mut inventory, rng);
        let mut indiv = Individual {
            chrom_trk,
            chrom_rpm,
            truck_schedules: Vec::new(),
            rpm_schedules: Vec::new(),
            eval: Eval::default(),
        };
        indiv.rebuild(instance, config, penalty_capacity);
        indiv
    }

    /// Build an individual from given chromosomes (e.g. crossover output).
    pub fn from_chromosomes(
        instance: &Instance,
        config: &Config,
        penalty_capacity: f64,
        chrom_rpm: Vec<Route>,
        chrom_trk: Vec<Route>,
    ) -> Self {
        let mut indiv = Individual {
            chrom_trk,
            chrom_rpm,
            truck_schedules: Vec::new(),
            rpm_schedules: Vec::new(),
            eval: Eval::default(),
        };
        // repairman routes never keep interior depot stops
        for route in indiv.chrom_rpm.iter_mut() {
            if route.len() > 2 {
                let last = route.len() - 1;
                let mut cleaned = vec![route[0]];
                cleaned.extend(route[1..last].iter().copied().filter(|&s| s != 0));
                cleaned.push(route[last]);
                *route = cleaned;
            }
        }
        indiv.rebuild(instance, config, penalty_capacity);
        indiv
    }

    /// Recompute schedules and evaluation from the current chromosomes:
    /// collapse duplicate stops, compile repairmen then trucks against one
    /// shared inventory, amend both schedules, and evaluate.
    pub fn rebuild(&mut self, instance: &Instance, config: &Config, penalty_capacity: f64) {
        combine_consecutive_duplicates(&mut self.chrom_rpm, true);
        combine_consecutive_duplicates(&mut self.chrom_trk, false);

        let mut inventory = Inventory::from_instance(instance);
        self.compile_repairmen(instance, config, &mut inventory);
        self.compile_trucks(instance, config, &mut inventory);

        let visited: HashSet<usize> = self
            .rpm_schedules
            .iter()
            .flat_map(|scheme| scheme.iter().map(|stop| stop.station))
            .collect();

        for scheme in self.truck_schedules.iter_mut() {
            amend_truck_schedule(config, instance, scheme, &mut inventory);
        }
        for scheme in self.rpm_schedules.iter_mut() {
            amend_repairman_schedule(config, instance, scheme, &mut inventory, &visited);
        }

        for route in self.chrom_rpm.iter_mut().chain(self.chrom_trk.iter_mut()) {
            if route.first() != Some(&0) {
                route.insert(0, 0);
            }
            if route.last() != Some(&0) {
                route.push(0);
            }
        }

        self.eval = evaluate(
            config,
            instance,
            &mut self.truck_schedules,
            &mut self.rpm_schedules,
            penalty_capacity,
        );
    }

    /// Compile every repairman route. A route whose schedule contains a
    /// zero-repair interior stop is rebuilt without the idle stops and
    /// recompiled once from the pre-fleet inventory snapshot.
    fn compile_repairmen(
        &mut self,
        instance: &Instance,
        config: &Config,
        inventory: &mut Inventory,
    ) {
        self.rpm_schedules.clear();
        let snapshot = inventory.clone();
        for route in self.chrom_rpm.iter_mut() {
            let mut scheme = compile_repairman_route(config, instance, route, inventory);
            let mut contains_idle = false;
            let mut rebuilt: Route = vec![0];
            if scheme.len() > 2 {
                for stop in &scheme[1..scheme.len() - 1] {
                    if stop.repaired == 0 {
                        contains_idle = true;
                    } else {
                        rebuilt.push(stop.station);
                    }
                }
            }
            rebuilt.push(0);
            *route = rebuilt;
            if contains_idle {
                *inventory = snapshot.clone();
                scheme = compile_repairman_route(config, instance, route, inventory);
            }
            self.rpm_schedules.push(scheme);
        }
    }

    /// Compile every truck route, pruning stops at which the truck neither
    /// loads nor unloads and recompiling once from the pre-fleet snapshot.
    fn compile_trucks(
        &mut self,
        instance: &Instance,
        config: &Config,
        inventory: &mut Inventory,
    ) {
        self.truck_schedules.clear();
        let snapshot = inventory.clone();
        for route in self.chrom_trk.iter_mut() {
            let mut scheme = compile_truck_route(config, instance, route, inventory);
            let has_idle = scheme.len() > 2
                && scheme[1..scheme.len() - 1].iter().any(|stop| stop.is_idle());
            if has_idle {
                let mut pruned: Route = vec![0];
                for stop in &scheme[1..scheme.len() - 1] {
                    if !stop.is_idle() {
                        pruned.push(stop.station);
                    }
                }
                pruned.push(0);
                *route = pruned;
                *inventory = snapshot.clone();
                scheme = compile_truck_route(config, instance, route, inventory);
            }
            self.truck_schedules.push(scheme);
        }
    }
}

/// Randomly grow one route per repairman: repeatedly pick an unvisited
/// station that still leaves room for at least one repair after travelling
/// there and back to the depot, and repair as much as time allows.
fn random_repairman_routes<R: Rng>(
    config: &Config,
    instance: &Instance,
    inventory: &mut Inventory,
    rng: &mut R,
) -> Vec<Route> {
    let mut unvisited: Vec<usize> = (1..=config.nb_clients).collect();
    let mut routes = Vec::with_capacity(config.nb_repairmen);
    for _ in 0..config.nb_repairmen {
        let mut route: Route = vec![0];
        let mut cur = 0;
        let mut remaining = config.time_budget;
        while remaining > 0.0 && !unvisited.is_empty() {
            let mut candidates = unvisited.clone();
            let mut next = candidates[rng.gen_range(0..candidates.len())];
            let mut to_next = instance.distance(cur, next) * RPM_TRAVEL_FACTOR;
            let mut to_depot = instance.distance(next, 0) * RPM_TRAVEL_FACTOR;
            let mut repair_slack = remaining - to_next - to_depot;
            while repair_slack < config.repair_time && !candidates.is_empty() {
                let idx = rng.gen_range(0..candidates.len());
                next = candidates.swap_remove(idx);
                to_next = instance.distance(cur, next) * RPM_TRAVEL_FACTOR;
                to_depot = instance.distance(next, 0) * RPM_TRAVEL_FACTOR;
                repair_slack = remaining - to_next - to_depot;
            }
            if !candidates.is_empty() {
                remaining -= to_next + to_depot;
                let repaired = instance.stations[next]
                    .broken_bike
                    .min(max_repair_by_time(config, remaining));
                remaining -=
                    instance.distance(cur, next) + config.repair_time * f64::from(repaired);
                inventory.broken[next] -= repaired;
                inventory.usable[next] += repaired;
                cur = next;
                route.push(next);
                unvisited.retain(|&s| s != next);
                remaining += to_depot;
            } else {
                route.push(0);
                break;
            }
        }
        routes.push(route);
    }
    routes
}

/// A station the truck could serve next, with the quantities it would move.
struct TruckCandidate {
    station: usize,
    delivery_usable: i32,
    collection_usable: i32,
    collection_broken: i32,
}

/// Randomly grow one route per truck: probe every station for a worthwhile
/// delivery or collection reachable within the remaining time, pick one at
/// random, and return to the depot to unload when nothing is reachable.
fn random_truck_routes<R: Rng>(
    config: &Config,
    instance: &Instance,
    inventory: &mut Inventory,
    rng: &mut R,
) -> Vec<Route> {
    let mut routes = Vec::with_capacity(config.nb_vehicles);
    for _ in 0..config.nb_vehicles {
        let mut route: Route = Vec::new();
        let mut onboard_usable = 0;
        let mut onboard_broken = 0;
        let mut cur = 0;
        let mut remaining = config.time_budget;
        while remaining > 0.0 {
            let mut reachable: Vec<TruckCandidate> = Vec::new();
            for station in 1..=config.nb_clients {
                if station == cur {
                    continue;
                }
                let mut probe_time = remaining
                    - instance.distance(cur, station)
                    - instance.distance(station, 0);
                if probe_time <= 0.0 {
                    continue;
                }
                let mut probe_usable = onboard_usable;
                let probe_broken = onboard_broken;
                let info = &instance.stations[station];
                if inventory.usable[station] <= info.target_usable {
                    let delivery = (info.target_usable - inventory.usable[station])
                        .min(probe_usable);
                    probe_time -= f64::from(delivery) * config.loading_time;
                    probe_usable -= delivery;
                    let mut collection_broken = 0;
                    if probe_time >= 2.0 * config.loading_time {
                        collection_broken = inventory.broken[station]
                            .min(config.vehicle_capacity - probe_usable - probe_broken)
                            .min((probe_time / config.loading_time / 2.0).floor() as i32);
                    }
                    if delivery + collection_broken > 0 {
                        reachable.push(TruckCandidate {
                            station,
                            delivery_usable: delivery,
                            collection_usable: 0,
                            collection_broken,
                        });
                    }
                } else {
                    let collection_usable = (inventory.usable[station] - info.target_usable)
                        .min(config.vehicle_capacity - probe_usable - probe_broken)
                        .min((probe_time / config.loading_time / 2.0).floor() as i32);
                    probe_time -= 2.0 * f64::from(collection_usable) * config.loading_time;
                    probe_usable += collection_usable;
                    let mut collection_broken = 0;
                    if probe_time >= 2.0 * config.loading_time {
                        collection_broken = inventory.broken[station]
                            .min(config.vehicle_capacity - probe_usable - probe_broken)
                            .min((probe_time / config.loading_time / 2.0).floor() as i32);
                    }
                    if collection_usable + collection_broken > 0 {
                        reachable.push(TruckCandidate {
                            station,
                            delivery_usable: 0,
                            collection_usable,
                            collection_broken,
                        });
                    }
                }
            }

            if reachable.is_empty() {
                if cur != 0 {
                    remaining -= instance.distance(cur, 0);
                    onboard_usable = 0;
                    onboard_broken = 0;
                    route.push(0);
                    cur = 0;
                } else {
                    break;
                }
            } else {
                let idx = if reachable.len() > 2 {
                    rng.gen_range(0..reachable.len())
                } else {
                    0
                };
                let chosen = &reachable[idx];
                route.push(chosen.station);
                remaining -= instance.distance(cur, chosen.station)
                    + config.loading_time
                        * f64::from(chosen.collection_usable + chosen.collection_broken);
                inventory.usable[chosen.station] +=
                    chosen.delivery_usable - chosen.collection_usable;
                inventory.broken[chosen.station] -= chosen.collection_broken;
                onboard_broken += chosen.collection_broken;
                onboard_usable += chosen.collection_usable - chosen.delivery_usable;
                cur = chosen.station;
            }
        }
        if route.is_empty() {
            route = vec![0, 0];
        } else {
            if route[0] != 0 {
                route.insert(0, 0);
            }
            if route[route.len() - 1] != 0 {
                route.push(0);
            }
        }
        routes.push(route);
    }
    routes
}
