//! Greedy assignment of loading and unloading quantities along a truck
//! route, including backward demand correction at earlier surplus stations.

use crate::compiler::allotment::allot_operating_time;
use crate::compiler::max_load_by_time;
use crate::compiler::unsat::{credit_extra, UnsatLedger};
use crate::config::Config;
use crate::instance::{Instance, Inventory};
use crate::schedule::{Route, TruckStop};

/// Compile a truck route into a schedule of per-stop quantities.
///
/// Distributes the route slack (possibly trimming the route), runs one
/// greedy assignment pass, then checks whether time booked for unloading
/// can be re-granted to stations with outstanding unserved demand; if so,
/// the pass is re-run exactly once from the pristine inventory snapshot
/// with the adjusted allotments.
pub fn compile_truck_route(
    config: &Config,
    instance: &Instance,
    route: &mut Route,
    inventory: &mut Inventory,
) -> Vec<TruckStop> {
    let max_op_time = allot_operating_time(config, instance, inventory, route, false);
    let inventory_snapshot = inventory.clone();
    let allotment_snapshot = max_op_time.clone();

    let (scheme, unload_extra_time, mut outstanding) = {
        let mut pass = TruckPass::new(config, instance, inventory, max_op_time);
        pass.run(route);
        let mut outstanding = pass.unsat_load_usable.clone();
        for record in &pass.unsat_unload_usable.records {
            outstanding.accumulate(
                record.station,
                record.schedule_index,
                record.surplus,
                record.priority,
            );
        }
        for record in &pass.unsat_load_broken.records {
            outstanding.accumulate(
                record.station,
                record.schedule_index,
                record.surplus,
                record.priority,
            );
        }
        (pass.scheme, pass.unload_extra_time, outstanding)
    };

    // Re-derive the shared pool from the pristine allotment: time consumed
    // by unloading is deducted from each station's share and made available
    // to stations that recorded unserved demand.
    let mut max_op_time = allotment_snapshot;
    let mut extra_time = 0.0;
    for &(station, booked) in &unload_extra_time {
        let freed = booked.min(max_op_time[station]);
        extra_time += freed;
        max_op_time[station] -= freed;
    }

    if extra_time <= 0.0 {
        return scheme;
    }

    outstanding.sort_priority_desc();
    for record in &outstanding.records {
        if extra_time <= 0.0 {
            break;
        }
        let granted = (f64::from(record.surplus) * 2.0 * config.loading_time).min(extra_time);
        max_op_time[record.station] += granted;
        extra_time -= granted;
    }

    *inventory = inventory_snapshot;
    let mut retry = TruckPass::new(config, instance, inventory, max_op_time);
    retry.run(route);
    retry.scheme
}

/// State of one greedy assignment pass over a truck route.
struct TruckPass<'a> {
    config: &'a Config,
    instance: &'a Instance,
    inventory: &'a mut Inventory,
    max_op_time: Vec<f64>,
    scheme: Vec<TruckStop>,
    prev_depot: usize,
    onboard_usable: i32,
    onboard_broken: i32,
    unsat_load_usable: UnsatLedger,
    unsat_load_broken: UnsatLedger,
    unsat_unload_usable: UnsatLedger,
    unload_extra_time: Vec<(usize, f64)>,
}

impl<'a> TruckPass<'a> {
    fn new(
        config: &'a Config,
        instance: &'a Instance,
        inventory: &'a mut Inventory,
        max_op_time: Vec<f64>,
    ) -> Self {
        TruckPass {
            config,
            instance,
            inventory,
            max_op_time,
            scheme: Vec::new(),
            prev_depot: 0,
            onboard_usable: 0,
            onboard_broken: 0,
            unsat_load_usable: UnsatLedger::new(),
            unsat_load_broken: UnsatLedger::new(),
            unsat_unload_usable: UnsatLedger::new(),
            unload_extra_time: Vec::new(),
        }
    }

    /// Walk the route in order, deciding each stop's quantities. A depot
    /// stop fully unloads the truck and resets the onboard counters.
    fn run(&mut self, route: &Route) {
        for (i, &station) in route.iter().enumerate() {
            let mut stop = TruckStop::at(station);
            if station != 0 {
                if self.inventory.usable[station] <= self.instance.stations[station].target_usable
                {
                    let (unload_usable, load_broken) = self.assign_unloading(station);
                    stop.unload_usable = unload_usable;
                    stop.load_broken = load_broken;
                } else {
                    let (load_usable, load_broken) = self.assign_loading(station, i);
                    stop.load_usable = load_usable;
                    stop.load_broken = load_broken;
                }
            } else {
                stop.unload_usable = self.onboard_usable;
                stop.unload_broken = self.onboard_broken;
                self.prev_depot = i;
                self.onboard_usable = 0;
                self.onboard_broken = 0;
            }
            stop.onboard_usable = self.onboard_usable;
            stop.onboard_broken = self.onboard_broken;
            self.scheme.push(stop);
        }
    }

    /// Truck visit priority of a station at its current inventory state.
    fn priority(&self, station: usize) -> f64 {
        self.instance.priority(
            station,
            self.inventory.usable[station],
            self.inventory.broken[station],
        )
    }

    /// Smallest residual carrying capacity over the already-scheduled stops
    /// from `from` onwards.
    fn min_residual_from(&self, from: usize) -> i32 {
        let cap = self.config.vehicle_capacity;
        self.scheme[from..]
            .iter()
            .map(|s| cap - s.onboard_usable - s.onboard_broken)
            .min()
            .unwrap_or(cap)
    }

    /// Decide quantities for a deficit stop: make room by collecting broken
    /// bikes when the station is short on space, deliver usable bikes, then
    /// collect broken bikes with whatever time is left.
    fn assign_unloading(&mut self, station: usize) -> (i32, i32) {
        let info = &self.instance.stations[station];
        let mut broken_load = 0;
        let mut station_residual =
            info.capacity - self.inventory.usable[station] - self.inventory.broken[station];
        if station_residual < info.target_usable - self.inventory.usable[station] {
            let idx = self.scheme.len();
            broken_load = self.load_broken(station, idx);
            station_residual =
                info.capacity - self.inventory.usable[station] - self.inventory.broken[station];
        }
        let usable_unload = self.unload_usable(station, station_residual);

        if self.max_op_time[station] >= 2.0 * self.config.loading_time {
            self.supp_load_broken(station, &mut broken_load);
        }
        (usable_unload, broken_load)
    }

    /// Decide quantities for a surplus stop: collect broken bikes first,
    /// then surplus usable bikes.
    fn assign_loading(&mut self, station: usize, scheme_idx: usize) -> (i32, i32) {
        let broken_load = self.load_broken(station, scheme_idx);
        let usable_load = self.load_usable(station, scheme_idx);
        (usable_load, broken_load)
    }

    /// Collect broken bikes, bounded by stock, residual truck capacity and
    /// the station's time allotment.
    fn load_broken(&mut self, station: usize, idx: usize) -> i32 {
        let mut broken_load = 0;
        if self.max_op_time[station] >= 2.0 * self.config.loading_time {
            let vehicle_residual =
                self.config.vehicle_capacity - self.onboard_usable - self.onboard_broken;
            let no_time = self.inventory.broken[station].min(vehicle_residual);
            let by_time = max_load_by_time(self.config, self.max_op_time[station]);
            broken_load = no_time.min(by_time);
            self.inventory.broken[station] -= broken_load;
            self.onboard_broken += broken_load;
            self.max_op_time[station] -=
                2.0 * f64::from(broken_load) * self.config.loading_time;
            let priority = self.priority(station);
            self.unsat_load_broken
                .overwrite(station, idx, no_time - broken_load, priority);
        }
        broken_load
    }

    /// A second broken-bike collection after unloading, when the stop still
    /// has time left.
    fn supp_load_broken(&mut self, station: usize, broken_load: &mut i32) {
        let vehicle_residual =
            self.config.vehicle_capacity - self.onboard_usable - self.onboard_broken;
        let no_time = self.inventory.broken[station].min(vehicle_residual);
        let by_time = max_load_by_time(self.config, self.max_op_time[station]);
        let added = no_time.min(by_time);
        self.max_op_time[station] -= 2.0 * f64::from(added) * self.config.loading_time;
        *broken_load += added;
        self.onboard_broken += added;
        self.inventory.broken[station] -= added;
        let priority = self.priority(station);
        self.unsat_load_broken.overwrite(
            station,
            self.scheme.len(),
            (no_time - by_time).max(0),
            priority,
        );
    }

    /// Collect surplus usable bikes, bounded by the surplus, residual truck
    /// capacity and the station's time allotment. Shortfalls caused by the
    /// time cap are recorded for later backfilling.
    fn load_usable(&mut self, station: usize, scheme_idx: usize) -> i32 {
        let no_time = (self.inventory.usable[station]
            - self.instance.stations[station].target_usable)
            .min(self.config.vehicle_capacity - self.onboard_usable - self.onboard_broken);
        let by_time = max_load_by_time(self.config, self.max_op_time[station]);
        let usable_load = no_time.min(by_time);

        self.max_op_time[station] -= 2.0 * f64::from(usable_load) * self.config.loading_time;
        self.inventory.usable[station] -= usable_load;
        self.onboard_usable += usable_load;
        let priority = self.priority(station);
        self.unsat_load_usable.overwrite(
            station,
            scheme_idx,
            (no_time - by_time).max(0),
            priority,
        );
        usable_load
    }

    /// Deliver usable bikes to a deficit stop. When the onboard stock runs
    /// out before the demand is met, retroactively increase the loading at
    /// previously recorded surplus stations that still have downstream truck
    /// capacity, and failing that at the previous depot.
    fn unload_usable(&mut self, station: usize, station_residual: i32) -> i32 {
        let supply_demand = (self.instance.stations[station].target_usable
            - self.inventory.usable[station])
            .min(station_residual);
        let mut usable_unload = supply_demand.min(self.onboard_usable);

        self.inventory.usable[station] += usable_unload;
        credit_extra(
            &mut self.unload_extra_time,
            station,
            2.0 * f64::from(usable_unload) * self.config.loading_time,
        );

        if usable_unload == self.onboard_usable
            && usable_unload != supply_demand
            && self.max_op_time[station] >= 2.0 * self.config.loading_time
        {
            // The truck ran dry. Revisit earlier loading stops whose surplus
            // was cut short by their time allotment, most promising first.
            self.unsat_load_usable.sort_priority_desc();
            while usable_unload != supply_demand
                && !self.unsat_load_usable.is_empty()
                && self.max_op_time[station] >= 2.0 * self.config.loading_time
            {
                let record = self.unsat_load_usable.records[0].clone();
                let min_residual = self.min_residual_from(record.schedule_index);
                if min_residual == 0 {
                    break;
                }
                let added_no_time = (supply_demand - usable_unload)
                    .min(min_residual)
                    .min(record.surplus);
                let added_by_time = max_load_by_time(self.config, self.max_op_time[station]);
                let added = added_no_time.min(added_by_time);

                self.scheme[record.schedule_index].load_usable += added;
                self.inventory.usable[record.station] -= added;
                let priority = self.priority(station);
                self.unsat_unload_usable.overwrite(
                    station,
                    self.scheme.len(),
                    added_no_time - added,
                    priority,
                );
                for stop in self.scheme[record.schedule_index..].iter_mut() {
                    stop.onboard_usable += added;
                }
                self.inventory.usable[station] += added;
                usable_unload += added;

                let remaining_surplus = record.surplus - added;
                if remaining_surplus == 0 {
                    self.unsat_load_usable.records.remove(0);
                } else {
                    self.unsat_load_usable.records[0].surplus = remaining_surplus;
                }
                self.max_op_time[station] -= 2.0 * f64::from(added) * self.config.loading_time;
            }

            if usable_unload != supply_demand {
                let priority = self.priority(station);
                let extra = self.adjust_depot_loading(supply_demand - usable_unload, station, priority);
                usable_unload += extra;
                self.inventory.usable[station] += extra;
            }
        }

        self.onboard_usable = self
            .scheme
            .last()
            .map(|s| s.onboard_usable)
            .unwrap_or(0)
            - usable_unload;
        usable_unload
    }

    /// Increase the loading at the most recent depot stop to cover demand
    /// the interior stations could not absorb, bounded by the downstream
    /// residual truck capacity and the current stop's time allotment.
    fn adjust_depot_loading(
        &mut self,
        demand_deviation: i32,
        station: usize,
        station_priority: f64,
    ) -> i32 {
        let cap = self.config.vehicle_capacity;
        let depot = self.prev_depot;
        let min_residual = self.min_residual_from(depot);

        // Net usable flow already decided at the depot stop: positive for
        // loading, negative for unloading (only one of the two is set).
        let depot_stop = &self.scheme[depot];
        let fd = if depot_stop.load_usable > 0 && depot_stop.unload_usable == 0 {
            depot_stop.load_usable
        } else if depot_stop.load_usable == 0 && depot_stop.unload_usable > 0 {
            -depot_stop.unload_usable
        } else {
            0
        };

        let extra_no_time = demand_deviation.min(min_residual);
        let extra_by_time = max_load_by_time(self.config, self.max_op_time[station]) - fd.min(0);
        self.unsat_unload_usable.accumulate(
            station,
            self.scheme.len(),
            (extra_no_time - extra_by_time).max(0),
            station_priority,
        );
        let extra = extra_no_time.min(extra_by_time);

        if fd + extra > 0 {
            self.scheme[depot].load_usable = fd + extra;
            self.scheme[depot].unload_usable = 0;
            self.max_op_time[station] -=
                2.0 * f64::from(fd.min(0) + extra) * self.config.loading_time;
        } else {
            self.scheme[depot].load_usable = 0;
            self.scheme[depot].unload_usable = -fd - extra;
        }
        self.scheme[depot].onboard_usable += extra;

        // Re-derive the onboard quantities downstream of the depot.
        for i in depot + 1..self.scheme.len() {
            self.scheme[i].onboard_usable = self.scheme[i - 1].onboard_usable
                + self.scheme[i].load_usable
                - self.scheme[i].unload_usable;
            self.scheme[i].onboard_broken = self.scheme[i - 1].onboard_broken
                + self.scheme[i].load_broken
                - self.scheme[i].unload_broken;
        }
        extra
    }
}
