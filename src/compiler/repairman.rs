//! Assignment of repair quantities along a repairman route. Repairmen have
//! no carrying resource, so each stop is decided independently from the
//! station's deficit, broken stock and time allotment.

use crate::compiler::allotment::allot_operating_time;
use crate::compiler::max_repair_by_time;
use crate::config::Config;
use crate::instance::{Instance, Inventory};
use crate::schedule::{RepairStop, Route};

/// Compile a repairman route into a schedule of per-stop repair quantities,
/// mutating the inventory in place. The route may be trimmed by the
/// allotment step.
pub fn compile_repairman_route(
    config: &Config,
    instance: &Instance,
    route: &mut Route,
    inventory: &mut Inventory,
) -> Vec<RepairStop> {
    let mut max_op_time = allot_operating_time(config, instance, inventory, route, true);

    let mut scheme = Vec::with_capacity(route.len());
    scheme.push(RepairStop::at(route[0]));
    for i in 1..route.len() {
        let station = route[i];
        let mut stop = RepairStop::at(station);
        if station != 0 {
            let deficit =
                (instance.stations[station].target_usable - inventory.usable[station]).max(0);
            let repaired = deficit
                .min(max_repair_by_time(config, max_op_time[station]))
                .min(inventory.broken[station]);
            max_op_time[station] -= f64::from(repaired) * config.repair_time;
            stop.repaired = repaired;
            inventory.usable[station] += repaired;
            inventory.broken[station] -= repaired;
        }
        scheme.push(stop);
    }
    scheme
}
