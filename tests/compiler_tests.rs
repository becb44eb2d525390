//! Tests for the route-to-schedule compiler.

use hgs_bsrp::compiler::unsat::UnsatLedger;
use hgs_bsrp::compiler::{compile_repairman_route, compile_truck_route};
use hgs_bsrp::config::Config;
use hgs_bsrp::instance::{Instance, Inventory, Station};

fn table(max_state: i32, f: impl Fn(i32, i32) -> f64) -> Vec<Vec<f64>> {
    (0..=max_state)
        .map(|u| (0..=max_state).map(|b| f(u, b)).collect())
        .collect()
}

/// Depot plus three stations: a surplus station, a deficit station and a
/// station with broken stock.
fn create_test_instance() -> Instance {
    let dist = vec![
        vec![0.0, 10.0, 12.0, 15.0],
        vec![10.0, 0.0, 8.0, 9.0],
        vec![12.0, 8.0, 0.0, 7.0],
        vec![15.0, 9.0, 7.0, 0.0],
    ];
    let stations = vec![
        Station::new(1, 8, 0, 4, 12),
        Station::new(2, 1, 0, 5, 10),
        Station::new(3, 2, 3, 4, 10),
    ];
    let targets = [0, 4, 5, 4];
    let mut dissat = Vec::new();
    let mut priority = Vec::new();
    let mut priority_rpm = Vec::new();
    for station in 1..=3usize {
        let target = targets[station];
        dissat.push(table(12, move |u, b| {
            f64::from((target - u).abs()) + 0.5 * f64::from(b)
        }));
        priority.push(table(12, move |u, b| {
            f64::from((u - target).abs()) + f64::from(b)
        }));
        priority_rpm.push(table(12, |_, b| f64::from(b)));
    }
    Instance::new(dist, stations, dissat, priority, priority_rpm)
}

fn create_test_config() -> Config {
    Config::new()
        .with_nb_clients(3)
        .with_nb_vehicles(1)
        .with_nb_repairmen(1)
        .with_vehicle_capacity(10)
        .with_repair_time(300.0)
        .with_loading_time(60.0)
        .with_time_budget(7200.0)
        .with_seed(42)
}

#[test]
fn test_schedule_length_matches_route() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut inventory = Inventory::from_instance(&instance);

    let mut route = vec![0, 1, 2, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);
    assert_eq!(scheme.len(), route.len());
    for (stop, &station) in scheme.iter().zip(route.iter()) {
        assert_eq!(stop.station, station);
    }

    let mut inventory = Inventory::from_instance(&instance);
    let mut route = vec![0, 3, 0];
    let scheme = compile_repairman_route(&config, &instance, &mut route, &mut inventory);
    assert_eq!(scheme.len(), route.len());
}

#[test]
fn test_load_at_surplus_unload_at_deficit() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut inventory = Inventory::from_instance(&instance);

    // station 1 holds 4 bikes above target, station 2 is 4 below
    let mut route = vec![0, 1, 2, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);

    assert_eq!(scheme[1].station, 1);
    assert_eq!(scheme[1].load_usable, 4);
    assert_eq!(scheme[1].unload_usable, 0);
    assert_eq!(scheme[2].station, 2);
    assert_eq!(scheme[2].unload_usable, 4);
    assert_eq!(scheme[2].load_usable, 0);
    assert_eq!(inventory.usable[1], 4);
    assert_eq!(inventory.usable[2], 5);
    // the truck leaves empty after the final depot stop
    assert_eq!(scheme[3].onboard_usable, 0);
    assert_eq!(scheme[3].onboard_broken, 0);
}

#[test]
fn test_depot_loading_covers_unreachable_deficit() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut inventory = Inventory::from_instance(&instance);

    // no surplus station on the route: the previous depot must supply
    let mut route = vec![0, 2, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);

    assert_eq!(scheme[0].load_usable, 4);
    assert_eq!(scheme[1].unload_usable, 4);
    assert_eq!(inventory.usable[2], 5);
}

#[test]
fn test_repairman_bounded_by_deficit_and_stock() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut inventory = Inventory::from_instance(&instance);

    // station 3: deficit 2, broken 3 -> repairs exactly 2
    let mut route = vec![0, 3, 0];
    let scheme = compile_repairman_route(&config, &instance, &mut route, &mut inventory);

    assert_eq!(scheme[1].station, 3);
    assert_eq!(scheme[1].repaired, 2);
    assert_eq!(inventory.usable[3], 4);
    assert_eq!(inventory.broken[3], 1);
}

#[test]
fn test_repair_quantity_capped_by_time() {
    let instance = create_test_instance();
    // room for travel plus exactly one repair
    let config = create_test_config().with_time_budget(15.0 * 1.68 * 2.0 + 350.0);
    let mut inventory = Inventory::from_instance(&instance);

    let mut route = vec![0, 3, 0];
    let scheme = compile_repairman_route(&config, &instance, &mut route, &mut inventory);
    assert!(scheme.iter().map(|s| s.repaired).sum::<i32>() <= 1);
}

#[test]
fn test_zero_vehicle_capacity_moves_nothing() {
    let instance = create_test_instance();
    let config = create_test_config().with_vehicle_capacity(0);
    let mut inventory = Inventory::from_instance(&instance);

    let mut route = vec![0, 1, 2, 3, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);
    for stop in &scheme {
        assert_eq!(stop.load_usable, 0);
        assert_eq!(stop.load_broken, 0);
        assert_eq!(stop.unload_usable, 0);
        assert_eq!(stop.unload_broken, 0);
    }
    assert_eq!(inventory, Inventory::from_instance(&instance));
}

#[test]
fn test_onboard_quantities_never_exceed_capacity() {
    let instance = create_test_instance();
    let config = create_test_config().with_vehicle_capacity(3);
    let mut inventory = Inventory::from_instance(&instance);

    let mut route = vec![0, 1, 2, 0, 3, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);
    for stop in &scheme {
        assert!(stop.onboard_usable >= 0);
        assert!(stop.onboard_broken >= 0);
        assert!(stop.onboard_usable + stop.onboard_broken <= config.vehicle_capacity);
    }
}

#[test]
fn test_route_trimmed_under_tight_budget() {
    let instance = create_test_instance();
    // travel of the full route alone exceeds this budget
    let config = create_test_config().with_time_budget(40.0);
    let mut inventory = Inventory::from_instance(&instance);

    let mut route = vec![0, 1, 2, 3, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);
    assert!(route.len() < 5);
    assert_eq!(scheme.len(), route.len());
    assert_eq!(*route.first().unwrap(), 0);
    assert_eq!(*route.last().unwrap(), 0);
}

#[test]
fn test_unsat_ledger_accumulate_and_overwrite() {
    let mut ledger = UnsatLedger::new();

    ledger.accumulate(2, 1, 3, 1.5);
    ledger.accumulate(2, 9, 2, 2.5);
    assert_eq!(ledger.records.len(), 1);
    // the first record fixes the schedule index; the surplus accumulates
    assert_eq!(ledger.records[0].schedule_index, 1);
    assert_eq!(ledger.records[0].surplus, 5);
    assert_eq!(ledger.records[0].priority, 2.5);

    ledger.overwrite(2, 4, 7, 0.5);
    assert_eq!(ledger.records[0].schedule_index, 1);
    assert_eq!(ledger.records[0].surplus, 7);
    assert_eq!(ledger.records[0].priority, 0.5);

    // zero surpluses never create records
    ledger.accumulate(3, 0, 0, 9.0);
    ledger.overwrite(4, 0, 0, 9.0);
    assert_eq!(ledger.records.len(), 1);
}

#[test]
fn test_intermediate_depot_retains_bikes_for_downstream_deficit() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut inventory = Inventory::from_instance(&instance);

    // the surplus collected at station 1 would be dropped at the depot,
    // but station 2 still needs it: the depot stop keeps the bikes onboard
    let mut route = vec![0, 1, 0, 2, 0];
    let scheme = compile_truck_route(&config, &instance, &mut route, &mut inventory);

    assert_eq!(scheme[1].load_usable, 4);
    assert_eq!(scheme[2].station, 0);
    assert_eq!(scheme[2].unload_usable, 0);
    assert_eq!(scheme[2].onboard_usable, 4);
    assert_eq!(scheme[3].unload_usable, 4);
    assert_eq!(scheme[3].onboard_usable, 0);
    assert_eq!(inventory.usable[2], 5);
    // the final depot stop leaves the truck empty
    assert_eq!(scheme[4].onboard_usable, 0);
    assert_eq!(scheme[4].onboard_broken, 0);
}
