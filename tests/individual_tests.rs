//! Tests for the individual lifecycle: construction, rebuild and equality.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hgs_bsrp::config::Config;
use hgs_bsrp::individual::Individual;
use hgs_bsrp::instance::{Instance, Station};
use hgs_bsrp::utils::combine_consecutive_duplicates;

fn table(max_state: i32, f: impl Fn(i32, i32) -> f64) -> Vec<Vec<f64>> {
    (0..=max_state)
        .map(|u| (0..=max_state).map(|b| f(u, b)).collect())
        .collect()
}

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
        .with_it_edu(5)
        .with_seed(42)
}

#[test]
fn test_random_individual_is_well_formed() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let indiv = Individual::random(&instance, &config, 100.0, &mut rng);

    assert_eq!(indiv.chrom_trk.len(), config.nb_vehicles);
    assert_eq!(indiv.chrom_rpm.len(), config.nb_repairmen);
    for route in indiv.chrom_trk.iter().chain(indiv.chrom_rpm.iter()) {
        assert_eq!(*route.first().unwrap(), 0);
        assert_eq!(*route.last().unwrap(), 0);
    }
    for (route, scheme) in indiv.chrom_trk.iter().zip(indiv.truck_schedules.iter()) {
        assert_eq!(route.len(), scheme.len());
    }
    for (route, scheme) in indiv.chrom_rpm.iter().zip(indiv.rpm_schedules.iter()) {
        assert_eq!(route.len(), scheme.len());
    }
}

#[test]
fn test_build_schedules_expected_actions() {
    let instance = create_test_instance();
    let config = create_test_config();

    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 0]],
    );

    // the truck collects the surplus at 1 and delivers the deficit at 2
    let truck = &indiv.truck_schedules[0];
    assert_eq!(truck[1].load_usable, 4);
    assert_eq!(truck[2].unload_usable, 4);
    // the repairman reduces the broken stock at 3
    let repairs: i32 = indiv.rpm_schedules[0].iter().map(|s| s.repaired).sum();
    assert_eq!(repairs, 2);
    assert!(indiv.eval.is_feasible);
    assert!((indiv.eval.dissat - 0.5).abs() < 1e-9);
}

#[test]
fn test_rebuild_is_idempotent() {
    let instance = create_test_instance();
    let config = create_test_config();

    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 0]],
    );
    let mut again = indiv.clone();
    again.rebuild(&instance, &config, 100.0);

    assert_eq!(indiv.eval, again.eval);
    assert_eq!(indiv.chrom_trk, again.chrom_trk);
    assert_eq!(indiv.chrom_rpm, again.chrom_rpm);
}

#[test]
fn test_equality_is_structural() {
    let instance = create_test_instance();
    let config = create_test_config();

    let a = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 0]],
    );
    let b = Individual::from_chromosomes(
        &instance,
        &config,
        50.0, // different penalty, same chromosomes
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 0]],
    );
    let c = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 2, 1, 0]],
    );

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_consecutive_duplicates_collapse_round_trip() {
    let mut routes = vec![
        vec![1, 1, 2, 2, 3],
        vec![0, 2, 2, 0],
        vec![0, 0],
        vec![2, 0, 0, 3],
    ];
    combine_consecutive_duplicates(&mut routes, false);
    assert_eq!(routes[0], vec![0, 1, 2, 3, 0]);
    assert_eq!(routes[1], vec![0, 2, 0]);
    assert_eq!(routes[2], vec![0, 0]);
    assert_eq!(routes[3], vec![0, 2, 0, 3, 0]);

    let mut rpm_routes = vec![vec![0, 1, 0, 3, 0]];
    combine_consecutive_duplicates(&mut rpm_routes, true);
    // interior depot stops disappear from repairman routes
    assert_eq!(rpm_routes[0], vec![0, 1, 3, 0]);
}

#[test]
fn test_collapse_then_build_keeps_depot_ends() {
    let instance = create_test_instance();
    let config = create_test_config();

    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![3, 3, 0]],
        vec![vec![1, 1, 2, 0, 0]],
    );
    for route in indiv.chrom_trk.iter().chain(indiv.chrom_rpm.iter()) {
        assert_eq!(*route.first().unwrap(), 0);
        assert_eq!(*route.last().unwrap(), 0);
    }
}

#[test]
fn test_idle_truck_stops_are_pruned() {
    let instance = create_test_instance();
    let config = create_test_config();

    // the second visit to station 1 happens after it was balanced
    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 1, 0]],
    );
    assert_eq!(indiv.chrom_trk[0], vec![0, 1, 2, 0]);
    assert_eq!(indiv.truck_schedules[0].len(), 4);
}

#[test]
fn test_zero_repair_stops_are_pruned() {
    let instance = create_test_instance();
    let config = create_test_config();

    // station 1 has nothing to repair; station 3 does
    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 1, 3, 0]],
        vec![vec![0, 0]],
    );
    assert_eq!(indiv.chrom_rpm[0], vec![0, 3, 0]);
}
