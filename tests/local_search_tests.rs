//! Tests for the neighborhood operators and the local search protocol.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hgs_bsrp::config::Config;
use hgs_bsrp::individual::Individual;
use hgs_bsrp::instance::{Instance, Station};
use hgs_bsrp::local_search::{moves, LocalSearch, MoveKind};

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
        .with_it_edu(3)
        .with_seed(42)
}

#[test]
fn test_swap_preserves_members() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut routes = vec![vec![0, 1, 2, 3, 0]];
    moves::swap_two_nodes(&mut routes, &mut rng);

    assert_eq!(routes[0].len(), 5);
    assert_eq!(routes[0][0], 0);
    assert_eq!(routes[0][4], 0);
    let mut interior: Vec<usize> = routes[0][1..4].to_vec();
    interior.sort_unstable();
    assert_eq!(interior, vec![1, 2, 3]);
}

#[test]
fn test_moves_skip_short_routes() {
    let instance = create_test_instance();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let short = vec![vec![0, 0], vec![0, 1, 0]];
    let mut routes = short.clone();
    moves::swap_two_nodes(&mut routes, &mut rng);
    assert_eq!(routes, short);
    moves::swap_two_subtours(&mut routes, &mut rng);
    assert_eq!(routes, short);
    moves::relocate_one_node(&mut routes, &mut rng);
    assert_eq!(routes, short);
    moves::relocate_one_subtour(&mut routes, &mut rng);
    assert_eq!(routes, short);
    moves::reverse_one_subtour(&mut routes, &mut rng);
    assert_eq!(routes, short);
    moves::insert_one_node(&mut routes, false, &instance, 3, &mut rng);
    assert_eq!(routes, short);
    moves::delete_one_node(&mut routes, &mut rng);
    assert_eq!(routes, short);
}

#[test]
fn test_reverse_subtour() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut routes = vec![vec![0, 1, 2, 3, 0]];
    moves::reverse_one_subtour(&mut routes, &mut rng);

    // depot ends untouched, interior is some reversal segment
    assert_eq!(routes[0][0], 0);
    assert_eq!(routes[0][4], 0);
    let mut interior: Vec<usize> = routes[0][1..4].to_vec();
    interior.sort_unstable();
    assert_eq!(interior, vec![1, 2, 3]);
}

#[test]
fn test_delete_removes_one_interior_stop() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut routes = vec![vec![0, 1, 2, 3, 0]];
    moves::delete_one_node(&mut routes, &mut rng);
    assert_eq!(routes[0].len(), 4);
    assert_eq!(routes[0][0], 0);
    assert_eq!(*routes[0].last().unwrap(), 0);
}

#[test]
fn test_rpm_insertion_requires_broken_stock() {
    let instance = create_test_instance();
    let mut rng = ChaCha8Rng::seed_from_u64(17);

    // only station 3 has broken bikes; route already long enough
    for _ in 0..20 {
        let mut routes = vec![vec![0, 1, 2, 0]];
        moves::insert_one_node(&mut routes, true, &instance, 3, &mut rng);
        if routes[0].len() == 5 {
            assert!(routes[0].contains(&3));
        }
    }
}

#[test]
fn test_apply_rebuilds_individual() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut rng = ChaCha8Rng::seed_from_u64(19);

    let indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 1, 2, 0]],
    );
    let search = LocalSearch::new();
    for kind in MoveKind::ALL {
        let candidate = search.apply(kind, &indiv, &instance, &config, 100.0, &mut rng);
        for route in candidate.chrom_trk.iter().chain(candidate.chrom_rpm.iter()) {
            assert_eq!(*route.first().unwrap(), 0);
            assert_eq!(*route.last().unwrap(), 0);
        }
        // re-evaluating the unchanged schedules reproduces the same Eval
        let mut copy = candidate.clone();
        let again = hgs_bsrp::evaluator::evaluate(
            &config,
            &instance,
            &mut copy.truck_schedules,
            &mut copy.rpm_schedules,
            100.0,
        );
        assert_eq!(candidate.eval, again);
    }
}

#[test]
fn test_run_never_worsens_the_individual() {
    let instance = create_test_instance();
    let config = create_test_config();
    let mut rng = ChaCha8Rng::seed_from_u64(23);

    let mut indiv = Individual::from_chromosomes(
        &instance,
        &config,
        100.0,
        vec![vec![0, 3, 0]],
        vec![vec![0, 2, 1, 0]],
    );
    let before = indiv.eval.obj_val;
    let search = LocalSearch::new();
    search.run(&mut indiv, &instance, &config, 100.0, &mut rng);
    assert!(indiv.eval.obj_val <= before);
}

#[test]
fn test_run_is_deterministic_for_a_seed() {
    let instance = create_test_instance();
    let config = create_test_config();

    let build = || {
        Individual::from_chromosomes(
            &instance,
            &config,
            100.0,
            vec![vec![0, 3, 0]],
            vec![vec![0, 2, 1, 0]],
        )
    };
    let search = LocalSearch::new();

    let mut first = build();
    let mut rng = ChaCha8Rng::seed_from_u64(29);
    search.run(&mut first, &instance, &config, 100.0, &mut rng);

    let mut second = build();
    let mut rng = ChaCha8Rng::seed_from_u64(29);
    search.run(&mut second, &instance, &config, 100.0, &mut rng);

    assert_eq!(first, second);
    assert_eq!(first.eval, second.eval);
}
