//! Criterion benchmarks for individual construction and local search.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hgs_bsrp::config::Config;
use hgs_bsrp::individual::Individual;
use hgs_bsrp::instance::{Instance, Station};
use hgs_bsrp::local_search::LocalSearch;

fn table(max_state: i32, f: impl Fn(i32, i32) -> f64) -> Vec<Vec<f64>> {
    (0..=max_state)
        .map(|u| (0..=max_state).map(|b| f(u, b)).collect())
        .collect()
}

/// A synthetic ring of stations around the depot.
fn bench_instance(nb_clients: usize) -> Instance {
    let n = nb_clients + 1;
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let gap = (i as f64 - j as f64).abs();
                dist[i][j] = 5.0 + 3.0 * gap.min(n as f64 - gap);
            }
        }
    }
    let mut stations = Vec::new();
    let mut dissat = Vec::new();
    let mut priority = Vec::new();
    let mut priority_rpm = Vec::new();
    for id in 1..=nb_clients {
        let target = 5;
        let usable = if id % 2 == 0 { 9 } else { 2 };
        let broken = if id % 3 == 0 { 3 } else { 0 };
        stations.push(Station::new(id, usable, broken, target, 14));
        dissat.push(table(14, move |u, b| {
            f64::from((target - u).abs()) + 0.5 * f64::from(b)
        }));
        priority.push(table(14, move |u, b| {
            f64::from((u - target).abs()) + f64::from(b)
        }));
        priority_rpm.push(table(14, |_, b| f64::from(b)));
    }
    Instance::new(dist, stations, dissat, priority, priority_rpm)
}

fn bench_config(nb_clients: usize) -> Config {
    Config::new()
        .with_nb_clients(nb_clients)
        .with_nb_vehicles(2)
        .with_nb_repairmen(1)
        .with_vehicle_capacity(20)
        .with_time_budget(10800.0)
        .with_it_edu(10)
        .with_seed(7)
}

fn benchmark_individual_construction(c: &mut Criterion) {
    let instance = bench_instance(20);
    let config = bench_config(20);

    c.bench_function("random_individual_20", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        b.iter(|| Individual::random(&instance, &config, 100.0, &mut rng))
    });
}

fn benchmark_local_search(c: &mut Criterion) {
    let instance = bench_instance(20);
    let config = bench_config(20);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let base = Individual::random(&instance, &config, 100.0, &mut rng);
    let search = LocalSearch::new();

    c.bench_function("local_search_20", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        b.iter(|| {
            let mut indiv = base.clone();
            search.run(&mut indiv, &instance, &config, 100.0, &mut rng);
            indiv
        })
    });
}

criterion_group!(
    benches,
    benchmark_individual_construction,
    benchmark_local_search
);
criterion_main!(benches);
