//! Order-based crossover for truck and repairman chromosomes.

use rand::Rng;

use crate::config::Config;
use crate::individual::Individual;
use crate::instance::Instance;
use crate::schedule::Route;

/// Implements the recombination operator of the genetic search.
pub struct Genetic;

impl Genetic {
    /// Cross two parents and build the offspring individual.
    pub fn crossover<R: Rng>(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        instance: &Instance,
        config: &Config,
        penalty_capacity: f64,
        rng: &mut R,
    ) -> Individual {
        let (chrom_rpm, chrom_trk) = self.crossover_chromosomes(parent_a, parent_b, config, rng);
        Individual::from_chromosomes(instance, config, penalty_capacity, chrom_rpm, chrom_trk)
    }

    /// Cross the route pairs of matching index. Truck routes use the
    /// duplicate-allowing fill rule (depot resets may repeat stations);
    /// repairman routes use the duplicate-excluding rule. Routes too short
    /// for crossover pass through from parent A.
    pub fn crossover_chromosomes<R: Rng>(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        config: &Config,
        rng: &mut R,
    ) -> (Vec<Route>, Vec<Route>) {
        let mut chrom_trk = Vec::with_capacity(config.nb_vehicles);
        for i in 0..config.nb_vehicles {
            let route_a = &parent_a.chrom_trk[i];
            let route_b = &parent_b.chrom_trk[i];
            let child = if route_a.len() >= 3 && route_b.len() >= 3 {
                let mut child = ordered_crossover(
                    &route_a[1..route_a.len() - 1],
                    &route_b[1..route_b.len() - 1],
                    true,
                    rng,
                );
                child.insert(0, 0);
                child.push(0);
                child
            } else {
                route_a.clone()
            };
            chrom_trk.push(child);
        }

        let mut chrom_rpm = Vec::with_capacity(config.nb_repairmen);
        for i in 0..config.nb_repairmen {
            let route_a = &parent_a.chrom_rpm[i];
            let route_b = &parent_b.chrom_rpm[i];
            let child = if route_a.len() >= 2 && route_b.len() >= 2 {
                let mut child = ordered_crossover(
                    &route_a[1..route_a.len() - 1],
                    &route_b[1..route_b.len() - 1],
                    false,
                    rng,
                );
                child.insert(0, 0);
                child.push(0);
                child
            } else {
                route_a.clone()
            };
            chrom_rpm.push(child);
        }
        (chrom_rpm, chrom_trk)
    }
}

/// Ordered crossover of two depot-stripped routes: copy a random segment
/// `[t, y]` of parent A verbatim, then fill the remaining positions
/// circularly from `y + 1` by scanning parent B circularly from `y + 1`.
/// With `allow_duplicates` every scanned station is placed; otherwise a
/// station already present in the offspring is skipped. The offspring has
/// parent B's length; pairs too short to cut return parent B unchanged.
pub fn ordered_crossover<R: Rng>(
    route_a: &[usize],
    route_b: &[usize],
    allow_duplicates: bool,
    rng: &mut R,
) -> Route {
    let min_size = route_a.len().min(route_b.len());
    if min_size <= 1 {
        return route_b.to_vec();
    }

    let mut t = rng.gen_range(0..min_size);
    let mut y = rng.gen_range(0..min_size);
    while y == t {
        y = rng.gen_range(0..min_size);
    }
    if t > y {
        std::mem::swap(&mut t, &mut y);
    }

    let mut offspring = vec![0usize; route_b.len()];
    offspring[t..=y].copy_from_slice(&route_a[t..=y]);

    let mut index_b = y + 1;
    let mut index_c = y + 1;
    let mut scanned_without_placement = 0;
    while index_c != t {
        if index_b == route_b.len() {
            index_b = 0;
        }
        if index_c == offspring.len() {
            index_c = 0;
            if index_c == t {
                break;
            }
        }
        if allow_duplicates {
            offspring[index_c] = route_b[index_b];
            index_c += 1;
        } else if !offspring.contains(&route_b[index_b]) {
            offspring[index_c] = route_b[index_b];
            index_c += 1;
            scanned_without_placement = 0;
        } else {
            // a full fruitless cycle over parent B means nothing remains
            // to place; the open slots stay depot markers
            scanned_without_placement += 1;
            if scanned_without_placement == route_b.len() {
                break;
            }
        }
        index_b += 1;
    }
    offspring
}
