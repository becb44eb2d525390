//! Population management: dual feasible/infeasible archives, rank-based
//! biased fitness, diversity bookkeeping and the adaptive capacity penalty.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use itertools::Itertools;
use log::debug;
use rand::Rng;

use crate::config::Config;
use crate::individual::Individual;
use crate::instance::Instance;
use crate::local_search::LocalSearch;
use crate::schedule::Route;

/// Elite exemption count in the biased-fitness weight; constant zero, so the
/// similarity rank always carries full weight.
const NB_ELITE: usize = 0;

/// Deadband around the target feasible fraction within which the penalty is
/// left alone.
const FEASIBLE_DEADBAND: f64 = 0.05;

/// The two archives of candidate solutions plus the buffers of individuals
/// inserted since the last penalty-adjustment checkpoint.
pub struct Population {
    pub feasible: Vec<Individual>,
    pub infeasible: Vec<Individual>,
    pub latest_feasible: Vec<Individual>,
    pub latest_infeasible: Vec<Individual>,
    /// Penalty per unit of capacity excess, adapted during the search
    pub penalty_capacity: f64,
}

impl Population {
    pub fn new(config: &Config) -> Self {
        Population {
            feasible: Vec::with_capacity(config.mu + config.lambda),
            infeasible: Vec::with_capacity(config.mu + config.lambda),
            latest_feasible: Vec::new(),
            latest_infeasible: Vec::new(),
            penalty_capacity: config.penalty_capacity,
        }
    }

    /// Fill the population with locally improved random individuals. One
    /// batch builds up to `4·mu` individuals; the caller repeats whole
    /// batches while no feasible individual exists.
    pub fn generate_initial<R: Rng>(
        &mut self,
        instance: &Instance,
        config: &Config,
        local_search: &LocalSearch,
        start_time: Instant,
        rng: &mut R,
    ) {
        for i in 0..4 * config.mu {
            if i > 0 {
                if let Some(limit) = config.time_limit {
                    if start_time.elapsed() >= limit {
                        break;
                    }
                }
            }
            let mut indiv = Individual::random(instance, config, self.penalty_capacity, rng);
            self.educate_and_repair(&mut indiv, local_search, instance, config, rng);
        }
    }

    /// Improve an individual with local search and insert it; an infeasible
    /// result is, with 50% probability, re-run under a 10x and then a 100x
    /// penalty to attempt repair, inserting after every pass. The penalty is
    /// restored afterwards.
    pub fn educate_and_repair<R: Rng>(
        &mut self,
        indiv: &mut Individual,
        local_search: &LocalSearch,
        instance: &Instance,
        config: &Config,
        rng: &mut R,
    ) {
        local_search.run(indiv, instance, config, self.penalty_capacity, rng);
        self.insert(indiv.clone(), config);
        if !indiv.eval.is_feasible && rng.gen_bool(0.5) {
            let saved_penalty = self.penalty_capacity;
            self.penalty_capacity *= 10.0;
            local_search.run(indiv, instance, config, self.penalty_capacity, rng);
            self.insert(indiv.clone(), config);
            if !indiv.eval.is_feasible {
                self.penalty_capacity *= 10.0;
                local_search.run(indiv, instance, config, self.penalty_capacity, rng);
                self.insert(indiv.clone(), config);
            }
            self.penalty_capacity = saved_penalty;
        }
    }

    /// Insert an individual into the archive matching its feasibility,
    /// unless an equal individual is already archived. Triggers size control
    /// when an archive reaches `mu + lambda`. Returns whether it was added.
    pub fn insert(&mut self, indiv: Individual, config: &Config) -> bool {
        let (archive, latest) = if indiv.eval.is_feasible {
            (&mut self.feasible, &mut self.latest_feasible)
        } else {
            (&mut self.infeasible, &mut self.latest_infeasible)
        };
        if archive.contains(&indiv) {
            return false;
        }
        archive.push(indiv.clone());
        latest.push(indiv);
        self.update_all_biased_fitness();
        if self.feasible.len() >= config.mu + config.lambda
            || self.infeasible.len() >= config.mu + config.lambda
        {
            self.size_control(config);
        }
        true
    }

    /// Recompute similarity and biased fitness for both archives.
    pub fn update_all_biased_fitness(&mut self) {
        update_similarity(&mut self.feasible);
        update_biased_fitness(&mut self.feasible);
        update_similarity(&mut self.infeasible);
        update_biased_fitness(&mut self.infeasible);
    }

    /// Truncate any archive that reached `mu + lambda` down to its best `mu`
    /// entries by biased fitness.
    pub fn size_control(&mut self, config: &Config) {
        let limit = config.mu + config.lambda;
        for archive in [&mut self.feasible, &mut self.infeasible] {
            if archive.len() >= limit {
                update_biased_fitness(archive);
                archive.sort_by(|a, b| {
                    a.eval
                        .biased_fitness
                        .partial_cmp(&b.eval.biased_fitness)
                        .unwrap()
                });
                archive.truncate(config.mu);
            }
        }
    }

    pub fn total_size(&self) -> usize {
        self.feasible.len() + self.infeasible.len()
    }

    /// Binary tournament over the concatenation of both archives: draw two
    /// distinct indices, keep the individual with the lower biased fitness.
    pub fn binary_tournament<R: Rng>(&self, rng: &mut R) -> &Individual {
        let total = self.total_size();
        let index1 = rng.gen_range(0..total);
        let mut index2 = rng.gen_range(0..total);
        while index1 == index2 && total > 1 {
            index2 = rng.gen_range(0..total);
        }
        let first = self.by_index(index1);
        let second = self.by_index(index2);
        if first.eval.biased_fitness < second.eval.biased_fitness {
            first
        } else {
            second
        }
    }

    fn by_index(&self, index: usize) -> &Individual {
        if index < self.feasible.len() {
            &self.feasible[index]
        } else {
            &self.infeasible[index - self.feasible.len()]
        }
    }

    /// Diversification: keep each archive's best `mu/3` by biased fitness,
    /// generate fresh random individuals until the population reaches
    /// `4·mu`, then refill each archive up to `mu`, best newcomers first.
    pub fn diversification<R: Rng>(
        &mut self,
        instance: &Instance,
        config: &Config,
        rng: &mut R,
    ) {
        for archive in [&mut self.feasible, &mut self.infeasible] {
            archive.sort_by(|a, b| {
                a.eval
                    .biased_fitness
                    .partial_cmp(&b.eval.biased_fitness)
                    .unwrap()
            });
            archive.truncate(config.mu / 3);
        }

        let mut new_feasible: Vec<Individual> = Vec::new();
        let mut new_infeasible: Vec<Individual> = Vec::new();
        let mut total = self.total_size();
        let mut attempts = 0;
        while (new_feasible.len() + self.feasible.len() <= config.mu
            || new_infeasible.len() + self.infeasible.len() <= config.mu)
            && total < 4 * config.mu
            && attempts < 16 * config.mu
        {
            attempts += 1;
            let indiv = Individual::random(instance, config, self.penalty_capacity, rng);
            if indiv.eval.is_feasible {
                if !self.feasible.contains(&indiv) {
                    new_feasible.push(indiv);
                    total += 1;
                }
            } else if !self.infeasible.contains(&indiv) {
                new_infeasible.push(indiv);
                total += 1;
            }
        }

        for newcomers in [&mut new_feasible, &mut new_infeasible] {
            update_similarity(newcomers);
            update_biased_fitness(newcomers);
            newcomers.sort_by(|a, b| {
                a.eval
                    .biased_fitness
                    .partial_cmp(&b.eval.biased_fitness)
                    .unwrap()
            });
        }

        while self.feasible.len() < config.mu && !new_feasible.is_empty() {
            self.feasible.push(new_feasible.remove(0));
        }
        while self.infeasible.len() < config.mu && !new_infeasible.is_empty() {
            self.infeasible.push(new_infeasible.remove(0));
        }
    }

    /// Compare the feasible fraction of the latest insertions against the
    /// target and scale the penalty by 1.2 (too few feasible) or 0.85 (too
    /// many), re-deriving every archived objective under the new penalty.
    /// Returns the applied multiplier.
    pub fn adjust_penalty(&mut self, config: &Config) -> f64 {
        let feasible_count = self.latest_feasible.len();
        let infeasible_count = self.latest_infeasible.len();
        let mut multiplier = 1.0;
        if feasible_count + infeasible_count > 0 {
            let proportion =
                feasible_count as f64 / (feasible_count + infeasible_count) as f64;
            if proportion < config.target_feasible - FEASIBLE_DEADBAND {
                multiplier = 1.2;
            } else if proportion > config.target_feasible + FEASIBLE_DEADBAND {
                multiplier = 0.85;
            }
        }
        if multiplier != 1.0 {
            self.penalty_capacity *= multiplier;
            debug!(
                "capacity penalty scaled by {} to {}",
                multiplier, self.penalty_capacity
            );
            for indiv in self
                .feasible
                .iter_mut()
                .chain(self.infeasible.iter_mut())
            {
                indiv.eval.compute_objective(self.penalty_capacity);
            }
        }
        multiplier
    }

    /// Clear the checkpoint buffers after a penalty adjustment.
    pub fn reset_latest(&mut self) {
        self.latest_feasible.clear();
        self.latest_infeasible.clear();
    }

    /// The archived feasible individual with the lowest objective.
    pub fn best_feasible(&self) -> Option<&Individual> {
        self.feasible.iter().min_by(|a, b| {
            a.eval
                .obj_val
                .partial_cmp(&b.eval.obj_val)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Route arcs (consecutive station pairs) of a route set.
fn arcs(routes: &[Route]) -> Vec<(usize, usize)> {
    routes
        .iter()
        .flat_map(|route| route.iter().copied().tuple_windows::<(usize, usize)>())
        .collect()
}

/// Similarity of an individual = the number of its truck arcs occurring in
/// at least one other individual's truck routes, plus the same count for
/// repairman arcs, within the same subpopulation.
pub fn update_similarity(subpopulation: &mut [Individual]) {
    let mut trk_carriers: HashMap<(usize, usize), usize> = HashMap::new();
    let mut rpm_carriers: HashMap<(usize, usize), usize> = HashMap::new();
    for indiv in subpopulation.iter() {
        let trk_set: HashSet<(usize, usize)> = arcs(&indiv.chrom_trk).into_iter().collect();
        for arc in trk_set {
            *trk_carriers.entry(arc).or_insert(0) += 1;
        }
        let rpm_set: HashSet<(usize, usize)> = arcs(&indiv.chrom_rpm).into_iter().collect();
        for arc in rpm_set {
            *rpm_carriers.entry(arc).or_insert(0) += 1;
        }
    }
    for indiv in subpopulation.iter_mut() {
        let shared_trk = arcs(&indiv.chrom_trk)
            .into_iter()
            .filter(|arc| trk_carriers.get(arc).copied().unwrap_or(0) >= 2)
            .count();
        let shared_rpm = arcs(&indiv.chrom_rpm)
            .into_iter()
            .filter(|arc| rpm_carriers.get(arc).copied().unwrap_or(0) >= 2)
            .count();
        indiv.eval.similarity = shared_trk + shared_rpm;
    }
}

/// Biased fitness = objective rank + (1 - nbElite/size) * similarity rank,
/// both 1-based ascending; lower is better.
pub fn update_biased_fitness(subpopulation: &mut [Individual]) {
    let size = subpopulation.len();
    if size == 0 {
        return;
    }
    subpopulation.sort_by(|a, b| a.eval.obj_val.partial_cmp(&b.eval.obj_val).unwrap());
    for (rank, indiv) in subpopulation.iter_mut().enumerate() {
        indiv.eval.rank_fit = rank + 1;
    }
    subpopulation.sort_by_key(|indiv| indiv.eval.similarity);
    let similarity_weight = 1.0 - NB_ELITE as f64 / size as f64;
    for (rank, indiv) in subpopulation.iter_mut().enumerate() {
        indiv.eval.rank_sim = rank + 1;
        indiv.eval.biased_fitness =
            indiv.eval.rank_fit as f64 + similarity_weight * indiv.eval.rank_sim as f64;
    }
}
