//! Local search over an individual's chromosomes: a shuffled worklist of
//! nine neighborhood operators with adaptive repetition of whichever
//! operator improved the solution first.

pub mod moves;

use rand::Rng;

use crate::config::Config;
use crate::individual::Individual;
use crate::instance::Instance;

/// Hard cap on the repeats of one successful operator.
const MAX_OPERATOR_REPEATS: u32 = 1000;

/// The nine neighborhood operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    SingleNodeSwap,
    SubtourSwap,
    SingleNodeRelocation,
    SubtourRelocation,
    SubtourReversal,
    SingleNodeInsertion,
    MultiNodeInsertion,
    SingleNodeDeletion,
    MultiNodeDeletion,
}

impl MoveKind {
    pub const ALL: [MoveKind; 9] = [
        MoveKind::SingleNodeSwap,
        MoveKind::SubtourSwap,
        MoveKind::SingleNodeRelocation,
        MoveKind::SubtourRelocation,
        MoveKind::SubtourReversal,
        MoveKind::SingleNodeInsertion,
        MoveKind::MultiNodeInsertion,
        MoveKind::SingleNodeDeletion,
        MoveKind::MultiNodeDeletion,
    ];
}

/// Runs the improvement phase on freshly built individuals.
pub struct LocalSearch;

impl LocalSearch {
    pub fn new() -> Self {
        LocalSearch
    }

    /// Try operators from a shuffled worklist until one yields a strict
    /// improvement. That operator is then re-applied to the improved
    /// individual, adopting strict improvements only, until `it_edu`
    /// consecutive non-improving repeats or the hard repeat cap; after
    /// the repeat phase no further operators are tried. If the worklist
    /// empties without improvement, the individual is left unchanged.
    pub fn run<R: Rng>(
        &self,
        indiv: &mut Individual,
        instance: &Instance,
        config: &Config,
        penalty_capacity: f64,
        rng: &mut R,
    ) {
        let mut worklist: Vec<MoveKind> = MoveKind::ALL.to_vec();
        while !worklist.is_empty() {
            let kind = worklist.remove(rng.gen_range(0..worklist.len()));
            let candidate = self.apply(kind, indiv, instance, config, penalty_capacity, rng);
            if candidate.eval.obj_val < indiv.eval.obj_val {
                *indiv = candidate;
                let mut consecutive_failures = 0;
                let mut repeats = 0;
                while consecutive_failures < config.it_edu && repeats < MAX_OPERATOR_REPEATS {
                    let next = self.apply(kind, indiv, instance, config, penalty_capacity, rng);
                    if next.eval.obj_val < indiv.eval.obj_val {
                        *indiv = next;
                        consecutive_failures = 0;
                    } else {
                        consecutive_failures += 1;
                    }
                    repeats += 1;
                }
                break;
            }
        }
    }

    /// Apply one operator to copies of both chromosome sets and rebuild the
    /// resulting individual.
    pub fn apply<R: Rng>(
        &self,
        kind: MoveKind,
        indiv: &Individual,
        instance: &Instance,
        config: &Config,
        penalty_capacity: f64,
        rng: &mut R,
    ) -> Individual {
        let mut chrom_rpm = indiv.chrom_rpm.clone();
        let mut chrom_trk = indiv.chrom_trk.clone();
        let nb = config.nb_clients;
        match kind {
            MoveKind::SingleNodeSwap => {
                moves::swap_two_nodes(&mut chrom_rpm, rng);
                moves::swap_two_nodes(&mut chrom_trk, rng);
            }
            MoveKind::SubtourSwap => {
                moves::swap_two_subtours(&mut chrom_rpm, rng);
                moves::swap_two_subtours(&mut chrom_trk, rng);
            }
            MoveKind::SingleNodeRelocation => {
                moves::relocate_one_node(&mut chrom_rpm, rng);
                moves::relocate_one_node(&mut chrom_trk, rng);
            }
            MoveKind::SubtourRelocation => {
                moves::relocate_one_subtour(&mut chrom_rpm, rng);
                moves::relocate_one_subtour(&mut chrom_trk, rng);
            }
            MoveKind::SubtourReversal => {
                moves::reverse_one_subtour(&mut chrom_rpm, rng);
                moves::reverse_one_subtour(&mut chrom_trk, rng);
            }
            MoveKind::SingleNodeInsertion => {
                moves::insert_one_node(&mut chrom_rpm, true, instance, nb, rng);
                moves::insert_one_node(&mut chrom_trk, false, instance, nb, rng);
            }
            MoveKind::MultiNodeInsertion => {
                moves::insert_multiple_nodes(&mut chrom_rpm, true, instance, nb, rng);
                moves::insert_multiple_nodes(&mut chrom_trk, false, instance, nb, rng);
            }
            MoveKind::SingleNodeDeletion => {
                moves::delete_one_node(&mut chrom_rpm, rng);
                moves::delete_one_node(&mut chrom_trk, rng);
            }
            MoveKind::MultiNodeDeletion => {
                moves::delete_multiple_nodes(&mut chrom_rpm, rng);
                moves::delete_multiple_nodes(&mut chrom_trk, rng);
            }
        }
        Individual::from_chromosomes(instance, config, penalty_capacity, chrom_rpm, chrom_trk)
    }
}

impl Default for LocalSearch {
    fn default() -> Self {
        LocalSearch::new()
    }
}
