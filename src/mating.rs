use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatingMethod {
    // Crossover of weights with a second member of the same species
    Mate,

    // Structural Mutation
    MutateAddNode,
    MutateAddConnection,

    // Mutation of weights
    MutateChangeWeight,
}

/// Relative weights of the reproduction operators. If all of them are zero,
/// every operator is equally likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatingMethodWeights {
    pub mate: u32,
    pub mutate_add_node: u32,
    pub mutate_add_connection: u32,
    pub mutate_change_weight: u32,
}

impl Default for MatingMethodWeights {
    fn default() -> Self {
        MatingMethodWeights {
            mate: 20,
            mutate_add_node: 3,
            mutate_add_connection: 5,
            mutate_change_weight: 72,
        }
    }
}

impl MatingMethod {
    /// Picks an operator according to `p`. `Mate` is never returned when
    /// `can_mate` is false (a species with a single member).

    pub fn random_with<R>(p: &MatingMethodWeights, can_mate: bool, rng: &mut R) -> MatingMethod
        where R: Rng
    {
        let mut items = vec![(MatingMethod::MutateAddNode, p.mutate_add_node),
                             (MatingMethod::MutateAddConnection, p.mutate_add_connection),
                             (MatingMethod::MutateChangeWeight, p.mutate_change_weight)];
        if can_mate {
            items.insert(0, (MatingMethod::Mate, p.mate));
        }

        match WeightedIndex::new(items.iter().map(|&(_, w)| w)) {
            Ok(dist) => items[dist.sample(rng)].0,
            // all weights zero
            Err(_) => items.choose(rng).map(|&(m, _)| m).unwrap_or(MatingMethod::MutateChangeWeight),
        }
    }
}
