use crate::gene::{Gene, Genome};
use serde::{Deserialize, Serialize};

/// Coefficients of the compatibility distance and the threshold under which
/// two genomes belong to the same species. A threshold of zero disables
/// speciation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciationConfig {
    /// Weight of excess genes.
    pub c1: f64,
    /// Weight of disjoint genes.
    pub c2: f64,
    /// Weight of the average weight difference of shared genes.
    pub c3: f64,
    pub threshold: f64,
}

impl Default for SpeciationConfig {
    fn default() -> Self {
        SpeciationConfig {
            c1: 1.0,
            c2: 1.0,
            c3: 0.4,
            threshold: 3.0,
        }
    }
}

/// Compatibility distance between two genomes.
///
/// The younger genome is the one with the higher maximum innovation number; its
/// genes beyond the older genome's maximum are excess. The remaining genes of
/// both are merged by id: pairs with equal id are shared, everything else is
/// disjoint. Counts are normalized by the larger genome length.

pub fn distance(a: &Genome, b: &Genome, c1: f64, c2: f64, c3: f64) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }

    let max_a = a.max_innovation();
    let max_b = b.max_innovation();
    let (older, younger, older_max) = if max_a >= max_b {
        (b, a, max_b)
    } else {
        (a, b, max_a)
    };

    let is_excess = |g: &Gene| match older_max {
        Some(m) => g.id > m,
        None => true,
    };
    let excess = younger.genes().iter().filter(|g| is_excess(g)).count();

    let mut merged: Vec<&Gene> = older
        .genes()
        .iter()
        .chain(younger.genes().iter().filter(|g| !is_excess(g)))
        .collect();
    merged.sort_by_key(|g| g.id);

    let mut disjoint = 0;
    let mut shared = 0;
    let mut weight_delta = 0.0;
    let mut i = 0;
    while i < merged.len() {
        if i + 1 < merged.len() && merged[i].id == merged[i + 1].id {
            shared += 1;
            weight_delta += (merged[i].weight() - merged[i + 1].weight()).abs();
            i += 2;
        } else {
            disjoint += 1;
            i += 1;
        }
    }

    let longest = longest as f64;
    let average_delta = if shared > 0 {
        weight_delta / shared as f64
    } else {
        0.0
    };

    c1 * (excess as f64 / longest) + c2 * (disjoint as f64 / longest) + c3 * average_delta
}

/// Returns whether `a` and `b` are compatible, together with their distance.

pub fn is_same_species(a: &Genome, b: &Genome, config: &SpeciationConfig) -> (bool, f64) {
    let d = distance(a, b, config.c1, config.c2, config.c3);
    (config.threshold == 0.0 || d <= config.threshold, d)
}
