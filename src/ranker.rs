use crate::error::{NeatError, Result};
use crate::hypercube::{compute_indicators, Hypercube};
use crate::population::Specimen;
use std::cmp::Ordering;

/// Result of one ranking pass. `specimens[i]` belongs to `hypercubes[i]`,
/// best first.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub best_score: f64,
    pub best_summary: String,
    pub specimens: Vec<Specimen>,
    pub hypercubes: Vec<Hypercube>,
}

/// Sorts `specimens` by the hypervolume they cover relative to `reference`,
/// shared among the members of their species.
///
/// `maximize[i]` tells whether larger values of objective `i` are better,
/// `weights[i]` scales it. Every specimen's `outcomes` must have one entry per
/// objective.
///
/// # Errors
///
/// `EmptyPopulation` for no specimens, `DimensionMismatch` if any of the
/// slices or outcome vectors disagree in length.

pub fn rank(specimens: Vec<Specimen>, reference: &[f64], maximize: &[bool], weights: &[f64]) -> Result<Ranking> {
    if specimens.is_empty() {
        return Err(NeatError::EmptyPopulation);
    }
    if reference.is_empty() {
        return Err(NeatError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let mut cubes = Vec::with_capacity(specimens.len());
    for (i, specimen) in specimens.iter().enumerate() {
        let cube = Hypercube::new(&specimen.outcomes, reference, maximize, weights)?;
        if let Some(dim) = cube.first_uncleared() {
            warn!("specimen {} does not clear the reference point in dimension {} ({} vs {})",
                  i,
                  dim,
                  specimen.outcomes[dim],
                  reference[dim]);
        }
        cubes.push(cube);
    }
    compute_indicators(&mut cubes);

    let mut ranked: Vec<(Specimen, Hypercube)> = specimens
        .into_iter()
        .zip(cubes)
        .map(|(mut specimen, cube)| {
            let count = specimen.species_member_count.max(1) as f64;
            specimen.selection_score = (cube.indicator + cube.volume) / count;
            (specimen, cube)
        })
        .collect();

    ranked.sort_by(|a, b| compare_ranked((&a.0, &a.1), (&b.0, &b.1)));

    let (specimens, hypercubes): (Vec<Specimen>, Vec<Hypercube>) = ranked.into_iter().unzip();
    let (best_score, best_summary) = summarize(&specimens[0], &hypercubes[0]);
    debug!("ranked {} specimens: {}", specimens.len(), best_summary);

    Ok(Ranking {
        best_score: best_score,
        best_summary: best_summary,
        specimens: specimens,
        hypercubes: hypercubes,
    })
}

fn summarize(best: &Specimen, cube: &Hypercube) -> (f64, String) {
    let summary = format!("score={:.4} bonus={:.4} outcomes={:?} volume={:.4} indicator={:.4} species_size={} genes={}",
                          best.score,
                          best.bonus,
                          best.outcomes,
                          cube.volume,
                          cube.indicator,
                          best.species_member_count,
                          best.genome().complexity());
    (best.score, summary)
}

/// Best first: descending selection score, then volume, then indicator.

pub fn compare_ranked(a: (&Specimen, &Hypercube), b: (&Specimen, &Hypercube)) -> Ordering {
    b.0.selection_score
        .total_cmp(&a.0.selection_score)
        .then_with(|| b.1.volume.total_cmp(&a.1.volume))
        .then_with(|| b.1.indicator.total_cmp(&a.1.indicator))
}
