//! Hypercubes spanned between a reference point and a specimen's outcomes.
//!
//! All cubes share the origin as lower corner, so a cube is fully described by
//! its upper corner (`dimensions`).

use crate::error::{NeatError, Result};
use crate::kdtree::{KdTree, Visitor};

#[derive(Debug, Clone, PartialEq)]
pub struct Hypercube {
    /// Non-negative edge lengths, one per objective.
    pub dimensions: Vec<f64>,
    pub volume: f64,
    /// Volume covered by this cube and no other. Zero if dominated.
    pub indicator: f64,
    pub is_dominated: bool,
}

impl AsRef<[f64]> for Hypercube {
    fn as_ref(&self) -> &[f64] {
        &self.dimensions
    }
}

impl Hypercube {
    /// Measures `outcomes` from `reference`. A maximized objective contributes
    /// `(outcome - reference) * weight` if it exceeds the reference, a
    /// minimized one `(reference - outcome) * weight` if it stays below;
    /// otherwise that edge has length zero.
    ///
    /// # Errors
    ///
    /// If the slices differ in length.

    pub fn new(outcomes: &[f64], reference: &[f64], maximize: &[bool], weights: &[f64]) -> Result<Hypercube> {
        let n = reference.len();
        for len in [outcomes.len(), maximize.len(), weights.len()].iter() {
            if *len != n {
                return Err(NeatError::DimensionMismatch {
                    expected: n,
                    actual: *len,
                });
            }
        }

        let dimensions: Vec<f64> = (0..n)
            .map(|i| {
                let (outcome, r) = (outcomes[i], reference[i]);
                if maximize[i] && outcome > r {
                    (outcome - r) * weights[i]
                } else if !maximize[i] && outcome < r {
                    (r - outcome) * weights[i]
                } else {
                    0.0
                }
            })
            .collect();
        let volume = dimensions.iter().product();

        Ok(Hypercube {
            dimensions: dimensions,
            volume: volume,
            indicator: 0.0,
            is_dominated: false,
        })
    }

    /// First dimension in which the outcome did not clear the reference point.

    pub fn first_uncleared(&self) -> Option<usize> {
        self.dimensions.iter().position(|&d| !(d > 0.0))
    }

    /// True if no dimension of `self` exceeds `other`. Equal cubes dominate
    /// each other.

    pub fn is_dominated_by(&self, other: &Hypercube) -> bool {
        dominated(&self.dimensions, &other.dimensions)
    }
}

fn dominated(corner: &[f64], by: &[f64]) -> bool {
    corner.iter().zip(by.iter()).all(|(a, b)| a <= b)
}

/// State of the indicator computation for one cube.
///
/// The exclusive region is kept as the box `[base, corner]`. Whenever another
/// cube reaches into that box, `base` moves toward `corner` along the
/// dimension that keeps the most volume.
struct IndicatorSearch<'a> {
    cubes: &'a [Hypercube],
    this: usize,
    corner: &'a [f64],
    base: Vec<f64>,
    dominated: bool,
}

impl<'a> IndicatorSearch<'a> {
    fn new(cubes: &'a [Hypercube], this: usize) -> Self {
        let corner = &cubes[this].dimensions[..];
        IndicatorSearch {
            cubes: cubes,
            this: this,
            corner: corner,
            base: vec![0.0; corner.len()],
            dominated: false,
        }
    }

    fn encroaches(&self, other: &[f64]) -> bool {
        other.iter().zip(self.base.iter()).all(|(o, b)| o > b)
    }

    fn indicator(&self) -> f64 {
        if self.dominated {
            return 0.0;
        }
        self.corner
            .iter()
            .zip(self.base.iter())
            .map(|(c, b)| c - b)
            .product()
    }
}

impl<'a> Visitor for IndicatorSearch<'a> {
    fn may_contain(&self, upper: &[f64]) -> bool {
        !self.dominated && (dominated(self.corner, upper) || self.encroaches(upper))
    }

    fn visit(&mut self, item: usize) -> bool {
        if item == self.this {
            return true;
        }
        let other = &self.cubes[item].dimensions;
        if dominated(self.corner, other) {
            self.dominated = true;
            return false;
        }
        if !self.encroaches(other) {
            return true;
        }

        // `other` is exceeded in at least one dimension; give up the slab
        // below it in whichever of those dimensions costs the least volume
        let mut best: Option<(usize, f64)> = None;
        for k in 0..self.corner.len() {
            let (c, o, b) = (self.corner[k], other[k], self.base[k]);
            if c > o {
                let kept = (c - o) / (c - b);
                if best.map_or(true, |(_, best_kept)| kept > best_kept) {
                    best = Some((k, kept));
                }
            }
        }
        if let Some((k, _)) = best {
            self.base[k] = other[k];
        }
        true
    }
}

/// Fills in `indicator` and `is_dominated` of every cube.

pub fn compute_indicators(cubes: &mut [Hypercube]) {
    let results: Vec<(f64, bool)> = {
        let view: &[Hypercube] = cubes;
        let tree = KdTree::build(view);
        (0..view.len())
            .map(|i| {
                let mut search = IndicatorSearch::new(view, i);
                tree.walk(&mut search);
                (search.indicator(), search.dominated)
            })
            .collect()
    };

    for (cube, (indicator, is_dominated)) in cubes.iter_mut().zip(results) {
        cube.indicator = indicator;
        cube.is_dominated = is_dominated;
    }
}
