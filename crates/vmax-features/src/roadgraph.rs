//! Roadgraph spatial reduction.
//!
//! Reduces a prefiltered roadgraph to exactly `top_k` points: an
//! optional filter hook masks points out, a stride keeps every
//! `interval`-th point, and the nearest remaining points are selected.
//! The input is never modified; reduction returns a new value.

use std::fmt;

use vmax_core::{ExtractError, RoadgraphPoints};

use crate::selector::{select_among, Selection};

/// Hook that masks roadgraph points out before reduction.
///
/// Returns one keep-bit per point. A point that is not kept is treated
/// as invalid for the rest of the pipeline.
pub trait RoadgraphFilter: fmt::Debug + Send + Sync {
    /// Keep-bits, one per point of `points`.
    fn keep(&self, points: &RoadgraphPoints) -> Vec<bool>;
}

/// Filter that keeps every point.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAll;

impl RoadgraphFilter for KeepAll {
    fn keep(&self, points: &RoadgraphPoints) -> Vec<bool> {
        vec![true; points.len()]
    }
}

/// Keeps only points whose raw type label is in a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeFilter {
    labels: Vec<i32>,
}

impl TypeFilter {
    /// Keep points with one of `labels`.
    pub fn new(labels: impl IntoIterator<Item = i32>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }
}

impl RoadgraphFilter for TypeFilter {
    fn keep(&self, points: &RoadgraphPoints) -> Vec<bool> {
        points.types.iter().map(|t| self.labels.contains(t)).collect()
    }
}

/// Result of [`reduce`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedRoadgraph {
    /// Exactly `top_k` points; padding slots are invalid with label `-1`.
    pub points: RoadgraphPoints,
    /// Which input point fills each slot.
    pub selection: Selection,
}

/// Reduce `points` to `top_k` slots.
pub fn reduce(
    points: &RoadgraphPoints,
    interval: usize,
    top_k: usize,
    filter: &dyn RoadgraphFilter,
) -> Result<ReducedRoadgraph, ExtractError> {
    points.check()?;
    if interval == 0 {
        return Err(ExtractError::InvalidState {
            reason: "roadgraph interval must be at least 1".into(),
        });
    }

    let keep = filter.keep(points);
    if keep.len() != points.len() {
        return Err(ExtractError::ShapeMismatch {
            reason: format!(
                "roadgraph filter returned {} bits for {} points",
                keep.len(),
                points.len()
            ),
        });
    }
    let valid: Vec<bool> = points.valid.iter().zip(&keep).map(|(&v, &k)| v && k).collect();
    let distances: Vec<f32> = points
        .x
        .iter()
        .zip(&points.y)
        .map(|(x, y)| x.hypot(*y))
        .collect();
    let candidates: Vec<usize> = (0..points.len()).step_by(interval).collect();

    let selection = select_among(&candidates, &distances, &valid, top_k)?;
    let mut reduced = points.select(selection.slots());
    for (slot, index) in selection.slots().iter().enumerate() {
        if let Some(i) = *index {
            reduced.valid[slot] = valid[i];
        }
    }
    Ok(ReducedRoadgraph {
        points: reduced,
        selection,
    })
}
