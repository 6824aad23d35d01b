//! Path-target resolution.
//!
//! Picks the candidate path with the most valid on-route waypoints,
//! resamples it every `points_gap` waypoints (skipping waypoint 0) and
//! normalizes the result. The output always has exactly `num_points`
//! rows; a path too short for that is handled by the configured
//! [`PathShortfall`] policy.

use tracing::debug;

use vmax_core::{CandidatePaths, ExtractError, FeatureTensor};

use crate::config::{PathShortfall, PathTargetConfig};
use crate::normalize::normalize_path;

/// Index of the path with the most valid on-route waypoints.
///
/// Ties go to the lowest index. `None` when there are no paths.
pub fn best_path(paths: &CandidatePaths) -> Option<usize> {
    ranked_best(paths).map(|(path, _)| path)
}

/// Best path and its valid on-route waypoint count.
fn ranked_best(paths: &CandidatePaths) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for path in 0..paths.num_paths {
        let count = if paths.on_route[path] {
            (0..paths.num_points_per_path)
                .filter(|&i| paths.valid[paths.index(path, i)])
                .count()
        } else {
            0
        };
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((path, count));
        }
    }
    best
}

/// Waypoint indices `gap, 2*gap, ...` below `path_len`, at most `num_points`.
pub fn target_indices(path_len: usize, points_gap: usize, num_points: usize) -> Vec<usize> {
    if points_gap == 0 {
        return Vec::new();
    }
    (points_gap..path_len)
        .step_by(points_gap)
        .take(num_points)
        .collect()
}

/// Resolve the normalized `[num_points, 2]` path target.
pub fn resolve(
    paths: &CandidatePaths,
    config: &PathTargetConfig,
    max_range: f32,
) -> Result<FeatureTensor, ExtractError> {
    paths.check()?;
    let num_points = config.num_points;

    let path = match ranked_best(paths) {
        Some((path, count)) if count > 0 => path,
        _ => {
            debug!(
                num_paths = paths.num_paths,
                "no valid on-route waypoint, path target is all zeros"
            );
            return Ok(FeatureTensor::zeros(&[num_points, 2]));
        }
    };

    let mut xy: Vec<f32> = Vec::with_capacity(num_points * 2);
    for i in target_indices(paths.num_points_per_path, config.points_gap, num_points) {
        let flat = paths.index(path, i);
        if paths.valid[flat] {
            xy.extend_from_slice(&[paths.x[flat], paths.y[flat]]);
        } else {
            xy.extend_from_slice(&[0.0, 0.0]);
        }
    }

    let available = xy.len() / 2;
    if available < num_points {
        match config.shortfall {
            PathShortfall::Error => {
                return Err(ExtractError::PathShortfall {
                    requested: num_points,
                    available,
                });
            }
            PathShortfall::ZeroPad => xy.resize(num_points * 2, 0.0),
            PathShortfall::RepeatLast => {
                let last = match xy.as_slice() {
                    [.., x, y] => [*x, *y],
                    _ => [0.0, 0.0],
                };
                while xy.len() < num_points * 2 {
                    xy.extend_from_slice(&last);
                }
            }
        }
        debug!(
            requested = num_points,
            available,
            policy = ?config.shortfall,
            "selected path shorter than path target"
        );
    }

    let target = FeatureTensor::new(&[num_points, 2], xy)?;
    Ok(normalize_path(target, max_range))
}
