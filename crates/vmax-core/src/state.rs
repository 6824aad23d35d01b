//! Simulator-state value types.
//!
//! These are the structured, variable-shaped inputs of the feature
//! pipeline. Per-entity, per-timestep quantities are stored flat in
//! entity-major order: element `(entity, t)` lives at
//! `entity * num_steps + t`. Categorical quantities keep the simulator's
//! raw integer labels; mapping them to network inputs is the
//! normalizer's job.

use crate::error::ExtractError;

fn check_len(what: &str, field: &str, actual: usize, expected: usize) -> Result<(), ExtractError> {
    if actual != expected {
        return Err(ExtractError::InvalidState {
            reason: format!("{what}.{field} has {actual} elements, expected {expected}"),
        });
    }
    Ok(())
}

/// Dynamic objects (vehicles, pedestrians, cyclists) over time.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTrajectories {
    /// Number of objects.
    pub num_objects: usize,
    /// Number of timesteps per object.
    pub num_steps: usize,
    /// Position x (m).
    pub x: Vec<f32>,
    /// Position y (m).
    pub y: Vec<f32>,
    /// Velocity x (m/s).
    pub vel_x: Vec<f32>,
    /// Velocity y (m/s).
    pub vel_y: Vec<f32>,
    /// Heading (rad).
    pub yaw: Vec<f32>,
    /// Bounding-box length (m).
    pub length: Vec<f32>,
    /// Bounding-box width (m).
    pub width: Vec<f32>,
    /// Whether the object is observed at this timestep.
    pub valid: Vec<bool>,
    /// Raw type label per object (not per timestep).
    pub object_types: Vec<i32>,
    /// Index of the self-driving car among the objects.
    pub sdc_index: usize,
}

impl ObjectTrajectories {
    /// All-invalid, zero-valued trajectories of the given size.
    pub fn empty(num_objects: usize, num_steps: usize) -> Self {
        let n = num_objects * num_steps;
        Self {
            num_objects,
            num_steps,
            x: vec![0.0; n],
            y: vec![0.0; n],
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
            yaw: vec![0.0; n],
            length: vec![0.0; n],
            width: vec![0.0; n],
            valid: vec![false; n],
            object_types: vec![0; num_objects],
            sdc_index: 0,
        }
    }

    /// Flat index of `(object, t)`.
    pub fn index(&self, object: usize, t: usize) -> usize {
        object * self.num_steps + t
    }

    /// Planar speed at a flat index.
    pub fn speed(&self, i: usize) -> f32 {
        self.vel_x[i].hypot(self.vel_y[i])
    }

    /// Check that every buffer has the declared size.
    pub fn check(&self) -> Result<(), ExtractError> {
        let n = self.num_objects * self.num_steps;
        check_len("objects", "x", self.x.len(), n)?;
        check_len("objects", "y", self.y.len(), n)?;
        check_len("objects", "vel_x", self.vel_x.len(), n)?;
        check_len("objects", "vel_y", self.vel_y.len(), n)?;
        check_len("objects", "yaw", self.yaw.len(), n)?;
        check_len("objects", "length", self.length.len(), n)?;
        check_len("objects", "width", self.width.len(), n)?;
        check_len("objects", "valid", self.valid.len(), n)?;
        check_len(
            "objects",
            "object_types",
            self.object_types.len(),
            self.num_objects,
        )?;
        if self.sdc_index >= self.num_objects {
            return Err(ExtractError::InvalidState {
                reason: format!(
                    "sdc_index {} out of range for {} objects",
                    self.sdc_index, self.num_objects
                ),
            });
        }
        Ok(())
    }
}

/// Static roadgraph samples (lane centres, road lines, edges, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoadgraphPoints {
    /// Position x (m).
    pub x: Vec<f32>,
    /// Position y (m).
    pub y: Vec<f32>,
    /// Unit direction to the next point, x component.
    pub dir_x: Vec<f32>,
    /// Unit direction to the next point, y component.
    pub dir_y: Vec<f32>,
    /// Raw map-element type label.
    pub types: Vec<i32>,
    /// Whether the point carries real data.
    pub valid: Vec<bool>,
}

impl RoadgraphPoints {
    /// `n` invalid points with padding label `-1`.
    pub fn empty(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            dir_x: vec![0.0; n],
            dir_y: vec![0.0; n],
            types: vec![-1; n],
            valid: vec![false; n],
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Check that every buffer has the same length.
    pub fn check(&self) -> Result<(), ExtractError> {
        let n = self.len();
        check_len("roadgraph", "y", self.y.len(), n)?;
        check_len("roadgraph", "dir_x", self.dir_x.len(), n)?;
        check_len("roadgraph", "dir_y", self.dir_y.len(), n)?;
        check_len("roadgraph", "types", self.types.len(), n)?;
        check_len("roadgraph", "valid", self.valid.len(), n)
    }

    /// Copy of the points at `indices`; `None` slots become padding.
    pub fn select(&self, indices: &[Option<usize>]) -> Self {
        let mut out = Self::empty(indices.len());
        for (slot, index) in indices.iter().enumerate() {
            if let Some(i) = *index {
                out.x[slot] = self.x[i];
                out.y[slot] = self.y[i];
                out.dir_x[slot] = self.dir_x[i];
                out.dir_y[slot] = self.dir_y[i];
                out.types[slot] = self.types[i];
                out.valid[slot] = self.valid[i];
            }
        }
        out
    }
}

/// Traffic-light signals over time.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficLights {
    /// Number of signals.
    pub num_lights: usize,
    /// Number of timesteps per signal.
    pub num_steps: usize,
    /// Stop-point position x (m).
    pub x: Vec<f32>,
    /// Stop-point position y (m).
    pub y: Vec<f32>,
    /// Raw signal-state label.
    pub state: Vec<i32>,
    /// Whether the signal is observed at this timestep.
    pub valid: Vec<bool>,
}

impl TrafficLights {
    /// All-invalid signals with the "unknown" state label `0`.
    pub fn empty(num_lights: usize, num_steps: usize) -> Self {
        let n = num_lights * num_steps;
        Self {
            num_lights,
            num_steps,
            x: vec![0.0; n],
            y: vec![0.0; n],
            state: vec![0; n],
            valid: vec![false; n],
        }
    }

    /// Flat index of `(light, t)`.
    pub fn index(&self, light: usize, t: usize) -> usize {
        light * self.num_steps + t
    }

    /// Check that every buffer has the declared size.
    pub fn check(&self) -> Result<(), ExtractError> {
        let n = self.num_lights * self.num_steps;
        check_len("traffic_lights", "x", self.x.len(), n)?;
        check_len("traffic_lights", "y", self.y.len(), n)?;
        check_len("traffic_lights", "state", self.state.len(), n)?;
        check_len("traffic_lights", "valid", self.valid.len(), n)
    }
}

/// Candidate route geometries for the self-driving car.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePaths {
    /// Number of candidate paths.
    pub num_paths: usize,
    /// Waypoints per path.
    pub num_points_per_path: usize,
    /// Waypoint x (m), path-major.
    pub x: Vec<f32>,
    /// Waypoint y (m), path-major.
    pub y: Vec<f32>,
    /// Per-waypoint validity.
    pub valid: Vec<bool>,
    /// Whether each path is a plausible route for the ego vehicle.
    pub on_route: Vec<bool>,
}

impl CandidatePaths {
    /// No candidate paths at all.
    pub fn none() -> Self {
        Self::empty(0, 0)
    }

    /// All-invalid paths of the given size.
    pub fn empty(num_paths: usize, num_points_per_path: usize) -> Self {
        let n = num_paths * num_points_per_path;
        Self {
            num_paths,
            num_points_per_path,
            x: vec![0.0; n],
            y: vec![0.0; n],
            valid: vec![false; n],
            on_route: vec![false; num_paths],
        }
    }

    /// Flat index of `(path, point)`.
    pub fn index(&self, path: usize, point: usize) -> usize {
        path * self.num_points_per_path + point
    }

    /// Check that every buffer has the declared size.
    pub fn check(&self) -> Result<(), ExtractError> {
        let n = self.num_paths * self.num_points_per_path;
        check_len("paths", "x", self.x.len(), n)?;
        check_len("paths", "y", self.y.len(), n)?;
        check_len("paths", "valid", self.valid.len(), n)?;
        check_len("paths", "on_route", self.on_route.len(), self.num_paths)
    }
}

/// A bounded, ego-centred view of a simulator state.
///
/// Produced by a state projector: positions are expressed in the SDC
/// frame at the current timestep, object and traffic-light histories are
/// limited to the observation window, and the roadgraph is prefiltered.
#[derive(Clone, Debug, PartialEq)]
pub struct SdcObservation {
    /// Objects over the observation window; `sdc_index` marks the ego.
    pub objects: ObjectTrajectories,
    /// Prefiltered roadgraph points.
    pub roadgraph: RoadgraphPoints,
    /// Traffic lights over the observation window.
    pub traffic_lights: TrafficLights,
    /// Candidate paths for the ego.
    pub paths: CandidatePaths,
}

impl SdcObservation {
    /// Check every component.
    pub fn check(&self) -> Result<(), ExtractError> {
        self.objects.check()?;
        self.roadgraph.check()?;
        self.traffic_lights.check()?;
        self.paths.check()?;
        if self.objects.num_steps == 0 {
            return Err(ExtractError::InvalidState {
                reason: "observation has an empty history window".into(),
            });
        }
        Ok(())
    }
}
