//! State projection: from a full simulator state to a bounded,
//! ego-centred [`SdcObservation`].

use std::f32::consts::PI;
use std::fmt;

use vmax_core::{
    CandidatePaths, ExtractError, ObjectTrajectories, RoadgraphPoints, SdcObservation,
    SimulatorState, TrafficLights,
};

use crate::config::MetersBox;
use crate::selector::select;

/// Bounds of a projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectionWindow {
    /// History steps kept per object and traffic light.
    pub obs_past_num_steps: usize,
    /// Maximum number of roadgraph points handed to reduction.
    pub roadgraph_prefilter: usize,
    /// Optional ego-frame box applied before the prefilter.
    pub meters_box: Option<MetersBox>,
}

/// Produces the bounded observation view the extractor consumes.
pub trait StateProjector: fmt::Debug + Send + Sync {
    /// Project `state` into an ego-centred observation.
    fn project(
        &self,
        state: &dyn SimulatorState,
        window: &ProjectionWindow,
    ) -> Result<SdcObservation, ExtractError>;
}

/// Rigid transform into the SDC frame at the current step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EgoFrame {
    x: f32,
    y: f32,
    yaw: f32,
    cos: f32,
    sin: f32,
}

impl EgoFrame {
    /// Frame with origin `(x, y)` and heading `yaw`.
    pub fn new(x: f32, y: f32, yaw: f32) -> Self {
        Self {
            x,
            y,
            yaw,
            cos: yaw.cos(),
            sin: yaw.sin(),
        }
    }

    /// Transform a world position.
    pub fn point(&self, x: f32, y: f32) -> (f32, f32) {
        self.vector(x - self.x, y - self.y)
    }

    /// Rotate a world vector.
    pub fn vector(&self, x: f32, y: f32) -> (f32, f32) {
        (self.cos * x + self.sin * y, -self.sin * x + self.cos * y)
    }

    /// Heading relative to the frame, wrapped to `[-pi, pi)`.
    pub fn heading(&self, yaw: f32) -> f32 {
        wrap_angle(yaw - self.yaw)
    }
}

/// Wrap an angle to `[-pi, pi)`.
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Ego-frame projector.
///
/// Keeps the last `obs_past_num_steps` steps ending at the current
/// step (earlier steps are padded invalid), expresses everything in the
/// SDC frame, moves the SDC to object index 0 and prefilters the
/// roadgraph.
#[derive(Clone, Copy, Debug, Default)]
pub struct EgoFrameProjector;

impl EgoFrameProjector {
    fn objects(
        objects: &ObjectTrajectories,
        frame: &EgoFrame,
        steps: &[Option<usize>],
    ) -> ObjectTrajectories {
        let order: Vec<usize> = std::iter::once(objects.sdc_index)
            .chain((0..objects.num_objects).filter(|&i| i != objects.sdc_index))
            .collect();
        let mut out = ObjectTrajectories::empty(objects.num_objects, steps.len());
        for (slot, &obj) in order.iter().enumerate() {
            out.object_types[slot] = objects.object_types[obj];
            for (t, step) in steps.iter().enumerate() {
                let Some(step) = *step else { continue };
                let src = objects.index(obj, step);
                let dst = out.index(slot, t);
                let (x, y) = frame.point(objects.x[src], objects.y[src]);
                let (vx, vy) = frame.vector(objects.vel_x[src], objects.vel_y[src]);
                out.x[dst] = x;
                out.y[dst] = y;
                out.vel_x[dst] = vx;
                out.vel_y[dst] = vy;
                out.yaw[dst] = frame.heading(objects.yaw[src]);
                out.length[dst] = objects.length[src];
                out.width[dst] = objects.width[src];
                out.valid[dst] = objects.valid[src];
            }
        }
        out.sdc_index = 0;
        out
    }

    fn traffic_lights(
        lights: &TrafficLights,
        frame: &EgoFrame,
        steps: &[Option<usize>],
    ) -> TrafficLights {
        let mut out = TrafficLights::empty(lights.num_lights, steps.len());
        for light in 0..lights.num_lights {
            for (t, step) in steps.iter().enumerate() {
                let Some(step) = *step else { continue };
                let src = lights.index(light, step);
                let dst = out.index(light, t);
                let (x, y) = frame.point(lights.x[src], lights.y[src]);
                out.x[dst] = x;
                out.y[dst] = y;
                out.state[dst] = lights.state[src];
                out.valid[dst] = lights.valid[src];
            }
        }
        out
    }

    fn roadgraph(
        points: &RoadgraphPoints,
        frame: &EgoFrame,
        window: &ProjectionWindow,
    ) -> Result<RoadgraphPoints, ExtractError> {
        let mut local = points.clone();
        for i in 0..points.len() {
            let (x, y) = frame.point(points.x[i], points.y[i]);
            let (dx, dy) = frame.vector(points.dir_x[i], points.dir_y[i]);
            local.x[i] = x;
            local.y[i] = y;
            local.dir_x[i] = dx;
            local.dir_y[i] = dy;
            if let Some(meters_box) = window.meters_box {
                local.valid[i] &= meters_box.contains(x, y);
            }
        }
        let keep = window.roadgraph_prefilter.min(local.len());
        if keep == local.len() {
            return Ok(local);
        }
        let distances: Vec<f32> = local.x.iter().zip(&local.y).map(|(x, y)| x.hypot(*y)).collect();
        let selection = select(&distances, &local.valid, keep)?;
        Ok(local.select(selection.slots()))
    }

    fn paths(paths: &CandidatePaths, frame: &EgoFrame) -> CandidatePaths {
        let mut out = paths.clone();
        for i in 0..paths.x.len() {
            let (x, y) = frame.point(paths.x[i], paths.y[i]);
            out.x[i] = x;
            out.y[i] = y;
        }
        out
    }
}

impl StateProjector for EgoFrameProjector {
    fn project(
        &self,
        state: &dyn SimulatorState,
        window: &ProjectionWindow,
    ) -> Result<SdcObservation, ExtractError> {
        let objects = state.objects();
        let lights = state.traffic_lights();
        objects.check()?;
        lights.check()?;
        state.roadgraph_points().check()?;
        state.candidate_paths().check()?;

        let now = state.current_timestep();
        if now >= objects.num_steps {
            return Err(ExtractError::InvalidState {
                reason: format!(
                    "current timestep {now} outside a log of {} steps",
                    objects.num_steps
                ),
            });
        }
        if lights.num_lights > 0 && now >= lights.num_steps {
            return Err(ExtractError::InvalidState {
                reason: format!(
                    "current timestep {now} outside a traffic-light log of {} steps",
                    lights.num_steps
                ),
            });
        }

        let t = window.obs_past_num_steps;
        let steps: Vec<Option<usize>> = (0..t)
            .map(|i| (now + 1 + i).checked_sub(t))
            .collect();

        let sdc = objects.index(objects.sdc_index, now);
        let frame = EgoFrame::new(objects.x[sdc], objects.y[sdc], objects.yaw[sdc]);

        Ok(SdcObservation {
            objects: Self::objects(objects, &frame, &steps),
            roadgraph: Self::roadgraph(state.roadgraph_points(), &frame, window)?,
            traffic_lights: Self::traffic_lights(lights, &frame, &steps),
            paths: Self::paths(state.candidate_paths(), &frame),
        })
    }
}
