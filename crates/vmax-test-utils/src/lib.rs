//! Test utilities and mock types for V-Max development.
//!
//! Provides [`MockSimulatorState`], an owned implementation of
//! [`SimulatorState`], and a [`ScenarioBuilder`] for assembling small
//! hand-written scenarios. Seeded random scenarios live in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use vmax_core::{CandidatePaths, ObjectTrajectories, RoadgraphPoints, SimulatorState, TrafficLights};

/// Owned simulator state.
///
/// Every component is public so tests can poke at individual values
/// after building.
#[derive(Clone, Debug, PartialEq)]
pub struct MockSimulatorState {
    pub objects: ObjectTrajectories,
    pub roadgraph: RoadgraphPoints,
    pub traffic_lights: TrafficLights,
    pub paths: CandidatePaths,
    pub current_timestep: usize,
}

impl SimulatorState for MockSimulatorState {
    fn objects(&self) -> &ObjectTrajectories {
        &self.objects
    }

    fn roadgraph_points(&self) -> &RoadgraphPoints {
        &self.roadgraph
    }

    fn traffic_lights(&self) -> &TrafficLights {
        &self.traffic_lights
    }

    fn candidate_paths(&self) -> &CandidatePaths {
        &self.paths
    }

    fn current_timestep(&self) -> usize {
        self.current_timestep
    }
}

struct PlannedObject {
    start: (f32, f32),
    velocity: (f32, f32),
    object_type: i32,
    invalid_steps: Vec<usize>,
}

struct PlannedPath {
    points: Vec<(f32, f32)>,
    on_route: bool,
}

/// Builder for small constant-velocity scenarios.
///
/// Objects move in a straight line from `start` at `velocity` metres per
/// step and are valid at every step unless invalidated. Traffic lights
/// hold one state for the whole log.
pub struct ScenarioBuilder {
    num_steps: usize,
    current_timestep: usize,
    sdc_index: usize,
    objects: Vec<PlannedObject>,
    roadgraph: RoadgraphPoints,
    lights: Vec<(f32, f32, i32)>,
    paths: Vec<PlannedPath>,
}

impl ScenarioBuilder {
    /// Empty scenario with a log of `num_steps` steps, "now" at the last.
    pub fn new(num_steps: usize) -> Self {
        Self {
            num_steps,
            current_timestep: num_steps.saturating_sub(1),
            sdc_index: 0,
            objects: Vec::new(),
            roadgraph: RoadgraphPoints::default(),
            lights: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn current_timestep(mut self, t: usize) -> Self {
        self.current_timestep = t;
        self
    }

    /// Mark object `index` as the self-driving car.
    pub fn sdc(mut self, index: usize) -> Self {
        self.sdc_index = index;
        self
    }

    pub fn object(mut self, start: (f32, f32), velocity: (f32, f32), object_type: i32) -> Self {
        self.objects.push(PlannedObject {
            start,
            velocity,
            object_type,
            invalid_steps: Vec::new(),
        });
        self
    }

    /// Mark the most recently added object invalid at `step`.
    pub fn invalid_at(mut self, step: usize) -> Self {
        if let Some(obj) = self.objects.last_mut() {
            obj.invalid_steps.push(step);
        }
        self
    }

    pub fn roadgraph_point(mut self, x: f32, y: f32, dir: (f32, f32), road_type: i32) -> Self {
        self.roadgraph.x.push(x);
        self.roadgraph.y.push(y);
        self.roadgraph.dir_x.push(dir.0);
        self.roadgraph.dir_y.push(dir.1);
        self.roadgraph.types.push(road_type);
        self.roadgraph.valid.push(true);
        self
    }

    /// `n` evenly spaced points from `from` to `to`.
    pub fn polyline(mut self, from: (f32, f32), to: (f32, f32), n: usize, road_type: i32) -> Self {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let norm = dx.hypot(dy).max(f32::EPSILON);
        let dir = (dx / norm, dy / norm);
        let steps = n.saturating_sub(1).max(1) as f32;
        for i in 0..n {
            let f = i as f32 / steps;
            self = self.roadgraph_point(from.0 + f * dx, from.1 + f * dy, dir, road_type);
        }
        self
    }

    pub fn traffic_light(mut self, x: f32, y: f32, state: i32) -> Self {
        self.lights.push((x, y, state));
        self
    }

    /// Candidate path; shorter paths are padded with invalid waypoints.
    pub fn path(mut self, points: Vec<(f32, f32)>, on_route: bool) -> Self {
        self.paths.push(PlannedPath { points, on_route });
        self
    }

    pub fn build(self) -> MockSimulatorState {
        let t = self.num_steps;
        let mut objects = ObjectTrajectories::empty(self.objects.len(), t);
        for (o, plan) in self.objects.iter().enumerate() {
            objects.object_types[o] = plan.object_type;
            let yaw = plan.velocity.1.atan2(plan.velocity.0);
            for step in 0..t {
                let i = objects.index(o, step);
                objects.x[i] = plan.start.0 + plan.velocity.0 * step as f32;
                objects.y[i] = plan.start.1 + plan.velocity.1 * step as f32;
                objects.vel_x[i] = plan.velocity.0;
                objects.vel_y[i] = plan.velocity.1;
                objects.yaw[i] = yaw;
                objects.length[i] = 4.5;
                objects.width[i] = 2.0;
                objects.valid[i] = !plan.invalid_steps.contains(&step);
            }
        }
        objects.sdc_index = self.sdc_index;

        let mut traffic_lights = TrafficLights::empty(self.lights.len(), t);
        for (l, &(x, y, state)) in self.lights.iter().enumerate() {
            for step in 0..t {
                let i = traffic_lights.index(l, step);
                traffic_lights.x[i] = x;
                traffic_lights.y[i] = y;
                traffic_lights.state[i] = state;
                traffic_lights.valid[i] = true;
            }
        }

        let len = self.paths.iter().map(|p| p.points.len()).max().unwrap_or(0);
        let mut paths = CandidatePaths::empty(self.paths.len(), len);
        for (p, plan) in self.paths.iter().enumerate() {
            paths.on_route[p] = plan.on_route;
            for (w, &(x, y)) in plan.points.iter().enumerate() {
                let i = paths.index(p, w);
                paths.x[i] = x;
                paths.y[i] = y;
                paths.valid[i] = true;
            }
        }

        MockSimulatorState {
            objects,
            roadgraph: self.roadgraph,
            traffic_lights,
            paths,
            current_timestep: self.current_timestep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_consistent_state() {
        let state = ScenarioBuilder::new(3)
            .object((0.0, 0.0), (1.0, 0.0), 1)
            .object((10.0, 2.0), (0.0, 0.0), 2)
            .invalid_at(0)
            .polyline((0.0, 0.0), (9.0, 0.0), 4, 1)
            .traffic_light(20.0, 0.0, 3)
            .path(vec![(0.0, 0.0), (1.0, 0.0)], true)
            .path(vec![(0.0, 0.0)], false)
            .build();
        state.objects.check().unwrap();
        state.roadgraph.check().unwrap();
        state.traffic_lights.check().unwrap();
        state.paths.check().unwrap();
        assert_eq!(state.current_timestep(), 2);
        assert_eq!(state.objects.x[state.objects.index(0, 2)], 2.0);
        assert!(!state.objects.valid[state.objects.index(1, 0)]);
        assert_eq!(state.roadgraph.x, vec![0.0, 3.0, 6.0, 9.0]);
        assert!(!state.paths.valid[state.paths.index(1, 1)]);
    }
}
