//! Canned and seeded scenarios.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::{MockSimulatorState, ScenarioBuilder};

/// Roadgraph labels the default category table knows.
pub const ROADGRAPH_LABELS: [i32; 8] = [1, 2, 6, 7, 15, 17, 18, 19];
/// Traffic-light labels the default category table knows.
pub const TRAFFIC_LIGHT_LABELS: [i32; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Straight two-lane road along x with the SDC at the origin.
///
/// Eleven steps of history, "now" at step 10. Three other vehicles, one
/// pedestrian that only appears halfway through, two lane centres and an
/// edge, one red light ahead and two candidate paths of which the
/// second is on route.
pub fn highway() -> MockSimulatorState {
    ScenarioBuilder::new(11)
        .object((-10.0, 0.0), (1.0, 0.0), 1)
        .object((5.0, 0.0), (1.0, 0.0), 1)
        .object((-20.0, 3.5), (1.5, 0.0), 1)
        .object((30.0, 3.5), (-1.0, 0.0), 1)
        .object((15.0, -6.0), (0.0, 0.5), 2)
        .invalid_at(0)
        .invalid_at(1)
        .invalid_at(2)
        .invalid_at(3)
        .invalid_at(4)
        .polyline((-50.0, 0.0), (50.0, 0.0), 51, 2)
        .polyline((-50.0, 3.5), (50.0, 3.5), 51, 2)
        .polyline((-50.0, -2.0), (50.0, -2.0), 26, 15)
        .traffic_light(20.0, -1.0, 1)
        .path(
            (0..40).map(|i| (-10.0 + i as f32, 3.5)).collect(),
            false,
        )
        .path((0..40).map(|i| (-10.0 + i as f32, 0.0)).collect(), true)
        .build()
}

/// Bounds for [`random_scenario`].
#[derive(Clone, Copy, Debug)]
pub struct RandomScenario {
    pub num_steps: usize,
    pub max_objects: usize,
    pub max_roadgraph_points: usize,
    pub max_traffic_lights: usize,
    pub max_paths: usize,
    pub path_len: usize,
    /// Half-size of the square world, in metres.
    pub extent: f32,
}

impl Default for RandomScenario {
    fn default() -> Self {
        Self {
            num_steps: 11,
            max_objects: 12,
            max_roadgraph_points: 300,
            max_traffic_lights: 6,
            max_paths: 3,
            path_len: 60,
            extent: 80.0,
        }
    }
}

/// Deterministic random scenario.
///
/// There is always at least one object, the SDC, and it is valid at the
/// current step. Every other quantity may be empty; labels are drawn
/// from the known label sets so extraction never fails on them.
pub fn random_scenario(seed: u64, bounds: &RandomScenario) -> MockSimulatorState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let e = bounds.extent;
    let num_steps = bounds.num_steps.max(1);
    let mut builder = ScenarioBuilder::new(num_steps)
        .current_timestep(rng.random_range(0..num_steps));

    let num_objects = rng.random_range(1..=bounds.max_objects.max(1));
    for _ in 0..num_objects {
        builder = builder.object(
            (rng.random_range(-e..e), rng.random_range(-e..e)),
            (rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
            rng.random_range(1..=4),
        );
    }
    let sdc = rng.random_range(0..num_objects);
    builder = builder.sdc(sdc);

    for _ in 0..rng.random_range(0..=bounds.max_roadgraph_points) {
        let angle: f32 = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        builder = builder.roadgraph_point(
            rng.random_range(-e..e),
            rng.random_range(-e..e),
            (angle.cos(), angle.sin()),
            ROADGRAPH_LABELS[rng.random_range(0..ROADGRAPH_LABELS.len())],
        );
    }

    for _ in 0..rng.random_range(0..=bounds.max_traffic_lights) {
        builder = builder.traffic_light(
            rng.random_range(-e..e),
            rng.random_range(-e..e),
            TRAFFIC_LIGHT_LABELS[rng.random_range(0..TRAFFIC_LIGHT_LABELS.len())],
        );
    }

    for _ in 0..rng.random_range(0..=bounds.max_paths) {
        let len = rng.random_range(0..=bounds.path_len);
        let (mut x, mut y) = (rng.random_range(-e..e), rng.random_range(-e..e));
        let heading: f32 = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        let points = (0..len)
            .map(|_| {
                x += heading.cos();
                y += heading.sin();
                (x, y)
            })
            .collect();
        builder = builder.path(points, rng.random_bool(0.5));
    }

    let mut state = builder.build();
    // Sprinkle invalid history but keep the SDC valid now.
    let objects = &mut state.objects;
    for i in 0..objects.valid.len() {
        if rng.random::<f32>() < 0.1 {
            objects.valid[i] = false;
        }
    }
    let now = objects.index(sdc, state.current_timestep);
    objects.valid[now] = true;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmax_core::SimulatorState;

    #[test]
    fn random_scenario_is_deterministic() {
        let bounds = RandomScenario::default();
        assert_eq!(random_scenario(7, &bounds), random_scenario(7, &bounds));
    }

    #[test]
    fn random_scenarios_are_well_formed() {
        let bounds = RandomScenario::default();
        for seed in 0..20 {
            let state = random_scenario(seed, &bounds);
            state.objects.check().unwrap();
            state.roadgraph.check().unwrap();
            state.traffic_lights.check().unwrap();
            state.paths.check().unwrap();
            let objects = state.objects();
            assert!(objects.valid[objects.index(objects.sdc_index, state.current_timestep())]);
        }
    }

    #[test]
    fn highway_has_expected_counts() {
        let state = highway();
        assert_eq!(state.objects.num_objects, 5);
        assert_eq!(state.roadgraph.len(), 128);
        assert_eq!(state.traffic_lights.num_lights, 1);
        assert_eq!(state.paths.num_paths, 2);
        assert_eq!(state.current_timestep, 10);
    }
}
