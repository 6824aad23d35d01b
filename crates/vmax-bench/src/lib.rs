//! Benchmark profiles for the V-Max observation pipeline.
//!
//! - [`reference_config`]: the feature set commonly used for training
//! - [`stress_config`]: large neighbour and roadgraph budgets
//! - [`reference_scenarios`]: deterministic dense scenarios via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use vmax_core::SimulatorState;
use vmax_features::{ExtractorConfig, FeaturesExtractor, PathShortfall};
use vmax_test_utils::fixtures::{random_scenario, RandomScenario};
use vmax_test_utils::MockSimulatorState;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Five history steps, 8 neighbours, 200 roadgraph points, 5 lights and
/// a 10-point path target.
pub fn reference_config() -> ExtractorConfig {
    let mut cfg = ExtractorConfig::default();
    cfg.obs_past_num_steps = 5;
    cfg.objects.features = names(&["waypoints", "velocity", "yaw", "size", "valid"]);
    cfg.objects.num_closest_objects = 8;
    cfg.roadgraphs.features = names(&["waypoints", "direction", "types", "valid"]);
    cfg.roadgraphs.roadgraph_top_k = 200;
    cfg.roadgraphs.interval = 2;
    cfg.roadgraphs.meters_box = Some(vmax_features::MetersBox {
        front: 50,
        back: 10,
        left: 20,
        right: 20,
    });
    cfg.traffic_lights.features = names(&["waypoints", "state", "valid"]);
    cfg.traffic_lights.num_closest_traffic_lights = 5;
    cfg.path_target.features = names(&["waypoints"]);
    cfg.path_target.shortfall = PathShortfall::ZeroPad;
    cfg
}

/// Same features as [`reference_config`] with 11 history steps, 32
/// neighbours and 1000 roadgraph points.
pub fn stress_config() -> ExtractorConfig {
    let mut cfg = reference_config();
    cfg.obs_past_num_steps = 11;
    cfg.objects.num_closest_objects = 32;
    cfg.roadgraphs.roadgraph_top_k = 1000;
    cfg.roadgraphs.interval = 1;
    cfg.roadgraphs.meters_box = None;
    cfg.traffic_lights.num_closest_traffic_lights = 16;
    cfg
}

/// `count` scenarios with up to 64 objects and 5000 roadgraph points.
pub fn reference_scenarios(seed: u64, count: usize) -> Vec<MockSimulatorState> {
    let bounds = RandomScenario {
        num_steps: 91,
        max_objects: 64,
        max_roadgraph_points: 5000,
        max_traffic_lights: 16,
        max_paths: 4,
        path_len: 200,
        extent: 120.0,
    };
    (0..count as u64)
        .map(|i| random_scenario(seed.wrapping_add(i), &bounds))
        .collect()
}

/// Borrow scenarios as trait objects for batch extraction.
pub fn as_states(scenarios: &[MockSimulatorState]) -> Vec<&dyn SimulatorState> {
    scenarios.iter().map(|s| s as &dyn SimulatorState).collect()
}

/// Build an extractor for a profile.
pub fn extractor(config: ExtractorConfig) -> Result<FeaturesExtractor, vmax_core::ConfigError> {
    FeaturesExtractor::new(config)
}
