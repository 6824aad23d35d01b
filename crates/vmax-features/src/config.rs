//! Extractor configuration.
//!
//! [`ExtractorConfig`] is plain data: every section has a [`Default`]
//! and every field a serde default, so a partial JSON document loads
//! into a complete configuration. [`validate`](ExtractorConfig::validate)
//! checks numeric ranges; feature names are resolved separately when
//! the extractor is built.

use serde::{Deserialize, Serialize};

use vmax_core::ConfigError;

/// Prefilter size used when no metres box is configured.
pub const DEFAULT_ROADGRAPH_PREFILTER: usize = 2000;

/// Full configuration of a [`FeaturesExtractor`](crate::FeaturesExtractor).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Number of history steps per object and traffic light (`T`).
    pub obs_past_num_steps: usize,
    /// Object group.
    pub objects: ObjectsConfig,
    /// Roadgraph group.
    pub roadgraphs: RoadgraphsConfig,
    /// Traffic-light group.
    pub traffic_lights: TrafficLightsConfig,
    /// Path-target group.
    pub path_target: PathTargetConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            obs_past_num_steps: 1,
            objects: ObjectsConfig::default(),
            roadgraphs: RoadgraphsConfig::default(),
            traffic_lights: TrafficLightsConfig::default(),
            path_target: PathTargetConfig::default(),
        }
    }
}

/// Object group configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectsConfig {
    /// Catalog names, `valid` last.
    pub features: Vec<String>,
    /// Number of neighbours kept, excluding the ego vehicle.
    pub num_closest_objects: usize,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            num_closest_objects: 8,
        }
    }
}

/// Axis-aligned prefilter box around the ego vehicle, in metres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetersBox {
    /// Extent ahead of the ego vehicle.
    pub front: usize,
    /// Extent behind the ego vehicle.
    pub back: usize,
    /// Extent to the left.
    pub left: usize,
    /// Extent to the right.
    pub right: usize,
}

impl MetersBox {
    /// Whether an ego-frame point lies inside the box (inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x <= self.front as f32
            && x >= -(self.back as f32)
            && y <= self.left as f32
            && y >= -(self.right as f32)
    }

    /// Number of roadgraph points kept by the prefilter.
    pub fn area(&self) -> usize {
        (self.front + self.back) * (self.left + self.right)
    }
}

/// Roadgraph group configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadgraphsConfig {
    /// Catalog names, `valid` last.
    pub features: Vec<String>,
    /// Number of points kept after reduction (`K`).
    pub roadgraph_top_k: usize,
    /// Keep only every `interval`-th point.
    pub interval: usize,
    /// Normalization radius in metres, shared by every group.
    pub max_meters: f32,
    /// Optional box prefilter.
    pub meters_box: Option<MetersBox>,
}

impl Default for RoadgraphsConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            roadgraph_top_k: 1000,
            interval: 1,
            max_meters: 50.0,
            meters_box: None,
        }
    }
}

impl RoadgraphsConfig {
    /// Number of points the projector keeps before reduction.
    pub fn prefilter(&self) -> usize {
        match self.meters_box {
            Some(meters_box) => meters_box.area(),
            None => self.roadgraph_top_k.max(DEFAULT_ROADGRAPH_PREFILTER),
        }
    }
}

/// Traffic-light group configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLightsConfig {
    /// Catalog names, `valid` last.
    pub features: Vec<String>,
    /// Number of traffic lights kept.
    pub num_closest_traffic_lights: usize,
}

impl Default for TrafficLightsConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            num_closest_traffic_lights: 16,
        }
    }
}

/// What to do when the selected path is too short for `num_points`
/// resampled waypoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathShortfall {
    /// Fail with [`ExtractError::PathShortfall`](vmax_core::ExtractError::PathShortfall).
    #[default]
    Error,
    /// Pad the missing rows with zeros.
    ZeroPad,
    /// Repeat the last resampled waypoint.
    RepeatLast,
}

/// Path-target group configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTargetConfig {
    /// `["waypoints"]` to enable, empty to disable.
    pub features: Vec<String>,
    /// Number of resampled points (`P`).
    pub num_points: usize,
    /// Stride between resampled points.
    pub points_gap: usize,
    /// Short-path policy.
    pub shortfall: PathShortfall,
}

impl Default for PathTargetConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            num_points: 10,
            points_gap: 5,
            shortfall: PathShortfall::Error,
        }
    }
}

impl ExtractorConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Convert an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Normalization radius shared by every group.
    pub fn max_meters(&self) -> f32 {
        self.roadgraphs.max_meters
    }

    /// Check numeric parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obs_past_num_steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "obs_past_num_steps",
                reason: "must be at least 1".into(),
            });
        }
        let rg = &self.roadgraphs;
        if rg.interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "roadgraphs.interval",
                reason: "must be at least 1".into(),
            });
        }
        if !rg.max_meters.is_finite() || rg.max_meters <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "roadgraphs.max_meters",
                reason: format!("must be finite and positive, got {}", rg.max_meters),
            });
        }
        if let Some(meters_box) = rg.meters_box {
            if meters_box.area() == 0 {
                return Err(ConfigError::InvalidParameter {
                    name: "roadgraphs.meters_box",
                    reason: format!("box {meters_box:?} has zero area"),
                });
            }
        }
        if self.path_target.points_gap == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "path_target.points_gap",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
