//! Feature catalog: configurable feature names and the field keys they
//! expand to.
//!
//! Configuration lists catalog names such as `"size"`; each name expands
//! to one or more [`FieldKey`]s (`length`, `width`). Names are resolved
//! once, when an extractor is built, so an unknown or misplaced name is a
//! [`ConfigError`] at construction and never a lookup failure later.

use std::fmt;

use vmax_core::ConfigError;

/// A single normalized field of the flat observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    /// Planar position `(x, y)`.
    Xy,
    /// Planar velocity `(vx, vy)`.
    VelXy,
    /// Planar speed.
    Speed,
    /// Heading.
    Yaw,
    /// Bounding-box length.
    Length,
    /// Bounding-box width.
    Width,
    /// Validity bit.
    Valid,
    /// Roadgraph direction `(dx, dy)`.
    DirXy,
    /// Roadgraph map-element type.
    Types,
    /// Traffic-light state.
    State,
    /// Object type.
    ObjectTypes,
}

/// How a field key is normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Two-channel distance-like value, divided by the normalization radius.
    Linear,
    /// Label mapped through a category table and one-hot expanded.
    Categorical,
    /// Single-channel value passed through unchanged.
    Scalar,
    /// Boolean validity, emitted as `1.0` / `0.0`.
    Flag,
}

impl FieldKey {
    /// Field name as used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Xy => "xy",
            Self::VelXy => "vel_xy",
            Self::Speed => "speed",
            Self::Yaw => "yaw",
            Self::Length => "length",
            Self::Width => "width",
            Self::Valid => "valid",
            Self::DirXy => "dir_xy",
            Self::Types => "types",
            Self::State => "state",
            Self::ObjectTypes => "object_types",
        }
    }

    /// Normalization policy of this key.
    pub fn kind(self) -> FieldKind {
        match self {
            Self::Xy | Self::VelXy | Self::DirXy => FieldKind::Linear,
            Self::Types | Self::State | Self::ObjectTypes => FieldKind::Categorical,
            Self::Speed | Self::Yaw | Self::Length | Self::Width => FieldKind::Scalar,
            Self::Valid => FieldKind::Flag,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A name that may appear in a group's `features` list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureName {
    /// Positions.
    Waypoints,
    /// Velocities.
    Velocity,
    /// Speeds.
    Speed,
    /// Headings.
    Yaw,
    /// Length and width.
    Size,
    /// Validity bit.
    Valid,
    /// Roadgraph directions.
    Direction,
    /// Roadgraph types.
    Types,
    /// Traffic-light states.
    State,
    /// Object types.
    ObjectTypes,
}

impl FeatureName {
    /// Every catalog name.
    pub const ALL: [FeatureName; 10] = [
        Self::Waypoints,
        Self::Velocity,
        Self::Speed,
        Self::Yaw,
        Self::Size,
        Self::Valid,
        Self::Direction,
        Self::Types,
        Self::State,
        Self::ObjectTypes,
    ];

    /// Parse a configuration string.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Configuration string of this name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waypoints => "waypoints",
            Self::Velocity => "velocity",
            Self::Speed => "speed",
            Self::Yaw => "yaw",
            Self::Size => "size",
            Self::Valid => "valid",
            Self::Direction => "direction",
            Self::Types => "types",
            Self::State => "state",
            Self::ObjectTypes => "object_types",
        }
    }

    /// Field keys this name expands to, in layout order.
    pub fn field_keys(self) -> &'static [FieldKey] {
        match self {
            Self::Waypoints => &[FieldKey::Xy],
            Self::Velocity => &[FieldKey::VelXy],
            Self::Speed => &[FieldKey::Speed],
            Self::Yaw => &[FieldKey::Yaw],
            Self::Size => &[FieldKey::Length, FieldKey::Width],
            Self::Valid => &[FieldKey::Valid],
            Self::Direction => &[FieldKey::DirXy],
            Self::Types => &[FieldKey::Types],
            Self::State => &[FieldKey::State],
            Self::ObjectTypes => &[FieldKey::ObjectTypes],
        }
    }
}

/// One of the four configurable feature groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    /// Dynamic objects (ego and neighbours).
    Objects,
    /// Roadgraph points.
    Roadgraph,
    /// Traffic lights.
    TrafficLights,
    /// Resampled path target.
    PathTarget,
}

impl FeatureGroup {
    /// Configuration section name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Roadgraph => "roadgraphs",
            Self::TrafficLights => "traffic_lights",
            Self::PathTarget => "path_target",
        }
    }

    /// Whether `feature` may be listed for this group.
    pub fn allows(self, feature: FeatureName) -> bool {
        use FeatureName::*;
        match self {
            Self::Objects => matches!(
                feature,
                Waypoints | Velocity | Speed | Yaw | Size | Valid | ObjectTypes
            ),
            Self::Roadgraph => matches!(feature, Waypoints | Direction | Types | Valid),
            Self::TrafficLights => matches!(feature, Waypoints | State | Valid),
            Self::PathTarget => matches!(feature, Waypoints),
        }
    }

    /// Whether the group's last channel is a validity bit.
    pub fn is_masked(self) -> bool {
        !matches!(self, Self::PathTarget)
    }
}

/// Resolve a group's configured names into ordered field keys.
///
/// Masked groups that list any feature must list `valid` last: the
/// unpacker reads the last channel as the mask.
pub fn resolve_features(group: FeatureGroup, names: &[String]) -> Result<Vec<FieldKey>, ConfigError> {
    let mut seen: Vec<FeatureName> = Vec::with_capacity(names.len());
    for name in names {
        let feature = FeatureName::parse(name).ok_or_else(|| ConfigError::UnknownFeature {
            group: group.name(),
            name: name.clone(),
        })?;
        if !group.allows(feature) {
            return Err(ConfigError::FeatureNotInGroup {
                group: group.name(),
                name: name.clone(),
            });
        }
        if seen.contains(&feature) {
            return Err(ConfigError::DuplicateFeature {
                group: group.name(),
                name: name.clone(),
            });
        }
        seen.push(feature);
    }

    if group.is_masked() && seen.last().is_some_and(|&f| f != FeatureName::Valid) {
        return Err(ConfigError::MissingValidChannel {
            group: group.name(),
        });
    }

    Ok(seen
        .into_iter()
        .flat_map(|f| f.field_keys().iter().copied())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn size_expands_to_length_and_width() {
        let keys = resolve_features(FeatureGroup::Objects, &names(&["size", "valid"])).unwrap();
        assert_eq!(keys, vec![FieldKey::Length, FieldKey::Width, FieldKey::Valid]);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = resolve_features(FeatureGroup::Objects, &names(&["colour"])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFeature { group: "objects", .. }));
    }

    #[test]
    fn name_outside_group_catalog_is_rejected() {
        let err =
            resolve_features(FeatureGroup::TrafficLights, &names(&["velocity", "valid"])).unwrap_err();
        assert!(matches!(err, ConfigError::FeatureNotInGroup { .. }));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = resolve_features(
            FeatureGroup::Roadgraph,
            &names(&["waypoints", "waypoints", "valid"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFeature { .. }));
    }

    #[test]
    fn masked_group_requires_valid_last() {
        let err =
            resolve_features(FeatureGroup::Roadgraph, &names(&["valid", "waypoints"])).unwrap_err();
        assert_eq!(err, ConfigError::MissingValidChannel { group: "roadgraphs" });
    }

    #[test]
    fn path_target_needs_no_valid_channel() {
        let keys = resolve_features(FeatureGroup::PathTarget, &names(&["waypoints"])).unwrap();
        assert_eq!(keys, vec![FieldKey::Xy]);
    }

    #[test]
    fn empty_list_disables_group() {
        assert!(resolve_features(FeatureGroup::Objects, &[]).unwrap().is_empty());
    }

    #[test]
    fn every_name_round_trips_through_parse() {
        for feature in FeatureName::ALL {
            assert_eq!(FeatureName::parse(feature.as_str()), Some(feature));
        }
    }
}
