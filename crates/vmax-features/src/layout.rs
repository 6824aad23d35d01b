//! Flat observation layout.
//!
//! [`ObservationLayout`] is compiled once per extractor and is the only
//! place segment widths are computed. Packing checks every group tensor
//! against it and unpacking slices by it, so the two directions cannot
//! drift apart.
//!
//! Segments are laid out contiguously in the fixed order ego, other
//! objects, roadgraph, traffic lights, path target.

use std::fmt;
use std::ops::Range;

use vmax_core::Shape;

use crate::catalog::{FeatureGroup, FieldKey};
use crate::categories::CategoryTables;
use crate::config::ExtractorConfig;
use crate::normalize::feature_size;

/// One contiguous slice of the flat observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// The ego vehicle's object features.
    Ego,
    /// The `k` nearest other objects.
    Objects,
    /// Reduced roadgraph points.
    Roadgraph,
    /// The nearest traffic lights.
    TrafficLights,
    /// Resampled path target.
    PathTarget,
}

impl Segment {
    /// Every segment, in flat order.
    pub const ALL: [Segment; 5] = [
        Self::Ego,
        Self::Objects,
        Self::Roadgraph,
        Self::TrafficLights,
        Self::PathTarget,
    ];

    /// Segment name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ego => "ego",
            Self::Objects => "objects",
            Self::Roadgraph => "roadgraph",
            Self::TrafficLights => "traffic_lights",
            Self::PathTarget => "path_target",
        }
    }

    /// Feature group the segment's channels come from.
    pub fn group(self) -> FeatureGroup {
        match self {
            Self::Ego | Self::Objects => FeatureGroup::Objects,
            Self::Roadgraph => FeatureGroup::Roadgraph,
            Self::TrafficLights => FeatureGroup::TrafficLights,
            Self::PathTarget => FeatureGroup::PathTarget,
        }
    }

    /// Whether the last channel is a validity bit.
    pub fn is_masked(self) -> bool {
        self.group().is_masked()
    }

    fn position(self) -> usize {
        match self {
            Self::Ego => 0,
            Self::Objects => 1,
            Self::Roadgraph => 2,
            Self::TrafficLights => 3,
            Self::PathTarget => 4,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved field keys of every group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupKeys {
    /// Object keys (shared by ego and others).
    pub objects: Vec<FieldKey>,
    /// Roadgraph keys.
    pub roadgraph: Vec<FieldKey>,
    /// Traffic-light keys.
    pub traffic_lights: Vec<FieldKey>,
    /// Path-target keys.
    pub path_target: Vec<FieldKey>,
}

impl GroupKeys {
    /// Keys of one group.
    pub fn get(&self, group: FeatureGroup) -> &[FieldKey] {
        match group {
            FeatureGroup::Objects => &self.objects,
            FeatureGroup::Roadgraph => &self.roadgraph,
            FeatureGroup::TrafficLights => &self.traffic_lights,
            FeatureGroup::PathTarget => &self.path_target,
        }
    }
}

/// Shape and placement of one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLayout {
    /// Which segment.
    pub segment: Segment,
    /// Entity/time axes of the unflattened segment, e.g. `[k, T]`.
    pub entity_shape: Shape,
    /// Channels per entity, including the validity bit.
    pub channels: usize,
    /// Offset of the segment in the flat observation.
    pub offset: usize,
    /// Number of flat elements.
    pub width: usize,
}

impl SegmentLayout {
    /// Flat range of the segment.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }

    /// Unflattened shape: entity axes plus the channel axis.
    pub fn shape(&self) -> Shape {
        let mut shape = self.entity_shape.clone();
        shape.push(self.channels);
        shape
    }

    /// Shape of the tensor the packer produces for this segment.
    ///
    /// Identical to [`shape`](Self::shape) except for the ego segment,
    /// which is packed without its leading unit axis.
    pub fn packed_shape(&self) -> Shape {
        let mut shape = self.shape();
        if self.segment == Segment::Ego {
            shape.remove(0);
        }
        shape
    }
}

/// Compiled layout of the flat observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationLayout {
    segments: Vec<SegmentLayout>,
    total_width: usize,
}

/// Sum of the channel counts of `keys`.
pub fn group_channels(keys: &[FieldKey], tables: &CategoryTables) -> usize {
    keys.iter().map(|&k| feature_size(k, tables)).sum()
}

impl ObservationLayout {
    /// Compile the layout of a validated configuration.
    pub fn compile(config: &ExtractorConfig, keys: &GroupKeys, tables: &CategoryTables) -> Self {
        let t = config.obs_past_num_steps;
        let object_channels = group_channels(&keys.objects, tables);
        let specs: [(Segment, Vec<usize>, usize); 5] = [
            (Segment::Ego, vec![1, t], object_channels),
            (
                Segment::Objects,
                vec![config.objects.num_closest_objects, t],
                object_channels,
            ),
            (
                Segment::Roadgraph,
                vec![config.roadgraphs.roadgraph_top_k],
                group_channels(&keys.roadgraph, tables),
            ),
            (
                Segment::TrafficLights,
                vec![config.traffic_lights.num_closest_traffic_lights, t],
                group_channels(&keys.traffic_lights, tables),
            ),
            (
                Segment::PathTarget,
                vec![config.path_target.num_points],
                group_channels(&keys.path_target, tables),
            ),
        ];

        let mut offset = 0;
        let mut segments = Vec::with_capacity(specs.len());
        for (segment, entity_shape, channels) in specs {
            let width = entity_shape.iter().product::<usize>() * channels;
            segments.push(SegmentLayout {
                segment,
                entity_shape: entity_shape.into_iter().collect(),
                channels,
                offset,
                width,
            });
            offset += width;
        }
        Self {
            segments,
            total_width: offset,
        }
    }

    /// Layout of one segment.
    pub fn segment(&self, segment: Segment) -> &SegmentLayout {
        &self.segments[segment.position()]
    }

    /// Every segment, in flat order.
    pub fn segments(&self) -> &[SegmentLayout] {
        &self.segments
    }

    /// Unflattened shape of one segment, without batch axes.
    pub fn segment_shape(&self, segment: Segment) -> Shape {
        self.segment(segment).shape()
    }

    /// Width of the flat observation.
    pub fn total_width(&self) -> usize {
        self.total_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve_features;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn full_config() -> (ExtractorConfig, GroupKeys) {
        let mut cfg = ExtractorConfig::default();
        cfg.obs_past_num_steps = 5;
        cfg.objects.features = names(&["waypoints", "velocity", "yaw", "size", "valid"]);
        cfg.objects.num_closest_objects = 8;
        cfg.roadgraphs.features = names(&["waypoints", "direction", "types", "valid"]);
        cfg.roadgraphs.roadgraph_top_k = 200;
        cfg.traffic_lights.features = names(&["waypoints", "state", "valid"]);
        cfg.traffic_lights.num_closest_traffic_lights = 5;
        cfg.path_target.features = names(&["waypoints"]);
        let keys = GroupKeys {
            objects: resolve_features(FeatureGroup::Objects, &cfg.objects.features).unwrap(),
            roadgraph: resolve_features(FeatureGroup::Roadgraph, &cfg.roadgraphs.features).unwrap(),
            traffic_lights: resolve_features(
                FeatureGroup::TrafficLights,
                &cfg.traffic_lights.features,
            )
            .unwrap(),
            path_target: resolve_features(FeatureGroup::PathTarget, &cfg.path_target.features)
                .unwrap(),
        };
        (cfg, keys)
    }

    #[test]
    fn widths_and_offsets_are_contiguous() {
        let (cfg, keys) = full_config();
        let layout = ObservationLayout::compile(&cfg, &keys, &CategoryTables::default());

        // xy 2 + vel 2 + yaw 1 + length 1 + width 1 + valid 1
        assert_eq!(layout.segment(Segment::Ego).channels, 8);
        assert_eq!(layout.segment(Segment::Ego).width, 5 * 8);
        assert_eq!(layout.segment(Segment::Objects).width, 8 * 5 * 8);
        // xy 2 + dir 2 + types 7 + valid 1
        assert_eq!(layout.segment(Segment::Roadgraph).width, 200 * 12);
        // xy 2 + state 4 + valid 1
        assert_eq!(layout.segment(Segment::TrafficLights).width, 5 * 5 * 7);
        assert_eq!(layout.segment(Segment::PathTarget).width, 10 * 2);

        let mut offset = 0;
        for seg in layout.segments() {
            assert_eq!(seg.offset, offset);
            offset += seg.width;
        }
        assert_eq!(layout.total_width(), offset);
        assert_eq!(offset, 40 + 320 + 2400 + 175 + 20);
    }

    #[test]
    fn disabled_groups_have_zero_width() {
        let cfg = ExtractorConfig::default();
        let layout = ObservationLayout::compile(&cfg, &GroupKeys::default(), &CategoryTables::default());
        assert_eq!(layout.total_width(), 0);
        assert_eq!(layout.segment_shape(Segment::Objects).as_slice(), &[8, 1, 0]);
    }

    #[test]
    fn ego_packed_shape_drops_unit_axis() {
        let (cfg, keys) = full_config();
        let layout = ObservationLayout::compile(&cfg, &keys, &CategoryTables::default());
        let ego = layout.segment(Segment::Ego);
        assert_eq!(ego.shape().as_slice(), &[1, 5, 8]);
        assert_eq!(ego.packed_shape().as_slice(), &[5, 8]);
        let others = layout.segment(Segment::Objects);
        assert_eq!(others.packed_shape(), others.shape());
    }

    #[test]
    fn only_path_target_is_unmasked() {
        for seg in Segment::ALL {
            assert_eq!(seg.is_masked(), seg != Segment::PathTarget);
        }
    }
}
