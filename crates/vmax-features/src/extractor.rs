//! Observation packing and unpacking.
//!
//! [`FeaturesExtractor`] is built once from an [`ExtractorConfig`]:
//! feature names are resolved to [`FieldKey`]s and the
//! [`ObservationLayout`] is compiled. After that it is immutable and can
//! be shared across threads. Packing turns an [`SdcObservation`] into
//! five group tensors and then a flat vector; unpacking slices a flat
//! tensor back into per-segment features and validity masks using the
//! same layout.

use tracing::{debug, info};

use vmax_core::{
    BoolTensor, ConfigError, ExtractError, FeatureTensor, ObjectTrajectories, RoadgraphPoints,
    SdcObservation, SimulatorState, Tensor, TrafficLights,
};

use crate::buffer::FeatureBuffer;
use crate::catalog::{resolve_features, FeatureGroup, FieldKey};
use crate::categories::CategoryTables;
use crate::config::ExtractorConfig;
use crate::layout::{GroupKeys, ObservationLayout, Segment};
use crate::normalize::{normalize, RawField};
use crate::path_target;
use crate::projection::{EgoFrameProjector, ProjectionWindow, StateProjector};
use crate::roadgraph::{reduce, KeepAll, RoadgraphFilter};
use crate::selector::{select, select_anchored};

/// The five packed group tensors of one observation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedFeatures {
    /// Ego vehicle, `[T, C_obj]`.
    pub ego: FeatureTensor,
    /// Other objects, `[k, T, C_obj]`.
    pub objects: FeatureTensor,
    /// Roadgraph points, `[K, C_rg]`.
    pub roadgraph: FeatureTensor,
    /// Traffic lights, `[k_tl, T, C_tl]`.
    pub traffic_lights: FeatureTensor,
    /// Path target, `[P, C_path]`.
    pub path_target: FeatureTensor,
}

impl ExtractedFeatures {
    /// Tensor of one segment.
    pub fn segment(&self, segment: Segment) -> &FeatureTensor {
        match segment {
            Segment::Ego => &self.ego,
            Segment::Objects => &self.objects,
            Segment::Roadgraph => &self.roadgraph,
            Segment::TrafficLights => &self.traffic_lights,
            Segment::PathTarget => &self.path_target,
        }
    }
}

/// Unpacked features, validity channel removed. Leading axes are the
/// batch axes of the flat input.
#[derive(Clone, Debug, PartialEq)]
pub struct UnflattenedFeatures {
    /// `[..., 1, T, C_obj - 1]`.
    pub ego: FeatureTensor,
    /// `[..., k, T, C_obj - 1]`.
    pub objects: FeatureTensor,
    /// `[..., K, C_rg - 1]`.
    pub roadgraph: FeatureTensor,
    /// `[..., k_tl, T, C_tl - 1]`.
    pub traffic_lights: FeatureTensor,
    /// `[..., P, C_path]`.
    pub path_target: FeatureTensor,
}

/// Validity masks of the masked segments.
#[derive(Clone, Debug, PartialEq)]
pub struct UnflattenedMasks {
    /// `[..., 1, T]`.
    pub ego: BoolTensor,
    /// `[..., k, T]`.
    pub objects: BoolTensor,
    /// `[..., K]`.
    pub roadgraph: BoolTensor,
    /// `[..., k_tl, T]`.
    pub traffic_lights: BoolTensor,
}

/// Result of [`FeaturesExtractor::unflatten`].
#[derive(Clone, Debug, PartialEq)]
pub struct Unflattened {
    /// Per-segment features.
    pub features: UnflattenedFeatures,
    /// Per-segment validity.
    pub masks: UnflattenedMasks,
}

/// Configured observation packer/unpacker.
#[derive(Debug)]
pub struct FeaturesExtractor {
    config: ExtractorConfig,
    keys: GroupKeys,
    tables: CategoryTables,
    layout: ObservationLayout,
    projector: Box<dyn StateProjector>,
    roadgraph_filter: Box<dyn RoadgraphFilter>,
}

/// Gather `num_steps` values per slot from entity-major storage.
///
/// `read` receives the flat index `entity * num_steps + t`; `None` slots
/// are filled with `pad`.
fn gather_steps<T: Clone>(
    slots: &[Option<usize>],
    num_steps: usize,
    pad: T,
    mut read: impl FnMut(usize) -> T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(slots.len() * num_steps);
    for slot in slots {
        match *slot {
            Some(entity) => out.extend((0..num_steps).map(|t| read(entity * num_steps + t))),
            None => out.extend(std::iter::repeat_n(pad.clone(), num_steps)),
        }
    }
    out
}

fn numeric(leading: &[usize], data: Vec<f32>) -> Result<RawField, ExtractError> {
    Ok(RawField::Numeric(FeatureTensor::new(leading, data)?))
}

fn planar(
    slots: &[Option<usize>],
    num_steps: usize,
    a: &[f32],
    b: &[f32],
) -> Result<RawField, ExtractError> {
    let data: Vec<f32> = gather_steps(slots, num_steps, (0.0, 0.0), |i| (a[i], b[i]))
        .into_iter()
        .flat_map(|(x, y)| [x, y])
        .collect();
    numeric(&[slots.len(), num_steps, 2], data)
}

fn not_in_group(key: FieldKey, group: FeatureGroup) -> ExtractError {
    ExtractError::ShapeMismatch {
        reason: format!("field '{key}' is not available for {}", group.name()),
    }
}

fn object_field(
    objects: &ObjectTrajectories,
    key: FieldKey,
    slots: &[Option<usize>],
) -> Result<RawField, ExtractError> {
    let t = objects.num_steps;
    let leading = [slots.len(), t];
    let scalar = |values: &[f32]| numeric(&leading, gather_steps(slots, t, 0.0, |i| values[i]));
    match key {
        FieldKey::Xy => planar(slots, t, &objects.x, &objects.y),
        FieldKey::VelXy => planar(slots, t, &objects.vel_x, &objects.vel_y),
        FieldKey::Speed => numeric(&leading, gather_steps(slots, t, 0.0, |i| objects.speed(i))),
        FieldKey::Yaw => scalar(objects.yaw.as_slice()),
        FieldKey::Length => scalar(objects.length.as_slice()),
        FieldKey::Width => scalar(objects.width.as_slice()),
        FieldKey::Valid => Ok(RawField::Mask(BoolTensor::new(
            &leading,
            gather_steps(slots, t, false, |i| objects.valid[i]),
        )?)),
        FieldKey::ObjectTypes => Ok(RawField::Labels(Tensor::new(
            &leading,
            gather_steps(slots, t, None, |i| Some(objects.object_types[i / t])),
        )?)),
        other => Err(not_in_group(other, FeatureGroup::Objects)),
    }
}

fn roadgraph_field(
    points: &RoadgraphPoints,
    key: FieldKey,
    slots: &[Option<usize>],
) -> Result<RawField, ExtractError> {
    let leading = [slots.len()];
    let raw = match key {
        FieldKey::Xy => planar(slots, 1, &points.x, &points.y)?,
        FieldKey::DirXy => planar(slots, 1, &points.dir_x, &points.dir_y)?,
        FieldKey::Valid => RawField::Mask(BoolTensor::new(
            &leading,
            gather_steps(slots, 1, false, |i| points.valid[i]),
        )?),
        FieldKey::Types => RawField::Labels(Tensor::new(
            &leading,
            gather_steps(slots, 1, None, |i| Some(points.types[i])),
        )?),
        other => return Err(not_in_group(other, FeatureGroup::Roadgraph)),
    };
    // Planar gathers carry a unit step axis; roadgraph points have none.
    match raw {
        RawField::Numeric(t) => numeric(&[slots.len(), 2], t.into_data()),
        other => Ok(other),
    }
}

fn traffic_light_field(
    lights: &TrafficLights,
    key: FieldKey,
    slots: &[Option<usize>],
    num_steps: usize,
) -> Result<RawField, ExtractError> {
    let leading = [slots.len(), num_steps];
    match key {
        FieldKey::Xy => planar(slots, num_steps, &lights.x, &lights.y),
        FieldKey::Valid => Ok(RawField::Mask(BoolTensor::new(
            &leading,
            gather_steps(slots, num_steps, false, |i| lights.valid[i]),
        )?)),
        FieldKey::State => Ok(RawField::Labels(Tensor::new(
            &leading,
            gather_steps(slots, num_steps, None, |i| Some(lights.state[i])),
        )?)),
        other => Err(not_in_group(other, FeatureGroup::TrafficLights)),
    }
}

impl FeaturesExtractor {
    /// Build an extractor with the default category tables.
    pub fn new(config: ExtractorConfig) -> Result<Self, ConfigError> {
        Self::with_tables(config, CategoryTables::default())
    }

    /// Build an extractor with custom category tables.
    pub fn with_tables(config: ExtractorConfig, tables: CategoryTables) -> Result<Self, ConfigError> {
        config.validate()?;
        let keys = GroupKeys {
            objects: resolve_features(FeatureGroup::Objects, &config.objects.features)?,
            roadgraph: resolve_features(FeatureGroup::Roadgraph, &config.roadgraphs.features)?,
            traffic_lights: resolve_features(
                FeatureGroup::TrafficLights,
                &config.traffic_lights.features,
            )?,
            path_target: resolve_features(FeatureGroup::PathTarget, &config.path_target.features)?,
        };
        let layout = ObservationLayout::compile(&config, &keys, &tables);
        for seg in layout.segments() {
            debug!(
                segment = seg.segment.name(),
                shape = ?seg.shape(),
                offset = seg.offset,
                width = seg.width,
                "observation segment"
            );
        }
        info!(total_width = layout.total_width(), "compiled observation layout");
        Ok(Self {
            config,
            keys,
            tables,
            layout,
            projector: Box::new(EgoFrameProjector),
            roadgraph_filter: Box::new(KeepAll),
        })
    }

    /// Replace the roadgraph filter hook.
    pub fn with_roadgraph_filter(mut self, filter: impl RoadgraphFilter + 'static) -> Self {
        self.roadgraph_filter = Box::new(filter);
        self
    }

    /// Replace the state projector used by [`extract_state`](Self::extract_state).
    pub fn with_projector(mut self, projector: impl StateProjector + 'static) -> Self {
        self.projector = Box::new(projector);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The compiled layout.
    pub fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    /// Category tables in use.
    pub fn tables(&self) -> &CategoryTables {
        &self.tables
    }

    /// Resolved field keys of one group.
    pub fn feature_keys(&self, group: FeatureGroup) -> &[FieldKey] {
        self.keys.get(group)
    }

    /// Projection bounds derived from the configuration.
    pub fn window(&self) -> ProjectionWindow {
        ProjectionWindow {
            obs_past_num_steps: self.config.obs_past_num_steps,
            roadgraph_prefilter: self.config.roadgraphs.prefilter(),
            meters_box: self.config.roadgraphs.meters_box,
        }
    }

    /// Project a simulator state, then extract.
    pub fn extract_state(&self, state: &dyn SimulatorState) -> Result<ExtractedFeatures, ExtractError> {
        let obs = self.projector.project(state, &self.window())?;
        self.extract(&obs)
    }

    /// Pack an observation into its five group tensors.
    pub fn extract(&self, obs: &SdcObservation) -> Result<ExtractedFeatures, ExtractError> {
        obs.check()?;
        let t = self.config.obs_past_num_steps;
        if obs.objects.num_steps != t {
            return Err(ExtractError::InvalidState {
                reason: format!(
                    "objects carry {} steps, extractor expects {t}",
                    obs.objects.num_steps
                ),
            });
        }
        if obs.traffic_lights.num_lights > 0 && obs.traffic_lights.num_steps != t {
            return Err(ExtractError::InvalidState {
                reason: format!(
                    "traffic lights carry {} steps, extractor expects {t}",
                    obs.traffic_lights.num_steps
                ),
            });
        }

        let (ego, objects) = self.object_features(&obs.objects)?;
        Ok(ExtractedFeatures {
            ego,
            objects,
            roadgraph: self.roadgraph_features(&obs.roadgraph)?,
            traffic_lights: self.traffic_light_features(&obs.traffic_lights)?,
            path_target: self.path_target_features(obs)?,
        })
    }

    fn build_group(
        &self,
        keys: &[FieldKey],
        leading: &[usize],
        mut raw: impl FnMut(FieldKey) -> Result<RawField, ExtractError>,
    ) -> Result<FeatureTensor, ExtractError> {
        let max_range = self.config.max_meters();
        let mut buffer = FeatureBuffer::new();
        for &key in keys {
            let field = normalize(raw(key)?, key, max_range, &self.tables)?;
            buffer.push(key, field)?;
        }
        buffer.stack(leading)
    }

    fn object_features(
        &self,
        objects: &ObjectTrajectories,
    ) -> Result<(FeatureTensor, FeatureTensor), ExtractError> {
        let k = self.config.objects.num_closest_objects;
        let t = objects.num_steps;
        let latest = t - 1;
        let (distances, valid): (Vec<f32>, Vec<bool>) = (0..objects.num_objects)
            .map(|o| {
                let i = objects.index(o, latest);
                (objects.x[i].hypot(objects.y[i]), objects.valid[i])
            })
            .unzip();
        let selection = select_anchored(&distances, &valid, k, objects.sdc_index)?;
        if selection.padding() > 0 {
            debug!(
                requested = k,
                available = objects.num_objects - 1,
                "padding object slots"
            );
        }
        let stacked = self.build_group(&self.keys.objects, &[k + 1, t], |key| {
            object_field(objects, key, selection.slots())
        })?;
        Ok((stacked.row(0)?, stacked.rows(1..k + 1)?))
    }

    fn roadgraph_features(&self, points: &RoadgraphPoints) -> Result<FeatureTensor, ExtractError> {
        let cfg = &self.config.roadgraphs;
        let reduced = reduce(
            points,
            cfg.interval,
            cfg.roadgraph_top_k,
            self.roadgraph_filter.as_ref(),
        )?;
        // Reduced points are already in slot order.
        let slots: Vec<Option<usize>> = reduced
            .selection
            .slots()
            .iter()
            .enumerate()
            .map(|(slot, index)| index.map(|_| slot))
            .collect();
        self.build_group(&self.keys.roadgraph, &[cfg.roadgraph_top_k], |key| {
            roadgraph_field(&reduced.points, key, &slots)
        })
    }

    fn traffic_light_features(&self, lights: &TrafficLights) -> Result<FeatureTensor, ExtractError> {
        let k = self.config.traffic_lights.num_closest_traffic_lights;
        let t = self.config.obs_past_num_steps;
        let (distances, valid): (Vec<f32>, Vec<bool>) = (0..lights.num_lights)
            .map(|l| {
                let i = lights.index(l, t - 1);
                (lights.x[i].hypot(lights.y[i]), lights.valid[i])
            })
            .unzip();
        let selection = select(&distances, &valid, k)?;
        self.build_group(&self.keys.traffic_lights, &[k, t], |key| {
            traffic_light_field(lights, key, selection.slots(), t)
        })
    }

    fn path_target_features(&self, obs: &SdcObservation) -> Result<FeatureTensor, ExtractError> {
        let cfg = &self.config.path_target;
        if self.keys.path_target.is_empty() {
            return Ok(FeatureTensor::zeros(&[cfg.num_points, 0]));
        }
        path_target::resolve(&obs.paths, cfg, self.config.max_meters())
    }

    /// Concatenate packed group tensors into the flat observation.
    ///
    /// Every tensor is checked against the layout first.
    pub fn flatten(&self, features: &ExtractedFeatures) -> Result<Vec<f32>, ExtractError> {
        let mut flat = Vec::with_capacity(self.layout.total_width());
        for seg in self.layout.segments() {
            let tensor = features.segment(seg.segment);
            let expected = seg.packed_shape();
            if tensor.shape() != expected.as_slice() {
                return Err(ExtractError::LayoutMismatch {
                    segment: seg.segment.name(),
                    expected: expected.to_vec(),
                    actual: tensor.shape().to_vec(),
                });
            }
            flat.extend_from_slice(tensor.data());
        }
        Ok(flat)
    }

    /// Extract and flatten an observation.
    pub fn extract_flat(&self, obs: &SdcObservation) -> Result<Vec<f32>, ExtractError> {
        self.flatten(&self.extract(obs)?)
    }

    /// Project, extract and flatten several states into `[B, W]`.
    pub fn extract_batch(&self, states: &[&dyn SimulatorState]) -> Result<FeatureTensor, ExtractError> {
        let width = self.layout.total_width();
        let mut data = Vec::with_capacity(states.len() * width);
        for state in states {
            let features = self.extract_state(*state)?;
            data.extend(self.flatten(&features)?);
        }
        FeatureTensor::new(&[states.len(), width], data)
    }

    /// Split a flat observation tensor `[..., W]` back into segments.
    pub fn unflatten(&self, flat: &FeatureTensor) -> Result<Unflattened, ExtractError> {
        if flat.ndim() == 0 {
            return Err(ExtractError::ShapeMismatch {
                reason: "cannot unflatten a rank-0 tensor".into(),
            });
        }
        let width = flat.last_dim();
        if width != self.layout.total_width() {
            return Err(ExtractError::WidthMismatch {
                expected: self.layout.total_width(),
                actual: width,
            });
        }
        let batch = flat.leading_shape();
        let slice = |segment: Segment| -> Result<FeatureTensor, ExtractError> {
            let seg = self.layout.segment(segment);
            let mut shape = batch.to_vec();
            shape.extend_from_slice(&seg.shape());
            flat.slice_last(seg.range())?.reshape(&shape)
        };

        let (ego, ego_mask) = slice(Segment::Ego)?.split_mask()?;
        let (objects, objects_mask) = slice(Segment::Objects)?.split_mask()?;
        let (roadgraph, roadgraph_mask) = slice(Segment::Roadgraph)?.split_mask()?;
        let (traffic_lights, traffic_lights_mask) = slice(Segment::TrafficLights)?.split_mask()?;
        let path_target = slice(Segment::PathTarget)?;

        Ok(Unflattened {
            features: UnflattenedFeatures {
                ego,
                objects,
                roadgraph,
                traffic_lights,
                path_target,
            },
            masks: UnflattenedMasks {
                ego: ego_mask,
                objects: objects_mask,
                roadgraph: roadgraph_mask,
                traffic_lights: traffic_lights_mask,
            },
        })
    }
}
