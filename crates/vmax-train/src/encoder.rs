//! Encoder registry and the input shapes an encoder is built against.

use std::fmt;
use std::str::FromStr;

use vmax_features::{ObservationLayout, Segment};

use crate::error::TrainError;

/// Observation encoders known to the training scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncoderKind {
    /// Plain multilayer perceptron over the flat observation.
    Mlp,
    /// Perceiver cross-attention encoder.
    Perceiver,
    /// Wayformer early-fusion encoder.
    Wayformer,
    /// Motion Transformer encoder.
    Mtr,
    /// MGAIL encoder.
    Mgail,
    /// No encoder; the policy consumes the flat observation directly.
    None,
}

impl EncoderKind {
    /// Every encoder, `None` last.
    pub const ALL: [EncoderKind; 6] = [
        Self::Mlp,
        Self::Perceiver,
        Self::Wayformer,
        Self::Mtr,
        Self::Mgail,
        Self::None,
    ];

    /// Lower-case registry name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mlp => "mlp",
            Self::Perceiver => "perceiver",
            Self::Wayformer => "wayformer",
            Self::Mtr => "mtr",
            Self::Mgail => "mgail",
            Self::None => "none",
        }
    }

    /// Whether the encoder needs the unflattened observation.
    pub fn needs_unflatten(self) -> bool {
        self != Self::None
    }
}

impl FromStr for EncoderKind {
    type Err = TrainError;

    /// Case-insensitive lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| TrainError::UnknownEncoder { name: s.to_string() })
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared input of one segment, without batch axes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentInput {
    /// Which segment.
    pub segment: Segment,
    /// Feature tensor shape after the validity bit is split off.
    pub feature_shape: Vec<usize>,
    /// Mask shape, for masked segments.
    pub mask_shape: Option<Vec<usize>>,
}

/// Input shapes an encoder is constructed against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderInputs {
    /// One entry per segment, in flat order.
    pub segments: Vec<SegmentInput>,
    /// Width of the flat observation.
    pub flat_width: usize,
}

impl EncoderInputs {
    /// Read the shapes off a compiled layout.
    pub fn from_layout(layout: &ObservationLayout) -> Self {
        let segments = layout
            .segments()
            .iter()
            .map(|seg| {
                let entity: Vec<usize> = seg.entity_shape.to_vec();
                let masked = seg.segment.is_masked();
                let mut feature_shape = entity.clone();
                feature_shape.push(if masked {
                    seg.channels.saturating_sub(1)
                } else {
                    seg.channels
                });
                SegmentInput {
                    segment: seg.segment,
                    feature_shape,
                    mask_shape: masked.then_some(entity),
                }
            })
            .collect();
        Self {
            segments,
            flat_width: layout.total_width(),
        }
    }

    /// Input of one segment.
    pub fn segment(&self, segment: Segment) -> Option<&SegmentInput> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmax_features::{ExtractorConfig, FeaturesExtractor};

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("MLP".parse::<EncoderKind>().unwrap(), EncoderKind::Mlp);
        assert_eq!("Wayformer".parse::<EncoderKind>().unwrap(), EncoderKind::Wayformer);
        assert_eq!("none".parse::<EncoderKind>().unwrap(), EncoderKind::None);
        for kind in EncoderKind::ALL {
            assert_eq!(kind.name().parse::<EncoderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_encoder_is_error() {
        let err = "transformer".parse::<EncoderKind>().unwrap_err();
        assert!(matches!(err, TrainError::UnknownEncoder { ref name } if name == "transformer"));
        assert_eq!(err.to_string(), "unknown encoder: transformer");
    }

    #[test]
    fn inputs_follow_layout() {
        let mut cfg = ExtractorConfig::default();
        cfg.obs_past_num_steps = 3;
        cfg.objects.features = vec!["waypoints".into(), "valid".into()];
        cfg.objects.num_closest_objects = 4;
        cfg.path_target.features = vec!["waypoints".into()];
        let extractor = FeaturesExtractor::new(cfg).unwrap();
        let inputs = EncoderInputs::from_layout(extractor.layout());

        assert_eq!(inputs.flat_width, extractor.layout().total_width());
        let ego = inputs.segment(Segment::Ego).unwrap();
        assert_eq!(ego.feature_shape, vec![1, 3, 2]);
        assert_eq!(ego.mask_shape, Some(vec![1, 3]));
        let objects = inputs.segment(Segment::Objects).unwrap();
        assert_eq!(objects.feature_shape, vec![4, 3, 2]);
        let roadgraph = inputs.segment(Segment::Roadgraph).unwrap();
        assert_eq!(roadgraph.feature_shape, vec![1000, 0]);
        let path = inputs.segment(Segment::PathTarget).unwrap();
        assert_eq!(path.feature_shape, vec![10, 2]);
        assert_eq!(path.mask_shape, None);
    }
}
