//! V-Max: observation features for reinforcement learning on driving
//! scenarios.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the V-Max sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use vmax::prelude::*;
//!
//! let mut config = ExtractorConfig::default();
//! config.obs_past_num_steps = 2;
//! config.objects.features = vec!["waypoints".into(), "valid".into()];
//! config.objects.num_closest_objects = 4;
//! config.path_target.features = vec!["waypoints".into()];
//! let extractor = FeaturesExtractor::new(config).unwrap();
//!
//! // ego 2x3 + objects 4x2x3 + path target 10x2
//! assert_eq!(extractor.layout().total_width(), 6 + 24 + 20);
//!
//! let batch = FeatureTensor::zeros(&[8, 50]);
//! let out = extractor.unflatten(&batch).unwrap();
//! assert_eq!(out.features.objects.shape(), &[8, 4, 2, 2]);
//! assert_eq!(out.masks.objects.shape(), &[8, 4, 2]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vmax-core` | Tensors, simulator state views, errors |
//! | [`features`] | `vmax-features` | Projection, selection, normalization, packing |
//! | [`train`] | `vmax-train` | Run directories, metrics, config handling |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Tensors, state types and errors (`vmax-core`).
pub use vmax_core as types;

/// The observation pipeline (`vmax-features`).
///
/// Build a [`features::FeaturesExtractor`] from an
/// [`features::ExtractorConfig`], extract and flatten states, and split
/// flat batches back with [`features::FeaturesExtractor::unflatten`].
pub use vmax_features as features;

/// Training-harness utilities (`vmax-train`).
pub use vmax_train as train;

/// Common imports for typical V-Max usage.
pub mod prelude {
    // Core types and traits
    pub use vmax_core::{
        BoolTensor, CandidatePaths, FeatureTensor, ObjectTrajectories, RoadgraphPoints,
        SdcObservation, SimulatorState, Tensor, TrafficLights,
    };

    // Errors
    pub use vmax_core::{ConfigError, ExtractError};

    // Pipeline
    pub use vmax_features::{
        CategoryTables, ExtractedFeatures, ExtractorConfig, FeaturesExtractor, ObservationLayout,
        PathShortfall, RoadgraphFilter, Segment, StateProjector, Unflattened,
    };

    // Training
    pub use vmax_train::{EncoderInputs, EncoderKind, TrainError};
}
