//! Feature extraction for V-Max driving observations.
//!
//! Turns a structured, variable-shaped simulator state into the fixed
//! width flat vector a policy network consumes, and splits such vectors
//! back into per-group features and validity masks. The forward path is
//! projection, selection, normalization and packing; the inverse path
//! uses the same compiled [`ObservationLayout`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod extractor;
pub mod layout;
pub mod normalize;
pub mod path_target;
pub mod projection;
pub mod roadgraph;
pub mod selector;

pub use buffer::FeatureBuffer;
pub use catalog::{FeatureGroup, FeatureName, FieldKey, FieldKind};
pub use categories::{CategoryTable, CategoryTables};
pub use config::{
    ExtractorConfig, MetersBox, ObjectsConfig, PathShortfall, PathTargetConfig, RoadgraphsConfig,
    TrafficLightsConfig,
};
pub use extractor::{
    ExtractedFeatures, FeaturesExtractor, Unflattened, UnflattenedFeatures, UnflattenedMasks,
};
pub use layout::{GroupKeys, ObservationLayout, Segment, SegmentLayout};
pub use normalize::{feature_size, RawField};
pub use projection::{EgoFrameProjector, ProjectionWindow, StateProjector};
pub use roadgraph::{KeepAll, RoadgraphFilter, TypeFilter};
pub use selector::Selection;
