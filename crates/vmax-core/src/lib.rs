//! Core types and traits for V-Max observation pipelines.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the explicit-shape [`Tensor`], the simulator-state value types, the
//! read-only [`SimulatorState`] trait, and the error types shared by the
//! rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod state;
pub mod tensor;
pub mod traits;

pub use error::{ConfigError, ExtractError};
pub use state::{CandidatePaths, ObjectTrajectories, RoadgraphPoints, SdcObservation, TrafficLights};
pub use tensor::{BoolTensor, FeatureTensor, Shape, Tensor};
pub use traits::SimulatorState;
