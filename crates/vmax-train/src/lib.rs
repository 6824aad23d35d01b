//! Training-harness utilities for V-Max.
//!
//! Everything a training script needs around the observation pipeline
//! that is not learning itself: logging setup, the encoder registry,
//! run directory naming, metric logging, config splitting and
//! parameter checkpoints.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod cli;
pub mod encoder;
pub mod error;
pub mod hparams;
pub mod logging;
pub mod metrics;
pub mod run_config;
pub mod run_dir;

pub use checkpoint::{load_params, save_params};
pub use cli::parse_bool;
pub use encoder::{EncoderInputs, EncoderKind, SegmentInput};
pub use error::TrainError;
pub use hparams::format_hyperparameters;
pub use metrics::{log_metrics, JsonLinesSink, MetricsSink, Progress};
pub use run_config::{build_config_dicts, observation_config, EnvConfig, RunConfig};
pub use run_dir::{resolve_output_dir, RunNaming};
