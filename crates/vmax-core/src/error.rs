//! Error types for the V-Max observation pipeline.
//!
//! Split by lifecycle: [`ConfigError`] is raised while an extractor is
//! being constructed, [`ExtractError`] while a state is being packed or
//! a flat observation is being unpacked.

use std::error::Error;
use std::fmt;

/// Errors detected while validating an extractor configuration.
///
/// Every variant is raised at construction time, never during
/// extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A feature name is not part of the catalog at all.
    UnknownFeature {
        /// Feature group the name was listed under.
        group: &'static str,
        /// The unrecognised name.
        name: String,
    },
    /// A catalog feature that the group does not support.
    FeatureNotInGroup {
        /// Feature group the name was listed under.
        group: &'static str,
        /// The rejected name.
        name: String,
    },
    /// The same feature is listed twice in one group.
    DuplicateFeature {
        /// Feature group.
        group: &'static str,
        /// The repeated name.
        name: String,
    },
    /// A masked group lists features but does not end with `valid`.
    ///
    /// The unpacker reads the last channel of these groups as the
    /// validity bit, so the layout cannot be inverted without it.
    MissingValidChannel {
        /// Feature group.
        group: &'static str,
    },
    /// A numeric parameter is out of its allowed range.
    InvalidParameter {
        /// Dotted option name, e.g. `roadgraphs.interval`.
        name: &'static str,
        /// What went wrong.
        reason: String,
    },
    /// The configuration document could not be parsed.
    Parse {
        /// Parser message.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFeature { group, name } => {
                write!(f, "{group}: unknown feature '{name}'")
            }
            Self::FeatureNotInGroup { group, name } => {
                write!(f, "{group}: feature '{name}' is not available for this group")
            }
            Self::DuplicateFeature { group, name } => {
                write!(f, "{group}: feature '{name}' listed more than once")
            }
            Self::MissingValidChannel { group } => {
                write!(f, "{group}: 'valid' must be the last listed feature")
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter {name}: {reason}")
            }
            Self::Parse { reason } => write!(f, "config parse error: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Errors raised while packing a state or unpacking a flat observation.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractError {
    /// A categorical label is missing from its mapping table.
    UnknownLabel {
        /// Field key being normalized (e.g. `types`).
        field: &'static str,
        /// The raw label value.
        label: i32,
    },
    /// A packed group tensor does not have the shape the layout declares.
    LayoutMismatch {
        /// Segment name.
        segment: &'static str,
        /// Shape declared by the layout.
        expected: Vec<usize>,
        /// Shape actually produced.
        actual: Vec<usize>,
    },
    /// The trailing dimension of a flat observation does not match the
    /// layout's total width.
    WidthMismatch {
        /// Width computed from the layout.
        expected: usize,
        /// Trailing dimension of the input.
        actual: usize,
    },
    /// A tensor operation received incompatible shapes.
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
    /// The selected path is too short to yield the requested number of
    /// target waypoints.
    PathShortfall {
        /// Configured number of target points.
        requested: usize,
        /// Number of points the path could provide.
        available: usize,
    },
    /// The simulator state violates its own structural invariants.
    InvalidState {
        /// Description of the violation.
        reason: String,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLabel { field, label } => {
                write!(f, "label {label} of field '{field}' is not in its mapping table")
            }
            Self::LayoutMismatch {
                segment,
                expected,
                actual,
            } => write!(
                f,
                "segment '{segment}' has shape {actual:?}, layout declares {expected:?}"
            ),
            Self::WidthMismatch { expected, actual } => write!(
                f,
                "flat observation width {actual} does not match layout width {expected}"
            ),
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
            Self::PathShortfall {
                requested,
                available,
            } => write!(
                f,
                "path target needs {requested} points but the selected path yields {available}"
            ),
            Self::InvalidState { reason } => write!(f, "invalid simulator state: {reason}"),
        }
    }
}

impl Error for ExtractError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_group() {
        let err = ConfigError::UnknownFeature {
            group: "objects",
            name: "colour".into(),
        };
        assert_eq!(err.to_string(), "objects: unknown feature 'colour'");
    }

    #[test]
    fn width_mismatch_display() {
        let err = ExtractError::WidthMismatch {
            expected: 10,
            actual: 12,
        };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("10"));
    }
}
