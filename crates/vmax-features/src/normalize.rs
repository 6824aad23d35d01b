//! Field normalization.
//!
//! Gathered raw values become network-ready channels here. The policy
//! is fixed per [`FieldKind`]: linear keys are divided by the group's
//! radius, categorical keys are one-hot encoded through a
//! [`CategoryTable`](crate::categories::CategoryTable), scalars pass through and validity becomes
//! `1.0`/`0.0`. Every output carries a trailing channel axis.

use vmax_core::{BoolTensor, ExtractError, FeatureTensor, Tensor};

use crate::catalog::{FieldKey, FieldKind};
use crate::categories::CategoryTables;

/// A gathered, not yet normalized field.
#[derive(Clone, Debug, PartialEq)]
pub enum RawField {
    /// Numeric values. Linear keys carry a trailing axis of 2; scalar
    /// keys carry none.
    Numeric(FeatureTensor),
    /// Raw categorical labels; `None` marks a padding slot.
    Labels(Tensor<Option<i32>>),
    /// Validity bits.
    Mask(BoolTensor),
}

impl RawField {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Labels(_) => "labels",
            Self::Mask(_) => "mask",
        }
    }
}

/// Number of channels `key` contributes.
pub fn feature_size(key: FieldKey, tables: &CategoryTables) -> usize {
    match key.kind() {
        FieldKind::Linear => 2,
        FieldKind::Scalar | FieldKind::Flag => 1,
        FieldKind::Categorical => tables.table(key).map_or(0, |t| t.cardinality()),
    }
}

/// Normalize one gathered field.
pub fn normalize(
    raw: RawField,
    key: FieldKey,
    max_range: f32,
    tables: &CategoryTables,
) -> Result<FeatureTensor, ExtractError> {
    match (key.kind(), raw) {
        (FieldKind::Linear, RawField::Numeric(values)) => {
            if values.last_dim() != 2 || values.ndim() == 0 {
                return Err(ExtractError::ShapeMismatch {
                    reason: format!("field '{key}' needs 2 channels, got shape {:?}", values.shape()),
                });
            }
            Ok(scale(values, max_range))
        }
        (FieldKind::Scalar, RawField::Numeric(values)) => Ok(values.expand_last()),
        (FieldKind::Flag, RawField::Mask(mask)) => {
            Ok(mask.map(|&b| if b { 1.0f32 } else { 0.0 }).expand_last())
        }
        (FieldKind::Categorical, RawField::Labels(labels)) => one_hot(&labels, key, tables),
        (kind, raw) => Err(ExtractError::ShapeMismatch {
            reason: format!(
                "field '{key}' ({kind:?}) cannot be built from {} values",
                raw.variant_name()
            ),
        }),
    }
}

/// Rescale path coordinates by the normalization radius.
pub fn normalize_path(xy: FeatureTensor, max_range: f32) -> FeatureTensor {
    scale(xy, max_range)
}

fn scale(values: FeatureTensor, max_range: f32) -> FeatureTensor {
    values.map(|v| v / max_range)
}

fn one_hot(
    labels: &Tensor<Option<i32>>,
    key: FieldKey,
    tables: &CategoryTables,
) -> Result<FeatureTensor, ExtractError> {
    let Some(table) = tables.table(key) else {
        return Err(ExtractError::ShapeMismatch {
            reason: format!("field '{key}' has no category table"),
        });
    };
    let width = table.cardinality();
    let mut data = vec![0.0f32; labels.len() * width];
    for (row, label) in labels.data().iter().enumerate() {
        let Some(label) = *label else { continue };
        let class = table.class_of(label).ok_or(ExtractError::UnknownLabel {
            field: key.name(),
            label,
        })?;
        data[row * width + class] = 1.0;
    }
    let mut shape = labels.shape().to_vec();
    shape.push(width);
    FeatureTensor::new(&shape, data)
}
