//! Per-group field buffers.

use indexmap::IndexMap;

use vmax_core::{ExtractError, FeatureTensor};

use crate::catalog::FieldKey;

/// Insertion-ordered normalized fields of one feature group.
///
/// Every field shares the same leading (entity/time) shape; only the
/// trailing channel count differs. [`stack`](Self::stack) concatenates
/// the fields along the channel axis in insertion order.
#[derive(Clone, Debug, Default)]
pub struct FeatureBuffer {
    fields: IndexMap<FieldKey, FeatureTensor>,
}

impl FeatureBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    ///
    /// Fails if the key is already present or the tensor's leading shape
    /// differs from the fields already held.
    pub fn push(&mut self, key: FieldKey, tensor: FeatureTensor) -> Result<(), ExtractError> {
        if let Some(first) = self.fields.values().next() {
            if first.leading_shape() != tensor.leading_shape() {
                return Err(ExtractError::ShapeMismatch {
                    reason: format!(
                        "field '{key}' has leading shape {:?}, buffer holds {:?}",
                        tensor.leading_shape(),
                        first.leading_shape()
                    ),
                });
            }
        }
        if self.fields.contains_key(&key) {
            return Err(ExtractError::ShapeMismatch {
                reason: format!("field '{key}' appended twice"),
            });
        }
        self.fields.insert(key, tensor);
        Ok(())
    }

    /// Field by key.
    pub fn get(&self, key: FieldKey) -> Option<&FeatureTensor> {
        self.fields.get(&key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.keys().copied()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field has been appended.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sum of the fields' channel counts.
    pub fn channels(&self) -> usize {
        self.fields.values().map(|t| t.last_dim()).sum()
    }

    /// Concatenate every field along the channel axis.
    ///
    /// `leading` is the entity/time shape the group is expected to have;
    /// an empty buffer yields a zero-channel tensor of that shape.
    pub fn stack(&self, leading: &[usize]) -> Result<FeatureTensor, ExtractError> {
        if self.fields.is_empty() {
            let mut shape = leading.to_vec();
            shape.push(0);
            return Ok(FeatureTensor::zeros(&shape));
        }
        let parts: Vec<&FeatureTensor> = self.fields.values().collect();
        let stacked = FeatureTensor::concat_last(&parts)?;
        if stacked.leading_shape() != leading {
            return Err(ExtractError::ShapeMismatch {
                reason: format!(
                    "stacked leading shape {:?}, expected {leading:?}",
                    stacked.leading_shape()
                ),
            });
        }
        Ok(stacked)
    }
}
