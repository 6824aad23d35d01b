//! Row-major tensors with explicit shapes.
//!
//! [`Tensor`] is the only array type the pipeline passes around. The
//! trailing axis is the feature-channel axis; every leading axis is an
//! entity, time or batch axis. Shape bookkeeping that a numeric-array
//! library would do implicitly is done here explicitly, and every
//! operation that can disagree on shape returns
//! [`ExtractError::ShapeMismatch`] instead of panicking.

use std::ops::Range;

use smallvec::SmallVec;

use crate::error::ExtractError;

/// Shape of a tensor, outermost axis first.
pub type Shape = SmallVec<[usize; 4]>;

/// A dense row-major array of `f32` features.
pub type FeatureTensor = Tensor<f32>;

/// A dense row-major array of validity bits.
pub type BoolTensor = Tensor<bool>;

/// Dense row-major tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T = f32> {
    shape: Shape,
    data: Vec<T>,
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl<T: Clone> Tensor<T> {
    /// Wrap `data` with the given shape.
    ///
    /// Fails if `data.len()` is not the product of `shape`.
    pub fn new(shape: &[usize], data: Vec<T>) -> Result<Self, ExtractError> {
        let expected = element_count(shape);
        if data.len() != expected {
            return Err(ExtractError::ShapeMismatch {
                reason: format!(
                    "shape {shape:?} needs {expected} elements, got {}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            shape: shape.iter().copied().collect(),
            data,
        })
    }

    /// A tensor of the given shape with every element set to `value`.
    pub fn filled(shape: &[usize], value: T) -> Self {
        Self {
            shape: shape.iter().copied().collect(),
            data: vec![value; element_count(shape)],
        }
    }

    /// Shape, outermost axis first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Flat row-major data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consume the tensor, returning its flat data.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the trailing (channel) axis; 1 for a rank-0 tensor.
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }

    /// All axes except the trailing one.
    pub fn leading_shape(&self) -> &[usize] {
        match self.shape.split_last() {
            Some((_, leading)) => leading,
            None => &[],
        }
    }

    /// Reinterpret the data with a new shape of equal element count.
    pub fn reshape(self, shape: &[usize]) -> Result<Self, ExtractError> {
        if element_count(shape) != self.data.len() {
            return Err(ExtractError::ShapeMismatch {
                reason: format!("cannot reshape {:?} into {shape:?}", self.shape.as_slice()),
            });
        }
        Ok(Self {
            shape: shape.iter().copied().collect(),
            data: self.data,
        })
    }

    /// Apply `f` to every element, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Tensor<U> {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Insert a trailing axis of size 1.
    pub fn expand_last(mut self) -> Self {
        self.shape.push(1);
        self
    }

    /// Sub-tensor at index `i` of axis 0 (the axis is removed).
    pub fn row(&self, i: usize) -> Result<Self, ExtractError> {
        let mut sliced = self.rows(i..i + 1)?;
        sliced.shape.remove(0);
        Ok(sliced)
    }

    /// Sub-tensor over `range` of axis 0 (the axis is kept).
    pub fn rows(&self, range: Range<usize>) -> Result<Self, ExtractError> {
        let Some((&outer, inner)) = self.shape.split_first() else {
            return Err(ExtractError::ShapeMismatch {
                reason: "cannot slice rows of a rank-0 tensor".into(),
            });
        };
        if range.start > range.end || range.end > outer {
            return Err(ExtractError::ShapeMismatch {
                reason: format!("row range {range:?} out of bounds for axis of size {outer}"),
            });
        }
        let stride = element_count(inner);
        let data = self.data[range.start * stride..range.end * stride].to_vec();
        let mut shape = Shape::new();
        shape.push(range.end - range.start);
        shape.extend_from_slice(inner);
        Ok(Self { shape, data })
    }

    /// Columns `range` of the trailing axis, for every leading index.
    pub fn slice_last(&self, range: Range<usize>) -> Result<Self, ExtractError> {
        let width = self.last_dim();
        if range.start > range.end || range.end > width {
            return Err(ExtractError::ShapeMismatch {
                reason: format!("channel range {range:?} out of bounds for width {width}"),
            });
        }
        let rows = element_count(self.leading_shape());
        let mut data = Vec::with_capacity(rows * range.len());
        for r in 0..rows {
            let base = r * width;
            data.extend_from_slice(&self.data[base + range.start..base + range.end]);
        }
        let mut shape: Shape = self.leading_shape().iter().copied().collect();
        shape.push(range.len());
        Ok(Self { shape, data })
    }

    /// Concatenate tensors along the trailing axis.
    ///
    /// All parts must share the same leading shape. Channels are laid out
    /// in the order the parts are given.
    pub fn concat_last(parts: &[&Self]) -> Result<Self, ExtractError> {
        let Some(first) = parts.first() else {
            return Err(ExtractError::ShapeMismatch {
                reason: "concat_last needs at least one tensor".into(),
            });
        };
        let leading = first.leading_shape();
        for part in parts {
            if part.ndim() == 0 || part.leading_shape() != leading {
                return Err(ExtractError::ShapeMismatch {
                    reason: format!(
                        "cannot concatenate {:?} with leading shape {leading:?}",
                        part.shape()
                    ),
                });
            }
        }
        let rows = element_count(leading);
        let width: usize = parts.iter().map(|p| p.last_dim()).sum();
        let mut data = Vec::with_capacity(rows * width);
        for r in 0..rows {
            for part in parts {
                let c = part.last_dim();
                data.extend_from_slice(&part.data[r * c..(r + 1) * c]);
            }
        }
        let mut shape: Shape = leading.iter().copied().collect();
        shape.push(width);
        Ok(Self { shape, data })
    }

    /// Gather rows of axis 0 by index; `None` slots are filled with `pad`.
    pub fn gather_rows(&self, indices: &[Option<usize>], pad: T) -> Result<Self, ExtractError> {
        let Some((&outer, inner)) = self.shape.split_first() else {
            return Err(ExtractError::ShapeMismatch {
                reason: "cannot gather rows of a rank-0 tensor".into(),
            });
        };
        let stride = element_count(inner);
        let mut data = Vec::with_capacity(indices.len() * stride);
        for slot in indices {
            match slot {
                Some(i) if *i < outer => {
                    data.extend_from_slice(&self.data[i * stride..(i + 1) * stride]);
                }
                Some(i) => {
                    return Err(ExtractError::ShapeMismatch {
                        reason: format!("gather index {i} out of bounds for axis of size {outer}"),
                    });
                }
                None => data.extend(std::iter::repeat_n(pad.clone(), stride)),
            }
        }
        let mut shape = Shape::new();
        shape.push(indices.len());
        shape.extend_from_slice(inner);
        Ok(Self { shape, data })
    }
}

impl Tensor<f32> {
    /// A 1-D tensor over `data`.
    pub fn from_vec(data: Vec<f32>) -> Self {
        let mut shape = Shape::new();
        shape.push(data.len());
        Self { shape, data }
    }

    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Split the trailing channel off as a validity mask.
    ///
    /// Returns `(features[..., :-1], mask[...])` where the mask is
    /// `value != 0.0`. A zero-channel tensor yields a zero-channel
    /// feature tensor and an all-false mask over the leading shape.
    pub fn split_mask(&self) -> Result<(Tensor<f32>, BoolTensor), ExtractError> {
        let width = self.last_dim();
        let leading = self.leading_shape();
        if width == 0 {
            let features = Tensor::new(self.shape(), Vec::new())?;
            return Ok((features, BoolTensor::filled(leading, false)));
        }
        let features = self.slice_last(0..width - 1)?;
        let mask_data = self
            .data
            .chunks_exact(width)
            .map(|row| row[width - 1] != 0.0)
            .collect();
        let mask = BoolTensor::new(leading, mask_data)?;
        Ok((features, mask))
    }
}

impl BoolTensor {
    /// Number of `true` elements.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_element_count() {
        let err = FeatureTensor::new(&[2, 3], vec![0.0f32; 5]).unwrap_err();
        assert!(matches!(err, ExtractError::ShapeMismatch { .. }));
    }

    #[test]
    fn concat_last_interleaves_channels() {
        let a = FeatureTensor::new(&[2, 1], vec![1.0, 2.0]).unwrap();
        let b = FeatureTensor::new(&[2, 2], vec![10.0, 11.0, 20.0, 21.0]).unwrap();
        let c = FeatureTensor::concat_last(&[&a, &b]).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.data(), &[1.0, 10.0, 11.0, 2.0, 20.0, 21.0]);
    }

    #[test]
    fn concat_last_rejects_leading_mismatch() {
        let a = FeatureTensor::new(&[2, 1], vec![1.0, 2.0]).unwrap();
        let b = FeatureTensor::new(&[3, 1], vec![1.0, 2.0, 3.0]).unwrap();
        assert!(FeatureTensor::concat_last(&[&a, &b]).is_err());
    }

    #[test]
    fn slice_last_takes_columns_per_row() {
        let t = FeatureTensor::new(&[2, 4], (0..8).map(|v| v as f32).collect()).unwrap();
        let s = t.slice_last(1..3).unwrap();
        assert_eq!(s.shape(), &[2, 2]);
        assert_eq!(s.data(), &[1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn row_drops_leading_axis() {
        let t = FeatureTensor::new(&[3, 2], (0..6).map(|v| v as f32).collect()).unwrap();
        let r = t.row(1).unwrap();
        assert_eq!(r.shape(), &[2]);
        assert_eq!(r.data(), &[2.0, 3.0]);
        assert!(t.row(3).is_err());
    }

    #[test]
    fn gather_rows_pads_missing_slots() {
        let t = FeatureTensor::new(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let g = t.gather_rows(&[Some(1), None, Some(0)], 0.0).unwrap();
        assert_eq!(g.shape(), &[3, 2]);
        assert_eq!(g.data(), &[3.0, 4.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn split_mask_separates_last_channel() {
        let t = FeatureTensor::new(&[2, 3], vec![0.5, 0.25, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let (features, mask) = t.split_mask().unwrap();
        assert_eq!(features.shape(), &[2, 2]);
        assert_eq!(features.data(), &[0.5, 0.25, 0.0, 0.0]);
        assert_eq!(mask.shape(), &[2]);
        assert_eq!(mask.data(), &[true, false]);
    }

    #[test]
    fn split_mask_of_zero_width_is_all_false() {
        let t = FeatureTensor::new(&[3, 0], vec![]).unwrap();
        let (features, mask) = t.split_mask().unwrap();
        assert_eq!(features.shape(), &[3, 0]);
        assert_eq!(mask.shape(), &[3]);
        assert_eq!(mask.count_true(), 0);
    }

    #[test]
    fn map_keeps_shape() {
        let mask = BoolTensor::new(&[1, 2], vec![true, false]).unwrap();
        let ones = mask.map(|&b| if b { 1.0f32 } else { 0.0 });
        assert_eq!(ones.shape(), &[1, 2]);
        assert_eq!(ones.data(), &[1.0, 0.0]);
    }

    #[test]
    fn reshape_preserves_data() {
        let t = FeatureTensor::from_vec((0..6).map(|v| v as f32).collect());
        let r = t.clone().reshape(&[2, 3]).unwrap();
        assert_eq!(r.data(), t.data());
        assert!(t.reshape(&[4, 2]).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn slice_last_recovers_concatenated_parts(
                rows in 0usize..6,
                wa in 0usize..4,
                wb in 0usize..4,
            ) {
                let a = FeatureTensor::new(
                    &[rows, wa],
                    (0..rows * wa).map(|v| v as f32).collect(),
                ).unwrap();
                let b = FeatureTensor::new(
                    &[rows, wb],
                    (0..rows * wb).map(|v| -(v as f32)).collect(),
                ).unwrap();
                let joined = FeatureTensor::concat_last(&[&a, &b]).unwrap();
                prop_assert_eq!(joined.shape(), &[rows, wa + wb][..]);
                prop_assert_eq!(joined.slice_last(0..wa).unwrap(), a);
                prop_assert_eq!(joined.slice_last(wa..wa + wb).unwrap(), b);
            }
        }
    }
}
