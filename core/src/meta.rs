//! Predicted result descriptors ("prepass" metadata).
//!
//! A [`TensorMeta`] is produced by an inference routine from shapes, dtypes and
//! devices alone. Once committed to a node it is never revised.

use crate::device::Device;
use crate::dtype::DType;
use crate::error::Result;
use crate::layout::normalize_dim;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorMeta {
    shape: Vec<usize>,
    dtype: DType,
    device: Device,
}

impl TensorMeta {
    pub fn new(shape: impl Into<Vec<usize>>, dtype: DType, device: Device) -> Self {
        Self {
            shape: shape.into(),
            dtype,
            device,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of one dimension; negative dims count from the end.
    pub fn size(&self, dim: i32) -> Result<usize> {
        let udim = normalize_dim(dim, self.rank())?;
        Ok(self.shape[udim])
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.num_elements() * self.dtype.size_in_bytes()
    }

    /// A new descriptor with the same dtype and device but a different shape.
    pub fn with_shape(&self, shape: impl Into<Vec<usize>>) -> Self {
        Self::new(shape, self.dtype, self.device)
    }
}
