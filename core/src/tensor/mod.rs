//! Concrete tensors and the lazy handles built on top of them.

use crate::backends::{
    broadcast::BroadcastFunc, map::MapFunc, matmul::MatmulFunc, reduce::ReduceFunc,
};
use crate::device::Device;
use crate::dtype::{DType, Element};
use crate::error::{LazyError, Result};
use crate::layout::{Layout, broadcast_shapes, matmul_shape};
use crate::meta::TensorMeta;
use crate::storage::Storage;

pub mod delayed;
pub mod lazy_tensor;

pub use delayed::{DelayedTensor, NodeId};
pub use lazy_tensor::LazyTensor;

#[derive(Debug, Clone)]
pub struct Tensor<S: Storage> {
    pub layout: Layout,
    pub storage: S,
}

impl<S: Storage> Tensor<S> {
    pub fn new(layout: Layout, storage: S) -> Self {
        Self { layout, storage }
    }

    /// Builds a contiguous tensor from host data, checking the element count.
    pub fn from_vec(shape: impl Into<Vec<usize>>, data: Vec<S::Inner>) -> Result<Self> {
        let layout = Layout::new(shape.into());
        if layout.count_elements() != data.len() {
            return Err(LazyError::Lifting(format!(
                "shape {:?} needs {} elements, got {}",
                layout.shape,
                layout.count_elements(),
                data.len()
            )));
        }
        Ok(Self::new(layout, S::from_vec(data)))
    }

    /// Rank-0 tensor holding one value.
    pub fn scalar(value: S::Inner) -> Self {
        Self::new(Layout::new(Vec::new()), S::from_vec(vec![value]))
    }

    pub fn shape(&self) -> &[usize] {
        &self.layout.shape
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn device(&self) -> Device {
        self.storage.device()
    }

    /// Descriptor read straight off the concrete value.
    pub fn meta(&self) -> TensorMeta {
        TensorMeta::new(self.layout.shape.clone(), self.dtype(), self.device())
    }

    pub fn contiguous(&self) -> Self {
        if self.layout.is_contiguous() {
            return self.clone();
        }
        Self::new(
            Layout::new(self.layout.shape.clone()),
            self.storage.contiguous(&self.layout),
        )
    }

    pub fn reshape(&self, shape: impl Into<Vec<usize>>) -> Result<Self> {
        let layout = Layout::new(shape.into());
        if layout.count_elements() != self.layout.count_elements() {
            return Err(LazyError::Kernel(format!(
                "cannot reshape {:?} into {:?}",
                self.layout.shape, layout.shape
            )));
        }
        Ok(Self::new(layout, self.contiguous().storage))
    }

    /// Row-major host copy of the elements.
    pub fn to_vec(&self) -> Vec<S::Inner> {
        if self.layout.is_contiguous() {
            self.storage.to_vec()
        } else {
            self.storage.contiguous(&self.layout).to_vec()
        }
    }

    /// The only element of a one-element tensor.
    pub fn item(&self) -> Result<S::Inner> {
        if self.layout.count_elements() != 1 {
            return Err(LazyError::Inference(format!(
                "only one-element tensors convert to scalars, got shape {:?}",
                self.layout.shape
            )));
        }
        self.to_vec()
            .first()
            .copied()
            .ok_or_else(|| LazyError::Kernel("storage is empty".to_string()))
    }

    pub fn to_f64(&self) -> Result<f64> {
        let value = self.item()?;
        value
            .as_f64()
            .ok_or_else(|| LazyError::Kernel(format!("{value:?} does not fit in f64")))
    }

    pub fn to_i64(&self) -> Result<i64> {
        let value = self.item()?;
        value
            .as_i64()
            .ok_or_else(|| LazyError::Kernel(format!("{value:?} does not fit in i64")))
    }

    pub fn to_bool(&self) -> Result<bool> {
        Ok(self.to_f64()? != 0.0)
    }

    pub fn map(&self, f: &dyn MapFunc<S>) -> Result<Self> {
        let input = self.contiguous();
        let storage = f.forward(&input.layout, &input.storage)?;
        Self::from_kernel(input.layout, storage, f.as_str())
    }

    pub fn reduce(&self, dim: i32, f: &dyn ReduceFunc<S>) -> Result<Self> {
        let udim = self.layout.signed_dim_to_unsigned_dim(dim)?;
        let storage = f.forward(&self.layout, &self.storage, dim)?;
        Self::from_kernel(self.layout.reduce(udim), storage, f.as_str())
    }

    pub fn broadcast(&self, other: &Self, f: &dyn BroadcastFunc<S>) -> Result<Self> {
        let shape = broadcast_shapes(&self.layout.shape, &other.layout.shape)?;
        let storage = f.forward(&self.layout, &self.storage, &other.layout, &other.storage)?;
        Self::from_kernel(Layout::new(shape), storage, f.as_str())
    }

    pub fn matmul(&self, other: &Self, f: &dyn MatmulFunc<S>) -> Result<Self> {
        let shape = matmul_shape(&self.layout.shape, &other.layout.shape)?;
        let storage = f.forward(&self.layout, &self.storage, &other.layout, &other.storage)?;
        Self::from_kernel(Layout::new(shape), storage, f.as_str())
    }

    fn from_kernel(layout: Layout, storage: S, kernel: String) -> Result<Self> {
        if storage.len() != layout.count_elements() {
            return Err(LazyError::Kernel(format!(
                "{kernel} produced {} elements for shape {:?}",
                storage.len(),
                layout.shape
            )));
        }
        Ok(Self::new(layout, storage))
    }
}
