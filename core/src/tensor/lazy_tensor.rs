use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::device::Device;
use crate::dtype::DType;
use crate::error::Result;
use crate::meta::TensorMeta;
use crate::runnable::Runnable;
use crate::storage::Storage;
use crate::tensor::{DelayedTensor, NodeId, Tensor};

/// A handle to either an already-computed tensor or a deferred node.
///
/// Cloning shares the underlying value; two handles compare equal only when
/// they point at the same allocation.
#[derive(Debug)]
pub enum LazyTensor<S: Storage> {
    Tensor(Arc<Tensor<S>>),
    Delayed(Arc<DelayedTensor<S>>),
}

impl<S: Storage> Clone for LazyTensor<S> {
    fn clone(&self) -> Self {
        match self {
            LazyTensor::Tensor(tensor) => LazyTensor::Tensor(Arc::clone(tensor)),
            LazyTensor::Delayed(node) => LazyTensor::Delayed(Arc::clone(node)),
        }
    }
}

impl<S: Storage> From<Tensor<S>> for LazyTensor<S> {
    fn from(tensor: Tensor<S>) -> Self {
        LazyTensor::Tensor(Arc::new(tensor))
    }
}

impl<S: Storage> From<Arc<Tensor<S>>> for LazyTensor<S> {
    fn from(tensor: Arc<Tensor<S>>) -> Self {
        LazyTensor::Tensor(tensor)
    }
}

impl<S: Storage> From<DelayedTensor<S>> for LazyTensor<S> {
    fn from(node: DelayedTensor<S>) -> Self {
        LazyTensor::Delayed(Arc::new(node))
    }
}

impl<S: Storage> LazyTensor<S> {
    /// Node identity, `None` for immediate values.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            LazyTensor::Tensor(_) => None,
            LazyTensor::Delayed(node) => Some(node.id()),
        }
    }

    pub fn is_delayed(&self) -> bool {
        matches!(self, LazyTensor::Delayed(_))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            LazyTensor::Tensor(tensor) => tensor.shape(),
            LazyTensor::Delayed(node) => node.shape(),
        }
    }

    pub fn size(&self, dim: i32) -> Result<usize> {
        match self {
            LazyTensor::Tensor(tensor) => tensor.meta().size(dim),
            LazyTensor::Delayed(node) => node.size(dim),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            LazyTensor::Tensor(tensor) => tensor.dtype(),
            LazyTensor::Delayed(node) => node.dtype(),
        }
    }

    pub fn device(&self) -> Device {
        match self {
            LazyTensor::Tensor(tensor) => tensor.device(),
            LazyTensor::Delayed(node) => node.device(),
        }
    }

    /// Evaluates and returns the host data.
    pub fn to_vec(&self) -> Result<Vec<S::Inner>> {
        Ok(self.run()?.to_vec())
    }

    /// Evaluates and extracts the single element.
    pub fn item(&self) -> Result<S::Inner> {
        self.run()?.item()
    }

    pub fn to_f64(&self) -> Result<f64> {
        self.run()?.to_f64()
    }

    pub fn to_i64(&self) -> Result<i64> {
        self.run()?.to_i64()
    }

    pub fn to_bool(&self) -> Result<bool> {
        self.run()?.to_bool()
    }
}

impl<S: Storage> Runnable<S> for LazyTensor<S> {
    fn run(&self) -> Result<Arc<Tensor<S>>> {
        match self {
            LazyTensor::Tensor(tensor) => Ok(Arc::clone(tensor)),
            LazyTensor::Delayed(node) => node.run(),
        }
    }

    fn meta(&self) -> TensorMeta {
        match self {
            LazyTensor::Tensor(tensor) => tensor.meta(),
            LazyTensor::Delayed(node) => node.meta(),
        }
    }
}

impl<S: Storage> PartialEq for LazyTensor<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LazyTensor::Tensor(a), LazyTensor::Tensor(b)) => Arc::ptr_eq(a, b),
            (LazyTensor::Delayed(a), LazyTensor::Delayed(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl<S: Storage> Eq for LazyTensor<S> {}

impl<S: Storage> Hash for LazyTensor<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            LazyTensor::Tensor(tensor) => Arc::as_ptr(tensor).hash(state),
            LazyTensor::Delayed(node) => node.id().hash(state),
        }
    }
}
