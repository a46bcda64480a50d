use std::sync::Arc;

use crate::error::Result;
use crate::meta::TensorMeta;
use crate::storage::Storage;
use crate::tensor::Tensor;

/// Anything that can produce a concrete tensor on demand.
///
/// `meta` answers from the predicted descriptor and must never evaluate.
pub trait Runnable<S: Storage> {
    fn run(&self) -> Result<Arc<Tensor<S>>>;

    fn meta(&self) -> TensorMeta;
}

impl<S: Storage> Runnable<S> for Arc<Tensor<S>> {
    fn run(&self) -> Result<Arc<Tensor<S>>> {
        Ok(Arc::clone(self))
    }

    fn meta(&self) -> TensorMeta {
        Tensor::meta(self)
    }
}
