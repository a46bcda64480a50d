//! Lifting of arbitrary operands into runnable handles.

use std::sync::Arc;

use crate::error::Result;
use crate::meta::TensorMeta;
use crate::runnable::Runnable;
use crate::storage::Storage;
use crate::tensor::{LazyTensor, Tensor};

/// An argument as the caller passed it, before lifting.
///
/// Inference routines see operands in this form so they can tell a deferred
/// node from a concrete value.
#[derive(Debug, Clone)]
pub enum Operand<S: Storage> {
    Lazy(LazyTensor<S>),
    Tensor(Arc<Tensor<S>>),
    Scalar(S::Inner),
    Array { shape: Vec<usize>, data: Vec<S::Inner> },
}

impl<S: Storage> Operand<S> {
    pub fn scalar(value: S::Inner) -> Self {
        Operand::Scalar(value)
    }

    pub fn array(shape: impl Into<Vec<usize>>, data: Vec<S::Inner>) -> Self {
        Operand::Array {
            shape: shape.into(),
            data,
        }
    }

    /// True when the operand is already a lazy handle.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Operand::Lazy(_))
    }

    /// True when the operand is a graph node that has not been evaluated.
    pub fn is_delayed(&self) -> bool {
        matches!(self, Operand::Lazy(LazyTensor::Delayed(_)))
    }

    /// Descriptor of the unlifted operand. Deferred nodes answer from their
    /// committed prepass.
    pub fn meta(&self) -> Result<TensorMeta> {
        match self {
            Operand::Lazy(lazy) => Ok(lazy.meta()),
            Operand::Tensor(tensor) => Ok(tensor.meta()),
            Operand::Scalar(value) => Ok(Tensor::<S>::scalar(*value).meta()),
            Operand::Array { shape, data } => {
                Ok(Tensor::<S>::from_vec(shape.clone(), data.clone())?.meta())
            }
        }
    }
}

/// Normalises an operand into a runnable handle.
///
/// Lazy handles pass through unchanged; everything else becomes an immediate
/// wrapper whose evaluation returns the value as-is.
pub fn lift<S: Storage>(input: Operand<S>) -> Result<LazyTensor<S>> {
    match input {
        Operand::Lazy(lazy) => Ok(lazy),
        Operand::Tensor(tensor) => Ok(LazyTensor::Tensor(tensor)),
        Operand::Scalar(value) => Ok(LazyTensor::from(Tensor::scalar(value))),
        Operand::Array { shape, data } => Ok(LazyTensor::from(Tensor::from_vec(shape, data)?)),
    }
}

impl<S: Storage> From<LazyTensor<S>> for Operand<S> {
    fn from(lazy: LazyTensor<S>) -> Self {
        Operand::Lazy(lazy)
    }
}

impl<S: Storage> From<&LazyTensor<S>> for Operand<S> {
    fn from(lazy: &LazyTensor<S>) -> Self {
        Operand::Lazy(lazy.clone())
    }
}

impl<S: Storage> From<Tensor<S>> for Operand<S> {
    fn from(tensor: Tensor<S>) -> Self {
        Operand::Tensor(Arc::new(tensor))
    }
}

impl<S: Storage> From<Arc<Tensor<S>>> for Operand<S> {
    fn from(tensor: Arc<Tensor<S>>) -> Self {
        Operand::Tensor(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LazyError;
    use crate::testing::VecStorage;

    #[test]
    fn test_lift_passes_lazy_through() {
        let lazy = LazyTensor::from(Tensor::<VecStorage>::scalar(2.0));
        let lifted = lift(Operand::from(&lazy)).unwrap();
        assert_eq!(lifted, lazy);
    }

    #[test]
    fn test_lift_wraps_shared_tensor() {
        let tensor = Arc::new(Tensor::<VecStorage>::scalar(3.0));
        let lifted = lift(Operand::from(Arc::clone(&tensor))).unwrap();
        let value = lifted.run().unwrap();
        assert!(Arc::ptr_eq(&value, &tensor));
    }

    #[test]
    fn test_lift_scalar_is_rank_zero() {
        let lifted = lift(Operand::<VecStorage>::scalar(4.0)).unwrap();
        assert!(lifted.shape().is_empty());
        assert_eq!(lifted.item().unwrap(), 4.0);
    }

    #[test]
    fn test_lift_array_checks_element_count() {
        let ok = lift(Operand::<VecStorage>::array(vec![2], vec![1.0, 2.0])).unwrap();
        assert_eq!(ok.to_vec().unwrap(), vec![1.0, 2.0]);

        let err = lift(Operand::<VecStorage>::array(vec![3], vec![1.0])).unwrap_err();
        assert!(matches!(err, LazyError::Lifting(_)));
    }

    #[test]
    fn test_operand_meta_without_lifting() {
        let operand = Operand::<VecStorage>::array(vec![2, 2], vec![0.0; 4]);
        assert_eq!(operand.meta().unwrap().shape(), &[2, 2]);
        assert!(!operand.is_lazy());
    }
}
