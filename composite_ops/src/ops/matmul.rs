use deferral_core::{
    LazyError, LazyTensor, Operand, Result, Storage,
    backends::{
        Backend,
        broadcast::BroadcastFunc,
        ops::{Multiply, Sum},
        reduce::ReduceFunc,
    },
};

use crate::lazy_tensor::LazyOps;

/// Matrix product spelled as a broadcast multiply followed by a sum, for
/// backends that have no dedicated matmul kernel.
pub trait MatMul<S: Storage> {
    fn broadcast_matmul<B: Backend + Multiply + Sum>(
        &self,
        other: &LazyTensor<S>,
    ) -> Result<LazyTensor<S>>
    where
        <B as Multiply>::Multiply: BroadcastFunc<S> + 'static,
        <B as Sum>::Sum: ReduceFunc<S> + 'static;
}

impl<S: Storage> MatMul<S> for LazyTensor<S> {
    fn broadcast_matmul<B: Backend + Multiply + Sum>(
        &self,
        other: &LazyTensor<S>,
    ) -> Result<LazyTensor<S>>
    where
        <B as Multiply>::Multiply: BroadcastFunc<S> + 'static,
        <B as Sum>::Sum: ReduceFunc<S> + 'static,
    {
        let (lhs, rhs) = (self.shape(), other.shape());
        if lhs.len() != 2 || rhs.len() != 2 {
            return Err(LazyError::Inference(format!(
                "broadcast matmul expects two matrices, got {lhs:?} and {rhs:?}"
            )));
        }

        // [m, k, 1] * [k, n] -> [m, k, n], then collapse k.
        let column = self.reshape(vec![lhs[0], lhs[1], 1])?;
        let products = column.mul::<B>(Operand::from(other))?;
        products.sum::<B>(-2, false)
    }
}
