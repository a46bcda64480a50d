use deferral_core::{
    LazyTensor, Result, Storage,
    backends::{
        Backend,
        broadcast::BroadcastFunc,
        map::MapFunc,
        ops::{Divide, Exp, Sum},
        reduce::ReduceFunc,
    },
};

use crate::lazy_tensor::LazyOps;

/// Softmax over the last dimension.
pub trait Softmax<S: Storage> {
    fn softmax<B: Backend + Exp + Divide + Sum>(&self) -> Result<LazyTensor<S>>
    where
        <B as Divide>::Divide: BroadcastFunc<S> + 'static,
        <B as Exp>::Exp: MapFunc<S> + 'static,
        <B as Sum>::Sum: ReduceFunc<S> + 'static;
}

impl<S: Storage> Softmax<S> for LazyTensor<S> {
    fn softmax<B: Backend + Exp + Divide + Sum>(&self) -> Result<LazyTensor<S>>
    where
        <B as Divide>::Divide: BroadcastFunc<S> + 'static,
        <B as Exp>::Exp: MapFunc<S> + 'static,
        <B as Sum>::Sum: ReduceFunc<S> + 'static,
    {
        let exp_tensor = self.exp::<B>()?;
        let sum_tensor = exp_tensor.sum::<B>(-1, true)?;
        exp_tensor.div::<B>(&sum_tensor)
    }
}
