//! Eager functions: run a backend kernel on already-evaluated operands.

use std::fmt::{self, Debug};
use std::sync::Arc;

use deferral_core::{
    EagerFunc, Kwargs, LazyError, Result, Storage, Tensor,
    backends::{broadcast::BroadcastFunc, map::MapFunc, matmul::MatmulFunc, reduce::ReduceFunc},
};

fn operand<'a, S: Storage>(
    op: &str,
    args: &'a [Arc<Tensor<S>>],
    index: usize,
) -> Result<&'a Tensor<S>> {
    args.get(index)
        .map(Arc::as_ref)
        .ok_or_else(|| LazyError::Kernel(format!("{op} is missing operand {index}")))
}

pub struct MapEager<S: Storage> {
    pub kernel: Arc<dyn MapFunc<S>>,
}

impl<S: Storage> EagerFunc<S> for MapEager<S> {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        operand(&self.as_str(), args, 0)?.map(self.kernel.as_ref())
    }

    fn as_str(&self) -> String {
        self.kernel.as_str()
    }
}

pub struct BroadcastEager<S: Storage> {
    pub kernel: Arc<dyn BroadcastFunc<S>>,
}

impl<S: Storage> EagerFunc<S> for BroadcastEager<S> {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        let op = self.as_str();
        operand(&op, args, 0)?.broadcast(operand(&op, args, 1)?, self.kernel.as_ref())
    }

    fn as_str(&self) -> String {
        self.kernel.as_str()
    }
}

pub struct ReduceEager<S: Storage> {
    pub kernel: Arc<dyn ReduceFunc<S>>,
    pub dim: i32,
    pub keepdim: bool,
}

impl<S: Storage> EagerFunc<S> for ReduceEager<S> {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        let input = operand(&self.as_str(), args, 0)?;
        let reduced = input.reduce(self.dim, self.kernel.as_ref())?;
        if !self.keepdim {
            return Ok(reduced);
        }
        let udim = input.layout.signed_dim_to_unsigned_dim(self.dim)?;
        let mut shape = input.shape().to_vec();
        shape[udim] = 1;
        reduced.reshape(shape)
    }

    fn as_str(&self) -> String {
        format!("{}[dim={}, keepdim={}]", self.kernel.as_str(), self.dim, self.keepdim)
    }
}

pub struct MatmulEager<S: Storage> {
    pub kernel: Arc<dyn MatmulFunc<S>>,
}

impl<S: Storage> EagerFunc<S> for MatmulEager<S> {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        let op = self.as_str();
        operand(&op, args, 0)?.matmul(operand(&op, args, 1)?, self.kernel.as_ref())
    }

    fn as_str(&self) -> String {
        self.kernel.as_str()
    }
}

/// Unary plus.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl<S: Storage> EagerFunc<S> for Identity {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        Ok(operand("positive", args, 0)?.clone())
    }

    fn as_str(&self) -> String {
        "positive".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ReshapeEager {
    pub shape: Vec<usize>,
}

impl<S: Storage> EagerFunc<S> for ReshapeEager {
    fn forward(&self, args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        operand("reshape", args, 0)?.reshape(self.shape.clone())
    }

    fn as_str(&self) -> String {
        format!("reshape{:?}", self.shape)
    }
}

/// Raises the input to `min` with `maximum`, then lowers it to `max` with
/// `minimum`. Either bound may be absent.
pub struct ClampEager<S: Storage> {
    pub maximum: Arc<dyn BroadcastFunc<S>>,
    pub minimum: Arc<dyn BroadcastFunc<S>>,
}

impl<S: Storage> EagerFunc<S> for ClampEager<S> {
    fn forward(
        &self,
        args: &[Arc<Tensor<S>>],
        kwargs: &Kwargs<Arc<Tensor<S>>>,
    ) -> Result<Tensor<S>> {
        let mut result = operand("clamp", args, 0)?.clone();
        if let Some(min) = kwargs.get("min") {
            result = result.broadcast(min, self.maximum.as_ref())?;
        }
        if let Some(max) = kwargs.get("max") {
            result = result.broadcast(max, self.minimum.as_ref())?;
        }
        Ok(result)
    }

    fn as_str(&self) -> String {
        "clamp".to_string()
    }
}

/// Stands in for an operation whose inference always refuses.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub op: String,
}

impl<S: Storage> EagerFunc<S> for Rejected {
    fn forward(&self, _: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> {
        Err(LazyError::unsupported(self.op.clone(), "no eager implementation"))
    }

    fn as_str(&self) -> String {
        self.op.clone()
    }
}

macro_rules! kernel_debug {
    ($($eager:ident),*) => {
        $(
            impl<S: Storage> Debug for $eager<S> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&EagerFunc::as_str(self))
                }
            }
        )*
    };
}

kernel_debug!(MapEager, BroadcastEager, ReduceEager, MatmulEager, ClampEager);
