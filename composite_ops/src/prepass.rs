//! Metadata inference for the operator library.
//!
//! Every routine here is pure: it reads operand descriptors through
//! [`Operand::meta`] and never evaluates a deferred operand.

use deferral_core::{
    Kwargs, LazyError, Operand, PrepassFunc, Result, Storage, TensorMeta,
    layout::{broadcast_shapes, matmul_shape, normalize_dim},
};

fn positional<S: Storage>(op: &str, args: &[Operand<S>], arity: usize) -> Result<Vec<TensorMeta>> {
    if args.len() != arity {
        return Err(LazyError::Inference(format!(
            "{op} takes {arity} positional operand(s), got {}",
            args.len()
        )));
    }
    args.iter().map(Operand::meta).collect()
}

fn check_compatible(op: &str, lhs: &TensorMeta, rhs: &TensorMeta) -> Result<()> {
    if lhs.dtype() != rhs.dtype() {
        return Err(LazyError::Inference(format!(
            "{op} operands have different dtypes: {} and {}",
            lhs.dtype(),
            rhs.dtype()
        )));
    }
    if lhs.device() != rhs.device() {
        return Err(LazyError::Inference(format!(
            "{op} operands live on different devices: {} and {}",
            lhs.device(),
            rhs.device()
        )));
    }
    Ok(())
}

/// Descriptor of a broadcasting binary op.
pub fn broadcast_meta(lhs: &TensorMeta, rhs: &TensorMeta) -> Result<TensorMeta> {
    check_compatible("broadcast", lhs, rhs)?;
    Ok(lhs.with_shape(broadcast_shapes(lhs.shape(), rhs.shape())?))
}

pub fn matmul_meta(lhs: &TensorMeta, rhs: &TensorMeta) -> Result<TensorMeta> {
    check_compatible("matmul", lhs, rhs)?;
    Ok(lhs.with_shape(matmul_shape(lhs.shape(), rhs.shape())?))
}

/// Descriptor after collapsing `dim`, keeping it as size 1 when `keepdim`.
pub fn reduce_meta(input: &TensorMeta, dim: i32, keepdim: bool) -> Result<TensorMeta> {
    let udim = normalize_dim(dim, input.rank())?;
    let mut shape = input.shape().to_vec();
    if keepdim {
        shape[udim] = 1;
    } else {
        shape.remove(udim);
    }
    Ok(input.with_shape(shape))
}

/// Unary ops that keep the operand's descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Elementwise;

impl<S: Storage> PrepassFunc<S> for Elementwise {
    fn prepass(&self, args: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let mut metas = positional("elementwise", args, 1)?;
        Ok(metas.remove(0))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Broadcast;

impl<S: Storage> PrepassFunc<S> for Broadcast {
    fn prepass(&self, args: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let metas = positional("broadcast", args, 2)?;
        broadcast_meta(&metas[0], &metas[1])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reduce {
    pub dim: i32,
    pub keepdim: bool,
}

impl<S: Storage> PrepassFunc<S> for Reduce {
    fn prepass(&self, args: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let metas = positional("reduce", args, 1)?;
        reduce_meta(&metas[0], self.dim, self.keepdim)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Matmul;

impl<S: Storage> PrepassFunc<S> for Matmul {
    fn prepass(&self, args: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let metas = positional("matmul", args, 2)?;
        matmul_meta(&metas[0], &metas[1])
    }
}

/// The input broadcast against the optional `min` and `max` bounds.
#[derive(Debug, Default, Clone, Copy)]
pub struct Clamp;

impl<S: Storage> PrepassFunc<S> for Clamp {
    fn prepass(&self, args: &[Operand<S>], kwargs: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let mut meta = positional("clamp", args, 1)?.remove(0);
        if let Some(name) = kwargs.keys().find(|name| *name != "min" && *name != "max") {
            return Err(LazyError::Inference(format!(
                "clamp got an unexpected bound `{name}`"
            )));
        }
        for name in ["min", "max"] {
            if let Some(bound) = kwargs.get(name) {
                meta = broadcast_meta(&meta, &bound.meta()?)?;
            }
        }
        Ok(meta)
    }
}

/// Same element count, new shape.
#[derive(Debug, Clone)]
pub struct Reshape {
    pub shape: Vec<usize>,
}

impl<S: Storage> PrepassFunc<S> for Reshape {
    fn prepass(&self, args: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        let input = positional("reshape", args, 1)?.remove(0);
        let target = self.shape.iter().product::<usize>();
        if input.num_elements() != target {
            return Err(LazyError::Inference(format!(
                "cannot reshape {:?} into {:?}",
                input.shape(),
                self.shape
            )));
        }
        Ok(input.with_shape(self.shape.clone()))
    }
}

/// Rejects every call, so no node is ever built.
#[derive(Debug, Clone)]
pub struct Unsupported {
    pub op: String,
    pub reason: String,
}

impl<S: Storage> PrepassFunc<S> for Unsupported {
    fn prepass(&self, _: &[Operand<S>], _: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        Err(LazyError::unsupported(self.op.clone(), self.reason.clone()))
    }
}
