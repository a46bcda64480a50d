//! The operator library as free functions.
//!
//! Each operator is one adapter; the `*_fn` builders return it so that the
//! method surface in [`crate::lazy_tensor`] binds the very same adapter.

use std::sync::Arc;

use deferral_core::{
    Kwargs, LazyFunction, LazyTensor, Operand, Result, Storage,
    backends::{
        Backend,
        broadcast::BroadcastFunc,
        map::MapFunc,
        matmul::MatmulFunc,
        ops::{
            Abs, Acos, Acosh, Add, Asin, Asinh, Atan, Atanh, Cos, Cosh, Divide, Exp, Exp2, Frac,
            Log, Log1p, Log2, Log10, Matmul, Maximum, Minimum, Multiply, Neg, Pow, Relu, Remainder,
            Sin, Sinh, Subtract, Sum, Tan, Tanh, TruncDivide,
        },
        reduce::ReduceFunc,
    },
};

use crate::eager::{
    BroadcastEager, ClampEager, Identity, MapEager, MatmulEager, ReduceEager, Rejected,
    ReshapeEager,
};
use crate::prepass;
use crate::reducers::Concat;

pub fn map_fn<S: Storage>(kernel: Arc<dyn MapFunc<S>>) -> LazyFunction<S> {
    LazyFunction::new(MapEager { kernel }, prepass::Elementwise).with_reducer(Concat::new(0))
}

pub fn broadcast_fn<S: Storage>(kernel: Arc<dyn BroadcastFunc<S>>) -> LazyFunction<S> {
    LazyFunction::new(BroadcastEager { kernel }, prepass::Broadcast).with_reducer(Concat::new(0))
}

/// Summing along `dim` cannot be split along any dimension without changing
/// the meaning of the partials, so no reducer is registered.
pub fn reduce_fn<S: Storage>(
    kernel: Arc<dyn ReduceFunc<S>>,
    dim: i32,
    keepdim: bool,
) -> LazyFunction<S> {
    LazyFunction::new(
        ReduceEager {
            kernel,
            dim,
            keepdim,
        },
        prepass::Reduce { dim, keepdim },
    )
}

pub fn matmul_fn<S: Storage>(kernel: Arc<dyn MatmulFunc<S>>) -> LazyFunction<S> {
    LazyFunction::new(MatmulEager { kernel }, prepass::Matmul).with_reducer(Concat::new(0))
}

pub fn positive_fn<S: Storage>() -> LazyFunction<S> {
    LazyFunction::new(Identity, prepass::Elementwise).with_reducer(Concat::new(0))
}

pub fn reshape_fn<S: Storage>(shape: Vec<usize>) -> LazyFunction<S> {
    LazyFunction::new(
        ReshapeEager {
            shape: shape.clone(),
        },
        prepass::Reshape { shape },
    )
}

pub fn clamp_fn<S: Storage>(
    maximum: Arc<dyn BroadcastFunc<S>>,
    minimum: Arc<dyn BroadcastFunc<S>>,
) -> LazyFunction<S> {
    LazyFunction::new(ClampEager { maximum, minimum }, prepass::Clamp)
}

/// Floor division has no deferred form; use [`div_trunc`].
pub fn floor_div_fn<S: Storage>() -> LazyFunction<S> {
    LazyFunction::new(
        Rejected {
            op: "floor_div".to_string(),
        },
        prepass::Unsupported {
            op: "floor_div".to_string(),
            reason: "floor rounding is not available, use div_trunc".to_string(),
        },
    )
}

macro_rules! unary_ops {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<B, S>(input: impl Into<Operand<S>>) -> Result<LazyTensor<S>>
            where
                B: Backend + $op,
                S: Storage,
                <B as $op>::$op: MapFunc<S> + 'static,
            {
                map_fn(<B as $op>::as_arc()).call([input.into()])
            }
        )*
    };
}

macro_rules! binary_ops {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<B, S>(
                lhs: impl Into<Operand<S>>,
                rhs: impl Into<Operand<S>>,
            ) -> Result<LazyTensor<S>>
            where
                B: Backend + $op,
                S: Storage,
                <B as $op>::$op: BroadcastFunc<S> + 'static,
            {
                broadcast_fn(<B as $op>::as_arc()).call([lhs.into(), rhs.into()])
            }
        )*
    };
}

unary_ops! {
    neg => Neg,
    abs => Abs,
    exp => Exp,
    log => Log,
    sin => Sin,
    cos => Cos,
    tanh => Tanh,
    relu => Relu,
    frac => Frac,
    exp2 => Exp2,
    log2 => Log2,
    log10 => Log10,
    log1p => Log1p,
    tan => Tan,
    asin => Asin,
    acos => Acos,
    atan => Atan,
    sinh => Sinh,
    cosh => Cosh,
    asinh => Asinh,
    acosh => Acosh,
    atanh => Atanh,
}

binary_ops! {
    add => Add,
    sub => Subtract,
    mul => Multiply,
    div => Divide,
    div_trunc => TruncDivide,
    remainder => Remainder,
    pow => Pow,
    maximum => Maximum,
    minimum => Minimum,
}

pub fn positive<S: Storage>(input: impl Into<Operand<S>>) -> Result<LazyTensor<S>> {
    positive_fn().call([input.into()])
}

pub fn reshape<S: Storage>(
    input: impl Into<Operand<S>>,
    shape: impl Into<Vec<usize>>,
) -> Result<LazyTensor<S>> {
    reshape_fn(shape.into()).call([input.into()])
}

pub fn floor_div<S: Storage>(
    lhs: impl Into<Operand<S>>,
    rhs: impl Into<Operand<S>>,
) -> Result<LazyTensor<S>> {
    floor_div_fn().call([lhs.into(), rhs.into()])
}

pub fn sum<B, S>(input: impl Into<Operand<S>>, dim: i32, keepdim: bool) -> Result<LazyTensor<S>>
where
    B: Backend + Sum,
    S: Storage,
    <B as Sum>::Sum: ReduceFunc<S> + 'static,
{
    reduce_fn(<B as Sum>::as_arc(), dim, keepdim).call([input.into()])
}

pub fn matmul<B, S>(
    lhs: impl Into<Operand<S>>,
    rhs: impl Into<Operand<S>>,
) -> Result<LazyTensor<S>>
where
    B: Backend + Matmul,
    S: Storage,
    <B as Matmul>::Matmul: MatmulFunc<S> + 'static,
{
    matmul_fn(<B as Matmul>::as_arc()).call([lhs.into(), rhs.into()])
}

/// Builds the clamp kwargs from the optional bounds.
pub(crate) fn clamp_bounds<S: Storage>(
    min: Option<Operand<S>>,
    max: Option<Operand<S>>,
) -> Kwargs<Operand<S>> {
    [("min", min), ("max", max)]
        .into_iter()
        .filter_map(|(name, bound)| bound.map(|bound| (name.to_string(), bound)))
        .collect()
}

/// Limits `input` to `[min, max]`. The bounds become named children of the
/// node.
pub fn clamp<B, S>(
    input: impl Into<Operand<S>>,
    min: Option<Operand<S>>,
    max: Option<Operand<S>>,
) -> Result<LazyTensor<S>>
where
    B: Backend + Maximum + Minimum,
    S: Storage,
    <B as Maximum>::Maximum: BroadcastFunc<S> + 'static,
    <B as Minimum>::Minimum: BroadcastFunc<S> + 'static,
{
    clamp_fn(<B as Maximum>::as_arc(), <B as Minimum>::as_arc())
        .invoke(vec![input.into()], clamp_bounds(min, max))
}
