//! Operation adapters: pair an eager function with its shape inference and
//! turn calls into deferred nodes.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::Result;
use crate::lift::{Operand, lift};
use crate::meta::TensorMeta;
use crate::storage::Storage;
use crate::tensor::{DelayedTensor, LazyTensor, Tensor};

/// Named arguments, keyed by parameter name.
pub type Kwargs<T> = HashMap<String, T>;

/// The concrete computation behind a node.
pub trait EagerFunc<S: Storage>: Send + Sync {
    fn forward(
        &self,
        args: &[Arc<Tensor<S>>],
        kwargs: &Kwargs<Arc<Tensor<S>>>,
    ) -> Result<Tensor<S>>;

    fn as_str(&self) -> String;
}

/// Predicts the result descriptor from the unlifted operands.
///
/// Must not evaluate deferred operands; their committed descriptors are
/// available through `Operand::meta`.
pub trait PrepassFunc<S: Storage>: Send + Sync {
    fn prepass(&self, args: &[Operand<S>], kwargs: &Kwargs<Operand<S>>) -> Result<TensorMeta>;
}

/// Merges partial results computed over slices of one dimension.
pub trait Reducer<S: Storage>: Send + Sync {
    fn dim(&self) -> usize;

    fn reduce(&self, partials: Vec<Tensor<S>>) -> Result<Tensor<S>>;
}

pub struct FnEager<F> {
    name: String,
    f: F,
}

impl<S, F> EagerFunc<S> for FnEager<F>
where
    S: Storage,
    F: Fn(&[Arc<Tensor<S>>], &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>> + Send + Sync,
{
    fn forward(
        &self,
        args: &[Arc<Tensor<S>>],
        kwargs: &Kwargs<Arc<Tensor<S>>>,
    ) -> Result<Tensor<S>> {
        (self.f)(args, kwargs)
    }

    fn as_str(&self) -> String {
        self.name.clone()
    }
}

pub struct FnPrepass<F>(F);

impl<S, F> PrepassFunc<S> for FnPrepass<F>
where
    S: Storage,
    F: Fn(&[Operand<S>], &Kwargs<Operand<S>>) -> Result<TensorMeta> + Send + Sync,
{
    fn prepass(&self, args: &[Operand<S>], kwargs: &Kwargs<Operand<S>>) -> Result<TensorMeta> {
        (self.0)(args, kwargs)
    }
}

/// Wraps an eager function so that calling it records a node instead of
/// computing.
pub struct LazyFunction<S: Storage> {
    func: Arc<dyn EagerFunc<S>>,
    prepass_func: Arc<dyn PrepassFunc<S>>,
    reducers: Vec<Arc<dyn Reducer<S>>>,
}

impl<S: Storage> Clone for LazyFunction<S> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            prepass_func: Arc::clone(&self.prepass_func),
            reducers: self.reducers.clone(),
        }
    }
}

impl<S: Storage> Debug for LazyFunction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFunction")
            .field("func", &self.func.as_str())
            .field(
                "reducers",
                &self.reducers.iter().map(|r| r.dim()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<S: Storage> LazyFunction<S> {
    pub fn new(
        func: impl EagerFunc<S> + 'static,
        prepass_func: impl PrepassFunc<S> + 'static,
    ) -> Self {
        Self {
            func: Arc::new(func),
            prepass_func: Arc::new(prepass_func),
            reducers: Vec::new(),
        }
    }

    /// Builds an adapter from a pair of closures.
    pub fn from_fn<F, P>(name: impl Into<String>, func: F, prepass_func: P) -> Self
    where
        F: Fn(&[Arc<Tensor<S>>], &Kwargs<Arc<Tensor<S>>>) -> Result<Tensor<S>>
            + Send
            + Sync
            + 'static,
        P: Fn(&[Operand<S>], &Kwargs<Operand<S>>) -> Result<TensorMeta> + Send + Sync + 'static,
    {
        Self::new(
            FnEager {
                name: name.into(),
                f: func,
            },
            FnPrepass(prepass_func),
        )
    }

    /// Registers a reducer. Later registrations for the same dim win.
    pub fn with_reducer(mut self, reducer: impl Reducer<S> + 'static) -> Self {
        let reducer: Arc<dyn Reducer<S>> = Arc::new(reducer);
        self.reducers.retain(|r| r.dim() != reducer.dim());
        self.reducers.push(reducer);
        self
    }

    pub fn name(&self) -> String {
        self.func.as_str()
    }

    pub fn reducer(&self, dim: usize) -> Option<Arc<dyn Reducer<S>>> {
        self.reducers.iter().find(|r| r.dim() == dim).cloned()
    }

    /// Records a node for `args` and `kwargs`.
    ///
    /// Inference runs first, on the operands exactly as given, so a failure
    /// leaves no node behind. Nothing is evaluated.
    pub fn invoke(
        &self,
        args: Vec<Operand<S>>,
        kwargs: Kwargs<Operand<S>>,
    ) -> Result<LazyTensor<S>> {
        let prepass = self.prepass_func.prepass(&args, &kwargs)?;
        tracing::debug!(
            "{} predicted {:?} {} on {}",
            self.func.as_str(),
            prepass.shape(),
            prepass.dtype(),
            prepass.device()
        );

        let args = args.into_iter().map(lift).collect::<Result<Vec<_>>>()?;
        let kwargs = kwargs
            .into_iter()
            .map(|(name, operand)| Ok((name, lift(operand)?)))
            .collect::<Result<Kwargs<_>>>()?;

        Ok(LazyTensor::from(DelayedTensor::new(
            Arc::clone(&self.func),
            prepass,
            self.reducers.clone(),
            args,
            kwargs,
        )))
    }

    pub fn call(&self, args: impl IntoIterator<Item = Operand<S>>) -> Result<LazyTensor<S>> {
        self.invoke(args.into_iter().collect(), Kwargs::new())
    }

    /// Fixes `first` as the leading positional argument.
    pub fn bind(&self, first: impl Into<Operand<S>>) -> BoundFunction<S> {
        BoundFunction {
            func: self.clone(),
            first: first.into(),
        }
    }
}

/// An adapter with its first positional argument already supplied.
#[derive(Debug, Clone)]
pub struct BoundFunction<S: Storage> {
    func: LazyFunction<S>,
    first: Operand<S>,
}

impl<S: Storage> BoundFunction<S> {
    pub fn invoke(
        &self,
        args: Vec<Operand<S>>,
        kwargs: Kwargs<Operand<S>>,
    ) -> Result<LazyTensor<S>> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.first.clone());
        full.extend(args);
        self.func.invoke(full, kwargs)
    }

    pub fn call(&self, args: impl IntoIterator<Item = Operand<S>>) -> Result<LazyTensor<S>> {
        self.invoke(args.into_iter().collect(), Kwargs::new())
    }
}
