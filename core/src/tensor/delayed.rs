//! Deferred graph nodes.

use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::device::Device;
use crate::dtype::DType;
use crate::error::{LazyError, Result};
use crate::func::{EagerFunc, Kwargs, Reducer};
use crate::layout::normalize_dim;
use crate::meta::TensorMeta;
use crate::runnable::Runnable;
use crate::storage::Storage;
use crate::tensor::{LazyTensor, Tensor};

static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Per-construction identity of a node. Never derived from node contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NODE_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A recorded operation that has not run yet.
///
/// Children are handles that existed before this node was built, so the
/// graph cannot contain cycles. Nothing here is mutated after construction,
/// and `run` recomputes from scratch on every call.
pub struct DelayedTensor<S: Storage> {
    id: NodeId,
    func: Arc<dyn EagerFunc<S>>,
    prepass: TensorMeta,
    reducers: Vec<Arc<dyn Reducer<S>>>,
    args: Vec<LazyTensor<S>>,
    kwargs: Kwargs<LazyTensor<S>>,
}

impl<S: Storage> DelayedTensor<S> {
    pub(crate) fn new(
        func: Arc<dyn EagerFunc<S>>,
        prepass: TensorMeta,
        reducers: Vec<Arc<dyn Reducer<S>>>,
        args: Vec<LazyTensor<S>>,
        kwargs: Kwargs<LazyTensor<S>>,
    ) -> Self {
        let id = NodeId::next();
        tracing::trace!(
            "Recorded {} as node {} with shape {:?}",
            func.as_str(),
            id,
            prepass.shape()
        );
        Self {
            id,
            func,
            prepass,
            reducers,
            args,
            kwargs,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op_name(&self) -> String {
        self.func.as_str()
    }

    pub fn args(&self) -> &[LazyTensor<S>] {
        &self.args
    }

    pub fn kwargs(&self) -> &HashMap<String, LazyTensor<S>> {
        &self.kwargs
    }

    pub fn shape(&self) -> &[usize] {
        self.prepass.shape()
    }

    /// Size of `dim` from the committed descriptor.
    pub fn size(&self, dim: i32) -> Result<usize> {
        self.prepass.size(dim)
    }

    pub fn dtype(&self) -> DType {
        self.prepass.dtype()
    }

    pub fn device(&self) -> Device {
        self.prepass.device()
    }

    /// The reducer able to merge partial results along `dim`, if the
    /// operation registered one.
    pub fn reducer(&self, dim: usize) -> Option<Arc<dyn Reducer<S>>> {
        self.reducers
            .iter()
            .find(|reducer| reducer.dim() == dim)
            .cloned()
    }

    /// Merges caller-computed partial results along `dim` into the full
    /// result and checks it against the committed descriptor. Negative dims
    /// count from the end.
    pub fn combine_partials(&self, dim: i32, partials: Vec<Tensor<S>>) -> Result<Tensor<S>> {
        let reducer = normalize_dim(dim, self.prepass.rank())
            .ok()
            .and_then(|udim| self.reducer(udim))
            .ok_or_else(|| LazyError::unsupported(self.op_name(), "cannot safely parallelize"))?;
        tracing::debug!(
            "Combining {} partial results of node {} along dim {}",
            partials.len(),
            self.id,
            reducer.dim()
        );
        let combined = reducer.reduce(partials)?;
        self.check_shape(combined.shape())?;
        Ok(combined)
    }

    fn check_shape(&self, found: &[usize]) -> Result<()> {
        if found == self.prepass.shape() {
            return Ok(());
        }
        tracing::error!(
            "Node {} ({}) evaluated to {:?}, predicted {:?}",
            self.id,
            self.op_name(),
            found,
            self.prepass.shape()
        );
        Err(LazyError::ShapeMismatch {
            op: self.op_name(),
            expected: self.prepass.shape().to_vec(),
            found: found.to_vec(),
        })
    }
}

impl<S: Storage> Runnable<S> for DelayedTensor<S> {
    fn run(&self) -> Result<Arc<Tensor<S>>> {
        let real_args = self
            .args
            .iter()
            .map(|arg| arg.run())
            .collect::<Result<Vec<_>>>()?;
        let real_kwargs = self
            .kwargs
            .iter()
            .map(|(name, arg)| Ok((name.clone(), arg.run()?)))
            .collect::<Result<Kwargs<_>>>()?;

        tracing::trace!("Evaluating node {} ({})", self.id, self.op_name());
        let result = self.func.forward(&real_args, &real_kwargs)?;

        self.check_shape(result.shape())?;
        Ok(Arc::new(result))
    }

    fn meta(&self) -> TensorMeta {
        self.prepass.clone()
    }
}

impl<S: Storage> PartialEq for DelayedTensor<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S: Storage> Eq for DelayedTensor<S> {}

impl<S: Storage> Hash for DelayedTensor<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S: Storage> Debug for DelayedTensor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedTensor")
            .field("id", &self.id)
            .field("op", &self.func.as_str())
            .field("prepass", &self.prepass)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish()
    }
}
