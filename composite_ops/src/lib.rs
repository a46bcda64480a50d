//! Operator library on top of the deferred graph: inference rules, eager
//! kernel wrappers, the adapters themselves and a method-call surface.

pub mod eager;
pub mod functions;
pub mod lazy_tensor;
pub mod ops;
pub mod prepass;
pub mod reducers;

pub use lazy_tensor::LazyOps;
pub use ops::{MatMul, Softmax};
