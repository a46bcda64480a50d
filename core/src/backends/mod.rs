//! Kernel interfaces that backends implement.

pub mod broadcast;
pub mod map;
pub mod matmul;
pub mod reduce;

pub mod ops;

/// Marker for a set of kernels. Op availability is expressed through the
/// traits in [`ops`].
pub trait Backend {}
