use std::fmt::Debug;

use crate::{error::Result, layout::Layout, storage::Storage};

/// Collapses one dimension. `dim` may be negative.
pub trait ReduceFunc<S: Storage>: Debug + Send + Sync {
    fn forward(&self, layout: &Layout, storage: &S, dim: i32) -> Result<S>;

    fn as_str(&self) -> String;
}
