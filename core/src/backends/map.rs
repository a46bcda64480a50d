use std::fmt::Debug;

use crate::{error::Result, layout::Layout, storage::Storage};

/// Elementwise kernel. Output has the input's shape in contiguous order.
pub trait MapFunc<S: Storage>: Debug + Send + Sync {
    fn forward(&self, layout: &Layout, storage: &S) -> Result<S>;

    fn as_str(&self) -> String;
}
