use std::fmt::Debug;

use crate::{error::Result, layout::Layout, storage::Storage};

/// Binary kernel over right-aligned, broadcast operands.
pub trait BroadcastFunc<S: Storage>: Debug + Send + Sync {
    fn forward(
        &self,
        lhs_layout: &Layout,
        lhs_storage: &S,
        rhs_layout: &Layout,
        rhs_storage: &S,
    ) -> Result<S>;

    fn as_str(&self) -> String;
}
