use std::fmt::Debug;

use crate::{error::Result, layout::Layout, storage::Storage};

pub trait MatmulFunc<S: Storage>: Debug + Send + Sync {
    fn forward(
        &self,
        lhs_layout: &Layout,
        lhs_storage: &S,
        rhs_layout: &Layout,
        rhs_storage: &S,
    ) -> Result<S>;

    fn as_str(&self) -> String;
}
