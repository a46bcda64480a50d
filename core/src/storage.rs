use std::fmt::Debug;

use crate::device::Device;
use crate::dtype::{DType, Element};
use crate::layout::Layout;

pub trait Storage: Clone + Debug + Send + Sync + 'static {
    type Inner: Element;

    fn from_vec(data: Vec<Self::Inner>) -> Self;

    fn to_vec(&self) -> Vec<Self::Inner>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dtype(&self) -> DType {
        <Self::Inner as Element>::DTYPE
    }

    fn device(&self) -> Device;

    /// Copies the elements addressed by `layout` into row-major order.
    fn contiguous(&self, layout: &Layout) -> Self;
}
