pub mod device;
pub mod dtype;
pub mod error;
pub mod meta;

pub mod layout;
pub mod storage;
pub mod tensor;

pub mod func;
pub mod indexible;
pub mod lift;
pub mod runnable;

pub mod backends;

pub use device::Device;
pub use dtype::{DType, Element};
pub use error::{LazyError, Result};
pub use func::{BoundFunction, EagerFunc, Kwargs, LazyFunction, PrepassFunc, Reducer};
pub use indexible::Indexible;
pub use layout::Layout;
pub use lift::{Operand, lift};
pub use meta::TensorMeta;
pub use runnable::Runnable;
pub use storage::Storage;
pub use tensor::{DelayedTensor, LazyTensor, NodeId, Tensor};
