mod dtype;
pub use dtype::CpuDtype;

mod storage;
pub use storage::CpuStorage;
