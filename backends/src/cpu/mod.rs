mod backend;
pub use backend::CpuBackend;

pub mod ops;
