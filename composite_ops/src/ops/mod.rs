mod matmul;
pub use matmul::MatMul;

mod softmax;
pub use softmax::Softmax;
