use deferral_core::backends::Backend;
use deferral_macros::BackendOps;

use super::ops::{
    CpuAbs, CpuAcos, CpuAcosh, CpuAdd, CpuAsin, CpuAsinh, CpuAtan, CpuAtanh, CpuCos, CpuCosh,
    CpuDivide, CpuExp, CpuExp2, CpuFrac, CpuLog, CpuLog10, CpuLog1p, CpuLog2, CpuMatmul,
    CpuMaximum, CpuMinimum, CpuMultiply, CpuNeg, CpuPow, CpuRelu, CpuRemainder, CpuSin, CpuSinh,
    CpuSubtract, CpuSum, CpuTan, CpuTanh, CpuTruncDivide,
};

/// Host kernels over `CpuStorage`.
#[derive(Debug, Default, Clone, Copy, BackendOps)]
#[backend_ops(ops = [
    "Neg", "Abs", "Exp", "Log", "Sin", "Cos", "Tanh", "Relu",
    "Frac", "Exp2", "Log2", "Log10", "Log1p", "Tan", "Asin", "Acos", "Atan",
    "Sinh", "Cosh", "Asinh", "Acosh", "Atanh",
    "Add", "Subtract", "Multiply", "Divide", "TruncDivide", "Remainder", "Pow", "Maximum", "Minimum",
    "Sum", "Matmul",
])]
pub struct CpuBackend;

impl Backend for CpuBackend {}
