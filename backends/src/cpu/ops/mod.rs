mod binary;
pub use binary::{
    CpuAdd, CpuDivide, CpuMaximum, CpuMinimum, CpuMultiply, CpuPow, CpuRemainder, CpuSubtract,
    CpuTruncDivide,
};

mod map;
pub use map::{
    CpuAbs, CpuAcos, CpuAcosh, CpuAsin, CpuAsinh, CpuAtan, CpuAtanh, CpuCos, CpuCosh, CpuExp, CpuExp2,
    CpuFrac, CpuLog, CpuLog10, CpuLog1p, CpuLog2, CpuNeg, CpuRelu, CpuSin, CpuSinh, CpuTan,
    CpuTanh,
};

mod matmul;
pub use matmul::CpuMatmul;

mod sum;
pub use sum::CpuSum;
