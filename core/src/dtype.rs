//! Element types carried by tensor descriptors.

use std::fmt::{self, Debug, Display};

use num_traits::{NumCast, ToPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
}

impl DType {
    /// Number of bytes per scalar element.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I32 => "i32",
            DType::I64 => "i64",
        };
        f.write_str(name)
    }
}

/// A Rust scalar type that can live inside a tensor.
pub trait Element:
    Copy + Debug + PartialEq + PartialOrd + NumCast + Send + Sync + 'static
{
    const DTYPE: DType;

    fn as_f64(self) -> Option<f64> {
        ToPrimitive::to_f64(&self)
    }

    /// Truncates toward zero, the way an `int()` conversion does.
    fn as_i64(self) -> Option<i64> {
        ToPrimitive::to_i64(&self)
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_dtypes() {
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
        assert_eq!(<i64 as Element>::DTYPE, DType::I64);
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert!(!DType::I32.is_float());
    }

    #[test]
    fn test_as_i64_truncates() {
        assert_eq!(Element::as_i64(13.5f32), Some(13));
        assert_eq!(Element::as_i64(-17.5f64), Some(-17));
    }
}
