use deferral_core::dtype::Element;
use num_traits::{Float, Signed};

/// Element types the CPU kernels operate on.
///
/// The fallible operations return `None` where the integer result is
/// undefined (division by zero, negative exponents, overflow).
pub trait CpuDtype: Element + Signed + PartialOrd {
    fn try_add(self, rhs: Self) -> Option<Self>;

    fn try_sub(self, rhs: Self) -> Option<Self>;

    fn try_mul(self, rhs: Self) -> Option<Self>;

    fn try_neg(self) -> Option<Self>;

    fn try_abs(self) -> Option<Self>;

    /// `/`. Integers round toward zero.
    fn true_div(self, rhs: Self) -> Option<Self>;

    fn trunc_div(self, rhs: Self) -> Option<Self>;

    /// Remainder with the sign of the divisor.
    fn remainder(self, rhs: Self) -> Option<Self>;

    fn pow(self, rhs: Self) -> Option<Self>;
}

fn adjust_remainder<T: Signed + PartialOrd + Copy>(rem: T, rhs: T) -> T {
    if !rem.is_zero() && (rem < T::zero()) != (rhs < T::zero()) {
        rem + rhs
    } else {
        rem
    }
}

macro_rules! impl_float_dtype {
    ($($t:ty),*) => {
        $(
            impl CpuDtype for $t {
                fn try_add(self, rhs: Self) -> Option<Self> {
                    Some(self + rhs)
                }

                fn try_sub(self, rhs: Self) -> Option<Self> {
                    Some(self - rhs)
                }

                fn try_mul(self, rhs: Self) -> Option<Self> {
                    Some(self * rhs)
                }

                fn try_neg(self) -> Option<Self> {
                    Some(-self)
                }

                fn try_abs(self) -> Option<Self> {
                    Some(Float::abs(self))
                }

                fn true_div(self, rhs: Self) -> Option<Self> {
                    Some(self / rhs)
                }

                fn trunc_div(self, rhs: Self) -> Option<Self> {
                    Some(Float::trunc(self / rhs))
                }

                fn remainder(self, rhs: Self) -> Option<Self> {
                    Some(adjust_remainder(self % rhs, rhs))
                }

                fn pow(self, rhs: Self) -> Option<Self> {
                    Some(Float::powf(self, rhs))
                }
            }
        )*
    };
}

macro_rules! impl_int_dtype {
    ($($t:ty),*) => {
        $(
            impl CpuDtype for $t {
                fn try_add(self, rhs: Self) -> Option<Self> {
                    self.checked_add(rhs)
                }

                fn try_sub(self, rhs: Self) -> Option<Self> {
                    self.checked_sub(rhs)
                }

                fn try_mul(self, rhs: Self) -> Option<Self> {
                    self.checked_mul(rhs)
                }

                fn try_neg(self) -> Option<Self> {
                    self.checked_neg()
                }

                fn try_abs(self) -> Option<Self> {
                    self.checked_abs()
                }

                fn true_div(self, rhs: Self) -> Option<Self> {
                    self.checked_div(rhs)
                }

                fn trunc_div(self, rhs: Self) -> Option<Self> {
                    self.checked_div(rhs)
                }

                fn remainder(self, rhs: Self) -> Option<Self> {
                    self.checked_rem(rhs).map(|rem| adjust_remainder(rem, rhs))
                }

                fn pow(self, rhs: Self) -> Option<Self> {
                    let exp = u32::try_from(rhs).ok()?;
                    self.checked_pow(exp)
                }
            }
        )*
    };
}

impl_float_dtype!(f32, f64);
impl_int_dtype!(i32, i64);
