use std::borrow::Cow;

use deferral_core::{Layout, LazyError, Result, Storage, backends::map::MapFunc};
use deferral_storage::cpu::{CpuDtype, CpuStorage};
use num_traits::{Float, Signed};

fn dense<'a, U: CpuDtype>(layout: &Layout, storage: &'a CpuStorage<U>) -> Cow<'a, [U]> {
    if layout.is_contiguous() && storage.data.len() == layout.count_elements() {
        Cow::Borrowed(&storage.data)
    } else {
        Cow::Owned(storage.contiguous(layout).data)
    }
}

macro_rules! map_kernel {
    ($kernel:ident, $label:literal, $bound:path, |$x:ident| $body:expr) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $kernel;

        impl<U: CpuDtype + $bound> MapFunc<CpuStorage<U>> for $kernel {
            fn forward(&self, layout: &Layout, storage: &CpuStorage<U>) -> Result<CpuStorage<U>> {
                let transformed_data = dense(layout, storage)
                    .iter()
                    .map(|&$x| {
                        let result: Option<U> = $body;
                        result.ok_or_else(|| {
                            LazyError::Kernel(format!("{} is undefined for {:?}", $label, $x))
                        })
                    })
                    .collect::<Result<Vec<U>>>()?;

                Ok(CpuStorage {
                    data: transformed_data,
                })
            }

            fn as_str(&self) -> String {
                format!("{}({})", $label, std::any::type_name::<U>())
            }
        }
    };
}

map_kernel!(CpuNeg, "CpuNeg", Signed, |x| x.try_neg());
map_kernel!(CpuAbs, "CpuAbs", Signed, |x| x.try_abs());
map_kernel!(CpuRelu, "CpuRelu", Signed, |x| Some(if x > U::zero() { x } else { U::zero() }));

map_kernel!(CpuExp, "CpuExp", Float, |x| Some(Float::exp(x)));
map_kernel!(CpuLog, "CpuLog", Float, |x| Some(Float::ln(x)));
map_kernel!(CpuSin, "CpuSin", Float, |x| Some(Float::sin(x)));
map_kernel!(CpuCos, "CpuCos", Float, |x| Some(Float::cos(x)));
map_kernel!(CpuTanh, "CpuTanh", Float, |x| Some(Float::tanh(x)));
map_kernel!(CpuFrac, "CpuFrac", Float, |x| Some(Float::fract(x)));
map_kernel!(CpuExp2, "CpuExp2", Float, |x| Some(Float::exp2(x)));
map_kernel!(CpuLog2, "CpuLog2", Float, |x| Some(Float::log2(x)));
map_kernel!(CpuLog10, "CpuLog10", Float, |x| Some(Float::log10(x)));
map_kernel!(CpuLog1p, "CpuLog1p", Float, |x| Some(Float::ln_1p(x)));
map_kernel!(CpuTan, "CpuTan", Float, |x| Some(Float::tan(x)));
map_kernel!(CpuAsin, "CpuAsin", Float, |x| Some(Float::asin(x)));
map_kernel!(CpuAcos, "CpuAcos", Float, |x| Some(Float::acos(x)));
map_kernel!(CpuAtan, "CpuAtan", Float, |x| Some(Float::atan(x)));
map_kernel!(CpuSinh, "CpuSinh", Float, |x| Some(Float::sinh(x)));
map_kernel!(CpuCosh, "CpuCosh", Float, |x| Some(Float::cosh(x)));
map_kernel!(CpuAsinh, "CpuAsinh", Float, |x| Some(Float::asinh(x)));
map_kernel!(CpuAcosh, "CpuAcosh", Float, |x| Some(Float::acosh(x)));
map_kernel!(CpuAtanh, "CpuAtanh", Float, |x| Some(Float::atanh(x)));
