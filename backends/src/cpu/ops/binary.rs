use deferral_core::{
    Layout, LazyError, Result, backends::broadcast::BroadcastFunc, layout::broadcast_shapes,
};
use deferral_storage::cpu::{CpuDtype, CpuStorage};

/// Applies `f` over the right-aligned broadcast of both operands.
///
/// Size-1 and missing leading dims are stretched through
/// `Layout::broadcast_index`, so neither operand has to be contiguous.
fn broadcast_with<U: CpuDtype>(
    name: &str,
    lhs_layout: &Layout,
    lhs_storage: &CpuStorage<U>,
    rhs_layout: &Layout,
    rhs_storage: &CpuStorage<U>,
    f: impl Fn(U, U) -> Option<U>,
) -> Result<CpuStorage<U>> {
    let output_layout = Layout::new(broadcast_shapes(&lhs_layout.shape, &rhs_layout.shape)?);

    let output_data = (0..output_layout.count_elements())
        .map(|output_idx| {
            let output_indices = output_layout.unravel_index(output_idx);
            let lhs = lhs_storage.data[lhs_layout.broadcast_index(&output_indices)];
            let rhs = rhs_storage.data[rhs_layout.broadcast_index(&output_indices)];
            f(lhs, rhs).ok_or_else(|| {
                LazyError::Kernel(format!("{name} is undefined for {lhs:?} and {rhs:?}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CpuStorage { data: output_data })
}

macro_rules! broadcast_kernel {
    ($kernel:ident, $label:literal, |$a:ident, $b:ident| $body:expr) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $kernel;

        impl<U: CpuDtype> BroadcastFunc<CpuStorage<U>> for $kernel {
            fn forward(
                &self,
                lhs_layout: &Layout,
                lhs_storage: &CpuStorage<U>,
                rhs_layout: &Layout,
                rhs_storage: &CpuStorage<U>,
            ) -> Result<CpuStorage<U>> {
                broadcast_with(
                    $label,
                    lhs_layout,
                    lhs_storage,
                    rhs_layout,
                    rhs_storage,
                    |$a: U, $b: U| $body,
                )
            }

            fn as_str(&self) -> String {
                format!("{}({})", $label, std::any::type_name::<U>())
            }
        }
    };
}

broadcast_kernel!(CpuAdd, "CpuAdd", |a, b| a.try_add(b));
broadcast_kernel!(CpuSubtract, "CpuSubtract", |a, b| a.try_sub(b));
broadcast_kernel!(CpuMultiply, "CpuMultiply", |a, b| a.try_mul(b));
broadcast_kernel!(CpuDivide, "CpuDivide", |a, b| a.true_div(b));
broadcast_kernel!(CpuTruncDivide, "CpuTruncDivide", |a, b| a.trunc_div(b));
broadcast_kernel!(CpuRemainder, "CpuRemainder", |a, b| a.remainder(b));
broadcast_kernel!(CpuPow, "CpuPow", |a, b| CpuDtype::pow(a, b));
broadcast_kernel!(CpuMaximum, "CpuMaximum", |a, b| Some(if a >= b { a } else { b }));
broadcast_kernel!(CpuMinimum, "CpuMinimum", |a, b| Some(if a <= b { a } else { b }));
