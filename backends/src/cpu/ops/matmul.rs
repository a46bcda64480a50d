use deferral_core::{
    Layout, LazyError, Result, Storage, backends::matmul::MatmulFunc, layout::broadcast_shapes,
};
use deferral_storage::cpu::{CpuDtype, CpuStorage};

/// Batched matrix product with numpy promotion.
///
/// A 1-D lhs is treated as a single row and a 1-D rhs as a single column.
/// Leading batch dims broadcast. The output is written in batch-major,
/// row-major order; the caller decides which promoted dims to drop.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuMatmul;

fn promote(shape: &[usize], is_lhs: bool) -> Vec<usize> {
    match (shape.len(), is_lhs) {
        (1, true) => vec![1, shape[0]],
        (1, false) => vec![shape[0], 1],
        _ => shape.to_vec(),
    }
}

impl<U: CpuDtype> MatmulFunc<CpuStorage<U>> for CpuMatmul {
    fn forward(
        &self,
        lhs_layout: &Layout,
        lhs_storage: &CpuStorage<U>,
        rhs_layout: &Layout,
        rhs_storage: &CpuStorage<U>,
    ) -> Result<CpuStorage<U>> {
        if lhs_layout.is_scalar() || rhs_layout.is_scalar() {
            return Err(LazyError::Kernel(
                "matmul operands must have at least one dimension".to_string(),
            ));
        }
        let lhs_data = lhs_storage.contiguous(lhs_layout).data;
        let rhs_data = rhs_storage.contiguous(rhs_layout).data;
        let lhs_layout = Layout::new(promote(&lhs_layout.shape, true));
        let rhs_layout = Layout::new(promote(&rhs_layout.shape, false));

        let lhs_rank = lhs_layout.shape.len();
        let rhs_rank = rhs_layout.shape.len();
        let (rows, reduced_size) = (lhs_layout.shape[lhs_rank - 2], lhs_layout.shape[lhs_rank - 1]);
        let (inner, cols) = (rhs_layout.shape[rhs_rank - 2], rhs_layout.shape[rhs_rank - 1]);
        if reduced_size != inner {
            return Err(LazyError::Kernel(format!(
                "matmul inner dimensions differ: {:?} @ {:?}",
                lhs_layout.shape, rhs_layout.shape
            )));
        }

        let mut out_shape = broadcast_shapes(
            &lhs_layout.shape[..lhs_rank - 2],
            &rhs_layout.shape[..rhs_rank - 2],
        )?;
        out_shape.push(rows);
        out_shape.push(cols);
        let output_layout = Layout::new(out_shape);
        tracing::trace!(
            "CpuMatmul {:?} @ {:?} -> {:?}",
            lhs_layout.shape,
            rhs_layout.shape,
            output_layout.shape
        );

        let output_data = (0..output_layout.count_elements())
            .map(|output_idx| {
                let output_indices = output_layout.unravel_index(output_idx);
                let (batch, tail) = output_indices.split_at(output_indices.len() - 2);
                let (i_idx, k_idx) = (tail[0], tail[1]);

                let mut lhs_indices = batch.to_vec();
                let mut rhs_indices = batch.to_vec();
                (0..reduced_size).try_fold(U::zero(), |acc, j_idx| {
                    lhs_indices.extend([i_idx, j_idx]);
                    rhs_indices.extend([j_idx, k_idx]);

                    let lhs = lhs_data[lhs_layout.broadcast_index(&lhs_indices)];
                    let rhs = rhs_data[rhs_layout.broadcast_index(&rhs_indices)];

                    lhs_indices.truncate(batch.len());
                    rhs_indices.truncate(batch.len());
                    lhs.try_mul(rhs)
                        .and_then(|product| acc.try_add(product))
                        .ok_or_else(|| {
                            LazyError::Kernel(format!(
                                "CpuMatmul overflowed accumulating {lhs:?} * {rhs:?}"
                            ))
                        })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CpuStorage { data: output_data })
    }

    fn as_str(&self) -> String {
        format!("CpuMatmul({})", std::any::type_name::<U>())
    }
}
