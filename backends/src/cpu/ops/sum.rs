use deferral_core::{Layout, LazyError, Result, backends::reduce::ReduceFunc};
use deferral_storage::cpu::{CpuDtype, CpuStorage};

#[derive(Debug, Default, Clone, Copy)]
pub struct CpuSum;

impl<U: CpuDtype> ReduceFunc<CpuStorage<U>> for CpuSum {
    fn forward(&self, layout: &Layout, storage: &CpuStorage<U>, dim: i32) -> Result<CpuStorage<U>> {
        let udim = layout.signed_dim_to_unsigned_dim(dim)?;
        let output_layout = layout.reduce(udim);

        let output_data = (0..output_layout.count_elements())
            .map(|output_idx| {
                let output_indices = output_layout.unravel_index(output_idx);

                (0..layout.shape[udim]).try_fold(U::zero(), |sum, reduce_idx| {
                    let mut input_indices = output_indices.clone();
                    input_indices.insert(udim, reduce_idx);
                    let value = storage.data[layout.ravel_index(&input_indices)];
                    sum.try_add(value).ok_or_else(|| {
                        LazyError::Kernel(format!("CpuSum overflowed adding {value:?} to {sum:?}"))
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CpuStorage { data: output_data })
    }

    fn as_str(&self) -> String {
        format!("CpuSum({})", std::any::type_name::<U>())
    }
}

#[cfg(test)]
mod tests {
    use deferral_core::Tensor;

    use super::*;

    fn cube() -> Tensor<CpuStorage<f32>> {
        Tensor::from_vec(vec![2, 2, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap()
    }

    #[test]
    fn test_sum_3d() {
        let result = cube().reduce(2, &CpuSum).unwrap();
        assert_eq!(result.shape(), &[2, 2]);
        assert_eq!(result.storage.data, vec![3.0, 7.0, 11.0, 15.0]);
    }

    #[test]
    fn test_sum_leading_dim() {
        let result = cube().reduce(0, &CpuSum).unwrap();
        assert_eq!(result.storage.data, vec![6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn test_sum_negative_dim() {
        let result = cube().reduce(-2, &CpuSum).unwrap();
        assert_eq!(result.storage.data, vec![4.0, 6.0, 12.0, 14.0]);
    }

    #[test]
    fn test_sum_to_scalar() {
        let vector = Tensor::<CpuStorage<i64>>::from_vec(vec![4], vec![1, 2, 3, 4]).unwrap();
        let result = vector.reduce(0, &CpuSum).unwrap();
        assert!(result.shape().is_empty());
        assert_eq!(result.item().unwrap(), 10);
    }

    #[test]
    fn test_sum_overflow() {
        let vector = Tensor::<CpuStorage<i32>>::from_vec(vec![2], vec![i32::MAX, 1]).unwrap();
        assert!(matches!(vector.reduce(0, &CpuSum), Err(LazyError::Kernel(_))));
    }

    #[test]
    fn test_sum_out_of_range() {
        assert!(cube().reduce(3, &CpuSum).is_err());
    }
}
