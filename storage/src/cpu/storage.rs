use deferral_core::{Device, Layout, storage::Storage};

use super::dtype::CpuDtype;

#[derive(Debug, Clone, PartialEq)]
pub struct CpuStorage<T: CpuDtype> {
    pub data: Vec<T>,
}

impl<T: CpuDtype> CpuStorage<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T: CpuDtype> Storage for CpuStorage<T> {
    type Inner = T;

    fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn contiguous(&self, layout: &Layout) -> Self {
        let output_layout = Layout::new(layout.shape.clone());
        let output_data = (0..output_layout.count_elements())
            .map(|output_idx| {
                let output_idx_unraveled = output_layout.unravel_index(output_idx);
                self.data[layout.ravel_index(&output_idx_unraveled)]
            })
            .collect();

        CpuStorage { data: output_data }
    }
}

#[cfg(test)]
mod tests {
    use deferral_core::{DType, Tensor};

    use super::*;

    #[test]
    fn test_contiguous_gathers_strided_view() {
        let storage = CpuStorage::new(vec![1i32, 2, 3, 4, 5, 6]);
        let transposed = Layout {
            shape: vec![3, 2],
            strides: vec![1, 3],
            offset: 0,
        };
        assert_eq!(storage.contiguous(&transposed).data, vec![1, 4, 2, 5, 3, 6]);

        let column = Layout {
            shape: vec![2],
            strides: vec![3],
            offset: 1,
        };
        assert_eq!(storage.contiguous(&column).data, vec![2, 5]);
    }

    #[test]
    fn test_dtype_follows_element() {
        let tensor = Tensor::<CpuStorage<f32>>::scalar(1.0);
        assert_eq!(tensor.dtype(), DType::F32);
        assert_eq!(tensor.device(), Device::Cpu);
    }
}
