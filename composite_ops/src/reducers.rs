use deferral_core::{LazyError, Reducer, Result, Storage, Tensor};

/// Joins partial results end to end along one dimension.
#[derive(Debug, Clone, Copy)]
pub struct Concat {
    dim: usize,
}

impl Concat {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<S: Storage> Reducer<S> for Concat {
    fn dim(&self) -> usize {
        self.dim
    }

    fn reduce(&self, partials: Vec<Tensor<S>>) -> Result<Tensor<S>> {
        let first = partials
            .first()
            .ok_or_else(|| LazyError::Kernel("concat needs at least one partial".to_string()))?;
        let rank = first.shape().len();
        if self.dim >= rank {
            return Err(LazyError::Kernel(format!(
                "cannot concat rank {rank} partials along dim {}",
                self.dim
            )));
        }

        let mut shape = first.shape().to_vec();
        shape[self.dim] = 0;
        for partial in &partials {
            let compatible = partial.shape().len() == rank
                && partial
                    .shape()
                    .iter()
                    .zip(first.shape())
                    .enumerate()
                    .all(|(i, (a, b))| i == self.dim || a == b);
            if !compatible {
                return Err(LazyError::Kernel(format!(
                    "partial of shape {:?} does not line up with {:?} along dim {}",
                    partial.shape(),
                    first.shape(),
                    self.dim
                )));
            }
            shape[self.dim] += partial.shape()[self.dim];
        }

        // Row-major: each partial contributes one contiguous chunk per
        // outer index.
        let outer = first.shape()[..self.dim].iter().product::<usize>();
        let chunks = partials
            .iter()
            .map(|partial| {
                let data = partial.to_vec();
                let width = partial.shape()[self.dim..].iter().product::<usize>();
                (data, width)
            })
            .collect::<Vec<_>>();
        let mut data = Vec::with_capacity(shape.iter().product());
        for o in 0..outer {
            for (chunk, width) in &chunks {
                data.extend_from_slice(&chunk[o * width..(o + 1) * width]);
            }
        }

        tracing::trace!("Concatenated {} partials into {:?}", partials.len(), shape);
        Tensor::from_vec(shape, data)
    }
}

#[cfg(test)]
mod tests {
    use deferral_storage::cpu::CpuStorage;

    use super::*;

    type S = CpuStorage<i32>;

    fn tensor(shape: &[usize], data: Vec<i32>) -> Tensor<S> {
        Tensor::from_vec(shape.to_vec(), data).unwrap()
    }

    #[test]
    fn test_concat_rows() {
        let combined = Reducer::<S>::reduce(
            &Concat::new(0),
            vec![tensor(&[1, 2], vec![1, 2]), tensor(&[2, 2], vec![3, 4, 5, 6])],
        )
        .unwrap();
        assert_eq!(combined.shape(), &[3, 2]);
        assert_eq!(combined.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_concat_columns_interleaves() {
        let combined = Reducer::<S>::reduce(
            &Concat::new(1),
            vec![tensor(&[2, 1], vec![1, 2]), tensor(&[2, 2], vec![3, 4, 5, 6])],
        )
        .unwrap();
        assert_eq!(combined.shape(), &[2, 3]);
        assert_eq!(combined.to_vec(), vec![1, 3, 4, 2, 5, 6]);
    }

    #[test]
    fn test_concat_rejects_misaligned() {
        let err = Reducer::<S>::reduce(
            &Concat::new(0),
            vec![tensor(&[1, 2], vec![1, 2]), tensor(&[1, 3], vec![3, 4, 5])],
        );
        assert!(err.is_err());
        assert!(Reducer::<S>::reduce(&Concat::new(0), Vec::new()).is_err());
    }
}
