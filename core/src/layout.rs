use crate::error::{LazyError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub offset: usize,
}

impl Layout {
    pub fn new(shape: Vec<usize>) -> Self {
        let strides = contiguous_strides(&shape);

        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    pub fn count_elements(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == contiguous_strides(&self.shape)
    }

    pub fn ravel_index(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(
            indices.len(),
            self.shape.len(),
            "Indices length must match shape length"
        );
        indices
            .iter()
            .zip(self.strides.iter())
            .map(|(&index, &stride)| index * stride)
            .sum::<usize>()
            + self.offset
    }

    /// Inverse of `ravel_index` for a contiguous layout.
    pub fn unravel_index(&self, index: usize) -> Vec<usize> {
        let mut indices = vec![0; self.shape.len()];
        let mut idx = index;
        for (i, &stride) in self.strides.iter().enumerate() {
            if stride == 0 {
                continue;
            }
            indices[i] = idx / stride;
            idx %= stride;
        }
        indices
    }

    /// Flat index of the element addressed by `out_indices` in a broadcast
    /// output shape. Indices are right-aligned and size-1 dims are stretched.
    pub fn broadcast_index(&self, out_indices: &[usize]) -> usize {
        let lead = out_indices.len() - self.shape.len();
        self.shape
            .iter()
            .zip(self.strides.iter())
            .zip(&out_indices[lead..])
            .map(|((&dim, &stride), &index)| if dim == 1 { 0 } else { index * stride })
            .sum::<usize>()
            + self.offset
    }

    /// Contiguous layout with `dim` removed.
    pub fn reduce(&self, dim: usize) -> Self {
        let mut shape = self.shape.clone();
        shape.remove(dim);
        Layout::new(shape)
    }

    pub fn signed_dim_to_unsigned_dim(&self, dim: i32) -> Result<usize> {
        normalize_dim(dim, self.shape.len())
    }
}

fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = shape
        .iter()
        .rev()
        .scan(1, |acc, &dim| {
            let current = *acc;
            *acc *= dim;
            Some(current)
        })
        .collect::<Vec<_>>();
    strides.reverse();
    strides
}

/// Maps a possibly negative dim onto `0..rank`.
pub fn normalize_dim(dim: i32, rank: usize) -> Result<usize> {
    let udim = if dim < 0 {
        rank as i64 + dim as i64
    } else {
        dim as i64
    };
    if udim < 0 || udim >= rank as i64 {
        return Err(LazyError::Inference(format!(
            "dimension {dim} out of range for rank {rank}"
        )));
    }
    Ok(udim as usize)
}

/// Right-aligned broadcast of two shapes.
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let rank = lhs.len().max(rhs.len());
    let mut out = vec![0; rank];
    for i in 0..rank {
        let l = if i < rank - lhs.len() { 1 } else { lhs[i - (rank - lhs.len())] };
        let r = if i < rank - rhs.len() { 1 } else { rhs[i - (rank - rhs.len())] };
        out[i] = match (l, r) {
            (l, r) if l == r => l,
            (1, r) => r,
            (l, 1) => l,
            _ => {
                return Err(LazyError::Inference(format!(
                    "shapes {lhs:?} and {rhs:?} cannot be broadcast"
                )));
            }
        };
    }
    Ok(out)
}

/// Output shape of a matrix product with numpy promotion of 1-D operands.
pub fn matmul_shape(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    if lhs.is_empty() || rhs.is_empty() {
        return Err(LazyError::Inference(
            "matmul operands must have at least one dimension".to_string(),
        ));
    }
    let lhs_rows = if lhs.len() == 1 { 1 } else { lhs[lhs.len() - 2] };
    let lhs_inner = lhs[lhs.len() - 1];
    let (rhs_inner, rhs_cols) = if rhs.len() == 1 {
        (rhs[0], 1)
    } else {
        (rhs[rhs.len() - 2], rhs[rhs.len() - 1])
    };
    if lhs_inner != rhs_inner {
        return Err(LazyError::Inference(format!(
            "matmul inner dimensions differ: {lhs:?} @ {rhs:?}"
        )));
    }

    let lhs_batch = &lhs[..lhs.len().saturating_sub(2)];
    let rhs_batch = &rhs[..rhs.len().saturating_sub(2)];
    let mut out = broadcast_shapes(lhs_batch, rhs_batch)?;
    if lhs.len() > 1 {
        out.push(lhs_rows);
    }
    if rhs.len() > 1 {
        out.push(rhs_cols);
    }
    Ok(out)
}
