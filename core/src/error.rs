//! Error taxonomy shared by lifting, inference, evaluation and kernels.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LazyError {
    /// The value handed to lifting is not a valid tensor-like input.
    #[error("cannot lift value: {0}")]
    Lifting(String),

    /// The prepass could not derive a descriptor for the given operands.
    #[error("cannot infer result metadata: {0}")]
    Inference(String),

    /// The evaluated result disagrees with the descriptor committed at construction.
    #[error("shape mismatch in `{op}`: predicted {expected:?}, evaluated {found:?}")]
    ShapeMismatch {
        op: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// The operand combination is deliberately not supported.
    #[error("`{op}` is not supported: {reason}")]
    Unsupported { op: String, reason: String },

    /// A positional container was addressed past its end.
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A kernel or eager function failed on its own terms.
    #[error("kernel failed: {0}")]
    Kernel(String),
}

impl LazyError {
    pub fn unsupported(op: impl Into<String>, reason: impl Into<String>) -> Self {
        LazyError::Unsupported {
            op: op.into(),
            reason: reason.into(),
        }
    }

    /// True for the "not supported" signal, which callers may answer with a fallback.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, LazyError::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, LazyError>;
