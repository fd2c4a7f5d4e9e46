//! Tensor operations consumed by the sparse intersection pipeline
//!
//! Operations are defined as a trait implemented by a backend's
//! `RuntimeClient`. This gives operations access to the device and allocator
//! for creating output tensors, and keeps the sparse layer generic over
//! backends.

mod dispatch;

use crate::dtype::DType;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Binary operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
}

impl BinaryOp {
    /// Whether `a op b == b op a` for all inputs
    #[inline]
    pub const fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Mul)
    }
}

/// Compute the broadcast shape of two shapes (NumPy rules)
///
/// Returns None if the shapes are incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let max_ndim = a.len().max(b.len());
    let mut result = Vec::with_capacity(max_ndim);

    // Iterate from right to left
    for i in 0..max_ndim {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        if a_dim == b_dim {
            result.push(a_dim);
        } else if a_dim == 1 {
            result.push(b_dim);
        } else if b_dim == 1 {
            result.push(a_dim);
        } else {
            return None; // Incompatible shapes
        }
    }

    result.reverse();
    Some(result)
}

/// Dense tensor operations required by the sparse layer
///
/// Implemented by a backend's client type. These are exactly the collaborator
/// primitives the intersection pipeline consumes: sort with an inverting
/// permutation, an inclusive prefix sum in a caller-selected accumulator
/// width, a leading-axis gather, promoted elementwise arithmetic, explicit
/// casts, index range generation, and the single-scalar host readback that
/// forms the pipeline's synchronization point.
pub trait TensorOps<R: Runtime> {
    /// Elementwise binary operation with NumPy-style dtype promotion and
    /// trailing-dimension broadcasting
    fn binary_op(&self, op: BinaryOp, a: &Tensor<R>, b: &Tensor<R>) -> Result<Tensor<R>>;

    /// Cast a tensor to another dtype (no-op copy when dtypes match)
    fn cast(&self, a: &Tensor<R>, dtype: DType) -> Result<Tensor<R>>;

    /// Select rows of `a` along its leading axis
    ///
    /// `out[i, ...] = a[index[i], ...]`. Trailing dimensions are carried along
    /// unchanged. `index` must be 1-D with dtype I32 or I64.
    fn index_select(&self, a: &Tensor<R>, index: &Tensor<R>) -> Result<Tensor<R>>;

    /// Inclusive prefix sum of a 1-D tensor, accumulated in `acc_dtype`
    fn cumsum(&self, a: &Tensor<R>, acc_dtype: DType) -> Result<Tensor<R>>;

    /// Sort a 1-D tensor ascending, returning sorted values and the
    /// permutation mapping sorted positions back to original positions (I64)
    ///
    /// Stability is not required, but `sorted[i] == a[permutation[i]]` must
    /// hold exactly.
    fn sort_with_indices(&self, a: &Tensor<R>) -> Result<(Tensor<R>, Tensor<R>)>;

    /// Create a 1-D tensor holding `0, 1, ..., len - 1` in the given dtype
    fn arange(&self, len: usize, dtype: DType) -> Result<Tensor<R>>;

    /// Read a single element of a 1-D integer tensor back to the host
    ///
    /// This is a synchronization point: it blocks until all pending work that
    /// produces `a` has completed. Supports I32 and I64 tensors.
    fn scalar_i64(&self, a: &Tensor<R>, index: usize) -> Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[2, 3], &[2, 3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[2, 1], &[2, 3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[3], &[2, 3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[4], &[]), Some(vec![4]));
        assert_eq!(broadcast_shape(&[2, 2], &[2, 3]), None);
    }

    #[test]
    fn test_commutativity() {
        assert!(BinaryOp::Add.is_commutative());
        assert!(BinaryOp::Mul.is_commutative());
        assert!(!BinaryOp::Sub.is_commutative());
        assert!(!BinaryOp::Div.is_commutative());
    }
}
