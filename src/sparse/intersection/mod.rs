//! Intersection-driven binary elementwise operations
//!
//! The result of `op(x, y)` over the intersection domain has a nonzero at
//! coordinate `c` exactly when both `x` and `y` have a nonzero at `c` (by
//! multiplicity for uncoalesced inputs: `m` copies in `x` and `n` in `y`
//! produce `m * n` matched pairs). Values are `op` applied to the paired
//! value rows, cast to the output's declared dtype.
//!
//! The pipeline is a hash join (see [`kernel`]): probe coordinates are
//! perfect-hashed and sorted, source coordinates binary-search the sorted
//! hashes, match counts are prefix-summed into output offsets, and matches
//! are expanded into exactly-sized output buffers.
//!
//! Hash values and offsets are 32- or 64-bit depending on two independent
//! bounds, picked here before dispatching into the width-monomorphized
//! kernel: the hash width must fit the sparse-shape product (it bounds any
//! coordinate's hash), and the offset width must fit `x.nnz() * y.nnz()` (an
//! upper bound on the result's nonzero count, reached when all coordinates
//! collide). Mixing widths is deliberate: a small coordinate domain with
//! many matches wants 32-bit hashes and 64-bit offsets.

mod kernel;

use super::tensor::SparseTensor;
use crate::dtype::{can_cast, promote};
use crate::error::{Error, Result};
use crate::ops::{broadcast_shape, BinaryOp, TensorOps};
use crate::runtime::{Device, Launcher, Runtime, RuntimeClient};

use super::hash::hash_coefficients;

/// Apply a binary operation over the intersection of two sparse tensors
///
/// On success `res` is overwritten in place with the computed sparse tensor;
/// its prior contents are discarded. The dtype of `res` declares the output
/// dtype: the operands' promoted value type is cast into it, and the call
/// fails eagerly (before any kernel runs) if that cast is illegal.
///
/// `is_commutative` must be false for operators where `op(a, b) != op(b, a)`;
/// both inputs are then coalesced first so their coordinate sets are compared
/// in a single orientation.
///
/// # Preconditions
///
/// `x` and `y` must have equal rank, equal `sparse_dim`, equal sparse-shape
/// prefixes, and live on the same device. Violations fail with a descriptive
/// error before any allocation, leaving `res` untouched.
pub fn sparse_binary_op_intersection<R, C>(
    client: &C,
    res: &mut SparseTensor<R>,
    x: &SparseTensor<R>,
    y: &SparseTensor<R>,
    op: BinaryOp,
    is_commutative: bool,
) -> Result<()>
where
    R: Runtime,
    C: RuntimeClient<R> + TensorOps<R> + Launcher,
{
    let sparse_dim = x.sparse_dim();
    if x.shape().len() != y.shape().len()
        || sparse_dim != y.sparse_dim()
        || x.shape()[..sparse_dim] != y.shape()[..y.sparse_dim()]
    {
        return Err(Error::InvalidArgument {
            arg: "x, y",
            reason: format!(
                "expects sparse inputs with equal dimensionality, number of sparse dimensions, \
                 and shape of sparse dimensions; got shape {:?} with sparse_dim {} vs shape {:?} \
                 with sparse_dim {}",
                x.shape(),
                sparse_dim,
                y.shape(),
                y.sparse_dim()
            ),
        });
    }
    if !x.device().is_same(y.device()) {
        return Err(Error::DeviceMismatch);
    }

    let broadcasted_shape =
        broadcast_shape(x.shape(), y.shape()).ok_or_else(|| Error::broadcast(x.shape(), y.shape()))?;

    // The common dtype check matters because the operator produces promoted
    // values that may not land in res's dtype. Checked first: it is cheap and
    // failing after the join would waste every kernel run before it.
    let common = promote(x.dtype(), y.dtype());
    if !can_cast(common, res.dtype()) {
        return Err(Error::Cast {
            from: common,
            to: res.dtype(),
        });
    }

    let (coeffs, max_hash) = hash_coefficients(&broadcasted_shape[..sparse_dim])?;

    // Use 32-bit hashes when every hash fits; independently, use 32-bit
    // offsets when the worst-case intersection size fits.
    let hash_is_32 = max_hash <= i32::MAX as i64;
    let offset_is_32 = (x.nnz() as i64)
        .checked_mul(y.nnz() as i64)
        .map(|bound| bound <= i32::MAX as i64)
        .unwrap_or(false);

    match (hash_is_32, offset_is_32) {
        (true, true) => kernel::binary_op_intersection_impl::<R, C, i32, i32>(
            client, res, x, y, op, &broadcasted_shape, &coeffs, is_commutative,
        ),
        (true, false) => kernel::binary_op_intersection_impl::<R, C, i32, i64>(
            client, res, x, y, op, &broadcasted_shape, &coeffs, is_commutative,
        ),
        (false, true) => kernel::binary_op_intersection_impl::<R, C, i64, i32>(
            client, res, x, y, op, &broadcasted_shape, &coeffs, is_commutative,
        ),
        (false, false) => kernel::binary_op_intersection_impl::<R, C, i64, i64>(
            client, res, x, y, op, &broadcasted_shape, &coeffs, is_commutative,
        ),
    }
}

/// Elementwise multiplication over the intersection of nonzero coordinates
///
/// Convenience wrapper for the canonical intersection operation; see
/// [`sparse_binary_op_intersection`].
pub fn sparse_mul<R, C>(
    client: &C,
    res: &mut SparseTensor<R>,
    x: &SparseTensor<R>,
    y: &SparseTensor<R>,
) -> Result<()>
where
    R: Runtime,
    C: RuntimeClient<R> + TensorOps<R> + Launcher,
{
    sparse_binary_op_intersection(client, res, x, y, BinaryOp::Mul, BinaryOp::Mul.is_commutative())
}
