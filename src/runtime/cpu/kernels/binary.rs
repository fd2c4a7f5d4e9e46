//! Binary operation kernels

use crate::dtype::Element;
use crate::ops::BinaryOp;

/// Execute a binary operation element-wise
///
/// # Safety
/// - `a`, `b`, and `out` must be valid pointers to `len` elements
/// - `out` must not overlap with `a` or `b`
#[inline]
pub unsafe fn binary_op_kernel<T: Element>(
    op: BinaryOp,
    a: *const T,
    b: *const T,
    out: *mut T,
    len: usize,
) {
    if len == 0 {
        return;
    }

    let a_slice = std::slice::from_raw_parts(a, len);
    let b_slice = std::slice::from_raw_parts(b, len);
    let out_slice = std::slice::from_raw_parts_mut(out, len);

    match op {
        BinaryOp::Add => {
            for i in 0..len {
                out_slice[i] = a_slice[i] + b_slice[i];
            }
        }
        BinaryOp::Sub => {
            for i in 0..len {
                out_slice[i] = a_slice[i] - b_slice[i];
            }
        }
        BinaryOp::Mul => {
            for i in 0..len {
                out_slice[i] = a_slice[i] * b_slice[i];
            }
        }
        BinaryOp::Div => {
            for i in 0..len {
                out_slice[i] = a_slice[i] / b_slice[i];
            }
        }
    }
}

/// Execute a binary operation with broadcasting support
///
/// Uses strides to handle broadcasting: a stride of 0 means the dimension is
/// broadcast (all indices access the same element). Both stride arrays must
/// have the same length as `out_shape` (right-aligned, missing leading
/// dimensions padded with stride 0).
///
/// # Safety
/// - All pointers must be valid for the specified shape and strides
/// - `out` must not overlap with `a` or `b`
#[inline]
pub unsafe fn binary_op_strided_kernel<T: Element>(
    op: BinaryOp,
    a: *const T,
    b: *const T,
    out: *mut T,
    out_shape: &[usize],
    a_strides: &[isize],
    b_strides: &[isize],
) {
    let ndim = out_shape.len();
    let total = out_shape.iter().product::<usize>();

    if total == 0 {
        return;
    }

    // Fast path: both inputs contiguous with no broadcast dimensions
    let is_simple = {
        let mut expected = 1isize;
        let mut simple = true;
        for i in (0..ndim).rev() {
            if a_strides[i] != expected || b_strides[i] != expected {
                simple = false;
                break;
            }
            expected *= out_shape[i] as isize;
        }
        simple
    };

    if is_simple {
        binary_op_kernel(op, a, b, out, total);
        return;
    }

    let mut indices = vec![0usize; ndim];
    for out_idx in 0..total {
        let mut a_off = 0isize;
        let mut b_off = 0isize;
        for (d, &idx) in indices.iter().enumerate() {
            a_off += idx as isize * a_strides[d];
            b_off += idx as isize * b_strides[d];
        }

        let lhs = *a.offset(a_off);
        let rhs = *b.offset(b_off);
        *out.add(out_idx) = match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        };

        // Increment indices (row-major order)
        for d in (0..ndim).rev() {
            indices[d] += 1;
            if indices[d] < out_shape[d] {
                break;
            }
            indices[d] = 0;
        }
    }
}
