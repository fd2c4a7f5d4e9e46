//! Cumulative operation kernels

use crate::dtype::Element;

/// Inclusive prefix sum of a 1-D array, accumulated in `A`
///
/// The accumulator width is chosen by the caller: the intersection pipeline
/// sums match counts (hash-width integers) into offset-width integers, and
/// the two widths may differ.
///
/// # Safety
/// - `a` must point to `len` elements of `T`
/// - `out` must point to `len` elements of `A` and not overlap `a`
#[inline]
pub unsafe fn cumsum_kernel<T: Element, A: Element>(a: *const T, out: *mut A, len: usize) {
    let mut acc = A::zero();
    for i in 0..len {
        acc = acc + A::from_f64((*a.add(i)).to_f64());
        *out.add(i) = acc;
    }
}
