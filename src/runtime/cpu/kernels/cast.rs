//! Dtype conversion kernel

use crate::dtype::Element;

/// Convert elements from one dtype to another
///
/// Conversion goes through f64, matching the Element trait's generic numeric
/// conversions. Exact for every integer the pipeline produces (counts and
/// offsets are far below 2^53).
///
/// # Safety
/// - `a` must point to `len` elements of `S`
/// - `out` must point to `len` elements of `D` and not overlap `a`
#[inline]
pub unsafe fn cast_kernel<S: Element, D: Element>(a: *const S, out: *mut D, len: usize) {
    for i in 0..len {
        *out.add(i) = D::from_f64((*a.add(i)).to_f64());
    }
}
