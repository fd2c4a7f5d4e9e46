//! Sorting kernels

use crate::dtype::Element;
use std::cmp::Ordering;

/// Sort a 1-D array ascending, returning sorted values and the permutation
///
/// `out_indices[i]` is the original position of `out_values[i]`, so
/// `out_values[i] == a[out_indices[i]]`.
///
/// # Safety
/// - `a` must point to `len` elements
/// - `out_values` must point to `len` elements of `T`
/// - `out_indices` must point to `len` i64 elements
#[inline]
pub unsafe fn sort_with_indices_kernel<T: Element>(
    a: *const T,
    out_values: *mut T,
    out_indices: *mut i64,
    len: usize,
) {
    if len == 0 {
        return;
    }

    let mut pairs: Vec<(T, i64)> = Vec::with_capacity(len);
    for i in 0..len {
        pairs.push((*a.add(i), i as i64));
    }

    pairs.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    for (i, (val, orig_idx)) in pairs.iter().enumerate() {
        *out_values.add(i) = *val;
        *out_indices.add(i) = *orig_idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_with_indices() {
        let a = [5i64, 1, 4, 1, 9];
        let mut values = [0i64; 5];
        let mut indices = [0i64; 5];
        unsafe {
            sort_with_indices_kernel(a.as_ptr(), values.as_mut_ptr(), indices.as_mut_ptr(), 5);
        }
        assert_eq!(values, [1, 1, 4, 5, 9]);
        // permutation faithfully inverts the sort
        for i in 0..5 {
            assert_eq!(values[i], a[indices[i] as usize]);
        }
    }

    #[test]
    fn test_sort_floats() {
        let a = [2.5f32, -1.0, 0.0];
        let mut values = [0.0f32; 3];
        let mut indices = [0i64; 3];
        unsafe {
            sort_with_indices_kernel(a.as_ptr(), values.as_mut_ptr(), indices.as_mut_ptr(), 3);
        }
        assert_eq!(values, [-1.0, 0.0, 2.5]);
        assert_eq!(indices, [1, 2, 0]);
    }
}
