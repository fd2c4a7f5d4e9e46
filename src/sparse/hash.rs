//! Perfect hashing of sparse coordinates
//!
//! A d-dimensional coordinate is mapped to the linear offset it would have in
//! a contiguous dense tensor of the bounding shape:
//!
//! ```text
//! hash(idx) = sum_d idx[d] * coeffs[d]
//! ```
//!
//! where `coeffs` are the row-major strides of the bounding shape. Over the
//! bounded coordinate space this map is injective (a perfect hash, never a
//! lossy digest) and monotone with respect to lexicographic coordinate order,
//! which is why a coalesced tensor's hash sequence is already sorted.

use crate::dtype::IndexElement;
use crate::error::{Error, Result};

/// Compute the hash coefficient vector for a sparse-dimension shape
///
/// Returns the row-major strides of `sparse_shape` together with the total
/// coordinate-domain size (the shape's element product). The product is
/// computed with checked arithmetic: a domain that does not fit in i64 cannot
/// be hashed at any supported width and is rejected up front.
pub(crate) fn hash_coefficients(sparse_shape: &[usize]) -> Result<(Vec<i64>, i64)> {
    let overflow = || Error::InvalidArgument {
        arg: "shape",
        reason: format!(
            "sparse shape {:?} overflows the 64-bit hash domain",
            sparse_shape
        ),
    };

    let mut coeffs = vec![0i64; sparse_shape.len()];
    let mut stride: i64 = 1;
    for (d, &dim) in sparse_shape.iter().enumerate().rev() {
        coeffs[d] = stride;
        let dim = i64::try_from(dim).map_err(|_| overflow())?;
        stride = stride.checked_mul(dim).ok_or_else(overflow)?;
    }
    Ok((coeffs, stride))
}

/// Hash one coordinate column of an indices array
///
/// `ptr_indices` points at an `[sparse_dim, nnz]` i64 array with the given
/// element strides; the column at `nnz_idx` is dotted with `coeffs`. All
/// arithmetic stays in the selected width `H`: coordinates are narrowed on
/// load, never widened mid-computation.
///
/// # Safety
/// - `ptr_indices` must be valid for all `dim * dim_stride + nnz_idx * nnz_stride`
///   offsets with `dim < coeffs.len()`
#[inline]
pub(crate) unsafe fn coord_hash<H: IndexElement>(
    ptr_indices: *const i64,
    nnz_idx: usize,
    dim_stride: usize,
    nnz_stride: usize,
    coeffs: &[H],
) -> H {
    let base = ptr_indices.add(nnz_idx * nnz_stride);
    let mut hash = H::zero();
    for (dim, &coeff) in coeffs.iter().enumerate() {
        let dim_index = H::from_i64(*base.add(dim * dim_stride));
        hash = hash + dim_index * coeff;
    }
    hash
}

/// Partition-style binary search over a sorted slice
///
/// With `lower == true`, returns the first position `i` with
/// `sorted[i] >= value`; otherwise the first position with
/// `sorted[i] > value`. The search works on positions and counts rather than
/// pointer differences, so the same shape of loop stays valid for
/// grid-executed variants.
#[inline]
pub(crate) fn find_bound<T: Copy + Ord>(sorted: &[T], value: T, lower: bool) -> usize {
    let mut first = 0usize;
    let mut count = sorted.len();
    while count > 0 {
        let step = count / 2;
        let it = first + step;
        let advance = if lower {
            sorted[it] < value
        } else {
            value >= sorted[it]
        };
        if advance {
            first = it + 1;
            count -= step + 1;
        } else {
            count = step;
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_row_major() {
        let (coeffs, numel) = hash_coefficients(&[2, 3, 4]).unwrap();
        assert_eq!(coeffs, vec![12, 4, 1]);
        assert_eq!(numel, 24);
    }

    #[test]
    fn test_coefficients_overflow() {
        assert!(hash_coefficients(&[1 << 32, 1 << 32]).is_err());
    }

    #[test]
    fn test_hash_is_injective_and_ordered() {
        // All coordinates of a [3, 4] shape, in lexicographic order
        let (coeffs, numel) = hash_coefficients(&[3, 4]).unwrap();
        let mut hashes = Vec::new();
        for a in 0..3i64 {
            for b in 0..4i64 {
                let indices = [a, b];
                let h = unsafe { coord_hash::<i64>(indices.as_ptr(), 0, 1, 1, &coeffs) };
                hashes.push(h);
            }
        }
        // Injective over the domain and monotone in lexicographic order
        assert_eq!(hashes.len(), numel as usize);
        for w in hashes.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_find_bound() {
        let sorted = [1i64, 3, 3, 3, 7, 9];
        // lower bound: first element >= value
        assert_eq!(find_bound(&sorted, 3, true), 1);
        assert_eq!(find_bound(&sorted, 0, true), 0);
        assert_eq!(find_bound(&sorted, 10, true), 6);
        // upper bound: first element > value
        assert_eq!(find_bound(&sorted, 3, false), 4);
        assert_eq!(find_bound(&sorted, 9, false), 6);
        // match range of a missing value is empty
        assert_eq!(find_bound(&sorted, 5, true), find_bound(&sorted, 5, false));
    }

    #[test]
    fn test_find_bound_empty() {
        let sorted: [i32; 0] = [];
        assert_eq!(find_bound(&sorted, 5, true), 0);
        assert_eq!(find_bound(&sorted, 5, false), 0);
    }
}
