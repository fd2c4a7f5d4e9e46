//! Index operation kernels

use crate::dtype::{Element, IndexElement};

/// Select rows along the leading axis: `out[i, :] = a[index[i], :]`
///
/// `row_size` is the product of all trailing dimensions; rows are copied
/// wholesale so trailing dense dimensions ride along unchanged.
///
/// # Safety
/// - `a` must point to `in_rows * row_size` elements
/// - `index` must point to `out_rows` elements, each in `0..in_rows`
/// - `out` must point to `out_rows * row_size` elements and not overlap `a`
#[inline]
pub unsafe fn index_select_kernel<T: Element, I: IndexElement>(
    a: *const T,
    index: *const I,
    out: *mut T,
    out_rows: usize,
    row_size: usize,
    in_rows: usize,
) {
    for i in 0..out_rows {
        let src_row = (*index.add(i)).as_index();
        debug_assert!(src_row < in_rows, "index {} out of {} rows", src_row, in_rows);
        std::ptr::copy_nonoverlapping(
            a.add(src_row * row_size),
            out.add(i * row_size),
            row_size,
        );
    }
    let _ = in_rows;
}
