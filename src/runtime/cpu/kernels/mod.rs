//! Raw CPU kernels
//!
//! Kernels operate on raw pointers and are dispatched from the typed helper
//! functions in `super::helpers`. All safety requirements (pointer validity,
//! non-overlap) are the caller's responsibility.

mod binary;
mod cast;
mod cumulative;
mod index;
mod sort;

pub(crate) use binary::binary_op_strided_kernel;
pub(crate) use cast::cast_kernel;
pub(crate) use cumulative::cumsum_kernel;
pub(crate) use index::index_select_kernel;
pub(crate) use sort::sort_with_indices_kernel;
