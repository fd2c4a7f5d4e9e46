//! # sparr
//!
//! **Sparse coordinate (COO) tensors with intersection-driven binary elementwise
//! operations.**
//!
//! sparr stores n-dimensional sparse tensors as explicit coordinate lists and
//! implements binary elementwise operations whose domain is the *intersection*
//! of the operands' nonzero coordinate sets (multiplication being the canonical
//! example). The core algorithm is a hash join: coordinates are encoded through
//! a perfect (collision-free) hash, matched via binary search, compacted with a
//! prefix sum, and expanded into the result in a single allocation-exact pass.
//!
//! ## Features
//!
//! - **COO tensors**: leading `sparse_dim` coordinate dimensions plus trailing
//!   dense value dimensions carried per nonzero
//! - **Intersection ops**: `sparse_mul` and the generic
//!   [`sparse_binary_op_intersection`](sparse::sparse_binary_op_intersection)
//! - **Coalescing**: duplicate coordinates merged by summation, sorted output
//! - **Width-adaptive kernels**: 32- or 64-bit hash and offset arithmetic picked
//!   from overflow bounds, independently
//! - **Backend seam**: operations dispatch through the [`runtime::Runtime`] and
//!   [`runtime::Launcher`] traits; the CPU backend parallelizes with rayon
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparr::prelude::*;
//!
//! let device = CpuRuntime::default_device();
//! let client = CpuRuntime::default_client(&device);
//!
//! let x = SparseTensor::<CpuRuntime>::from_coords(&[0, 2, 4], &[1.0f32, 2.0, 3.0], &[8], 1, &device)?;
//! let y = SparseTensor::<CpuRuntime>::from_coords(&[2, 2, 5], &[10.0f32, 20.0, 30.0], &[8], 1, &device)?;
//!
//! let mut res = SparseTensor::empty(&[8], 1, DType::F32, &device);
//! sparse_mul(&client, &mut res, &x, &y)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded CPU kernel launches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod sparse;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops::{BinaryOp, TensorOps};
    pub use crate::runtime::cpu::CpuRuntime;
    pub use crate::runtime::{Device, Launcher, Runtime, RuntimeClient};
    pub use crate::sparse::{sparse_binary_op_intersection, sparse_mul, SparseTensor};
    pub use crate::tensor::Tensor;
}

/// Default runtime: the CPU backend
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
