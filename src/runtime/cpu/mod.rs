//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation and provides the reference
//! implementation for all tensor operations. Kernel launches run on the rayon
//! thread pool above a size threshold (with the `rayon` feature, on by
//! default) and as a sequential loop below it.

mod client;
mod device;
pub(crate) mod helpers;
mod kernels;
mod launch;
mod ops;
mod runtime;

pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
