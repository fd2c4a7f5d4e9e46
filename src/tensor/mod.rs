//! Dense tensor storage: the value and index carrier for sparse tensors

mod core;
mod layout;
mod storage;

pub use self::core::Tensor;
pub use layout::{Layout, Shape, Strides};
pub use storage::Storage;
