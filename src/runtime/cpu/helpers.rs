//! Helper functions for CPU tensor operations
//!
//! These are the typed entry points behind the `TensorOps` implementation:
//! they validate shapes and dtypes, allocate outputs, and dispatch into the
//! raw kernels in `super::kernels`.

use super::kernels;
use super::{CpuClient, CpuRuntime};
use crate::dispatch_dtype;
use crate::dtype::{promote, DType, Element};
use crate::error::{Error, Result};
use crate::ops::{broadcast_shape, BinaryOp};
use crate::tensor::Tensor;

/// Elementwise binary operation with dtype promotion and broadcasting
pub(crate) fn binary_op_impl(
    client: &CpuClient,
    op: BinaryOp,
    a: &Tensor<CpuRuntime>,
    b: &Tensor<CpuRuntime>,
    op_name: &'static str,
) -> Result<Tensor<CpuRuntime>> {
    let common = promote(a.dtype(), b.dtype());
    let a = cast_impl(client, a, common)?;
    let b = cast_impl(client, b, common)?;

    let out_shape =
        broadcast_shape(a.shape(), b.shape()).ok_or_else(|| Error::broadcast(a.shape(), b.shape()))?;
    let ndim = out_shape.len();

    // Right-align each operand's strides against the output shape, with
    // stride 0 marking broadcast dimensions.
    let aligned_strides = |t: &Tensor<CpuRuntime>| -> Vec<isize> {
        let mut strides = vec![0isize; ndim];
        let offset = ndim - t.ndim();
        for (d, (&size, &stride)) in t.shape().iter().zip(t.strides().iter()).enumerate() {
            strides[offset + d] = if size == 1 && out_shape[offset + d] != 1 {
                0
            } else {
                stride
            };
        }
        strides
    };
    let a_strides = aligned_strides(&a);
    let b_strides = aligned_strides(&b);

    let out = Tensor::<CpuRuntime>::try_empty(&out_shape, common, &client.device)?;

    let a_ptr = a.storage().ptr();
    let b_ptr = b.storage().ptr();
    let out_ptr = out.storage().ptr();

    dispatch_dtype!(common, T => {
        unsafe {
            kernels::binary_op_strided_kernel::<T>(
                op,
                a_ptr as *const T,
                b_ptr as *const T,
                out_ptr as *mut T,
                &out_shape,
                &a_strides,
                &b_strides,
            );
        }
    }, op_name);

    Ok(out)
}

/// Cast a tensor to another dtype (returns a cheap clone when dtypes match)
pub(crate) fn cast_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dtype: DType,
) -> Result<Tensor<CpuRuntime>> {
    if a.dtype() == dtype {
        return Ok(a.clone());
    }

    let out = Tensor::<CpuRuntime>::try_empty(a.shape(), dtype, &client.device)?;
    let len = a.numel();
    let a_ptr = a.storage().ptr();
    let out_ptr = out.storage().ptr();

    dispatch_dtype!(a.dtype(), S => {
        dispatch_dtype!(dtype, D => {
            unsafe {
                kernels::cast_kernel::<S, D>(a_ptr as *const S, out_ptr as *mut D, len);
            }
        }, "cast")
    }, "cast");

    Ok(out)
}

/// Select rows of `a` along its leading axis
pub(crate) fn index_select_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    index: &Tensor<CpuRuntime>,
) -> Result<Tensor<CpuRuntime>> {
    if a.ndim() == 0 {
        return Err(Error::InvalidArgument {
            arg: "a",
            reason: "index_select requires at least one dimension".to_string(),
        });
    }
    if index.ndim() != 1 {
        return Err(Error::shape_mismatch(&[index.numel()], index.shape()));
    }

    let out_rows = index.numel();
    let in_rows = a.shape()[0];
    let row_size: usize = a.shape()[1..].iter().product();

    let mut out_shape = vec![out_rows];
    out_shape.extend_from_slice(&a.shape()[1..]);
    let out = Tensor::<CpuRuntime>::try_empty(&out_shape, a.dtype(), &client.device)?;

    let a_ptr = a.storage().ptr();
    let index_ptr = index.storage().ptr();
    let out_ptr = out.storage().ptr();

    dispatch_dtype!(a.dtype(), T => {
        match index.dtype() {
            DType::I64 => unsafe {
                kernels::index_select_kernel::<T, i64>(
                    a_ptr as *const T,
                    index_ptr as *const i64,
                    out_ptr as *mut T,
                    out_rows,
                    row_size,
                    in_rows,
                );
            },
            DType::I32 => unsafe {
                kernels::index_select_kernel::<T, i32>(
                    a_ptr as *const T,
                    index_ptr as *const i32,
                    out_ptr as *mut T,
                    out_rows,
                    row_size,
                    in_rows,
                );
            },
            other => return Err(Error::unsupported_dtype(other, "index_select")),
        }
    }, "index_select");

    Ok(out)
}

/// Inclusive prefix sum of a 1-D tensor, accumulated in `acc_dtype`
pub(crate) fn cumsum_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    acc_dtype: DType,
) -> Result<Tensor<CpuRuntime>> {
    if a.ndim() != 1 {
        return Err(Error::shape_mismatch(&[a.numel()], a.shape()));
    }

    let len = a.numel();
    let out = Tensor::<CpuRuntime>::try_empty(&[len], acc_dtype, &client.device)?;

    let a_ptr = a.storage().ptr();
    let out_ptr = out.storage().ptr();

    dispatch_dtype!(a.dtype(), T => {
        dispatch_dtype!(acc_dtype, A => {
            unsafe {
                kernels::cumsum_kernel::<T, A>(a_ptr as *const T, out_ptr as *mut A, len);
            }
        }, "cumsum")
    }, "cumsum");

    Ok(out)
}

/// Sort a 1-D tensor ascending, returning sorted values and the permutation
pub(crate) fn sort_with_indices_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
    if a.ndim() != 1 {
        return Err(Error::shape_mismatch(&[a.numel()], a.shape()));
    }

    let len = a.numel();
    let out_values = Tensor::<CpuRuntime>::try_empty(&[len], a.dtype(), &client.device)?;
    let out_indices = Tensor::<CpuRuntime>::try_empty(&[len], DType::I64, &client.device)?;

    let a_ptr = a.storage().ptr();
    let values_ptr = out_values.storage().ptr();
    let indices_ptr = out_indices.storage().ptr();

    dispatch_dtype!(a.dtype(), T => {
        unsafe {
            kernels::sort_with_indices_kernel::<T>(
                a_ptr as *const T,
                values_ptr as *mut T,
                indices_ptr as *mut i64,
                len,
            );
        }
    }, "sort_with_indices");

    Ok((out_values, out_indices))
}

/// Create a 1-D tensor holding `0, 1, ..., len - 1`
pub(crate) fn arange_impl(
    client: &CpuClient,
    len: usize,
    dtype: DType,
) -> Result<Tensor<CpuRuntime>> {
    dispatch_dtype!(dtype, T => {
        let data: Vec<T> = (0..len).map(|i| T::from_f64(i as f64)).collect();
        Tensor::<CpuRuntime>::try_from_slice(&data, &[len], &client.device)
    }, "arange")
}

/// Read one element of a 1-D integer tensor back to the host
pub(crate) fn scalar_i64_impl(a: &Tensor<CpuRuntime>, index: usize) -> Result<i64> {
    if index >= a.numel() {
        return Err(Error::IndexOutOfBounds {
            index,
            size: a.numel(),
        });
    }

    let ptr = a.storage().ptr();
    match a.dtype() {
        DType::I64 => Ok(unsafe { *(ptr as *const i64).add(index) }),
        DType::I32 => Ok(unsafe { *(ptr as *const i32).add(index) } as i64),
        other => Err(Error::unsupported_dtype(other, "scalar_i64")),
    }
}
