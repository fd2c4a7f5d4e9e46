//! TensorOps implementation for the CPU runtime

use super::helpers::{
    arange_impl, binary_op_impl, cast_impl, cumsum_impl, index_select_impl, scalar_i64_impl,
    sort_with_indices_impl,
};
use super::{CpuClient, CpuRuntime};
use crate::dtype::DType;
use crate::error::Result;
use crate::ops::{BinaryOp, TensorOps};
use crate::tensor::Tensor;

impl TensorOps<CpuRuntime> for CpuClient {
    fn binary_op(
        &self,
        op: BinaryOp,
        a: &Tensor<CpuRuntime>,
        b: &Tensor<CpuRuntime>,
    ) -> Result<Tensor<CpuRuntime>> {
        let name = match op {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        };
        binary_op_impl(self, op, a, b, name)
    }

    fn cast(&self, a: &Tensor<CpuRuntime>, dtype: DType) -> Result<Tensor<CpuRuntime>> {
        cast_impl(self, a, dtype)
    }

    fn index_select(
        &self,
        a: &Tensor<CpuRuntime>,
        index: &Tensor<CpuRuntime>,
    ) -> Result<Tensor<CpuRuntime>> {
        index_select_impl(self, a, index)
    }

    fn cumsum(&self, a: &Tensor<CpuRuntime>, acc_dtype: DType) -> Result<Tensor<CpuRuntime>> {
        cumsum_impl(self, a, acc_dtype)
    }

    fn sort_with_indices(
        &self,
        a: &Tensor<CpuRuntime>,
    ) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
        sort_with_indices_impl(self, a)
    }

    fn arange(&self, len: usize, dtype: DType) -> Result<Tensor<CpuRuntime>> {
        arange_impl(self, len, dtype)
    }

    fn scalar_i64(&self, a: &Tensor<CpuRuntime>, index: usize) -> Result<i64> {
        scalar_i64_impl(a, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::CpuDevice;

    fn client() -> CpuClient {
        CpuClient::new(CpuDevice::new())
    }

    #[test]
    fn test_binary_op_promotes() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1i32, 2, 3], &[3], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[0.5f32, 0.5, 0.5], &[3], &device);
        let out = c.binary_op(BinaryOp::Mul, &a, &b).unwrap();
        assert_eq!(out.dtype(), DType::F32);
        assert_eq!(out.to_vec::<f32>(), vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_binary_op_broadcasts_trailing_dim() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[10.0f64, 20.0], &[2, 1], &device);
        let out = c.binary_op(BinaryOp::Mul, &a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.to_vec::<f64>(), vec![10.0, 20.0, 60.0, 80.0]);
    }

    #[test]
    fn test_cast() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.7f64, -2.3], &[2], &device);
        let out = c.cast(&a, DType::I32).unwrap();
        assert_eq!(out.to_vec::<i32>(), vec![1, -2]);
    }

    #[test]
    fn test_index_select_carries_dense_rows() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2], &device);
        let idx = Tensor::<CpuRuntime>::from_slice(&[2i64, 0], &[2], &device);
        let out = c.index_select(&a, &idx).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.to_vec::<f32>(), vec![5.0, 6.0, 1.0, 2.0]);
    }

    #[test]
    fn test_index_select_empty_index() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1i64, 2, 3], &[3], &device);
        let idx = Tensor::<CpuRuntime>::empty(&[0], DType::I64, &device);
        let out = c.index_select(&a, &idx).unwrap();
        assert_eq!(out.shape(), &[0]);
    }

    #[test]
    fn test_cumsum_widths() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[1i32, 0, 2, 3], &[4], &device);
        let out = c.cumsum(&a, DType::I64).unwrap();
        assert_eq!(out.dtype(), DType::I64);
        assert_eq!(out.to_vec::<i64>(), vec![1, 1, 3, 6]);
    }

    #[test]
    fn test_sort_with_indices_inverts() {
        let c = client();
        let device = c.device.clone();
        let a = Tensor::<CpuRuntime>::from_slice(&[3i64, 1, 2, 1], &[4], &device);
        let (sorted, perm) = c.sort_with_indices(&a).unwrap();
        assert_eq!(sorted.to_vec::<i64>(), vec![1, 1, 2, 3]);
        let original = a.to_vec::<i64>();
        let sorted_v = sorted.to_vec::<i64>();
        for (i, p) in perm.to_vec::<i64>().iter().enumerate() {
            assert_eq!(sorted_v[i], original[*p as usize]);
        }
    }

    #[test]
    fn test_arange_and_scalar() {
        let c = client();
        let r = c.arange(5, DType::I64).unwrap();
        assert_eq!(r.to_vec::<i64>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(c.scalar_i64(&r, 4).unwrap(), 4);
        assert!(c.scalar_i64(&r, 5).is_err());
    }
}
