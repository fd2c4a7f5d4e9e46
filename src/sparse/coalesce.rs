//! Coalescing: sort coordinates and merge duplicates

use super::hash::{coord_hash, hash_coefficients};
use super::tensor::SparseTensor;
use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::ops::TensorOps;
use crate::runtime::{Launcher, Runtime, RuntimeClient};
use crate::tensor::Tensor;

impl<R: Runtime> SparseTensor<R> {
    /// Return a coalesced copy: coordinates sorted lexicographically
    /// ascending, duplicates merged by summing their value rows
    ///
    /// Already-coalesced tensors are returned as a cheap clone. Sorting works
    /// on the perfect hash of each coordinate (see the intersection pipeline),
    /// whose total order coincides with lexicographic coordinate order.
    pub fn coalesce<C>(&self, client: &C) -> Result<Self>
    where
        C: RuntimeClient<R> + TensorOps<R> + Launcher,
    {
        if self.coalesced {
            return Ok(self.clone());
        }

        let nnz = self.nnz();
        if nnz == 0 {
            let mut out = self.clone();
            // No coordinates, nothing to sort or merge
            unsafe { out.set_coalesced(true) };
            return Ok(out);
        }

        let sparse_dim = self.sparse_dim;
        let (coeffs, _) = hash_coefficients(&self.shape[..sparse_dim])?;

        // Hash every coordinate (64-bit: coalescing is not width-selected)
        let hashes = Tensor::<R>::try_empty(&[nnz], DType::I64, client.device())?;
        {
            let dim_stride = self.indices.layout().stride(0) as usize;
            let nnz_stride = self.indices.layout().stride(1) as usize;
            let idx_addr = self.indices.storage().ptr();
            let hash_addr = hashes.storage().ptr();
            let coeffs = coeffs.as_slice();
            client.launch(nnz, |k| unsafe {
                let h = coord_hash::<i64>(idx_addr as *const i64, k, dim_stride, nnz_stride, coeffs);
                *(hash_addr as *mut i64).add(k) = h;
            });
        }

        let (sorted, perm_t) = client.sort_with_indices(&hashes)?;
        let sorted_h: Vec<i64> = sorted.to_vec();
        let perm: Vec<i64> = perm_t.to_vec();

        // Run boundaries in the sorted hash sequence; one output row per run
        let mut starts: Vec<usize> = Vec::new();
        for (i, &h) in sorted_h.iter().enumerate() {
            if i == 0 || h != sorted_h[i - 1] {
                starts.push(i);
            }
        }
        let unique = starts.len();

        let out_indices =
            Tensor::<R>::try_empty(&[sparse_dim, unique], DType::I64, client.device())?;
        {
            let in_dim_stride = self.indices.layout().stride(0) as usize;
            let in_nnz_stride = self.indices.layout().stride(1) as usize;
            let in_addr = self.indices.storage().ptr();
            let out_addr = out_indices.storage().ptr();
            let starts = starts.as_slice();
            let perm = perm.as_slice();
            client.launch(unique, |u| unsafe {
                let src = perm[starts[u]] as usize;
                for d in 0..sparse_dim {
                    *(out_addr as *mut i64).add(d * unique + u) =
                        *(in_addr as *const i64).add(d * in_dim_stride + src * in_nnz_stride);
                }
            });
        }

        let row_size: usize = self.values.shape()[1..].iter().product();
        let mut values_shape = vec![unique];
        values_shape.extend_from_slice(&self.values.shape()[1..]);
        let out_values = Tensor::<R>::try_empty(&values_shape, self.dtype(), client.device())?;
        {
            let in_addr = self.values.storage().ptr();
            let out_addr = out_values.storage().ptr();
            let starts = starts.as_slice();
            let perm = perm.as_slice();
            dispatch_dtype!(self.dtype(), T => {
                client.launch(unique, |u| unsafe {
                    let start = starts[u];
                    let end = if u + 1 < unique { starts[u + 1] } else { nnz };
                    let out_row = (out_addr as *mut T).add(u * row_size);
                    for j in 0..row_size {
                        *out_row.add(j) = T::zero();
                    }
                    for r in start..end {
                        let src = perm[r] as usize;
                        let in_row = (in_addr as *const T).add(src * row_size);
                        for j in 0..row_size {
                            *out_row.add(j) = *out_row.add(j) + *in_row.add(j);
                        }
                    }
                });
            }, "coalesce");
        }

        Ok(Self::from_parts_unchecked(
            out_indices,
            out_values,
            self.shape.clone(),
            sparse_dim,
            true,
        ))
    }
}
