//! Core sparse COO tensor: struct, creation, getters

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::Tensor;
use std::fmt;

/// N-dimensional sparse tensor in coordinate (COO) format
///
/// The leading `sparse_dim` dimensions of `shape` are indexed explicitly:
/// `indices` is an `[sparse_dim, nnz]` I64 tensor whose k-th column is the
/// coordinate of the k-th nonzero. The remaining trailing dimensions are
/// dense: `values` has shape `[nnz, shape[sparse_dim..]]`, one dense row per
/// nonzero. Columns of `indices` and rows of `values` correspond 1:1 by
/// position.
///
/// # Coalesced invariant
///
/// If `coalesced` is true, coordinates are lexicographically sorted ascending
/// and pairwise distinct. An uncoalesced tensor may hold duplicate
/// coordinates in any order; [`SparseTensor::coalesce`] sorts and merges them
/// (duplicate values are summed).
#[derive(Clone)]
pub struct SparseTensor<R: Runtime> {
    pub(crate) indices: Tensor<R>,
    pub(crate) values: Tensor<R>,
    pub(crate) shape: Vec<usize>,
    pub(crate) sparse_dim: usize,
    pub(crate) coalesced: bool,
}

impl<R: Runtime> SparseTensor<R> {
    /// Create a sparse tensor from index and value tensors
    ///
    /// # Arguments
    ///
    /// * `indices` - 2D I64 tensor of shape `[sparse_dim, nnz]`
    /// * `values` - tensor of shape `[nnz, shape[sparse_dim..]]`
    /// * `shape` - full tensor shape (sparse dimensions first)
    /// * `sparse_dim` - number of leading coordinate-indexed dimensions
    ///
    /// The tensor is created with `coalesced == false`; coordinates are not
    /// inspected. Index bounds are not validated here; use
    /// [`Self::from_coords`] to build from host data with validation.
    pub fn new(
        indices: Tensor<R>,
        values: Tensor<R>,
        shape: Vec<usize>,
        sparse_dim: usize,
    ) -> Result<Self> {
        if sparse_dim > shape.len() {
            return Err(Error::InvalidArgument {
                arg: "sparse_dim",
                reason: format!(
                    "sparse_dim {} exceeds tensor rank {}",
                    sparse_dim,
                    shape.len()
                ),
            });
        }
        if indices.dtype() != DType::I64 {
            return Err(Error::DTypeMismatch {
                lhs: DType::I64,
                rhs: indices.dtype(),
            });
        }
        if indices.ndim() != 2 || indices.shape()[0] != sparse_dim {
            return Err(Error::shape_mismatch(&[sparse_dim, 0], indices.shape()));
        }

        let nnz = indices.shape()[1];
        let mut expected_values = vec![nnz];
        expected_values.extend_from_slice(&shape[sparse_dim..]);
        if values.shape() != expected_values.as_slice() {
            return Err(Error::shape_mismatch(&expected_values, values.shape()));
        }

        Ok(Self {
            indices,
            values,
            shape,
            sparse_dim,
            coalesced: false,
        })
    }

    /// Create a sparse tensor from host slices, validating index bounds
    ///
    /// # Arguments
    ///
    /// * `coords` - coordinates in dimension-major order: `coords[d * nnz + k]`
    ///   is dimension `d` of the k-th nonzero (the flattened `[sparse_dim, nnz]`
    ///   indices array)
    /// * `values` - dense value rows, `nnz * prod(shape[sparse_dim..])` elements
    /// * `shape` - full tensor shape
    /// * `sparse_dim` - number of leading coordinate-indexed dimensions
    pub fn from_coords<T: Element>(
        coords: &[i64],
        values: &[T],
        shape: &[usize],
        sparse_dim: usize,
        device: &R::Device,
    ) -> Result<Self> {
        if sparse_dim > shape.len() {
            return Err(Error::InvalidArgument {
                arg: "sparse_dim",
                reason: format!("sparse_dim {} exceeds tensor rank {}", sparse_dim, shape.len()),
            });
        }

        let dense_numel: usize = shape[sparse_dim..].iter().product();
        if dense_numel == 0 || (sparse_dim > 0 && coords.len() % sparse_dim != 0) {
            return Err(Error::InvalidArgument {
                arg: "coords",
                reason: "coordinate and value lengths are inconsistent with the shape".to_string(),
            });
        }
        let nnz = if sparse_dim == 0 {
            values.len() / dense_numel
        } else {
            coords.len() / sparse_dim
        };
        if values.len() != nnz * dense_numel {
            return Err(Error::shape_mismatch(&[nnz * dense_numel], &[values.len()]));
        }

        // Validate coordinate bounds
        for d in 0..sparse_dim {
            for k in 0..nnz {
                let c = coords[d * nnz + k];
                if c < 0 || c as usize >= shape[d] {
                    return Err(Error::IndexOutOfBounds {
                        index: c.max(0) as usize,
                        size: shape[d],
                    });
                }
            }
        }

        let indices = Tensor::try_from_slice(coords, &[sparse_dim, nnz], device)?;
        let mut values_shape = vec![nnz];
        values_shape.extend_from_slice(&shape[sparse_dim..]);
        let values = Tensor::try_from_slice(values, &values_shape, device)?;

        Self::new(indices, values, shape.to_vec(), sparse_dim)
    }

    /// Create an empty sparse tensor (nnz = 0)
    ///
    /// An empty tensor is trivially coalesced.
    ///
    /// # Panics
    ///
    /// Panics if `sparse_dim` exceeds the rank of `shape` or allocation fails.
    pub fn empty(shape: &[usize], sparse_dim: usize, dtype: DType, device: &R::Device) -> Self {
        assert!(
            sparse_dim <= shape.len(),
            "sparse_dim {} exceeds tensor rank {}",
            sparse_dim,
            shape.len()
        );

        let indices = Tensor::empty(&[sparse_dim, 0], DType::I64, device);
        let mut values_shape = vec![0];
        values_shape.extend_from_slice(&shape[sparse_dim..]);
        let values = Tensor::empty(&values_shape, dtype, device);

        Self {
            indices,
            values,
            shape: shape.to_vec(),
            sparse_dim,
            coalesced: true,
        }
    }

    /// Assemble a sparse tensor from already-consistent parts
    ///
    /// Used by operations whose construction guarantees the struct invariants.
    pub(crate) fn from_parts_unchecked(
        indices: Tensor<R>,
        values: Tensor<R>,
        shape: Vec<usize>,
        sparse_dim: usize,
        coalesced: bool,
    ) -> Self {
        Self {
            indices,
            values,
            shape,
            sparse_dim,
            coalesced,
        }
    }

    /// Returns the indices tensor (`[sparse_dim, nnz]`, I64)
    pub fn indices(&self) -> &Tensor<R> {
        &self.indices
    }

    /// Returns the values tensor (`[nnz, dense_shape...]`)
    pub fn values(&self) -> &Tensor<R> {
        &self.values
    }

    /// Returns the full tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of leading coordinate-indexed dimensions
    pub fn sparse_dim(&self) -> usize {
        self.sparse_dim
    }

    /// Number of trailing dense dimensions
    pub fn dense_dim(&self) -> usize {
        self.shape.len() - self.sparse_dim
    }

    /// Number of explicitly stored nonzeros
    pub fn nnz(&self) -> usize {
        self.indices.shape()[1]
    }

    /// Element type of the values
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// Device the tensor lives on
    pub fn device(&self) -> &R::Device {
        self.values.device()
    }

    /// Whether coordinates are known to be sorted and pairwise distinct
    pub fn is_coalesced(&self) -> bool {
        self.coalesced
    }

    /// Mark the tensor as coalesced without checking
    ///
    /// # Safety
    ///
    /// Caller must ensure coordinates are actually lexicographically sorted
    /// ascending and pairwise distinct.
    pub unsafe fn set_coalesced(&mut self, coalesced: bool) {
        self.coalesced = coalesced;
    }
}

impl<R: Runtime> fmt::Debug for SparseTensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseTensor")
            .field("shape", &self.shape)
            .field("sparse_dim", &self.sparse_dim)
            .field("nnz", &self.nnz())
            .field("dtype", &self.dtype())
            .field("coalesced", &self.coalesced)
            .finish()
    }
}
