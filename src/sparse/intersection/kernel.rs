//! The intersection pipeline, monomorphized per hash/offset width
//!
//! Stages run as a strict sequence of data-parallel launches plus two
//! collective steps (sort, prefix sum). Each launch is a barrier, and the
//! prefix-sum readback is the single host synchronization point: the result's
//! nonzero count depends on the data, so the output buffers cannot be
//! allocated until it is known ("plan" then "commit"). Inputs are read-only
//! throughout; every task writes only its own output slots, whose
//! disjointness follows from the offsets being exclusive prefix sums.

use super::super::hash::{coord_hash, find_bound};
use super::super::tensor::SparseTensor;
use crate::dtype::{DType, IndexElement};
use crate::error::Result;
use crate::ops::{BinaryOp, TensorOps};
use crate::runtime::{Launcher, Runtime, RuntimeClient};
use crate::tensor::Tensor;

/// Eagerly coalesce an uncoalesced probe candidate whose pigeonhole bound
/// promises more duplicate matches per source element than this
const MAX_COPIES_PER_TASK: usize = 50;

/// Assign probe and source roles to the two operands
///
/// The probe side is searched into and works best sorted; the source side
/// drives one lookup per nonzero. A coalesced operand is preferred as probe
/// because its hashes are already sorted. With no such asymmetry, the larger
/// operand probes (searching into the larger side is cheaper than driving
/// from it), and is eagerly coalesced when duplicate fan-out would otherwise
/// make the gather stage's inner loops long: if nnz exceeds the sparse-shape
/// element count, some hash bucket holds at least nnz / numel entries,
/// a conservative lower bound on the worst-case match count.
///
/// The returned flag records whether the source role landed on `x`, so the
/// assembler can keep the operator's operand order at `op(x, y)` no matter
/// how the roles fell.
fn select_roles<R, C>(
    client: &C,
    x: &SparseTensor<R>,
    y: &SparseTensor<R>,
) -> Result<(SparseTensor<R>, SparseTensor<R>, bool)>
where
    R: Runtime,
    C: RuntimeClient<R> + TensorOps<R> + Launcher,
{
    // Case 1: exactly one operand is coalesced
    if x.is_coalesced() ^ y.is_coalesced() {
        return Ok(if x.is_coalesced() {
            (x.clone(), y.clone(), false)
        } else {
            (y.clone(), x.clone(), true)
        });
    }

    // Case 2: both coalesced or both not
    let (larger, smaller, source_is_x) = if x.nnz() >= y.nnz() {
        (x, y, false)
    } else {
        (y, x, true)
    };

    let sparse_numel: usize = larger.shape()[..larger.sparse_dim()].iter().product();
    let max_count_lower_bound = if sparse_numel == 0 {
        0
    } else {
        larger.nnz() / sparse_numel
    };

    if max_count_lower_bound > MAX_COPIES_PER_TASK {
        Ok((larger.coalesce(client)?, smaller.clone(), source_is_x))
    } else {
        Ok((larger.clone(), smaller.clone(), source_is_x))
    }
}

/// Run the full intersection pipeline with hash width `H` and offset width `O`
#[allow(clippy::too_many_arguments)]
pub(super) fn binary_op_intersection_impl<R, C, H, O>(
    client: &C,
    res: &mut SparseTensor<R>,
    x: &SparseTensor<R>,
    y: &SparseTensor<R>,
    op: BinaryOp,
    broadcasted_shape: &[usize],
    coeffs_i64: &[i64],
    is_commutative: bool,
) -> Result<()>
where
    R: Runtime,
    C: RuntimeClient<R> + TensorOps<R> + Launcher,
    H: IndexElement,
    O: IndexElement,
{
    let res_dtype = res.dtype();

    // A non-commutative operator needs both coordinate sets in the same
    // orientation before any role swapping happens.
    let (x, y) = if is_commutative {
        (x.clone(), y.clone())
    } else {
        (x.coalesce(client)?, y.coalesce(client)?)
    };

    let (probe, source, source_is_x) = select_roles(client, &x, &y)?;

    let sparse_dim = probe.sparse_dim();
    let probe_nnz = probe.nnz();
    let source_nnz = source.nnz();
    let coeffs: Vec<H> = coeffs_i64.iter().map(|&c| H::from_i64(c)).collect();

    // Stage: hash every probe coordinate, one scalar per nonzero
    let probe_hash = Tensor::<R>::try_empty(&[probe_nnz], H::DTYPE, client.device())?;
    {
        let dim_stride = probe.indices().layout().stride(0) as usize;
        let nnz_stride = probe.indices().layout().stride(1) as usize;
        let idx_addr = probe.indices().storage().ptr();
        let hash_addr = probe_hash.storage().ptr();
        let coeffs = coeffs.as_slice();
        client.launch(probe_nnz, |k| unsafe {
            let h = coord_hash::<H>(idx_addr as *const i64, k, dim_stride, nnz_stride, coeffs);
            *(hash_addr as *mut H).add(k) = h;
        });
    }

    // Stage: sorted view of the probe hashes. A coalesced probe is already
    // hash-sorted (row-major coefficients preserve lexicographic order), so
    // the sort collapses to an identity permutation.
    let (sorted_hash, argsort) = if probe.is_coalesced() {
        (probe_hash.clone(), client.arange(probe_nnz, DType::I64)?)
    } else {
        client.sort_with_indices(&probe_hash)?
    };

    // Stage: join. Each source nonzero hashes itself (fused, never
    // materialized) and binary-searches the sorted probe hashes for its
    // contiguous match range.
    let count = Tensor::<R>::try_empty(&[source_nnz], H::DTYPE, client.device())?;
    let first_match = Tensor::<R>::try_empty(&[source_nnz], H::DTYPE, client.device())?;
    {
        let dim_stride = source.indices().layout().stride(0) as usize;
        let nnz_stride = source.indices().layout().stride(1) as usize;
        let idx_addr = source.indices().storage().ptr();
        let sorted_addr = sorted_hash.storage().ptr();
        let count_addr = count.storage().ptr();
        let first_addr = first_match.storage().ptr();
        let coeffs = coeffs.as_slice();
        client.launch(source_nnz, |k| unsafe {
            let hash = coord_hash::<H>(idx_addr as *const i64, k, dim_stride, nnz_stride, coeffs);

            let sorted: &[H] = if probe_nnz == 0 {
                &[]
            } else {
                std::slice::from_raw_parts(sorted_addr as *const H, probe_nnz)
            };
            let lb = find_bound(sorted, hash, true);
            let ub = find_bound(sorted, hash, false);

            *(count_addr as *mut H).add(k) = H::from_i64((ub - lb) as i64);
            *(first_addr as *mut H).add(k) = H::from_i64(lb as i64);
        });
    }

    // Stage: compaction plan. Prefix-sum the match counts in offset width;
    // the final element is the result's nonzero count. Reading it back is the
    // pipeline's only synchronization point; nothing downstream can be sized
    // before it.
    let shifted_offset = client.cumsum(&count, O::DTYPE)?;
    let res_nnz = if source_nnz == 0 {
        0
    } else {
        client.scalar_i64(&shifted_offset, source_nnz - 1)? as usize
    };

    // Stage: gather/scatter. Each source nonzero with matches expands them
    // into its own slice of the output: the source position, the matched
    // probe position (through the sort permutation), and the source's
    // coordinate column (fused here instead of a separate index_select on
    // the indices).
    let selected_source = Tensor::<R>::try_empty(&[res_nnz], H::DTYPE, client.device())?;
    let selected_probe = Tensor::<R>::try_empty(&[res_nnz], H::DTYPE, client.device())?;
    let res_indices =
        Tensor::<R>::try_empty(&[sparse_dim, res_nnz], DType::I64, client.device())?;
    {
        let src_dim_stride = source.indices().layout().stride(0) as usize;
        let src_nnz_stride = source.indices().layout().stride(1) as usize;
        let src_idx_addr = source.indices().storage().ptr();
        let count_addr = count.storage().ptr();
        let first_addr = first_match.storage().ptr();
        let shifted_addr = shifted_offset.storage().ptr();
        let argsort_addr = argsort.storage().ptr();
        let sel_src_addr = selected_source.storage().ptr();
        let sel_probe_addr = selected_probe.storage().ptr();
        let res_idx_addr = res_indices.storage().ptr();
        client.launch(source_nnz, |k| unsafe {
            let cnt = (*(count_addr as *const H).add(k)).as_index();
            if cnt == 0 {
                return;
            }
            let first = (*(first_addr as *const H).add(k)).as_index();
            // Task offset = shifted (inclusive) offset minus own count
            let offset = (*(shifted_addr as *const O).add(k)).as_index() - cnt;
            debug_assert!(offset + cnt <= res_nnz, "offset range exceeds result size");

            for i in 0..cnt {
                let slot = offset + i;
                *(sel_src_addr as *mut H).add(slot) = H::from_i64(k as i64);
                let probe_pos = *(argsort_addr as *const i64).add(first + i);
                *(sel_probe_addr as *mut H).add(slot) = H::from_i64(probe_pos);
                for d in 0..sparse_dim {
                    *(res_idx_addr as *mut i64).add(d * res_nnz + slot) =
                        *(src_idx_addr as *const i64).add(d * src_dim_stride + k * src_nnz_stride);
                }
            }
        });
    }

    // Stage: assemble. Gather the matched value rows from both sides, apply
    // the operator (which may promote dtypes), and cast into the declared
    // output dtype. Operand order stays op(x, y) regardless of which side
    // ended up driving the join.
    let source_values = client.index_select(source.values(), &selected_source)?;
    let probe_values = client.index_select(probe.values(), &selected_probe)?;
    let (lhs, rhs) = if source_is_x {
        (&source_values, &probe_values)
    } else {
        (&probe_values, &source_values)
    };
    let out_values = client.binary_op(op, lhs, rhs)?;
    let out_values = client.cast(&out_values, res_dtype)?;

    // Coalesced iff both operands are: the join preserves source order and
    // introduces no duplicates beyond those already present, so a coalesced
    // source paired with a coalesced probe yields sorted unique coordinates,
    // while any uncoalesced side carries its duplication into the result.
    let coalesced = source.is_coalesced() && probe.is_coalesced();

    *res = SparseTensor::from_parts_unchecked(
        res_indices,
        out_values,
        broadcasted_shape.to_vec(),
        sparse_dim,
        coalesced,
    );
    Ok(())
}
