//! Integration tests for intersection-driven binary operations
//!
//! Covers intersection and value correctness, the coalesced-result invariant,
//! commutativity, width boundaries, dense value rows, dtype promotion and
//! cast failure, and a randomized cross-check against a naive host reference.

use sparr::dtype::DType;
use sparr::ops::BinaryOp;
use sparr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use sparr::runtime::Runtime;
use sparr::sparse::{sparse_binary_op_intersection, sparse_mul, SparseTensor};

fn setup() -> (CpuDevice, CpuClient) {
    let device = CpuRuntime::default_device();
    let client = CpuRuntime::default_client(&device);
    (device, client)
}

/// Collect (coordinate column, value) pairs for comparison independent of order
fn entries(t: &SparseTensor<CpuRuntime>) -> Vec<(Vec<i64>, f64)> {
    let nnz = t.nnz();
    if nnz == 0 {
        return Vec::new();
    }
    let sd = t.sparse_dim();
    let idx = t.indices().to_vec::<i64>();
    let vals: Vec<f64> = match t.dtype() {
        DType::F64 => t.values().to_vec::<f64>(),
        DType::F32 => t.values().to_vec::<f32>().iter().map(|&v| v as f64).collect(),
        DType::I64 => t.values().to_vec::<i64>().iter().map(|&v| v as f64).collect(),
        DType::I32 => t.values().to_vec::<i32>().iter().map(|&v| v as f64).collect(),
        other => panic!("unhandled dtype {other} in test helper"),
    };
    assert_eq!(vals.len(), nnz, "entries() expects scalar values per nonzero");
    (0..nnz)
        .map(|k| ((0..sd).map(|d| idx[d * nnz + k]).collect(), vals[k]))
        .collect()
}

#[test]
fn test_concrete_scenario() {
    // x: coords [0, 2, 4] values [1, 2, 3], coalesced
    // y: coords [2, 2, 5] values [10, 20, 30], not coalesced
    // mul intersection: coordinate 2 matches once in x, twice in y
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[0, 2, 4], &[1.0f32, 2.0, 3.0], &[8], 1, &device)
        .unwrap()
        .coalesce(&client)
        .unwrap();
    assert!(x.is_coalesced());
    let y =
        SparseTensor::<CpuRuntime>::from_coords(&[2, 2, 5], &[10.0f32, 20.0, 30.0], &[8], 1, &device)
            .unwrap();
    assert!(!y.is_coalesced());

    let mut res = SparseTensor::<CpuRuntime>::empty(&[8], 1, DType::F32, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    assert_eq!(res.nnz(), 2);
    assert!(!res.is_coalesced());
    let mut got = entries(&res);
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(got, vec![(vec![2], 20.0), (vec![2], 40.0)]);
    assert_eq!(res.shape(), &[8]);
    assert_eq!(res.sparse_dim(), 1);
    assert_eq!(res.dense_dim(), 0);
}

#[test]
fn test_empty_intersection() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[0, 1], &[1.0f64, 2.0], &[6], 1, &device)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&[4, 5], &[3.0f64, 4.0], &[6], 1, &device)
        .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[6], 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    assert_eq!(res.nnz(), 0);
    assert_eq!(res.shape(), &[6]);
    assert_eq!(res.sparse_dim(), 1);
    assert_eq!(res.dense_dim(), 0);
}

#[test]
fn test_empty_operand() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[0, 1], &[1.0f32, 2.0], &[4], 1, &device)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F32, &device);

    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F32, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();
    assert_eq!(res.nnz(), 0);

    sparse_mul(&client, &mut res, &y, &x).unwrap();
    assert_eq!(res.nnz(), 0);
}

#[test]
fn test_coalesced_result_invariant() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[1, 3, 5], &[1.0f32, 2.0, 3.0], &[8], 1, &device)
        .unwrap()
        .coalesce(&client)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&[3, 5, 7], &[4.0f32, 5.0, 6.0], &[8], 1, &device)
        .unwrap()
        .coalesce(&client)
        .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[8], 1, DType::F32, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    // Both inputs coalesced => result coalesced, sorted, unique
    assert!(res.is_coalesced());
    assert_eq!(res.indices().to_vec::<i64>(), vec![3, 5]);
    assert_eq!(res.values().to_vec::<f32>(), vec![8.0, 10.0]);

    // One uncoalesced input (even without duplicates) => result not coalesced
    let y_unc =
        SparseTensor::<CpuRuntime>::from_coords(&[3, 5, 7], &[4.0f32, 5.0, 6.0], &[8], 1, &device)
            .unwrap();
    sparse_mul(&client, &mut res, &x, &y_unc).unwrap();
    assert!(!res.is_coalesced());
}

#[test]
fn test_commutative_idempotence() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(
        &[6, 0, 2, 2],
        &[1.5f64, 2.0, 3.0, 4.0],
        &[8],
        1,
        &device,
    )
    .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(
        &[2, 6, 6, 1],
        &[10.0f64, 20.0, 30.0, 40.0],
        &[8],
        1,
        &device,
    )
    .unwrap();

    let mut xy = SparseTensor::<CpuRuntime>::empty(&[8], 1, DType::F64, &device);
    let mut yx = SparseTensor::<CpuRuntime>::empty(&[8], 1, DType::F64, &device);
    sparse_mul(&client, &mut xy, &x, &y).unwrap();
    sparse_mul(&client, &mut yx, &y, &x).unwrap();

    // Order may differ; coalesced forms must match exactly
    let cxy = xy.coalesce(&client).unwrap();
    let cyx = yx.coalesce(&client).unwrap();
    assert_eq!(cxy.indices().to_vec::<i64>(), cyx.indices().to_vec::<i64>());
    assert_eq!(cxy.values().to_vec::<f64>(), cyx.values().to_vec::<f64>());
}

#[test]
fn test_duplicate_multiplicity() {
    // Coordinate 1 appears twice in x and three times in y: 6 matched pairs
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[1, 1], &[2.0f64, 3.0], &[4], 1, &device)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(
        &[1, 1, 1],
        &[10.0f64, 20.0, 30.0],
        &[4],
        1,
        &device,
    )
    .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    assert_eq!(res.nnz(), 6);
    assert!(!res.is_coalesced());
    let total: f64 = entries(&res).iter().map(|(_, v)| v).sum();
    // (2 + 3) * (10 + 20 + 30)
    assert_eq!(total, 300.0);
}

#[test]
fn test_multi_sparse_dim() {
    let (device, client) = setup();
    // 2-D coordinates in a [3, 4] shape, dimension-major coords layout
    let x = SparseTensor::<CpuRuntime>::from_coords(
        &[0, 1, 2, 1, 2, 3],
        &[1.0f32, 2.0, 3.0],
        &[3, 4],
        2,
        &device,
    )
    .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(
        &[1, 2, 0, 2, 3, 0],
        &[10.0f32, 20.0, 30.0],
        &[3, 4],
        2,
        &device,
    )
    .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[3, 4], 2, DType::F32, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    // Shared coordinates: (1, 2) and (2, 3)
    let mut got = entries(&res);
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(got, vec![(vec![1, 2], 20.0), (vec![2, 3], 60.0)]);
}

#[test]
fn test_dense_value_rows() {
    let (device, client) = setup();
    // sparse_dim 1 over [4, 2]: each nonzero carries a dense row of 2
    let x = SparseTensor::<CpuRuntime>::from_coords(
        &[0, 2],
        &[1.0f64, 2.0, 3.0, 4.0],
        &[4, 2],
        1,
        &device,
    )
    .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(
        &[2, 3],
        &[10.0f64, 100.0, 5.0, 5.0],
        &[4, 2],
        1,
        &device,
    )
    .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[4, 2], 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    assert_eq!(res.nnz(), 1);
    assert_eq!(res.dense_dim(), 1);
    assert_eq!(res.indices().to_vec::<i64>(), vec![2]);
    assert_eq!(res.values().to_vec::<f64>(), vec![30.0, 400.0]);
}

#[test]
fn test_width_boundary_64bit_hash() {
    // Sparse-shape product 2^21 * 2^21 = 2^42 exceeds the 32-bit hash bound,
    // forcing the 64-bit hash path. Same pattern as a small-shape case.
    let (device, client) = setup();
    let big = 1usize << 21;

    let run = |shape: &[usize]| {
        let far = (shape[0] - 1) as i64;
        let x = SparseTensor::<CpuRuntime>::from_coords(
            &[0, far, 0, far],
            &[1.0f64, 2.0],
            shape,
            2,
            &device,
        )
        .unwrap();
        let y = SparseTensor::<CpuRuntime>::from_coords(
            &[far, 0, far, 0],
            &[10.0f64, 30.0],
            shape,
            2,
            &device,
        )
        .unwrap();
        let mut res = SparseTensor::<CpuRuntime>::empty(shape, 2, DType::F64, &device);
        sparse_mul(&client, &mut res, &x, &y).unwrap();
        let mut got = entries(&res)
            .into_iter()
            .map(|(c, v)| (c.iter().map(|&i| i != 0).collect::<Vec<bool>>(), v))
            .collect::<Vec<_>>();
        got.sort_by(|a, b| a.partial_cmp(b).unwrap());
        got
    };

    // Logical result must be unaffected by the hash width
    assert_eq!(run(&[big, big]), run(&[4, 4]));
}

#[test]
fn test_width_boundary_64bit_offset() {
    // nnz_x * nnz_y = 2.5e9 exceeds the 32-bit offset bound while the hash
    // domain stays 32-bit, exercising the mixed-width specialization (and the
    // parallel launch path, being far above the serial threshold).
    let (device, client) = setup();
    let n = 50_000usize;

    let x_coords: Vec<i64> = (0..n as i64).map(|k| k * 2).collect();
    let mut y_coords: Vec<i64> = (0..n as i64).map(|k| k * 2 + 1).collect();
    y_coords[0] = 0; // the single shared coordinate

    let mut x_vals = vec![1.0f64; n];
    let mut y_vals = vec![1.0f64; n];
    x_vals[0] = 7.0;
    y_vals[0] = 3.0;

    let shape = [2 * n];
    let x = SparseTensor::<CpuRuntime>::from_coords(&x_coords, &x_vals, &shape, 1, &device)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&y_coords, &y_vals, &shape, 1, &device)
        .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&shape, 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    assert_eq!(res.nnz(), 1);
    assert_eq!(res.indices().to_vec::<i64>(), vec![0]);
    assert_eq!(res.values().to_vec::<f64>(), vec![21.0]);
}

#[test]
fn test_dtype_promotion_and_cast() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[1, 2], &[3i32, 4], &[4], 1, &device).unwrap();
    let y =
        SparseTensor::<CpuRuntime>::from_coords(&[2, 3], &[0.5f32, 0.5], &[4], 1, &device).unwrap();

    // promote(I32, F32) = F32, castable into a declared F64 output
    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();
    assert_eq!(res.dtype(), DType::F64);
    assert_eq!(res.values().to_vec::<f64>(), vec![2.0]);
}

#[test]
fn test_cast_failure_is_eager() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[1], &[1.5f32], &[4], 1, &device).unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&[1], &[2.5f32], &[4], 1, &device).unwrap();

    // F32 result cannot be cast into a declared integer output
    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::I32, &device);
    let err = sparse_mul(&client, &mut res, &x, &y).unwrap_err();
    assert!(err.to_string().contains("Cannot cast"));
    // res untouched by the failed call
    assert_eq!(res.nnz(), 0);
    assert_eq!(res.dtype(), DType::I32);
}

#[test]
fn test_precondition_failures() {
    let (device, client) = setup();
    let x = SparseTensor::<CpuRuntime>::from_coords(&[1], &[1.0f32], &[4], 1, &device).unwrap();
    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F32, &device);

    // Mismatched sparse shape prefix
    let y = SparseTensor::<CpuRuntime>::from_coords(&[1], &[1.0f32], &[5], 1, &device).unwrap();
    assert!(sparse_mul(&client, &mut res, &x, &y).is_err());

    // Mismatched rank
    let y = SparseTensor::<CpuRuntime>::from_coords(&[1], &[1.0f32, 2.0], &[4, 2], 1, &device)
        .unwrap();
    assert!(sparse_mul(&client, &mut res, &x, &y).is_err());

    // Mismatched sparse_dim at equal rank
    let x2 = SparseTensor::<CpuRuntime>::from_coords(&[1, 0], &[1.0f32], &[4, 2], 2, &device)
        .unwrap();
    let y2 = SparseTensor::<CpuRuntime>::from_coords(&[1], &[1.0f32, 2.0], &[4, 2], 1, &device)
        .unwrap();
    assert!(sparse_mul(&client, &mut res, &x2, &y2).is_err());
}

#[test]
fn test_non_commutative_sub() {
    let (device, client) = setup();
    // Duplicates on both sides; the non-commutative path coalesces (summing
    // duplicates) before subtracting, so x@2 = 5, y@2 = 3 => 2
    let x = SparseTensor::<CpuRuntime>::from_coords(&[2, 2, 0], &[2.0f64, 3.0, 7.0], &[4], 1, &device)
        .unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&[3, 2, 2], &[9.0f64, 1.0, 2.0], &[4], 1, &device)
        .unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[4], 1, DType::F64, &device);
    sparse_binary_op_intersection(&client, &mut res, &x, &y, BinaryOp::Sub, false).unwrap();

    assert!(res.is_coalesced());
    assert_eq!(res.indices().to_vec::<i64>(), vec![2]);
    assert_eq!(res.values().to_vec::<f64>(), vec![2.0]);
}

#[test]
fn test_eager_coalesce_heuristic_path() {
    // Shape [2] with 128 nonzeros: nnz / numel = 64 > 50, so the uncoalesced
    // probe candidate gets eagerly coalesced and the result comes out merged.
    let (device, client) = setup();
    let coords: Vec<i64> = (0..128).map(|i| i % 2).collect();
    let vals: Vec<f64> = vec![1.0; 128];
    let x = SparseTensor::<CpuRuntime>::from_coords(&coords, &vals, &[2], 1, &device).unwrap();
    let y = SparseTensor::<CpuRuntime>::from_coords(&[0], &[2.0f64], &[2], 1, &device).unwrap();

    let mut res = SparseTensor::<CpuRuntime>::empty(&[2], 1, DType::F64, &device);
    sparse_mul(&client, &mut res, &x, &y).unwrap();

    // x coalesces to {0: 64.0, 1: 64.0}; intersection with y at 0 only
    assert_eq!(res.nnz(), 1);
    assert_eq!(res.indices().to_vec::<i64>(), vec![0]);
    assert_eq!(res.values().to_vec::<f64>(), vec![128.0]);
}

#[test]
fn test_random_cross_check_against_reference() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    let (device, client) = setup();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..10 {
        let shape = [7usize, 9];
        let nnz_x = rng.gen_range(0..40);
        let nnz_y = rng.gen_range(0..40);

        let gen = |rng: &mut StdRng, nnz: usize| -> (Vec<i64>, Vec<f64>) {
            let mut coords = vec![0i64; 2 * nnz];
            for k in 0..nnz {
                coords[k] = rng.gen_range(0..shape[0] as i64);
                coords[nnz + k] = rng.gen_range(0..shape[1] as i64);
            }
            let vals = (0..nnz).map(|_| rng.gen_range(-4..=4) as f64).collect();
            (coords, vals)
        };

        let (cx, vx) = gen(&mut rng, nnz_x);
        let (cy, vy) = gen(&mut rng, nnz_y);

        let x = SparseTensor::<CpuRuntime>::from_coords(&cx, &vx, &shape, 2, &device).unwrap();
        let y = SparseTensor::<CpuRuntime>::from_coords(&cy, &vy, &shape, 2, &device).unwrap();

        let mut res = SparseTensor::<CpuRuntime>::empty(&shape, 2, DType::F64, &device);
        sparse_mul(&client, &mut res, &x, &y).unwrap();
        let res = res.coalesce(&client).unwrap();

        // Naive reference: dense accumulation of coalesced inputs, then product
        let dense = |coords: &[i64], vals: &[f64], nnz: usize| -> HashMap<(i64, i64), f64> {
            let mut m = HashMap::new();
            for k in 0..nnz {
                *m.entry((coords[k], coords[nnz + k])).or_insert(0.0) += vals[k];
            }
            m
        };
        let dx = dense(&cx, &vx, nnz_x);
        let dy = dense(&cy, &vy, nnz_y);
        let mut expected: Vec<((i64, i64), f64)> = dx
            .iter()
            .filter_map(|(c, vx)| dy.get(c).map(|vy| (*c, vx * vy)))
            .collect();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let got_entries = entries(&res);
        let mut got: Vec<((i64, i64), f64)> = got_entries
            .iter()
            .map(|(c, v)| ((c[0], c[1]), *v))
            .collect();
        got.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert_eq!(got, expected);
    }
}
