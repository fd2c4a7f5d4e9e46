//! Backend-portable data-parallel kernel launching

/// A data-parallel map over independent elements
///
/// `launch(len, task)` runs `task(k)` once for every `k in 0..len` and returns
/// only after every task has completed, so each launch is a barrier: a stage's
/// outputs are fully materialized before the next stage reads them.
///
/// # Contract
///
/// - Tasks are pure per-index functions with no inter-task ordering; the
///   implementation may run them in any order and with any degree of
///   parallelism (thread pool, per-element grid, or a sequential loop).
/// - Tasks execute in the calling process's address space and may dereference
///   host-visible pointers captured from tensor storage.
/// - Each task must write only to slots it owns. Callers guarantee write
///   disjointness (in the intersection pipeline this follows from offsets
///   being exclusive prefix sums); no locking is performed.
pub trait Launcher {
    /// Run `task` for every index in `0..len` and wait for completion
    fn launch<F>(&self, len: usize, task: F)
    where
        F: Fn(usize) + Send + Sync;
}
