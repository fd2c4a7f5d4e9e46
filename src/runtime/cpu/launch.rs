//! Launcher implementation for the CPU runtime

use super::client::CpuClient;
use crate::runtime::Launcher;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parallelization threshold: skip rayon for small launches (overhead > benefit)
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 4096;

impl Launcher for CpuClient {
    fn launch<F>(&self, len: usize, task: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        #[cfg(feature = "rayon")]
        if len >= PARALLEL_THRESHOLD {
            (0..len).into_par_iter().for_each(|k| task(k));
            return;
        }

        // Serial fallback for small launches and non-rayon builds
        for k in 0..len {
            task(k);
        }
    }
}
