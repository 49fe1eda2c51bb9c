// src/engine/pool.rs
//
// Global thread pool for batch conversions.
//
// A single global pool is shared by all batches instead of building a pool
// per call: pool construction costs milliseconds, and reusing threads keeps
// the per-window fan-out overhead near zero. The pool is initialized lazily
// on first use; later changes to the environment have no effect.

use rayon::ThreadPool;
use std::sync::OnceLock;

/// Upper bound for a caller-supplied concurrency value.
pub const MAX_CONCURRENCY: usize = 1024;

/// Fallback window width when CPU detection fails.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Minimum number of rayon threads to ensure at least some parallelism.
const MIN_RAYON_THREADS: usize = 1;

static GLOBAL_THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

pub(crate) fn get_pool() -> &'static ThreadPool {
    GLOBAL_THREAD_POOL.get_or_init(|| {
        let num_threads = detected_parallelism().max(MIN_RAYON_THREADS);

        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap_or_else(|e| {
                // Fallback: minimal pool if the preferred configuration fails
                rayon::ThreadPoolBuilder::new()
                    .num_threads(MIN_RAYON_THREADS)
                    .build()
                    .unwrap_or_else(|fallback_err| {
                        panic!(
                            "failed to create fallback thread pool with {} threads: {} (original: {})",
                            MIN_RAYON_THREADS, fallback_err, e
                        )
                    })
            })
    })
}

fn detected_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_CONCURRENCY)
}

/// Window width for a batch of `batch_len` items: the detected CPU
/// parallelism, never wider than the batch itself.
pub fn effective_concurrency(batch_len: usize) -> usize {
    let cpu_based = detected_parallelism();
    cpu_based.min(batch_len).max(MIN_RAYON_THREADS)
}
