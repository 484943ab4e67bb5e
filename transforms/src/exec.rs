//! Loop-level execution policy.
//!
//! Every element-wise pass in the engine runs through one of these two
//! strategies, selected once per process instead of per call site.

use std::sync::OnceLock;

use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecPolicy {
    Sequential,
    DataParallel,
}

static POLICY: OnceLock<ExecPolicy> = OnceLock::new();

/// Installs the process-wide policy. The first call wins; later calls are
/// ignored so that library code cannot flip the policy mid-run.
pub fn install(policy: ExecPolicy) {
    let _ = POLICY.set(policy);
}

pub fn policy() -> ExecPolicy {
    *POLICY.get().unwrap_or(&ExecPolicy::DataParallel)
}

impl ExecPolicy {
    /// Runs `f(i, &mut out[i])` for every index. Loop bodies must be
    /// data-independent; the parallel strategy imposes no ordering.
    pub fn for_each_indexed<T, F>(self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        match self {
            ExecPolicy::Sequential => out.iter_mut().enumerate().for_each(|(i, x)| f(i, x)),
            ExecPolicy::DataParallel => out
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, x): (usize, &mut T)| f(i, x)),
        }
    }

    /// Runs `f(i, &mut chunk)` over contiguous chunks of `chunk_len`
    /// elements. Used for row-shaped passes over flat buffers.
    pub fn for_each_chunk<T, F>(self, out: &mut [T], chunk_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        debug_assert!(chunk_len > 0);
        match self {
            ExecPolicy::Sequential => out
                .chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(i, c)| f(i, c)),
            ExecPolicy::DataParallel => out
                .par_chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(i, c): (usize, &mut [T])| f(i, c)),
        }
    }
}
