// Copyright © 2024 Pathway

use std::fmt;
use std::ops::Range;

use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::error::{Error, Result};
use crate::env::{self, parse_env_var_or};

pub const SCAN_CHUNK_SIZE_ENV: &str = "METAPROP_SCAN_CHUNK_SIZE";
pub const SCAN_THREADS_ENV: &str = "METAPROP_SCAN_THREADS";

const DEFAULT_SCAN_CHUNK_SIZE: usize = 4;

/// Runs an action over sub-ranges of a range.
///
/// Chunks may run in any order and concurrently; the call returns only after every chunk
/// completed. Actions must not touch shared state other than an accumulator they
/// synchronize themselves.
pub trait ConcurrencyContext: Send + Sync {
    fn for_each_chunk(&self, range: Range<usize>, action: &(dyn Fn(Range<usize>) + Sync));
}

fn split_into_chunks(range: Range<usize>, chunk_size: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(range.len().div_ceil(chunk_size));
    let mut start = range.start;
    while start < range.end {
        let end = (start + chunk_size).min(range.end);
        chunks.push(start..end);
        start = end;
    }
    chunks
}

/// Runs all chunks on the calling thread, in order.
#[derive(Debug, Clone, Copy)]
pub struct SequentialContext {
    chunk_size: usize,
}

impl SequentialContext {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for SequentialContext {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_CHUNK_SIZE)
    }
}

impl ConcurrencyContext for SequentialContext {
    fn for_each_chunk(&self, range: Range<usize>, action: &(dyn Fn(Range<usize>) + Sync)) {
        for chunk in split_into_chunks(range, self.chunk_size) {
            action(chunk);
        }
    }
}

/// Spreads chunks over a dedicated rayon pool.
pub struct RayonContext {
    pool: ThreadPool,
    chunk_size: usize,
}

impl RayonContext {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|index| format!("metaprop:scan-{index}"));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| Error::Other(Box::new(e)))?;
        debug!(
            "Started scan pool with {} threads, chunk size {}",
            pool.current_num_threads(),
            config.chunk_size
        );
        Ok(Self {
            pool,
            chunk_size: config.chunk_size,
        })
    }
}

impl fmt::Debug for RayonContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayonContext")
            .field("threads", &self.pool.current_num_threads())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl ConcurrencyContext for RayonContext {
    fn for_each_chunk(&self, range: Range<usize>, action: &(dyn Fn(Range<usize>) + Sync)) {
        let chunks = split_into_chunks(range, self.chunk_size);
        self.pool
            .install(|| chunks.into_par_iter().for_each(|chunk| action(chunk)));
    }
}

/// Settings of the full-column scans. `threads: None` lets rayon pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, env::Error> {
        let chunk_size = parse_env_var_or(SCAN_CHUNK_SIZE_ENV, DEFAULT_SCAN_CHUNK_SIZE)?;
        let threads = env::parse_env_var(SCAN_THREADS_ENV)?;
        Ok(Self {
            chunk_size: chunk_size.max(1),
            threads,
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_SCAN_CHUNK_SIZE,
            threads: None,
        }
    }
}

