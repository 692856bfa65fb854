//! Sort workers.
//!
//! A worker receives one chunk of a pass's input as a list of refs,
//! partitions the chunk by the pass's radix digit, and emits a fresh
//! array with one partition per bucket. The trait is the seam between
//! the pass controller and the two implementations (local partitioning
//! here, remote dispatch in [`crate::remote`]).

use crate::kernel;
use strata_core::codec;
use strata_core::error::{Result, StrataError};
use strata_core::refs::{fetch_refs, PartRef};
use strata_core::storage::{ArrayFactory, DistribArray};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Type alias for a worker's async result.
pub type WorkerFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<dyn DistribArray>>> + Send + 'a>>;

/// Trait for sort workers.
///
/// `execute` must preserve the relative order of elements sharing a digit
/// (stability within the pass) and must create every bucket's partition,
/// empty or not, through the supplied factory.
pub trait SortWorker: Send + Sync {
    /// Partition the bytes behind `refs` by the digit at `offset` and
    /// write one output partition per bucket value.
    fn execute<'a>(
        &'a self,
        refs: Vec<PartRef>,
        offset: u32,
        width: u32,
        factory: &'a dyn ArrayFactory,
    ) -> WorkerFuture<'a>;
}

/// A worker that partitions in the calling process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalWorker;

impl SortWorker for LocalWorker {
    fn execute<'a>(
        &'a self,
        refs: Vec<PartRef>,
        offset: u32,
        width: u32,
        factory: &'a dyn ArrayFactory,
    ) -> WorkerFuture<'a> {
        Box::pin(async move {
            let bytes = fetch_refs(&refs).await?;
            let ints = codec::decode(&bytes)?;

            tracing::debug!(
                refs = refs.len(),
                nint = ints.len(),
                offset,
                width,
                "local worker partitioning chunk"
            );

            let (sorted, boundaries) = kernel::partition_by_digit(&ints, offset, width);

            let nbucket = 1usize << width;
            let out = factory.create("output", nbucket).await?;

            for b in 0..nbucket {
                let mut writer = out.writer(b).await?;
                let wrap = |e: std::io::Error| StrataError::PartWrite {
                    array: out.name().to_string(),
                    part: b,
                    cause: e.to_string(),
                };

                let chunk = codec::encode(&sorted[boundaries[b]..boundaries[b + 1]]);
                writer.write_all(&chunk).await.map_err(wrap)?;
                writer.shutdown().await.map_err(wrap)?;
            }

            Ok(out)
        })
    }
}
