//! The pass controller.
//!
//! Runs `32 / width` passes over the data. Each pass re-slices the
//! previous pass's bucketed output through a strided [`BucketIterator`],
//! hands equal-byte chunks to `nworkers` concurrent workers, joins them
//! all, and adopts their outputs as the next pass's input.
//!
//! ## Concurrency
//!
//! Workers of one pass run as tokio tasks on a `JoinSet` and never talk
//! to each other: they share read-only refs into the previous pass's
//! arrays and each owns the output array it creates. Passes are strictly
//! sequential.
//!
//! ## Error Handling
//!
//! There is no cancellation: when a worker fails, its siblings run to
//! completion before the failure (lowest worker id wins) is returned,
//! wrapped with pass and worker context. Partial output arrays from a
//! failed pass are left to the caller's factory namespace.

use crate::iter::{BucketIterator, ReadOrder};
use crate::worker::SortWorker;
use strata_core::config::SortConfig;
use strata_core::error::{Result, StrataError};
use strata_core::storage::{ArrayFactory, DistribArray, StorageFuture};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Wraps the caller's factory so one worker's outputs are named
/// `step{pass}.worker{id}.{tag}`.
struct NamingFactory {
    inner: Arc<dyn ArrayFactory>,
    pass: usize,
    worker: usize,
}

impl ArrayFactory for NamingFactory {
    fn create(&self, name: &str, npart: usize) -> StorageFuture<'_, Arc<dyn DistribArray>> {
        let full = format!("step{}.worker{}.{}", self.pass, self.worker, name);
        Box::pin(async move { self.inner.create(&full, npart).await })
    }
}

/// Distributed radix sort of `input`, whose bytes are `nints`
/// little-endian `u32` values.
///
/// Returns the final pass's output arrays, in worker order. The sorted
/// sequence is their *strided* concatenation (bucket `b` of every array,
/// for ascending `b`), which [`read_sorted`] assembles. The last pass
/// groups by the most significant digit, so the bucket index is the
/// primary sort key and the array-major reading is not ordered.
pub async fn sort_distrib(
    input: Arc<dyn DistribArray>,
    nints: usize,
    config: &SortConfig,
    factory: Arc<dyn ArrayFactory>,
    worker: Arc<dyn SortWorker>,
) -> Result<Vec<Arc<dyn DistribArray>>> {
    config.validate()?;

    let nworkers = config.nworkers;
    let chunk_bytes = (nints.div_ceil(nworkers) * 4) as u64;
    let total_bytes = (nints * 4) as u64;

    tracing::info!(
        nints,
        width = config.width,
        nworkers,
        npasses = config.npasses(),
        "starting distributed sort"
    );

    // The initial input plays the role of pass -1's output.
    let mut outputs: Vec<Arc<dyn DistribArray>> = vec![input];

    for pass in 0..config.npasses() {
        let inputs = outputs;
        let offset = pass as u32 * config.width;

        tracing::info!(pass, offset, "starting pass");

        let mut iter = BucketIterator::new(&inputs, ReadOrder::Strided).await?;
        let mut tasks: JoinSet<(usize, Result<Arc<dyn DistribArray>>)> = JoinSet::new();

        for worker_id in 0..nworkers {
            let batch = iter.next(chunk_bytes);

            // The byte budget covers all data by construction, so only
            // the final worker may see the iterator run out. A zero-length
            // input never covers any budget; its workers all legitimately
            // receive empty batches.
            if batch.exhausted && worker_id + 1 != nworkers && total_bytes > 0 {
                return Err(StrataError::PrematureEnd {
                    pass,
                    worker: worker_id,
                });
            }

            let naming = NamingFactory {
                inner: Arc::clone(&factory),
                pass,
                worker: worker_id,
            };
            let worker = Arc::clone(&worker);
            let width = config.width;

            tracing::debug!(pass, worker = worker_id, refs = batch.refs.len(), "dispatching worker");

            tasks.spawn(async move {
                let result = worker.execute(batch.refs, offset, width, &naming).await;
                (worker_id, result)
            });
        }

        // Join every sibling before surfacing anything; there is no
        // cancellation of in-flight workers.
        let mut slots: Vec<Option<Arc<dyn DistribArray>>> = vec![None; nworkers];
        let mut failures: Vec<(usize, String)> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((worker_id, Ok(arr))) => slots[worker_id] = Some(arr),
                Ok((worker_id, Err(e))) => {
                    tracing::error!(pass, worker = worker_id, error = %e, "worker failed");
                    failures.push((worker_id, e.to_string()));
                }
                Err(join_err) => {
                    let cause = if join_err.is_panic() {
                        "worker task panicked"
                    } else {
                        "worker task was cancelled"
                    };
                    tracing::error!(pass, error = %join_err, "worker task join error");
                    failures.push((0, cause.to_string()));
                }
            }
        }

        if let Some((worker, cause)) = failures.into_iter().min_by_key(|(id, _)| *id) {
            return Err(StrataError::WorkerFailure {
                pass,
                worker,
                cause,
            });
        }

        outputs = slots
            .into_iter()
            .map(|slot| slot.expect("joined worker left no output and no failure"))
            .collect();

        // Previous pass's arrays are dead now; the caller's original
        // input is never destroyed.
        if config.remove_intermediate && pass > 0 {
            for arr in &inputs {
                arr.destroy().await?;
            }
        }
    }

    tracing::info!("distributed sort complete");
    Ok(outputs)
}

/// Materialize a sort's final outputs as one ascending byte sequence.
///
/// Reads bucket `b` of every array before bucket `b + 1` (strided order);
/// after the last pass this lexicographic `(bucket, worker)` order is the
/// fully sorted order.
pub async fn read_sorted(outputs: &[Arc<dyn DistribArray>]) -> Result<Vec<u8>> {
    let mut iter = BucketIterator::new(outputs, ReadOrder::Strided).await?;
    iter.read_all().await
}
