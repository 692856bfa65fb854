//! Core storage traits.
//!
//! A distributed array is a fixed-count sequence of append-only byte
//! partitions. The sort composes over the capability set `{shape,
//! range_reader, writer}` rather than any concrete backing, so in-memory
//! and file-backed arrays are interchangeable.
//!
//! # Implementation Notes
//!
//! - All methods are async and must be `Send`
//! - A partition accepts exactly one writer over its lifetime; once that
//!   writer has been handed out the partition is sealed and further
//!   `writer()` calls fail
//! - `shape()` is only meaningful after writing has completed; backends
//!   must tolerate concurrent ranged reads of the same partition

use crate::error::{Result, StrataError};
use crate::storage::ArrayShape;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Type alias for async storage futures.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A sequential reader over one byte range of one partition.
pub type RangeReader = Pin<Box<dyn AsyncRead + Send>>;

/// An appending writer for one partition.
pub type PartWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Trait for distributed arrays.
///
/// An array is an ordered collection of `npart` byte partitions. The sort
/// writes each partition exactly once (one radix bucket per partition) and
/// reads partitions through byte-range readers in later passes.
pub trait DistribArray: Send + Sync + std::fmt::Debug {
    /// The array's name, as given to its factory.
    fn name(&self) -> &str;

    /// Number of partitions. Fixed at creation.
    fn npart(&self) -> usize;

    /// Snapshot the per-partition byte lengths.
    fn shape(&self) -> StorageFuture<'_, ArrayShape>;

    /// Open a reader over bytes `[start, end)` of partition `part`.
    ///
    /// `end == 0` means "to the end of the partition". A range outside
    /// `[0, len]` fails with `RangeOutOfBounds`.
    fn range_reader(&self, part: usize, start: u64, end: u64) -> StorageFuture<'_, RangeReader>;

    /// Open the appending writer for partition `part`.
    ///
    /// Partitions are write-once: the second request for the same
    /// partition fails with `PartSealed`.
    fn writer(&self, part: usize) -> StorageFuture<'_, PartWriter>;

    /// Filesystem directory backing this array, if any.
    ///
    /// Remote workers use this to name partitions in a storage namespace
    /// shared with the executor; memory-backed arrays return `None`.
    fn root_path(&self) -> Option<&Path> {
        None
    }

    /// Release the array's backing storage.
    fn destroy(&self) -> StorageFuture<'_, ()>;
}

/// Trait for array factories.
///
/// The sort controller never constructs arrays directly; it asks the
/// caller's factory so that output arrays land in whatever backing the
/// caller chose. Names follow `step{k}.worker{i}.{tag}` and are opaque to
/// the core.
pub trait ArrayFactory: Send + Sync {
    /// Create a new array with `npart` empty partitions under `name`.
    fn create(&self, name: &str, npart: usize) -> StorageFuture<'_, Arc<dyn DistribArray>>;
}

/// Resolve a `[start, end)` request against a partition of length `len`,
/// translating the `end == 0` sentinel and rejecting out-of-bounds ranges.
pub(crate) fn resolve_range(
    array: &str,
    part: usize,
    start: u64,
    end: u64,
    len: u64,
) -> Result<(u64, u64)> {
    let end = if end == 0 { len } else { end };
    if start > end || end > len {
        return Err(StrataError::RangeOutOfBounds {
            array: array.to_string(),
            part,
            start,
            end,
            len,
        });
    }
    Ok((start, end))
}
