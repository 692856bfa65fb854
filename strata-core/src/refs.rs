//! Value-typed references into partitions, and gathering them into memory.
//!
//! A `PartRef` says "read `nbyte` bytes starting at `start` from partition
//! `part` of this array". Workers receive their pass input as a list of
//! refs and materialize it with [`fetch_refs`].

use crate::error::{Result, StrataError};
use crate::storage::DistribArray;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// A read-only reference to a byte range inside one partition.
///
/// Invariant: `start + nbyte <= len(arr, part)`. Refs are shared,
/// immutable values; cloning one is cheap.
#[derive(Clone)]
pub struct PartRef {
    /// The array to read from.
    pub arr: Arc<dyn DistribArray>,
    /// The partition to read from.
    pub part: usize,
    /// Byte offset to start reading at.
    pub start: u64,
    /// Number of bytes to read.
    pub nbyte: u64,
}

impl fmt::Debug for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartRef")
            .field("arr", &self.arr.name())
            .field("part", &self.part)
            .field("start", &self.start)
            .field("nbyte", &self.nbyte)
            .finish()
    }
}

/// Gather a list of refs into one contiguous buffer, in ref order.
///
/// Each ref's range reader must deliver exactly `nbyte` bytes; an early
/// end of stream fails with `ShortRead` naming the offending partition.
pub async fn fetch_refs(refs: &[PartRef]) -> Result<Vec<u8>> {
    let total: u64 = refs.iter().map(|r| r.nbyte).sum();
    let mut out = vec![0u8; total as usize];

    let mut pos = 0usize;
    for r in refs {
        let want = r.nbyte as usize;
        let mut reader = r
            .arr
            .range_reader(r.part, r.start, r.start + r.nbyte)
            .await?;

        let mut filled = 0usize;
        while filled < want {
            let n = reader
                .read(&mut out[pos + filled..pos + want])
                .await
                .map_err(|e| StrataError::PartRead {
                    array: r.arr.name().to_string(),
                    part: r.part,
                    cause: e.to_string(),
                })?;
            if n == 0 {
                return Err(StrataError::ShortRead {
                    array: r.arr.name().to_string(),
                    part: r.part,
                    expected: r.nbyte,
                    got: filled as u64,
                });
            }
            filled += n;
        }
        pos += want;
    }

    Ok(out)
}
