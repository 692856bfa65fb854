//! Bucket-order iteration over distributed arrays.
//!
//! The iterator walks a list of source arrays and hands out batches of
//! [`PartRef`]s covering a requested byte size, without copying any data.
//! Two traversal orders exist:
//!
//! - **In-order**: all partitions of array 0, then all of array 1, and so
//!   on. Used for reading one array end to end (verification, final
//!   output assembly).
//! - **Strided**: partition `b` of every array, then partition `b+1` of
//!   every array. This is the load-balancing primitive between passes: it
//!   interleaves the same bucket across all producers, so slicing the
//!   resulting stream into equal chunks still hands each consumer one
//!   bucket's data contiguously.
//!
//! Strided order between passes is a correctness requirement of the radix
//! sort, not a performance choice; do not swap the default.

use strata_core::error::{Result, StrataError};
use strata_core::refs::{fetch_refs, PartRef};
use strata_core::storage::{ArrayShape, DistribArray};
use std::sync::Arc;

/// Byte budget per `next` call when draining a whole array.
const READ_ALL_CHUNK: u64 = 1 << 20;

/// Traversal order over `(array, partition)` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrder {
    /// Partition index advances fastest.
    InOrder,
    /// Array index advances fastest, interleaving each bucket across all
    /// sources.
    Strided,
}

/// One batch of refs handed to a worker.
#[derive(Debug)]
pub struct RefBatch {
    /// The refs, in traversal order. Their `nbyte`s sum to at most the
    /// requested size.
    pub refs: Vec<PartRef>,
    /// Whether the sources are exhausted. A batch that lands exactly on
    /// the end of the data is *not* flagged; the following call returns
    /// an empty, exhausted batch.
    pub exhausted: bool,
}

/// A stateful cursor over a list of source arrays.
///
/// Shapes are snapshotted at construction, so batch planning never
/// touches partition contents.
#[derive(Debug)]
pub struct BucketIterator {
    arrs: Vec<Arc<dyn DistribArray>>,
    shapes: Vec<ArrayShape>,
    order: ReadOrder,
    npart: usize,
    arr_x: usize,
    part_x: usize,
    data_x: u64,
    done: bool,
}

impl BucketIterator {
    /// Build an iterator over `sources` in the given order.
    ///
    /// Fails with `ShapeMismatch` if the sources disagree on partition
    /// count.
    pub async fn new(sources: &[Arc<dyn DistribArray>], order: ReadOrder) -> Result<Self> {
        let mut shapes = Vec::with_capacity(sources.len());
        for arr in sources {
            shapes.push(arr.shape().await?);
        }

        let npart = shapes[0].npart();
        for shape in &shapes[1..] {
            if shape.npart() != npart {
                return Err(StrataError::ShapeMismatch {
                    expected: npart,
                    got: shape.npart(),
                });
            }
        }

        Ok(Self {
            arrs: sources.to_vec(),
            shapes,
            order,
            npart,
            arr_x: 0,
            part_x: 0,
            data_x: 0,
            done: false,
        })
    }

    /// Advance to the next `(array, partition)` cell. Returns `true` when
    /// the traversal has wrapped past the last cell.
    fn advance(&mut self) -> bool {
        match self.order {
            ReadOrder::Strided => {
                self.arr_x += 1;
                if self.arr_x == self.arrs.len() {
                    self.arr_x = 0;
                    self.part_x += 1;
                    if self.part_x == self.npart {
                        return true;
                    }
                }
            }
            ReadOrder::InOrder => {
                self.part_x += 1;
                if self.part_x == self.npart {
                    self.part_x = 0;
                    self.arr_x += 1;
                    if self.arr_x == self.arrs.len() {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Produce the next batch of refs covering at most `sz` bytes.
    ///
    /// Emits a full `sz`-byte batch whenever data remains; at end of data
    /// the partial remainder comes back with `exhausted` set. Batches may
    /// span partitions and arrays; empty partitions are traversed and
    /// skipped.
    pub fn next(&mut self, sz: u64) -> RefBatch {
        let mut refs = Vec::new();
        if self.done {
            return RefBatch {
                refs,
                exhausted: true,
            };
        }

        let mut needed = sz;
        loop {
            let part_len = self.shapes[self.arr_x].len(self.part_x);

            while self.data_x < part_len {
                let remaining = part_len - self.data_x;
                let take = remaining.min(needed);
                refs.push(PartRef {
                    arr: Arc::clone(&self.arrs[self.arr_x]),
                    part: self.part_x,
                    start: self.data_x,
                    nbyte: take,
                });
                self.data_x += take;
                needed -= take;

                if needed == 0 {
                    return RefBatch {
                        refs,
                        exhausted: false,
                    };
                }
            }
            self.data_x = 0;

            if self.advance() {
                self.done = true;
                return RefBatch {
                    refs,
                    exhausted: true,
                };
            }
        }
    }

    /// Drain the remaining traversal into one contiguous buffer.
    pub async fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let batch = self.next(READ_ALL_CHUNK);
            out.extend_from_slice(&fetch_refs(&batch.refs).await?);
            if batch.exhausted {
                return Ok(out);
            }
        }
    }
}
