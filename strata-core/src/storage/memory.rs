//! In-memory storage backend.
//!
//! This backend is useful for:
//! - Development and testing
//! - Single-process sorts that fit in memory
//!
//! Partitions live in heap buffers behind `parking_lot` mutexes; readers
//! copy the requested range out so they never hold a lock across an await.

use super::shape::ArrayShape;
use super::traits::{
    resolve_range, ArrayFactory, DistribArray, PartWriter, RangeReader, StorageFuture,
};
use crate::error::StrataError;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// One partition's buffer plus its write-once seal.
#[derive(Default, Debug)]
struct PartState {
    data: Vec<u8>,
    sealed: bool,
}

/// A distributed array held entirely in memory.
#[derive(Debug)]
pub struct MemDistribArray {
    name: String,
    parts: Vec<Arc<Mutex<PartState>>>,
}

impl MemDistribArray {
    /// Create an array of `npart` empty, writable partitions.
    #[must_use]
    pub fn new(name: impl Into<String>, npart: usize) -> Self {
        Self {
            name: name.into(),
            parts: (0..npart).map(|_| Arc::default()).collect(),
        }
    }

    /// Create an array pre-filled with the given partition contents.
    ///
    /// The partitions are sealed; this is the convenient way to stage a
    /// sort's initial input.
    #[must_use]
    pub fn with_data(name: impl Into<String>, parts: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            parts: parts
                .into_iter()
                .map(|data| Arc::new(Mutex::new(PartState { data, sealed: true })))
                .collect(),
        }
    }
}

impl DistribArray for MemDistribArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn npart(&self) -> usize {
        self.parts.len()
    }

    fn shape(&self) -> StorageFuture<'_, ArrayShape> {
        Box::pin(async move {
            let lens = self
                .parts
                .iter()
                .map(|p| p.lock().data.len() as u64)
                .collect();
            Ok(ArrayShape::new(lens))
        })
    }

    fn range_reader(&self, part: usize, start: u64, end: u64) -> StorageFuture<'_, RangeReader> {
        Box::pin(async move {
            let state = self.parts[part].lock();
            let (start, end) = resolve_range(&self.name, part, start, end, state.data.len() as u64)?;
            let bytes = state.data[start as usize..end as usize].to_vec();
            drop(state);
            Ok(Box::pin(io::Cursor::new(bytes)) as RangeReader)
        })
    }

    fn writer(&self, part: usize) -> StorageFuture<'_, PartWriter> {
        Box::pin(async move {
            let slot = &self.parts[part];
            {
                let mut state = slot.lock();
                if state.sealed {
                    return Err(StrataError::PartSealed {
                        array: self.name.clone(),
                        part,
                    });
                }
                state.sealed = true;
            }
            Ok(Box::pin(MemPartWriter {
                part: Arc::clone(slot),
            }) as PartWriter)
        })
    }

    fn destroy(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            for slot in &self.parts {
                let mut state = slot.lock();
                state.data = Vec::new();
                state.sealed = true;
            }
            tracing::debug!(array = %self.name, "destroyed memory array");
            Ok(())
        })
    }
}

/// Appending writer over a memory partition.
struct MemPartWriter {
    part: Arc<Mutex<PartState>>,
}

impl AsyncWrite for MemPartWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.part.lock().data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Factory producing [`MemDistribArray`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemArrayFactory;

impl ArrayFactory for MemArrayFactory {
    fn create(&self, name: &str, npart: usize) -> StorageFuture<'_, Arc<dyn DistribArray>> {
        let name = name.to_string();
        Box::pin(async move {
            tracing::debug!(array = %name, npart, "created memory array");
            Ok(Arc::new(MemDistribArray::new(name, npart)) as Arc<dyn DistribArray>)
        })
    }
}
