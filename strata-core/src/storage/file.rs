//! File-backed storage backend.
//!
//! One directory per array, one `part{NNN}.bin` file per partition. All
//! partition files are created (empty) up front so that empty buckets are
//! still real, observable partitions. Ranged reads open the file, seek to
//! the range start, and hand back a length-limited reader; appends open
//! the file in append mode.
//!
//! The directory name doubles as the array's identity inside a storage
//! namespace shared with remote executors.

use super::shape::ArrayShape;
use super::traits::{
    resolve_range, ArrayFactory, DistribArray, PartWriter, RangeReader, StorageFuture,
};
use crate::error::{Result, StrataError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

/// A distributed array backed by one file per partition.
#[derive(Debug)]
pub struct FileDistribArray {
    name: String,
    root: PathBuf,
    sealed: Vec<AtomicBool>,
}

impl FileDistribArray {
    /// Create the array directory under `base` with `npart` empty
    /// partition files.
    pub async fn create(base: &Path, name: impl Into<String>, npart: usize) -> Result<Self> {
        let name = name.into();
        let root = base.join(&name);

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StrataError::ArrayCreate {
                name: name.clone(),
                cause: e.to_string(),
            })?;

        for part in 0..npart {
            tokio::fs::File::create(part_path(&root, part))
                .await
                .map_err(|e| StrataError::ArrayCreate {
                    name: name.clone(),
                    cause: format!("partition {}: {}", part, e),
                })?;
        }

        tracing::debug!(array = %name, npart, root = %root.display(), "created file array");

        Ok(Self {
            name,
            root,
            sealed: (0..npart).map(|_| AtomicBool::new(false)).collect(),
        })
    }

    /// The directory holding this array's partition files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn part_path(root: &Path, part: usize) -> PathBuf {
    root.join(format!("part{:03}.bin", part))
}

impl DistribArray for FileDistribArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn npart(&self) -> usize {
        self.sealed.len()
    }

    fn shape(&self) -> StorageFuture<'_, ArrayShape> {
        Box::pin(async move {
            let mut lens = Vec::with_capacity(self.npart());
            for part in 0..self.npart() {
                let meta = tokio::fs::metadata(part_path(&self.root, part))
                    .await
                    .map_err(|e| StrataError::PartRead {
                        array: self.name.clone(),
                        part,
                        cause: e.to_string(),
                    })?;
                lens.push(meta.len());
            }
            Ok(ArrayShape::new(lens))
        })
    }

    fn range_reader(&self, part: usize, start: u64, end: u64) -> StorageFuture<'_, RangeReader> {
        Box::pin(async move {
            let path = part_path(&self.root, part);
            let wrap = |e: std::io::Error| StrataError::PartRead {
                array: self.name.clone(),
                part,
                cause: e.to_string(),
            };

            let meta = tokio::fs::metadata(&path).await.map_err(wrap)?;
            let (start, end) = resolve_range(&self.name, part, start, end, meta.len())?;

            let mut file = tokio::fs::File::open(&path).await.map_err(wrap)?;
            file.seek(SeekFrom::Start(start)).await.map_err(wrap)?;
            Ok(Box::pin(file.take(end - start)) as RangeReader)
        })
    }

    fn writer(&self, part: usize) -> StorageFuture<'_, PartWriter> {
        Box::pin(async move {
            if self.sealed[part].swap(true, Ordering::SeqCst) {
                return Err(StrataError::PartSealed {
                    array: self.name.clone(),
                    part,
                });
            }

            let file = tokio::fs::OpenOptions::new()
                .append(true)
                .open(part_path(&self.root, part))
                .await
                .map_err(|e| StrataError::PartWrite {
                    array: self.name.clone(),
                    part,
                    cause: e.to_string(),
                })?;
            Ok(Box::pin(file) as PartWriter)
        })
    }

    fn root_path(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn destroy(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            tokio::fs::remove_dir_all(&self.root)
                .await
                .map_err(|e| StrataError::ArrayDestroy {
                    name: self.name.clone(),
                    cause: e.to_string(),
                })?;
            tracing::debug!(array = %self.name, "destroyed file array");
            Ok(())
        })
    }
}

/// Factory producing [`FileDistribArray`]s under a common base directory.
#[derive(Debug, Clone)]
pub struct FileArrayFactory {
    base: PathBuf,
}

impl FileArrayFactory {
    /// Create a factory rooted at `base`. The directory itself is created
    /// lazily, per array.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ArrayFactory for FileArrayFactory {
    fn create(&self, name: &str, npart: usize) -> StorageFuture<'_, Arc<dyn DistribArray>> {
        let name = name.to_string();
        Box::pin(async move {
            let arr = FileDistribArray::create(&self.base, name, npart).await?;
            Ok(Arc::new(arr) as Arc<dyn DistribArray>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn create_write_read_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let arr = FileDistribArray::create(dir.path(), "input", 2)
            .await
            .unwrap();

        let mut w = arr.writer(1).await.unwrap();
        w.write_all(b"0123456789").await.unwrap();
        w.shutdown().await.unwrap();

        let shape = arr.shape().await.unwrap();
        assert_eq!(shape.len(0), 0);
        assert_eq!(shape.len(1), 10);

        let mut r = arr.range_reader(1, 2, 6).await.unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"2345");

        arr.destroy().await.unwrap();
        assert!(!dir.path().join("input").exists());
    }

    #[tokio::test]
    async fn empty_partitions_exist_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let factory = FileArrayFactory::new(dir.path());
        let arr = factory.create("step0.worker0.output", 16).await.unwrap();

        assert_eq!(arr.npart(), 16);
        assert!(dir.path().join("step0.worker0.output/part015.bin").exists());
        assert!(arr.root_path().is_some());
    }

    #[tokio::test]
    async fn partitions_are_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let arr = FileDistribArray::create(dir.path(), "t", 1).await.unwrap();

        let _w = arr.writer(0).await.unwrap();
        let err = arr.writer(0).await.err().unwrap();
        assert_eq!(err.code(), "E005");
    }

    #[tokio::test]
    async fn out_of_range_read_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let arr = FileDistribArray::create(dir.path(), "t", 1).await.unwrap();

        let err = arr.range_reader(0, 1, 0).await.err().unwrap();
        assert_eq!(err.code(), "E004");
    }
}
