//! Remote sort worker.
//!
//! Ships one chunk's partial sort to an executor reachable over HTTP.
//! The request names partitions inside a storage namespace both sides
//! share (the file backend's directories), so only refs travel on the
//! wire, never data. The output array is allocated host-side and its
//! directory name is handed to the executor to fill in.

use crate::worker::{SortWorker, WorkerFuture};
use serde::{Deserialize, Serialize};
use strata_core::error::{Result, StrataError};
use strata_core::refs::PartRef;
use strata_core::storage::{ArrayFactory, DistribArray};
use std::path::Path;
#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;

/// A ref as it travels to the remote executor: the array's directory name
/// inside the shared namespace plus the partition byte range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRef {
    /// Directory name of the array inside the shared namespace.
    #[serde(rename = "Dir")]
    pub dir: String,
    /// Partition index.
    #[serde(rename = "Part")]
    pub part: usize,
    /// Byte offset to start reading at.
    #[serde(rename = "Start")]
    pub start: u64,
    /// Number of bytes to read.
    #[serde(rename = "NByte")]
    pub nbyte: u64,
}

/// The JSON request body sent to the remote executor.
#[derive(Debug, Serialize, Deserialize)]
pub struct SortRequest {
    /// Bit offset of the digit to partition by.
    #[serde(rename = "Offset")]
    pub offset: u32,
    /// Digit width in bits.
    #[serde(rename = "Width")]
    pub width: u32,
    /// Storage backend type; always `"file"` today.
    #[serde(rename = "ArrType")]
    pub arr_type: String,
    /// The chunk to partition, as shared-namespace refs.
    #[serde(rename = "Input")]
    pub input: Vec<WireRef>,
    /// Directory name of the pre-created output array.
    #[serde(rename = "Output")]
    pub output: String,
}

/// The JSON response body from the remote executor.
#[derive(Debug, Serialize, Deserialize)]
pub struct SortResponse {
    /// Whether the executor completed the partial sort.
    #[serde(rename = "Success")]
    pub success: bool,
    /// The executor's error message, when `success` is false.
    #[serde(rename = "Err", default)]
    pub err: Option<String>,
}

/// A worker that delegates partitioning to a remote executor.
#[derive(Debug, Clone)]
pub struct RemoteWorker {
    endpoint: String,
    http: reqwest::Client,
}

impl RemoteWorker {
    /// Create a worker that POSTs sort requests to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| StrataError::RemoteTransport {
                cause: e.to_string(),
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    /// The directory name identifying an array inside the shared
    /// namespace, for arrays that have one.
    fn shared_dir(arr: &dyn DistribArray) -> Result<String> {
        let root = arr
            .root_path()
            .ok_or_else(|| StrataError::RemoteUnsupported {
                array: arr.name().to_string(),
            })?;
        Ok(dir_name(root))
    }

    async fn invoke(&self, request: &SortRequest) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| StrataError::RemoteTransport {
                cause: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StrataError::RemoteTransport {
                cause: format!("executor answered HTTP {}", status),
            });
        }

        let response: SortResponse =
            response
                .json()
                .await
                .map_err(|e| StrataError::RemoteTransport {
                    cause: format!("unparseable response: {}", e),
                })?;

        if !response.success {
            return Err(StrataError::RemoteRejected {
                cause: response
                    .err
                    .unwrap_or_else(|| "no error reported".to_string()),
            });
        }

        Ok(())
    }
}

fn dir_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned())
}

impl SortWorker for RemoteWorker {
    fn execute<'a>(
        &'a self,
        refs: Vec<PartRef>,
        offset: u32,
        width: u32,
        factory: &'a dyn ArrayFactory,
    ) -> WorkerFuture<'a> {
        Box::pin(async move {
            let mut input = Vec::with_capacity(refs.len());
            for r in &refs {
                input.push(WireRef {
                    dir: Self::shared_dir(r.arr.as_ref())?,
                    part: r.part,
                    start: r.start,
                    nbyte: r.nbyte,
                });
            }

            // The output array is allocated host-side; the executor only
            // fills the pre-created partitions.
            let nbucket = 1usize << width;
            let out = factory.create("output", nbucket).await?;
            let output = Self::shared_dir(out.as_ref())?;

            let request = SortRequest {
                offset,
                width,
                arr_type: "file".to_string(),
                input,
                output,
            };

            tracing::debug!(
                endpoint = %self.endpoint,
                refs = request.input.len(),
                offset,
                width,
                "dispatching chunk to remote executor"
            );

            self.invoke(&request).await?;
            Ok(out)
        })
    }
}
