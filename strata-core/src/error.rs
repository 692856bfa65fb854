//! Error types for strata.
//!
//! Every variant carries the identifiers needed to locate a failure
//! (array name, partition index, pass, worker) so that an error surfaced
//! from deep inside a pass can be traced without a debugger. Causes are
//! carried as strings; nothing is swallowed on the way up.

use thiserror::Error;

/// The main error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    // =========================================================================
    // Storage Errors (E001-E099)
    // =========================================================================
    /// Failed to create an array or its partitions.
    #[error("E001: Failed to create array '{name}': {cause}")]
    ArrayCreate {
        /// The array that could not be created.
        name: String,
        /// Reason for the failure.
        cause: String,
    },

    /// Reading from a partition failed.
    #[error("E002: Read failed on {array}[{part}]: {cause}")]
    PartRead {
        /// The array being read.
        array: String,
        /// The partition being read.
        part: usize,
        /// Reason for the read failure.
        cause: String,
    },

    /// Writing to a partition failed.
    #[error("E003: Write failed on {array}[{part}]: {cause}")]
    PartWrite {
        /// The array being written.
        array: String,
        /// The partition being written.
        part: usize,
        /// Reason for the write failure.
        cause: String,
    },

    /// Ranged read outside partition bounds.
    #[error("E004: Range [{start}, {end}) out of bounds for {array}[{part}] of length {len}")]
    RangeOutOfBounds {
        /// The array being read.
        array: String,
        /// The partition being read.
        part: usize,
        /// Requested range start.
        start: u64,
        /// Requested range end (already resolved, never the 0 sentinel).
        end: u64,
        /// Actual partition length.
        len: u64,
    },

    /// A second writer was requested for a write-once partition.
    #[error("E005: Partition {array}[{part}] is sealed")]
    PartSealed {
        /// The array holding the sealed partition.
        array: String,
        /// The sealed partition.
        part: usize,
    },

    /// A reader delivered fewer bytes than its ref promised.
    #[error("E006: Short read on {array}[{part}]: expected {expected} bytes, got {got}")]
    ShortRead {
        /// The array being read.
        array: String,
        /// The partition being read.
        part: usize,
        /// Bytes the ref promised.
        expected: u64,
        /// Bytes actually delivered.
        got: u64,
    },

    /// Sibling arrays of a pass disagree on partition count.
    #[error("E007: Shape mismatch: expected {expected} partitions, got {got}")]
    ShapeMismatch {
        /// Partition count of the first array.
        expected: usize,
        /// Partition count of the disagreeing array.
        got: usize,
    },

    /// Failed to release an array's backing storage.
    #[error("E008: Failed to destroy array '{name}': {cause}")]
    ArrayDestroy {
        /// The array that could not be destroyed.
        name: String,
        /// Reason for the failure.
        cause: String,
    },

    /// Partition contents are not 32-bit aligned.
    #[error("E009: Buffer of {nbyte} bytes is not a whole number of 32-bit integers")]
    Unaligned {
        /// The misaligned byte count.
        nbyte: u64,
    },

    // =========================================================================
    // Iterator Errors (E100-E199)
    // =========================================================================
    /// The pass iterator ran out of data before the last worker.
    #[error("E101: Premature end of input on pass {pass}, worker {worker}")]
    PrematureEnd {
        /// The pass whose input ran short.
        pass: usize,
        /// The worker that received the short batch.
        worker: usize,
    },

    // =========================================================================
    // Worker Errors (E200-E299)
    // =========================================================================
    /// A worker failed; wraps the underlying cause.
    #[error("E201: Worker failure on pass {pass}, worker {worker}: {cause}")]
    WorkerFailure {
        /// The pass in which the worker ran.
        pass: usize,
        /// The failing worker's id.
        worker: usize,
        /// The wrapped cause.
        cause: String,
    },

    // =========================================================================
    // Remote Errors (E300-E399)
    // =========================================================================
    /// The remote executor could not be reached or answered garbage.
    #[error("E301: Remote transport failed: {cause}")]
    RemoteTransport {
        /// Reason for the transport failure.
        cause: String,
    },

    /// The remote executor answered, but reported failure.
    #[error("E302: Remote executor rejected the request: {cause}")]
    RemoteRejected {
        /// The executor's reported error.
        cause: String,
    },

    /// An array without a shared storage path was handed to the remote worker.
    #[error("E303: Array '{array}' is not file-backed; remote workers need a shared storage path")]
    RemoteUnsupported {
        /// The offending array.
        array: String,
    },

    // =========================================================================
    // Configuration Errors (E400-E499)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E401: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with the invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },

    // =========================================================================
    // Verification Errors (E500-E599)
    // =========================================================================
    /// An oracle check on sort output failed.
    #[error("E501: Verification failed: {cause}")]
    Verification {
        /// Description of the mismatch.
        cause: String,
    },
}

impl StrataError {
    /// Get the error code (e.g., "E004").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArrayCreate { .. } => "E001",
            Self::PartRead { .. } => "E002",
            Self::PartWrite { .. } => "E003",
            Self::RangeOutOfBounds { .. } => "E004",
            Self::PartSealed { .. } => "E005",
            Self::ShortRead { .. } => "E006",
            Self::ShapeMismatch { .. } => "E007",
            Self::ArrayDestroy { .. } => "E008",
            Self::Unaligned { .. } => "E009",
            Self::PrematureEnd { .. } => "E101",
            Self::WorkerFailure { .. } => "E201",
            Self::RemoteTransport { .. } => "E301",
            Self::RemoteRejected { .. } => "E302",
            Self::RemoteUnsupported { .. } => "E303",
            Self::ConfigValue { .. } => "E401",
            Self::Verification { .. } => "E501",
        }
    }

    /// Check if this error originated in a storage backend.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::ArrayCreate { .. }
                | Self::PartRead { .. }
                | Self::PartWrite { .. }
                | Self::RangeOutOfBounds { .. }
                | Self::PartSealed { .. }
                | Self::ShortRead { .. }
                | Self::ShapeMismatch { .. }
                | Self::ArrayDestroy { .. }
        )
    }
}

/// Result type alias using `StrataError`.
pub type Result<T> = std::result::Result<T, StrataError>;
