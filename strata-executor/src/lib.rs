//! Strata Executor Library
//!
//! Pass scheduling, sort workers, and verification for the strata
//! distributed radix sort.
//!
//! # Overview
//!
//! [`sort_distrib`] runs `32 / width` passes over a distributed array of
//! little-endian `u32` values. Each pass re-slices the previous pass's
//! bucketed output through a strided [`BucketIterator`] and fans the
//! chunks out to concurrent [`SortWorker`]s, which partition by one radix
//! digit into `2^width` bucket partitions. After the final pass, a
//! strided read over the output arrays ([`controller::read_sorted`])
//! yields the fully sorted values.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::prelude::*;
//! use strata_executor::{sort_distrib, LocalWorker};
//! use std::sync::Arc;
//!
//! let input: Arc<dyn DistribArray> =
//!     Arc::new(MemDistribArray::with_data("input", vec![bytes]));
//! let outputs = sort_distrib(
//!     input,
//!     nints,
//!     &SortConfig::default(),
//!     Arc::new(MemArrayFactory),
//!     Arc::new(LocalWorker),
//! )
//! .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod iter;
pub mod kernel;
pub mod remote;
pub mod verify;
pub mod worker;

pub use controller::{read_sorted, sort_distrib};
pub use iter::{BucketIterator, ReadOrder, RefBatch};
pub use kernel::{digit, partition_by_digit};
pub use remote::{RemoteWorker, SortRequest, SortResponse, WireRef};
pub use worker::{LocalWorker, SortWorker, WorkerFuture};
