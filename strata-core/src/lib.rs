//! Strata Core Library
//!
//! This crate provides the storage abstraction and data model for the
//! strata distributed radix sort.
//!
//! # Overview
//!
//! The sort treats its data as *distributed arrays*: ordered collections
//! of append-only byte partitions, where each partition holds one radix
//! bucket's little-endian `u32` values. This crate defines:
//!
//! - **Storage**: the `DistribArray` / `ArrayFactory` capability traits
//!   plus in-memory and file-backed implementations
//! - **Refs**: `PartRef` byte-range references and `fetch_refs` gathering
//! - **Codec**: the little-endian `u32` wire format
//! - **Config**: pass width and worker count with env overrides
//!
//! The pass scheduling, workers, and verification live in
//! `strata-executor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod prelude;
pub mod refs;
pub mod storage;

pub use config::SortConfig;
pub use error::{Result, StrataError};
pub use refs::{fetch_refs, PartRef};
pub use storage::{ArrayFactory, ArrayShape, DistribArray, StorageFuture};
