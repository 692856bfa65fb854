//! Prelude for convenient imports.
//!
//! ```ignore
//! use strata_core::prelude::*;
//! ```

pub use crate::codec;
pub use crate::config::SortConfig;
pub use crate::error::{Result, StrataError};
pub use crate::refs::{fetch_refs, PartRef};
pub use crate::storage::{
    ArrayFactory, ArrayShape, DistribArray, FileArrayFactory, FileDistribArray, MemArrayFactory,
    MemDistribArray, PartWriter, RangeReader, StorageFuture,
};
