//! Oracle checks for sort output.
//!
//! Used by tests and benchmarking harnesses to validate full sortedness
//! against a reference sort and per-pass partial correctness.

use crate::iter::{BucketIterator, ReadOrder};
use crate::kernel;
use strata_core::codec;
use strata_core::error::{Result, StrataError};
use strata_core::storage::DistribArray;
use std::sync::Arc;

/// Check that `result` is the sorted permutation of `orig`.
///
/// Both buffers are decoded as little-endian `u32`; a reference sort of
/// `orig` must match `result` element for element.
pub fn check_sorted(orig: &[u8], result: &[u8]) -> Result<()> {
    if orig.len() != result.len() {
        return Err(StrataError::Verification {
            cause: format!(
                "length mismatch: expected {} bytes, got {}",
                orig.len(),
                result.len()
            ),
        });
    }

    let mut expected = codec::decode(orig)?;
    let actual = codec::decode(result)?;
    expected.sort_unstable();

    for (i, (want, got)) in expected.iter().zip(actual.iter()).enumerate() {
        if want != got {
            return Err(StrataError::Verification {
                cause: format!(
                    "mismatch at {}: expected {:#010x}, got {:#010x}",
                    i, want, got
                ),
            });
        }
    }
    Ok(())
}

/// Check one pass's output array: every element's digit at `offset` must
/// equal the index of the partition holding it.
pub async fn check_partial_array(
    arr: &Arc<dyn DistribArray>,
    offset: u32,
    width: u32,
) -> Result<()> {
    let mut iter = BucketIterator::new(std::slice::from_ref(arr), ReadOrder::InOrder).await?;
    let ints = codec::decode(&iter.read_all().await?)?;

    let shape = arr.shape().await?;

    // Cumulative bucket boundaries, in elements.
    let mut boundaries = vec![0u64; shape.npart() + 1];
    for part in 0..shape.npart() {
        let len = shape.len(part);
        if len % 4 != 0 {
            return Err(StrataError::Unaligned { nbyte: len });
        }
        boundaries[part + 1] = boundaries[part] + len / 4;
    }

    let mut bucket = 0usize;
    for (i, &v) in ints.iter().enumerate() {
        while i as u64 == boundaries[bucket + 1] {
            bucket += 1;
        }
        let got = kernel::digit(v, offset, width);
        if got != bucket {
            return Err(StrataError::Verification {
                cause: format!(
                    "element {} ({:#010x}) of '{}' in bucket {}, digit says {}",
                    i,
                    v,
                    arr.name(),
                    bucket,
                    got
                ),
            });
        }
    }
    Ok(())
}
