//! Sort configuration.

use crate::error::{Result, StrataError};

/// Configuration for a distributed sort.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Bits sorted per pass. Must divide 32 evenly; at most 16 (the
    /// partition count per array is `2^width`).
    pub width: u32,
    /// Number of concurrent workers per pass.
    pub nworkers: usize,
    /// Destroy each pass's input arrays once the pass completes. The
    /// caller's original input is never destroyed.
    pub remove_intermediate: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            width: 4,
            nworkers: 2,
            remove_intermediate: false,
        }
    }
}

impl SortConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `STRATA_WIDTH`: bits per pass
    /// - `STRATA_WORKERS`: workers per pass
    /// - `STRATA_REMOVE_INTERMEDIATE`: destroy pass inputs when done
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let width = std::env::var("STRATA_WIDTH")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.width);

        let nworkers = std::env::var("STRATA_WORKERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.nworkers);

        let remove_intermediate = std::env::var("STRATA_REMOVE_INTERMEDIATE")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(defaults.remove_intermediate);

        Self {
            width,
            nworkers,
            remove_intermediate,
        }
    }

    /// Set the digit width.
    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, nworkers: usize) -> Self {
        self.nworkers = nworkers;
        self
    }

    /// Enable or disable destruction of intermediate arrays.
    #[must_use]
    pub fn with_remove_intermediate(mut self, remove: bool) -> Self {
        self.remove_intermediate = remove;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || 32 % self.width != 0 || self.width > 16 {
            return Err(StrataError::ConfigValue {
                field: "width".to_string(),
                cause: format!("{} must divide 32 evenly and be at most 16", self.width),
            });
        }
        if self.nworkers == 0 {
            return Err(StrataError::ConfigValue {
                field: "nworkers".to_string(),
                cause: "at least one worker is required".to_string(),
            });
        }
        Ok(())
    }

    /// Number of passes needed to cover all 32 bits.
    #[must_use]
    pub fn npasses(&self) -> usize {
        (32 / self.width) as usize
    }

    /// Number of radix buckets per pass (`2^width`).
    #[must_use]
    pub fn nbucket(&self) -> usize {
        1 << self.width
    }
}
