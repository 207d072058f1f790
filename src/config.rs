//! Configuration Module
//!
//! Memoization options, their resolution into cache settings, and the
//! process-wide defaults every memo is built against.

use std::env;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};
use crate::error::{MemoError, Result};

// == Memo Options ==
/// User-facing memoization options.
///
/// Fields are raw hints: out-of-range values are accepted here and corrected
/// when the options are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoOptions {
    /// Maximum resident entries (must be at least 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Entry time-to-live in milliseconds, 0 = unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl MemoOptions {
    /// Options with every field unset.
    pub const fn new() -> Self {
        Self {
            size: None,
            duration: None,
        }
    }

    /// The built-in defaults: 20 entries, no expiration.
    pub const fn builtin() -> Self {
        Self {
            size: Some(DEFAULT_CAPACITY as i64),
            duration: Some(DEFAULT_TTL_MS as i64),
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    /// Loads options from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_SIZE` - Maximum entries per scope
    /// - `MEMO_DURATION` - Entry TTL in milliseconds
    ///
    /// Unset or unparsable variables leave the field unset.
    pub fn from_env() -> Self {
        Self {
            size: env::var("MEMO_SIZE").ok().and_then(|v| v.trim().parse().ok()),
            duration: env::var("MEMO_DURATION")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    // == Merge ==
    /// Overlays these options on `base`; fields set here take precedence.
    pub fn merge(&self, base: &MemoOptions) -> MemoOptions {
        MemoOptions {
            size: self.size.or(base.size),
            duration: self.duration.or(base.duration),
        }
    }

    // == Validate ==
    /// Checks the set fields against their allowed ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.size {
            if size < 1 {
                return Err(MemoError::InvalidOption {
                    name: "size",
                    value: size,
                });
            }
        }
        if let Some(duration) = self.duration {
            if duration < 0 {
                return Err(MemoError::InvalidOption {
                    name: "duration",
                    value: duration,
                });
            }
        }
        Ok(())
    }

    // == Resolve ==
    /// Turns the options into concrete cache settings.
    ///
    /// Unset fields take the built-in defaults. A `size` below 1 falls back
    /// to the default capacity and a negative `duration` to 0; each
    /// correction is logged.
    pub fn resolve(&self) -> CacheConfig {
        let capacity = match self.size {
            None => DEFAULT_CAPACITY,
            Some(size) if size < 1 => {
                warn!(size, "Invalid memo size, using default of {}", DEFAULT_CAPACITY);
                DEFAULT_CAPACITY
            }
            Some(size) => usize::try_from(size).unwrap_or(usize::MAX),
        };

        let ttl_ms = match self.duration {
            None => DEFAULT_TTL_MS,
            Some(duration) if duration < 0 => {
                warn!(duration, "Negative memo duration, entries will not expire");
                0
            }
            Some(duration) => duration as u64,
        };

        CacheConfig { capacity, ttl_ms }
    }
}

// == Cache Config ==
/// Resolved, always-valid settings for one cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    /// Maximum number of entries, at least 1
    pub capacity: usize,
    /// Maximum entry age in milliseconds, 0 = never expires
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        MemoOptions::builtin().resolve()
    }
}

// == Global Defaults ==
static GLOBAL_OPTIONS: LazyLock<RwLock<MemoOptions>> =
    LazyLock::new(|| RwLock::new(MemoOptions::builtin()));

/// Returns the current process-wide default options.
pub fn global_options() -> MemoOptions {
    *GLOBAL_OPTIONS.read()
}

/// Replaces the process-wide default options.
///
/// Fields left unset fall back to the built-in defaults. Only memos built
/// after this call see the new values.
pub fn set_global_options(options: MemoOptions) {
    let merged = options.merge(&MemoOptions::builtin());
    if let Err(e) = merged.validate() {
        warn!("Global memo options will be corrected on use: {}", e);
    }
    *GLOBAL_OPTIONS.write() = merged;
}

/// Restores the built-in process-wide defaults.
pub fn reset_global_options() {
    *GLOBAL_OPTIONS.write() = MemoOptions::builtin();
}

/// Resolves per-memo options against the current global defaults.
///
/// Called once when a memo is built, never per call.
pub fn resolve_with_globals(options: &MemoOptions) -> CacheConfig {
    options.merge(&global_options()).resolve()
}
