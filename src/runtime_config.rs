//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the binder's resource limits.
//!
//! ## Environment Variables
//!
//! ### `PARAMBIND_MAX_MEMORY_MB`
//!
//! Default cap, in MiB, on the form payload a record may parse when none of
//! its fields declares `<maxmb:N>`. Accepts decimal (`32`) or hexadecimal
//! (`0x20`).
//!
//! Default: `32`
//!
//! ### `PARAMBIND_MAX_ARRAY_INDEX`
//!
//! Largest explicit `key[n]` index honoured when building arrays. A client
//! sending `list[999999999]=x` would otherwise force a huge allocation.
//! Ad-hoc binding skips larger indices; schema binding rejects them.
//!
//! Default: `1024`
//!
//! ## Usage
//!
//! ```rust
//! use parambind::runtime_config::BindConfig;
//!
//! let config = BindConfig::from_env();
//! println!("Default form limit: {} bytes", config.default_max_memory);
//! ```
//!
//! ```bash
//! export PARAMBIND_MAX_MEMORY_MB=0x40
//! export PARAMBIND_MAX_ARRAY_INDEX=256
//! ```
//!
//! Invalid values fall back to the defaults.

use crate::tags::MB;
use std::env;

/// Default form memory cap in MiB
pub const DEFAULT_MAX_MEMORY_MB: u64 = 32;

/// Default largest explicit array index
pub const DEFAULT_MAX_ARRAY_INDEX: usize = 1024;

/// Binder limits loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindConfig {
    /// Form payload cap in bytes for records without `maxmb` (default: 32 MiB)
    pub default_max_memory: u64,
    /// Largest explicit `key[n]` index (default: 1024)
    pub max_array_index: usize,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            default_max_memory: DEFAULT_MAX_MEMORY_MB * MB,
            max_array_index: DEFAULT_MAX_ARRAY_INDEX,
        }
    }
}

impl BindConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_mb = lookup("PARAMBIND_MAX_MEMORY_MB")
            .and_then(|v| parse_number(&v))
            .filter(|mb| *mb > 0)
            .unwrap_or(DEFAULT_MAX_MEMORY_MB);
        let max_array_index = lookup("PARAMBIND_MAX_ARRAY_INDEX")
            .and_then(|v| parse_number(&v))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_ARRAY_INDEX);
        BindConfig {
            default_max_memory: max_mb.saturating_mul(MB),
            max_array_index,
        }
    }
}

/// Decimal or `0x` hexadecimal.
fn parse_number(val: &str) -> Option<u64> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
