//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Key of the persisted cart slot (default: `@GoMarketplace:cart`)
//! - `CART_STORAGE_DIR` - Directory used by the file-backed store (default: `.gomarketplace`)
//! - `CART_PERSIST_MAX_RETRIES` - Retries after a failed write-through (default: 3)
//! - `CART_PERSIST_RETRY_BASE_MS` - First retry delay, doubled per attempt (default: 100)
//! - `CART_DECREMENT_POLICY` - `keep`, `clamp` or `remove` (default: `keep`)

use std::path::PathBuf;
use std::time::Duration;

use gomarketplace_core::DecrementPolicy;
use thiserror::Error;

/// Default key of the persisted cart slot.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:cart";

const DEFAULT_STORAGE_DIR: &str = ".gomarketplace";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key under which the cart blob is stored
    pub storage_key: String,
    /// Root directory for [`FileStore`](crate::storage::FileStore)
    pub storage_dir: PathBuf,
    /// Write-through retry behaviour
    pub retry: RetryPolicy,
    /// What decrementing to zero does
    pub decrement_policy: DecrementPolicy,
}

/// Retry schedule for failed write-throughs.
///
/// Attempt `n` (starting at 0) waits `base_delay * 2^n` before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            retry: RetryPolicy::default(),
            decrement_policy: DecrementPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_retries = get_or("CART_PERSIST_MAX_RETRIES", &DEFAULT_MAX_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|e| invalid("CART_PERSIST_MAX_RETRIES", &e))?;
        let base_ms = get_or("CART_PERSIST_RETRY_BASE_MS", &DEFAULT_RETRY_BASE_MS.to_string())
            .parse::<u64>()
            .map_err(|e| invalid("CART_PERSIST_RETRY_BASE_MS", &e))?;
        let decrement_policy = get_or("CART_DECREMENT_POLICY", "keep")
            .parse::<DecrementPolicy>()
            .map_err(|e| invalid("CART_DECREMENT_POLICY", &e))?;

        Ok(Self {
            storage_key: get_or("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            storage_dir: PathBuf::from(get_or("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            retry: RetryPolicy {
                max_retries,
                base_delay: Duration::from_millis(base_ms),
            },
            decrement_policy,
        })
    }
}

fn invalid(key: &str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}
