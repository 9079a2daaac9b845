//! Configuration Module - Sync Subsystem Parameters
//!
//! Manages the tunable parameters of the sync subsystem. The header bit
//! layout itself is fixed at compile time in [`crate::object::header`];
//! what is configurable here is the sizing of the entry table and the
//! verbosity of the event log.

use crate::object::header::MAX_PAYLOAD;

/// Configuration for a [`crate::SyncContext`]
///
/// # Examples
///
/// ```rust
/// use syncword::SyncConfig;
///
/// // Use default configuration
/// let config = SyncConfig::default();
///
/// // Small table for a test harness
/// let config = SyncConfig {
///     initial_capacity: 4,
///     max_entries: 64,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Initial capacity of the entry table
    ///
    /// The table's backing vector is pre-sized for this many entries; it
    /// grows on demand afterwards.
    /// Default: 64
    pub initial_capacity: usize,

    /// Maximum number of live entries
    ///
    /// Hard limit for entry allocation; `acquire_lock_object` fails with
    /// `TableExhausted` once reached. Cannot exceed the payload width limit
    /// (2^26 - 1), since an index must fit in the header word.
    /// Default: 2^26 - 1
    pub max_entries: usize,

    /// Enable verbose event logging
    ///
    /// Lowers the global event logger threshold to Trace so per-object
    /// hash assignments and installations are printed.
    /// Default: false
    pub verbose: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            initial_capacity: 64,
            max_entries: MAX_PAYLOAD as usize,
            verbose: false,
        }
    }
}

impl SyncConfig {
    /// Validate configuration
    ///
    /// Checks that all values are in valid ranges.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use syncword::SyncConfig;
    ///
    /// let config = SyncConfig {
    ///     max_entries: 0,  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_entries must be > 0".to_string(),
            ));
        }

        if self.max_entries > MAX_PAYLOAD as usize {
            return Err(ConfigError::InvalidLimit(format!(
                "max_entries must fit in the header payload field (max {})",
                MAX_PAYLOAD
            )));
        }

        if self.initial_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "initial_capacity must be > 0".to_string(),
            ));
        }

        if self.initial_capacity > self.max_entries {
            return Err(ConfigError::InvalidCapacity(
                "initial_capacity cannot exceed max_entries".to_string(),
            ));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - SYNCWORD_INITIAL_CAPACITY
    /// - SYNCWORD_MAX_ENTRIES
    /// - SYNCWORD_VERBOSE
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SYNCWORD_INITIAL_CAPACITY") {
            if let Ok(capacity) = val.parse::<usize>() {
                config.initial_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("SYNCWORD_MAX_ENTRIES") {
            if let Ok(limit) = val.parse::<usize>() {
                config.max_entries = limit;
            }
        }

        if let Ok(val) = std::env::var("SYNCWORD_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("Invalid entry limit: {0}")]
    InvalidLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_entries, MAX_PAYLOAD as usize);
        assert!(!config.verbose);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = SyncConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_limit_beyond_payload_width_rejected() {
        let config = SyncConfig {
            max_entries: MAX_PAYLOAD as usize + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_beyond_limit_rejected() {
        let config = SyncConfig {
            initial_capacity: 128,
            max_entries: 16,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
