//! Sync Event Logging
//!
//! Structured logging for the sync subsystem, useful for:
//! - Debugging hash/entry interleavings
//! - Production monitoring of sync table growth
//!
//! Log Levels:
//! - ERROR: contract violations
//! - INFO: table statistics
//! - DEBUG: entry allocations, hash migrations
//! - TRACE: per-object hash assignments and installations

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Log level for sync events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Info = 1,
    Debug = 2,
    Trace = 3,
}

/// Sync event types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A fresh identity hash won the header CAS
    HashAssigned { hash: u32 },

    /// A header hash was moved into the entry table during installation
    HashMigrated { index: u32, hash: u32 },

    /// A new entry was allocated in the sync table
    EntryAllocated { index: u32, in_use: usize },

    /// An entry index was published into a header word
    EntryInstalled { index: u32 },

    /// A lock object was lazily created for an entry
    LockCreated { index: u32 },

    /// Sync table statistics
    TableStats { in_use: usize, limit: usize },
}

/// Sync logger configuration
#[derive(Debug, Clone)]
pub struct SyncLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Enable console output
    pub console: bool,

    /// Enable JSON format
    pub json: bool,

    /// Enable timestamps
    pub timestamps: bool,
}

impl Default for SyncLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: true,
        }
    }
}

/// Centralized logger for sync operations
pub struct SyncLogger {
    config: SyncLoggerConfig,
    events: Mutex<Vec<(Instant, SyncEvent)>>,
    enabled: AtomicBool,
}

impl SyncLogger {
    /// Create new sync logger
    pub fn new(config: SyncLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log a sync event
    pub fn log(&self, event: SyncEvent) {
        if !self.is_enabled() {
            return;
        }

        if Self::event_level(&event) > self.config.level {
            return;
        }

        if let Ok(mut events) = self.events.lock() {
            events.push((Instant::now(), event.clone()));
        }

        if self.config.console {
            self.output_console(&event);
        }
    }

    /// Get log level for event
    fn event_level(event: &SyncEvent) -> LogLevel {
        match event {
            SyncEvent::TableStats { .. } => LogLevel::Info,
            SyncEvent::EntryAllocated { .. } | SyncEvent::HashMigrated { .. } => LogLevel::Debug,
            SyncEvent::HashAssigned { .. }
            | SyncEvent::EntryInstalled { .. }
            | SyncEvent::LockCreated { .. } => LogLevel::Trace,
        }
    }

    /// Output to console
    fn output_console(&self, event: &SyncEvent) {
        if self.config.timestamps {
            let now = chrono::Local::now();
            print!("[{}] ", now.format("%Y-%m-%d %H:%M:%S%.3f"));
        }

        if self.config.json {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        } else {
            self.output_human(event);
        }
    }

    /// Output in human-readable format
    fn output_human(&self, event: &SyncEvent) {
        match event {
            SyncEvent::HashAssigned { hash } => {
                println!("[sync] Hash {:#x} assigned in header", hash);
            },
            SyncEvent::HashMigrated { index, hash } => {
                println!("[sync] Hash {:#x} migrated into entry {}", hash, index);
            },
            SyncEvent::EntryAllocated { index, in_use } => {
                println!("[sync] Entry {} allocated ({} in use)", index, in_use);
            },
            SyncEvent::EntryInstalled { index } => {
                println!("[sync] Entry {} installed in header", index);
            },
            SyncEvent::LockCreated { index } => {
                println!("[sync] Lock object created for entry {}", index);
            },
            SyncEvent::TableStats { in_use, limit } => {
                println!("[sync] Table: {}/{} entries in use", in_use, limit);
            },
        }
    }

    /// Get all recorded events
    pub fn get_events(&self) -> Vec<(Instant, SyncEvent)> {
        if let Ok(events) = self.events.lock() {
            events.clone()
        } else {
            Vec::new()
        }
    }

    /// Clear all recorded events
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Get recorded event count
    pub fn event_count(&self) -> usize {
        if let Ok(events) = self.events.lock() {
            events.len()
        } else {
            0
        }
    }
}

impl Default for SyncLogger {
    fn default() -> Self {
        Self::new(SyncLoggerConfig::default())
    }
}

/// Global sync logger
lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<SyncLogger> = Mutex::new(SyncLogger::default());
}

/// Log a sync event to the global logger
pub fn log_event(event: SyncEvent) {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.log(event);
    }
}

/// Configure the global logger
pub fn configure_logger(config: SyncLoggerConfig) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        *logger = SyncLogger::new(config);
    }
}

/// Get global logger event count
pub fn get_event_count() -> usize {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.event_count()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_records_events() {
        let logger = SyncLogger::new(SyncLoggerConfig {
            level: LogLevel::Trace,
            console: false,
            ..Default::default()
        });

        logger.log(SyncEvent::HashAssigned { hash: 0x42 });
        logger.log(SyncEvent::EntryAllocated { index: 1, in_use: 1 });

        assert_eq!(logger.event_count(), 2);
    }

    #[test]
    fn test_logger_level_filter() {
        let logger = SyncLogger::new(SyncLoggerConfig {
            level: LogLevel::Info,
            console: false,
            ..Default::default()
        });

        // Trace event below the Info threshold is dropped
        logger.log(SyncEvent::HashAssigned { hash: 0x42 });
        assert_eq!(logger.event_count(), 0);

        logger.log(SyncEvent::TableStats { in_use: 1, limit: 8 });
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_logger_disable() {
        let logger = SyncLogger::new(SyncLoggerConfig {
            level: LogLevel::Trace,
            console: false,
            ..Default::default()
        });

        logger.disable();
        logger.log(SyncEvent::EntryInstalled { index: 3 });
        assert_eq!(logger.event_count(), 0);

        logger.enable();
        logger.log(SyncEvent::EntryInstalled { index: 3 });
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(SyncEvent::HashMigrated { index: 2, hash: 9 }).unwrap();
        assert_eq!(json["type"], "hash_migrated");
        assert_eq!(json["index"], 2);
        assert_eq!(json["hash"], 9);
    }
}
