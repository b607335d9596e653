//! Port traits — the hexagonal boundary between acquisition logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AcquisitionService (domain)
//! ```
//!
//! Driven adapters (fan, RTC, SD card, NVS) implement these traits.  The
//! [`AcquisitionService`](super::service::AcquisitionService) consumes them
//! via generics, so the domain core never touches hardware directly.
//!
//! ConfigPort implementations MUST validate before persisting; invalid
//! ranges are rejected, not silently clamped.

use crate::clock::CalendarTime;
use crate::config::LoggerConfig;
use crate::error::ClockError;
use crate::record::MeasurementRecord;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  Implementations return a fully validated
/// calendar time or a typed error; the domain never sees raw registers.
pub trait ClockPort {
    fn now(&mut self) -> Result<CalendarTime, ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator and timing ports (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Chamber purge fan.
pub trait FanPort {
    fn set(&mut self, on: bool);
}

/// Blocking millisecond delay.  Mocked in tests to make acquisition
/// cycles instantaneous while still recording total elapsed time.
pub trait DelayPort {
    fn delay_ms(&mut self, ms: u32);
}

/// Task watchdog.  Fed between samples so a wedged sensor bus resets
/// the device instead of hanging the slot forever.
pub trait WatchdogPort {
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Record sink port (domain → persistent CSV log)
// ───────────────────────────────────────────────────────────────

/// Append-only destination for finished measurement records.
///
/// A failed append must not abort the acquisition cycle; the service
/// logs the error and carries on, so one bad card write never costs
/// more than one row.
pub trait RecordSink {
    fn append(&mut self, record: &MeasurementRecord) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists logger configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`LoggerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<LoggerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &LoggerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for config blobs and boot markers.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] and [`RecordSink`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition or card is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
