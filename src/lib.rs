//! Autonomous CO₂/climate logger firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod aggregate;
pub mod app;
pub mod arbiter;
pub mod clock;
pub mod config;
pub mod power;
pub mod record;
pub mod scheduler;

pub mod error;
pub mod pins;

// The hardware-facing modules compile on the host too; the actual
// peripheral implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
