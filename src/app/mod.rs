//! Application core — pure acquisition logic, zero I/O.
//!
//! This module contains the business rules for the logger: slot-driven
//! acquisition, median aggregation, record emission, and sleep planning.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod ports;
pub mod service;
