//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to              |
//! |------------|-----------------------|--------------------------|
//! | `hardware` | FanPort, ClockPort,   | Fan GPIO, DS1302,        |
//! |            | DelayPort, WatchdogPort | TWDT, FreeRTOS delay   |
//! | `nvs`      | ConfigPort            | NVS / in-memory store    |
//! |            | StoragePort           |                          |
//! | `sdcard`   | RecordSink            | CSV files on the card    |

pub mod hardware;
pub mod nvs;
pub mod sdcard;
