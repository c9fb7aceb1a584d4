//! USB HID keyboard → Bluefruit LE UART bridge.
//!
//! Keyboard reports either go straight to a USB HID endpoint or are
//! turned into `AT+BLEKEYBOARDCODE` commands and trickled out over a
//! hardware-flow-controlled UART, one byte per main-loop tick.
//!
//! Everything here is hardware-agnostic and tested on the host:
//! `cargo test --lib`. The embedded binary (`src/main.rs`, feature
//! `embedded`) wires nRF52840 peripherals into these types.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod at;
pub mod bridge;
pub mod config;
pub mod error;
pub mod hid;
pub mod uart;

pub use bridge::{HidEndpoint, ReportBridge, ReportPath};
pub use error::{Error, Result};
pub use hid::KeyboardReport;
pub use uart::{PumpStatus, UartLink};
