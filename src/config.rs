//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use core::ops::Range;

use crate::bridge::ReportPath;
use crate::hid::keyboard::KEYBOARD_REPORT_SIZE;
use crate::uart::flow::{FlowConfig, PeerGate, Polarity};

// Serial link to the Bluefruit module

/// Frame format of the serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    pub baud: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: bool,
    /// Double-rate sampling (halves the baud divisor on AVR-class UARTs).
    pub double_speed: bool,
}

/// 115200 8N2, double speed.
pub const SERIAL: SerialConfig = SerialConfig {
    baud: 115_200,
    data_bits: 8,
    stop_bits: 2,
    parity: false,
    double_speed: true,
};

/// Transmit queue capacity (bytes pending between producer and pump).
#[cfg(not(feature = "large-buffer"))]
pub const TX_QUEUE_CAPACITY: usize = 256;
#[cfg(feature = "large-buffer")]
pub const TX_QUEUE_CAPACITY: usize = 1024;

/// Hardware handshake defaults: both lines active-low, peer busy is a hard gate.
pub const FLOW: FlowConfig = FlowConfig {
    output: Polarity::ActiveLow,
    input: Polarity::ActiveLow,
    gate: PeerGate::Enforce,
};

// AT command dialect

/// Every command ends with a single carriage return.
pub const AT_TERMINATOR: u8 = 0x0D;

/// Prefix of the per-report keyboard command.
pub const AT_KEYBOARD_CODE: &str = "AT+BLEKEYBOARDCODE=";

/// Longest command the encoder will build.
pub const MAX_COMMAND_LEN: usize = 96;

/// One-time bring-up commands, sent in order.
pub const BRING_UP_COMMANDS: [&str; 4] = [
    "AT+BLEHIDEN=1",
    "AT+GATTCLEAR",
    "AT+GATTADDSERVICE=UUID128=00-19-45-25-A8-50-24-54-21-76-35-45-15-48-65-25",
    "AT+GATTADDCHAR=UUID=0x0001,PROPERTIES=0x08,DESCRIPTION=PAYLOAD,DATATYPE=2",
];

/// Wait before the first bring-up command so the module finishes booting (ms).
pub const BRING_UP_BOOT_DELAY_MS: u32 = 1000;

/// Settle time after each bring-up command (ms).
pub const BRING_UP_SETTLE_MS: u32 = 100;

/// Pump iterations allowed to put one bring-up command on the wire.
pub const BRING_UP_MAX_POLLS: u32 = 100_000;

/// Pause between flush iterations while the link is stalled (µs).
pub const FLUSH_RETRY_US: u32 = 10;

// Report routing

/// Report bytes carried per keyboard report (modifier, reserved, 6 keys).
pub const REPORT_KEY_RANGE: Range<usize> = 0..KEYBOARD_REPORT_SIZE;

/// Transmission path chosen at build time.
#[cfg(feature = "bluetooth")]
pub const DEFAULT_REPORT_PATH: ReportPath = ReportPath::Radio;
#[cfg(not(feature = "bluetooth"))]
pub const DEFAULT_REPORT_PATH: ReportPath = ReportPath::Wired;

/// USB frames (1 ms each at full speed) to wait for the endpoint.
pub const USB_SEND_TIMEOUT_FRAMES: u8 = 50;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "usb2ble";
pub const USB_PRODUCT: &str = "USB/BLE Keyboard Bridge";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// GPIO pin assignments (nRF52840-DK defaults)
//
//   UARTE TX  → P0.06   (to Bluefruit RXI)
//   UARTE RX  → P0.08   (from Bluefruit TXO)
//   CTS out   → P0.05   (to Bluefruit CTS)
//   RTS in    → P0.07   (from Bluefruit RTS)
//   Keys A-D  → P0.11, P0.12, P0.24, P0.25

/// Key switch debounce time (ms).
pub const KEY_DEBOUNCE_MS: u64 = 20;
