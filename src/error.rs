//! Unified error type for usb2ble.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Queue overflow is deliberately absent: dropped bytes are counted,
//! not reported.

use core::fmt;

/// Top-level error type used across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // USB
    /// The host has not configured the device (or went away mid-send).
    UsbNotConfigured,

    /// The endpoint did not become writable within the frame budget,
    /// or the serial link never drained.
    Timeout,

    // UART
    /// The serial peripheral reported a transmit/receive fault.
    Serial,

    /// A flow-control line could not be driven or sampled.
    Gpio,

    // Encoding
    /// Command text does not fit the encoder buffer.
    CommandTooLong,

    /// Key range reaches past the end of the report.
    InvalidKeyRange,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsbNotConfigured => write!(f, "USB device not configured"),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::Serial => write!(f, "Serial link error"),
            Self::Gpio => write!(f, "Flow-control line error"),
            Self::CommandTooLong => write!(f, "Command too long"),
            Self::InvalidKeyRange => write!(f, "Key range outside report"),
        }
    }
}

/// Result type for bridge operations.
pub type Result<T> = core::result::Result<T, Error>;
