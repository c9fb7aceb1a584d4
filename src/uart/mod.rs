//! Serial link to the Bluefruit LE UART module.
//!
//! ## Components
//!
//! - **queue**: fixed-capacity FIFO of pending output bytes
//! - **flow**: CTS/RTS-style handshake lines
//! - **pump**: one-byte-per-tick drain step
//! - **link**: queue + pump, AT command submission and module bring-up
//!
//! The serial port is anything implementing `embedded_io::{Write,
//! WriteReady}`; the handshake lines are `embedded_hal` digital pins.

pub mod flow;
pub mod link;
pub mod pump;
pub mod queue;

#[cfg(test)]
pub(crate) mod mock;

pub use flow::{FlowConfig, FlowController, PeerGate, Polarity};
pub use link::UartLink;
pub use pump::{Pump, PumpStatus};
pub use queue::TransmitQueue;
