//! Report routing: the wired USB endpoint or the Bluefruit UART.
//!
//! The path is fixed when the bridge is built (see
//! [`config::DEFAULT_REPORT_PATH`](crate::config::DEFAULT_REPORT_PATH)).
//! The wired path writes straight to the endpoint and reports success
//! or failure; the radio path only queues, so it succeeds whenever the
//! report could be encoded.

use core::ops::Range;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Write, WriteReady};

use crate::config::USB_SEND_TIMEOUT_FRAMES;
use crate::error::{Error, Result};
use crate::hid::KeyboardReport;
use crate::uart::link::UartLink;
use crate::uart::pump::PumpStatus;

/// Where keyboard reports go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportPath {
    /// USB HID interrupt endpoint.
    Wired,
    /// AT commands over the Bluefruit UART.
    Radio,
}

/// The slice of a USB device stack the wired path needs.
pub trait HidEndpoint {
    /// The host has selected a configuration.
    fn is_configured(&self) -> bool;

    /// Low byte of the USB frame counter (advances once per 1 ms SOF).
    fn frame_number(&self) -> u8;

    /// The endpoint bank can take another report.
    fn is_write_ready(&mut self) -> bool;

    /// Hand a report to the endpoint. Only called after
    /// [`is_write_ready`](Self::is_write_ready) returned `true`.
    fn write_report(&mut self, data: &[u8]);
}

/// Sends completed keyboard reports down the selected path.
pub struct ReportBridge<E, S, O, I, const N: usize> {
    path: ReportPath,
    usb: E,
    radio: UartLink<S, O, I, N>,
    keys: Range<usize>,
}

impl<E, S, O, I, const N: usize> ReportBridge<E, S, O, I, N>
where
    E: HidEndpoint,
    S: Write + WriteReady,
    O: OutputPin,
    I: InputPin,
{
    /// `keys` selects which report bytes are carried on either path.
    pub fn new(path: ReportPath, usb: E, radio: UartLink<S, O, I, N>, keys: Range<usize>) -> Self {
        Self {
            path,
            usb,
            radio,
            keys,
        }
    }

    pub fn path(&self) -> ReportPath {
        self.path
    }

    /// Route one report.
    pub fn send_report(&mut self, report: &KeyboardReport) -> Result<()> {
        let raw = report.as_bytes();
        let bytes = raw.get(self.keys.clone()).ok_or(Error::InvalidKeyRange)?;
        match self.path {
            ReportPath::Wired => send_wired(&mut self.usb, bytes),
            ReportPath::Radio => {
                self.radio.ensure_configured()?;
                self.radio.send_report(&raw, self.keys.clone())?;
                Ok(())
            }
        }
    }

    /// Drain step for the radio link; cheap no-op when nothing is queued.
    pub fn poll(&mut self) -> Result<PumpStatus> {
        self.radio.poll()
    }

    pub fn radio(&self) -> &UartLink<S, O, I, N> {
        &self.radio
    }

    pub fn usb(&self) -> &E {
        &self.usb
    }
}

/// Busy-wait for the endpoint (bounded by the frame counter), then write.
pub fn send_wired<E: HidEndpoint>(usb: &mut E, bytes: &[u8]) -> Result<()> {
    if !usb.is_configured() {
        return Err(Error::UsbNotConfigured);
    }
    let start = usb.frame_number();
    while !usb.is_write_ready() {
        if !usb.is_configured() {
            return Err(Error::UsbNotConfigured);
        }
        if usb.frame_number().wrapping_sub(start) >= USB_SEND_TIMEOUT_FRAMES {
            warn!("usb endpoint busy for {} frames", USB_SEND_TIMEOUT_FRAMES);
            return Err(Error::Timeout);
        }
    }
    usb.write_report(bytes);
    Ok(())
}
