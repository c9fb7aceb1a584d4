//! Cooperative drain step: at most one byte per call, never blocks.
//!
//! Call [`Pump::poll`] on every main-loop iteration. Drain speed is
//! therefore tied to the loop rate; a producer that outruns it will see
//! bytes dropped at the queue.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write, WriteReady};

use super::flow::{FlowConfig, FlowController, PeerGate};
use super::queue::TransmitQueue;
use crate::error::{Error, Result};

/// Outcome of one drain step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpStatus {
    /// Nothing queued; the output line was left alone.
    Idle,
    /// The peer is busy and the gate is enforced; nothing sent.
    PeerBusy,
    /// The transmit register is still full; nothing sent.
    TxBusy,
    /// One byte sent, more remain.
    Sent,
    /// The last queued byte was sent and the output line released.
    Drained,
}

/// Moves queued bytes onto the serial line under hardware flow control.
pub struct Pump<S, O, I> {
    serial: S,
    flow: FlowController<O, I>,
    gate: PeerGate,
    configured: bool,
}

impl<S, O, I> Pump<S, O, I>
where
    S: Write + WriteReady,
    O: OutputPin,
    I: InputPin,
{
    pub fn new(serial: S, cts: O, rts: I, config: FlowConfig) -> Self {
        Self {
            serial,
            flow: FlowController::new(cts, rts, config.output, config.input),
            gate: config.gate,
            configured: false,
        }
    }

    /// Put the link into its idle state (output line released). Runs
    /// once; later calls are no-ops and return `false`.
    pub fn ensure_configured(&mut self) -> Result<bool> {
        if self.configured {
            return Ok(false);
        }
        self.flow.disable()?;
        self.configured = true;
        info!("uart link configured, peer gate {}", self.gate);
        Ok(true)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// One drain step.
    pub fn poll<const N: usize>(&mut self, queue: &mut TransmitQueue<N>) -> Result<PumpStatus> {
        if queue.is_empty() {
            return Ok(PumpStatus::Idle);
        }

        if !self.flow.peer_ready()? {
            match self.gate {
                PeerGate::Enforce => return Ok(PumpStatus::PeerBusy),
                PeerGate::Advisory => debug!("peer busy, sending anyway"),
            }
        }

        if !self.flow.is_enabled() {
            self.flow.enable()?;
        }

        if !self.serial.write_ready().map_err(|_| Error::Serial)? {
            return Ok(PumpStatus::TxBusy);
        }

        let serial = &mut self.serial;
        let sent = queue.try_send_one(|byte| {
            serial
                .write(&[byte])
                .map(|n| n == 1)
                .map_err(|_| Error::Serial)
        })?;
        if !sent {
            return Ok(PumpStatus::TxBusy);
        }

        if queue.is_empty() {
            self.flow.disable()?;
            return Ok(PumpStatus::Drained);
        }
        Ok(PumpStatus::Sent)
    }

    /// Whether the output line is currently asserted.
    pub fn line_enabled(&self) -> bool {
        self.flow.is_enabled()
    }

    /// Give the serial port and the two lines back.
    pub fn release(self) -> (S, O, I) {
        let (cts, rts) = self.flow.release();
        (self.serial, cts, rts)
    }
}

impl<S, O, I> Pump<S, O, I>
where
    S: Write + WriteReady + Read + ReadReady,
    O: OutputPin,
    I: InputPin,
{
    /// Pick up one byte the module sent us, if any.
    pub fn poll_receive(&mut self) -> Result<Option<u8>> {
        if !self.serial.read_ready().map_err(|_| Error::Serial)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        let n = self.serial.read(&mut byte).map_err(|_| Error::Serial)?;
        if n == 0 {
            return Ok(None);
        }
        debug!("rx {:#x}", byte[0]);
        Ok(Some(byte[0]))
    }
}
