//! The radio side of the bridge: transmit queue plus its pump.
//!
//! Producers (bring-up, keyboard reports) encode AT commands and append
//! them to the queue; the main loop calls [`UartLink::poll`] to move
//! them out one byte at a time.

use core::ops::Range;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_io::{Read, ReadReady, Write, WriteReady};

use super::flow::FlowConfig;
use super::pump::{Pump, PumpStatus};
use super::queue::TransmitQueue;
use crate::at;
use crate::config::{
    BRING_UP_BOOT_DELAY_MS, BRING_UP_COMMANDS, BRING_UP_MAX_POLLS, BRING_UP_SETTLE_MS,
    FLUSH_RETRY_US,
};
use crate::error::{Error, Result};

pub struct UartLink<S, O, I, const N: usize> {
    queue: TransmitQueue<N>,
    pump: Pump<S, O, I>,
}

impl<S, O, I, const N: usize> UartLink<S, O, I, N>
where
    S: Write + WriteReady,
    O: OutputPin,
    I: InputPin,
{
    pub fn new(serial: S, cts: O, rts: I, config: FlowConfig) -> Self {
        Self {
            queue: TransmitQueue::new(),
            pump: Pump::new(serial, cts, rts, config),
        }
    }

    /// See [`Pump::ensure_configured`].
    pub fn ensure_configured(&mut self) -> Result<bool> {
        self.pump.ensure_configured()
    }

    /// Queue a plain AT command. Returns the bytes accepted by the queue.
    pub fn send_command(&mut self, text: &str) -> Result<usize> {
        let cmd = at::encode_command(text)?;
        Ok(self.queue.enqueue_bulk(&cmd))
    }

    /// Queue the keyboard command for `raw[keys]`.
    pub fn send_report(&mut self, raw: &[u8], keys: Range<usize>) -> Result<usize> {
        let cmd = at::encode_report(raw, keys)?;
        Ok(self.queue.enqueue_bulk(&cmd))
    }

    /// One drain step; call every main-loop iteration.
    pub fn poll(&mut self) -> Result<PumpStatus> {
        self.pump.poll(&mut self.queue)
    }

    /// Drive the pump until the queue is empty, pausing briefly while the
    /// line is stalled. Gives up with [`Error::Timeout`] after `max_polls`.
    pub fn flush<D: DelayNs>(&mut self, delay: &mut D, max_polls: u32) -> Result<()> {
        for _ in 0..max_polls {
            match self.poll()? {
                PumpStatus::Idle | PumpStatus::Drained => return Ok(()),
                PumpStatus::Sent => {}
                PumpStatus::PeerBusy | PumpStatus::TxBusy => delay.delay_us(FLUSH_RETRY_US),
            }
        }
        if self.queue.is_empty() {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    /// Configure the module: HID mode on, custom GATT service and
    /// characteristic. Each command is put fully on the wire and given
    /// time to settle before the next, since the module has no command
    /// queue of its own and never acknowledges.
    pub fn bring_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        self.ensure_configured()?;
        info!("bring-up: waiting {} ms for module boot", BRING_UP_BOOT_DELAY_MS);
        delay.delay_ms(BRING_UP_BOOT_DELAY_MS);

        for text in BRING_UP_COMMANDS {
            info!("bring-up: {}", text);
            self.send_command(text)?;
            if let Err(e) = self.flush(delay, BRING_UP_MAX_POLLS) {
                error!("bring-up stalled on {}", text);
                return Err(e);
            }
            delay.delay_ms(BRING_UP_SETTLE_MS);
        }

        info!("bring-up complete");
        Ok(())
    }

    pub fn queue(&self) -> &TransmitQueue<N> {
        &self.queue
    }

    pub fn pump(&self) -> &Pump<S, O, I> {
        &self.pump
    }
}

impl<S, O, I, const N: usize> UartLink<S, O, I, N>
where
    S: Write + WriteReady + Read + ReadReady,
    O: OutputPin,
    I: InputPin,
{
    /// See [`Pump::poll_receive`].
    pub fn poll_receive(&mut self) -> Result<Option<u8>> {
        self.pump.poll_receive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FLOW;
    use crate::uart::mock::{MockDelay, MockInput, MockOutput, MockSerial, Trace};

    type TestLink<const N: usize> = UartLink<MockSerial, MockOutput, MockInput, N>;

    fn link<const N: usize>() -> (Trace, MockSerial, MockInput, TestLink<N>) {
        let trace = Trace::default();
        let serial = MockSerial::new(&trace);
        let rts = MockInput::new(false);
        let link = UartLink::new(serial.clone(), MockOutput::new(&trace), rts.clone(), FLOW);
        (trace, serial, rts, link)
    }

    #[test]
    fn command_reaches_wire_after_polls() {
        let (trace, _, _, mut link) = link::<64>();
        assert_eq!(link.send_command("AT+GATTCLEAR").unwrap(), 13);
        while link.poll().unwrap() != PumpStatus::Drained {}
        assert_eq!(trace.wire(), b"AT+GATTCLEAR\r");
    }

    #[test]
    fn report_is_queued_not_sent() {
        let (trace, _, _, mut link) = link::<64>();
        link.send_report(&[0x0a, 0xff], 0..2).unwrap();
        assert!(trace.wire().is_empty());
        assert_eq!(link.queue().len(), 25);
    }

    #[test]
    fn report_larger_than_queue_is_truncated() {
        let (trace, _, _, mut link) = link::<8>();
        assert_eq!(link.send_report(&[0x01], 0..1).unwrap(), 8);
        let mut delay = MockDelay::default();
        link.flush(&mut delay, 100).unwrap();
        assert_eq!(trace.wire(), b"AT+BLEKE");
        assert_eq!(link.queue().dropped(), 14);
    }

    #[test]
    fn invalid_range_queues_nothing() {
        let (_, _, _, mut link) = link::<64>();
        assert_eq!(link.send_report(&[0x01], 0..4), Err(Error::InvalidKeyRange));
        assert!(link.queue().is_empty());
    }

    #[test]
    fn flush_times_out_on_stuck_peer() {
        let (trace, _, rts, mut link) = link::<64>();
        rts.level.set(true);
        link.send_command("AT").unwrap();
        let mut delay = MockDelay::default();
        assert_eq!(link.flush(&mut delay, 50), Err(Error::Timeout));
        assert!(trace.wire().is_empty());
        assert_eq!(delay.total_ns, 50 * u64::from(FLUSH_RETRY_US) * 1_000);
    }

    #[test]
    fn flush_on_empty_queue_is_immediate() {
        let (_, _, _, mut link) = link::<64>();
        let mut delay = MockDelay::default();
        link.flush(&mut delay, 1).unwrap();
        assert_eq!(delay.total_ns, 0);
    }

    #[test]
    fn bring_up_sends_all_commands_in_order() {
        let (trace, _, _, mut link) = link::<128>();
        let mut delay = MockDelay::default();
        link.bring_up(&mut delay).unwrap();

        let mut expected = Vec::new();
        for text in BRING_UP_COMMANDS {
            expected.extend_from_slice(text.as_bytes());
            expected.push(b'\r');
        }
        assert_eq!(trace.wire(), expected);
        assert!(link.pump().is_configured());
    }

    #[test]
    fn bring_up_paces_every_command() {
        let (_, _, _, mut link) = link::<128>();
        let mut delay = MockDelay::default();
        link.bring_up(&mut delay).unwrap();

        let expected_ms = BRING_UP_BOOT_DELAY_MS + 4 * BRING_UP_SETTLE_MS;
        assert_eq!(delay.total_ns, u64::from(expected_ms) * 1_000_000);
    }

    #[test]
    fn bring_up_reports_a_dead_link() {
        let (trace, serial, _, mut link) = link::<128>();
        serial.tx_ready.set(false);
        let mut delay = MockDelay::default();
        assert_eq!(link.bring_up(&mut delay), Err(Error::Timeout));
        assert!(trace.wire().is_empty());
    }

    #[test]
    fn poll_receive_passes_through() {
        let (_, serial, _, mut link) = link::<8>();
        serial.rx.borrow_mut().push_back(b'\n');
        assert_eq!(link.poll_receive().unwrap(), Some(b'\n'));
        assert_eq!(link.poll_receive().unwrap(), None);
    }
}
