//! Two-wire hardware handshake with the Bluefruit module.
//!
//! - **Output line** (our CTS, the module's CTS input): asserted while we
//!   have a burst in flight, released when the queue runs dry.
//! - **Input line** (the module's RTS): asserted while the module can take
//!   more data. Sampled on every query, never cached.
//!
//! Both lines are active-low on the Bluefruit; the polarity is kept
//! configurable so callers only ever deal with logical enabled/ready.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::{Error, Result};

/// Electrical level that means "asserted".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}

/// What the pump does when the peer reports busy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerGate {
    /// Hold transmission until the peer is ready again.
    Enforce,
    /// Sample and log the line but keep sending.
    Advisory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlowConfig {
    pub output: Polarity,
    pub input: Polarity,
    pub gate: PeerGate,
}

/// Owns the outbound enable line and the inbound peer-ready line.
pub struct FlowController<O, I> {
    out: O,
    peer: I,
    output: Polarity,
    input: Polarity,
    enabled: bool,
}

impl<O: OutputPin, I: InputPin> FlowController<O, I> {
    /// Wrap the two lines. The output line is not touched until the
    /// first `enable`/`disable`.
    pub fn new(out: O, peer: I, output: Polarity, input: Polarity) -> Self {
        Self {
            out,
            peer,
            output,
            input,
            enabled: false,
        }
    }

    /// Tell the peer a burst is starting.
    pub fn enable(&mut self) -> Result<()> {
        self.drive(true)
    }

    /// Tell the peer the burst is over.
    pub fn disable(&mut self) -> Result<()> {
        self.drive(false)
    }

    /// Logical state last driven onto the output line.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sample the peer's line: `true` when it can accept data now.
    pub fn peer_ready(&mut self) -> Result<bool> {
        let level = match self.input {
            Polarity::ActiveLow => self.peer.is_low(),
            Polarity::ActiveHigh => self.peer.is_high(),
        };
        level.map_err(|_| Error::Gpio)
    }

    /// Give the pins back.
    pub fn release(self) -> (O, I) {
        (self.out, self.peer)
    }

    fn drive(&mut self, asserted: bool) -> Result<()> {
        let high = asserted == (self.output == Polarity::ActiveHigh);
        let res = if high {
            self.out.set_high()
        } else {
            self.out.set_low()
        };
        res.map_err(|_| Error::Gpio)?;
        self.enabled = asserted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn idle_pin() -> PinMock {
        PinMock::new(&Vec::<Transaction>::new())
    }

    fn done(flow: FlowController<PinMock, PinMock>) {
        let (mut out, mut peer) = flow.release();
        out.done();
        peer.done();
    }

    #[test]
    fn active_low_enable_drives_low() {
        let out = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);
        let peer = idle_pin();
        let mut flow = FlowController::new(out, peer, Polarity::ActiveLow, Polarity::ActiveLow);

        assert!(!flow.is_enabled());
        flow.enable().unwrap();
        assert!(flow.is_enabled());
        flow.disable().unwrap();
        assert!(!flow.is_enabled());
        done(flow);
    }

    #[test]
    fn active_high_enable_drives_high() {
        let out = PinMock::new(&[Transaction::set(State::High), Transaction::set(State::Low)]);
        let peer = idle_pin();
        let mut flow = FlowController::new(out, peer, Polarity::ActiveHigh, Polarity::ActiveLow);

        flow.enable().unwrap();
        flow.disable().unwrap();
        done(flow);
    }

    #[test]
    fn peer_ready_is_sampled_every_time() {
        let out = idle_pin();
        let peer = PinMock::new(&[
            Transaction::get(State::Low),
            Transaction::get(State::High),
            Transaction::get(State::Low),
        ]);
        let mut flow = FlowController::new(out, peer, Polarity::ActiveLow, Polarity::ActiveLow);

        assert!(flow.peer_ready().unwrap());
        assert!(!flow.peer_ready().unwrap());
        assert!(flow.peer_ready().unwrap());
        done(flow);
    }

    #[test]
    fn active_high_peer_line() {
        let out = idle_pin();
        let peer = PinMock::new(&[Transaction::get(State::High)]);
        let mut flow = FlowController::new(out, peer, Polarity::ActiveLow, Polarity::ActiveHigh);

        assert!(flow.peer_ready().unwrap());
        done(flow);
    }
}
