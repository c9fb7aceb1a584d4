//! Host-side stand-ins for the UART and the flow-control lines.
//!
//! Every mock shares one `Trace` so tests can check the exact
//! interleaving of bytes on the wire and output-line transitions.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin};

/// Something observable that happened on the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A byte was handed to the transmit register.
    Byte(u8),
    /// The output line was driven (logical level, `true` = high).
    Line(bool),
}

#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Only the bytes that reached the wire, in order.
    pub fn wire(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Byte(b) => Some(*b),
                Event::Line(_) => None,
            })
            .collect()
    }

    fn push(&self, e: Event) {
        self.0.borrow_mut().push(e);
    }
}

/// Serial port with a switchable transmit-ready bit and a receive FIFO.
#[derive(Clone)]
pub struct MockSerial {
    trace: Trace,
    pub tx_ready: Rc<Cell<bool>>,
    pub rx: Rc<RefCell<VecDeque<u8>>>,
    pub fail: Rc<Cell<bool>>,
}

impl MockSerial {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            tx_ready: Rc::new(Cell::new(true)),
            rx: Rc::new(RefCell::new(VecDeque::new())),
            fail: Rc::new(Cell::new(false)),
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail.get() {
            return Err(embedded_io::ErrorKind::Other);
        }
        // One byte per call, like a single data register.
        match buf.first() {
            Some(&b) => {
                self.trace.push(Event::Byte(b));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::WriteReady for MockSerial {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.tx_ready.get())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match (buf.first_mut(), self.rx.borrow_mut().pop_front()) {
            (Some(slot), Some(b)) => {
                *slot = b;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.borrow().is_empty())
    }
}

/// Output line that records transitions into the trace.
pub struct MockOutput {
    trace: Trace,
    pub level: Rc<Cell<bool>>,
}

impl MockOutput {
    /// Starts high, like an AVR pin with its pull-up latched.
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            level: Rc::new(Cell::new(true)),
        }
    }
}

impl digital::ErrorType for MockOutput {
    type Error = Infallible;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        self.trace.push(Event::Line(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        self.trace.push(Event::Line(true));
        Ok(())
    }
}

/// Input line whose level the test flips through a shared cell.
#[derive(Clone)]
pub struct MockInput {
    pub level: Rc<Cell<bool>>,
}

impl MockInput {
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }
}

impl digital::ErrorType for MockInput {
    type Error = Infallible;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

/// Delay that only adds up what it was asked to wait.
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
