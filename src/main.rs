//! usb2ble firmware for nRF52840.
//!
//! Hardware: nRF52840-DK + Adafruit Bluefruit LE UART Friend
//! Wired path: USB HID boot keyboard
//! Radio path: AT commands over UARTE0 with CTS/RTS lines on GPIO
//!
//! The main task is the cooperative loop: take a key report if one is
//! waiting, route it, then run one pump step.

#![no_std]
#![no_main]

mod keys;
mod usb;

use defmt::{debug, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::uarte::{self, UarteTx};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration};
use usb2ble::config::{self, SerialConfig};
use usb2ble::{Error, HidEndpoint, KeyboardReport, ReportBridge, ReportPath, UartLink};
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

/// Key reports from the scan task to the main loop.
static KEY_REPORTS: Channel<CriticalSectionRawMutex, KeyboardReport, 4> = Channel::new();

/// UARTE transmitter presented as a one-byte-at-a-time serial port.
///
/// The UARTE has no polled data register, so each byte is an EasyDMA
/// transfer that completes before `write` returns; it is always ready.
struct BlockingTx(UarteTx<'static, peripherals::UARTE0>);

impl embedded_io::ErrorType for BlockingTx {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::WriteReady for BlockingTx {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl embedded_io::Write for BlockingTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let Some(&byte) = buf.first() else {
            return Ok(0);
        };
        // EasyDMA reads from RAM only, hence the stack copy.
        self.0
            .blocking_write(&[byte])
            .map_err(|_| embedded_io::ErrorKind::Other)?;
        Ok(1)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Map the serial frame settings onto what the UARTE can do.
fn uarte_config(serial: &SerialConfig) -> uarte::Config {
    let mut cfg = uarte::Config::default();
    cfg.baudrate = match serial.baud {
        9_600 => uarte::Baudrate::BAUD9600,
        19_200 => uarte::Baudrate::BAUD19200,
        38_400 => uarte::Baudrate::BAUD38400,
        57_600 => uarte::Baudrate::BAUD57600,
        115_200 => uarte::Baudrate::BAUD115200,
        230_400 => uarte::Baudrate::BAUD230400,
        460_800 => uarte::Baudrate::BAUD460800,
        921_600 => uarte::Baudrate::BAUD921600,
        1_000_000 => uarte::Baudrate::BAUD1M,
        other => {
            warn!("uart: {} baud unsupported, using 115200", other);
            uarte::Baudrate::BAUD115200
        }
    };
    cfg.parity = if serial.parity {
        uarte::Parity::INCLUDED
    } else {
        uarte::Parity::EXCLUDED
    };
    if serial.data_bits != 8 {
        warn!("uart: {} data bits unsupported, sending 8", serial.data_bits);
    }
    // One stop bit on the wire; a second is only extra idle time to the
    // receiver, so 8N1 reads fine on an 8N2 peer.
    if serial.stop_bits != 1 {
        info!("uart: {} stop bits requested, UARTE sends 1", serial.stop_bits);
    }
    // Double speed is an AVR baud-divisor setting; the UARTE hits the
    // requested rate directly.
    if serial.double_speed {
        debug!("uart: double speed has no UARTE equivalent");
    }
    cfg
}

#[embassy_executor::task]
async fn usb_task(device: embassy_usb::UsbDevice<'static, usb::hid_device::UsbDriver>) -> ! {
    usb::hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn hid_writer(
    writer: embassy_usb::class::hid::HidWriter<'static, usb::hid_device::UsbDriver, 8>,
) -> ! {
    usb::hid_device::hid_writer_task(writer).await
}

#[embassy_executor::task]
async fn key_task(pins: [Input<'static>; keys::KEY_COUNT]) -> ! {
    keys::scan_keys(pins, KEY_REPORTS.sender()).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("usb2ble starting, report path {}", config::DEFAULT_REPORT_PATH);
    info!("uart {}", config::SERIAL);

    let p = embassy_nrf::init(Default::default());

    let usb = usb::hid_device::init(p.USBD);
    unwrap!(spawner.spawn(usb_task(usb.device)));
    unwrap!(spawner.spawn(hid_writer(usb.keyboard_writer)));

    let key_pins = [
        Input::new(p.P0_11, Pull::Up),
        Input::new(p.P0_12, Pull::Up),
        Input::new(p.P0_24, Pull::Up),
        Input::new(p.P0_25, Pull::Up),
    ];
    unwrap!(spawner.spawn(key_task(key_pins)));

    let tx = UarteTx::new(p.UARTE0, Irqs, p.P0_06, uarte_config(&config::SERIAL));

    // CTS starts released (high); RTS from the module is pulled up so a
    // missing module reads as busy.
    let cts = Output::new(p.P0_05, Level::High, OutputDrive::Standard);
    let rts = Input::new(p.P0_07, Pull::Up);

    let mut link: UartLink<_, _, _, { config::TX_QUEUE_CAPACITY }> =
        UartLink::new(BlockingTx(tx), cts, rts, config::FLOW);

    if config::DEFAULT_REPORT_PATH == ReportPath::Radio {
        if let Err(e) = link.bring_up(&mut Delay) {
            warn!("Bluefruit bring-up failed: {}", e);
        }
    }

    let mut bridge = ReportBridge::new(
        config::DEFAULT_REPORT_PATH,
        usb::hid_device::BankEndpoint,
        link,
        config::REPORT_KEY_RANGE,
    );

    let usb_send_timeout = Duration::from_millis(u64::from(config::USB_SEND_TIMEOUT_FRAMES));

    info!("bridge running");

    loop {
        // Sleep until a key changes unless bytes are still waiting to go out.
        let report = if bridge.radio().queue().is_empty() {
            Some(KEY_REPORTS.receive().await)
        } else {
            KEY_REPORTS.try_receive().ok()
        };

        if let Some(report) = report {
            // The bank drains only while the writer task runs.
            let bank_stuck = bridge.path() == ReportPath::Wired
                && bridge.usb().is_configured()
                && !usb::hid_device::wait_write_ready(usb_send_timeout).await;
            let sent = if bank_stuck {
                Err(Error::Timeout)
            } else {
                bridge.send_report(&report)
            };
            if let Err(e) = sent {
                warn!("report dropped: {}", e);
            }
        }

        if let Err(e) = bridge.poll() {
            warn!("uart pump: {}", e);
        }

        // Let the USB and key tasks run between ticks.
        embassy_futures::yield_now().await;
    }
}
