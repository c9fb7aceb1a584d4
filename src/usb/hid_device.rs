//! USB HID keyboard device.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral, exposes one keyboard endpoint, and adapts it to the
//! bridge's polled [`HidEndpoint`] interface.

use core::future::poll_fn;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration, Instant};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use heapless::Vec;
use static_cell::StaticCell;
use usb2ble::config;
use usb2ble::hid::keyboard::{KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};
use usb2ble::HidEndpoint;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

/// Raw report bytes (possibly a sub-range of the full report).
pub type RawReport = Vec<u8, KEYBOARD_REPORT_SIZE>;

static KB_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

static USB_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Reports waiting for the IN endpoint, drained by [`hid_writer_task`].
const ENDPOINT_BANK_DEPTH: usize = 4;
static ENDPOINT_BANK: Channel<CriticalSectionRawMutex, RawReport, ENDPOINT_BANK_DEPTH> =
    Channel::new();

struct UsbStateHandler;

impl embassy_usb::Handler for UsbStateHandler {
    fn configured(&mut self, configured: bool) {
        USB_CONFIGURED.store(configured, Ordering::Relaxed);
        info!("USB configured={}", configured);
    }

    fn reset(&mut self) {
        USB_CONFIGURED.store(false, Ordering::Relaxed);
    }
}

/// Polled view of the keyboard endpoint used by the wired path.
pub struct BankEndpoint;

impl HidEndpoint for BankEndpoint {
    fn is_configured(&self) -> bool {
        USB_CONFIGURED.load(Ordering::Relaxed)
    }

    fn frame_number(&self) -> u8 {
        // Full-speed SOF is 1 ms; the uptime clock stands in for it.
        Instant::now().as_millis() as u8
    }

    fn is_write_ready(&mut self) -> bool {
        !ENDPOINT_BANK.is_full()
    }

    fn write_report(&mut self, data: &[u8]) {
        let Ok(report) = RawReport::from_slice(data) else {
            warn!("USB report of {} bytes does not fit", data.len());
            return;
        };
        if ENDPOINT_BANK.try_send(report).is_err() {
            warn!("USB endpoint bank full");
        }
    }
}

/// Wait until the bank can take a report, letting the writer task run
/// meanwhile. Returns `false` if it is still full after `timeout`.
pub async fn wait_write_ready(timeout: Duration) -> bool {
    with_timeout(timeout, poll_fn(|cx| ENDPOINT_BANK.poll_ready_to_send(cx)))
        .await
        .is_ok()
}

/// Build result containing the USB device runner and the keyboard writer.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: HidWriter<'static, UsbDriver, 8>,
}

/// Initialise the USB stack and create the keyboard device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbHidDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        usb_config,
        USB_CONFIG_DESC.init([0u8; 256]),
        USB_BOS_DESC.init([0u8; 256]),
        USB_MSOS_DESC.init([0u8; 256]),
        USB_CTRL_BUF.init([0u8; 128]),
    );

    builder.handler(USB_STATE_HANDLER.init(UsbStateHandler));

    let kb_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let keyboard_writer = HidWriter::new(&mut builder, KB_STATE.init(State::new()), kb_config);

    let device = builder.build();

    info!("USB HID keyboard initialised");

    UsbHidDevice {
        device,
        keyboard_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Move reports from the endpoint bank to the interrupt endpoint.
pub async fn hid_writer_task(mut keyboard: HidWriter<'static, UsbDriver, 8>) -> ! {
    info!("HID writer task started - waiting for reports");

    loop {
        let report = ENDPOINT_BANK.receive().await;
        if let Err(_e) = keyboard.write(&report).await {
            warn!("USB keyboard write failed");
        }
    }
}
