//! Key switches - the report producer on the demo board.
//!
//! Four direct-wired switches (active-low with internal pull-up) stand
//! in for a scanned matrix. Each scan builds a boot report from every
//! switch held down and publishes it only when it changed.

use defmt::debug;
use embassy_nrf::gpio::Input;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use usb2ble::config::KEY_DEBOUNCE_MS;
use usb2ble::KeyboardReport;

/// Number of switches on the board.
pub const KEY_COUNT: usize = 4;

/// HID usage codes for the switches: a, b, c, d.
const KEYCODES: [u8; KEY_COUNT] = [0x04, 0x05, 0x06, 0x07];

/// Scan the switches forever, sending a report on every change.
pub async fn scan_keys(
    pins: [Input<'static>; KEY_COUNT],
    tx: Sender<'static, CriticalSectionRawMutex, KeyboardReport, 4>,
) -> ! {
    let mut last = KeyboardReport::empty();

    loop {
        let mut pressed: Vec<u8, KEY_COUNT> = Vec::new();
        for (pin, &code) in pins.iter().zip(KEYCODES.iter()) {
            if pin.is_low() {
                // Capacity equals the number of pins.
                let _ = pressed.push(code);
            }
        }

        let report = KeyboardReport::with_keys(0, &pressed);
        if report != last {
            debug!("keys: {}", report);
            tx.send(report).await;
            last = report;
        }

        // Sampling slower than the bounce time acts as the debounce.
        Timer::after(Duration::from_millis(KEY_DEBOUNCE_MS)).await;
    }
}
