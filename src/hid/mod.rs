//! HID keyboard report type shared by the wired and radio paths.

pub mod keyboard;


pub use keyboard::{KeyboardReport, KEYBOARD_REPORT_SIZE};
