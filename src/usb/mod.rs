//! USB device subsystem - the wired report path.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb` as a single boot-protocol keyboard interface.
//!
//! The bridge's synchronous [`HidEndpoint`](usb2ble::HidEndpoint) is
//! backed by a one-deep report channel; a dedicated task moves reports
//! from that channel to the interrupt endpoint.

pub mod hid_device;
