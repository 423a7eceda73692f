//! Device configuration
//!
//! The host application assembles one [`DeviceConfig`] for the local device
//! and passes it by reference into every public entry point of the stack
//! (`receive`, `tick`, and application-issued service calls) — there is no
//! hidden global config singleton, matching the "global state, explicitly"
//! design the object model follows elsewhere.
//!
//! Fields mirror [`crate::object::Device`]'s identity/version properties
//! plus the handful of transport-tuning values (`apdu_timeout`,
//! `apdu_retries`, `max_apdu_length_accepted`, `segmentation_supported`)
//! the Transaction State Machine needs to size its retry/deadline logic.

#[cfg(feature = "std")]
use std::time::Duration;

#[cfg(not(feature = "std"))]
use core::time::Duration;

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::app::MaxApduSize;

/// Whether, and how, this device supports segmented APDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationSupport {
    Both,
    Transmit,
    Receive,
    None,
}

/// Device-wide configuration passed by reference through the public API.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// This device's object instance number (0-4194302).
    pub device_instance: u32,
    /// `Object_Name` of the Device object.
    pub device_name: String,
    /// `Description` of the Device object.
    pub device_description: String,
    /// `Vendor_Identifier` (assigned by ASHRAE).
    pub vendor_identifier: u16,
    /// `Vendor_Name`.
    pub vendor_name: String,
    /// `Model_Name`.
    pub model_name: String,
    /// `Firmware_Revision`.
    pub firmware_revision: String,
    /// `Application_Software_Version`.
    pub application_software_version: String,
    /// `Protocol_Version`. Always 1 for the current standard.
    pub protocol_version: u8,
    /// `Protocol_Revision` (ASHRAE 135 revision number this device implements).
    pub protocol_revision: u8,
    /// Largest APDU this device will accept, advertised in every
    /// confirmed request/ack's max-APDU-size field.
    pub max_apdu_length_accepted: MaxApduSize,
    /// `Segmentation_Supported`.
    pub segmentation_supported: SegmentationSupport,
    /// How long the TSM waits for a reply before retrying or timing out.
    pub apdu_timeout: Duration,
    /// Number of retries the TSM attempts before declaring a transaction failed.
    pub apdu_retries: u8,
    /// Largest segmented-message window this device will propose or accept.
    pub max_segments_accepted: u8,
}

impl DeviceConfig {
    /// A minimal configuration suitable for a non-segmenting device with
    /// otherwise-default timing (protocol revision 30, 1.0 firmware/software
    /// versions).
    pub fn new(device_instance: u32, device_name: impl Into<String>) -> Self {
        Self {
            device_instance,
            device_name: device_name.into(),
            device_description: String::new(),
            vendor_identifier: 0,
            vendor_name: String::from("Unknown"),
            model_name: String::from("bacnet-core device"),
            firmware_revision: String::from("1.0"),
            application_software_version: String::from("1.0"),
            protocol_version: 1,
            protocol_revision: 30,
            max_apdu_length_accepted: MaxApduSize::Up1476,
            segmentation_supported: SegmentationSupport::None,
            apdu_timeout: Duration::from_secs(3),
            apdu_retries: 3,
            max_segments_accepted: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_standard_device_defaults() {
        let config = DeviceConfig::new(1000, "Test Device");
        assert_eq!(config.device_instance, 1000);
        assert_eq!(config.protocol_revision, 30);
        assert_eq!(config.apdu_retries, 3);
    }
}
