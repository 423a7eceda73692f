//! BACnet Who-Is Scan Example
//!
//! Broadcasts a Who-Is request to a handful of in-process device registries
//! and collects their I-Am responses. Real Who-Is scanning listens on a
//! BACnet/IP or MS/TP link for whatever devices happen to be on the wire;
//! this crate never implements a link driver itself, so the scan
//! here walks a fixed list of local `ObjectRegistry`s instead of a socket.

use std::collections::HashMap;

use bacnet_core::object::{Device, ObjectRegistry};
use bacnet_core::service::dispatch::{ServiceDispatcher, UnconfirmedRequest};
use bacnet_core::service::{IAmRequest, WhoIsRequest};

struct SimulatedNetwork {
    registries: Vec<ObjectRegistry>,
}

impl SimulatedNetwork {
    fn new() -> Self {
        let devices = [
            (101, "Rooftop AHU Controller", "Acme Controls"),
            (202, "Chiller Plant Controller", "Acme Controls"),
            (303, "VAV Box 12", "Northwind Automation"),
        ];

        let registries = devices
            .iter()
            .map(|(instance, name, vendor)| {
                let mut device = Device::new(*instance, name.to_string());
                device.vendor_name = vendor.to_string();
                ObjectRegistry::new(device)
            })
            .collect();

        Self { registries }
    }

    /// Broadcast a Who-Is and collect whichever registries answer.
    fn scan(&self, request: &WhoIsRequest) -> Vec<IAmRequest> {
        self.registries
            .iter()
            .filter_map(|registry| {
                let dispatcher = ServiceDispatcher::new(registry);
                dispatcher.dispatch_unconfirmed(UnconfirmedRequest::WhoIs(request.clone()))
            })
            .collect()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("bacnet-core Who-Is Scan Example");
    println!("===============================\n");

    let network = SimulatedNetwork::new();

    println!("Broadcasting Who-Is (no range)...");
    let all_devices = network.scan(&WhoIsRequest::new());
    print_summary(&all_devices);

    println!("\nBroadcasting Who-Is for instances 200-300...");
    let ranged = network.scan(&WhoIsRequest::for_range(200, 300));
    print_summary(&ranged);

    Ok(())
}

fn print_summary(devices: &[IAmRequest]) {
    let mut by_instance: HashMap<u32, &IAmRequest> =
        devices.iter().map(|d| (d.device_identifier.instance, d)).collect();

    if by_instance.is_empty() {
        println!("  No devices responded.");
        return;
    }

    let mut instances: Vec<u32> = by_instance.keys().copied().collect();
    instances.sort_unstable();

    for instance in instances {
        let iam = by_instance.remove(&instance).unwrap();
        println!(
            "  Device {} - max-apdu {}, segmentation {}, vendor id {}",
            instance, iam.max_apdu_length_accepted, iam.segmentation_supported, iam.vendor_identifier
        );
    }
}
