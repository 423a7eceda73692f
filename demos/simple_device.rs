//! Simple BACnet Device Example
//!
//! Builds a Device object plus one Analog Input, wires them into an
//! `ObjectRegistry`, and drives a `ServiceDispatcher` through a Who-Is/I-Am
//! exchange and a Read-Property request. The link layer here is a
//! `LoopbackLink`, since BACnet/IP, MS/TP, and every other physical
//! medium driver is an external collaborator this crate never implements,
//! so the example runs with no network access required.

use bacnet_core::app::{Apdu, MaxApduSize, MaxSegments};
use bacnet_core::datalink::{DataLink, DataLinkAddress, DataLinkError, DataLinkType};
use bacnet_core::object::analog::AnalogInput;
use bacnet_core::object::{BacnetObject, Device, ObjectIdentifier, ObjectRegistry, ObjectType, PropertyIdentifier};
use bacnet_core::service::dispatch::{ConfirmedOutcome, ConfirmedRequest, ConfirmedResponse, ServiceDispatcher, UnconfirmedRequest};
use bacnet_core::service::{IAmRequest, ReadPropertyRequest, UnconfirmedServiceChoice, WhoIsRequest};
use bacnet_core::ConfirmedServiceChoice;

/// A single-process stand-in for a real data link driver: frames pushed by
/// `send_frame` are immediately available to `receive_frame`, modeling one
/// device talking to itself for demonstration purposes.
struct LoopbackLink {
    local: DataLinkAddress,
    inbox: Vec<(Vec<u8>, DataLinkAddress)>,
}

impl LoopbackLink {
    fn new() -> Self {
        Self { local: DataLinkAddress::Broadcast, inbox: Vec::new() }
    }
}

impl DataLink for LoopbackLink {
    fn send_frame(&mut self, frame: &[u8], dest: &DataLinkAddress) -> bacnet_core::datalink::Result<()> {
        self.inbox.push((frame.to_vec(), dest.clone()));
        Ok(())
    }

    fn receive_frame(&mut self) -> bacnet_core::datalink::Result<(Vec<u8>, DataLinkAddress)> {
        self.inbox.pop().ok_or(DataLinkError::InvalidFrame)
    }

    fn link_type(&self) -> DataLinkType {
        DataLinkType::PointToPoint
    }

    fn local_address(&self) -> DataLinkAddress {
        self.local.clone()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("bacnet-core Simple Device Example");
    println!("==================================");

    let mut device = Device::new(12345, "Example Device".to_string());
    device.vendor_name = "bacnet-core Demo".to_string();
    device.model_name = "Simple Demo Device".to_string();

    println!("Created device: {}", device.object_name);
    println!("Device instance: {}", device.identifier.instance);

    let registry = ObjectRegistry::new(device);
    registry
        .add_object(Box::new(AnalogInput::new(1, "Outside Air Temperature".to_string())))
        .expect("adding the analog input should succeed on an empty registry");

    let mut link = LoopbackLink::new();
    println!("Loopback link bound, type {:?}", link.link_type());

    // --- Who-Is / I-Am ---------------------------------------------------
    println!("\nWho-Is / I-Am:");
    println!("--------------");

    let whois = WhoIsRequest::for_device(12345);
    let mut whois_buffer = Vec::new();
    whois.encode(&mut whois_buffer)?;
    let whois_apdu = Apdu::UnconfirmedRequest {
        service_choice: UnconfirmedServiceChoice::WhoIs as u8,
        service_data: whois_buffer,
    };
    link.send_frame(&whois_apdu.encode(), &DataLinkAddress::Broadcast)?;

    let (received, _src) = link.receive_frame()?;
    let decoded = Apdu::decode(&received)?;
    if let Apdu::UnconfirmedRequest { service_data, .. } = decoded {
        let request = WhoIsRequest::decode(&service_data)?;
        let dispatcher = ServiceDispatcher::new(&registry);
        if let Some(iam) = dispatcher.dispatch_unconfirmed(UnconfirmedRequest::WhoIs(request)) {
            print_iam(&iam);
        }
    }

    // --- Read Property -----------------------------------------------------
    println!("\nRead Property:");
    println!("--------------");

    let ai_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
    let request = ReadPropertyRequest::new(ai_id, PropertyIdentifier::PresentValue as u32);
    let mut request_data = Vec::new();
    request.encode(&mut request_data)?;

    let request_apdu = Apdu::ConfirmedRequest {
        segmented: false,
        more_follows: false,
        segmented_response_accepted: true,
        max_segments: MaxSegments::Unspecified,
        max_response_size: MaxApduSize::Up1476,
        invoke_id: 1,
        sequence_number: None,
        proposed_window_size: None,
        service_choice: ConfirmedServiceChoice::ReadProperty as u8,
        service_data: request_data,
    };
    println!("Encoded Read-Property APDU: {} bytes", request_apdu.encode().len());

    let dispatcher = ServiceDispatcher::new(&registry);
    match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(request)) {
        ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
            println!(
                "{:?}.{:?} = {} raw bytes",
                resp.object_identifier.object_type, resp.property_identifier, resp.property_value.len()
            );
        }
        ConfirmedOutcome::Error(class, code) => {
            println!("Error PDU: class {} code {}", class, code);
        }
        _ => println!("Unexpected outcome"),
    }

    Ok(())
}

fn print_iam(iam: &IAmRequest) {
    println!(
        "I-Am: device {}, max-apdu {}, segmentation {}, vendor {}",
        iam.device_identifier.instance,
        iam.max_apdu_length_accepted,
        iam.segmentation_supported,
        iam.vendor_identifier
    );
}
