//! Service Dispatcher.
//!
//! Routes a decoded confirmed or unconfirmed service request to the object
//! registry/property engine and produces the matching response (or
//! `Reject`/`Abort`, per clause 15's per-service error rules). A null
//! handler slot — a confirmed service choice this device doesn't
//! implement — rejects with `UnrecognizedService` rather than panicking or
//! silently dropping the request; an unrecognized *unconfirmed* service is
//! simply discarded, since the standard defines no error response for one.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::encoding::{ApplicationValue, EncodingError};
use crate::object::{ObjectRegistry, PropertyIdentifier, PropertyValue as ObjectPropertyValue};
use crate::property::{self, PropertyError};
use crate::service::{
    CovNotificationRequest, IAmRequest, PropertyReference, ReadAccessSpecification,
    ReadPropertyMultipleRequest, ReadPropertyRequest, ReadPropertyResponse, RejectReason,
    WhoIsRequest, WritePropertyMultipleRequest, WritePropertyRequest,
};

/// A decoded confirmed-service request, ready for dispatch.
///
/// `SubscribeCOV`/`SubscribeCOVProperty` are not modeled here: the COV
/// subscription subsystem is an external collaborator — this
/// device only maintains the per-object `cov_increment_pending` flag a
/// subscription manager living outside this crate would drain.
pub enum ConfirmedRequest {
    ReadProperty(ReadPropertyRequest),
    WriteProperty(WritePropertyRequest),
    ReadPropertyMultiple(ReadPropertyMultipleRequest),
    WritePropertyMultiple(WritePropertyMultipleRequest),
}

/// One object's read results from a `ReadPropertyMultiple` request: either
/// every requested property read cleanly, or the first error encountered
/// (clause 15.7's "Read-Access-Result" with an embedded error, one per
/// failing property, simplified here to the first failure per object).
pub struct ReadAccessResult {
    pub object_identifier: crate::object::ObjectIdentifier,
    pub results: Vec<core::result::Result<(PropertyIdentifier, ObjectPropertyValue), PropertyError>>,
}

impl ReadAccessResult {
    /// Encode this object's read-access-result (clause 15.7): the object
    /// identifier, then a tag-1 list of per-property results, each either a
    /// tag-4-wrapped value or a tag-5-wrapped `(error-class, error-code)`
    /// pair.
    pub fn encode(&self, buffer: &mut Vec<u8>) -> core::result::Result<(), EncodingError> {
        let obj_bytes = crate::encoding::encode_context_object_id(
            self.object_identifier.object_type as u16,
            self.object_identifier.instance,
            0,
        )?;
        buffer.extend_from_slice(&obj_bytes);

        crate::encoding::context::encode_opening_tag(buffer, 1)?;
        for result in &self.results {
            match result {
                Ok((property, value)) => {
                    let prop_bytes = crate::encoding::encode_context_enumerated(*property as u32, 2)?;
                    buffer.extend_from_slice(&prop_bytes);
                    crate::encoding::context::encode_opening_tag(buffer, 4)?;
                    encode_application_value(value, buffer)?;
                    crate::encoding::context::encode_closing_tag(buffer, 4)?;
                }
                Err(err) => {
                    // The property that failed to decode has no recognized
                    // identifier; report it as 0 rather than fabricating one.
                    let prop_bytes = crate::encoding::encode_context_enumerated(0, 2)?;
                    buffer.extend_from_slice(&prop_bytes);
                    let (class, code) = property_error_to_apdu_error(err);
                    crate::encoding::context::encode_opening_tag(buffer, 5)?;
                    buffer.extend_from_slice(&crate::encoding::encode_context_enumerated(class as u32, 0)?);
                    buffer.extend_from_slice(&crate::encoding::encode_context_enumerated(code as u32, 1)?);
                    crate::encoding::context::encode_closing_tag(buffer, 5)?;
                }
            }
        }
        crate::encoding::context::encode_closing_tag(buffer, 1)?;
        Ok(())
    }
}

/// A decoded confirmed-service response.
pub enum ConfirmedResponse {
    ReadProperty(ReadPropertyResponse),
    /// `WriteProperty`'s only success response is a content-less SimpleACK.
    SimpleAck,
    ReadPropertyMultiple(Vec<ReadAccessResult>),
}

impl ConfirmedResponse {
    /// Encode the service data this response carries. `SimpleAck` encodes
    /// to nothing — callers building a `SimpleACK` PDU send an empty
    /// `service_data` regardless of this method's output.
    pub fn encode(&self, buffer: &mut Vec<u8>) -> core::result::Result<(), EncodingError> {
        match self {
            ConfirmedResponse::ReadProperty(response) => response.encode(buffer),
            ConfirmedResponse::SimpleAck => Ok(()),
            ConfirmedResponse::ReadPropertyMultiple(results) => {
                for result in results {
                    result.encode(buffer)?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of dispatching a confirmed request.
pub enum ConfirmedOutcome {
    Response(ConfirmedResponse),
    /// A malformed or unrecognized request — clause 15's `Reject-PDU`.
    Reject(RejectReason),
    /// A well-formed request the object/property model refused — clause 15's
    /// `Error-PDU`, carrying the numeric `(error_class, error_code)` pair
    /// from clause 135.1's error-type enumeration.
    Error(u8, u8),
    /// Segmentation would be required and isn't available.
    Abort(crate::service::AbortReason),
}

/// Error class numbers (clause 135.1's `BACnetErrorClass`).
mod error_class {
    pub const OBJECT: u8 = 1;
    pub const PROPERTY: u8 = 2;
    pub const RESOURCES: u8 = 3;
}

/// Error code numbers (clause 135.1's `BACnetErrorCode`, restricted to the
/// subset `PropertyError` can produce).
mod error_code {
    pub const INVALID_DATA_TYPE: u8 = 9;
    pub const VALUE_OUT_OF_RANGE: u8 = 37;
    pub const UNKNOWN_OBJECT: u8 = 31;
    pub const UNKNOWN_PROPERTY: u8 = 32;
    pub const WRITE_ACCESS_DENIED: u8 = 40;
    pub const INVALID_ARRAY_INDEX: u8 = 42;
    pub const NO_SPACE_TO_WRITE_PROPERTY: u8 = 20;
}

/// Maps a property-engine failure onto the `(error_class, error_code)` pair
/// an Error-PDU carries — these are not locally recoverable, so they
/// surface as an Error PDU, as opposed to the Reject-worthy decode failures
/// handled before the property engine is ever reached.
fn property_error_to_apdu_error(err: &PropertyError) -> (u8, u8) {
    match err {
        PropertyError::UnknownObject => (error_class::OBJECT, error_code::UNKNOWN_OBJECT),
        PropertyError::UnknownProperty => (error_class::PROPERTY, error_code::UNKNOWN_PROPERTY),
        PropertyError::InvalidArrayIndex => {
            (error_class::PROPERTY, error_code::INVALID_ARRAY_INDEX)
        }
        PropertyError::InvalidDataType => (error_class::PROPERTY, error_code::INVALID_DATA_TYPE),
        PropertyError::WriteAccessDenied => {
            (error_class::PROPERTY, error_code::WRITE_ACCESS_DENIED)
        }
        PropertyError::ValueOutOfRange => (error_class::PROPERTY, error_code::VALUE_OUT_OF_RANGE),
        PropertyError::ResourceLimit => {
            (error_class::RESOURCES, error_code::NO_SPACE_TO_WRITE_PROPERTY)
        }
        // Handled by the caller as an Abort before reaching this mapping.
        PropertyError::SegmentationNotSupported => {
            (error_class::RESOURCES, error_code::NO_SPACE_TO_WRITE_PROPERTY)
        }
    }
}

/// A decoded unconfirmed-service request.
pub enum UnconfirmedRequest {
    WhoIs(WhoIsRequest),
    IAm(IAmRequest),
    UnconfirmedCovNotification(CovNotificationRequest),
}

fn application_to_object(value: ApplicationValue) -> ObjectPropertyValue {
    match value {
        ApplicationValue::Null => ObjectPropertyValue::Null,
        ApplicationValue::Boolean(b) => ObjectPropertyValue::Boolean(b),
        ApplicationValue::Unsigned(u) => ObjectPropertyValue::UnsignedInteger(u),
        ApplicationValue::Signed(i) => ObjectPropertyValue::SignedInt(i),
        ApplicationValue::Real(r) => ObjectPropertyValue::Real(r),
        ApplicationValue::Double(d) => ObjectPropertyValue::Double(d),
        ApplicationValue::OctetString(o) => ObjectPropertyValue::OctetString(o),
        ApplicationValue::CharacterString(s) => ObjectPropertyValue::CharacterString(s),
        ApplicationValue::BitString(bs) => ObjectPropertyValue::BitString(bs.bits),
        ApplicationValue::Enumerated(e) => ObjectPropertyValue::Enumerated(e),
        ApplicationValue::Date(d) => ObjectPropertyValue::Date(crate::object::Date {
            year: d.year,
            month: d.month,
            day: d.day,
            weekday: d.weekday,
        }),
        ApplicationValue::Time(t) => ObjectPropertyValue::Time(crate::object::Time {
            hour: t.hour,
            minute: t.minute,
            second: t.second,
            hundredths: t.hundredths,
        }),
        ApplicationValue::ObjectIdentifier(oid) => {
            match crate::object::ObjectType::try_from(oid.object_type) {
                Ok(object_type) => ObjectPropertyValue::ObjectIdentifier(
                    crate::object::ObjectIdentifier::new(object_type, oid.instance),
                ),
                Err(_) => ObjectPropertyValue::Null,
            }
        }
    }
}

fn object_to_application(value: &ObjectPropertyValue) -> Option<ApplicationValue> {
    Some(match value {
        ObjectPropertyValue::Null => ApplicationValue::Null,
        ObjectPropertyValue::Boolean(b) => ApplicationValue::Boolean(*b),
        ObjectPropertyValue::UnsignedInteger(u) => ApplicationValue::Unsigned(*u),
        ObjectPropertyValue::SignedInt(i) => ApplicationValue::Signed(*i),
        ObjectPropertyValue::Real(r) => ApplicationValue::Real(*r),
        ObjectPropertyValue::Double(d) => ApplicationValue::Double(*d),
        ObjectPropertyValue::OctetString(o) => ApplicationValue::OctetString(o.clone()),
        ObjectPropertyValue::CharacterString(s) => ApplicationValue::CharacterString(s.clone()),
        ObjectPropertyValue::BitString(bits) => {
            ApplicationValue::BitString(crate::encoding::BitString::new(bits.clone()))
        }
        ObjectPropertyValue::Enumerated(e) => ApplicationValue::Enumerated(*e),
        ObjectPropertyValue::Date(d) => ApplicationValue::Date(crate::encoding::BacnetDate {
            year: d.year,
            month: d.month,
            day: d.day,
            weekday: d.weekday,
        }),
        ObjectPropertyValue::Time(t) => ApplicationValue::Time(crate::encoding::BacnetTime {
            hour: t.hour,
            minute: t.minute,
            second: t.second,
            hundredths: t.hundredths,
        }),
        ObjectPropertyValue::ObjectIdentifier(oid) => {
            ApplicationValue::ObjectIdentifier(crate::encoding::ObjectIdentifier::new(
                oid.object_type as u16,
                oid.instance,
            ))
        }
        // Arrays/lists have no single application tag; ReadPropertyMultiple
        // encodes their elements individually rather than through this path.
        ObjectPropertyValue::Array(_) | ObjectPropertyValue::List(_) => return None,
    })
}

/// Dispatches decoded requests against one device's object registry.
pub struct ServiceDispatcher<'a> {
    registry: &'a ObjectRegistry,
}

impl<'a> ServiceDispatcher<'a> {
    pub fn new(registry: &'a ObjectRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the wildcard device instance (clause 16.8: `4,194,303` means
    /// "this device") against this registry's own Device object. Every
    /// object/property lookup goes through this first — the echoed
    /// `object_identifier` field in a response still carries the caller's
    /// original (possibly wildcard) identifier untouched.
    fn resolve_object_identifier(
        &self,
        object_identifier: crate::object::ObjectIdentifier,
    ) -> crate::object::ObjectIdentifier {
        if object_identifier.object_type == crate::object::ObjectType::Device
            && object_identifier.instance == crate::object::DEVICE_INSTANCE_WILDCARD
        {
            self.registry.device_id()
        } else {
            object_identifier
        }
    }

    /// Route one confirmed-service request. Services this dispatcher does
    /// not implement reject with `UnrecognizedService` instead of a panic or
    /// silent drop.
    pub fn dispatch_confirmed(&self, request: ConfirmedRequest) -> ConfirmedOutcome {
        match request {
            ConfirmedRequest::ReadProperty(req) => self.read_property(req),
            ConfirmedRequest::WriteProperty(req) => self.write_property(req),
            ConfirmedRequest::ReadPropertyMultiple(req) => self.read_property_multiple(req),
            ConfirmedRequest::WritePropertyMultiple(req) => self.write_property_multiple(req),
        }
    }

    fn read_property(&self, request: ReadPropertyRequest) -> ConfirmedOutcome {
        let Ok(property) = decode_property_identifier(request.property_identifier) else {
            return ConfirmedOutcome::Reject(RejectReason::InvalidParameterDataType);
        };

        match property::read_property(
            self.registry,
            self.resolve_object_identifier(request.object_identifier),
            property,
            request.property_array_index,
        ) {
            Ok(value) => {
                let mut encoded = Vec::new();
                if encode_application_value(&value, &mut encoded).is_err() {
                    return ConfirmedOutcome::Reject(RejectReason::InvalidParameterDataType);
                }
                ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(ReadPropertyResponse {
                    object_identifier: request.object_identifier,
                    property_identifier: request.property_identifier,
                    property_array_index: request.property_array_index,
                    property_value: encoded,
                }))
            }
            Err(PropertyError::SegmentationNotSupported) => {
                ConfirmedOutcome::Abort(crate::service::AbortReason::SegmentationNotSupported)
            }
            Err(err) => {
                let (class, code) = property_error_to_apdu_error(&err);
                ConfirmedOutcome::Error(class, code)
            }
        }
    }

    fn write_property(&self, request: WritePropertyRequest) -> ConfirmedOutcome {
        match self.write_one_property(
            request.object_identifier,
            request.property_identifier,
            &request.property_value,
            request.property_array_index,
            request.priority,
        ) {
            Ok(()) => ConfirmedOutcome::Response(ConfirmedResponse::SimpleAck),
            Err(outcome) => outcome,
        }
    }

    /// Shared by `WriteProperty` and `WritePropertyMultiple`: decode one
    /// encoded application value and push it through the property engine.
    /// Returns the `ConfirmedOutcome` to report (`Reject` for a decode
    /// failure, `Error` for a property-engine failure) as the error variant,
    /// so both callers can short-circuit on the first failure.
    fn write_one_property(
        &self,
        object_identifier: crate::object::ObjectIdentifier,
        property_identifier: u32,
        property_value: &[u8],
        property_array_index: Option<u32>,
        priority: Option<u8>,
    ) -> core::result::Result<(), ConfirmedOutcome> {
        let property = decode_property_identifier(property_identifier)
            .map_err(|_| ConfirmedOutcome::Reject(RejectReason::InvalidParameterDataType))?;

        let (application_value, _) = ApplicationValue::decode(property_value)
            .map_err(|_| ConfirmedOutcome::Reject(RejectReason::InvalidParameterDataType))?;

        property::write_property(
            self.registry,
            self.resolve_object_identifier(object_identifier),
            property,
            application_to_object(application_value),
            property_array_index,
            priority,
        )
        .map_err(|err| {
            log::debug!("dispatch: write_property {object_identifier:?} rejected with {err}");
            let (class, code) = property_error_to_apdu_error(&err);
            ConfirmedOutcome::Error(class, code)
        })
    }

    /// `WritePropertyMultiple` (clause 15.13): writes every property of
    /// every write-access specification in order. The first failure aborts
    /// the whole request with that failure's Error/Reject — there is no
    /// partial-success response, and writes already applied before the
    /// failure are not rolled back (clause 15.13 describes no undo).
    fn write_property_multiple(&self, request: WritePropertyMultipleRequest) -> ConfirmedOutcome {
        for spec in &request.write_access_specifications {
            for value in &spec.property_values {
                if let Err(outcome) = self.write_one_property(
                    spec.object_identifier,
                    value.property_identifier,
                    &value.property_value,
                    value.property_array_index,
                    value.priority,
                ) {
                    return outcome;
                }
            }
        }
        ConfirmedOutcome::Response(ConfirmedResponse::SimpleAck)
    }

    fn read_property_multiple(&self, request: ReadPropertyMultipleRequest) -> ConfirmedOutcome {
        let results = request
            .read_access_specifications
            .into_iter()
            .map(|spec| self.read_access_spec(spec))
            .collect();
        ConfirmedOutcome::Response(ConfirmedResponse::ReadPropertyMultiple(results))
    }

    fn read_access_spec(&self, spec: ReadAccessSpecification) -> ReadAccessResult {
        let resolved = self.resolve_object_identifier(spec.object_identifier);
        let results = spec
            .property_references
            .into_iter()
            .map(|reference: PropertyReference| {
                let property = decode_property_identifier(reference.property_identifier)
                    .map_err(|_| PropertyError::UnknownProperty)?;
                let value = property::read_property(
                    self.registry,
                    resolved,
                    property,
                    reference.property_array_index,
                )?;
                Ok((property, value))
            })
            .collect();
        ReadAccessResult { object_identifier: spec.object_identifier, results }
    }

    /// Handle an unconfirmed-service request. `None` means "no response
    /// required" (the common case — only `WhoIs` produces one, an `IAm`).
    pub fn dispatch_unconfirmed(&self, request: UnconfirmedRequest) -> Option<IAmRequest> {
        match request {
            UnconfirmedRequest::WhoIs(who_is) => self.handle_who_is(who_is),
            UnconfirmedRequest::IAm(_) => None,
            UnconfirmedRequest::UnconfirmedCovNotification(_) => None,
        }
    }

    fn handle_who_is(&self, request: WhoIsRequest) -> Option<IAmRequest> {
        let device_id = self.registry.device_id();
        if let (Some(low), Some(high)) = (
            request.device_instance_range_low_limit,
            request.device_instance_range_high_limit,
        ) {
            if device_id.instance < low || device_id.instance > high {
                return None;
            }
        }

        let max_apdu = match self
            .registry
            .get_property(device_id, PropertyIdentifier::MaxApduLengthAccepted)
        {
            Ok(ObjectPropertyValue::UnsignedInteger(u)) => u,
            _ => 1476,
        };
        let segmentation = match self
            .registry
            .get_property(device_id, PropertyIdentifier::SegmentationSupported)
        {
            Ok(ObjectPropertyValue::Enumerated(e)) => e,
            _ => 0,
        };
        let vendor_identifier = match self
            .registry
            .get_property(device_id, PropertyIdentifier::VendorIdentifier)
        {
            Ok(ObjectPropertyValue::UnsignedInteger(u)) => u,
            _ => 0,
        };

        Some(IAmRequest::new(device_id, max_apdu, segmentation, vendor_identifier))
    }
}

fn decode_property_identifier(raw: u32) -> core::result::Result<PropertyIdentifier, ()> {
    property_identifier_from_u32(raw).ok_or(())
}

/// `PropertyIdentifier` carries no blanket `TryFrom<u32>` (the enum only
/// assigns the subset of clause 21 identifiers this crate models), so the
/// dispatcher matches the numeric values it actually needs to recognize.
fn property_identifier_from_u32(raw: u32) -> Option<PropertyIdentifier> {
    use PropertyIdentifier::*;
    const TABLE: &[(u32, PropertyIdentifier)] = &[
        (75, ObjectIdentifier),
        (76, ObjectList),
        (77, ObjectName),
        (79, ObjectType),
        (85, PresentValue),
        (111, StatusFlags),
        (36, EventState),
        (81, OutOfService),
        (117, Units),
        (87, PriorityArray),
        (104, RelinquishDefault),
        (28, Description),
        (164, TrackingValue),
        (526, InProgress),
        (375, DefaultRampRate),
        (376, DefaultStepIncrement),
        (343, MinActualValue),
        (344, MaxActualValue),
        (32, EffectivePeriod),
        (174, ScheduleDefault),
        (86, Priority),
        (54, ListOfObjectPropertyReferences),
        (218, RequestedShedLevel),
        (142, StartTime),
        (219, ShedDuration),
        (204, DutyWindow),
        (214, ExpectedShedLevel),
        (212, ActualShedLevel),
        (224, FullDutyBaseline),
        (220, ShedLevels),
        (221, ShedLevelDescriptions),
        (171, SubordinateList),
        (207, NodeType),
        (336, DefaultSubordinateRelationship),
        (264, BitText),
        (112, SystemStatus),
        (121, VendorName),
        (120, VendorIdentifier),
        (70, ModelName),
        (44, FirmwareRevision),
        (12, ApplicationSoftwareVersion),
        (98, ProtocolVersion),
        (139, ProtocolRevision),
        (62, MaxApduLengthAccepted),
        (107, SegmentationSupported),
        (155, DatabaseRevision),
    ];
    TABLE.iter().find(|(v, _)| *v == raw).map(|(_, p)| *p)
}

fn encode_application_value(value: &ObjectPropertyValue, buffer: &mut Vec<u8>) -> core::result::Result<(), EncodingError> {
    match value {
        ObjectPropertyValue::Array(items) | ObjectPropertyValue::List(items) => {
            for item in items {
                encode_application_value(item, buffer)?;
            }
            Ok(())
        }
        other => match object_to_application(other) {
            Some(application_value) => application_value.encode(Some(buffer)).map(|_| ()),
            None => Err(EncodingError::InvalidFormat("unsupported property value".into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::analog::AnalogInput;
    use crate::object::{Device, ObjectIdentifier, ObjectType};

    fn registry_with_ai() -> ObjectRegistry {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(AnalogInput::new(1, "AI1".to_string()))).unwrap();
        reg
    }

    #[test]
    fn who_is_without_range_always_answers() {
        let reg = registry_with_ai();
        let dispatcher = ServiceDispatcher::new(&reg);
        let response = dispatcher.dispatch_unconfirmed(UnconfirmedRequest::WhoIs(WhoIsRequest::new()));
        assert!(response.is_some());
        assert_eq!(response.unwrap().device_identifier.instance, 1);
    }

    #[test]
    fn who_is_outside_range_is_silent() {
        let reg = registry_with_ai();
        let dispatcher = ServiceDispatcher::new(&reg);
        let response = dispatcher
            .dispatch_unconfirmed(UnconfirmedRequest::WhoIs(WhoIsRequest::for_range(100, 200)));
        assert!(response.is_none());
    }

    #[test]
    fn read_property_round_trips_present_value() {
        let reg = registry_with_ai();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ai_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let request = ReadPropertyRequest::new(ai_id, PropertyIdentifier::PresentValue as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(request)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                assert_eq!(resp.object_identifier, ai_id);
                assert!(!resp.property_value.is_empty());
            }
            _ => panic!("expected ReadProperty response"),
        }
    }

    #[test]
    fn read_property_resolves_wildcard_device_instance() {
        // A ReadProperty naming the wildcard device
        // instance (clause 16.8: 4,194,303 means "this device") resolves
        // against the local Device object. The request's
        // Object_Identifier(device, 4194303) / Object_Identifier(75) pair
        // decodes from the wire bytes
        // 0C 02 3F FF FF 19 4B; the ComplexACK echoes that same wildcard
        // identifier back in the object_identifier field while the
        // property value itself carries the real device instance, 123.
        let reg = ObjectRegistry::new(Device::new(123, "Test Device".to_string()));
        let dispatcher = ServiceDispatcher::new(&reg);
        let wildcard_id =
            ObjectIdentifier::new(ObjectType::Device, crate::object::DEVICE_INSTANCE_WILDCARD);
        let request =
            ReadPropertyRequest::new(wildcard_id, PropertyIdentifier::ObjectIdentifier as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(request)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                assert_eq!(resp.object_identifier, wildcard_id);
                let (value, _) = ApplicationValue::decode(&resp.property_value).unwrap();
                assert_eq!(
                    value,
                    ApplicationValue::ObjectIdentifier(crate::encoding::ObjectIdentifier::new(
                        ObjectType::Device as u16,
                        123,
                    ))
                );
            }
            _ => panic!("expected ReadProperty response"),
        }
    }

    #[test]
    fn unrecognized_property_rejects_rather_than_panics() {
        let reg = registry_with_ai();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ai_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let request = ReadPropertyRequest::new(ai_id, 9999);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(request)) {
            ConfirmedOutcome::Reject(RejectReason::InvalidParameterDataType) => {}
            _ => panic!("expected reject"),
        }
    }

    #[test]
    fn write_property_wrong_tag_errors() {
        // A BitString-tagged payload written to
        // PROP_PRESENT_VALUE of an AnalogOutput (expects Real) comes back as
        // an Error PDU, class=Property, code=InvalidDataType.
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(crate::object::analog::AnalogOutput::new(1, "AO1".to_string())))
            .unwrap();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);
        let mut bitstring_payload = Vec::new();
        ApplicationValue::BitString(crate::encoding::BitString::new(vec![true]))
            .encode(Some(&mut bitstring_payload))
            .unwrap();
        let request = WritePropertyRequest::new(
            ao_id,
            PropertyIdentifier::PresentValue as u32,
            bitstring_payload,
        );
        match dispatcher.dispatch_confirmed(ConfirmedRequest::WriteProperty(request)) {
            ConfirmedOutcome::Error(2, 9) => {}
            _ => panic!("expected Error(Property, InvalidDataType)"),
        }
    }

    #[test]
    fn write_to_reserved_priority_errors() {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(crate::object::analog::AnalogOutput::new(1, "AO1".to_string())))
            .unwrap();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);
        let mut payload = Vec::new();
        ApplicationValue::Real(1.0).encode(Some(&mut payload)).unwrap();
        let request = WritePropertyRequest::with_priority(
            ao_id,
            PropertyIdentifier::PresentValue as u32,
            payload,
            6,
        );
        match dispatcher.dispatch_confirmed(ConfirmedRequest::WriteProperty(request)) {
            ConfirmedOutcome::Error(2, 40) => {}
            _ => panic!("expected Error(Property, WriteAccessDenied) for reserved priority"),
        }
    }

    #[test]
    fn write_property_honors_requested_priority_slot() {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(crate::object::analog::AnalogOutput::new(1, "AO1".to_string())))
            .unwrap();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);

        let mut p5 = Vec::new();
        ApplicationValue::Real(10.0).encode(Some(&mut p5)).unwrap();
        let write_p5 = WritePropertyRequest::with_priority(
            ao_id,
            PropertyIdentifier::PresentValue as u32,
            p5,
            5,
        );
        assert!(matches!(
            dispatcher.dispatch_confirmed(ConfirmedRequest::WriteProperty(write_p5)),
            ConfirmedOutcome::Response(ConfirmedResponse::SimpleAck)
        ));

        let read = ReadPropertyRequest::new(ao_id, PropertyIdentifier::PresentValue as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(read)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                let (value, _) = ApplicationValue::decode(&resp.property_value).unwrap();
                assert!(matches!(value, ApplicationValue::Real(v) if v == 10.0));
            }
            _ => panic!("expected ReadProperty response"),
        }

        // A higher priority (lower number, 3) wins over 5.
        let mut p3 = Vec::new();
        ApplicationValue::Real(20.0).encode(Some(&mut p3)).unwrap();
        let write_p3 = WritePropertyRequest::with_priority(
            ao_id,
            PropertyIdentifier::PresentValue as u32,
            p3,
            3,
        );
        assert!(matches!(
            dispatcher.dispatch_confirmed(ConfirmedRequest::WriteProperty(write_p3)),
            ConfirmedOutcome::Response(ConfirmedResponse::SimpleAck)
        ));

        let read = ReadPropertyRequest::new(ao_id, PropertyIdentifier::PresentValue as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(read)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                let (value, _) = ApplicationValue::decode(&resp.property_value).unwrap();
                assert!(matches!(value, ApplicationValue::Real(v) if v == 20.0));
            }
            _ => panic!("expected ReadProperty response"),
        }
    }

    #[test]
    fn write_property_multiple_applies_every_write() {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(crate::object::analog::AnalogOutput::new(1, "AO1".to_string())))
            .unwrap();
        reg.add_object(Box::new(crate::object::analog::AnalogValue::new(1, "AV1".to_string())))
            .unwrap();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);
        let av_id = ObjectIdentifier::new(ObjectType::AnalogValue, 1);

        let mut ao_payload = Vec::new();
        ApplicationValue::Real(12.5).encode(Some(&mut ao_payload)).unwrap();
        let mut av_payload = Vec::new();
        ApplicationValue::Real(99.0).encode(Some(&mut av_payload)).unwrap();

        let request = WritePropertyMultipleRequest::new(vec![
            crate::service::WriteAccessSpecification::new(
                ao_id,
                vec![crate::service::WritePropertyValue::with_priority(
                    PropertyIdentifier::PresentValue as u32,
                    ao_payload,
                    5,
                )],
            ),
            crate::service::WriteAccessSpecification::new(
                av_id,
                vec![crate::service::WritePropertyValue::new(
                    PropertyIdentifier::PresentValue as u32,
                    av_payload,
                )],
            ),
        ]);

        assert!(matches!(
            dispatcher.dispatch_confirmed(ConfirmedRequest::WritePropertyMultiple(request)),
            ConfirmedOutcome::Response(ConfirmedResponse::SimpleAck)
        ));

        let read_ao = ReadPropertyRequest::new(ao_id, PropertyIdentifier::PresentValue as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(read_ao)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                let (value, _) = ApplicationValue::decode(&resp.property_value).unwrap();
                assert!(matches!(value, ApplicationValue::Real(v) if v == 12.5));
            }
            _ => panic!("expected ReadProperty response"),
        }

        let read_av = ReadPropertyRequest::new(av_id, PropertyIdentifier::PresentValue as u32);
        match dispatcher.dispatch_confirmed(ConfirmedRequest::ReadProperty(read_av)) {
            ConfirmedOutcome::Response(ConfirmedResponse::ReadProperty(resp)) => {
                let (value, _) = ApplicationValue::decode(&resp.property_value).unwrap();
                assert!(matches!(value, ApplicationValue::Real(v) if v == 99.0));
            }
            _ => panic!("expected ReadProperty response"),
        }
    }

    #[test]
    fn write_property_multiple_stops_at_first_failure() {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(crate::object::analog::AnalogOutput::new(1, "AO1".to_string())))
            .unwrap();
        let dispatcher = ServiceDispatcher::new(&reg);
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);
        let missing_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 99);

        let mut payload = Vec::new();
        ApplicationValue::Real(1.0).encode(Some(&mut payload)).unwrap();

        let request = WritePropertyMultipleRequest::new(vec![
            crate::service::WriteAccessSpecification::new(
                missing_id,
                vec![crate::service::WritePropertyValue::new(
                    PropertyIdentifier::PresentValue as u32,
                    payload,
                )],
            ),
            crate::service::WriteAccessSpecification::new(
                ao_id,
                vec![crate::service::WritePropertyValue::new(
                    PropertyIdentifier::PresentValue as u32,
                    Vec::new(),
                )],
            ),
        ]);

        match dispatcher.dispatch_confirmed(ConfirmedRequest::WritePropertyMultiple(request)) {
            ConfirmedOutcome::Error(1, 31) => {} // Object, UnknownObject
            _ => panic!("expected Error(Object, UnknownObject) from first failing write"),
        }
    }
}
