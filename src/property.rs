//! Property Engine.
//!
//! Where `object::BacnetObject::get_property`/`set_property` dispatch a
//! single property on a single object, this module is the layer above: it
//! resolves an object identifier through the `ObjectRegistry`, applies
//! `Array_Index` semantics to array/list-valued properties, checks a
//! property against its object type's required/optional tables, and flags
//! which writes are COV-reportable. Service handlers (ReadProperty,
//! WriteProperty, ReadPropertyMultiple) call through here rather than
//! touching `BacnetObject` directly.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::object::{ObjectError, ObjectIdentifier, ObjectRegistry, ObjectType, PropertyIdentifier, PropertyValue};

/// Errors surfaced by the property engine.
/// These map directly onto the `Error-Type` choices ReadProperty/
/// WriteProperty services return (clause 15.5/15.9).
#[derive(Debug)]
pub enum PropertyError {
    /// No object exists with the requested identifier.
    UnknownObject,
    /// The object exists but does not support this property.
    UnknownProperty,
    /// `Array_Index` was given but the property is not array-valued, or the
    /// index is outside the array (`0` is always valid: the element count).
    InvalidArrayIndex,
    /// The supplied value's tag does not match the property's expected type.
    InvalidDataType,
    /// The property exists but is not writable, or the write was rejected
    /// for a priority/permission reason (e.g. writing priority 6 directly).
    WriteAccessDenied,
    /// The value is the right type but outside the property's valid range.
    ValueOutOfRange,
    /// Device-wide resource limit reached (e.g. no room for another COV
    /// subscription); not actually raised by this module but reserved for
    /// callers layering resource accounting on top of it.
    ResourceLimit,
    /// Segmentation would be required to carry the response and the
    /// requester's `Segmentation_Supported` doesn't allow it.
    SegmentationNotSupported,
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::UnknownObject => write!(f, "unknown object"),
            PropertyError::UnknownProperty => write!(f, "unknown property"),
            PropertyError::InvalidArrayIndex => write!(f, "invalid array index"),
            PropertyError::InvalidDataType => write!(f, "invalid data type"),
            PropertyError::WriteAccessDenied => write!(f, "write access denied"),
            PropertyError::ValueOutOfRange => write!(f, "value out of range"),
            PropertyError::ResourceLimit => write!(f, "resource limit exceeded"),
            PropertyError::SegmentationNotSupported => write!(f, "segmentation not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl Error for PropertyError {}

impl From<ObjectError> for PropertyError {
    fn from(err: ObjectError) -> Self {
        match err {
            ObjectError::NotFound => PropertyError::UnknownObject,
            ObjectError::PropertyNotFound | ObjectError::UnknownProperty => {
                PropertyError::UnknownProperty
            }
            ObjectError::PropertyNotWritable | ObjectError::WriteAccessDenied => {
                PropertyError::WriteAccessDenied
            }
            ObjectError::InvalidPropertyType => PropertyError::InvalidDataType,
            ObjectError::InvalidValue(_) => PropertyError::ValueOutOfRange,
            ObjectError::InvalidConfiguration(_) => PropertyError::UnknownObject,
        }
    }
}

pub type Result<T> = core::result::Result<T, PropertyError>;

/// The required properties for an object type (clause 12's per-object
/// property tables). Objects not listed here have no required set enforced
/// by this module — their `BacnetObject` impl is authoritative.
pub fn required_properties(object_type: ObjectType) -> Vec<PropertyIdentifier> {
    use PropertyIdentifier::*;
    match object_type {
        ObjectType::Device => vec![
            ObjectIdentifier, ObjectName, ObjectType, ObjectList, SystemStatus, VendorName,
            VendorIdentifier, ModelName, FirmwareRevision, ApplicationSoftwareVersion,
            ProtocolVersion, ProtocolRevision, MaxApduLengthAccepted, SegmentationSupported,
            DatabaseRevision,
        ],
        ObjectType::AnalogInput | ObjectType::AnalogValue => {
            vec![ObjectIdentifier, ObjectName, ObjectType, PresentValue, StatusFlags, EventState, OutOfService, Units]
        }
        ObjectType::AnalogOutput => vec![
            ObjectIdentifier, ObjectName, ObjectType, PresentValue, StatusFlags, EventState,
            OutOfService, Units, PriorityArray, RelinquishDefault,
        ],
        ObjectType::LightingOutput => vec![
            ObjectIdentifier, ObjectName, ObjectType, PresentValue, TrackingValue, InProgress,
            StatusFlags, OutOfService, PriorityArray, RelinquishDefault,
        ],
        ObjectType::Schedule => vec![
            ObjectIdentifier, ObjectName, ObjectType, PresentValue, EffectivePeriod,
            ScheduleDefault, Priority, OutOfService,
        ],
        ObjectType::LoadControl => vec![
            ObjectIdentifier, ObjectName, ObjectType, PresentValue, StatusFlags, RequestedShedLevel,
            StartTime, ShedDuration, DutyWindow, ExpectedShedLevel, ActualShedLevel,
        ],
        ObjectType::StructuredView => vec![ObjectIdentifier, ObjectName, ObjectType, SubordinateList],
        ObjectType::BitstringValue => vec![
            ObjectIdentifier, ObjectName, ObjectType, PresentValue, StatusFlags, OutOfService,
        ],
        _ => Vec::new(),
    }
}

/// Whether a write to `property` on `object_type` should generate a COV
/// notification for active subscriptions (clause 13.1.2's "increment
/// detection" list, restricted to the properties this crate models).
pub fn is_cov_reportable(object_type: ObjectType, property: PropertyIdentifier) -> bool {
    use PropertyIdentifier::*;
    match property {
        PresentValue | StatusFlags => true,
        TrackingValue | InProgress if object_type == ObjectType::LightingOutput => true,
        PresentValue if object_type == ObjectType::LoadControl => true,
        _ => false,
    }
}

fn array_element(value: PropertyValue, array_index: Option<u32>) -> Result<PropertyValue> {
    let elements = match &value {
        PropertyValue::Array(items) | PropertyValue::List(items) => Some(items),
        _ => None,
    };

    match (elements, array_index) {
        (_, None) => Ok(value),
        (Some(items), Some(0)) => Ok(PropertyValue::UnsignedInteger(items.len() as u32)),
        (Some(items), Some(n)) => items
            .get((n - 1) as usize)
            .cloned()
            .ok_or(PropertyError::InvalidArrayIndex),
        (None, Some(_)) => Err(PropertyError::InvalidArrayIndex),
    }
}

/// Read a property, applying `Array_Index` semantics on top of the
/// object's own `get_property`.
pub fn read_property(
    registry: &ObjectRegistry,
    object_id: ObjectIdentifier,
    property: PropertyIdentifier,
    array_index: Option<u32>,
) -> Result<PropertyValue> {
    if object_id.object_type == ObjectType::Device && property == PropertyIdentifier::ObjectList {
        if !registry.contains(object_id) {
            return Err(PropertyError::UnknownObject);
        }
        let list = registry
            .all_objects()
            .into_iter()
            .map(PropertyValue::ObjectIdentifier)
            .collect();
        return array_element(PropertyValue::Array(list), array_index);
    }

    let value = registry.get_property(object_id, property)?;
    array_element(value, array_index)
}

/// Write a property. Whole-property writes only — writing a single array
/// element by index is rejected with `InvalidArrayIndex` since none of this
/// crate's array-valued properties (`Priority_Array`, `Shed_Levels`) accept
/// element-wise writes per their object type's property table.
///
/// `priority` is the optional commandable-write priority carried by
/// WriteProperty (clause 15.9): 1..=16, with 6 reserved. Non-commandable
/// properties ignore it; see `BacnetObject::set_property_at_priority`.
pub fn write_property(
    registry: &ObjectRegistry,
    object_id: ObjectIdentifier,
    property: PropertyIdentifier,
    value: PropertyValue,
    array_index: Option<u32>,
    priority: Option<u8>,
) -> Result<()> {
    if array_index.is_some() {
        return Err(PropertyError::InvalidArrayIndex);
    }
    if let Some(p) = priority {
        if !(1..=16).contains(&p) {
            return Err(PropertyError::ValueOutOfRange);
        }
        if p == crate::object::commandable::RESERVED_PRIORITY {
            return Err(PropertyError::WriteAccessDenied);
        }
    }
    registry.set_property_at_priority(object_id, property, value, priority)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::analog::AnalogInput;
    use crate::object::Device;

    fn test_registry() -> ObjectRegistry {
        let reg = ObjectRegistry::new(Device::new(1, "Test Device".to_string()));
        reg.add_object(Box::new(AnalogInput::new(1, "AI1".to_string()))).unwrap();
        reg
    }

    #[test]
    fn array_index_zero_returns_count() {
        let reg = test_registry();
        let ao_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let result = read_property(&reg, ao_id, PropertyIdentifier::ObjectName, Some(0));
        assert!(matches!(result, Err(PropertyError::InvalidArrayIndex)));
    }

    #[test]
    fn unknown_object_surfaces_as_property_error() {
        let reg = test_registry();
        let missing = ObjectIdentifier::new(ObjectType::AnalogInput, 99);
        let result = read_property(&reg, missing, PropertyIdentifier::PresentValue, None);
        assert!(matches!(result, Err(PropertyError::UnknownObject)));
    }

    #[test]
    fn required_properties_cover_present_value_for_analog_input() {
        let required = required_properties(ObjectType::AnalogInput);
        assert!(required.contains(&PropertyIdentifier::PresentValue));
    }

    #[test]
    fn present_value_is_cov_reportable_everywhere() {
        assert!(is_cov_reportable(ObjectType::AnalogInput, PropertyIdentifier::PresentValue));
        assert!(is_cov_reportable(ObjectType::LightingOutput, PropertyIdentifier::TrackingValue));
        assert!(!is_cov_reportable(ObjectType::AnalogInput, PropertyIdentifier::Description));
    }

    #[test]
    fn object_list_starts_with_device_and_is_array_indexable() {
        let reg = test_registry();
        let device_id = reg.device_id();
        let ai_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);

        let full = read_property(&reg, device_id, PropertyIdentifier::ObjectList, None).unwrap();
        match full {
            PropertyValue::Array(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(
                    items[0],
                    PropertyValue::ObjectIdentifier(id) if id == device_id
                ));
                assert!(matches!(
                    items[1],
                    PropertyValue::ObjectIdentifier(id) if id == ai_id
                ));
            }
            other => panic!("expected Array, got {:?}", other),
        }

        let count = read_property(&reg, device_id, PropertyIdentifier::ObjectList, Some(0)).unwrap();
        assert!(matches!(count, PropertyValue::UnsignedInteger(2)));

        let first = read_property(&reg, device_id, PropertyIdentifier::ObjectList, Some(1)).unwrap();
        assert!(matches!(
            first,
            PropertyValue::ObjectIdentifier(id) if id == device_id
        ));
    }
}
