//! BitstringValue object.
//!
//! A commandable bit-string value using the same 16-priority array as
//! `AnalogOutput`, plus `Bit_Text` giving each bit position a human-readable
//! label (clause 12.72's `BACnetBitString`/`Bit_Text` pair).

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::object::commandable::PriorityArray;
use crate::object::{
    BacnetObject, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyValue,
    Result, StatusFlags,
};

#[derive(Debug, Clone)]
pub struct BitstringValue {
    pub identifier: ObjectIdentifier,
    pub object_name: String,
    pub description: String,
    pub priority_array: PriorityArray<Vec<bool>>,
    pub bit_text: Vec<String>,
    pub out_of_service: bool,
}

impl BitstringValue {
    pub fn new(instance: u32, object_name: String, bit_count: usize) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::BitstringValue, instance),
            object_name,
            description: String::new(),
            priority_array: PriorityArray::new(vec![false; bit_count]),
            bit_text: Vec::new(),
            out_of_service: false,
        }
    }

    pub fn write_priority(&mut self, priority: u8, value: Option<Vec<bool>>) -> Result<()> {
        if let Some(bits) = &value {
            if bits.len() != self.priority_array.relinquish_default.len() {
                return Err(ObjectError::InvalidValue(
                    "bit string length must match the object's configured width".into(),
                ));
            }
        }
        self.priority_array.write(priority, value)
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::new(false, false, false, self.out_of_service)
    }
}

impl BacnetObject for BitstringValue {
    fn identifier(&self) -> ObjectIdentifier {
        self.identifier
    }

    fn get_property(&self, property: PropertyIdentifier) -> Result<PropertyValue> {
        match property {
            PropertyIdentifier::ObjectIdentifier => {
                Ok(PropertyValue::ObjectIdentifier(self.identifier))
            }
            PropertyIdentifier::ObjectName => {
                Ok(PropertyValue::CharacterString(self.object_name.clone()))
            }
            PropertyIdentifier::ObjectType => {
                Ok(PropertyValue::Enumerated(ObjectType::BitstringValue as u32))
            }
            PropertyIdentifier::Description => {
                Ok(PropertyValue::CharacterString(self.description.clone()))
            }
            PropertyIdentifier::PresentValue => {
                Ok(PropertyValue::BitString(self.priority_array.present_value()))
            }
            PropertyIdentifier::PriorityArray => {
                let array: Vec<PropertyValue> = self
                    .priority_array
                    .to_vec()
                    .into_iter()
                    .map(|v| v.map(PropertyValue::BitString).unwrap_or(PropertyValue::Null))
                    .collect();
                Ok(PropertyValue::Array(array))
            }
            PropertyIdentifier::RelinquishDefault => Ok(PropertyValue::BitString(
                self.priority_array.relinquish_default.clone(),
            )),
            PropertyIdentifier::StatusFlags => {
                Ok(PropertyValue::BitString(self.status_flags().to_bits()))
            }
            PropertyIdentifier::BitText => Ok(PropertyValue::Array(
                self.bit_text.iter().map(|t| PropertyValue::CharacterString(t.clone())).collect(),
            )),
            PropertyIdentifier::OutOfService => Ok(PropertyValue::Boolean(self.out_of_service)),
            _ => Err(ObjectError::UnknownProperty),
        }
    }

    fn set_property(&mut self, property: PropertyIdentifier, value: PropertyValue) -> Result<()> {
        match property {
            PropertyIdentifier::ObjectName => {
                if let PropertyValue::CharacterString(name) = value {
                    self.object_name = name;
                    Ok(())
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            PropertyIdentifier::Description => {
                if let PropertyValue::CharacterString(d) = value {
                    self.description = d;
                    Ok(())
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            PropertyIdentifier::PresentValue => {
                if let PropertyValue::BitString(bits) = value {
                    self.write_priority(16, Some(bits))
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            PropertyIdentifier::OutOfService => {
                if let PropertyValue::Boolean(b) = value {
                    self.out_of_service = b;
                    Ok(())
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            _ => Err(ObjectError::PropertyNotWritable),
        }
    }

    fn set_property_at_priority(
        &mut self,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<()> {
        match property {
            PropertyIdentifier::PresentValue => {
                if let PropertyValue::BitString(bits) = value {
                    self.write_priority(priority.unwrap_or(16), Some(bits))
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            _ => self.set_property(property, value),
        }
    }

    fn is_property_writable(&self, property: PropertyIdentifier) -> bool {
        matches!(
            property,
            PropertyIdentifier::ObjectName
                | PropertyIdentifier::Description
                | PropertyIdentifier::PresentValue
                | PropertyIdentifier::OutOfService
        )
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        vec![
            PropertyIdentifier::ObjectIdentifier,
            PropertyIdentifier::ObjectName,
            PropertyIdentifier::ObjectType,
            PropertyIdentifier::Description,
            PropertyIdentifier::PresentValue,
            PropertyIdentifier::PriorityArray,
            PropertyIdentifier::RelinquishDefault,
            PropertyIdentifier::StatusFlags,
            PropertyIdentifier::BitText,
            PropertyIdentifier::OutOfService,
        ]
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_array_drives_bitstring_present_value() {
        let mut bv = BitstringValue::new(1, "Test Bits".to_string(), 4);
        assert_eq!(bv.priority_array.present_value(), vec![false, false, false, false]);

        bv.write_priority(5, Some(vec![true, false, true, false])).unwrap();
        assert_eq!(bv.priority_array.present_value(), vec![true, false, true, false]);

        bv.write_priority(5, None).unwrap();
        assert_eq!(bv.priority_array.present_value(), vec![false, false, false, false]);
    }

    #[test]
    fn wrong_width_write_rejected() {
        let mut bv = BitstringValue::new(1, "Test Bits".to_string(), 4);
        assert!(bv.write_priority(5, Some(vec![true, false])).is_err());
    }
}
