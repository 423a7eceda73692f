//! Structured View object.
//!
//! A pure navigation node with no Present_Value, holding an ordered
//! `Subordinate_List` of property references plus a `Node_Type` and
//! `Default_Subordinate_Relationship` describing how to interpret children
//! that don't carry their own relationship tag.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::encoding::composite::DeviceObjectPropertyReference;
use crate::object::{
    BacnetObject, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyValue,
    Result,
};

/// `BACnetNodeType` (clause 12.53's structured-view enumeration) — the
/// subset actually used by generated views; proprietary values pass through
/// the registry layer as their raw discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NodeType {
    Unknown = 0,
    System = 1,
    Subsystem = 2,
    Equipment = 3,
    Point = 4,
    Collection = 5,
    Property = 6,
    Functional = 7,
    Other = 8,
}

#[derive(Debug, Clone)]
pub struct StructuredView {
    pub identifier: ObjectIdentifier,
    pub object_name: String,
    pub description: String,
    pub node_type: NodeType,
    pub default_subordinate_relationship: u32,
    pub subordinate_list: Vec<DeviceObjectPropertyReference>,
}

impl StructuredView {
    pub fn new(instance: u32, object_name: String, node_type: NodeType) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::StructuredView, instance),
            object_name,
            description: String::new(),
            node_type,
            default_subordinate_relationship: 0,
            subordinate_list: Vec::new(),
        }
    }

    pub fn add_subordinate(&mut self, reference: DeviceObjectPropertyReference) {
        self.subordinate_list.push(reference);
    }
}

impl BacnetObject for StructuredView {
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
                Ok(PropertyValue::Enumerated(ObjectType::StructuredView as u32))
            }
            PropertyIdentifier::Description => {
                Ok(PropertyValue::CharacterString(self.description.clone()))
            }
            PropertyIdentifier::NodeType => Ok(PropertyValue::Enumerated(self.node_type as u32)),
            PropertyIdentifier::DefaultSubordinateRelationship => {
                Ok(PropertyValue::Enumerated(self.default_subordinate_relationship))
            }
            PropertyIdentifier::SubordinateList => Ok(PropertyValue::List(
                self.subordinate_list
                    .iter()
                    .filter_map(|r| {
                        ObjectType::try_from(r.object_identifier.object_type)
                            .ok()
                            .map(|object_type| {
                                PropertyValue::ObjectIdentifier(ObjectIdentifier::new(
                                    object_type,
                                    r.object_identifier.instance,
                                ))
                            })
                    })
                    .collect(),
            )),
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
            _ => Err(ObjectError::PropertyNotWritable),
        }
    }

    fn is_property_writable(&self, property: PropertyIdentifier) -> bool {
        matches!(property, PropertyIdentifier::ObjectName | PropertyIdentifier::Description)
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        vec![
            PropertyIdentifier::ObjectIdentifier,
            PropertyIdentifier::ObjectName,
            PropertyIdentifier::ObjectType,
            PropertyIdentifier::Description,
            PropertyIdentifier::NodeType,
            PropertyIdentifier::DefaultSubordinateRelationship,
            PropertyIdentifier::SubordinateList,
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
    fn subordinate_list_preserves_insertion_order() {
        let mut view = StructuredView::new(1, "Floor 3".to_string(), NodeType::Equipment);
        for instance in [10, 20, 30] {
            view.add_subordinate(DeviceObjectPropertyReference {
                object_identifier: crate::encoding::ObjectIdentifier::new(0, instance),
                property_identifier: PropertyIdentifier::PresentValue as u32,
                array_index: None,
                device_identifier: None,
            });
        }
        let PropertyValue::List(items) = view.get_property(PropertyIdentifier::SubordinateList).unwrap() else {
            panic!("expected List");
        };
        assert_eq!(items.len(), 3);
    }
}
