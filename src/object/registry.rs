//! Object Registry.
//!
//! A keyed store of object instances, indexed by `ObjectIdentifier` and by
//! name, that additionally remembers insertion order — `Object_List` must
//! always begin with the Device object and otherwise enumerate objects in
//! the order they were added. `HashMap::keys()` alone cannot promise that,
//! so this keeps a parallel `Vec<ObjectIdentifier>` alongside the `HashMap`.

#[cfg(feature = "std")]
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Instant,
};

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, collections::BTreeMap as HashMap, string::String, sync::Arc, vec::Vec};

use super::{
    BacnetObject, Device, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier,
    PropertyValue, Result,
};

/// Keyed store of BACnet object instances for one device.
///
/// Iteration (`all_objects`) always yields the Device object first,
/// followed by every other object in the order it was added — addition
/// never renumbers or reorders existing entries, and removal leaves a hole
/// rather than shifting later objects forward.
#[cfg(feature = "std")]
pub struct ObjectRegistry {
    objects: Arc<RwLock<HashMap<ObjectIdentifier, Box<dyn BacnetObject>>>>,
    /// Insertion order, Device object first. Removed identifiers are pruned.
    order: Arc<RwLock<Vec<ObjectIdentifier>>>,
    type_index: Arc<RwLock<HashMap<ObjectType, Vec<ObjectIdentifier>>>>,
    name_index: Arc<RwLock<HashMap<String, ObjectIdentifier>>>,
    revision: Arc<RwLock<u32>>,
    last_modified: Arc<RwLock<Instant>>,
    device_id: ObjectIdentifier,
    /// Per-object Change-of-Value flag: set whenever a write
    /// lands on a COV-reportable property, cleared once the external COV
    /// subscription subsystem drains it via `take_cov_increment_pending`.
    cov_pending: Arc<RwLock<HashMap<ObjectIdentifier, bool>>>,
}

#[cfg(feature = "std")]
impl ObjectRegistry {
    /// Create a new registry seeded with the mandatory Device object.
    pub fn new(device: Device) -> Self {
        let device_id = device.identifier();
        let mut objects = HashMap::new();
        let mut type_index = HashMap::new();
        let mut name_index = HashMap::new();

        type_index
            .entry(ObjectType::Device)
            .or_insert_with(Vec::new)
            .push(device_id);
        name_index.insert(device.object_name.clone(), device_id);
        objects.insert(device_id, Box::new(device) as Box<dyn BacnetObject>);

        Self {
            objects: Arc::new(RwLock::new(objects)),
            order: Arc::new(RwLock::new(vec![device_id])),
            type_index: Arc::new(RwLock::new(type_index)),
            name_index: Arc::new(RwLock::new(name_index)),
            revision: Arc::new(RwLock::new(1)),
            last_modified: Arc::new(RwLock::new(Instant::now())),
            device_id,
            cov_pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add an object. Fails if its identifier or name is already taken, or
    /// if registry capacity is exceeded — unbounded here, since the host
    /// embeds no fixed object-table size; callers enforcing
    /// a capacity should check `object_count()` before calling this.
    pub fn add_object(&self, object: Box<dyn BacnetObject>) -> Result<()> {
        let identifier = object.identifier();

        {
            let objects = self.objects.read().unwrap();
            if objects.contains_key(&identifier) {
                return Err(ObjectError::InvalidConfiguration(format!(
                    "object {:?} instance {} already exists",
                    identifier.object_type, identifier.instance
                )));
            }
        }

        let object_name = match object.get_property(PropertyIdentifier::ObjectName)? {
            PropertyValue::CharacterString(name) => name,
            _ => return Err(ObjectError::InvalidPropertyType),
        };

        {
            let name_index = self.name_index.read().unwrap();
            if name_index.contains_key(&object_name) {
                return Err(ObjectError::InvalidConfiguration(format!(
                    "object name {:?} already in use",
                    object_name
                )));
            }
        }

        {
            let mut objects = self.objects.write().unwrap();
            let mut type_index = self.type_index.write().unwrap();
            let mut name_index = self.name_index.write().unwrap();
            let mut order = self.order.write().unwrap();

            type_index.entry(identifier.object_type).or_default().push(identifier);
            name_index.insert(object_name, identifier);
            order.push(identifier);
            objects.insert(identifier, object);
            self.cov_pending.write().unwrap().insert(identifier, false);

            self.increment_revision();
        }

        Ok(())
    }

    /// Remove an object. The Device object cannot be removed. Removal does
    /// not renumber or reorder the remaining objects.
    pub fn remove_object(&self, identifier: ObjectIdentifier) -> Result<()> {
        if identifier == self.device_id {
            return Err(ObjectError::WriteAccessDenied);
        }

        let object_name = {
            let objects = self.objects.read().unwrap();
            match objects.get(&identifier) {
                Some(obj) => match obj.get_property(PropertyIdentifier::ObjectName)? {
                    PropertyValue::CharacterString(name) => name,
                    _ => return Err(ObjectError::InvalidPropertyType),
                },
                None => return Err(ObjectError::NotFound),
            }
        };

        {
            let mut objects = self.objects.write().unwrap();
            let mut type_index = self.type_index.write().unwrap();
            let mut name_index = self.name_index.write().unwrap();
            let mut order = self.order.write().unwrap();

            objects.remove(&identifier);
            if let Some(list) = type_index.get_mut(&identifier.object_type) {
                list.retain(|&id| id != identifier);
            }
            name_index.remove(&object_name);
            order.retain(|&id| id != identifier);
            self.cov_pending.write().unwrap().remove(&identifier);

            self.increment_revision();
        }

        Ok(())
    }

    /// Read a property: `UnknownObject` if `identifier`
    /// doesn't resolve, otherwise delegated to the object's own dispatch.
    pub fn get_property(
        &self,
        identifier: ObjectIdentifier,
        property: PropertyIdentifier,
    ) -> Result<PropertyValue> {
        let objects = self.objects.read().unwrap();
        match objects.get(&identifier) {
            Some(obj) => obj.get_property(property),
            None => Err(ObjectError::NotFound),
        }
    }

    /// Write a property. Bumps `Database_Revision` only when the write
    /// actually lands — relaxed to any successful write since property
    /// engine callers distinguish schema-relevant writes separately.
    pub fn set_property(
        &self,
        identifier: ObjectIdentifier,
        property: PropertyIdentifier,
        value: PropertyValue,
    ) -> Result<()> {
        let mut objects = self.objects.write().unwrap();
        match objects.get_mut(&identifier) {
            Some(obj) => {
                let result = obj.set_property(property, value);
                if result.is_ok() {
                    self.increment_revision();
                    self.mark_cov_pending(identifier, property);
                }
                result
            }
            None => Err(ObjectError::NotFound),
        }
    }

    /// Write a property at an explicit commandable priority.
    /// Bumps `Database_Revision` on success, same as `set_property`.
    pub fn set_property_at_priority(
        &self,
        identifier: ObjectIdentifier,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<()> {
        let mut objects = self.objects.write().unwrap();
        match objects.get_mut(&identifier) {
            Some(obj) => {
                let result = obj.set_property_at_priority(property, value, priority);
                if result.is_ok() {
                    self.increment_revision();
                    self.mark_cov_pending(identifier, property);
                }
                result
            }
            None => Err(ObjectError::NotFound),
        }
    }

    fn mark_cov_pending(&self, identifier: ObjectIdentifier, property: PropertyIdentifier) {
        if crate::property::is_cov_reportable(identifier.object_type, property) {
            if let Some(flag) = self.cov_pending.write().unwrap().get_mut(&identifier) {
                *flag = true;
            }
        }
    }

    /// Read and clear `identifier`'s Change-of-Value flag in one step — the
    /// hand-off point for an external COV subscription subsystem to pick up
    /// a pending notification without racing a concurrent write that
    /// arrives between a separate read and clear.
    pub fn take_cov_increment_pending(&self, identifier: ObjectIdentifier) -> bool {
        match self.cov_pending.write().unwrap().get_mut(&identifier) {
            Some(flag) => core::mem::replace(flag, false),
            None => false,
        }
    }

    /// Peek `identifier`'s Change-of-Value flag without clearing it.
    pub fn cov_increment_pending(&self, identifier: ObjectIdentifier) -> bool {
        self.cov_pending.read().unwrap().get(&identifier).copied().unwrap_or(false)
    }

    /// Run a closure against an object's concrete type, for callers (the
    /// commandable/lighting/schedule/load-control subsystems) that need more
    /// than the `BacnetObject` trait's get/set-property surface. Returns
    /// `None` if the identifier doesn't resolve or doesn't downcast to `T`.
    pub fn with_object_mut<T: 'static, R>(
        &self,
        identifier: ObjectIdentifier,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut objects = self.objects.write().unwrap();
        let obj = objects.get_mut(&identifier)?;
        let any = obj.as_any_mut();
        any.downcast_mut::<T>().map(f)
    }

    pub fn get_object_by_name(&self, name: &str) -> Result<ObjectIdentifier> {
        let name_index = self.name_index.read().unwrap();
        name_index.get(name).copied().ok_or(ObjectError::NotFound)
    }

    pub fn get_objects_by_type(&self, object_type: ObjectType) -> Vec<ObjectIdentifier> {
        let type_index = self.type_index.read().unwrap();
        type_index.get(&object_type).cloned().unwrap_or_default()
    }

    /// `Object_List`: Device object first, then every other object in
    /// insertion order.
    pub fn all_objects(&self) -> Vec<ObjectIdentifier> {
        self.order.read().unwrap().clone()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn object_count_by_type(&self, object_type: ObjectType) -> usize {
        self.type_index
            .read()
            .unwrap()
            .get(&object_type)
            .map(|l| l.len())
            .unwrap_or(0)
    }

    pub fn device_id(&self) -> ObjectIdentifier {
        self.device_id
    }

    pub fn revision(&self) -> u32 {
        *self.revision.read().unwrap()
    }

    pub fn last_modified(&self) -> Instant {
        *self.last_modified.read().unwrap()
    }

    pub fn contains(&self, identifier: ObjectIdentifier) -> bool {
        self.objects.read().unwrap().contains_key(&identifier)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.name_index.read().unwrap().contains_key(name)
    }

    /// Smallest unused instance number for `object_type`, for CreateObject
    /// callers that want the next free slot rather than an explicit one.
    pub fn next_instance(&self, object_type: ObjectType) -> u32 {
        let type_index = self.type_index.read().unwrap();
        match type_index.get(&object_type) {
            Some(objects) => objects.iter().map(|id| id.instance).max().map_or(0, |m| m + 1),
            None => 0,
        }
    }

    fn increment_revision(&self) {
        let mut revision = self.revision.write().unwrap();
        *revision = revision.wrapping_add(1);
        *self.last_modified.write().unwrap() = Instant::now();
    }
}

/// Builder for convenient registry setup at device boot, where objects
/// are created from a configuration table.
#[cfg(feature = "std")]
#[derive(Default)]
pub struct RegistryBuilder {
    device: Option<Device>,
    objects: Vec<Box<dyn BacnetObject>>,
}

#[cfg(feature = "std")]
impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn add_object(mut self, object: Box<dyn BacnetObject>) -> Self {
        self.objects.push(object);
        self
    }

    pub fn build(self) -> Result<ObjectRegistry> {
        let device = self
            .device
            .ok_or_else(|| ObjectError::InvalidConfiguration("device object is required".into()))?;
        let registry = ObjectRegistry::new(device);
        for object in self.objects {
            registry.add_object(object)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::analog::{AnalogInput, AnalogValue};

    #[test]
    fn object_list_always_starts_with_device() {
        let device = Device::new(1, "Test Device".to_string());
        let reg = ObjectRegistry::new(device);
        reg.add_object(Box::new(AnalogInput::new(1, "AI1".to_string()))).unwrap();
        reg.add_object(Box::new(AnalogInput::new(2, "AI2".to_string()))).unwrap();

        let list = reg.all_objects();
        assert_eq!(list[0], reg.device_id());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn insertion_order_is_preserved_after_removal() {
        let device = Device::new(1, "Test Device".to_string());
        let reg = ObjectRegistry::new(device);
        let ai1 = AnalogInput::new(1, "AI1".to_string()).identifier();
        let ai2 = AnalogInput::new(2, "AI2".to_string()).identifier();
        reg.add_object(Box::new(AnalogInput::new(1, "AI1".to_string()))).unwrap();
        reg.add_object(Box::new(AnalogInput::new(2, "AI2".to_string()))).unwrap();
        reg.add_object(Box::new(AnalogInput::new(3, "AI3".to_string()))).unwrap();

        reg.remove_object(ai1).unwrap();
        let list = reg.all_objects();
        assert_eq!(list[1], ai2);
        assert!(!list.contains(&ai1));
    }

    #[test]
    fn duplicate_name_rejected() {
        let device = Device::new(1, "Test Device".to_string());
        let reg = ObjectRegistry::new(device);
        reg.add_object(Box::new(AnalogInput::new(1, "Shared".to_string()))).unwrap();
        let err = reg.add_object(Box::new(AnalogValue::new(1, "Shared".to_string())));
        assert!(err.is_err());
    }

    #[test]
    fn present_value_write_flips_cov_pending() {
        let device = Device::new(1, "Test Device".to_string());
        let reg = ObjectRegistry::new(device);
        let ai_id = AnalogInput::new(1, "AI1".to_string()).identifier();
        reg.add_object(Box::new(AnalogInput::new(1, "AI1".to_string()))).unwrap();

        assert!(!reg.cov_increment_pending(ai_id));
        reg.set_property(ai_id, PropertyIdentifier::OutOfService, PropertyValue::Boolean(true))
            .unwrap();
        assert!(!reg.cov_increment_pending(ai_id), "Out_Of_Service is not COV-reportable");

        let av = AnalogValue::new(1, "AV1".to_string());
        let av_id = av.identifier();
        reg.add_object(Box::new(av)).unwrap();
        reg.set_property(av_id, PropertyIdentifier::PresentValue, PropertyValue::Real(42.0))
            .unwrap();
        assert!(reg.take_cov_increment_pending(av_id));
        assert!(!reg.take_cov_increment_pending(av_id), "flag clears after being taken");
    }

    #[test]
    fn unknown_object_surfaces_not_found() {
        let device = Device::new(1, "Test Device".to_string());
        let reg = ObjectRegistry::new(device);
        let missing = ObjectIdentifier::new(ObjectType::AnalogInput, 99);
        assert!(matches!(
            reg.get_property(missing, PropertyIdentifier::PresentValue),
            Err(ObjectError::NotFound)
        ));
    }
}
