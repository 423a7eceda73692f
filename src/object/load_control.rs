//! Load Control object and demand-response shed state machine.
//!
//! A shed request moves the object from `Inactive` to `RequestPending` at
//! `Start_Time`, then to `Compliant` once `Actual_Shed_Level` reaches
//! `Expected_Shed_Level` within `Shed_Duration`, or `NonCompliant` if the
//! duration elapses first. `Duty_Window` governs how long compliance must
//! hold before `Full_Duty_Baseline` recording resumes.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::object::{
    BacnetObject, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyValue,
    Result, StatusFlags,
};

/// `BACnetShedLevel` (clause 12.29): one of three ways to express a shed
/// target — only one variant is meaningful at a time, mirroring the
/// original's tagged union.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShedLevel {
    Percent(u32),
    Level(u32),
    Amount(f32),
}

impl Default for ShedLevel {
    fn default() -> Self {
        ShedLevel::Percent(0)
    }
}

/// `Requested_Shed_Level` plus the timing envelope of one shed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShedRequest {
    pub requested_level: ShedLevel,
    pub start_time_seconds: u32,
    pub shed_duration_seconds: u32,
    pub duty_window_seconds: u32,
}

/// Shed state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ShedState {
    Inactive = 0,
    RequestPending = 1,
    Compliant = 2,
    NonCompliant = 3,
}

#[derive(Debug, Clone)]
pub struct LoadControlObject {
    pub identifier: ObjectIdentifier,
    pub object_name: String,
    pub description: String,
    pub present_value: ShedState,
    pub requested_shed_level: ShedLevel,
    pub start_time_seconds: u32,
    pub shed_duration_seconds: u32,
    pub duty_window_seconds: u32,
    pub expected_shed_level: ShedLevel,
    pub actual_shed_level: ShedLevel,
    pub full_duty_baseline: f32,
    pub shed_levels: Vec<u32>,
    pub shed_level_descriptions: Vec<String>,
    /// The `AnalogOutput` (or other commandable object) this load control
    /// actually sheds. `None` means this object only tracks compliance and
    /// never drives equipment itself.
    pub controlled_object: Option<ObjectIdentifier>,
    pending_output_write: Option<(ObjectIdentifier, PropertyValue)>,
    elapsed_seconds: u32,
}

impl LoadControlObject {
    pub fn new(instance: u32, object_name: String) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::LoadControl, instance),
            object_name,
            description: String::new(),
            present_value: ShedState::Inactive,
            requested_shed_level: ShedLevel::default(),
            start_time_seconds: 0,
            shed_duration_seconds: 0,
            duty_window_seconds: 0,
            expected_shed_level: ShedLevel::default(),
            actual_shed_level: ShedLevel::default(),
            full_duty_baseline: 0.0,
            shed_levels: Vec::new(),
            shed_level_descriptions: Vec::new(),
            controlled_object: None,
            pending_output_write: None,
            elapsed_seconds: 0,
        }
    }

    /// Name the `AnalogOutput` this load control object sheds. A
    /// `Compliant` transition writes `Expected_Shed_Level` to it at
    /// priority 4.
    pub fn with_controlled_object(mut self, object_identifier: ObjectIdentifier) -> Self {
        self.controlled_object = Some(object_identifier);
        self
    }

    /// Start a new shed request (a `WriteProperty` of `Requested_Shed_Level`
    /// with non-zero `Shed_Duration`). Moves the object to `RequestPending` immediately;
    /// `tick` carries it on to `Compliant`/`NonCompliant`.
    pub fn start_shed_request(&mut self, request: ShedRequest) {
        self.requested_shed_level = request.requested_level;
        self.expected_shed_level = request.requested_level;
        self.start_time_seconds = request.start_time_seconds;
        self.shed_duration_seconds = request.shed_duration_seconds;
        self.duty_window_seconds = request.duty_window_seconds;
        self.elapsed_seconds = 0;
        self.present_value = ShedState::RequestPending;
    }

    /// Report the controlled load's actual level (from the driven
    /// `AnalogOutput`/equipment reading). If it already meets the expected
    /// level while still pending, the object becomes `Compliant`.
    pub fn report_actual_level(&mut self, level: ShedLevel) {
        self.actual_shed_level = level;
        if self.present_value == ShedState::RequestPending && level == self.expected_shed_level {
            self.present_value = ShedState::Compliant;
            if let Some(controlled) = self.controlled_object {
                self.pending_output_write =
                    Some((controlled, Self::shed_level_to_property(self.expected_shed_level)));
            }
        }
    }

    /// Take the priority-4 write this object queued for `controlled_object`
    /// on its last `Compliant` transition, if any. A host stack drains this
    /// once per tick and applies it through the property engine; this
    /// object never touches the registry itself.
    pub fn take_pending_output_write(&mut self) -> Option<(ObjectIdentifier, PropertyValue)> {
        self.pending_output_write.take()
    }

    /// Advance the shed timers by `elapsed_seconds`. If still
    /// `RequestPending` once `Shed_Duration` has elapsed without matching
    /// the expected level, the request fails as `NonCompliant`. A
    /// `Compliant` request reverts to `Inactive` once the duty window ends.
    pub fn tick(&mut self, elapsed_seconds: u32) {
        if matches!(self.present_value, ShedState::Inactive) {
            return;
        }
        self.elapsed_seconds += elapsed_seconds;

        match self.present_value {
            ShedState::RequestPending => {
                if self.elapsed_seconds >= self.shed_duration_seconds {
                    self.present_value = ShedState::NonCompliant;
                }
            }
            ShedState::Compliant => {
                if self.elapsed_seconds >= self.shed_duration_seconds + self.duty_window_seconds {
                    self.present_value = ShedState::Inactive;
                }
            }
            ShedState::NonCompliant | ShedState::Inactive => {}
        }
    }

    /// `Status_Flags`: `IN_ALARM` reflects a failed shed (the one condition
    /// a demand-response client needs surfaced without polling `Present_Value`).
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::new(self.present_value == ShedState::NonCompliant, false, false, false)
    }

    fn shed_level_to_property(level: ShedLevel) -> PropertyValue {
        match level {
            ShedLevel::Percent(p) => PropertyValue::UnsignedInteger(p),
            ShedLevel::Level(l) => PropertyValue::UnsignedInteger(l),
            ShedLevel::Amount(a) => PropertyValue::Real(a),
        }
    }
}

impl BacnetObject for LoadControlObject {
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
                Ok(PropertyValue::Enumerated(ObjectType::LoadControl as u32))
            }
            PropertyIdentifier::Description => {
                Ok(PropertyValue::CharacterString(self.description.clone()))
            }
            PropertyIdentifier::PresentValue => {
                Ok(PropertyValue::Enumerated(self.present_value as u32))
            }
            PropertyIdentifier::StatusFlags => {
                Ok(PropertyValue::BitString(self.status_flags().to_bits()))
            }
            PropertyIdentifier::RequestedShedLevel => {
                Ok(Self::shed_level_to_property(self.requested_shed_level))
            }
            PropertyIdentifier::StartTime => {
                Ok(PropertyValue::UnsignedInteger(self.start_time_seconds))
            }
            PropertyIdentifier::ShedDuration => {
                Ok(PropertyValue::UnsignedInteger(self.shed_duration_seconds))
            }
            PropertyIdentifier::DutyWindow => {
                Ok(PropertyValue::UnsignedInteger(self.duty_window_seconds))
            }
            PropertyIdentifier::ExpectedShedLevel => {
                Ok(Self::shed_level_to_property(self.expected_shed_level))
            }
            PropertyIdentifier::ActualShedLevel => {
                Ok(Self::shed_level_to_property(self.actual_shed_level))
            }
            PropertyIdentifier::FullDutyBaseline => {
                Ok(PropertyValue::Real(self.full_duty_baseline))
            }
            PropertyIdentifier::ShedLevels => Ok(PropertyValue::Array(
                self.shed_levels.iter().map(|l| PropertyValue::UnsignedInteger(*l)).collect(),
            )),
            PropertyIdentifier::ShedLevelDescriptions => Ok(PropertyValue::Array(
                self.shed_level_descriptions
                    .iter()
                    .map(|d| PropertyValue::CharacterString(d.clone()))
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
            PropertyIdentifier::RequestedShedLevel => {
                let level = match value {
                    PropertyValue::UnsignedInteger(u) => ShedLevel::Percent(u),
                    PropertyValue::Real(r) => ShedLevel::Amount(r),
                    _ => return Err(ObjectError::InvalidPropertyType),
                };
                self.start_shed_request(ShedRequest {
                    requested_level: level,
                    start_time_seconds: self.start_time_seconds,
                    shed_duration_seconds: self.shed_duration_seconds,
                    duty_window_seconds: self.duty_window_seconds,
                });
                Ok(())
            }
            PropertyIdentifier::ShedDuration => {
                if let PropertyValue::UnsignedInteger(u) = value {
                    self.shed_duration_seconds = u;
                    Ok(())
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            PropertyIdentifier::DutyWindow => {
                if let PropertyValue::UnsignedInteger(u) = value {
                    self.duty_window_seconds = u;
                    Ok(())
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            _ => Err(ObjectError::PropertyNotWritable),
        }
    }

    fn is_property_writable(&self, property: PropertyIdentifier) -> bool {
        matches!(
            property,
            PropertyIdentifier::ObjectName
                | PropertyIdentifier::Description
                | PropertyIdentifier::RequestedShedLevel
                | PropertyIdentifier::ShedDuration
                | PropertyIdentifier::DutyWindow
        )
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        vec![
            PropertyIdentifier::ObjectIdentifier,
            PropertyIdentifier::ObjectName,
            PropertyIdentifier::ObjectType,
            PropertyIdentifier::PresentValue,
            PropertyIdentifier::StatusFlags,
            PropertyIdentifier::RequestedShedLevel,
            PropertyIdentifier::StartTime,
            PropertyIdentifier::ShedDuration,
            PropertyIdentifier::DutyWindow,
            PropertyIdentifier::ExpectedShedLevel,
            PropertyIdentifier::ActualShedLevel,
            PropertyIdentifier::FullDutyBaseline,
            PropertyIdentifier::ShedLevels,
            PropertyIdentifier::ShedLevelDescriptions,
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
    fn shed_request_becomes_compliant_when_level_matches() {
        let mut lc = LoadControlObject::new(1, "Shed Test".to_string());
        lc.start_shed_request(ShedRequest {
            requested_level: ShedLevel::Percent(20),
            start_time_seconds: 0,
            shed_duration_seconds: 3600,
            duty_window_seconds: 600,
        });
        assert_eq!(lc.present_value, ShedState::RequestPending);

        lc.report_actual_level(ShedLevel::Percent(20));
        assert_eq!(lc.present_value, ShedState::Compliant);
    }

    #[test]
    fn shed_request_times_out_to_non_compliant() {
        let mut lc = LoadControlObject::new(1, "Timeout Test".to_string());
        lc.start_shed_request(ShedRequest {
            requested_level: ShedLevel::Percent(20),
            start_time_seconds: 0,
            shed_duration_seconds: 100,
            duty_window_seconds: 0,
        });
        lc.tick(150);
        assert_eq!(lc.present_value, ShedState::NonCompliant);
    }

    #[test]
    fn compliant_reverts_to_inactive_after_duty_window() {
        let mut lc = LoadControlObject::new(1, "Duty Window Test".to_string());
        lc.start_shed_request(ShedRequest {
            requested_level: ShedLevel::Percent(20),
            start_time_seconds: 0,
            shed_duration_seconds: 100,
            duty_window_seconds: 50,
        });
        lc.report_actual_level(ShedLevel::Percent(20));
        assert_eq!(lc.present_value, ShedState::Compliant);

        lc.tick(200);
        assert_eq!(lc.present_value, ShedState::Inactive);
    }
}
