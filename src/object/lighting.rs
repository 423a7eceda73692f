//! Lighting Output object and control law.
//!
//! Tracks a `BACNET_LIGHTING_COMMAND_DATA`-shaped state: tracking value,
//! target level, ramp rate, step increment, fade time, min/max actual value,
//! high/low trim, the override flags, and the blink-warn on/off/end values
//! plus interval and count. Values are clamped min/max first, then
//! high/low trim.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::object::commandable::PriorityArray;
use crate::object::{
    BacnetObject, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyValue,
    Result, StatusFlags,
};

/// One lighting-command write (clause 12.53's `BACnetLightingCommand`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightingOperation {
    FadeTo { target: f32, fade_time_ms: u32 },
    RampTo { target: f32, ramp_rate_pct_per_s: f32 },
    StepUp,
    StepDown,
    StepOn,
    StepOff,
    Warn,
    WarnOff,
    WarnRelinquish,
    Stop,
    RestoreOn,
    DefaultOn,
    ToggleRestore,
    ToggleDefault,
    None,
}

/// The decoded `Lighting_Command` write: an operation plus the optional
/// priority and step-increment overrides the standard allows alongside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingCommand {
    pub operation: LightingOperation,
    pub priority: Option<u8>,
    pub step_increment: Option<f32>,
}

/// Control-law state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingState {
    Idle,
    Fade,
    Ramp,
    StepPending,
    BlinkWarn,
    Stopping,
    Overridden,
}

/// `In_Progress` (clause 12.53): what the control law is presently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LightingInProgress {
    Idle = 0,
    FadeActive = 1,
    RampActive = 2,
    NotControlled = 3,
    Other = 4,
    TrimActive = 5,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BlinkWarnRun {
    on_value: f32,
    off_value: f32,
    end_value: f32,
    interval_ms: u32,
    elapsed_ms: u32,
    duration_ms: u32,
    relinquish_on_end: bool,
}

/// Lighting Output object.
#[derive(Debug, Clone)]
pub struct LightingOutput {
    pub identifier: ObjectIdentifier,
    pub object_name: String,
    pub description: String,
    /// Commandable priority array driving `Target_Level`.
    pub priority_array: PriorityArray<f32>,
    /// The value actually being driven to the load right now — distinct
    /// from `Present_Value` while a fade/ramp/blink-warn is in progress.
    pub tracking_value: f32,
    state: LightingState,
    target: f32,
    fade_remaining_ms: u32,
    fade_total_ms: u32,
    fade_start_value: f32,
    ramp_rate_pct_per_s: f32,
    pub default_ramp_rate: f32,
    pub default_step_increment: f32,
    pub min_actual_value: f32,
    pub max_actual_value: f32,
    pub high_end_trim: f32,
    pub low_end_trim: f32,
    pub overridden: bool,
    overridden_momentary: bool,
    pub out_of_service: bool,
    blink_warn: Option<BlinkWarnRun>,
    /// Color_Reference, if any — an `ObjectIdentifier`, resolved through the
    /// registry on demand rather than held as a pointer.
    pub color_reference: Option<ObjectIdentifier>,
}

impl LightingOutput {
    pub fn new(instance: u32, object_name: String) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::LightingOutput, instance),
            object_name,
            description: String::new(),
            priority_array: PriorityArray::new(0.0),
            tracking_value: 0.0,
            state: LightingState::Idle,
            target: 0.0,
            fade_remaining_ms: 0,
            fade_total_ms: 0,
            fade_start_value: 0.0,
            ramp_rate_pct_per_s: 100.0,
            default_ramp_rate: 100.0,
            default_step_increment: 1.0,
            min_actual_value: 0.0,
            max_actual_value: 100.0,
            high_end_trim: 100.0,
            low_end_trim: 0.0,
            overridden: false,
            overridden_momentary: false,
            out_of_service: false,
            blink_warn: None,
            color_reference: None,
        }
    }

    fn clamp(&self, value: f32) -> f32 {
        let v = value.clamp(self.min_actual_value, self.max_actual_value);
        v.clamp(self.low_end_trim, self.high_end_trim)
    }

    /// Apply an HOA override. `momentary` overrides release on the next
    /// non-`None` command; a non-momentary override holds until `Restore_*`.
    pub fn set_override(&mut self, value: f32, momentary: bool) {
        self.overridden = true;
        self.overridden_momentary = momentary;
        self.tracking_value = self.clamp(value);
        self.state = LightingState::Overridden;
    }

    fn release_momentary_override(&mut self) {
        if self.overridden && self.overridden_momentary {
            self.overridden = false;
            self.overridden_momentary = false;
        }
    }

    /// Apply a lighting command, starting the relevant state
    /// transition. Step operations complete immediately; fade/ramp/blink-warn
    /// progress on subsequent `tick` calls.
    pub fn apply_command(&mut self, command: LightingCommand) -> Result<()> {
        if self.overridden && !matches!(command.operation, LightingOperation::None) {
            self.release_momentary_override();
            if self.overridden {
                return Err(ObjectError::WriteAccessDenied);
            }
        }

        let step = command
            .step_increment
            .unwrap_or(self.default_step_increment)
            .clamp(0.1, 100.0);

        match command.operation {
            LightingOperation::FadeTo { target, fade_time_ms } => {
                self.target = self.clamp(target);
                self.fade_start_value = self.tracking_value;
                self.fade_total_ms = fade_time_ms.max(1);
                self.fade_remaining_ms = self.fade_total_ms;
                self.state = LightingState::Fade;
            }
            LightingOperation::RampTo { target, ramp_rate_pct_per_s } => {
                self.target = self.clamp(target);
                self.ramp_rate_pct_per_s = ramp_rate_pct_per_s.clamp(0.1, 100.0);
                self.state = LightingState::Ramp;
            }
            LightingOperation::StepUp => {
                self.tracking_value = self.clamp(self.tracking_value + step);
                self.state = LightingState::Idle;
            }
            LightingOperation::StepDown => {
                self.tracking_value = self.clamp(self.tracking_value - step);
                self.state = LightingState::Idle;
            }
            LightingOperation::StepOn => {
                if self.tracking_value <= self.min_actual_value {
                    self.tracking_value = self.clamp(self.min_actual_value + step);
                }
                self.state = LightingState::Idle;
            }
            LightingOperation::StepOff => {
                self.tracking_value = self.clamp(self.tracking_value - step);
                if self.tracking_value <= self.min_actual_value {
                    self.tracking_value = self.min_actual_value;
                }
                self.state = LightingState::Idle;
            }
            LightingOperation::Warn => {
                self.blink_warn = Some(BlinkWarnRun {
                    on_value: self.max_actual_value,
                    off_value: self.min_actual_value,
                    end_value: self.tracking_value,
                    interval_ms: 500,
                    elapsed_ms: 0,
                    duration_ms: 5000,
                    relinquish_on_end: false,
                });
                self.state = LightingState::BlinkWarn;
            }
            LightingOperation::WarnOff => {
                if let Some(run) = self.blink_warn.take() {
                    self.tracking_value = run.end_value;
                }
                self.state = LightingState::Idle;
            }
            LightingOperation::WarnRelinquish => {
                if let Some(mut run) = self.blink_warn.take() {
                    run.relinquish_on_end = true;
                    self.tracking_value = self.priority_array.present_value();
                }
                self.state = LightingState::Idle;
            }
            LightingOperation::Stop => {
                self.state = LightingState::Stopping;
                self.blink_warn = None;
            }
            LightingOperation::RestoreOn => {
                self.overridden = false;
                self.overridden_momentary = false;
                self.tracking_value = self.priority_array.present_value();
                self.state = LightingState::Idle;
            }
            LightingOperation::DefaultOn => {
                self.tracking_value = self.clamp(self.max_actual_value);
                self.state = LightingState::Idle;
            }
            LightingOperation::ToggleRestore => {
                self.tracking_value = if self.tracking_value > self.min_actual_value {
                    self.min_actual_value
                } else {
                    self.priority_array.present_value()
                };
                self.state = LightingState::Idle;
            }
            LightingOperation::ToggleDefault => {
                self.tracking_value = if self.tracking_value > self.min_actual_value {
                    self.min_actual_value
                } else {
                    self.max_actual_value
                };
                self.state = LightingState::Idle;
            }
            LightingOperation::None => {}
        }
        Ok(())
    }

    /// Advance fade/ramp/blink-warn state by `elapsed_ms` of wall-clock time.
    /// Pure — no I/O; the caller drains any resulting COV/event output
    /// separately.
    pub fn tick(&mut self, elapsed_ms: u32) {
        match self.state {
            LightingState::Fade => {
                if self.fade_remaining_ms <= elapsed_ms {
                    self.tracking_value = self.target;
                    self.fade_remaining_ms = 0;
                    self.state = LightingState::Idle;
                } else {
                    self.fade_remaining_ms -= elapsed_ms;
                    let progressed = self.fade_total_ms - self.fade_remaining_ms;
                    let frac = progressed as f32 / self.fade_total_ms as f32;
                    self.tracking_value =
                        self.fade_start_value + (self.target - self.fade_start_value) * frac;
                }
            }
            LightingState::Ramp => {
                let delta = self.ramp_rate_pct_per_s * (elapsed_ms as f32 / 1000.0);
                if self.tracking_value < self.target {
                    self.tracking_value = (self.tracking_value + delta).min(self.target);
                } else if self.tracking_value > self.target {
                    self.tracking_value = (self.tracking_value - delta).max(self.target);
                }
                if (self.tracking_value - self.target).abs() < f32::EPSILON {
                    self.state = LightingState::Idle;
                }
            }
            LightingState::BlinkWarn => {
                let finished = if let Some(run) = self.blink_warn.as_mut() {
                    run.elapsed_ms += elapsed_ms;
                    let phase = (run.elapsed_ms / run.interval_ms.max(1)) % 2;
                    self.tracking_value = if phase == 0 { run.on_value } else { run.off_value };
                    run.elapsed_ms >= run.duration_ms
                } else {
                    true
                };
                if finished {
                    if let Some(run) = self.blink_warn.take() {
                        self.tracking_value = if run.relinquish_on_end {
                            self.priority_array.present_value()
                        } else {
                            run.end_value
                        };
                    }
                    self.state = LightingState::Idle;
                }
            }
            LightingState::Stopping => {
                self.state = LightingState::Idle;
            }
            LightingState::Idle | LightingState::StepPending | LightingState::Overridden => {}
        }
    }

    /// `Status_Flags`: `OVERRIDDEN` tracks the HOA override flag directly,
    /// since that is the one condition under which this object's
    /// `Present_Value` cannot be changed through BACnet services.
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::new(false, false, self.overridden, self.out_of_service)
    }

    pub fn in_progress(&self) -> LightingInProgress {
        if self.overridden {
            return LightingInProgress::Other;
        }
        match self.state {
            LightingState::Fade => LightingInProgress::FadeActive,
            LightingState::Ramp => LightingInProgress::RampActive,
            LightingState::Idle => LightingInProgress::Idle,
            LightingState::BlinkWarn | LightingState::Stopping | LightingState::StepPending => {
                LightingInProgress::Other
            }
            LightingState::Overridden => LightingInProgress::NotControlled,
        }
    }

    /// Write to the priority array, same rule as any other commandable
    /// object: the new present value becomes the fade/ramp target via an
    /// implicit `Fade_To`-style transition when not already in the middle
    /// of one.
    pub fn write_priority(&mut self, priority: u8, value: Option<f32>) -> Result<()> {
        self.priority_array.write(priority, value)?;
        if !self.overridden {
            let new_target = self.priority_array.present_value();
            if matches!(self.state, LightingState::Idle) {
                self.tracking_value = self.clamp(new_target);
            } else {
                self.target = self.clamp(new_target);
            }
        }
        Ok(())
    }
}

impl BacnetObject for LightingOutput {
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
                Ok(PropertyValue::Enumerated(ObjectType::LightingOutput as u32))
            }
            PropertyIdentifier::Description => {
                Ok(PropertyValue::CharacterString(self.description.clone()))
            }
            PropertyIdentifier::PresentValue => {
                Ok(PropertyValue::Real(self.priority_array.present_value()))
            }
            PropertyIdentifier::TrackingValue => Ok(PropertyValue::Real(self.tracking_value)),
            PropertyIdentifier::InProgress => {
                Ok(PropertyValue::Enumerated(self.in_progress() as u32))
            }
            PropertyIdentifier::StatusFlags => {
                Ok(PropertyValue::BitString(self.status_flags().to_bits()))
            }
            PropertyIdentifier::OutOfService => Ok(PropertyValue::Boolean(self.out_of_service)),
            PropertyIdentifier::PriorityArray => {
                let array: Vec<PropertyValue> = self
                    .priority_array
                    .to_vec()
                    .into_iter()
                    .map(|v| v.map(PropertyValue::Real).unwrap_or(PropertyValue::Null))
                    .collect();
                Ok(PropertyValue::Array(array))
            }
            PropertyIdentifier::RelinquishDefault => {
                Ok(PropertyValue::Real(self.priority_array.relinquish_default))
            }
            PropertyIdentifier::MinActualValue => Ok(PropertyValue::Real(self.min_actual_value)),
            PropertyIdentifier::MaxActualValue => Ok(PropertyValue::Real(self.max_actual_value)),
            PropertyIdentifier::DefaultRampRate => Ok(PropertyValue::Real(self.default_ramp_rate)),
            PropertyIdentifier::DefaultStepIncrement => {
                Ok(PropertyValue::Real(self.default_step_increment))
            }
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
                if let PropertyValue::Real(v) = value {
                    self.write_priority(16, Some(v))
                } else {
                    Err(ObjectError::InvalidPropertyType)
                }
            }
            PropertyIdentifier::OutOfService => {
                if let PropertyValue::Boolean(oos) = value {
                    self.out_of_service = oos;
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
                if let PropertyValue::Real(v) = value {
                    self.write_priority(priority.unwrap_or(16), Some(v))
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
            PropertyIdentifier::PresentValue,
            PropertyIdentifier::TrackingValue,
            PropertyIdentifier::InProgress,
            PropertyIdentifier::StatusFlags,
            PropertyIdentifier::OutOfService,
            PropertyIdentifier::PriorityArray,
            PropertyIdentifier::RelinquishDefault,
            PropertyIdentifier::MinActualValue,
            PropertyIdentifier::MaxActualValue,
            PropertyIdentifier::DefaultRampRate,
            PropertyIdentifier::DefaultStepIncrement,
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
    fn fade_interpolates_linearly_and_lands_exactly() {
        // tracking-value 0.0, Fade_To(50.0, 1000ms).
        let mut lo = LightingOutput::new(1, "Fade Test".to_string());
        lo.apply_command(LightingCommand {
            operation: LightingOperation::FadeTo { target: 50.0, fade_time_ms: 1000 },
            priority: None,
            step_increment: None,
        })
        .unwrap();

        lo.tick(500);
        assert!((lo.tracking_value - 25.0).abs() <= 1.0);
        assert_eq!(lo.in_progress(), LightingInProgress::FadeActive);

        lo.tick(500);
        assert_eq!(lo.tracking_value, 50.0);
        assert_eq!(lo.in_progress(), LightingInProgress::Idle);
    }

    #[test]
    fn ramp_respects_rate_clamp() {
        let mut lo = LightingOutput::new(1, "Ramp Test".to_string());
        lo.apply_command(LightingCommand {
            operation: LightingOperation::RampTo { target: 10.0, ramp_rate_pct_per_s: 500.0 },
            priority: None,
            step_increment: None,
        })
        .unwrap();
        // rate clamped to 100%/s: after 1000ms tracking value should be <= 100
        lo.tick(1000);
        assert!(lo.tracking_value <= 100.0);
    }

    #[test]
    fn step_increment_clamped_and_one_shot() {
        let mut lo = LightingOutput::new(1, "Step Test".to_string());
        lo.tracking_value = 50.0;
        lo.apply_command(LightingCommand {
            operation: LightingOperation::StepUp,
            priority: None,
            step_increment: Some(500.0), // clamped to 100.0
        })
        .unwrap();
        assert_eq!(lo.tracking_value, 100.0); // clamped to max_actual_value too
        assert_eq!(lo.in_progress(), LightingInProgress::Idle);
    }

    #[test]
    fn blink_warn_then_warn_off_restores_end_value() {
        let mut lo = LightingOutput::new(1, "Warn Test".to_string());
        lo.tracking_value = 42.0;
        lo.apply_command(LightingCommand {
            operation: LightingOperation::Warn,
            priority: None,
            step_increment: None,
        })
        .unwrap();
        assert_eq!(lo.state, LightingState::BlinkWarn);
        lo.apply_command(LightingCommand {
            operation: LightingOperation::WarnOff,
            priority: None,
            step_increment: None,
        })
        .unwrap();
        assert_eq!(lo.tracking_value, 42.0);
    }

    #[test]
    fn momentary_override_releases_on_next_command() {
        let mut lo = LightingOutput::new(1, "Override Test".to_string());
        lo.set_override(99.0, true);
        assert_eq!(lo.tracking_value, 99.0);
        lo.apply_command(LightingCommand {
            operation: LightingOperation::StepUp,
            priority: None,
            step_increment: Some(1.0),
        })
        .unwrap();
        assert!(!lo.overridden);
    }
}
