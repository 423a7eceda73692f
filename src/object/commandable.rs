//! Generic 16-priority commandable array (clause 19.2).
//!
//! Every commandable object (`AnalogOutput`, `LightingOutput`,
//! `BitstringValue`, and the load-control-driven `AnalogOutput`) needs the
//! same slot-selection rule: the highest-priority non-null entry wins, or
//! `Relinquish_Default` if all 16 slots are empty. This pulls that logic
//! out once, generic over the slot type, so each object type doesn't
//! reimplement a hand-rolled `[Option<f32>; 16]` of its own.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::object::{ObjectError, Result};

/// Priority 6 is reserved by the standard (minimum on/off) and writes to it
/// must fail with `WriteAccessDenied`.
pub const RESERVED_PRIORITY: u8 = 6;

/// Number of priority slots in every `BACnetPriorityArray`.
pub const PRIORITY_ARRAY_LENGTH: usize = 16;

/// A 16-slot commandable priority array with a relinquish default.
///
/// `T` is the slot's value type — `f32` for analog objects, `Vec<bool>` for
/// `BitstringValue`, a lighting target level for `LightingOutput`.
#[derive(Debug, Clone)]
pub struct PriorityArray<T: Clone> {
    slots: [Option<T>; PRIORITY_ARRAY_LENGTH],
    pub relinquish_default: T,
}

impl<T: Clone> PriorityArray<T> {
    pub fn new(relinquish_default: T) -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            relinquish_default,
        }
    }

    /// Write (or relinquish, if `value` is `None`) the slot at `priority`
    /// (1..=16). Priority 6 is reserved and always rejected.
    pub fn write(&mut self, priority: u8, value: Option<T>) -> Result<()> {
        if !(1..=16).contains(&priority) {
            return Err(ObjectError::InvalidValue(
                "priority must be in 1..=16".into(),
            ));
        }
        if priority == RESERVED_PRIORITY {
            return Err(ObjectError::WriteAccessDenied);
        }
        self.slots[(priority - 1) as usize] = value;
        Ok(())
    }

    /// The effective present value: the highest-priority non-null slot, or
    /// `Relinquish_Default` if every slot is empty.
    pub fn present_value(&self) -> T {
        self.active_slot()
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.relinquish_default.clone())
    }

    /// The priority level (1..=16) currently driving the present value, or
    /// `None` if every slot is relinquished.
    pub fn active_priority(&self) -> Option<u8> {
        self.active_slot().map(|(p, _)| p)
    }

    fn active_slot(&self) -> Option<(u8, &T)> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(i, slot)| slot.as_ref().map(|v| ((i + 1) as u8, v)))
    }

    /// Whether Present_Value can currently be changed through BACnet
    /// services — false exactly when some priority is forcing the value (the
    /// Status_Flags OVERRIDDEN bit tracks the negation of this at the object
    /// level, since an active slot is a normal command, not an override; see
    /// `object::lighting` for the HOA override case, which bypasses this
    /// array entirely).
    pub fn is_relinquished(&self) -> bool {
        self.active_slot().is_none()
    }

    /// Iterate the 16 slots in priority order (1-based).
    pub fn slots(&self) -> impl Iterator<Item = (u8, Option<&T>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| ((i + 1) as u8, v.as_ref()))
    }

    /// Collect the slots into a `Vec<Option<T>>`, e.g. to encode the
    /// `Priority_Array` property as a BACnet array.
    pub fn to_vec(&self) -> Vec<Option<T>> {
        self.slots.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_priority_wins_and_relinquish_falls_through() {
        let mut pa = PriorityArray::new(0.0f32);

        pa.write(5, Some(10.0)).unwrap();
        pa.write(3, Some(20.0)).unwrap();
        assert_eq!(pa.present_value(), 20.0);
        assert_eq!(pa.active_priority(), Some(3));

        pa.write(3, None).unwrap();
        assert_eq!(pa.present_value(), 10.0);
        assert_eq!(pa.active_priority(), Some(5));

        pa.write(5, None).unwrap();
        assert_eq!(pa.present_value(), 0.0);
        assert_eq!(pa.active_priority(), None);
        assert!(pa.is_relinquished());
    }

    #[test]
    fn priority_six_is_reserved() {
        let mut pa = PriorityArray::new(0.0f32);
        assert!(matches!(
            pa.write(6, Some(1.0)),
            Err(ObjectError::WriteAccessDenied)
        ));
    }

    #[test]
    fn priority_array_relinquish_sequence() {
        // After (v1, prio=5); (v2, prio=3);
        // (null, prio=3), PresentValue == v1 at priority 5. After an
        // additional (null, prio=5), PresentValue == Relinquish_Default and
        // active priority is None.
        let mut pa = PriorityArray::new(99.0f32);
        pa.write(5, Some(1.0)).unwrap();
        pa.write(3, Some(2.0)).unwrap();
        pa.write(3, None).unwrap();
        assert_eq!(pa.present_value(), 1.0);
        assert_eq!(pa.active_priority(), Some(5));

        pa.write(5, None).unwrap();
        assert_eq!(pa.present_value(), 99.0);
        assert_eq!(pa.active_priority(), None);
    }

    #[test]
    fn out_of_range_priority_rejected() {
        let mut pa = PriorityArray::new(0.0f32);
        assert!(pa.write(0, Some(1.0)).is_err());
        assert!(pa.write(17, Some(1.0)).is_err());
    }
}
