//! Schedule object and weekly time-value evaluator.
//!
//! Evaluation order: walk `Exception_Schedule` first (most specific wins), then fall back to
//! `Weekly_Schedule` for the current weekday, and if neither produces a
//! value use `Schedule_Default`. `Effective_Period` gates the whole object —
//! outside it, Present_Value is always `Schedule_Default`.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use core::cmp::Ordering;

use crate::encoding::composite::WeeklySchedule;
use crate::encoding::{ApplicationValue, BacnetDate, BacnetTime};
use crate::object::{
    BacnetObject, ObjectError, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyValue,
    Result,
};

fn application_to_property(value: &ApplicationValue) -> PropertyValue {
    match value {
        ApplicationValue::Null => PropertyValue::Null,
        ApplicationValue::Boolean(b) => PropertyValue::Boolean(*b),
        ApplicationValue::Unsigned(u) => PropertyValue::UnsignedInteger(*u),
        ApplicationValue::Signed(i) => PropertyValue::SignedInt(*i),
        ApplicationValue::Real(r) => PropertyValue::Real(*r),
        ApplicationValue::Double(d) => PropertyValue::Double(*d),
        ApplicationValue::OctetString(o) => PropertyValue::OctetString(o.clone()),
        ApplicationValue::CharacterString(s) => PropertyValue::CharacterString(s.clone()),
        ApplicationValue::BitString(bs) => PropertyValue::BitString(bs.bits.clone()),
        ApplicationValue::Enumerated(e) => PropertyValue::Enumerated(*e),
        ApplicationValue::Date(d) => PropertyValue::Date(crate::object::Date {
            year: d.year,
            month: d.month,
            day: d.day,
            weekday: d.weekday,
        }),
        ApplicationValue::Time(t) => PropertyValue::Time(crate::object::Time {
            hour: t.hour,
            minute: t.minute,
            second: t.second,
            hundredths: t.hundredths,
        }),
        ApplicationValue::ObjectIdentifier(_) => PropertyValue::Null,
    }
}

/// One entry of `Exception_Schedule`: a calendar-matched override of the
/// weekly schedule for specific dates, ranked by `event_priority` the way
/// `BACnetSpecialEvent` is (clause 12.24).
#[derive(Debug, Clone)]
pub struct ExceptionScheduleEntry {
    pub dates: Vec<BacnetDate>,
    pub time_values: Vec<(BacnetTime, Option<ApplicationValue>)>,
    pub event_priority: u8,
}

impl ExceptionScheduleEntry {
    fn matches_date(&self, date: BacnetDate) -> bool {
        self.dates.iter().any(|d| date_matches(*d, date))
    }
}

/// Wildcard-aware date match: `BacnetDate::WILD` fields match anything.
fn date_matches(pattern: BacnetDate, actual: BacnetDate) -> bool {
    let year_ok = pattern.year == 0xFFFF || pattern.year == actual.year;
    let month_ok = pattern.month == BacnetDate::WILD || pattern.month == actual.month;
    let day_ok = pattern.day == BacnetDate::WILD || pattern.day == actual.day;
    let weekday_ok = pattern.weekday == BacnetDate::WILD || pattern.weekday == actual.weekday;
    year_ok && month_ok && day_ok && weekday_ok
}

/// Wildcard-aware `(year, month, day)` ordering for `Effective_Period`
/// bounds: a wildcard field (`0xFFFF`/`BacnetDate::WILD`) on either side
/// never decides the comparison, so the next-most-significant field does.
/// Weekday plays no part in `Effective_Period`, per clause 12.24.
fn date_cmp(a: BacnetDate, b: BacnetDate) -> Ordering {
    let year = if a.year == 0xFFFF || b.year == 0xFFFF {
        Ordering::Equal
    } else {
        a.year.cmp(&b.year)
    };
    if year != Ordering::Equal {
        return year;
    }

    let month = if a.month == BacnetDate::WILD || b.month == BacnetDate::WILD {
        Ordering::Equal
    } else {
        a.month.cmp(&b.month)
    };
    if month != Ordering::Equal {
        return month;
    }

    if a.day == BacnetDate::WILD || b.day == BacnetDate::WILD {
        Ordering::Equal
    } else {
        a.day.cmp(&b.day)
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleObject {
    pub identifier: ObjectIdentifier,
    pub object_name: String,
    pub description: String,
    pub present_value: ApplicationValue,
    pub effective_period: (BacnetDate, BacnetDate),
    pub weekly_schedule: WeeklySchedule,
    pub exception_schedule: Vec<ExceptionScheduleEntry>,
    pub schedule_default: ApplicationValue,
    /// Objects/properties driven by this schedule's Present_Value
    /// (`List_Of_Object_Property_References`); resolved through the
    /// registry by the service layer, not stored here as live handles.
    pub list_of_object_property_references: Vec<ObjectIdentifier>,
    pub priority_for_writing: u8,
    pub out_of_service: bool,
}

impl ScheduleObject {
    pub fn new(instance: u32, object_name: String) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::Schedule, instance),
            object_name,
            description: String::new(),
            present_value: ApplicationValue::Null,
            effective_period: (
                BacnetDate { year: 0, month: 1, day: 1, weekday: BacnetDate::WILD },
                BacnetDate { year: 0xFFFF, month: 12, day: 31, weekday: BacnetDate::WILD },
            ),
            weekly_schedule: WeeklySchedule::default(),
            exception_schedule: Vec::new(),
            schedule_default: ApplicationValue::Null,
            list_of_object_property_references: Vec::new(),
            priority_for_writing: 16,
            out_of_service: false,
        }
    }

    /// `Present_Value` converted to the property-engine's value type, for a
    /// host stack propagating a re-evaluated schedule out to
    /// `list_of_object_property_references`.
    pub fn present_value_as_property(&self) -> PropertyValue {
        application_to_property(&self.present_value)
    }

    fn within_effective_period(&self, date: BacnetDate) -> bool {
        let (start, end) = self.effective_period;
        date_cmp(date, start) != Ordering::Less && date_cmp(date, end) != Ordering::Greater
    }

    /// Re-evaluate `Present_Value` for the given weekday (1=Monday..7=Sunday)
    /// and time of day: exceptions (by
    /// descending `event_priority`, first date match wins), then the weekly
    /// schedule for that weekday, then `Schedule_Default`.
    pub fn evaluate(&mut self, date: BacnetDate, time: BacnetTime) {
        if !self.within_effective_period(date) {
            self.present_value = self.schedule_default.clone();
            return;
        }

        let mut exceptions: Vec<&ExceptionScheduleEntry> =
            self.exception_schedule.iter().filter(|e| e.matches_date(date)).collect();
        exceptions.sort_by(|a, b| b.event_priority.cmp(&a.event_priority));

        for exception in exceptions {
            if let Some(value) = Self::value_at_or_before(&exception.time_values, time) {
                self.present_value = value;
                return;
            }
        }

        let weekday_index = (date.weekday.saturating_sub(1)) as usize % 7;
        let day = &self.weekly_schedule.days[weekday_index];
        if let Some(value) = Self::value_at_or_before(&day.entries, time) {
            self.present_value = value;
            return;
        }

        self.present_value = self.schedule_default.clone();
    }

    /// The most recent non-null time-value entry at or before `time` — the
    /// last transition that has already occurred today.
    fn value_at_or_before(
        entries: &[(BacnetTime, Option<ApplicationValue>)],
        time: BacnetTime,
    ) -> Option<ApplicationValue> {
        entries
            .iter()
            .filter(|(t, _)| time_le(*t, time))
            .max_by_key(|(t, _)| (t.hour, t.minute, t.second, t.hundredths))
            .and_then(|(_, v)| v.clone())
    }
}

fn time_le(a: BacnetTime, b: BacnetTime) -> bool {
    (a.hour, a.minute, a.second, a.hundredths) <= (b.hour, b.minute, b.second, b.hundredths)
}

impl BacnetObject for ScheduleObject {
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
                Ok(PropertyValue::Enumerated(ObjectType::Schedule as u32))
            }
            PropertyIdentifier::Description => {
                Ok(PropertyValue::CharacterString(self.description.clone()))
            }
            PropertyIdentifier::PresentValue => Ok(application_to_property(&self.present_value)),
            PropertyIdentifier::ScheduleDefault => {
                Ok(application_to_property(&self.schedule_default))
            }
            PropertyIdentifier::EffectivePeriod => Ok(PropertyValue::List(vec![
                application_to_property(&ApplicationValue::Date(self.effective_period.0)),
                application_to_property(&ApplicationValue::Date(self.effective_period.1)),
            ])),
            PropertyIdentifier::Priority => {
                Ok(PropertyValue::UnsignedInteger(self.priority_for_writing as u32))
            }
            PropertyIdentifier::OutOfService => Ok(PropertyValue::Boolean(self.out_of_service)),
            PropertyIdentifier::ListOfObjectPropertyReferences => Ok(PropertyValue::List(
                self.list_of_object_property_references
                    .iter()
                    .map(|id| PropertyValue::ObjectIdentifier(*id))
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

    fn is_property_writable(&self, property: PropertyIdentifier) -> bool {
        matches!(
            property,
            PropertyIdentifier::ObjectName
                | PropertyIdentifier::Description
                | PropertyIdentifier::OutOfService
        )
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        vec![
            PropertyIdentifier::ObjectIdentifier,
            PropertyIdentifier::ObjectName,
            PropertyIdentifier::ObjectType,
            PropertyIdentifier::PresentValue,
            PropertyIdentifier::ScheduleDefault,
            PropertyIdentifier::EffectivePeriod,
            PropertyIdentifier::Priority,
            PropertyIdentifier::OutOfService,
            PropertyIdentifier::ListOfObjectPropertyReferences,
        ]
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::composite::DailySchedule;

    fn time(h: u8, m: u8) -> BacnetTime {
        BacnetTime::new(h, m, 0, 0)
    }

    #[test]
    fn weekly_schedule_picks_last_transition_before_now() {
        // Monday has 08:00 -> 21.0, 18:00 -> 16.0.
        // At 10:00 present value should be 21.0; at 19:00, 16.0.
        let mut sched = ScheduleObject::new(1, "Evaluator Test".to_string());
        sched.weekly_schedule.days[0] = DailySchedule {
            entries: vec![
                (time(8, 0), Some(ApplicationValue::Real(21.0))),
                (time(18, 0), Some(ApplicationValue::Real(16.0))),
            ],
        };
        sched.schedule_default = ApplicationValue::Real(18.0);

        let monday = BacnetDate { year: 2024, month: 1, day: 1, weekday: 1 };
        sched.evaluate(monday, time(10, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(21.0));

        sched.evaluate(monday, time(19, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(16.0));
    }

    #[test]
    fn falls_back_to_default_before_first_transition() {
        let mut sched = ScheduleObject::new(1, "Default Test".to_string());
        sched.weekly_schedule.days[0] =
            DailySchedule { entries: vec![(time(8, 0), Some(ApplicationValue::Real(21.0)))] };
        sched.schedule_default = ApplicationValue::Real(18.0);

        let monday = BacnetDate { year: 2024, month: 1, day: 1, weekday: 1 };
        sched.evaluate(monday, time(7, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(18.0));
    }

    #[test]
    fn exception_schedule_overrides_weekly_schedule() {
        let mut sched = ScheduleObject::new(1, "Exception Test".to_string());
        sched.weekly_schedule.days[0] =
            DailySchedule { entries: vec![(time(8, 0), Some(ApplicationValue::Real(21.0)))] };
        sched.schedule_default = ApplicationValue::Real(18.0);

        let holiday = BacnetDate { year: 2024, month: 12, day: 25, weekday: BacnetDate::WILD };
        sched.exception_schedule.push(ExceptionScheduleEntry {
            dates: vec![holiday],
            time_values: vec![(time(0, 0), Some(ApplicationValue::Real(10.0)))],
            event_priority: 1,
        });

        sched.evaluate(
            BacnetDate { year: 2024, month: 12, day: 25, weekday: 3 },
            time(10, 0),
        );
        assert_eq!(sched.present_value, ApplicationValue::Real(10.0));
    }

    #[test]
    fn effective_period_gates_on_month_and_day_not_just_year() {
        // Effective April 1 - September 30, 2024: a date inside that year
        // but outside the month/day window (e.g. December) must fall back
        // to Schedule_Default, even though its year is within bounds.
        let mut sched = ScheduleObject::new(1, "Effective Period Test".to_string());
        sched.effective_period = (
            BacnetDate { year: 2024, month: 4, day: 1, weekday: BacnetDate::WILD },
            BacnetDate { year: 2024, month: 9, day: 30, weekday: BacnetDate::WILD },
        );
        sched.weekly_schedule.days[0] =
            DailySchedule { entries: vec![(time(8, 0), Some(ApplicationValue::Real(21.0)))] };
        sched.schedule_default = ApplicationValue::Real(18.0);

        let in_period = BacnetDate { year: 2024, month: 6, day: 15, weekday: 1 };
        sched.evaluate(in_period, time(10, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(21.0));

        let same_year_out_of_window = BacnetDate { year: 2024, month: 12, day: 15, weekday: 1 };
        sched.evaluate(same_year_out_of_window, time(10, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(18.0));

        let before_window = BacnetDate { year: 2024, month: 2, day: 1, weekday: 1 };
        sched.evaluate(before_window, time(10, 0));
        assert_eq!(sched.present_value, ApplicationValue::Real(18.0));
    }
}
