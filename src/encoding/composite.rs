//! Composite (constructed) encodings built from the primitive codec.
//!
//! A composite type is a fixed or list-shaped sequence of context-tagged
//! primitives, sometimes wrapped in its own opening/closing tag pair. These
//! map onto clause 21's `BACnetXxx` productions — `BACnetDateTime`,
//! `BACnetDestination`, `BACnetWeeklySchedule`, `BACnetDeviceObjectPropertyReference`,
//! `BACnetReadAccessSpecification`, `BACnetPropertyReference`, and the
//! `BACnetTimeStamp` choice type.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use super::{
    context, ApplicationTag, ApplicationValue, BacnetDate, BacnetTime, EncodingError, ObjectIdentifier, Result,
};

/// A combined calendar date and time of day (clause 21, `BACnetDateTime`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacnetDateTime {
    pub date: BacnetDate,
    pub time: BacnetTime,
}

impl BacnetDateTime {
    pub fn new(date: BacnetDate, time: BacnetTime) -> Self {
        Self { date, time }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        super::encode_date(buffer, self.date)?;
        super::encode_time(buffer, self.time)
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (date, date_len) = super::decode_date(data)?;
        let (time, time_len) = super::decode_time(&data[date_len..])?;
        Ok((Self::new(date, time), date_len + time_len))
    }

    pub fn encode_context(&self, buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
        context::encode_opening_tag(buffer, tag_number)?;
        self.encode(buffer)?;
        context::encode_closing_tag(buffer, tag_number)
    }

    pub fn decode_context(data: &[u8], tag_number: u8) -> Result<(Self, usize)> {
        let (opened, open_len) = context::decode_opening_tag(data)?.ok_or(EncodingError::InvalidTag)?;
        if opened != tag_number {
            return Err(EncodingError::InvalidTag);
        }
        let (value, body_len) = Self::decode(&data[open_len..])?;
        let (closed, close_len) =
            context::decode_closing_tag(&data[open_len + body_len..])?.ok_or(EncodingError::InvalidTag)?;
        if closed != tag_number {
            return Err(EncodingError::InvalidTag);
        }
        Ok((value, open_len + body_len + close_len))
    }
}

/// A COV recipient or event-notification destination (clause 21,
/// `BACnetDestination`). `Valid_Days` is a 7-bit string (Monday = bit 0).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    pub valid_days: [bool; 7],
    pub from_time: BacnetTime,
    pub to_time: BacnetTime,
    pub recipient_network: u16,
    pub recipient_mac: Vec<u8>,
    pub process_identifier: u32,
    pub issue_confirmed_notifications: bool,
    pub transitions: [bool; 3],
}

impl Destination {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        let days = super::BitString::new(self.valid_days.to_vec());
        context::encode_context_value(buffer, 0, &ApplicationValue::BitString(days))?;
        context::encode_context_value(buffer, 1, &ApplicationValue::Time(self.from_time))?;
        context::encode_context_value(buffer, 2, &ApplicationValue::Time(self.to_time))?;

        // recipient (BACnetRecipient): a network-number/MAC pair wrapped in
        // its own opening/closing tag, network address form only (no
        // device-identifier form — per-device COV subscriptions keep that
        // bookkeeping external).
        context::encode_opening_tag(buffer, 3)?;
        context::encode_context_tag(buffer, 0, 2)?;
        buffer.extend_from_slice(&self.recipient_network.to_be_bytes());
        context::encode_context_tag(buffer, 1, self.recipient_mac.len())?;
        buffer.extend_from_slice(&self.recipient_mac);
        context::encode_closing_tag(buffer, 3)?;

        context::encode_context_value(buffer, 4, &ApplicationValue::Unsigned(self.process_identifier))?;
        context::encode_context_value(
            buffer,
            5,
            &ApplicationValue::Boolean(self.issue_confirmed_notifications),
        )?;
        let transitions = super::BitString::new(self.transitions.to_vec());
        context::encode_context_value(buffer, 6, &ApplicationValue::BitString(transitions))?;
        Ok(())
    }
}

/// One slot of a daily schedule: the time of day a value takes effect, or
/// `None` for a Null entry meaning "no change at this slot".
pub type DailyScheduleEntry = (BacnetTime, Option<ApplicationValue>);

/// One weekday's list of (time, value) transitions (clause 21,
/// `BACnetDailySchedule`).
#[derive(Debug, Clone, Default)]
pub struct DailySchedule {
    pub entries: Vec<DailyScheduleEntry>,
}

/// A full week of daily schedules, Monday through Sunday (clause 21,
/// `BACnetWeeklySchedule`).
#[derive(Debug, Clone, Default)]
pub struct WeeklySchedule {
    pub days: [DailySchedule; 7],
}

impl WeeklySchedule {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        for day in &self.days {
            context::encode_opening_tag(buffer, 0)?;
            for (time, value) in &day.entries {
                context::encode_context_value(buffer, 0, &ApplicationValue::Time(*time))?;
                match value {
                    Some(v) => context::encode_context_value(buffer, 1, v)?,
                    None => context::encode_context_value(buffer, 1, &ApplicationValue::Null)?,
                }
            }
            context::encode_closing_tag(buffer, 0)?;
        }
        Ok(())
    }
}

/// `BACnetDeviceObjectPropertyReference`: a pointer to a property on an
/// object, optionally on a remote device, with an optional array index.
/// No pointers are carried, only identifiers resolved through the object
/// registry on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceObjectPropertyReference {
    pub object_identifier: ObjectIdentifier,
    pub property_identifier: u32,
    pub array_index: Option<u32>,
    pub device_identifier: Option<ObjectIdentifier>,
}

impl DeviceObjectPropertyReference {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        context::encode_context_value(buffer, 0, &ApplicationValue::ObjectIdentifier(self.object_identifier))?;
        context::encode_context_value(buffer, 1, &ApplicationValue::Enumerated(self.property_identifier))?;
        if let Some(index) = self.array_index {
            context::encode_context_value(buffer, 2, &ApplicationValue::Unsigned(index))?;
        }
        if let Some(device_id) = self.device_identifier {
            context::encode_context_value(buffer, 3, &ApplicationValue::ObjectIdentifier(device_id))?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut pos = 0;
        let (object_value, n) = context::decode_context_value(&data[pos..], 0, ApplicationTag::ObjectIdentifier)?;
        let object_identifier = match object_value {
            ApplicationValue::ObjectIdentifier(id) => id,
            _ => return Err(EncodingError::InvalidTag),
        };
        pos += n;

        let (prop_value, n) = context::decode_context_value(&data[pos..], 1, ApplicationTag::Enumerated)?;
        let property_identifier = match prop_value {
            ApplicationValue::Enumerated(v) => v,
            _ => return Err(EncodingError::InvalidTag),
        };
        pos += n;

        let mut array_index = None;
        if pos < data.len() {
            if let Ok((tag_number, _, _)) = context::decode_context_tag(&data[pos..]) {
                if tag_number == 2 {
                    let (value, n) = context::decode_context_value(&data[pos..], 2, ApplicationTag::UnsignedInt)?;
                    if let ApplicationValue::Unsigned(v) = value {
                        array_index = Some(v);
                    }
                    pos += n;
                }
            }
        }

        let mut device_identifier = None;
        if pos < data.len() {
            if let Ok((tag_number, _, _)) = context::decode_context_tag(&data[pos..]) {
                if tag_number == 3 {
                    let (value, n) =
                        context::decode_context_value(&data[pos..], 3, ApplicationTag::ObjectIdentifier)?;
                    if let ApplicationValue::ObjectIdentifier(id) = value {
                        device_identifier = Some(id);
                    }
                    pos += n;
                }
            }
        }

        Ok((Self { object_identifier, property_identifier, array_index, device_identifier }, pos))
    }
}

/// `BACnetPropertyReference`: a property identifier plus optional array
/// index, without an object identifier (used inside ReadAccessSpecification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyReference {
    pub property_identifier: u32,
    pub array_index: Option<u32>,
}

impl PropertyReference {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        context::encode_context_value(buffer, 0, &ApplicationValue::Enumerated(self.property_identifier))?;
        if let Some(index) = self.array_index {
            context::encode_context_value(buffer, 1, &ApplicationValue::Unsigned(index))?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (prop_value, mut pos) = context::decode_context_value(data, 0, ApplicationTag::Enumerated)?;
        let property_identifier = match prop_value {
            ApplicationValue::Enumerated(v) => v,
            _ => return Err(EncodingError::InvalidTag),
        };
        let mut array_index = None;
        if pos < data.len() {
            if let Ok((tag_number, _, _)) = context::decode_context_tag(&data[pos..]) {
                if tag_number == 1 {
                    let (value, n) = context::decode_context_value(&data[pos..], 1, ApplicationTag::UnsignedInt)?;
                    if let ApplicationValue::Unsigned(v) = value {
                        array_index = Some(v);
                    }
                    pos += n;
                }
            }
        }
        Ok((Self { property_identifier, array_index }, pos))
    }
}

/// `BACnetReadAccessSpecification`: an object identifier plus the list of
/// properties (a `SEQUENCE OF BACnetPropertyReference`) requested on it —
/// the per-object unit ReadPropertyMultiple batches together.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadAccessSpecification {
    pub object_identifier: ObjectIdentifier,
    pub property_references: Vec<PropertyReference>,
}

impl ReadAccessSpecification {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        context::encode_context_value(buffer, 0, &ApplicationValue::ObjectIdentifier(self.object_identifier))?;
        context::encode_opening_tag(buffer, 1)?;
        for reference in &self.property_references {
            reference.encode(buffer)?;
        }
        context::encode_closing_tag(buffer, 1)
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (object_value, mut pos) =
            context::decode_context_value(data, 0, ApplicationTag::ObjectIdentifier)?;
        let object_identifier = match object_value {
            ApplicationValue::ObjectIdentifier(id) => id,
            _ => return Err(EncodingError::InvalidTag),
        };

        let (opened, open_len) = context::decode_opening_tag(&data[pos..])?.ok_or(EncodingError::InvalidTag)?;
        if opened != 1 {
            return Err(EncodingError::InvalidTag);
        }
        pos += open_len;

        let mut property_references = Vec::new();
        loop {
            if context::decode_closing_tag(&data[pos..])?.map(|(n, _)| n) == Some(1) {
                let (_, close_len) = context::decode_closing_tag(&data[pos..])?.unwrap();
                pos += close_len;
                break;
            }
            let (reference, n) = PropertyReference::decode(&data[pos..])?;
            property_references.push(reference);
            pos += n;
            if pos >= data.len() {
                return Err(EncodingError::UnbalancedConstructedData);
            }
        }

        Ok((Self { object_identifier, property_references }, pos))
    }
}

/// `BACnetTimeStamp`: a CHOICE of wall-clock time, an event sequence
/// number, or a full date-time, used by event/alarm notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeStamp {
    Time(BacnetTime),
    SequenceNumber(u32),
    DateTime(BacnetDateTime),
}

impl TimeStamp {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        match self {
            TimeStamp::Time(t) => context::encode_context_value(buffer, 0, &ApplicationValue::Time(*t)),
            TimeStamp::SequenceNumber(n) => {
                context::encode_context_value(buffer, 1, &ApplicationValue::Unsigned(*n))
            }
            TimeStamp::DateTime(dt) => dt.encode_context(buffer, 2),
        }
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (tag_number, _, _) = context::decode_context_tag(data)?;
        match tag_number {
            0 => {
                let (value, n) = context::decode_context_value(data, 0, ApplicationTag::Time)?;
                match value {
                    ApplicationValue::Time(t) => Ok((TimeStamp::Time(t), n)),
                    _ => Err(EncodingError::InvalidTag),
                }
            }
            1 => {
                let (value, n) = context::decode_context_value(data, 1, ApplicationTag::UnsignedInt)?;
                match value {
                    ApplicationValue::Unsigned(v) => Ok((TimeStamp::SequenceNumber(v), n)),
                    _ => Err(EncodingError::InvalidTag),
                }
            }
            2 => {
                let (dt, n) = BacnetDateTime::decode_context(data, 2)?;
                Ok((TimeStamp::DateTime(dt), n))
            }
            _ => Err(EncodingError::InvalidTag),
        }
    }
}

/// Array encoding helper: index 0 of a BACnet array property is always the
/// element count; `ARRAY_ALL` (index 0 in a *request*) means "the whole
/// array"; element indices are otherwise 1-based.
pub const BACNET_ARRAY_ALL: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_round_trips() {
        let dt = BacnetDateTime::new(
            BacnetDate { year: 2026, month: 7, day: 28, weekday: 2 },
            BacnetTime::new(14, 5, 0, 0),
        );
        let mut buf = Vec::new();
        dt.encode(&mut buf).unwrap();
        let (decoded, consumed) = BacnetDateTime::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, dt);
    }

    #[test]
    fn date_time_context_round_trips() {
        let dt = BacnetDateTime::new(BacnetDate::wildcard(), BacnetTime::new(0, 0, 0, 0));
        let mut buf = Vec::new();
        dt.encode_context(&mut buf, 4).unwrap();
        let (decoded, consumed) = BacnetDateTime::decode_context(&buf, 4).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, dt);
    }

    #[test]
    fn device_object_property_reference_round_trips_with_optional_fields() {
        let reference = DeviceObjectPropertyReference {
            object_identifier: ObjectIdentifier::new(0, 5),
            property_identifier: 85, // present-value
            array_index: None,
            device_identifier: None,
        };
        let mut buf = Vec::new();
        reference.encode(&mut buf).unwrap();
        let (decoded, consumed) = DeviceObjectPropertyReference::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, reference);

        let reference = DeviceObjectPropertyReference {
            object_identifier: ObjectIdentifier::new(0, 5),
            property_identifier: 85,
            array_index: Some(3),
            device_identifier: Some(ObjectIdentifier::new(8, 100)),
        };
        let mut buf = Vec::new();
        reference.encode(&mut buf).unwrap();
        let (decoded, consumed) = DeviceObjectPropertyReference::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, reference);
    }

    #[test]
    fn read_access_specification_round_trips_multiple_properties() {
        let spec = ReadAccessSpecification {
            object_identifier: ObjectIdentifier::new(0, 1),
            property_references: vec![
                PropertyReference { property_identifier: 85, array_index: None },
                PropertyReference { property_identifier: 77, array_index: Some(2) },
            ],
        };
        let mut buf = Vec::new();
        spec.encode(&mut buf).unwrap();
        let (decoded, consumed) = ReadAccessSpecification::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, spec);
    }

    #[test]
    fn timestamp_variants_round_trip() {
        for ts in [
            TimeStamp::Time(BacnetTime::new(10, 0, 0, 0)),
            TimeStamp::SequenceNumber(42),
            TimeStamp::DateTime(BacnetDateTime::new(
                BacnetDate { year: 2026, month: 1, day: 1, weekday: 4 },
                BacnetTime::new(0, 0, 0, 0),
            )),
        ] {
            let mut buf = Vec::new();
            ts.encode(&mut buf).unwrap();
            let (decoded, consumed) = TimeStamp::decode(&buf).unwrap();
            assert_eq!(consumed, buf.len());
            assert_eq!(decoded, ts);
        }
    }
}
