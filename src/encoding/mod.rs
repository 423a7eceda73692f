//! BACnet Application-Layer Codec (ASHRAE 135 clause 20.2)
//!
//! Every value on the wire is a self-describing tag-length-value triple:
//! a tag number, a context/application flag, and a length-or-value field
//! that either holds the value directly (booleans, opening/closing tags)
//! or the byte length of what follows. This module is the primitive codec
//! — one function per [`ApplicationValue`] variant plus the context-tag and
//! opening/closing-tag primitives that constructed data builds on.
//!
//! # Tag byte layout
//!
//! ```text
//! bit:    7 6 5 4   3   2 1 0
//!         [ tag  ] [ctx] [ length/value/type ]
//! ```
//!
//! A tag number of `0xF` escapes to an extra byte carrying the real tag
//! number (needed for context tags above 14 — application tags never need
//! it, since there are only 13 application types). A length/value field of
//! `5` escapes to 1, 3, or 5 more bytes: a plain byte for lengths 0-253,
//! `254` followed by a big-endian `u16` for longer, `255` followed by a
//! big-endian `u32` beyond that. Opening (type-code 6) and closing
//! (type-code 7) tags reuse the length field to carry that type code
//! instead of a length.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, string::ToString, vec, vec::Vec};

pub mod composite;

/// Result type for encoding/decoding operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, EncodingError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, EncodingError>;

/// Errors raised by the primitive or composite codec.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// The tag byte (or an escaped tag/length extension) names a tag number
    /// or application tag that isn't valid in context.
    InvalidTag,
    /// The supplied buffer ends before a declared length/value could be read.
    Truncated,
    /// A decoded length field doesn't match what the value's type permits
    /// (e.g. a 5-byte Real, or an empty CharacterString).
    LengthMismatch,
    /// A numeric value (object type, instance, priority, ...) is outside
    /// its legal range.
    ValueOutOfRange,
    /// Constructed data's opening/closing tags never balance back to depth 0.
    UnbalancedConstructedData,
    /// A byte sequence claimed to be UTF-8 (or UTF-16 for older strings) is not.
    InvalidFormat(String),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::InvalidTag => write!(f, "invalid tag"),
            EncodingError::Truncated => write!(f, "truncated data"),
            EncodingError::LengthMismatch => write!(f, "length mismatch"),
            EncodingError::ValueOutOfRange => write!(f, "value out of range"),
            EncodingError::UnbalancedConstructedData => write!(f, "unbalanced opening/closing tags"),
            EncodingError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl Error for EncodingError {}

/// Application tag numbers for the 13 primitive value types (clause 20.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApplicationTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectIdentifier = 12,
}

impl TryFrom<u8> for ApplicationTag {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ApplicationTag::Null),
            1 => Ok(ApplicationTag::Boolean),
            2 => Ok(ApplicationTag::UnsignedInt),
            3 => Ok(ApplicationTag::SignedInt),
            4 => Ok(ApplicationTag::Real),
            5 => Ok(ApplicationTag::Double),
            6 => Ok(ApplicationTag::OctetString),
            7 => Ok(ApplicationTag::CharacterString),
            8 => Ok(ApplicationTag::BitString),
            9 => Ok(ApplicationTag::Enumerated),
            10 => Ok(ApplicationTag::Date),
            11 => Ok(ApplicationTag::Time),
            12 => Ok(ApplicationTag::ObjectIdentifier),
            _ => Err(EncodingError::InvalidTag),
        }
    }
}

/// A bit string: the packed bits plus how many trailing bits of the final
/// byte are unused.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitString {
    pub bits: Vec<bool>,
}

impl BitString {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn unused_bits(&self) -> u8 {
        let rem = self.bits.len() % 8;
        if rem == 0 { 0 } else { (8 - rem) as u8 }
    }
}

/// A BACnet date. `0xFF` in any field means "unspecified" (wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacnetDate {
    /// Calendar year, e.g. 2024, or 0xFFFF meaning "any year". Stored on the
    /// wire as `year - 1900`.
    pub year: u16,
    /// 1-12, or 0xFF for "any month".
    pub month: u8,
    /// 1-31, or 0xFF for "any day".
    pub day: u8,
    /// 1 (Monday) - 7 (Sunday), or 0xFF for "any weekday".
    pub weekday: u8,
}

impl BacnetDate {
    pub const WILD: u8 = 0xFF;

    pub fn wildcard() -> Self {
        Self { year: 0xFFFF, month: Self::WILD, day: Self::WILD, weekday: Self::WILD }
    }

    fn field_matches(field: u8, other: u8) -> bool {
        field == Self::WILD || other == Self::WILD || field == other
    }

    /// Wildcard-aware equality used by schedule effective-period checks.
    pub fn matches(&self, other: &BacnetDate) -> bool {
        (self.year == 0xFFFF || other.year == 0xFFFF || self.year == other.year)
            && Self::field_matches(self.month, other.month)
            && Self::field_matches(self.day, other.day)
            && Self::field_matches(self.weekday, other.weekday)
    }
}

/// A BACnet time. `0xFF` in any field means "unspecified" (wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacnetTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl BacnetTime {
    pub const WILD: u8 = 0xFF;

    pub fn new(hour: u8, minute: u8, second: u8, hundredths: u8) -> Self {
        Self { hour, minute, second, hundredths }
    }
}

/// A BACnet object identifier: 10-bit type plus 22-bit instance, packed
/// into a 32-bit application value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectIdentifier {
    pub object_type: u16,
    pub instance: u32,
}

/// Instance value meaning "any instance" (all 22 bits set).
pub const OBJECT_INSTANCE_WILDCARD: u32 = 0x3F_FFFF;

impl ObjectIdentifier {
    pub fn new(object_type: u16, instance: u32) -> Self {
        Self { object_type, instance }
    }

    pub fn is_valid(&self) -> bool {
        self.object_type <= 0x3FF && self.instance <= 0x3F_FFFF
    }

    pub fn pack(&self) -> u32 {
        ((self.object_type as u32) << 22) | (self.instance & 0x3F_FFFF)
    }

    pub fn unpack(word: u32) -> Self {
        Self { object_type: (word >> 22) as u16, instance: word & 0x3F_FFFF }
    }
}

/// The tagged-union set of application values.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationValue {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString(BitString),
    Enumerated(u32),
    Date(BacnetDate),
    Time(BacnetTime),
    ObjectIdentifier(ObjectIdentifier),
}

impl ApplicationValue {
    pub fn application_tag(&self) -> ApplicationTag {
        match self {
            ApplicationValue::Null => ApplicationTag::Null,
            ApplicationValue::Boolean(_) => ApplicationTag::Boolean,
            ApplicationValue::Unsigned(_) => ApplicationTag::UnsignedInt,
            ApplicationValue::Signed(_) => ApplicationTag::SignedInt,
            ApplicationValue::Real(_) => ApplicationTag::Real,
            ApplicationValue::Double(_) => ApplicationTag::Double,
            ApplicationValue::OctetString(_) => ApplicationTag::OctetString,
            ApplicationValue::CharacterString(_) => ApplicationTag::CharacterString,
            ApplicationValue::BitString(_) => ApplicationTag::BitString,
            ApplicationValue::Enumerated(_) => ApplicationTag::Enumerated,
            ApplicationValue::Date(_) => ApplicationTag::Date,
            ApplicationValue::Time(_) => ApplicationTag::Time,
            ApplicationValue::ObjectIdentifier(_) => ApplicationTag::ObjectIdentifier,
        }
    }

    /// Encode this value with its application tag, appending to `buffer`.
    /// Passing `None` predicts the byte count without writing anything —
    /// the null-length invariant callers use to size ahead of an encode.
    pub fn encode(&self, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        let mut scratch = Vec::new();
        let out = buffer.unwrap_or(&mut scratch);
        let start = out.len();
        match self {
            ApplicationValue::Null => encode_application_tag(out, ApplicationTag::Null, 0),
            ApplicationValue::Boolean(v) => encode_boolean(out, *v),
            ApplicationValue::Unsigned(v) => encode_unsigned(out, *v),
            ApplicationValue::Signed(v) => encode_signed(out, *v),
            ApplicationValue::Real(v) => encode_real(out, *v),
            ApplicationValue::Double(v) => encode_double(out, *v),
            ApplicationValue::OctetString(v) => encode_octet_string(out, v),
            ApplicationValue::CharacterString(v) => encode_character_string(out, v),
            ApplicationValue::BitString(v) => encode_bit_string(out, v),
            ApplicationValue::Enumerated(v) => encode_enumerated(out, *v),
            ApplicationValue::Date(v) => encode_date(out, *v),
            ApplicationValue::Time(v) => encode_time(out, *v),
            ApplicationValue::ObjectIdentifier(v) => encode_object_identifier(out, *v),
        }?;
        Ok(out.len() - start)
    }

    /// Predict the encoded length of this value without writing anything.
    pub fn encoded_len(&self) -> usize {
        self.encode(None).unwrap_or(0)
    }

    /// Decode one application-tagged value from the front of `data`.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (tag, _length, _consumed) = decode_application_tag(data)?;
        match tag {
            ApplicationTag::Null => Ok((ApplicationValue::Null, 1)),
            ApplicationTag::Boolean => decode_boolean(data).map(|(v, n)| (ApplicationValue::Boolean(v), n)),
            ApplicationTag::UnsignedInt => decode_unsigned(data).map(|(v, n)| (ApplicationValue::Unsigned(v), n)),
            ApplicationTag::SignedInt => decode_signed(data).map(|(v, n)| (ApplicationValue::Signed(v), n)),
            ApplicationTag::Real => decode_real(data).map(|(v, n)| (ApplicationValue::Real(v), n)),
            ApplicationTag::Double => decode_double(data).map(|(v, n)| (ApplicationValue::Double(v), n)),
            ApplicationTag::OctetString => {
                decode_octet_string(data).map(|(v, n)| (ApplicationValue::OctetString(v), n))
            }
            ApplicationTag::CharacterString => {
                decode_character_string(data).map(|(v, n)| (ApplicationValue::CharacterString(v), n))
            }
            ApplicationTag::BitString => decode_bit_string(data).map(|(v, n)| (ApplicationValue::BitString(v), n)),
            ApplicationTag::Enumerated => decode_enumerated(data).map(|(v, n)| (ApplicationValue::Enumerated(v), n)),
            ApplicationTag::Date => decode_date(data).map(|(v, n)| (ApplicationValue::Date(v), n)),
            ApplicationTag::Time => decode_time(data).map(|(v, n)| (ApplicationValue::Time(v), n)),
            ApplicationTag::ObjectIdentifier => {
                decode_object_identifier(data).map(|(v, n)| (ApplicationValue::ObjectIdentifier(v), n))
            }
        }
    }
}

/// Encode the length/value/type field of a tag byte, escaping to extra
/// length bytes per the sentinel rules (≥5 escapes; 254 ⇒ u16, 255 ⇒ u32).
fn encode_length_extension(buffer: &mut Vec<u8>, length: usize) {
    if length < 254 {
        buffer.push(length as u8);
    } else if length <= 0xFFFF {
        buffer.push(254);
        buffer.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        buffer.push(255);
        buffer.extend_from_slice(&(length as u32).to_be_bytes());
    }
}

fn decode_length_extension(data: &[u8]) -> Result<(usize, usize)> {
    if data.is_empty() {
        return Err(EncodingError::Truncated);
    }
    let len_byte = data[0];
    if len_byte < 254 {
        Ok((len_byte as usize, 1))
    } else if len_byte == 254 {
        if data.len() < 3 {
            return Err(EncodingError::Truncated);
        }
        Ok((u16::from_be_bytes([data[1], data[2]]) as usize, 3))
    } else {
        if data.len() < 5 {
            return Err(EncodingError::Truncated);
        }
        Ok((u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize, 5))
    }
}

/// Encode an application tag byte (plus any length extension) for `length`
/// bytes of following value data.
pub fn encode_application_tag(buffer: &mut Vec<u8>, tag: ApplicationTag, length: usize) -> Result<()> {
    let lv = if length < 5 { length as u8 } else { 5 };
    buffer.push(((tag as u8) << 4) | lv);
    if length >= 5 {
        encode_length_extension(buffer, length);
    }
    Ok(())
}

/// Decode an application tag byte, returning `(tag, length, bytes consumed by the tag itself)`.
pub fn decode_application_tag(data: &[u8]) -> Result<(ApplicationTag, usize, usize)> {
    if data.is_empty() {
        return Err(EncodingError::Truncated);
    }
    let tag_byte = data[0];
    if tag_byte & 0x08 != 0 {
        return Err(EncodingError::InvalidTag);
    }
    let tag_number = tag_byte >> 4;
    let tag = ApplicationTag::try_from(tag_number)?;
    let lv = tag_byte & 0x07;
    if lv < 5 {
        Ok((tag, lv as usize, 1))
    } else {
        let (length, ext) = decode_length_extension(&data[1..])?;
        Ok((tag, length, 1 + ext))
    }
}

/// Read the application tag of the value at the front of `data` without
/// consuming it (used to decide how to interpret a property's raw bytes).
pub fn get_application_tag(data: &[u8]) -> Result<ApplicationTag> {
    decode_application_tag(data).map(|(tag, _, _)| tag)
}

fn require(data: &[u8], len: usize) -> Result<()> {
    if data.len() < len {
        Err(EncodingError::Truncated)
    } else {
        Ok(())
    }
}

pub fn encode_boolean(buffer: &mut Vec<u8>, value: bool) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Boolean, if value { 1 } else { 0 })
}

pub fn decode_boolean(data: &[u8]) -> Result<(bool, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Boolean {
        return Err(EncodingError::InvalidTag);
    }
    match length {
        0 => Ok((false, consumed)),
        1 => Ok((true, consumed)),
        _ => Err(EncodingError::LengthMismatch),
    }
}

/// Minimum big-endian byte encoding of an unsigned value (1-4 bytes).
fn minimal_unsigned_bytes(value: u32) -> Vec<u8> {
    if value <= 0xFF {
        vec![value as u8]
    } else if value <= 0xFFFF {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= 0xFF_FFFF {
        value.to_be_bytes()[1..].to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

pub fn encode_unsigned(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_unsigned_bytes(value);
    encode_application_tag(buffer, ApplicationTag::UnsignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

fn decode_unsigned_bytes(data: &[u8]) -> Result<u32> {
    match data.len() {
        1 => Ok(data[0] as u32),
        2 => Ok(u16::from_be_bytes([data[0], data[1]]) as u32),
        3 => Ok(u32::from_be_bytes([0, data[0], data[1], data[2]])),
        4 => Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]])),
        _ => Err(EncodingError::LengthMismatch),
    }
}

pub fn decode_unsigned(data: &[u8]) -> Result<(u32, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::UnsignedInt {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let value = decode_unsigned_bytes(&data[consumed..consumed + length])?;
    consumed += length;
    Ok((value, consumed))
}

fn minimal_signed_bytes(value: i32) -> Vec<u8> {
    if (-128..=127).contains(&value) {
        vec![value as i8 as u8]
    } else if (-32768..=32767).contains(&value) {
        (value as i16).to_be_bytes().to_vec()
    } else if (-8_388_608..=8_388_607).contains(&value) {
        value.to_be_bytes()[1..].to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

pub fn encode_signed(buffer: &mut Vec<u8>, value: i32) -> Result<()> {
    let bytes = minimal_signed_bytes(value);
    encode_application_tag(buffer, ApplicationTag::SignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

pub fn decode_signed(data: &[u8]) -> Result<(i32, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::SignedInt {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let bytes = &data[consumed..consumed + length];
    let value = match length {
        1 => bytes[0] as i8 as i32,
        2 => i16::from_be_bytes([bytes[0], bytes[1]]) as i32,
        3 => {
            let sign_extend = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
            i32::from_be_bytes([sign_extend, bytes[0], bytes[1], bytes[2]])
        }
        4 => i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => return Err(EncodingError::LengthMismatch),
    };
    consumed += length;
    Ok((value, consumed))
}

pub fn encode_real(buffer: &mut Vec<u8>, value: f32) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Real, 4)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

pub fn decode_real(data: &[u8]) -> Result<(f32, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Real {
        return Err(EncodingError::InvalidTag);
    }
    if length != 4 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 4)?;
    let value = f32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    consumed += 4;
    Ok((value, consumed))
}

pub fn encode_double(buffer: &mut Vec<u8>, value: f64) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Double, 8)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

pub fn decode_double(data: &[u8]) -> Result<(f64, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Double {
        return Err(EncodingError::InvalidTag);
    }
    if length != 8 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 8)?;
    let value = f64::from_be_bytes(data[consumed..consumed + 8].try_into().unwrap());
    consumed += 8;
    Ok((value, consumed))
}

pub fn encode_octet_string(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::OctetString, value.len())?;
    buffer.extend_from_slice(value);
    Ok(())
}

pub fn decode_octet_string(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::OctetString {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let value = data[consumed..consumed + length].to_vec();
    consumed += length;
    Ok((value, consumed))
}

/// Encode a character string. Only the ANSI X3.4 (ASCII/UTF-8, encoding
/// byte 0) character set is produced; decoding also accepts ISO 8859-1
/// (byte 3) and UTF-16BE (byte 5), which some legacy devices emit for
/// `Object_Name`.
pub fn encode_character_string(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    encode_application_tag(buffer, ApplicationTag::CharacterString, bytes.len() + 1)?;
    buffer.push(0);
    buffer.extend_from_slice(bytes);
    Ok(())
}

pub fn decode_character_string(data: &[u8]) -> Result<(String, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::CharacterString {
        return Err(EncodingError::InvalidTag);
    }
    if length == 0 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + length)?;
    let charset = data[consumed];
    let body = &data[consumed + 1..consumed + length];
    let value = match charset {
        0 => String::from_utf8(body.to_vec())
            .map_err(|_| EncodingError::InvalidFormat("invalid UTF-8 character string".to_string()))?,
        5 => {
            if body.len() % 2 != 0 {
                return Err(EncodingError::InvalidFormat("odd-length UTF-16 string".to_string()));
            }
            let units: Vec<u16> = body.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            String::from_utf16(&units)
                .map_err(|_| EncodingError::InvalidFormat("invalid UTF-16 character string".to_string()))?
        }
        3 => {
            // encoding_rs has no standalone ISO 8859-1 codec; WINDOWS_1252 is a
            // superset that differs only in the C1 control range (0x80-0x9F),
            // which BACnet character strings don't use.
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(body);
            if had_errors {
                return Err(EncodingError::InvalidFormat(
                    "invalid ISO 8859-1 character string".to_string(),
                ));
            }
            decoded.into_owned()
        }
        _ => return Err(EncodingError::InvalidFormat(format!("unsupported character set {}", charset))),
    };
    consumed += length;
    Ok((value, consumed))
}

pub fn encode_bit_string(buffer: &mut Vec<u8>, value: &BitString) -> Result<()> {
    let byte_count = (value.bits.len() + 7) / 8;
    encode_application_tag(buffer, ApplicationTag::BitString, byte_count + 1)?;
    buffer.push(value.unused_bits());
    pack_bits(buffer, &value.bits);
    Ok(())
}

fn pack_bits(buffer: &mut Vec<u8>, bits: &[bool]) {
    let mut current = 0u8;
    let mut bit_pos = 0u8;
    for &bit in bits {
        if bit {
            current |= 1 << (7 - bit_pos);
        }
        bit_pos += 1;
        if bit_pos == 8 {
            buffer.push(current);
            current = 0;
            bit_pos = 0;
        }
    }
    if bit_pos > 0 {
        buffer.push(current);
    }
}

pub fn decode_bit_string(data: &[u8]) -> Result<(BitString, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::BitString {
        return Err(EncodingError::InvalidTag);
    }
    if length == 0 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + length)?;
    let unused_bits = data[consumed] as usize;
    if unused_bits > 7 {
        return Err(EncodingError::InvalidFormat("unused-bits count > 7".to_string()));
    }
    consumed += 1;
    let byte_count = length - 1;
    let mut bits = Vec::new();
    for i in 0..byte_count {
        let byte_val = data[consumed + i];
        let bits_in_byte = if i == byte_count - 1 { 8 - unused_bits } else { 8 };
        for bit_pos in 0..bits_in_byte {
            bits.push((byte_val & (1 << (7 - bit_pos))) != 0);
        }
    }
    consumed += byte_count;
    Ok((BitString::new(bits), consumed))
}

pub fn encode_enumerated(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_unsigned_bytes(value);
    encode_application_tag(buffer, ApplicationTag::Enumerated, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

pub fn decode_enumerated(data: &[u8]) -> Result<(u32, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Enumerated {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let value = decode_unsigned_bytes(&data[consumed..consumed + length])?;
    consumed += length;
    Ok((value, consumed))
}

fn date_year_byte(year: u16) -> u8 {
    if year == 0xFFFF { 0xFF } else { (year.wrapping_sub(1900) & 0xFF) as u8 }
}

fn date_year_from_byte(byte: u8) -> u16 {
    if byte == 0xFF { 0xFFFF } else { 1900 + byte as u16 }
}

pub fn encode_date(buffer: &mut Vec<u8>, date: BacnetDate) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Date, 4)?;
    buffer.push(date_year_byte(date.year));
    buffer.push(date.month);
    buffer.push(date.day);
    buffer.push(date.weekday);
    Ok(())
}

pub fn decode_date(data: &[u8]) -> Result<(BacnetDate, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Date {
        return Err(EncodingError::InvalidTag);
    }
    if length != 4 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 4)?;
    let date = BacnetDate {
        year: date_year_from_byte(data[consumed]),
        month: data[consumed + 1],
        day: data[consumed + 2],
        weekday: data[consumed + 3],
    };
    consumed += 4;
    Ok((date, consumed))
}

pub fn encode_time(buffer: &mut Vec<u8>, time: BacnetTime) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Time, 4)?;
    buffer.push(time.hour);
    buffer.push(time.minute);
    buffer.push(time.second);
    buffer.push(time.hundredths);
    Ok(())
}

pub fn decode_time(data: &[u8]) -> Result<(BacnetTime, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Time {
        return Err(EncodingError::InvalidTag);
    }
    if length != 4 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 4)?;
    let time = BacnetTime::new(data[consumed], data[consumed + 1], data[consumed + 2], data[consumed + 3]);
    consumed += 4;
    Ok((time, consumed))
}

pub fn encode_object_identifier(buffer: &mut Vec<u8>, id: ObjectIdentifier) -> Result<()> {
    if !id.is_valid() {
        return Err(EncodingError::ValueOutOfRange);
    }
    encode_application_tag(buffer, ApplicationTag::ObjectIdentifier, 4)?;
    buffer.extend_from_slice(&id.pack().to_be_bytes());
    Ok(())
}

pub fn decode_object_identifier(data: &[u8]) -> Result<(ObjectIdentifier, usize)> {
    let (tag, length, mut consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::ObjectIdentifier {
        return Err(EncodingError::InvalidTag);
    }
    if length != 4 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 4)?;
    let word = u32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    consumed += 4;
    Ok((ObjectIdentifier::unpack(word), consumed))
}

/// Encode an unsigned integer under a context tag rather than its
/// application tag, for use inside a service's context-tagged parameter
/// list (clause 20.2.1.2).
pub fn encode_context_unsigned(value: u32, tag_number: u8) -> Result<Vec<u8>> {
    let bytes = minimal_unsigned_bytes(value);
    let mut buffer = Vec::new();
    context::encode_context_tag(&mut buffer, tag_number, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(buffer)
}

/// Decode an unsigned integer tagged with the given context tag number.
pub fn decode_context_unsigned(data: &[u8], expected_tag: u8) -> Result<(u32, usize)> {
    let (tag_number, length, mut consumed) = context::decode_context_tag(data)?;
    if tag_number != expected_tag {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let value = decode_unsigned_bytes(&data[consumed..consumed + length])?;
    consumed += length;
    Ok((value, consumed))
}

/// Encode an enumerated value under a context tag.
pub fn encode_context_enumerated(value: u32, tag_number: u8) -> Result<Vec<u8>> {
    let bytes = minimal_unsigned_bytes(value);
    let mut buffer = Vec::new();
    context::encode_context_tag(&mut buffer, tag_number, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(buffer)
}

/// Decode an enumerated value tagged with the given context tag number.
pub fn decode_context_enumerated(data: &[u8], expected_tag: u8) -> Result<(u32, usize)> {
    let (tag_number, length, mut consumed) = context::decode_context_tag(data)?;
    if tag_number != expected_tag {
        return Err(EncodingError::InvalidTag);
    }
    require(data, consumed + length)?;
    let value = decode_unsigned_bytes(&data[consumed..consumed + length])?;
    consumed += length;
    Ok((value, consumed))
}

/// Encode an object identifier under a context tag. `object_type` is the
/// raw 10-bit type code rather than the `ObjectType` enum, since callers
/// sometimes hold an object identifier for a type this crate doesn't
/// itself model.
pub fn encode_context_object_id(object_type: u16, instance: u32, tag_number: u8) -> Result<Vec<u8>> {
    let id = ObjectIdentifier::new(object_type, instance);
    if !id.is_valid() {
        return Err(EncodingError::ValueOutOfRange);
    }
    let mut buffer = Vec::new();
    context::encode_context_tag(&mut buffer, tag_number, 4)?;
    buffer.extend_from_slice(&id.pack().to_be_bytes());
    Ok(buffer)
}

/// Decode an object identifier tagged with the given context tag number,
/// returning the raw `(object_type, instance)` pair.
pub fn decode_context_object_id(data: &[u8], expected_tag: u8) -> Result<((u16, u32), usize)> {
    let (tag_number, length, mut consumed) = context::decode_context_tag(data)?;
    if tag_number != expected_tag {
        return Err(EncodingError::InvalidTag);
    }
    if length != 4 {
        return Err(EncodingError::LengthMismatch);
    }
    require(data, consumed + 4)?;
    let word = u32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    consumed += 4;
    let id = ObjectIdentifier::unpack(word);
    Ok(((id.object_type, id.instance), consumed))
}

/// Context-specific tag encoding/decoding (bit 3 of the tag byte set).
/// Context tags carry a property- or service-specific tag number rather
/// than a universal application type, and the extended-tag-number escape
/// (tag field = 0xF) matters here since context tag numbers run 0-255.
pub mod context {
    use super::*;

    pub fn encode_context_tag(buffer: &mut Vec<u8>, tag_number: u8, length: usize) -> Result<()> {
        let lv = if length < 5 { length as u8 } else { 5 };
        if tag_number < 15 {
            buffer.push(0x08 | (tag_number << 4) | lv);
        } else {
            buffer.push(0x08 | 0xF0 | lv);
            buffer.push(tag_number);
        }
        if length >= 5 {
            encode_length_extension(buffer, length);
        }
        Ok(())
    }

    /// Returns `(tag_number, length, bytes consumed by the tag itself)`.
    pub fn decode_context_tag(data: &[u8]) -> Result<(u8, usize, usize)> {
        if data.is_empty() {
            return Err(EncodingError::Truncated);
        }
        let tag_byte = data[0];
        if tag_byte & 0x08 == 0 {
            return Err(EncodingError::InvalidTag);
        }
        let mut pos = 1;
        let tag_number = if (tag_byte >> 4) == 0x0F {
            if data.len() < 2 {
                return Err(EncodingError::Truncated);
            }
            let extended = data[1];
            pos += 1;
            extended
        } else {
            tag_byte >> 4
        };
        let lv = tag_byte & 0x07;
        if lv < 5 {
            Ok((tag_number, lv as usize, pos))
        } else {
            let (length, ext) = decode_length_extension(&data[pos..])?;
            Ok((tag_number, length, pos + ext))
        }
    }

    /// Encode an opening tag (type-code 6) for constructed data.
    pub fn encode_opening_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
        encode_open_close(buffer, tag_number, 6)
    }

    /// Encode a closing tag (type-code 7) for constructed data.
    pub fn encode_closing_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
        encode_open_close(buffer, tag_number, 7)
    }

    fn encode_open_close(buffer: &mut Vec<u8>, tag_number: u8, type_code: u8) -> Result<()> {
        if tag_number < 15 {
            buffer.push(0x08 | (tag_number << 4) | type_code);
        } else {
            buffer.push(0x08 | 0xF0 | type_code);
            buffer.push(tag_number);
        }
        Ok(())
    }

    /// Returns `Some((tag_number, bytes consumed))` if the byte(s) at the
    /// front of `data` form an opening tag (type-code 6).
    pub fn decode_opening_tag(data: &[u8]) -> Result<Option<(u8, usize)>> {
        decode_open_close(data, 6)
    }

    /// Same as [`decode_opening_tag`] but for closing tags (type-code 7).
    pub fn decode_closing_tag(data: &[u8]) -> Result<Option<(u8, usize)>> {
        decode_open_close(data, 7)
    }

    fn decode_open_close(data: &[u8], type_code: u8) -> Result<Option<(u8, usize)>> {
        if data.is_empty() {
            return Err(EncodingError::Truncated);
        }
        let tag_byte = data[0];
        if tag_byte & 0x08 == 0 || (tag_byte & 0x07) != type_code {
            return Ok(None);
        }
        if (tag_byte >> 4) == 0x0F {
            if data.len() < 2 {
                return Err(EncodingError::Truncated);
            }
            Ok(Some((data[1], 2)))
        } else {
            Ok(Some((tag_byte >> 4, 1)))
        }
    }

    /// Encode a context-tagged application value (wraps the value's raw
    /// payload in a context-numbered tag instead of its application tag).
    pub fn encode_context_value(buffer: &mut Vec<u8>, tag_number: u8, value: &ApplicationValue) -> Result<()> {
        match value {
            ApplicationValue::Null => encode_context_tag(buffer, tag_number, 0),
            ApplicationValue::Boolean(v) => encode_context_tag(buffer, tag_number, if *v { 1 } else { 0 }),
            ApplicationValue::Unsigned(v) => {
                let bytes = minimal_unsigned_bytes(*v);
                encode_context_tag(buffer, tag_number, bytes.len())?;
                buffer.extend_from_slice(&bytes);
                Ok(())
            }
            ApplicationValue::Signed(v) => {
                let bytes = minimal_signed_bytes(*v);
                encode_context_tag(buffer, tag_number, bytes.len())?;
                buffer.extend_from_slice(&bytes);
                Ok(())
            }
            ApplicationValue::Enumerated(v) => {
                let bytes = minimal_unsigned_bytes(*v);
                encode_context_tag(buffer, tag_number, bytes.len())?;
                buffer.extend_from_slice(&bytes);
                Ok(())
            }
            ApplicationValue::Real(v) => {
                encode_context_tag(buffer, tag_number, 4)?;
                buffer.extend_from_slice(&v.to_be_bytes());
                Ok(())
            }
            ApplicationValue::Double(v) => {
                encode_context_tag(buffer, tag_number, 8)?;
                buffer.extend_from_slice(&v.to_be_bytes());
                Ok(())
            }
            ApplicationValue::ObjectIdentifier(id) => {
                if !id.is_valid() {
                    return Err(EncodingError::ValueOutOfRange);
                }
                encode_context_tag(buffer, tag_number, 4)?;
                buffer.extend_from_slice(&id.pack().to_be_bytes());
                Ok(())
            }
            ApplicationValue::CharacterString(s) => {
                let bytes = s.as_bytes();
                encode_context_tag(buffer, tag_number, bytes.len() + 1)?;
                buffer.push(0);
                buffer.extend_from_slice(bytes);
                Ok(())
            }
            ApplicationValue::OctetString(bytes) => {
                encode_context_tag(buffer, tag_number, bytes.len())?;
                buffer.extend_from_slice(bytes);
                Ok(())
            }
            ApplicationValue::Date(d) => {
                encode_context_tag(buffer, tag_number, 4)?;
                buffer.extend_from_slice(&[date_year_byte(d.year), d.month, d.day, d.weekday]);
                Ok(())
            }
            ApplicationValue::Time(t) => {
                encode_context_tag(buffer, tag_number, 4)?;
                buffer.extend_from_slice(&[t.hour, t.minute, t.second, t.hundredths]);
                Ok(())
            }
            ApplicationValue::BitString(bs) => {
                let byte_count = (bs.bits.len() + 7) / 8;
                encode_context_tag(buffer, tag_number, byte_count + 1)?;
                buffer.push(bs.unused_bits());
                pack_bits(buffer, &bs.bits);
                Ok(())
            }
        }
    }

    /// Decode a context-tagged value whose application type is known ahead
    /// of time (context tags carry no type information of their own).
    pub fn decode_context_value(
        data: &[u8],
        expected_tag: u8,
        tag: ApplicationTag,
    ) -> Result<(ApplicationValue, usize)> {
        let (tag_number, length, mut consumed) = decode_context_tag(data)?;
        if tag_number != expected_tag {
            return Err(EncodingError::InvalidTag);
        }
        require(data, consumed + length)?;
        let body = &data[consumed..consumed + length];
        let value = match tag {
            ApplicationTag::Null => ApplicationValue::Null,
            ApplicationTag::Boolean => ApplicationValue::Boolean(length == 1),
            ApplicationTag::UnsignedInt => ApplicationValue::Unsigned(decode_unsigned_bytes(body)?),
            ApplicationTag::SignedInt => {
                let value = match length {
                    1 => body[0] as i8 as i32,
                    2 => i16::from_be_bytes([body[0], body[1]]) as i32,
                    3 => {
                        let sign_extend = if body[0] & 0x80 != 0 { 0xFF } else { 0x00 };
                        i32::from_be_bytes([sign_extend, body[0], body[1], body[2]])
                    }
                    4 => i32::from_be_bytes([body[0], body[1], body[2], body[3]]),
                    _ => return Err(EncodingError::LengthMismatch),
                };
                ApplicationValue::Signed(value)
            }
            ApplicationTag::Real => {
                if length != 4 {
                    return Err(EncodingError::LengthMismatch);
                }
                ApplicationValue::Real(f32::from_be_bytes(body.try_into().unwrap()))
            }
            ApplicationTag::Double => {
                if length != 8 {
                    return Err(EncodingError::LengthMismatch);
                }
                ApplicationValue::Double(f64::from_be_bytes(body.try_into().unwrap()))
            }
            ApplicationTag::OctetString => ApplicationValue::OctetString(body.to_vec()),
            ApplicationTag::CharacterString => {
                if body.is_empty() {
                    return Err(EncodingError::LengthMismatch);
                }
                let value = match body[0] {
                    0 => String::from_utf8(body[1..].to_vec())
                        .map_err(|_| EncodingError::InvalidFormat("invalid UTF-8 character string".to_string()))?,
                    5 => {
                        let units: Vec<u16> =
                            body[1..].chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
                        String::from_utf16(&units).map_err(|_| {
                            EncodingError::InvalidFormat("invalid UTF-16 character string".to_string())
                        })?
                    }
                    c => return Err(EncodingError::InvalidFormat(format!("unsupported character set {}", c))),
                };
                ApplicationValue::CharacterString(value)
            }
            ApplicationTag::BitString => {
                if body.is_empty() {
                    return Err(EncodingError::LengthMismatch);
                }
                let unused_bits = body[0] as usize;
                if unused_bits > 7 {
                    return Err(EncodingError::InvalidFormat("unused-bits count > 7".to_string()));
                }
                let byte_count = body.len() - 1;
                let mut bits = Vec::new();
                for i in 0..byte_count {
                    let byte_val = body[1 + i];
                    let bits_in_byte = if i == byte_count - 1 { 8 - unused_bits } else { 8 };
                    for bit_pos in 0..bits_in_byte {
                        bits.push((byte_val & (1 << (7 - bit_pos))) != 0);
                    }
                }
                ApplicationValue::BitString(BitString::new(bits))
            }
            ApplicationTag::Enumerated => ApplicationValue::Enumerated(decode_unsigned_bytes(body)?),
            ApplicationTag::Date => {
                if length != 4 {
                    return Err(EncodingError::LengthMismatch);
                }
                ApplicationValue::Date(BacnetDate {
                    year: date_year_from_byte(body[0]),
                    month: body[1],
                    day: body[2],
                    weekday: body[3],
                })
            }
            ApplicationTag::Time => {
                if length != 4 {
                    return Err(EncodingError::LengthMismatch);
                }
                ApplicationValue::Time(BacnetTime::new(body[0], body[1], body[2], body[3]))
            }
            ApplicationTag::ObjectIdentifier => {
                if length != 4 {
                    return Err(EncodingError::LengthMismatch);
                }
                ApplicationValue::ObjectIdentifier(ObjectIdentifier::unpack(u32::from_be_bytes(
                    body.try_into().unwrap(),
                )))
            }
        };
        consumed += length;
        Ok((value, consumed))
    }
}

/// Compute the length, in bytes, of the constructed data spanned by a
/// matching opening/closing tag pair with number `tag_number` at the front
/// of `data` (the opening tag itself must be the first byte(s)). Returns
/// the count *excluding* the outer opening/closing tags.
///
/// Nested opening tags with the same `tag_number` increment a depth
/// counter; nested tags with a different number, and primitive values, are
/// skipped over by their own declared width. Fails if the stream runs out
/// before depth returns to zero.
pub fn bacapp_data_len(data: &[u8], tag_number: u8) -> Result<usize> {
    let (opened_number, opening_width) = context::decode_opening_tag(data)?.ok_or(EncodingError::InvalidTag)?;
    if opened_number != tag_number {
        return Err(EncodingError::InvalidTag);
    }
    let start = opening_width;
    let mut pos = opening_width;
    let mut depth = 1usize;

    while depth > 0 {
        if pos >= data.len() {
            return Err(EncodingError::UnbalancedConstructedData);
        }
        let rest = &data[pos..];

        if let Some((n, consumed)) = context::decode_opening_tag(rest)? {
            pos += consumed;
            if n == tag_number {
                depth += 1;
            }
            continue;
        }
        if let Some((n, consumed)) = context::decode_closing_tag(rest)? {
            pos += consumed;
            if n == tag_number {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos - consumed - start);
                }
            }
            continue;
        }

        let tag_byte = rest[0];
        if tag_byte & 0x08 != 0 {
            let (_, length, consumed) = context::decode_context_tag(rest)?;
            pos += consumed + length;
        } else {
            let (_, length, consumed) = decode_application_tag(rest)?;
            pos += consumed + length;
        }
    }

    Ok(pos - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: ApplicationValue) {
        let mut buf = Vec::new();
        let written = value.encode(Some(&mut buf)).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(written, value.encoded_len());
        let (decoded, consumed) = ApplicationValue::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn primitive_round_trip_all_variants() {
        roundtrip(ApplicationValue::Null);
        roundtrip(ApplicationValue::Boolean(true));
        roundtrip(ApplicationValue::Boolean(false));
        roundtrip(ApplicationValue::Unsigned(0));
        roundtrip(ApplicationValue::Unsigned(255));
        roundtrip(ApplicationValue::Unsigned(65536));
        roundtrip(ApplicationValue::Unsigned(u32::MAX));
        roundtrip(ApplicationValue::Signed(-1));
        roundtrip(ApplicationValue::Signed(-8_000_000));
        roundtrip(ApplicationValue::Signed(i32::MAX));
        roundtrip(ApplicationValue::Real(23.5));
        roundtrip(ApplicationValue::Double(23.5));
        roundtrip(ApplicationValue::OctetString(vec![1, 2, 3]));
        roundtrip(ApplicationValue::CharacterString("hello".to_string()));
        roundtrip(ApplicationValue::BitString(BitString::new(vec![true, false, true, true, false])));
        roundtrip(ApplicationValue::Enumerated(42));
        roundtrip(ApplicationValue::Date(BacnetDate { year: 2024, month: 5, day: 17, weekday: 5 }));
        roundtrip(ApplicationValue::Time(BacnetTime::new(13, 30, 0, 0)));
        roundtrip(ApplicationValue::ObjectIdentifier(ObjectIdentifier::new(0, 123)));
    }

    #[test]
    fn character_string_decodes_iso_8859_1() {
        // 0xE9 in ISO 8859-1 is U+00E9 (e with acute accent).
        let mut buf = Vec::new();
        encode_application_tag(&mut buf, ApplicationTag::CharacterString, 2).unwrap();
        buf.push(3);
        buf.push(0xE9);
        let (decoded, consumed) = decode_character_string(&buf).unwrap();
        assert_eq!(decoded, "\u{e9}");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn unsigned_uses_minimum_width() {
        let mut buf = Vec::new();
        encode_unsigned(&mut buf, 42).unwrap();
        assert_eq!(buf, vec![0x21, 42]);

        let mut buf = Vec::new();
        encode_unsigned(&mut buf, 300).unwrap();
        assert_eq!(buf[0] >> 4, ApplicationTag::UnsignedInt as u8);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn null_length_prediction_matches_actual_encode() {
        let value = ApplicationValue::CharacterString("predict me".to_string());
        let predicted = value.encoded_len();
        let mut buf = Vec::new();
        let written = value.encode(Some(&mut buf)).unwrap();
        assert_eq!(predicted, written);
    }

    #[test]
    fn context_tag_number_round_trips_above_fourteen() {
        let mut buf = Vec::new();
        context::encode_context_tag(&mut buf, 200, 3).unwrap();
        let (n, length, consumed) = context::decode_context_tag(&buf).unwrap();
        assert_eq!(n, 200);
        assert_eq!(length, 3);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn context_value_round_trips() {
        let mut buf = Vec::new();
        let value = ApplicationValue::Unsigned(99);
        context::encode_context_value(&mut buf, 3, &value).unwrap();
        let (decoded, consumed) = context::decode_context_value(&buf, 3, ApplicationTag::UnsignedInt).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn opening_closing_tags_round_trip_with_extended_numbers() {
        let mut buf = Vec::new();
        context::encode_opening_tag(&mut buf, 20).unwrap();
        let (n, consumed) = context::decode_opening_tag(&buf).unwrap().unwrap();
        assert_eq!(n, 20);
        assert_eq!(consumed, 2);

        let mut buf = Vec::new();
        context::encode_closing_tag(&mut buf, 3).unwrap();
        let (n, consumed) = context::decode_closing_tag(&buf).unwrap().unwrap();
        assert_eq!(n, 3);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn bacapp_data_len_spans_matched_tags() {
        let mut buf = Vec::new();
        context::encode_opening_tag(&mut buf, 1).unwrap();
        let inner_start = buf.len();
        encode_unsigned(&mut buf, 7).unwrap();
        encode_real(&mut buf, 1.5).unwrap();
        let inner_len = buf.len() - inner_start;
        context::encode_closing_tag(&mut buf, 1).unwrap();

        let len = bacapp_data_len(&buf, 1).unwrap();
        assert_eq!(len, inner_len);
    }

    #[test]
    fn bacapp_data_len_handles_nested_same_number_tags() {
        let mut buf = Vec::new();
        context::encode_opening_tag(&mut buf, 2).unwrap();
        let inner_start = buf.len();
        context::encode_opening_tag(&mut buf, 2).unwrap();
        encode_unsigned(&mut buf, 1).unwrap();
        context::encode_closing_tag(&mut buf, 2).unwrap();
        let inner_len = buf.len() - inner_start;
        context::encode_closing_tag(&mut buf, 2).unwrap();

        let len = bacapp_data_len(&buf, 2).unwrap();
        assert_eq!(len, inner_len);
    }

    #[test]
    fn bacapp_data_len_rejects_unbalanced_stream() {
        let mut buf = Vec::new();
        context::encode_opening_tag(&mut buf, 1).unwrap();
        encode_unsigned(&mut buf, 1).unwrap();
        assert!(matches!(bacapp_data_len(&buf, 1), Err(EncodingError::UnbalancedConstructedData)));
    }

    #[test]
    fn decode_rejects_truncated_length_extension() {
        let buf = vec![0x25];
        assert!(matches!(decode_application_tag(&buf), Err(EncodingError::Truncated)));
    }

    #[test]
    fn object_identifier_packs_type_and_instance() {
        let id = ObjectIdentifier::new(3, 100);
        assert_eq!(id.pack(), (3u32 << 22) | 100);
        assert_eq!(ObjectIdentifier::unpack(id.pack()), id);
    }

    #[test]
    fn date_wildcard_matches_any_value() {
        let wildcard = BacnetDate::wildcard();
        let concrete = BacnetDate { year: 2024, month: 3, day: 14, weekday: 4 };
        assert!(wildcard.matches(&concrete));
        assert!(concrete.matches(&wildcard));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unsigned_round_trips(value in any::<u32>()) {
            let mut buf = Vec::new();
            encode_unsigned(&mut buf, value).unwrap();
            let (decoded, consumed) = decode_unsigned(&buf).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn signed_round_trips(value in any::<i32>()) {
            let mut buf = Vec::new();
            encode_signed(&mut buf, value).unwrap();
            let (decoded, consumed) = decode_signed(&buf).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn real_round_trips(value in any::<f32>().prop_filter("skip NaN", |v| !v.is_nan())) {
            let app = ApplicationValue::Real(value);
            let mut buf = Vec::new();
            app.encode(Some(&mut buf)).unwrap();
            let (decoded, consumed) = ApplicationValue::decode(&buf).unwrap();
            prop_assert_eq!(decoded, app);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn character_string_round_trips(value in "\\PC*") {
            let app = ApplicationValue::CharacterString(value.clone());
            let mut buf = Vec::new();
            app.encode(Some(&mut buf)).unwrap();
            let (decoded, consumed) = ApplicationValue::decode(&buf).unwrap();
            prop_assert_eq!(decoded, ApplicationValue::CharacterString(value));
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn object_identifier_pack_unpack_round_trips(
            object_type in 0u32..1024,
            instance in 0u32..=0x3F_FFFF,
        ) {
            let id = ObjectIdentifier { object_type: object_type as u16, instance };
            let packed = id.pack();
            prop_assert_eq!(ObjectIdentifier::unpack(packed), id);
        }
    }
}
