//! BACnet Network Layer (NPDU)
//!
//! This module implements only what the application layer needs from clause
//! 6 of the standard: parsing and building the Network Protocol Data Unit
//! that wraps every APDU. Routing (`Who-Is-Router-To-Network` and friends),
//! BBMD/foreign-device registration, and multi-network path discovery are
//! external collaborators — out of scope here, per the core's purpose — and
//! are not implemented.
//!
//! # NPDU layout
//!
//! ```text
//! version (1) | control (1) | [DNET DLEN DADR] | [SNET SLEN SADR] | [hop count] | APDU
//! ```
//!
//! The control byte's bit 7 flags a network-layer message (routing traffic);
//! this crate does not interpret those messages, but [`Npdu::is_network_message`]
//! lets a caller recognize and skip them.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Result type for network layer operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, NetworkError>;

/// Errors encountered while parsing or building an NPDU.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// The NPDU's framing is malformed or too short for its declared fields.
    InvalidNpdu(String),
    /// An unsupported protocol version byte was encountered (only 1 is valid).
    UnsupportedVersion(u8),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidNpdu(msg) => write!(f, "invalid NPDU: {}", msg),
            NetworkError::UnsupportedVersion(v) => write!(f, "unsupported NPDU version: {}", v),
        }
    }
}

#[cfg(feature = "std")]
impl Error for NetworkError {}

/// NPDU control byte flags (clause 6.2.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpduControl {
    /// Bit 7 — this NPDU carries a network-layer message, not an APDU.
    pub network_message: bool,
    /// Bit 5 — DNET/DLEN/DADR fields are present.
    pub destination_present: bool,
    /// Bit 3 — SNET/SLEN/SADR fields are present.
    pub source_present: bool,
    /// Bit 2 — the sender expects a reply (used by routers for path discovery).
    pub expecting_reply: bool,
    /// Bits 0-1 — network priority, 0 (normal) to 3 (life-safety).
    pub priority: u8,
}

impl NpduControl {
    pub fn to_byte(&self) -> u8 {
        let mut byte = 0u8;
        if self.network_message {
            byte |= 0x80;
        }
        if self.destination_present {
            byte |= 0x20;
        }
        if self.source_present {
            byte |= 0x08;
        }
        if self.expecting_reply {
            byte |= 0x04;
        }
        byte |= self.priority & 0x03;
        byte
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            network_message: (byte & 0x80) != 0,
            destination_present: (byte & 0x20) != 0,
            source_present: (byte & 0x08) != 0,
            expecting_reply: (byte & 0x04) != 0,
            priority: byte & 0x03,
        }
    }
}

/// A network number plus the MAC address reached through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAddress {
    /// 0 = local network, 0xFFFF = global broadcast.
    pub network: u16,
    /// MAC address on that network (empty for a broadcast).
    pub address: Vec<u8>,
}

impl NetworkAddress {
    pub fn new(network: u16, address: Vec<u8>) -> Self {
        Self { network, address }
    }

    pub fn is_broadcast(&self) -> bool {
        self.network == 0xFFFF || self.address.is_empty()
    }

    pub fn is_local(&self) -> bool {
        self.network == 0
    }
}

/// Network Protocol Data Unit header.
#[derive(Debug, Clone)]
pub struct Npdu {
    /// Always 1 for the current version of the standard.
    pub version: u8,
    pub control: NpduControl,
    pub destination: Option<NetworkAddress>,
    pub source: Option<NetworkAddress>,
    /// Present only when `destination` is present; decremented by each router hop.
    pub hop_count: Option<u8>,
}

impl Npdu {
    pub fn new() -> Self {
        Self {
            version: 1,
            control: NpduControl::default(),
            destination: None,
            source: None,
            hop_count: None,
        }
    }

    /// An NPDU addressed to the global broadcast network (net = 0xFFFF).
    pub fn global_broadcast() -> Self {
        Self {
            version: 1,
            control: NpduControl {
                destination_present: true,
                ..NpduControl::default()
            },
            destination: Some(NetworkAddress { network: 0xFFFF, address: Vec::new() }),
            source: None,
            hop_count: Some(255),
        }
    }

    /// An NPDU with no network-layer addressing: local network, no routing.
    pub fn local() -> Self {
        Self::new()
    }

    pub fn is_network_message(&self) -> bool {
        self.control.network_message
    }

    /// Encode the NPDU header (the caller appends the APDU bytes).
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.push(self.version);
        buffer.push(self.control.to_byte());

        if let Some(ref dest) = self.destination {
            buffer.extend_from_slice(&dest.network.to_be_bytes());
            buffer.push(dest.address.len() as u8);
            buffer.extend_from_slice(&dest.address);
        }

        if let Some(ref src) = self.source {
            buffer.extend_from_slice(&src.network.to_be_bytes());
            buffer.push(src.address.len() as u8);
            buffer.extend_from_slice(&src.address);
        }

        if self.destination.is_some() {
            buffer.push(self.hop_count.unwrap_or(255));
        }

        buffer
    }

    /// Decode an NPDU header, returning the header and the byte offset of
    /// the APDU that follows it.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 2 {
            return Err(NetworkError::InvalidNpdu("shorter than version+control".into()));
        }

        let mut pos = 0;
        let version = data[pos];
        pos += 1;
        if version != 1 {
            return Err(NetworkError::UnsupportedVersion(version));
        }

        let control = NpduControl::from_byte(data[pos]);
        pos += 1;

        let destination = if control.destination_present {
            if pos + 3 > data.len() {
                return Err(NetworkError::InvalidNpdu("truncated destination address".into()));
            }
            let network = u16::from_be_bytes([data[pos], data[pos + 1]]);
            pos += 2;
            let addr_len = data[pos] as usize;
            pos += 1;
            if pos + addr_len > data.len() {
                return Err(NetworkError::InvalidNpdu("destination address length overruns buffer".into()));
            }
            let address = data[pos..pos + addr_len].to_vec();
            pos += addr_len;
            Some(NetworkAddress::new(network, address))
        } else {
            None
        };

        let source = if control.source_present {
            if pos + 3 > data.len() {
                return Err(NetworkError::InvalidNpdu("truncated source address".into()));
            }
            let network = u16::from_be_bytes([data[pos], data[pos + 1]]);
            pos += 2;
            let addr_len = data[pos] as usize;
            pos += 1;
            if pos + addr_len > data.len() {
                return Err(NetworkError::InvalidNpdu("source address length overruns buffer".into()));
            }
            let address = data[pos..pos + addr_len].to_vec();
            pos += addr_len;
            Some(NetworkAddress::new(network, address))
        } else {
            None
        };

        let hop_count = if destination.is_some() {
            if pos >= data.len() {
                return Err(NetworkError::InvalidNpdu("missing hop count".into()));
            }
            let hc = data[pos];
            pos += 1;
            Some(hc)
        } else {
            None
        };

        Ok((Npdu { version, control, destination, source, hop_count }, pos))
    }
}

impl Default for Npdu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_local_npdu() {
        let npdu = Npdu::local();
        let encoded = npdu.encode();
        let (decoded, consumed) = Npdu::decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.version, 1);
        assert!(decoded.destination.is_none());
        assert!(decoded.source.is_none());
    }

    #[test]
    fn round_trips_global_broadcast() {
        let npdu = Npdu::global_broadcast();
        let encoded = npdu.encode();
        let (decoded, _) = Npdu::decode(&encoded).unwrap();
        assert!(decoded.destination.unwrap().is_broadcast());
        assert_eq!(decoded.hop_count, Some(255));
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = [2u8, 0u8];
        assert!(matches!(Npdu::decode(&bytes), Err(NetworkError::UnsupportedVersion(2))));
    }

    #[test]
    fn rejects_truncated_destination() {
        // destination_present set but only 2 bytes of network number follow
        let bytes = [1u8, 0x20, 0xFF];
        assert!(Npdu::decode(&bytes).is_err());
    }
}
