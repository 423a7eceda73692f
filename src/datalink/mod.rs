//! BACnet Data Link Layer Boundary
//!
//! The application layer and network layer implemented in this crate never
//! assume a specific physical medium. Instead they talk to whatever media
//! driver is plugged in through the [`DataLink`] trait: BACnet/IP, MS/TP,
//! Ethernet, ARCnet, and BBMD/foreign-device registration are all external
//! collaborators, modeled here purely as an interface. A driver delivers
//! opaque frames plus a source/destination [`DataLinkAddress`]; it is not
//! implemented by this crate.
//!
//! # Architecture
//!
//! Upper layers depend only on [`DataLink`]:
//!
//! ```
//! use bacnet_core::datalink::{DataLink, DataLinkAddress, DataLinkType, Result};
//!
//! struct LoopbackLink {
//!     local: DataLinkAddress,
//!     inbox: Vec<(Vec<u8>, DataLinkAddress)>,
//! }
//!
//! impl DataLink for LoopbackLink {
//!     fn send_frame(&mut self, frame: &[u8], dest: &DataLinkAddress) -> Result<()> {
//!         self.inbox.push((frame.to_vec(), dest.clone()));
//!         Ok(())
//!     }
//!
//!     fn receive_frame(&mut self) -> Result<(Vec<u8>, DataLinkAddress)> {
//!         self.inbox.pop().ok_or(bacnet_core::datalink::DataLinkError::InvalidFrame)
//!     }
//!
//!     fn link_type(&self) -> DataLinkType {
//!         DataLinkType::PointToPoint
//!     }
//!
//!     fn local_address(&self) -> DataLinkAddress {
//!         self.local.clone()
//!     }
//! }
//! ```

#[cfg(feature = "std")]
use std::net::SocketAddr;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Result type for data link operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, DataLinkError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, DataLinkError>;

/// Errors a [`DataLink`] implementation may report.
#[derive(Debug)]
pub enum DataLinkError {
    /// Network I/O error occurred (std drivers only).
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// A received frame does not conform to the link's expected structure.
    InvalidFrame,
    /// CRC/checksum mismatch on a received frame.
    CrcError,
    /// Address resolution or validation failed.
    AddressError(String),
    /// The requested operation is not supported by this link type.
    UnsupportedType,
}

impl core::fmt::Display for DataLinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            #[cfg(feature = "std")]
            DataLinkError::Io(e) => write!(f, "I/O error: {}", e),
            DataLinkError::InvalidFrame => write!(f, "invalid frame format"),
            DataLinkError::CrcError => write!(f, "CRC check failed"),
            DataLinkError::AddressError(msg) => write!(f, "address error: {}", msg),
            DataLinkError::UnsupportedType => write!(f, "unsupported data link type"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DataLinkError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for DataLinkError {
    fn from(e: std::io::Error) -> Self {
        DataLinkError::Io(e)
    }
}

/// Identifies the physical/media technology behind a [`DataLink`].
///
/// The core never instantiates a driver for these: it only needs to know
/// which one it's talking to in order to pick defaults (e.g. max-APDU
/// negotiation is more conservative over MS/TP than BACnet/IP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLinkType {
    /// BACnet/IP (Annex J), UDP port 47808 by convention.
    BacnetIp,
    /// BACnet/Ethernet (ISO 8802-3), Ethernet type 0x82DC.
    Ethernet,
    /// MS/TP (Master-Slave/Token-Passing) over RS-485.
    MsTP,
    /// Point-to-point serial link.
    PointToPoint,
    /// ARCnet.
    Arcnet,
}

/// Common trait implemented by every link-layer driver.
///
/// `send_frame`/`receive_frame` carry NPDUs (network layer and above); the
/// driver is responsible for any media-specific framing, addressing, and CRC.
pub trait DataLink: Send + Sync {
    /// Send one NPDU to `dest`.
    fn send_frame(&mut self, frame: &[u8], dest: &DataLinkAddress) -> Result<()>;

    /// Block until one NPDU arrives; returns it with its source address.
    fn receive_frame(&mut self) -> Result<(Vec<u8>, DataLinkAddress)>;

    /// The media technology this driver implements.
    fn link_type(&self) -> DataLinkType;

    /// This device's own address on the link.
    fn local_address(&self) -> DataLinkAddress;
}

/// A link-layer address, in whichever form the active [`DataLinkType`] uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLinkAddress {
    /// BACnet/IP socket address.
    #[cfg(feature = "std")]
    Ip(SocketAddr),
    /// Ethernet MAC address.
    Ethernet([u8; 6]),
    /// MS/TP station address (0-127 master, 128-254 slave, 255 broadcast).
    MsTP(u8),
    /// Logical broadcast, translated by the driver to the media's broadcast form.
    Broadcast,
}

/// A network-layer address, independent of the underlying link technology.
///
/// This is the address BACnet services and the [`crate::tsm`] key transactions
/// on: `net` identifies the BACnet network number (0 = local, 0xFFFF =
/// global broadcast) and `mac`/`adr` carry the link-layer address within
/// that network, per clause 6 of the standard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Network number. 0 = local network, 0xFFFF = global broadcast.
    pub net: u16,
    /// Number of valid bytes in `mac`.
    pub mac_len: u8,
    /// MAC-layer address (e.g. 6 bytes for BACnet/IP, 1 for MS/TP).
    pub mac: [u8; 7],
    /// Optional remote-network address (routed destinations), present when
    /// `net` refers to a network reached through a router.
    pub adr: Option<[u8; 7]>,
}

impl Address {
    /// A local-network broadcast address.
    pub fn local_broadcast() -> Self {
        Self { net: 0, mac_len: 0, mac: [0; 7], adr: None }
    }

    /// A global broadcast address (net = 0xFFFF).
    pub fn global_broadcast() -> Self {
        Self { net: 0xFFFF, mac_len: 0, mac: [0; 7], adr: None }
    }

    /// True when this address targets the local BACnet network.
    pub fn is_local(&self) -> bool {
        self.net == 0
    }

    /// True when this address is any form of broadcast (no single MAC).
    pub fn is_broadcast(&self) -> bool {
        self.mac_len == 0
    }
}
