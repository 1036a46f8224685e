//! Addressing and message models exchanged between the device and its callers.

use std::fmt;

use bitflags::bitflags;

use crate::protocol::XBeeProtocol;

/// Globally unique 64-bit address of a module (the `SH`/`SL` pair).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct XBee64BitAddress(pub u64);

/// Network-assigned 16-bit address of a module (`MY`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct XBee16BitAddress(pub u16);

impl XBee64BitAddress {
    pub const COORDINATOR: Self = XBee64BitAddress(0x0000_0000_0000_0000);
    pub const BROADCAST: Self = XBee64BitAddress(0x0000_0000_0000_FFFF);
    pub const UNKNOWN: Self = XBee64BitAddress(0xFFFF_FFFF_FFFF_FFFF);

    /// Builds the address from the `SH` (high) and `SL` (low) halves.
    pub fn from_halves(high: u32, low: u32) -> Self {
        XBee64BitAddress(((high as u64) << 32) | low as u64)
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// An address that designates exactly one module.
    pub fn is_unicast(&self) -> bool {
        *self != Self::UNKNOWN && *self != Self::BROADCAST
    }
}

impl XBee16BitAddress {
    pub const COORDINATOR: Self = XBee16BitAddress(0x0000);
    pub const BROADCAST: Self = XBee16BitAddress(0xFFFF);
    pub const UNKNOWN: Self = XBee16BitAddress(0xFFFE);

    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn is_unicast(&self) -> bool {
        *self != Self::UNKNOWN && *self != Self::BROADCAST
    }
}

impl From<u64> for XBee64BitAddress {
    fn from(inner: u64) -> Self {
        XBee64BitAddress(inner)
    }
}

impl From<u16> for XBee16BitAddress {
    fn from(inner: u16) -> Self {
        XBee16BitAddress(inner)
    }
}

impl fmt::Display for XBee64BitAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl fmt::Display for XBee16BitAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

bitflags! {
    /// Options byte of a transmit request.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct TransmitOptions: u8 {
        const DISABLE_ACK = 0x01;
        /// DigiMesh and point-to-multipoint only.
        const DISABLE_ROUTE_DISCOVERY = 0x02;
        /// ZigBee only.
        const ENABLE_APS_ENCRYPTION = 0x20;
        const USE_EXTENDED_TIMEOUT = 0x40;
    }
}

impl Default for TransmitOptions {
    fn default() -> Self {
        TransmitOptions::empty()
    }
}

/// Delivery status reported by the module for a transmit request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TransmitStatus(pub u8);

impl TransmitStatus {
    pub const SUCCESS: Self = TransmitStatus(0x00);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            0x00 => "Success",
            0x01 => "No acknowledgement received",
            0x02 => "CCA failure",
            0x03 => "Transmission purged, it was attempted before stack was up",
            0x15 => "Invalid destination endpoint",
            0x21 => "Network ACK failure",
            0x22 => "Not joined to network",
            0x23 => "Self-addressed",
            0x24 => "Address not found",
            0x25 => "Route not found",
            0x26 => "Broadcast source failed to hear a neighbor relay the message",
            0x2B => "Invalid binding table index",
            0x2C => "Resource error lack of free buffers, timers, etc.",
            0x74 => "Data payload too large",
            0x75 => "Indirect message unrequested",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for TransmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.0)
    }
}

/// A node reachable through the radio network of a local device.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteXBeeDevice {
    pub address64: XBee64BitAddress,
    pub address16: XBee16BitAddress,
    pub node_id: Option<String>,
    pub protocol: XBeeProtocol,
}

impl RemoteXBeeDevice {
    pub fn new(address64: XBee64BitAddress, protocol: XBeeProtocol) -> Self {
        Self {
            address64,
            address16: XBee16BitAddress::UNKNOWN,
            node_id: None,
            protocol,
        }
    }

    pub fn with_address16(mut self, address16: XBee16BitAddress) -> Self {
        self.address16 = address16;
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

/// Data packet received from a remote node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XBeeMessage {
    pub source64: XBee64BitAddress,
    pub source16: XBee16BitAddress,
    pub data: Vec<u8>,
    /// The packet was sent as a broadcast.
    pub broadcast: bool,
}
