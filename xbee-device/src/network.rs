//! Network topology view of a local device.
//!
//! An [XBeeNetwork] is an inventory of the remote nodes known to one local device. It is tagged
//! with the protocol of the device that built it and bound to that device's 64-bit address.
//! Building one never talks to the module; nodes are added as the caller learns about them.

use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;

use crate::error::XBeeError;
use crate::models::{RemoteXBeeDevice, XBee16BitAddress, XBee64BitAddress};
use crate::protocol::XBeeProtocol;

/// Number of remote nodes remembered by default. Least recently used nodes are forgotten first.
pub const DEFAULT_NETWORK_CAPACITY: usize = 128;

#[derive(Debug)]
pub struct XBeeNetwork {
    protocol: XBeeProtocol,
    local: XBee64BitAddress,
    nodes: LruCache<XBee64BitAddress, RemoteXBeeDevice>,
}

impl XBeeNetwork {
    fn new(protocol: XBeeProtocol, local: XBee64BitAddress, capacity: NonZeroUsize) -> Self {
        debug!("Building {} network view for local device {}.", protocol, local);
        Self {
            protocol,
            local,
            nodes: LruCache::new(capacity),
        }
    }

    pub fn digi_mesh(local: XBee64BitAddress, capacity: NonZeroUsize) -> Self {
        Self::new(XBeeProtocol::DigiMesh, local, capacity)
    }

    pub fn digi_point(local: XBee64BitAddress, capacity: NonZeroUsize) -> Self {
        Self::new(XBeeProtocol::DigiPoint, local, capacity)
    }

    pub fn raw_802(local: XBee64BitAddress, capacity: NonZeroUsize) -> Self {
        Self::new(XBeeProtocol::Raw802, local, capacity)
    }

    pub fn zigbee(local: XBee64BitAddress, capacity: NonZeroUsize) -> Self {
        Self::new(XBeeProtocol::ZigBee, local, capacity)
    }

    pub fn protocol(&self) -> XBeeProtocol {
        self.protocol
    }

    /// 64-bit address of the local device owning this view.
    pub fn local_address(&self) -> XBee64BitAddress {
        self.local
    }

    /// Adds a remote node, or refreshes the one already known under the same 64-bit address.
    ///
    /// Returns `true` if the node was not known before. The node's protocol is forced to the
    /// network's, and its 16-bit address is dropped on protocols that do not use them.
    pub fn add_remote_device(&mut self, mut remote: RemoteXBeeDevice) -> Result<bool, XBeeError> {
        if !remote.address64.is_unicast() {
            return Err(XBeeError::invalid_argument(format!(
                "Remote device address {} cannot identify a single node.",
                remote.address64
            )));
        }
        if remote.address64 == self.local {
            return Err(XBeeError::invalid_argument(
                "The local device cannot be part of its own remote inventory.",
            ));
        }
        remote.protocol = self.protocol;
        if !self.protocol.uses_16bit_addresses() {
            remote.address16 = XBee16BitAddress::UNKNOWN;
        }

        if let Some(known) = self.nodes.get_mut(&remote.address64) {
            if remote.address16 != XBee16BitAddress::UNKNOWN {
                known.address16 = remote.address16;
            }
            if remote.node_id.is_some() {
                known.node_id = remote.node_id;
            }
            return Ok(false);
        }
        if let Some((evicted, _)) = self.nodes.push(remote.address64, remote) {
            debug!("Network inventory full, forgetting remote device {}.", evicted);
        }
        Ok(true)
    }

    pub fn remove_remote_device(&mut self, address: XBee64BitAddress) -> Option<RemoteXBeeDevice> {
        self.nodes.pop(&address)
    }

    pub fn get_device(&self, address: XBee64BitAddress) -> Option<&RemoteXBeeDevice> {
        self.nodes.peek(&address)
    }

    pub fn get_device_by_address16(&self, address: XBee16BitAddress) -> Option<&RemoteXBeeDevice> {
        if !address.is_unicast() {
            return None;
        }
        self.nodes
            .iter()
            .map(|(_, remote)| remote)
            .find(|remote| remote.address16 == address)
    }

    pub fn get_device_by_node_id(&self, node_id: &str) -> Option<&RemoteXBeeDevice> {
        self.nodes
            .iter()
            .map(|(_, remote)| remote)
            .find(|remote| remote.node_id.as_deref() == Some(node_id))
    }

    /// Snapshot of the known nodes, most recently added or refreshed first.
    pub fn devices(&self) -> Vec<RemoteXBeeDevice> {
        self.nodes.iter().map(|(_, remote)| remote.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
