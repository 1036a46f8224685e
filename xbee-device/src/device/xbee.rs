use std::num::NonZeroUsize;
use std::time::Duration;

use log::{info, warn};

use super::device::{LocalDevice, TransmitFormat};
use crate::connection::ConnectionInterface;
use crate::error::{ErrorKind, XBeeError};
use crate::models::{RemoteXBeeDevice, XBee16BitAddress, XBee64BitAddress, XBeeMessage};
use crate::network::XBeeNetwork;
use crate::protocol::XBeeProtocol;

/// XBee device specialised for the radio protocol the caller expects the module to run.
///
/// Each variant fixes its protocol identity. Opening a local device checks the module actually
/// runs that protocol; every variant builds its own network view and shapes the destination
/// addresses of sends for its protocol before handing them to the shared [LocalDevice].
pub enum XBeeDevice<C>
where
    C: ConnectionInterface,
{
    DigiMesh(LocalDevice<C>),
    DigiPoint(LocalDevice<C>),
    Raw802(LocalDevice<C>),
    ZigBee(LocalDevice<C>),
}

impl<C> XBeeDevice<C>
where
    C: ConnectionInterface,
{
    pub fn digi_mesh(connection: C) -> Self {
        XBeeDevice::DigiMesh(LocalDevice::new(connection))
    }

    pub fn digi_point(connection: C) -> Self {
        XBeeDevice::DigiPoint(LocalDevice::new(connection))
    }

    pub fn raw_802(connection: C) -> Self {
        XBeeDevice::Raw802(LocalDevice::new(connection))
    }

    pub fn zigbee(connection: C) -> Self {
        XBeeDevice::ZigBee(LocalDevice::new(connection))
    }

    /// Wraps an already configured device (local or remote) into the variant of `protocol`.
    pub fn from_device(protocol: XBeeProtocol, device: LocalDevice<C>) -> Result<Self, XBeeError> {
        match protocol {
            XBeeProtocol::DigiMesh => Ok(XBeeDevice::DigiMesh(device)),
            XBeeProtocol::DigiPoint => Ok(XBeeDevice::DigiPoint(device)),
            XBeeProtocol::Raw802 => Ok(XBeeDevice::Raw802(device)),
            XBeeProtocol::ZigBee => Ok(XBeeDevice::ZigBee(device)),
            other => Err(XBeeError::invalid_argument(format!(
                "No device variant for the {} protocol.",
                other
            ))),
        }
    }

    /// Protocol this variant expects. Known before the device is opened.
    pub fn get_protocol(&self) -> XBeeProtocol {
        match self {
            XBeeDevice::DigiMesh(_) => XBeeProtocol::DigiMesh,
            XBeeDevice::DigiPoint(_) => XBeeProtocol::DigiPoint,
            XBeeDevice::Raw802(_) => XBeeProtocol::Raw802,
            XBeeDevice::ZigBee(_) => XBeeProtocol::ZigBee,
        }
    }

    pub fn local(&self) -> &LocalDevice<C> {
        match self {
            XBeeDevice::DigiMesh(device)
            | XBeeDevice::DigiPoint(device)
            | XBeeDevice::Raw802(device)
            | XBeeDevice::ZigBee(device) => device,
        }
    }

    fn local_mut(&mut self) -> &mut LocalDevice<C> {
        match self {
            XBeeDevice::DigiMesh(device)
            | XBeeDevice::DigiPoint(device)
            | XBeeDevice::Raw802(device)
            | XBeeDevice::ZigBee(device) => device,
        }
    }

    pub fn into_local(self) -> LocalDevice<C> {
        match self {
            XBeeDevice::DigiMesh(device)
            | XBeeDevice::DigiPoint(device)
            | XBeeDevice::Raw802(device)
            | XBeeDevice::ZigBee(device) => device,
        }
    }

    /// Opens the device, then checks the module runs the expected protocol.
    ///
    /// On a protocol mismatch the connection stays open: closing it is up to the caller.
    /// Remote devices are never checked.
    pub fn open(&mut self) -> Result<(), XBeeError> {
        let expected = self.get_protocol();
        let device = self.local_mut();
        device.open()?;
        if device.is_remote() {
            return Ok(());
        }
        let actual = device.hardware_protocol().unwrap_or(XBeeProtocol::Unknown);
        if actual != expected {
            warn!("Module runs {} while a {} device was expected.", actual, expected);
            return Err(XBeeError::with_message(
                ErrorKind::DeviceIdentity,
                Some(format!(
                    "XBee device is not a {} device, it is a {} device.",
                    expected.description(),
                    actual.description()
                )),
            ));
        }
        device.set_identity_validated();
        info!("{} device validated.", expected);
        Ok(())
    }

    pub fn close(&mut self) {
        self.local_mut().close()
    }

    pub fn is_open(&self) -> bool {
        self.local().is_open()
    }

    pub fn is_remote(&self) -> bool {
        self.local().is_remote()
    }

    /// Network view of the device, built on first call and returned unchanged afterwards.
    pub fn get_network(&mut self) -> Result<&mut XBeeNetwork, XBeeError> {
        let build: fn(XBee64BitAddress, NonZeroUsize) -> XBeeNetwork = match self {
            XBeeDevice::DigiMesh(_) => XBeeNetwork::digi_mesh,
            XBeeDevice::DigiPoint(_) => XBeeNetwork::digi_point,
            XBeeDevice::Raw802(_) => XBeeNetwork::raw_802,
            XBeeDevice::ZigBee(_) => XBeeNetwork::zigbee,
        };
        self.local_mut().network_with(build)
    }

    /// Sends `data` to the node designated by the 64-bit and/or 16-bit address and waits for the
    /// delivery status.
    ///
    /// DigiMesh nodes are only addressed by their 64-bit address; a 16-bit address is ignored.
    /// 802.15.4 devices use the 64-bit address when it identifies a node, the 16-bit one
    /// otherwise. Point-to-multipoint and ZigBee devices hand both addresses to the module.
    pub fn send_data(
        &mut self,
        address64: Option<XBee64BitAddress>,
        address16: Option<XBee16BitAddress>,
        data: &[u8],
    ) -> Result<(), XBeeError> {
        let (address16, format) = self.shape(address16);
        self.local_mut().send_with(address64, address16, data, format, true)
    }

    /// Same as [send_data](Self::send_data) without waiting for the delivery status.
    pub fn send_data_async(
        &mut self,
        address64: Option<XBee64BitAddress>,
        address16: Option<XBee16BitAddress>,
        data: &[u8],
    ) -> Result<(), XBeeError> {
        let (address16, format) = self.shape(address16);
        self.local_mut().send_with(address64, address16, data, format, false)
    }

    pub fn send_data_to(
        &mut self,
        remote: &RemoteXBeeDevice,
        data: &[u8],
    ) -> Result<(), XBeeError> {
        self.send_data(Some(remote.address64), Some(remote.address16), data)
    }

    pub fn send_broadcast_data(&mut self, data: &[u8]) -> Result<(), XBeeError> {
        let (_, format) = self.shape(None);
        self.local_mut().broadcast_with(data, format)
    }

    pub fn read_data(&mut self, timeout: Duration) -> Result<Option<XBeeMessage>, XBeeError> {
        self.local_mut().read_data(timeout)
    }

    /// 16-bit address and transmit frame family the protocol uses.
    fn shape(
        &self,
        address16: Option<XBee16BitAddress>,
    ) -> (Option<XBee16BitAddress>, TransmitFormat) {
        match self {
            XBeeDevice::DigiMesh(_) => (None, TransmitFormat::Addressed),
            XBeeDevice::Raw802(_) => (address16, TransmitFormat::Legacy),
            XBeeDevice::DigiPoint(_) | XBeeDevice::ZigBee(_) => (address16, TransmitFormat::Addressed),
        }
    }
}
