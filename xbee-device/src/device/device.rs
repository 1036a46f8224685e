use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use ringbuf::HeapRb;
use ringbuf::Rb;

use super::frame::{ApiFrame, AtCommand, AtCommandStatus, FrameError, FrameId};
use crate::connection::ConnectionInterface;
use crate::error::{ErrorKind, XBeeError};
use crate::models::{
    TransmitOptions, TransmitStatus, XBee16BitAddress, XBee64BitAddress, XBeeMessage,
};
use crate::network::{XBeeNetwork, DEFAULT_NETWORK_CAPACITY};
use crate::protocol::XBeeProtocol;

pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(2000);
/// Received packets kept while the device waits for a response. Oldest are dropped first.
pub const DEFAULT_RX_QUEUE_CAPACITY: usize = 50;
/// `0` lets the module use its maximum number of hops.
pub const DEFAULT_BROADCAST_RADIUS: u8 = 0;

/// Tunables of a device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// How long to wait for a response (AT command or transmit status) from the module.
    pub receive_timeout: Duration,
    pub rx_queue_capacity: usize,
    pub network_capacity: NonZeroUsize,
    pub broadcast_radius: u8,
    pub transmit_options: TransmitOptions,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            rx_queue_capacity: DEFAULT_RX_QUEUE_CAPACITY,
            network_capacity: NonZeroUsize::new(DEFAULT_NETWORK_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            broadcast_radius: DEFAULT_BROADCAST_RADIUS,
            transmit_options: TransmitOptions::empty(),
        }
    }
}

/// Whether the instance drives the module attached to the host, or a node reached through
/// another local device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceMode {
    Local,
    Remote,
}

/// Transmit frame family used for data sends.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TransmitFormat {
    /// `0x10` transmit request, answered by a `0x8B` transmit status.
    Addressed,
    /// Legacy 802.15.4 `0x00`/`0x01` requests, answered by a `0x89` TX status.
    Legacy,
}

/// Information read from the module when it is opened.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeviceInfo {
    pub protocol: Option<XBeeProtocol>,
    pub address64: Option<XBee64BitAddress>,
    pub address16: Option<XBee16BitAddress>,
    pub node_id: Option<String>,
    pub hardware_version: Option<u16>,
    pub firmware_version: Option<String>,
}

/// Generic XBee device: lifecycle, identity probe, addressed sends and the cached network view.
///
/// Protocol specific behaviour lives in [XBeeDevice](super::XBeeDevice), which wraps this type.
pub struct LocalDevice<C>
where
    C: ConnectionInterface,
{
    connection: C,
    mode: DeviceMode,
    config: DeviceConfig,
    info: DeviceInfo,
    identity_validated: bool,
    network: Option<XBeeNetwork>,
    rx_queue: HeapRb<XBeeMessage>,
    next_frame_id: FrameId,
}

impl<C> LocalDevice<C>
where
    C: ConnectionInterface,
{
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, DeviceMode::Local, DeviceConfig::default())
    }

    /// A device modelling a remote node, reached through `connection`.
    pub fn new_remote(connection: C) -> Self {
        Self::with_config(connection, DeviceMode::Remote, DeviceConfig::default())
    }

    pub fn with_config(connection: C, mode: DeviceMode, config: DeviceConfig) -> Self {
        let rx_queue = HeapRb::new(config.rx_queue_capacity.max(1));
        Self {
            connection,
            mode,
            config,
            info: DeviceInfo::default(),
            identity_validated: false,
            network: None,
            rx_queue,
            next_frame_id: 1,
        }
    }

    /// Opens the connection and reads the module's identity and addresses.
    ///
    /// If the module does not answer, the connection is closed again before the error is returned.
    pub fn open(&mut self) -> Result<(), XBeeError> {
        if self.connection.is_open() {
            return Err(XBeeError::interface_already_open());
        }
        info!("Opening connection interface ({:?} device).", self.mode);
        self.connection.open()?;
        self.identity_validated = false;
        if let Err(err) = self.read_device_info() {
            warn!("Module did not answer the identity probe, closing connection: {}", err);
            self.connection.close();
            return Err(err);
        }
        info!(
            "Connection open, module reports {} firmware {}.",
            self.info.protocol.unwrap_or(XBeeProtocol::Unknown),
            self.info.firmware_version.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }

    /// Closes the connection. Closing a closed device does nothing; the network view is kept.
    pub fn close(&mut self) {
        if self.connection.is_open() {
            info!("Closing connection interface.");
        }
        self.connection.close();
        self.identity_validated = false;
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn is_remote(&self) -> bool {
        self.mode == DeviceMode::Remote
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Protocol reported by the module, `None` until the first successful open.
    pub fn hardware_protocol(&self) -> Option<XBeeProtocol> {
        self.info.protocol
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn address64(&self) -> Option<XBee64BitAddress> {
        self.info.address64
    }

    pub fn address16(&self) -> Option<XBee16BitAddress> {
        self.info.address16
    }

    pub fn node_id(&self) -> Option<&str> {
        self.info.node_id.as_deref()
    }

    /// The device is open and its variant confirmed the module speaks the expected protocol.
    pub fn is_identity_validated(&self) -> bool {
        self.identity_validated && self.is_open()
    }

    pub(crate) fn set_identity_validated(&mut self) {
        self.identity_validated = true;
    }

    pub fn receive_timeout(&self) -> Duration {
        self.config.receive_timeout
    }

    pub fn set_receive_timeout(&mut self, timeout: Duration) {
        self.config.receive_timeout = timeout;
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Sends `data` and blocks until the module reports the delivery status, or the receive
    /// timeout elapses.
    pub fn send_data(
        &mut self,
        address64: Option<XBee64BitAddress>,
        address16: Option<XBee16BitAddress>,
        data: &[u8],
    ) -> Result<(), XBeeError> {
        self.send_with(address64, address16, data, TransmitFormat::Addressed, true)
    }

    /// Hands `data` to the connection and returns without waiting for any delivery status.
    pub fn send_data_async(
        &mut self,
        address64: Option<XBee64BitAddress>,
        address16: Option<XBee16BitAddress>,
        data: &[u8],
    ) -> Result<(), XBeeError> {
        self.send_with(address64, address16, data, TransmitFormat::Addressed, false)
    }

    /// Sends `data` to every node of the network and waits for the transmit status.
    pub fn send_broadcast_data(&mut self, data: &[u8]) -> Result<(), XBeeError> {
        self.broadcast_with(data, TransmitFormat::Addressed)
    }

    /// Next received data packet. Packets that arrived while the device was waiting for a
    /// response come first. `Ok(None)` when nothing arrives within `timeout`; a zero timeout
    /// still reads the connection once.
    pub fn read_data(&mut self, timeout: Duration) -> Result<Option<XBeeMessage>, XBeeError> {
        if !self.is_open() {
            return Err(XBeeError::interface_not_open());
        }
        if let Some(message) = self.rx_queue.pop() {
            return Ok(Some(message));
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = match self.next_frame(remaining)? {
                Some(frame) => frame,
                None => return Ok(None),
            };
            if let Some(message) = to_message(&frame) {
                return Ok(Some(message));
            }
            trace!("Dropping {:?} frame while reading data.", frame.frame_type());
            if remaining.is_zero() {
                return Ok(None);
            }
        }
    }

    /// Network view of this device, built by `build` on first access and cached afterwards.
    pub(crate) fn network_with<F>(&mut self, build: F) -> Result<&mut XBeeNetwork, XBeeError>
    where
        F: FnOnce(XBee64BitAddress, NonZeroUsize) -> XBeeNetwork,
    {
        if !self.is_open() {
            return Err(XBeeError::interface_not_open());
        }
        let local = self.info.address64.unwrap_or(XBee64BitAddress::UNKNOWN);
        let capacity = self.config.network_capacity;
        Ok(self.network.get_or_insert_with(|| build(local, capacity)))
    }

    /// Single entry point of every unicast send: preconditions are only checked here.
    pub(crate) fn send_with(
        &mut self,
        address64: Option<XBee64BitAddress>,
        address16: Option<XBee16BitAddress>,
        data: &[u8],
        format: TransmitFormat,
        sync: bool,
    ) -> Result<(), XBeeError> {
        if !self.is_open() {
            return Err(XBeeError::interface_not_open());
        }
        let resolvable = address64.map_or(false, |a| a.is_unicast())
            || address16.map_or(false, |a| a.is_unicast());
        if !resolvable {
            return Err(XBeeError::invalid_argument(
                "At least one of the 64-bit or 16-bit destination addresses must identify a single node.",
            ));
        }
        if data.is_empty() {
            return Err(XBeeError::invalid_argument("Data to send cannot be empty."));
        }
        let address64 = address64.unwrap_or(XBee64BitAddress::UNKNOWN);
        let address16 = address16.unwrap_or(XBee16BitAddress::UNKNOWN);
        self.transmit(address64, address16, data, format, sync)
    }

    pub(crate) fn broadcast_with(
        &mut self,
        data: &[u8],
        format: TransmitFormat,
    ) -> Result<(), XBeeError> {
        if !self.is_open() {
            return Err(XBeeError::interface_not_open());
        }
        if data.is_empty() {
            return Err(XBeeError::invalid_argument("Data to send cannot be empty."));
        }
        self.transmit(
            XBee64BitAddress::BROADCAST,
            XBee16BitAddress::UNKNOWN,
            data,
            format,
            true,
        )
    }

    fn transmit(
        &mut self,
        address64: XBee64BitAddress,
        address16: XBee16BitAddress,
        data: &[u8],
        format: TransmitFormat,
        sync: bool,
    ) -> Result<(), XBeeError> {
        let frame_id = if sync { self.next_frame_id() } else { 0 };
        let options = self.config.transmit_options;
        let frame = match format {
            TransmitFormat::Addressed => ApiFrame::TransmitRequest {
                frame_id,
                dest64: address64,
                dest16: address16,
                broadcast_radius: self.config.broadcast_radius,
                options,
                payload: data.to_vec(),
            },
            TransmitFormat::Legacy if address64.is_unicast() || !address16.is_unicast() => {
                ApiFrame::Tx64Request {
                    frame_id,
                    dest64: address64,
                    options,
                    payload: data.to_vec(),
                }
            }
            TransmitFormat::Legacy => ApiFrame::Tx16Request {
                frame_id,
                dest16: address16,
                options,
                payload: data.to_vec(),
            },
        };
        debug!(
            "Sending {} bytes to {}/{} (frame {}, {}).",
            data.len(),
            address64,
            address16,
            frame_id,
            if sync { "sync" } else { "async" }
        );
        self.write(&frame)?;
        if !sync {
            return Ok(());
        }

        let delivery = match self.wait_for_response(frame_id)? {
            ApiFrame::TransmitStatus { delivery, .. } | ApiFrame::TxStatus { delivery, .. } => {
                delivery
            }
            other => {
                return Err(XBeeError::with_message(
                    ErrorKind::Communication,
                    Some(format!(
                        "Expected a transmit status for frame {}, got {:?}.",
                        frame_id,
                        other.frame_type()
                    )),
                ))
            }
        };
        check_delivery(delivery)
    }

    /// Reads `HV`, `VR`, `SH`, `SL`, `NI` and `MY` and records what the module reports.
    fn read_device_info(&mut self) -> Result<(), XBeeError> {
        let hardware = be_value(&self.query(*b"HV")?) as u16;
        let firmware_raw = self.query(*b"VR")?;
        let firmware: String = firmware_raw.iter().map(|b| format!("{:02X}", b)).collect();
        let high = be_value(&self.query(*b"SH")?) as u32;
        let low = be_value(&self.query(*b"SL")?) as u32;

        let node_id = match self.at_command(*b"NI")? {
            (status, value) if status.is_ok() => {
                Some(String::from_utf8_lossy(&value).trim().to_owned())
            }
            _ => None,
        };
        let address16 = match self.at_command(*b"MY")? {
            (status, value) if status.is_ok() && !value.is_empty() => {
                XBee16BitAddress(be_value(&value) as u16)
            }
            _ => XBee16BitAddress::UNKNOWN,
        };

        let protocol = XBeeProtocol::determine((hardware >> 8) as u8, &firmware);
        self.info = DeviceInfo {
            protocol: Some(protocol),
            address64: Some(XBee64BitAddress::from_halves(high, low)),
            address16: Some(address16),
            node_id,
            hardware_version: Some(hardware),
            firmware_version: Some(firmware),
        };
        Ok(())
    }

    /// AT command whose failure status is an error.
    fn query(&mut self, command: AtCommand) -> Result<Vec<u8>, XBeeError> {
        match self.at_command(command)? {
            (status, value) if status.is_ok() => Ok(value),
            (status, _) => Err(XBeeError::with_message(
                ErrorKind::Communication,
                Some(format!(
                    "AT command '{}' failed: {}.",
                    String::from_utf8_lossy(&command),
                    status.description()
                )),
            )),
        }
    }

    fn at_command(&mut self, command: AtCommand) -> Result<(AtCommandStatus, Vec<u8>), XBeeError> {
        let frame_id = self.next_frame_id();
        self.write(&ApiFrame::AtCommand {
            frame_id,
            command,
            parameter: Vec::new(),
        })?;
        match self.wait_for_response(frame_id)? {
            ApiFrame::AtCommandResponse {
                command: answered,
                status,
                value,
                ..
            } if answered == command => Ok((status, value)),
            other => Err(XBeeError::with_message(
                ErrorKind::Communication,
                Some(format!(
                    "Unexpected answer to AT command '{}': {:?}.",
                    String::from_utf8_lossy(&command),
                    other
                )),
            )),
        }
    }

    fn write(&mut self, frame: &ApiFrame) -> Result<(), XBeeError> {
        trace!("-> {:?}", frame);
        self.connection.write_frame(&frame.to_bytes())?;
        Ok(())
    }

    /// Reads frames until the response carrying `frame_id` arrives. Data packets received in the
    /// meantime are queued for [read_data](Self::read_data).
    fn wait_for_response(&mut self, frame_id: FrameId) -> Result<ApiFrame, XBeeError> {
        let deadline = Instant::now() + self.config.receive_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(XBeeError::timeout());
            }
            let frame = match self.next_frame(remaining)? {
                Some(frame) => frame,
                None => return Err(XBeeError::timeout()),
            };
            if frame.frame_id() == Some(frame_id) {
                return Ok(frame);
            }
            if let Some(message) = to_message(&frame) {
                debug!(
                    "Queueing {} bytes received from {} while waiting for frame {}.",
                    message.data.len(),
                    message.source64,
                    frame_id
                );
                self.rx_queue.push_overwrite(message);
            } else {
                trace!("Ignoring unrelated {:?} frame.", frame.frame_type());
            }
        }
    }

    /// Next frame this library can decode. Frames of unknown types and malformed frames are
    /// skipped, the deadline decides when to give up.
    fn next_frame(&mut self, timeout: Duration) -> Result<Option<ApiFrame>, XBeeError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let bytes = match self.connection.read_frame(remaining)? {
                Some(bytes) => bytes,
                None => return Ok(None),
            };
            match ApiFrame::try_from_bytes(&bytes) {
                Ok(frame) => {
                    trace!("<- {:?}", frame);
                    return Ok(Some(frame));
                }
                Err(FrameError::UnknownFrameType { frame_type }) => {
                    trace!("Skipping frame of unsupported type 0x{:02X}.", frame_type);
                }
                Err(err) => {
                    warn!("Skipping undecodable frame {:02X?}: {}", bytes, err);
                }
            }
            if remaining.is_zero() {
                return Ok(None);
            }
        }
    }

    fn next_frame_id(&mut self) -> FrameId {
        let id = self.next_frame_id;
        self.next_frame_id = if id == u8::MAX { 1 } else { id + 1 };
        id
    }
}

fn check_delivery(delivery: TransmitStatus) -> Result<(), XBeeError> {
    if delivery.is_success() {
        Ok(())
    } else {
        warn!("Module reported delivery failure: {}", delivery);
        Err(XBeeError::with_message(
            ErrorKind::Transmit,
            Some(format!("Error transmitting the packet: {}.", delivery)),
        ))
    }
}

fn to_message(frame: &ApiFrame) -> Option<XBeeMessage> {
    let broadcast = frame.is_broadcast();
    match frame {
        ApiFrame::ReceivePacket {
            source64,
            source16,
            payload,
            ..
        } => Some(XBeeMessage {
            source64: *source64,
            source16: *source16,
            data: payload.clone(),
            broadcast,
        }),
        ApiFrame::Rx64Indicator {
            source64, payload, ..
        } => Some(XBeeMessage {
            source64: *source64,
            source16: XBee16BitAddress::UNKNOWN,
            data: payload.clone(),
            broadcast,
        }),
        ApiFrame::Rx16Indicator {
            source16, payload, ..
        } => Some(XBeeMessage {
            source64: XBee64BitAddress::UNKNOWN,
            source16: *source16,
            data: payload.clone(),
            broadcast,
        }),
        _ => None,
    }
}

/// Big-endian integer value of an AT response, at most 8 significant bytes.
fn be_value(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}
