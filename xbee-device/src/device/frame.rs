//! API frame contents exchanged with the module.
//!
//! A frame here is the frame type byte followed by the frame specific data. The start delimiter,
//! length, checksum and escaping are the connection interface's business.

use crate::models::{TransmitOptions, TransmitStatus, XBee16BitAddress, XBee64BitAddress};

/// Trait to calculate the size of every component of a frame.
pub trait FrameSize {
    /// Encoded size in bytes.
    fn size(&self) -> usize;
}

/// Frame identifier, correlates a request with its response. `0` asks for no response.
pub type FrameId = u8;

/// Two ASCII characters naming an AT command (e.g. `*b"VR"`).
pub type AtCommand = [u8; 2];

/// API frame types this library emits or understands.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApiFrameType {
    Tx64Request = 0x00,
    Tx16Request = 0x01,
    AtCommand = 0x08,
    TransmitRequest = 0x10,
    Rx64Indicator = 0x80,
    Rx16Indicator = 0x81,
    AtCommandResponse = 0x88,
    TxStatus = 0x89,
    TransmitStatus = 0x8B,
    ReceivePacket = 0x90,
}

impl TryFrom<u8> for ApiFrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => ApiFrameType::Tx64Request,
            0x01 => ApiFrameType::Tx16Request,
            0x08 => ApiFrameType::AtCommand,
            0x10 => ApiFrameType::TransmitRequest,
            0x80 => ApiFrameType::Rx64Indicator,
            0x81 => ApiFrameType::Rx16Indicator,
            0x88 => ApiFrameType::AtCommandResponse,
            0x89 => ApiFrameType::TxStatus,
            0x8B => ApiFrameType::TransmitStatus,
            0x90 => ApiFrameType::ReceivePacket,
            other => return Err(FrameError::UnknownFrameType { frame_type: other }),
        })
    }
}

/// Status byte of an AT command response.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AtCommandStatus(pub u8);

impl AtCommandStatus {
    pub const OK: Self = AtCommandStatus(0);

    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            0 => "Status OK",
            1 => "Status Error",
            2 => "Invalid command",
            3 => "Invalid parameter",
            4 => "TX failure",
            _ => "Unknown status",
        }
    }
}

/// Receive options bits signalling a broadcast.
const RX_OPTIONS_BROADCAST: u8 = 0x02;
const RX_OPTIONS_PAN_BROADCAST: u8 = 0x04;

/// Typed representation of an API frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiFrame {
    AtCommand {
        frame_id: FrameId,
        command: AtCommand,
        parameter: Vec<u8>,
    },
    AtCommandResponse {
        frame_id: FrameId,
        command: AtCommand,
        status: AtCommandStatus,
        value: Vec<u8>,
    },
    TransmitRequest {
        frame_id: FrameId,
        dest64: XBee64BitAddress,
        dest16: XBee16BitAddress,
        broadcast_radius: u8,
        options: TransmitOptions,
        payload: Vec<u8>,
    },
    TransmitStatus {
        frame_id: FrameId,
        dest16: XBee16BitAddress,
        retries: u8,
        delivery: TransmitStatus,
        discovery: u8,
    },
    Tx64Request {
        frame_id: FrameId,
        dest64: XBee64BitAddress,
        options: TransmitOptions,
        payload: Vec<u8>,
    },
    Tx16Request {
        frame_id: FrameId,
        dest16: XBee16BitAddress,
        options: TransmitOptions,
        payload: Vec<u8>,
    },
    TxStatus {
        frame_id: FrameId,
        delivery: TransmitStatus,
    },
    ReceivePacket {
        source64: XBee64BitAddress,
        source16: XBee16BitAddress,
        options: u8,
        payload: Vec<u8>,
    },
    Rx64Indicator {
        source64: XBee64BitAddress,
        rssi: u8,
        options: u8,
        payload: Vec<u8>,
    },
    Rx16Indicator {
        source16: XBee16BitAddress,
        rssi: u8,
        options: u8,
        payload: Vec<u8>,
    },
}

impl ApiFrame {
    pub fn frame_type(&self) -> ApiFrameType {
        match self {
            ApiFrame::AtCommand { .. } => ApiFrameType::AtCommand,
            ApiFrame::AtCommandResponse { .. } => ApiFrameType::AtCommandResponse,
            ApiFrame::TransmitRequest { .. } => ApiFrameType::TransmitRequest,
            ApiFrame::TransmitStatus { .. } => ApiFrameType::TransmitStatus,
            ApiFrame::Tx64Request { .. } => ApiFrameType::Tx64Request,
            ApiFrame::Tx16Request { .. } => ApiFrameType::Tx16Request,
            ApiFrame::TxStatus { .. } => ApiFrameType::TxStatus,
            ApiFrame::ReceivePacket { .. } => ApiFrameType::ReceivePacket,
            ApiFrame::Rx64Indicator { .. } => ApiFrameType::Rx64Indicator,
            ApiFrame::Rx16Indicator { .. } => ApiFrameType::Rx16Indicator,
        }
    }

    /// Frame identifier, for the frame types that carry one.
    pub fn frame_id(&self) -> Option<FrameId> {
        match self {
            ApiFrame::AtCommand { frame_id, .. }
            | ApiFrame::AtCommandResponse { frame_id, .. }
            | ApiFrame::TransmitRequest { frame_id, .. }
            | ApiFrame::TransmitStatus { frame_id, .. }
            | ApiFrame::Tx64Request { frame_id, .. }
            | ApiFrame::Tx16Request { frame_id, .. }
            | ApiFrame::TxStatus { frame_id, .. } => Some(*frame_id),
            ApiFrame::ReceivePacket { .. }
            | ApiFrame::Rx64Indicator { .. }
            | ApiFrame::Rx16Indicator { .. } => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.push(self.frame_type() as u8);
        match self {
            ApiFrame::AtCommand {
                frame_id,
                command,
                parameter,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(command);
                bytes.extend_from_slice(parameter);
            }
            ApiFrame::AtCommandResponse {
                frame_id,
                command,
                status,
                value,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(command);
                bytes.push(status.0);
                bytes.extend_from_slice(value);
            }
            ApiFrame::TransmitRequest {
                frame_id,
                dest64,
                dest16,
                broadcast_radius,
                options,
                payload,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(&dest64.to_bytes());
                bytes.extend_from_slice(&dest16.to_bytes());
                bytes.push(*broadcast_radius);
                bytes.push(options.bits());
                bytes.extend_from_slice(payload);
            }
            ApiFrame::TransmitStatus {
                frame_id,
                dest16,
                retries,
                delivery,
                discovery,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(&dest16.to_bytes());
                bytes.push(*retries);
                bytes.push(delivery.0);
                bytes.push(*discovery);
            }
            ApiFrame::Tx64Request {
                frame_id,
                dest64,
                options,
                payload,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(&dest64.to_bytes());
                bytes.push(options.bits());
                bytes.extend_from_slice(payload);
            }
            ApiFrame::Tx16Request {
                frame_id,
                dest16,
                options,
                payload,
            } => {
                bytes.push(*frame_id);
                bytes.extend_from_slice(&dest16.to_bytes());
                bytes.push(options.bits());
                bytes.extend_from_slice(payload);
            }
            ApiFrame::TxStatus { frame_id, delivery } => {
                bytes.push(*frame_id);
                bytes.push(delivery.0);
            }
            ApiFrame::ReceivePacket {
                source64,
                source16,
                options,
                payload,
            } => {
                bytes.extend_from_slice(&source64.to_bytes());
                bytes.extend_from_slice(&source16.to_bytes());
                bytes.push(*options);
                bytes.extend_from_slice(payload);
            }
            ApiFrame::Rx64Indicator {
                source64,
                rssi,
                options,
                payload,
            } => {
                bytes.extend_from_slice(&source64.to_bytes());
                bytes.push(*rssi);
                bytes.push(*options);
                bytes.extend_from_slice(payload);
            }
            ApiFrame::Rx16Indicator {
                source16,
                rssi,
                options,
                payload,
            } => {
                bytes.extend_from_slice(&source16.to_bytes());
                bytes.push(*rssi);
                bytes.push(*options);
                bytes.extend_from_slice(payload);
            }
        }
        bytes
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let (&type_byte, data) = bytes.split_first().ok_or(FrameError::InvalidFrame {
            context: Some("Frame is empty (0 byte).".to_owned()),
        })?;
        let frame_type = ApiFrameType::try_from(type_byte)?;
        let mut reader = Reader::new(frame_type, data);
        let frame = match frame_type {
            ApiFrameType::AtCommand => ApiFrame::AtCommand {
                frame_id: reader.u8()?,
                command: reader.command()?,
                parameter: reader.rest(),
            },
            ApiFrameType::AtCommandResponse => ApiFrame::AtCommandResponse {
                frame_id: reader.u8()?,
                command: reader.command()?,
                status: AtCommandStatus(reader.u8()?),
                value: reader.rest(),
            },
            ApiFrameType::TransmitRequest => ApiFrame::TransmitRequest {
                frame_id: reader.u8()?,
                dest64: reader.address64()?,
                dest16: reader.address16()?,
                broadcast_radius: reader.u8()?,
                options: TransmitOptions::from_bits_retain(reader.u8()?),
                payload: reader.rest(),
            },
            ApiFrameType::TransmitStatus => ApiFrame::TransmitStatus {
                frame_id: reader.u8()?,
                dest16: reader.address16()?,
                retries: reader.u8()?,
                delivery: TransmitStatus(reader.u8()?),
                discovery: reader.u8()?,
            },
            ApiFrameType::Tx64Request => ApiFrame::Tx64Request {
                frame_id: reader.u8()?,
                dest64: reader.address64()?,
                options: TransmitOptions::from_bits_retain(reader.u8()?),
                payload: reader.rest(),
            },
            ApiFrameType::Tx16Request => ApiFrame::Tx16Request {
                frame_id: reader.u8()?,
                dest16: reader.address16()?,
                options: TransmitOptions::from_bits_retain(reader.u8()?),
                payload: reader.rest(),
            },
            ApiFrameType::TxStatus => ApiFrame::TxStatus {
                frame_id: reader.u8()?,
                delivery: TransmitStatus(reader.u8()?),
            },
            ApiFrameType::ReceivePacket => ApiFrame::ReceivePacket {
                source64: reader.address64()?,
                source16: reader.address16()?,
                options: reader.u8()?,
                payload: reader.rest(),
            },
            ApiFrameType::Rx64Indicator => ApiFrame::Rx64Indicator {
                source64: reader.address64()?,
                rssi: reader.u8()?,
                options: reader.u8()?,
                payload: reader.rest(),
            },
            ApiFrameType::Rx16Indicator => ApiFrame::Rx16Indicator {
                source16: reader.address16()?,
                rssi: reader.u8()?,
                options: reader.u8()?,
                payload: reader.rest(),
            },
        };
        Ok(frame)
    }

    /// Whether a receive frame was addressed as a broadcast. Always false for other frames.
    pub fn is_broadcast(&self) -> bool {
        match self {
            ApiFrame::ReceivePacket { options, .. } => options & RX_OPTIONS_BROADCAST != 0,
            ApiFrame::Rx64Indicator { options, .. } | ApiFrame::Rx16Indicator { options, .. } => {
                options & (RX_OPTIONS_BROADCAST | RX_OPTIONS_PAN_BROADCAST) != 0
            }
            _ => false,
        }
    }
}

/// Cursor over the frame specific data, failing with context when the frame is too short.
struct Reader<'a> {
    frame_type: ApiFrameType,
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    fn new(frame_type: ApiFrameType, bytes: &'a [u8]) -> Self {
        Self {
            frame_type,
            bytes,
            cursor: 0,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.bytes.len() < self.cursor + n {
            return Err(FrameError::InvalidFrame {
                context: Some(format!(
                    "{:?} frame is too small: needs {} bytes at offset {}, only {} available.",
                    self.frame_type,
                    n,
                    self.cursor,
                    self.bytes.len()
                )),
            });
        }
        let slice = &self.bytes[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn command(&mut self) -> Result<AtCommand, FrameError> {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(self.take(2)?);
        Ok(raw)
    }

    fn address64(&mut self) -> Result<XBee64BitAddress, FrameError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(XBee64BitAddress(u64::from_be_bytes(raw)))
    }

    fn address16(&mut self) -> Result<XBee16BitAddress, FrameError> {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(self.take(2)?);
        Ok(XBee16BitAddress(u16::from_be_bytes(raw)))
    }

    fn rest(&mut self) -> Vec<u8> {
        let rest = self.bytes[self.cursor..].to_vec();
        self.cursor = self.bytes.len();
        rest
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("Invalid frame. Context: {}", .context.as_deref().unwrap_or("<none>"))]
    InvalidFrame { context: Option<String> },

    #[error("Unknown API frame type 0x{:02X}.", .frame_type)]
    UnknownFrameType { frame_type: u8 },
}

impl FrameSize for XBee64BitAddress {
    fn size(&self) -> usize {
        8
    }
}

impl FrameSize for XBee16BitAddress {
    fn size(&self) -> usize {
        2
    }
}

impl FrameSize for ApiFrame {
    fn size(&self) -> usize {
        // Frame type byte, then the frame specific data.
        1 + match self {
            ApiFrame::AtCommand { parameter, .. } => 1 + 2 + parameter.len(),
            ApiFrame::AtCommandResponse { value, .. } => 1 + 2 + 1 + value.len(),
            ApiFrame::TransmitRequest {
                dest64,
                dest16,
                payload,
                ..
            } => 1 + dest64.size() + dest16.size() + 2 + payload.len(),
            ApiFrame::TransmitStatus { dest16, .. } => 1 + dest16.size() + 3,
            ApiFrame::Tx64Request {
                dest64, payload, ..
            } => 1 + dest64.size() + 1 + payload.len(),
            ApiFrame::Tx16Request {
                dest16, payload, ..
            } => 1 + dest16.size() + 1 + payload.len(),
            ApiFrame::TxStatus { .. } => 2,
            ApiFrame::ReceivePacket {
                source64,
                source16,
                payload,
                ..
            } => source64.size() + source16.size() + 1 + payload.len(),
            ApiFrame::Rx64Indicator {
                source64, payload, ..
            } => source64.size() + 2 + payload.len(),
            ApiFrame::Rx16Indicator {
                source16, payload, ..
            } => source16.size() + 2 + payload.len(),
        }
    }
}
