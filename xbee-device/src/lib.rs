//! Host side driver for a local XBee module running in API mode.
//!
//! The module is reached through a caller supplied [ConnectionInterface]. An [XBeeDevice]
//! variant is picked for the radio protocol the caller expects (DigiMesh, point-to-multipoint,
//! 802.15.4 or ZigBee); opening it checks the module really runs that protocol.
//!
//! ```rust,ignore
//! let mut device = XBeeDevice::digi_point(connection);
//! device.open()?;
//! device.send_data(Some(XBee64BitAddress(0x0013_A200_40A1_B2C3)), None, b"hello")?;
//! let network = device.get_network()?;
//! ```
pub mod connection;
pub mod device;
pub mod error;
pub mod models;
pub mod network;
pub mod protocol;

pub use connection::ConnectionInterface;
pub use device::{DeviceConfig, DeviceMode, LocalDevice, XBeeDevice};
pub use error::{ErrorKind, XBeeError};
pub use models::{
    RemoteXBeeDevice, TransmitOptions, TransmitStatus, XBee16BitAddress, XBee64BitAddress,
    XBeeMessage,
};
pub use network::XBeeNetwork;
pub use protocol::XBeeProtocol;
