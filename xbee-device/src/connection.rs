//! Contract of the link between the host and the module.
//!
//! Building a connection (serial port settings, USB permissions, ...) is up to the caller; the
//! device only drives an already constructed [ConnectionInterface].

use std::io;
use std::time::Duration;

use crate::error::XBeeError;

/// Duplex, frame oriented link to a module running in API mode.
///
/// Frames handed to [write_frame](ConnectionInterface::write_frame) and returned by
/// [read_frame](ConnectionInterface::read_frame) are API frame contents (frame type byte and frame
/// data); the implementation adds and strips the delimiter, length, checksum and escaping.
pub trait ConnectionInterface {
    /// Opens the link. Fails with [ErrorKind::InterfaceAlreadyOpen](crate::ErrorKind) when the
    /// link is already open.
    fn open(&mut self) -> Result<(), XBeeError>;

    /// Closes the link. Closing a closed link does nothing.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Blocks up to `timeout` for the next complete frame. `Ok(None)` means the timeout elapsed.
    fn read_frame(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>>;
}

impl<T: ConnectionInterface + ?Sized> ConnectionInterface for Box<T> {
    fn open(&mut self) -> Result<(), XBeeError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        (**self).read_frame(timeout)
    }
}
