//! Error taxonomy shared by every device operation.
//!
//! Every failure is an [XBeeError] carrying an [ErrorKind], an optional human-readable message
//! and an optional cause. Message and cause are stored exactly as they were supplied: building an
//! error with an absent message keeps it absent, it is never replaced by the kind's default.

use std::error::Error;
use std::fmt;

/// Boxed cause of an [XBeeError].
pub type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Closed set of failure kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// `open` was called while the connection interface is already open.
    InterfaceAlreadyOpen,
    /// An operation that needs an open device was called before a successful `open`.
    InterfaceNotOpen,
    /// The module did not answer within the receive timeout.
    Timeout,
    /// The module reports a protocol other than the one the device variant expects.
    DeviceIdentity,
    /// Missing or contradictory addressing, or an empty payload.
    InvalidArgument,
    /// The module rejected or failed to deliver a transmit request.
    Transmit,
    /// Malformed or failed response, or an I/O failure of the connection interface.
    Communication,
}

impl ErrorKind {
    /// Message used when an error of this kind is built without an explicit one.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::InterfaceAlreadyOpen => "The connection interface is already open.",
            ErrorKind::InterfaceNotOpen => "The connection interface is not open.",
            ErrorKind::Timeout => "There was a timeout while executing the requested operation.",
            ErrorKind::DeviceIdentity => "The XBee device does not run the expected protocol.",
            ErrorKind::InvalidArgument => "Invalid argument.",
            ErrorKind::Transmit => "There was a problem transmitting the XBee API packet.",
            ErrorKind::Communication => "There was a problem communicating with the XBee device.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InterfaceAlreadyOpen => "interface already open",
            ErrorKind::InterfaceNotOpen => "interface not open",
            ErrorKind::Timeout => "timeout",
            ErrorKind::DeviceIdentity => "device identity mismatch",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Transmit => "transmit failure",
            ErrorKind::Communication => "communication failure",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{}", .message.as_deref().unwrap_or("<no message>"))]
pub struct XBeeError {
    kind: ErrorKind,
    message: Option<String>,
    #[source]
    cause: Option<Cause>,
}

impl XBeeError {
    /// Error of the given kind with the kind's default message and no cause.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: Some(kind.default_message().to_owned()),
            cause: None,
        }
    }

    /// Error with an explicit (possibly absent) message and no cause.
    pub fn with_message(kind: ErrorKind, message: Option<String>) -> Self {
        Self {
            kind,
            message,
            cause: None,
        }
    }

    /// Error with an explicit (possibly absent) message and an explicit (possibly absent) cause.
    pub fn with_cause(kind: ErrorKind, message: Option<String>, cause: Option<Cause>) -> Self {
        Self {
            kind,
            message,
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn interface_already_open() -> Self {
        Self::new(ErrorKind::InterfaceAlreadyOpen)
    }

    pub fn interface_not_open() -> Self {
        Self::new(ErrorKind::InterfaceNotOpen)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvalidArgument, Some(context.into()))
    }

    /// Wraps any lower level failure (I/O, frame decoding) as a communication error.
    pub fn communication<E>(context: impl Into<String>, cause: E) -> Self
    where
        E: Into<Cause>,
    {
        Self::with_cause(
            ErrorKind::Communication,
            Some(context.into()),
            Some(cause.into()),
        )
    }
}

impl From<std::io::Error> for XBeeError {
    fn from(err: std::io::Error) -> Self {
        XBeeError::communication("Connection interface I/O error.", err)
    }
}

impl From<crate::device::frame::FrameError> for XBeeError {
    fn from(err: crate::device::frame::FrameError) -> Self {
        XBeeError::communication("Received a malformed API frame.", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ErrorKind; 7] = [
        ErrorKind::InterfaceAlreadyOpen,
        ErrorKind::InterfaceNotOpen,
        ErrorKind::Timeout,
        ErrorKind::DeviceIdentity,
        ErrorKind::InvalidArgument,
        ErrorKind::Transmit,
        ErrorKind::Communication,
    ];

    fn cause() -> Cause {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, "root cause"))
    }

    #[test]
    fn default_shape_uses_fixed_message() {
        let err = XBeeError::interface_already_open();
        assert_eq!(err.kind(), ErrorKind::InterfaceAlreadyOpen);
        assert_eq!(
            err.message(),
            Some("The connection interface is already open.")
        );
        assert!(err.cause().is_none());
        assert!(err.source().is_none());

        for kind in ALL_KINDS {
            let err = XBeeError::new(kind);
            assert_eq!(err.message(), Some(kind.default_message()));
            assert!(err.cause().is_none());
        }
    }

    #[test]
    fn explicit_message_is_kept() {
        for kind in ALL_KINDS {
            let err = XBeeError::with_message(kind, Some("This is the message".to_owned()));
            assert_eq!(err.kind(), kind);
            assert_eq!(err.message(), Some("This is the message"));
            assert!(err.cause().is_none());
            assert_eq!(err.to_string(), "This is the message");
        }
    }

    #[test]
    fn absent_message_stays_absent() {
        for kind in ALL_KINDS {
            let err = XBeeError::with_message(kind, None);
            assert_eq!(err.message(), None);
            assert!(err.cause().is_none());
            assert_eq!(err.to_string(), "<no message>");
        }
    }

    #[test]
    fn message_and_cause_are_kept() {
        for kind in ALL_KINDS {
            let err =
                XBeeError::with_cause(kind, Some("This is the message".to_owned()), Some(cause()));
            assert_eq!(err.message(), Some("This is the message"));
            assert_eq!(err.cause().map(|c| c.to_string()), Some("root cause".to_owned()));
            assert_eq!(err.source().map(|c| c.to_string()), Some("root cause".to_owned()));
        }
    }

    #[test]
    fn absent_message_with_cause_is_not_defaulted() {
        let err = XBeeError::with_cause(ErrorKind::Timeout, None, Some(cause()));
        assert_eq!(err.message(), None);
        let source = err.cause().expect("cause should be kept");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn message_with_absent_cause() {
        let err = XBeeError::with_cause(
            ErrorKind::Transmit,
            Some("This is the message".to_owned()),
            None,
        );
        assert_eq!(err.message(), Some("This is the message"));
        assert!(err.cause().is_none());
    }

    #[test]
    fn both_absent() {
        let err = XBeeError::with_cause(ErrorKind::DeviceIdentity, None, None);
        assert_eq!(err.kind(), ErrorKind::DeviceIdentity);
        assert_eq!(err.message(), None);
        assert!(err.cause().is_none());
    }

    #[test]
    fn io_errors_become_communication_errors() {
        let err: XBeeError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged").into();
        assert_eq!(err.kind(), ErrorKind::Communication);
        assert_eq!(err.cause().map(|c| c.to_string()), Some("unplugged".to_owned()));
    }
}
