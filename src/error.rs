#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{category::VariableCategory, machine::State, variant::PacketKind};

pub type Result<T> = core::result::Result<T, Error>;

/// Error type for the calculator link
///
/// Everything in here is recoverable: the dispatcher logs the error and
/// carries on. Only the effect on the data store is visible to users.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Error {
    /// A framed packet failed checksum verification; the frame is discarded.
    ChecksumMismatch { expected: u8, have: u8 },
    /// The byte source went idle in the middle of a frame.
    TruncatedFrame { len: usize },
    /// A recognized leading tag outside the supported set, e.g. `:DD@`.
    UnsupportedPacket { tag: [u8; 3] },
    /// A two-byte category tag outside the closed category set.
    UnknownCategory { bytes: [u8; 2] },
    /// A BCD byte carrying a nibble above 9.
    BadBcd { byte: u8 },
    /// A packet matching no transition guard in the current state.
    GuardViolation { state: State, kind: PacketKind },
    /// A requested variable absent from the data store.
    ///
    /// Never surfaced to the calculator as an error: the state machine
    /// substitutes an END packet for the variable description.
    NotFound {
        category: VariableCategory,
        name: String,
    },
    /// Generic failure code
    Failure(String),
    /// Failure code originating from the serial port connection
    Serial(String),
}

impl Error {
    /// Create a generic failure Error
    pub fn failure<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Failure(message.into())
    }

    /// Create a serial port failure Error
    pub fn serial<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Serial(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch { expected, have } => {
                write!(f, "invalid checksum, expected: {expected}, have: {have}")
            }
            Self::TruncatedFrame { len } => write!(f, "truncated frame after {len} bytes"),
            Self::UnsupportedPacket { tag } => {
                let tag = core::str::from_utf8(tag.as_ref()).unwrap_or("???");
                write!(f, "unsupported packet tag: :{tag}")
            }
            Self::UnknownCategory { bytes } => {
                write!(f, "unknown category tag: {:#04x} {:#04x}", bytes[0], bytes[1])
            }
            Self::BadBcd { byte } => write!(f, "invalid BCD byte: {byte:#04x}"),
            Self::GuardViolation { state, kind } => {
                write!(f, "no transition for {kind} packet in state {state}")
            }
            Self::NotFound { category, name } => {
                write!(f, "{category} {name} not found in the data store")
            }
            Self::Failure(message) => write!(f, "failure: {message}"),
            Self::Serial(message) => write!(f, "serial port: {message}"),
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Serial(format!("I/O error: {err}"))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::Failure(format!("Utf8 error: {err}"))
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Self::Serial(format!("serial port error: {err}"))
    }
}

#[cfg(feature = "std")]
impl<T> From<std::sync::mpsc::SendError<T>> for Error {
    fn from(err: std::sync::mpsc::SendError<T>) -> Self {
        Self::failure(format!("failed to send an item to the queue: {err}"))
    }
}
