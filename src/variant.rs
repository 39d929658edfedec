use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    index, inner_enum, len, ComplexValue, End, Error, PacketOps, RealValue, Request, Result,
    SignInfo, Value, ValueDescription, ACK, PACKET_START, WAKEUP, WAKEUP_ACK,
};

/// Leading three-byte tag of a multi-byte frame
///
/// Anything that is not a known ASCII tag is a value packet; value packets
/// carry `0x00` where the tags sit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketTag {
    /// `:REQ` - variable request
    Request,
    /// `:VAL` - variable description
    ValueDescription,
    /// `:END` - end of stream
    End,
    /// `:DD@` - screen capture stream (not decoded)
    Screenshot,
    /// `:IMG` - picture data (not decoded)
    Image,
    /// `:TXT` - program transfer (not decoded)
    Text,
    /// `:MEM` - backup transfer (not decoded)
    Memory,
    /// `:FNC` - function transfer (not decoded)
    Function,
    /// A value packet
    Value,
}

impl From<&[u8; 3]> for PacketTag {
    fn from(tag: &[u8; 3]) -> Self {
        match tag {
            b"REQ" => Self::Request,
            b"VAL" => Self::ValueDescription,
            b"END" => Self::End,
            b"DD@" => Self::Screenshot,
            b"IMG" => Self::Image,
            b"TXT" => Self::Text,
            b"MEM" => Self::Memory,
            b"FNC" => Self::Function,
            _ => Self::Value,
        }
    }
}

impl PacketTag {
    /// Gets the frame length implied by the tag.
    ///
    /// Returns `None` for value packets, whose length depends on the
    /// complex flag of the sign-info byte at index 13.
    pub const fn frame_len(&self) -> Option<usize> {
        match self {
            Self::Value => None,
            _ => Some(len::MAX_FRAME),
        }
    }

    /// Gets whether the host decodes frames with this tag.
    pub const fn is_supported(&self) -> bool {
        !matches!(
            self,
            Self::Screenshot | Self::Image | Self::Text | Self::Memory | Self::Function
        )
    }
}

/// Names the packet variants, for transition guards and logging.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PacketKind {
    Wakeup,
    Ack,
    WakeupAck,
    Request,
    ValueDescription,
    Value,
    End,
}

impl From<PacketKind> for &'static str {
    fn from(kind: PacketKind) -> Self {
        match kind {
            PacketKind::Wakeup => "WAKEUP",
            PacketKind::Ack => "ACK",
            PacketKind::WakeupAck => "WAKEUP_ACK",
            PacketKind::Request => "REQUEST",
            PacketKind::ValueDescription => "VALUE_DESCRIPTION",
            PacketKind::Value => "VALUE",
            PacketKind::End => "END",
        }
    }
}

impl From<&PacketKind> for &'static str {
    fn from(kind: &PacketKind) -> Self {
        (*kind).into()
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(self))
    }
}

/// Represents every decoded frame the host handles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Packet {
    /// Session-opening control byte (`0x15`)
    Wakeup,
    /// Acknowledgement control byte (`0x06`)
    Ack,
    /// Wakeup-acknowledgement control byte (`0x13`)
    WakeupAck,
    /// Variable request (`:REQ`)
    Request(Request),
    /// Variable description (`:VAL`)
    ValueDescription(ValueDescription),
    /// One cell of a value stream
    Value(Value),
    /// End of stream (`:END`)
    End(End),
}

impl Packet {
    /// Gets the [PacketKind] naming this variant.
    pub const fn kind(&self) -> PacketKind {
        match self {
            Self::Wakeup => PacketKind::Wakeup,
            Self::Ack => PacketKind::Ack,
            Self::WakeupAck => PacketKind::WakeupAck,
            Self::Request(_) => PacketKind::Request,
            Self::ValueDescription(_) => PacketKind::ValueDescription,
            Self::Value(_) => PacketKind::Value,
            Self::End(_) => PacketKind::End,
        }
    }

    /// Decodes a complete frame into a [Packet].
    ///
    /// Frames with a bad checksum are rejected before parsing. Frames with
    /// a recognized-but-unsupported tag are reported without parsing, bad
    /// checksum or not.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        match buf.len() {
            0 => Err(Error::TruncatedFrame { len: 0 }),
            1 => match buf[0] {
                WAKEUP => Ok(Self::Wakeup),
                ACK => Ok(Self::Ack),
                WAKEUP_ACK => Ok(Self::WakeupAck),
                byte => Err(Error::failure(format!("unknown control byte: {byte:#04x}"))),
            },
            frame_len => {
                let start = buf[index::START];
                if start != PACKET_START {
                    return Err(Error::failure(format!("invalid start byte: {start:#04x}")));
                }

                if frame_len < len::MIN_CHECKSUMMED {
                    return Err(Error::TruncatedFrame { len: frame_len });
                }

                let tag = [buf[index::TAG], buf[index::TAG + 1], buf[index::TAG + 2]];
                let tag_kind = PacketTag::from(&tag);
                log::trace!("frame tag: {tag_kind:?}, length: {frame_len}");

                match tag_kind {
                    PacketTag::Request => {
                        let mut packet = Request::new();
                        packet.from_buf(buf)?;
                        Ok(Self::Request(packet))
                    }
                    PacketTag::ValueDescription => {
                        let mut packet = ValueDescription::new();
                        packet.from_buf(buf)?;
                        Ok(Self::ValueDescription(packet))
                    }
                    PacketTag::End => {
                        let mut packet = End::new();
                        packet.from_buf(buf)?;
                        Ok(Self::End(packet))
                    }
                    PacketTag::Value => {
                        if buf[index::TAG] != 0x00 {
                            return Err(Error::failure(format!(
                                "invalid value packet, second byte: {:#04x}",
                                buf[index::TAG]
                            )));
                        }

                        match frame_len {
                            len::REAL_VALUE => {
                                let mut packet = RealValue::new();
                                packet.from_buf(buf)?;
                                Ok(Self::Value(Value::Real(packet)))
                            }
                            len::COMPLEX_VALUE => {
                                let mut packet = ComplexValue::new();
                                packet.from_buf(buf)?;
                                Ok(Self::Value(Value::Complex(packet)))
                            }
                            _ => Err(Error::TruncatedFrame { len: frame_len }),
                        }
                    }
                    PacketTag::Screenshot
                    | PacketTag::Image
                    | PacketTag::Text
                    | PacketTag::Memory
                    | PacketTag::Function => Err(Error::UnsupportedPacket { tag }),
                }
            }
        }
    }

    /// Gets whether a value frame starting with this header is the 26-byte
    /// complex form, from the complex flag of the real sign-info byte.
    ///
    /// The header must hold at least [VALUE_HEADER](crate::len::VALUE_HEADER) bytes.
    pub fn value_frame_is_complex(header: &[u8]) -> bool {
        debug_assert!(header.len() >= len::VALUE_HEADER);

        SignInfo::from(header[len::VALUE_HEADER - 1]).is_complex()
    }
}

inner_enum!(Packet, Request);
inner_enum!(Packet, ValueDescription);
inner_enum!(Packet, Value);
inner_enum!(Packet, End);

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wakeup | Self::Ack | Self::WakeupAck => write!(f, "{}", self.kind()),
            Self::Request(packet) => write!(f, "{}: {packet}", self.kind()),
            Self::ValueDescription(packet) => write!(f, "{}: {packet}", self.kind()),
            Self::Value(packet) => write!(f, "{}: {packet}", self.kind()),
            Self::End(packet) => write!(f, "{}: {packet}", self.kind()),
        }
    }
}
