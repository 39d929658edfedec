use crate::std;
use std::fmt;

use crate::{impl_default, impl_packet_ops, len::END, PacketOps, PACKET_START};

/// End packet - (tag `:END`)
///
/// Terminates a value stream in either direction. Also the host's whole
/// answer to a [Request](crate::Request) for a variable it does not hold.
///
/// The end packet is formatted as follows:
///
/// | Name  | START | TAG   | Pad 4..49 | CHK |
/// |:------|:-----:|:-----:|:---------:|:---:|
/// | Byte  | 0     | 1..4  | 4..49     | 49  |
/// | Value | 0x3A  | `END` | 0xFF      | zz  |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct End {
    buf: [u8; END],
}

impl End {
    /// Creates a new [End] packet.
    pub fn new() -> Self {
        let mut packet = Self { buf: [0xff; END] };

        packet.buf[crate::index::START] = PACKET_START;
        packet.buf[crate::index::TAG..crate::index::TAG_END].copy_from_slice(b"END");

        packet
    }
}

impl_default!(End);
impl_packet_ops!(End);

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum: {}", self.checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn test_end_checksum() -> Result<()> {
        let mut packet = End::new();

        assert_eq!(packet.as_bytes()[END - 1], 0x56);
        packet.validate_checksum()?;

        let mut parsed = End::new();
        let bytes: [u8; END] = packet.buf;
        parsed.from_buf(bytes.as_ref())?;
        assert_eq!(parsed, packet);

        Ok(())
    }
}
