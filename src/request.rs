use crate::std;
use std::fmt;

use crate::{
    impl_default, impl_packet_ops, len::REQUEST, Error, PacketOps, Result, VariableCategory,
    PACKET_START,
};

pub mod index {
    use crate::len::VARIABLE_NAME;

    pub const CATEGORY: usize = 5;
    pub const CATEGORY_END: usize = CATEGORY + 2;
    pub const NAME: usize = 12;
    pub const NAME_END: usize = NAME + VARIABLE_NAME;
}

/// Request packet - (tag `:REQ`)
///
/// Sent by the calculator to ask the host for a previously stored variable.
/// The host acknowledges and answers with its own variable description and
/// value stream, or a bare END packet when the name is unknown.
///
/// The request packet is formatted as follows:
///
/// | Name  | START | TAG   | Pad  | Category | Pad  | Pad 8..12 | Name 12..20 | Pad 20..49 | CHK |
/// |:------|:-----:|:-----:|:----:|:--------:|:----:|:---------:|:-----------:|:----------:|:---:|
/// | Byte  | 0     | 1..4  | 4    | 5..7     | 7    | 8..12     | 12..20      | 20..49     | 49  |
/// | Value | 0x3A  | `REQ` | 0x00 | nn       | 0x00 | 0xFF      | nn          | 0xFF       | zz  |
///
/// The variable name is ASCII, padded to eight bytes with `0xFF`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Request {
    buf: [u8; REQUEST],
}

impl Request {
    /// Creates a new [Request] packet.
    pub fn new() -> Self {
        let mut packet = Self {
            buf: [0xff; REQUEST],
        };

        packet.buf[crate::index::START] = PACKET_START;
        packet.buf[crate::index::TAG..crate::index::TAG_END].copy_from_slice(b"REQ");
        packet.buf[crate::index::TAG_END] = 0x00;
        packet.buf[index::CATEGORY_END] = 0x00;
        packet.set_category(VariableCategory::Variable);

        packet
    }

    /// Gets the requested variable category.
    pub fn category(&self) -> Result<VariableCategory> {
        self.buf[index::CATEGORY..index::CATEGORY_END]
            .as_ref()
            .try_into()
    }

    /// Sets the requested variable category.
    pub fn set_category(&mut self, category: VariableCategory) {
        self.buf[index::CATEGORY..index::CATEGORY_END].copy_from_slice(category.tag().as_ref());
    }

    /// Gets the variable name, with the trailing `0xFF` padding trimmed.
    pub fn variable_name(&self) -> Result<&str> {
        variable_name(self.buf[index::NAME..index::NAME_END].as_ref())
    }

    /// Sets the variable name, padding to eight bytes with `0xFF`.
    ///
    /// Names longer than eight bytes are truncated.
    pub fn set_variable_name(&mut self, name: &str) {
        set_variable_name(
            self.buf[index::NAME..index::NAME_END].as_mut(),
            name,
        );
    }
}

impl_default!(Request);
impl_packet_ops!(Request);

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self.category().map(<&'static str>::from).unwrap_or("UNKNOWN");
        let name = self.variable_name().unwrap_or("?");

        write!(
            f,
            "Category: {category}, VariableName: {name}, Checksum: {}",
            self.checksum()
        )
    }
}

// Trims the trailing `0xFF` padding from a name field.
pub(crate) fn variable_name(field: &[u8]) -> Result<&str> {
    let end = field
        .iter()
        .position(|&b| b == 0xff)
        .unwrap_or(field.len());

    std::str::from_utf8(field[..end].as_ref()).map_err(Error::from)
}

// Writes a name into a field, `0xFF`-padded, truncating past the field width.
pub(crate) fn set_variable_name(field: &mut [u8], name: &str) {
    let name = name.as_bytes();
    let len = name.len().min(field.len());

    field.fill(0xff);
    field[..len].copy_from_slice(name[..len].as_ref());
}
