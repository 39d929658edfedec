use crate::std;
use std::fmt;

use crate::{
    impl_default, impl_packet_ops,
    len::VALUE_DESCRIPTION,
    request::{set_variable_name, variable_name},
    PacketOps, Realness, Result, VariableCategory, PACKET_START,
};

pub mod index {
    use crate::len::{REALNESS_TAG, VARIABLE_NAME};

    pub const CATEGORY: usize = 5;
    pub const CATEGORY_END: usize = CATEGORY + 2;
    pub const ROWSIZE: usize = 8;
    pub const COLSIZE: usize = 10;
    pub const NAME: usize = 11;
    pub const NAME_END: usize = NAME + VARIABLE_NAME;
    pub const REALNESS: usize = 19;
    pub const REALNESS_END: usize = REALNESS + REALNESS_TAG;
    pub const NEWLINE: usize = 28;
}

/// Variable description packet - (tag `:VAL`)
///
/// Announces a value stream: the category, name, grid shape and realness of
/// the variable about to be transferred. Sent by the calculator when it
/// pushes a variable, and by the host when it answers a [Request](crate::Request).
/// A scalar variable uses a 1x1 shape.
///
/// The variable description packet is formatted as follows:
///
/// | Name  | START | TAG   | Pad  | Category | Pad  | Rows | Pad  | Cols | Name 11..19 | Realness 19..28 | LF   | Pad 29..49 | CHK |
/// |:------|:-----:|:-----:|:----:|:--------:|:----:|:----:|:----:|:----:|:-----------:|:---------------:|:----:|:----------:|:---:|
/// | Byte  | 0     | 1..4  | 4    | 5..7     | 7    | 8    | 9    | 10   | 11..19      | 19..28          | 28   | 29..49     | 49  |
/// | Value | 0x3A  | `VAL` | 0x00 | nn       | 0x00 | nn   | 0x00 | nn   | nn          | `VariableR`/`C` | 0x0A | 0xFF       | zz  |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ValueDescription {
    buf: [u8; VALUE_DESCRIPTION],
}

impl ValueDescription {
    /// Creates a new [ValueDescription] packet for a 1x1 real variable.
    pub fn new() -> Self {
        let mut packet = Self {
            buf: [0xff; VALUE_DESCRIPTION],
        };

        packet.buf[crate::index::START] = PACKET_START;
        packet.buf[crate::index::TAG..crate::index::TAG_END].copy_from_slice(b"VAL");
        packet.buf[crate::index::TAG_END] = 0x00;
        packet.buf[index::CATEGORY_END] = 0x00;
        packet.buf[index::ROWSIZE + 1] = 0x00;
        packet.buf[index::NEWLINE] = 0x0a;

        packet.set_category(VariableCategory::Variable);
        packet.set_rowsize(1);
        packet.set_colsize(1);
        packet.set_realness(Realness::Real);

        packet
    }

    /// Gets the announced variable category.
    pub fn category(&self) -> Result<VariableCategory> {
        self.buf[index::CATEGORY..index::CATEGORY_END]
            .as_ref()
            .try_into()
    }

    /// Sets the announced variable category.
    pub fn set_category(&mut self, category: VariableCategory) {
        self.buf[index::CATEGORY..index::CATEGORY_END].copy_from_slice(category.tag().as_ref());
    }

    /// Gets the announced row count.
    pub fn rowsize(&self) -> u8 {
        self.buf[index::ROWSIZE]
    }

    /// Sets the announced row count.
    pub fn set_rowsize(&mut self, rowsize: u8) {
        self.buf[index::ROWSIZE] = rowsize;
    }

    /// Gets the announced column count.
    pub fn colsize(&self) -> u8 {
        self.buf[index::COLSIZE]
    }

    /// Sets the announced column count.
    pub fn set_colsize(&mut self, colsize: u8) {
        self.buf[index::COLSIZE] = colsize;
    }

    /// Gets the variable name, with the trailing `0xFF` padding trimmed.
    pub fn variable_name(&self) -> Result<&str> {
        variable_name(self.buf[index::NAME..index::NAME_END].as_ref())
    }

    /// Sets the variable name, padding to eight bytes with `0xFF`.
    pub fn set_variable_name(&mut self, name: &str) {
        set_variable_name(self.buf[index::NAME..index::NAME_END].as_mut(), name);
    }

    /// Gets the announced realness.
    pub fn realness(&self) -> Result<Realness> {
        self.buf[index::REALNESS..index::REALNESS_END]
            .as_ref()
            .try_into()
    }

    /// Sets the announced realness.
    pub fn set_realness(&mut self, realness: Realness) {
        self.buf[index::REALNESS..index::REALNESS_END].copy_from_slice(realness.tag().as_ref());
    }
}

impl_default!(ValueDescription);
impl_packet_ops!(ValueDescription);

impl fmt::Display for ValueDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self.category().map(<&'static str>::from).unwrap_or("UNKNOWN");
        let name = self.variable_name().unwrap_or("?");
        let realness = self.realness().map(<&'static str>::from).unwrap_or("UNKNOWN");

        write!(
            f,
            "Category: {category}, VariableName: {name}, Rows: {}, Cols: {}, Realness: {realness}, Checksum: {}",
            self.rowsize(),
            self.colsize(),
            self.checksum()
        )
    }
}
