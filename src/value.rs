use crate::std;
use std::fmt;

use crate::{
    decimal::{decode_scalar, encode_scalar},
    impl_default, impl_packet_ops, impl_value_ops, inner_enum,
    len::{COMPLEX_VALUE, REAL_VALUE},
    Error, Number, PacketOps, Realness, Result, SignInfo, PACKET_START,
};

pub mod index {
    use crate::decimal::index::SIGN_INFO;
    use crate::len::SCALAR_BLOCK;

    pub const ROW: usize = 2;
    pub const COL: usize = 4;
    pub const REAL: usize = 5;
    pub const REAL_END: usize = REAL + SCALAR_BLOCK;
    pub const REAL_SIGN_INFO: usize = REAL + SIGN_INFO;
    pub const IMAG: usize = 15;
    pub const IMAG_END: usize = IMAG + SCALAR_BLOCK;
}

/// Generic functions for both value packet forms
///
/// Value packets carry no ASCII tag; their second byte is `0x00`, and the
/// `isComplex` bit of the real sign-info byte selects the 16- or 26-byte
/// form.
pub trait ValueOps: PacketOps {
    /// Gets the 1-based row coordinate.
    fn row(&self) -> u8 {
        self.buf()[index::ROW]
    }

    /// Sets the 1-based row coordinate.
    fn set_row(&mut self, row: u8) {
        self.buf_mut()[index::ROW] = row;
    }

    /// Gets the 1-based column coordinate.
    fn col(&self) -> u8 {
        self.buf()[index::COL]
    }

    /// Sets the 1-based column coordinate.
    fn set_col(&mut self, col: u8) {
        self.buf_mut()[index::COL] = col;
    }

    /// Gets the sign-info byte of the real part.
    fn sign_info(&self) -> SignInfo {
        self.buf()[index::REAL_SIGN_INFO].into()
    }

    /// Decodes the real part.
    fn real(&self) -> Result<f64> {
        decode_scalar(self.buf()[index::REAL..index::REAL_END].as_ref())
    }
}

/// Real value packet - one cell carrying only a real part
///
/// The real value packet is formatted as follows:
///
/// | Name  | START | Pad  | Row | Pad  | Col | Int | Frac 6..13 | SignInfo | Exp | CHK |
/// |:------|:-----:|:----:|:---:|:----:|:---:|:---:|:----------:|:--------:|:---:|:---:|
/// | Byte  | 0     | 1    | 2   | 3    | 4   | 5   | 6..13      | 13       | 14  | 15  |
/// | Value | 0x3A  | 0x00 | nn  | 0x00 | nn  | BCD | BCD        | nn       | BCD | zz  |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct RealValue {
    buf: [u8; REAL_VALUE],
}

impl RealValue {
    /// Creates a new [RealValue] packet for cell `(1, 1)` holding zero.
    pub fn new() -> Self {
        let mut packet = Self {
            buf: [0u8; REAL_VALUE],
        };

        packet.buf[crate::index::START] = PACKET_START;
        packet.set_row(1);
        packet.set_col(1);

        let mut info = SignInfo(0);
        info.set_exp_sign_is_positive(true);
        packet.buf[index::REAL_SIGN_INFO] = info.into();

        packet
    }

    /// Decodes the carried number.
    pub fn number(&self) -> Result<Number> {
        Ok(Number::from_real(self.real()?))
    }

    /// Encodes a number into the packet.
    ///
    /// Returns an error for a number with a nonzero imaginary part.
    pub fn set_number(&mut self, value: Number) -> Result<()> {
        if value.is_complex() {
            return Err(Error::failure(
                "imaginary part in a real value packet",
            ));
        }

        let block = encode_scalar(value.real(), false)?;
        self.buf[index::REAL..index::REAL_END].copy_from_slice(block.as_ref());

        Ok(())
    }
}

impl_default!(RealValue);
impl_packet_ops!(RealValue);
impl_value_ops!(RealValue);

impl fmt::Display for RealValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number() {
            Ok(number) => write!(
                f,
                "Row: {}, Col: {}, Value: {number}, Checksum: {}",
                self.row(),
                self.col(),
                self.checksum()
            ),
            Err(err) => write!(f, "Row: {}, Col: {}, {err}", self.row(), self.col()),
        }
    }
}

/// Complex value packet - one cell carrying real and imaginary parts
///
/// Identical to [RealValue] through byte 14, with a second mantissa block
/// for the imaginary part at bytes 15..25 and the checksum at byte 25. Both
/// sign-info bytes carry the `isComplex` bit.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ComplexValue {
    buf: [u8; COMPLEX_VALUE],
}

impl ComplexValue {
    /// Creates a new [ComplexValue] packet for cell `(1, 1)` holding zero.
    pub fn new() -> Self {
        let mut packet = Self {
            buf: [0u8; COMPLEX_VALUE],
        };

        packet.buf[crate::index::START] = PACKET_START;
        packet.set_row(1);
        packet.set_col(1);

        let mut info = SignInfo(0);
        info.set_exp_sign_is_positive(true);
        info.set_is_complex(true);
        packet.buf[index::REAL_SIGN_INFO] = info.into();
        packet.buf[index::IMAG + crate::decimal::index::SIGN_INFO] = info.into();

        packet
    }

    /// Decodes the imaginary part.
    pub fn imag(&self) -> Result<f64> {
        decode_scalar(self.buf[index::IMAG..index::IMAG_END].as_ref())
    }

    /// Decodes the carried number.
    pub fn number(&self) -> Result<Number> {
        Ok(Number::new(self.real()?, self.imag()?))
    }

    /// Encodes a number into the packet.
    pub fn set_number(&mut self, value: Number) -> Result<()> {
        let real = encode_scalar(value.real(), true)?;
        let imag = encode_scalar(value.imag(), true)?;

        self.buf[index::REAL..index::REAL_END].copy_from_slice(real.as_ref());
        self.buf[index::IMAG..index::IMAG_END].copy_from_slice(imag.as_ref());

        Ok(())
    }
}

impl_default!(ComplexValue);
impl_packet_ops!(ComplexValue);
impl_value_ops!(ComplexValue);

impl fmt::Display for ComplexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number() {
            Ok(number) => write!(
                f,
                "Row: {}, Col: {}, Value: {number}, Checksum: {}",
                self.row(),
                self.col(),
                self.checksum()
            ),
            Err(err) => write!(f, "Row: {}, Col: {}, {err}", self.row(), self.col()),
        }
    }
}

/// Represents a value packet in either wire form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Real(RealValue),
    Complex(ComplexValue),
}

impl Value {
    /// Builds the value packet for one cell, using the transaction realness
    /// to pick the wire form.
    pub fn for_cell(row: u8, col: u8, value: Number, realness: Realness) -> Result<Self> {
        match realness {
            Realness::Real => {
                let mut packet = RealValue::new();
                packet.set_row(row);
                packet.set_col(col);
                packet.set_number(value)?;
                Ok(Self::Real(packet))
            }
            Realness::Complex => {
                let mut packet = ComplexValue::new();
                packet.set_row(row);
                packet.set_col(col);
                packet.set_number(value)?;
                Ok(Self::Complex(packet))
            }
        }
    }

    /// Gets the 1-based row coordinate.
    pub fn row(&self) -> u8 {
        match self {
            Self::Real(packet) => packet.row(),
            Self::Complex(packet) => packet.row(),
        }
    }

    /// Gets the 1-based column coordinate.
    pub fn col(&self) -> u8 {
        match self {
            Self::Real(packet) => packet.col(),
            Self::Complex(packet) => packet.col(),
        }
    }

    /// Gets whether this is the 26-byte complex form.
    pub fn is_complex_form(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    /// Decodes the carried number.
    pub fn number(&self) -> Result<Number> {
        match self {
            Self::Real(packet) => packet.number(),
            Self::Complex(packet) => packet.number(),
        }
    }

    /// Gets the packet as a byte buffer, with the checksum byte set.
    pub fn as_bytes(&mut self) -> &[u8] {
        match self {
            Self::Real(packet) => packet.as_bytes(),
            Self::Complex(packet) => packet.as_bytes(),
        }
    }
}

inner_enum!(Value, Real, RealValue);
inner_enum!(Value, Complex, ComplexValue);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(packet) => write!(f, "{packet}"),
            Self::Complex(packet) => write!(f, "{packet}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_real_value_from_buf() -> Result<()> {
        let packet_bytes = [
            // START | Pad | Row | Pad | Col
            0x3a, 0x00, 0x01, 0x00, 0x02,
            // Int | Frac
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // SignInfo | Exp
            0x01, 0x00,
            // Checksum
            0xfa,
        ];

        let mut packet = RealValue::new();
        packet.from_buf(packet_bytes.as_ref())?;

        assert_eq!(packet.row(), 1);
        assert_eq!(packet.col(), 2);
        assert!(!packet.sign_info().is_complex());
        assert_eq!(packet.number()?, Number::from_real(2.0));

        Ok(())
    }

    #[test]
    fn test_real_value_build() -> Result<()> {
        let mut packet = RealValue::new();
        packet.set_number(Number::from_real(1.0))?;

        assert_eq!(packet.as_bytes()[REAL_VALUE - 1], 0xfc);
        packet.validate_checksum()?;

        assert!(packet
            .set_number(Number::new(1.0, 1.0))
            .is_err());

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_complex_value_from_buf() -> Result<()> {
        let packet_bytes = [
            // START | Pad | Row | Pad | Col
            0x3a, 0x00, 0x01, 0x00, 0x01,
            // Real: Int | Frac | SignInfo | Exp
            0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x00, 0x81, 0x00,
            // Imag: Int | Frac | SignInfo | Exp
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x81, 0x00,
            // Checksum
            0x7f,
        ];

        let mut packet = ComplexValue::new();
        packet.from_buf(packet_bytes.as_ref())?;

        assert!(packet.sign_info().is_complex());
        assert_eq!(packet.number()?, Number::new(1.234567890123, 0.0));

        Ok(())
    }

    #[test]
    fn test_complex_value_round_trip() -> Result<()> {
        let value = Number::new(-1.5, 6.5e-4);

        let mut packet = ComplexValue::new();
        packet.set_row(3);
        packet.set_col(7);
        packet.set_number(value)?;
        packet.calculate_checksum();

        let mut parsed = ComplexValue::new();
        let bytes: [u8; COMPLEX_VALUE] = packet.buf;
        parsed.from_buf(bytes.as_ref())?;

        assert_eq!((parsed.row(), parsed.col()), (3, 7));
        assert_eq!(parsed.number()?, value);

        Ok(())
    }

    #[test]
    fn test_for_cell_picks_wire_form() -> Result<()> {
        let real = Value::for_cell(1, 1, Number::from_real(4.0), Realness::Real)?;
        assert!(!real.is_complex_form());
        assert!(real.is_real());

        // a real-valued cell of a complex transaction still uses the long form
        let complex = Value::for_cell(1, 1, Number::from_real(4.0), Realness::Complex)?;
        assert!(complex.is_complex_form());
        assert_eq!(complex.number()?, Number::from_real(4.0));

        Ok(())
    }
}
