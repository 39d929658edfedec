use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{bcd_to_u8, len::SCALAR_BLOCK, u8_to_bcd, Error, Result, SignInfo};

pub mod index {
    pub const INT: usize = 0;
    pub const FRAC: usize = 1;
    pub const FRAC_END: usize = FRAC + 7;
    pub const SIGN_INFO: usize = 8;
    pub const EXPONENT: usize = 9;
}

// Scale of the fraction field: fourteen decimal digits.
const FRAC_MODULUS: u64 = 100_000_000_000_000;

// Exactly representable powers of ten.
#[rustfmt::skip]
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11,
    1e12, 1e13, 1e14, 1e15, 1e16, 1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

// Ten to a non-negative power, built from exact factors to keep
// rounding error down to a few ULPs.
fn pow10(exponent: u32) -> f64 {
    let mut result = 1.0f64;
    let mut exponent = exponent as usize;

    while exponent > 22 {
        result *= 1e22;
        exponent -= 22;
    }

    result * POW10[exponent]
}

/// A number carried by one half of a value packet
///
/// Fifteen significant decimal digits with a signed two-digit decimal
/// exponent. A real number has a zero imaginary part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Number {
    real: f64,
    imag: f64,
}

impl Number {
    /// Creates a new [Number] from real and imaginary parts.
    pub const fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    /// Creates a new purely real [Number].
    pub const fn from_real(real: f64) -> Self {
        Self { real, imag: 0.0 }
    }

    /// Gets the real part.
    pub const fn real(&self) -> f64 {
        self.real
    }

    /// Gets the imaginary part.
    pub const fn imag(&self) -> f64 {
        self.imag
    }

    /// Gets whether the imaginary part is nonzero.
    pub fn is_complex(&self) -> bool {
        self.imag != 0.0
    }
}

impl From<f64> for Number {
    fn from(real: f64) -> Self {
        Self::from_real(real)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complex() {
            write!(f, "{}{:+}i", self.real, self.imag)
        } else {
            write!(f, "{}", self.real)
        }
    }
}

/// Decodes one mantissa block of a value packet.
///
/// The block layout is: one BCD integer digit, seven BCD fraction bytes
/// (fourteen digits), the sign-info byte, and one BCD exponent byte. An
/// unset exponent-sign bit stores the exponent `e` as `100 + e`.
pub fn decode_scalar(block: &[u8]) -> Result<f64> {
    if block.len() != SCALAR_BLOCK {
        return Err(Error::failure(format!(
            "invalid mantissa block length: {}",
            block.len()
        )));
    }

    let int_digit = bcd_to_u8(block[index::INT])?;
    if int_digit > 9 {
        return Err(Error::BadBcd {
            byte: block[index::INT],
        });
    }

    let mut frac = 0u64;
    for &b in block[index::FRAC..index::FRAC_END].iter() {
        frac = frac * 100 + bcd_to_u8(b)? as u64;
    }

    let info = SignInfo::from(block[index::SIGN_INFO]);

    let exp_mag = bcd_to_u8(block[index::EXPONENT])? as i32;
    let exponent = if info.exp_sign_is_positive() {
        exp_mag
    } else {
        exp_mag - 100
    };

    // Scale the full fifteen-digit integer in one step; it is exact in an
    // f64, so the division or multiplication is the only rounding.
    let digits = (int_digit as u64 * FRAC_MODULUS + frac) as f64;
    let scale = 14 - exponent;
    let magnitude = if scale >= 0 {
        digits / pow10(scale as u32)
    } else {
        digits * pow10(-scale as u32)
    };

    if info.is_negative() {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

/// Encodes a value as one mantissa block of a value packet.
///
/// The magnitude is normalized arithmetically to a single nonzero integer
/// digit and fourteen fraction digits. Zero encodes as an all-zero mantissa
/// with exponent zero and a positive exponent sign. Values needing an
/// exponent outside `[-99, 99]` are rejected.
pub fn encode_scalar(value: f64, is_complex: bool) -> Result<[u8; SCALAR_BLOCK]> {
    let mut block = [0u8; SCALAR_BLOCK];

    let mut info = SignInfo(0);
    info.set_is_complex(is_complex);
    info.set_exp_sign_is_positive(true);

    if value == 0.0 {
        block[index::SIGN_INFO] = info.into();
        return Ok(block);
    }

    if !value.is_finite() {
        return Err(Error::failure("value is not finite"));
    }

    info.set_is_negative(value < 0.0);
    let magnitude = if value < 0.0 { -value } else { value };

    // Estimate the decimal exponent, then correct for rounding spill
    // on the digit extraction.
    let mut exponent = 0i32;
    let mut probe = magnitude;
    while probe >= 10.0 {
        probe /= 10.0;
        exponent += 1;
    }
    while probe < 1.0 {
        probe *= 10.0;
        exponent -= 1;
    }

    let mut digits = scaled_digits(magnitude, exponent);
    if digits >= 10 * FRAC_MODULUS {
        exponent += 1;
        digits = scaled_digits(magnitude, exponent);
    }
    if digits < FRAC_MODULUS {
        exponent -= 1;
        digits = scaled_digits(magnitude, exponent);
    }

    if !(-99..=99).contains(&exponent) {
        return Err(Error::failure(format!("exponent out of range: {exponent}")));
    }

    block[index::INT] = (digits / FRAC_MODULUS) as u8;

    let mut frac = digits % FRAC_MODULUS;
    for i in (index::FRAC..index::FRAC_END).rev() {
        block[i] = u8_to_bcd((frac % 100) as u8);
        frac /= 100;
    }

    if exponent < 0 {
        info.set_exp_sign_is_positive(false);
    }
    block[index::SIGN_INFO] = info.into();

    let exp_byte = if exponent >= 0 {
        exponent as u8
    } else {
        (100 + exponent) as u8
    };
    block[index::EXPONENT] = u8_to_bcd(exp_byte);

    Ok(block)
}

// Fifteen significant digits of the magnitude at the given decimal
// exponent, scaled with the mirror image of the decoder's arithmetic.
fn scaled_digits(magnitude: f64, exponent: i32) -> u64 {
    let scale = 14 - exponent;
    let scaled = if scale >= 0 {
        magnitude * pow10(scale as u32)
    } else {
        magnitude / pow10(-scale as u32)
    };

    (scaled + 0.5) as u64
}
