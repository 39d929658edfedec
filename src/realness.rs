use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{len::REALNESS_TAG, Error, Result};

/// Whether a value carries an imaginary component
///
/// Appears on the wire both as the `isComplex` bit of the sign-info byte
/// and as a nine-byte ASCII tag in variable description packets. The two
/// encodings must agree for any one transaction.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Realness {
    /// Real values only - `VariableR`
    Real,
    /// Real and imaginary parts - `VariableC`
    Complex,
}

impl Realness {
    /// Gets the nine-byte ASCII tag used in variable description packets.
    pub const fn tag(&self) -> &'static [u8; REALNESS_TAG] {
        match self {
            Self::Real => b"VariableR",
            Self::Complex => b"VariableC",
        }
    }

    /// Gets whether values carry an imaginary part.
    pub const fn is_complex(&self) -> bool {
        matches!(self, Self::Complex)
    }
}

impl From<bool> for Realness {
    fn from(is_complex: bool) -> Self {
        match is_complex {
            false => Self::Real,
            true => Self::Complex,
        }
    }
}

impl From<Realness> for bool {
    fn from(r: Realness) -> Self {
        r.is_complex()
    }
}

impl TryFrom<&[u8]> for Realness {
    type Error = Error;

    fn try_from(val: &[u8]) -> Result<Self> {
        match val {
            b"VariableR" => Ok(Self::Real),
            b"VariableC" => Ok(Self::Complex),
            _ => Err(Error::failure("invalid realness tag")),
        }
    }
}

impl From<Realness> for &'static str {
    fn from(r: Realness) -> Self {
        match r {
            Realness::Real => "REAL",
            Realness::Complex => "COMPLEX",
        }
    }
}

impl From<&Realness> for &'static str {
    fn from(r: &Realness) -> Self {
        (*r).into()
    }
}

impl fmt::Display for Realness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realness_tags() -> Result<()> {
        assert_eq!(Realness::try_from(b"VariableR".as_ref())?, Realness::Real);
        assert_eq!(Realness::try_from(b"VariableC".as_ref())?, Realness::Complex);
        assert!(Realness::try_from(b"VariableX".as_ref()).is_err());

        Ok(())
    }

    #[test]
    fn test_realness_flag() {
        assert_eq!(Realness::from(false), Realness::Real);
        assert_eq!(Realness::from(true), Realness::Complex);
        assert!(!Realness::Real.is_complex());
        assert!(Realness::Complex.is_complex());
    }
}
