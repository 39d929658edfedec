use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Variable categories carried by request and description packets
///
/// The wire form is a closed set of two-byte ASCII tags.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub enum VariableCategory {
    /// A single (scalar) variable - `VM`
    Variable,
    /// A list - `LT`
    List,
    /// A matrix - `MT`
    Matrix,
    /// A picture - `PC`
    Picture,
    /// A screen capture - `DW`
    Screenshot,
}

impl VariableCategory {
    /// Gets the two-byte wire tag for the category.
    pub const fn tag(&self) -> &'static [u8; 2] {
        match self {
            Self::Variable => b"VM",
            Self::List => b"LT",
            Self::Matrix => b"MT",
            Self::Picture => b"PC",
            Self::Screenshot => b"DW",
        }
    }
}

impl TryFrom<&[u8]> for VariableCategory {
    type Error = Error;

    fn try_from(val: &[u8]) -> Result<Self> {
        match val {
            b"VM" => Ok(Self::Variable),
            b"LT" => Ok(Self::List),
            b"MT" => Ok(Self::Matrix),
            b"PC" => Ok(Self::Picture),
            b"DW" => Ok(Self::Screenshot),
            _ => {
                let mut bytes = [0u8; 2];
                bytes
                    .iter_mut()
                    .zip(val.iter())
                    .for_each(|(b, v)| *b = *v);

                Err(Error::UnknownCategory { bytes })
            }
        }
    }
}

impl From<VariableCategory> for &'static str {
    fn from(c: VariableCategory) -> Self {
        match c {
            VariableCategory::Variable => "VARIABLE",
            VariableCategory::List => "LIST",
            VariableCategory::Matrix => "MATRIX",
            VariableCategory::Picture => "PICTURE",
            VariableCategory::Screenshot => "SCREENSHOT",
        }
    }
}

impl From<&VariableCategory> for &'static str {
    fn from(c: &VariableCategory) -> Self {
        (*c).into()
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tags() -> Result<()> {
        let categories = [
            VariableCategory::Variable,
            VariableCategory::List,
            VariableCategory::Matrix,
            VariableCategory::Picture,
            VariableCategory::Screenshot,
        ];

        for category in categories {
            assert_eq!(VariableCategory::try_from(category.tag().as_ref())?, category);
        }

        Ok(())
    }

    #[test]
    fn test_unknown_category() {
        assert_eq!(
            VariableCategory::try_from(b"ZZ".as_ref()),
            Err(Error::UnknownCategory { bytes: [b'Z', b'Z'] })
        );
        assert_eq!(
            VariableCategory::try_from([].as_ref()),
            Err(Error::UnknownCategory { bytes: [0, 0] })
        );
    }
}
