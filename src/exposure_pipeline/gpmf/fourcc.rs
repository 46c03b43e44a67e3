use std::fmt;
use std::str::FromStr;

use crate::exposure_pipeline::common::error::ExposureError;

/// Four-character key of a GPMF element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Device container.
    pub const DEVC: Self = Self(*b"DEVC");
    /// Stream container.
    pub const STRM: Self = Self(*b"STRM");
    /// Shutter time in seconds.
    pub const SHUT: Self = Self(*b"SHUT");
    /// ISO gain.
    pub const ISOG: Self = Self(*b"ISOG");

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Keys are built from ASCII letters, digits and spaces.
    pub fn is_valid(&self) -> bool {
        self.0
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b' ')
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FourCC {
    type Err = ExposureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ExposureError::InvalidPayload(format!("key '{s}' is not 4 bytes")))?;
        let key = Self(bytes);
        if !key.is_valid() {
            return Err(ExposureError::InvalidPayload(format!("key '{s}' has invalid characters")));
        }
        Ok(key)
    }
}
