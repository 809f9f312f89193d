//! Protocol generations selected by the version a mint runs or emulates.
//!
//! | version           | key derivation           | keyset id  |
//! |-------------------|--------------------------|------------|
//! | `< 0.12.0`        | [`Generation::InsecurePre012`] | base64 |
//! | `0.12.0..0.15.0`  | [`Generation::Pre015`]   | base64     |
//! | `>= 0.15.0`       | [`Generation::Bip32`]    | hex        |

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A `major.minor.patch` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const V0_12_0: Version = Version::new(0, 12, 0);
    pub const V0_15_0: Version = Version::new(0, 15, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    /// Accepts `0.15.0`, `v0.15.0`, and shortened forms like `0.15`, where
    /// missing components are zero.
    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || Error::UnsupportedVersion(s.to_string());

        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(unsupported());
        }

        let mut parts = [0u32; 3];
        let mut count = 0;
        for segment in trimmed.split('.') {
            if count == parts.len()
                || segment.is_empty()
                || !segment.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(unsupported());
            }
            parts[count] = segment.parse().map_err(|_| unsupported())?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The key derivation algorithm a keyset was generated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// `< 0.12.0`: hex digest text used as key bytes, fixed amounts.
    InsecurePre012,
    /// `0.12.0..0.15.0`: raw SHA-256 digest of seed, path and index.
    Pre015,
    /// `>= 0.15.0`: BIP-32 hardened derivation from the mnemonic bytes.
    Bip32,
}

impl Generation {
    pub fn for_version(version: Version) -> Self {
        let generation = if version < Version::V0_12_0 {
            Self::InsecurePre012
        } else if version < Version::V0_15_0 {
            Self::Pre015
        } else {
            Self::Bip32
        };
        debug!(%version, ?generation, "selected key derivation");
        generation
    }

    pub fn keyset_id_format(self) -> KeysetIdFormat {
        match self {
            Self::InsecurePre012 | Self::Pre015 => KeysetIdFormat::Base64,
            Self::Bip32 => KeysetIdFormat::Hex,
        }
    }
}

impl FromStr for Generation {
    type Err = Error;

    /// Resolves a version string.
    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::for_version(s.parse()?))
    }
}

/// How a keyset id is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeysetIdFormat {
    /// `< 0.15.0`: 12 characters of base64.
    Base64,
    /// `>= 0.15.0`: `00` followed by 14 hex characters.
    Hex,
}

impl KeysetIdFormat {
    pub fn for_version(version: Version) -> Self {
        if version < Version::V0_15_0 {
            Self::Base64
        } else {
            Self::Hex
        }
    }
}

impl FromStr for KeysetIdFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::for_version(s.parse()?))
    }
}
