//! 64-bit opaque point identity.
//!
//! Ids break ties between points that share a microsecond and give every
//! stored point a stable handle. The text form is the url-safe padded
//! base64 encoding of the big-endian 8-byte value, which is always exactly
//! 12 characters ending in `=`.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Identity of a stored point.
///
/// Ordering is the unsigned integer order of the underlying value; it is
/// the tie-break in the total point order `(ts, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId {
    val: u64,
}

impl PointId {
    /// Allocates a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self { val: rand::random() }
    }

    /// Wraps a known value, e.g. one recovered from storage.
    #[must_use]
    pub const fn from_u64(val: u64) -> Self {
        Self { val }
    }

    /// The underlying 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.val
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE.encode(self.val.to_be_bytes()))
    }
}

impl FromStr for PointId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = URL_SAFE
            .decode(s)
            .map_err(|e| Error::Parse(format!("id '{s}' is not url-safe base64: {e}")))?;
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| {
                Error::Parse(format!("id '{s}' decoded to {} bytes, expected 8", b.len()))
            })?;
        Ok(Self { val: u64::from_be_bytes(bytes) })
    }
}

impl Serialize for PointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
