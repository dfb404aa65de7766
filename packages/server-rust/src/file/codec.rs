//! Binary record codec.
//!
//! Serializes a point to a fixed-layout big-endian record:
//!
//! ```text
//! 0..8          i64 microseconds since epoch
//! 8..12         u32 value count V
//! 12..12+12V    V entries of (u32 key-index, f64 value)
//! +0..+4        u32 attr count A
//! +4..+4+8A     A entries of (u32 key-index, u32 val-index)
//! ```
//!
//! String indices come from three dictionaries owned by the codec, one
//! namespace each for value keys, attribute keys, and attribute values.
//! Encoding interns missing strings; decoding fails on an index the codec
//! has never assigned. A codec instance must therefore be reused across
//! encode and decode of related records.

use chrono::DateTime;
use pointdb_core::{Error, Point, Result};

use super::dict::StringDict;

/// Stateful point serializer/deserializer.
#[derive(Debug, Default)]
pub struct PointCodec {
    val_keys: StringDict,
    attr_keys: StringDict,
    attr_vals: StringDict,
}

impl PointCodec {
    /// Creates a codec with empty dictionaries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size in bytes of the record [`PointCodec::encode`] produces for `p`.
    #[must_use]
    pub fn encoded_size(p: &Point) -> usize {
        16 + 12 * p.vals.len() + 8 * p.attrs.len()
    }

    /// Serializes `p`, interning any strings not yet in the dictionaries.
    ///
    /// The point's id is not part of the record.
    pub fn encode(&mut self, p: &Point) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_size(p));
        out.extend_from_slice(&p.micros().to_be_bytes());

        out.extend_from_slice(&(p.vals.len() as u32).to_be_bytes());
        for (key, val) in &p.vals {
            let (idx, _) = self.val_keys.intern(key);
            out.extend_from_slice(&idx.to_be_bytes());
            out.extend_from_slice(&val.to_be_bytes());
        }

        out.extend_from_slice(&(p.attrs.len() as u32).to_be_bytes());
        for (key, val) in &p.attrs {
            let (key_idx, _) = self.attr_keys.intern(key);
            let (val_idx, _) = self.attr_vals.intern(val);
            out.extend_from_slice(&key_idx.to_be_bytes());
            out.extend_from_slice(&val_idx.to_be_bytes());
        }

        out
    }

    /// Deserializes a record previously produced by this codec instance.
    ///
    /// The decoded point carries no id. A zero timestamp field is a
    /// sparse-file hole and yields [`Error::EmptyTimestamp`]; an index
    /// missing from a dictionary yields [`Error::NotFound`].
    pub fn decode(&self, buf: &[u8]) -> Result<Point> {
        let micros = i64::from_be_bytes(take::<8>(buf, 0)?);
        if micros == 0 {
            return Err(Error::EmptyTimestamp);
        }
        let ts = DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| Error::Parse(format!("timestamp {micros}us out of range")))?;
        let mut p = Point::anonymous(ts);

        let val_count = u32::from_be_bytes(take::<4>(buf, 8)?);
        let mut off = 12;
        for _ in 0..val_count {
            let key_idx = u32::from_be_bytes(take::<4>(buf, off)?);
            let val = f64::from_be_bytes(take::<8>(buf, off + 4)?);
            let key = self
                .val_keys
                .name(key_idx)
                .ok_or_else(|| Error::NotFound(format!("value key index {key_idx}")))?;
            p.vals.insert(key.to_string(), val);
            off += 12;
        }

        let attr_count = u32::from_be_bytes(take::<4>(buf, off)?);
        off += 4;
        for _ in 0..attr_count {
            let key_idx = u32::from_be_bytes(take::<4>(buf, off)?);
            let val_idx = u32::from_be_bytes(take::<4>(buf, off + 4)?);
            let key = self
                .attr_keys
                .name(key_idx)
                .ok_or_else(|| Error::NotFound(format!("attr key index {key_idx}")))?;
            let val = self
                .attr_vals
                .name(val_idx)
                .ok_or_else(|| Error::NotFound(format!("attr value index {val_idx}")))?;
            p.attrs.insert(key.to_string(), val.to_string());
            off += 8;
        }

        Ok(p)
    }
}

/// Reads `N` bytes at `off`, or reports the record as truncated.
fn take<const N: usize>(buf: &[u8], off: usize) -> Result<[u8; N]> {
    buf.get(off..off + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::Parse(format!("record truncated at byte {off}")))
}
