//! The ingested observation record.
//!
//! A [`Point`] is one timestamped observation: numeric values, string
//! attributes, and an optional identity. Identity is absent only while the
//! point is a query bound or a decoded-but-unassigned record; every stored
//! point carries one.
//!
//! Timestamps are compared at microsecond granularity everywhere;
//! sub-microsecond precision is not part of a point's identity.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::PointId;

/// The total order on points: first by microsecond timestamp, then by id.
///
/// An absent id sorts before any present id at the same microsecond, which
/// is what makes an id-less point usable as a range lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey {
    /// Microseconds since the Unix epoch.
    pub micros: i64,
    /// Tie-break identity; `None` compares less than any `Some`.
    pub id: Option<PointId>,
}

impl PointKey {
    /// A lower bound at the given microsecond: sorts before every real
    /// point stored in that microsecond.
    #[must_use]
    pub const fn bound(micros: i64) -> Self {
        Self { micros, id: None }
    }
}

/// One timestamped observation with values, attributes, and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    /// Instant of the observation; microsecond resolution.
    pub ts: DateTime<Utc>,
    /// Named numeric values. Keys are unique and non-empty.
    #[serde(default)]
    pub vals: BTreeMap<String, f64>,
    /// Named string attributes. Keys are unique.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Identity; absent for query bounds and freshly decoded records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PointId>,
}

impl Point {
    /// Creates an empty point at `ts` with a fresh random id.
    #[must_use]
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            vals: BTreeMap::new(),
            attrs: BTreeMap::new(),
            id: Some(PointId::random()),
        }
    }

    /// Creates an empty point at `ts` with no id.
    #[must_use]
    pub fn anonymous(ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            vals: BTreeMap::new(),
            attrs: BTreeMap::new(),
            id: None,
        }
    }

    /// Adds a numeric value, builder style.
    #[must_use]
    pub fn with_val(mut self, key: &str, val: f64) -> Self {
        self.vals.insert(key.to_string(), val);
        self
    }

    /// Adds a string attribute, builder style.
    #[must_use]
    pub fn with_attr(mut self, key: &str, val: &str) -> Self {
        self.attrs.insert(key.to_string(), val.to_string());
        self
    }

    /// The timestamp in microseconds since the Unix epoch.
    #[must_use]
    pub fn micros(&self) -> i64 {
        self.ts.timestamp_micros()
    }

    /// The point's position in the total `(ts, id)` order.
    #[must_use]
    pub fn key(&self) -> PointKey {
        PointKey { micros: self.micros(), id: self.id }
    }

    /// Whether two points are equal: same microsecond timestamp, exactly
    /// matching values, matching attributes. Ids are ignored.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        self.micros() == other.micros()
            && self.vals.len() == other.vals.len()
            && self.vals.iter().all(|(k, v)| other.vals.get(k) == Some(v))
            && self.attrs == other.attrs
    }

    /// Whether two points are identical: equal, and both ids present and
    /// the same.
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        self.equal(other)
            && match (self.id, other.id) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }

    /// Equality with a relative tolerance on the numeric values.
    ///
    /// Each value pair `(x, y)` must satisfy `|x - y| / |(x + y) / 2| < tol`;
    /// a `0/0` ratio counts as a match. Timestamps and attributes are
    /// compared as in [`Point::equal`].
    #[must_use]
    pub fn equal_tol(&self, other: &Self, tol: f64) -> bool {
        fn close(x: f64, y: f64, tol: f64) -> bool {
            let ratio = (x - y).abs() / ((x + y) / 2.0).abs();
            ratio.is_nan() || ratio < tol
        }

        self.micros() == other.micros()
            && self.vals.len() == other.vals.len()
            && self
                .vals
                .iter()
                .all(|(k, v)| other.vals.get(k).is_some_and(|w| close(*v, *w, tol)))
            && self.attrs == other.attrs
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vals: Vec<String> = self.vals.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        let attrs: Vec<String> = self.attrs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(
            f,
            "[{}] val[{}] attr[{}]",
            self.ts.to_rfc3339(),
            vals.join(", "),
            attrs.join(", ")
        )
    }
}
