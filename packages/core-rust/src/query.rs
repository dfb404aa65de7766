//! Query parameters: an inclusive time window plus an attribute filter.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::point::Point;

/// Parameters for a range query.
///
/// The window `[start, end]` is inclusive at both ends, compared at
/// microsecond granularity. Construction swaps inverted endpoints so that
/// `start <= end` always holds, including when a query is decoded from
/// JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "QueryRepr")]
pub struct Query {
    /// Inclusive lower bound of the window.
    pub start: DateTime<Utc>,
    /// Inclusive upper bound of the window.
    pub end: DateTime<Utc>,
    /// Attribute predicate; use [`Filter::True`] to match everything.
    pub filter: Filter,
}

impl Query {
    /// Creates a query, swapping `start` and `end` if they arrive inverted.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, filter: Filter) -> Self {
        if start.timestamp_micros() > end.timestamp_micros() {
            Self { start: end, end: start, filter }
        } else {
            Self { start, end, filter }
        }
    }

    /// Window start in microseconds since the Unix epoch.
    #[must_use]
    pub fn start_micros(&self) -> i64 {
        self.start.timestamp_micros()
    }

    /// Window end in microseconds since the Unix epoch.
    #[must_use]
    pub fn end_micros(&self) -> i64 {
        self.end.timestamp_micros()
    }

    /// Position of the point's timestamp relative to the window:
    /// `Less` before it, `Equal` within it, `Greater` past it.
    #[must_use]
    pub fn cmp_time(&self, p: &Point) -> Ordering {
        let us = p.micros();
        if us < self.start_micros() {
            Ordering::Less
        } else if us > self.end_micros() {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Whether the point falls inside the time window.
    #[must_use]
    pub fn match_time(&self, p: &Point) -> bool {
        self.cmp_time(p) == Ordering::Equal
    }

    /// Whether the point's attributes satisfy the filter.
    #[must_use]
    pub fn match_attrs(&self, p: &Point) -> bool {
        self.filter.matches(&p.attrs)
    }

    /// Whether the point matches both the window and the filter.
    #[must_use]
    pub fn matches(&self, p: &Point) -> bool {
        self.match_time(p) && self.match_attrs(p)
    }
}

/// Raw wire shape of a query, normalized through [`Query::new`].
#[derive(Deserialize)]
struct QueryRepr {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filter: Filter,
}

impl From<QueryRepr> for Query {
    fn from(repr: QueryRepr) -> Self {
        Self::new(repr.start, repr.end, repr.filter)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}] [{}]",
            self.start.to_rfc3339(),
            self.end.to_rfc3339(),
            self.filter
        )
    }
}
