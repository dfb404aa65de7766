//! Ordered in-memory tree store.
//!
//! Backed by a `BTreeMap` keyed on the total point order `(ts, id)`.
//! Re-inserting a point with an equal key replaces the previous entry;
//! points sharing a microsecond but carrying distinct ids coexist.

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Utc};
use pointdb_core::{Cursor, Point, PointId, PointKey, Query, QueryCursor, Result};
use tracing::debug;

use super::pointio::PointIo;

/// Tree store ordered by `(ts, id)`; the usual hot-buffer engine.
#[derive(Debug, Default)]
pub struct MemTree {
    buf: BTreeMap<PointKey, Point>,
}

impl MemTree {
    /// Creates an empty tree store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointIo for MemTree {
    fn name(&self) -> &'static str {
        "memtree"
    }

    fn add(&mut self, points: Vec<Point>) -> Result<()> {
        for p in points {
            self.buf.insert(p.key(), p);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn first(&self) -> Option<&Point> {
        self.buf.first_key_value().map(|(_, p)| p)
    }

    fn last(&self) -> Option<&Point> {
        self.buf.last_key_value().map(|(_, p)| p)
    }

    fn flush(&mut self) -> Result<usize> {
        Ok(0)
    }

    fn vacuum(&mut self) -> Result<()> {
        Ok(())
    }

    fn move_range(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        dest: &mut dyn PointIo,
    ) -> Result<usize> {
        let end_micros = end.timestamp_micros();
        let keys: Vec<PointKey> = self
            .buf
            .range(PointKey::bound(start.timestamp_micros())..)
            .take_while(|(k, _)| k.micros <= end_micros)
            .map(|(k, _)| *k)
            .collect();

        let mut moved = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(p) = self.buf.remove(&key) {
                moved.push(p);
            }
        }
        let n = moved.len();
        if n > 0 {
            dest.add(moved)?;
        }
        debug!(moved = n, remaining = self.buf.len(), "memtree move_range");
        Ok(n)
    }

    fn search<'a>(&'a self, query: &Query) -> Result<QueryCursor<'a>> {
        // The backing scan is half-open, so the upper bound sits one
        // microsecond past the window to keep `end` inclusive.
        let lower = PointKey::bound(query.start_micros());
        let upper = PointKey::bound(query.end_micros() + 1);
        let cursor = MemTreeCursor {
            tree: self,
            lower,
            upper,
            last_id: None,
            query: query.clone(),
        };
        Ok(QueryCursor::new(query.clone(), Box::new(cursor)))
    }
}

/// Resumable ascending range scan over a [`MemTree`].
///
/// The saved lower bound advances to each visited key, so a subsequent
/// fetch restarts the range at the point where the last one stopped. The
/// restart revisits that key; comparing against the last emitted identity
/// keeps it from being returned twice.
struct MemTreeCursor<'a> {
    tree: &'a MemTree,
    lower: PointKey,
    upper: PointKey,
    last_id: Option<PointId>,
    query: Query,
}

impl Cursor for MemTreeCursor<'_> {
    fn fetch(&mut self, n: usize) -> Result<Vec<Point>> {
        if self.upper <= self.lower {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(n.min(self.tree.buf.len()));
        let range = (Bound::Included(self.lower), Bound::Excluded(self.upper));
        for (key, p) in self.tree.buf.range(range) {
            self.lower = *key;
            if out.len() >= n {
                // Batch is full; this key is not consumed and the next
                // call sees it again.
                break;
            }
            let revisit = matches!((p.id, self.last_id), (Some(a), Some(b)) if a == b);
            if !revisit && self.query.match_attrs(p) {
                out.push(p.clone());
                self.last_id = p.id;
            }
        }
        Ok(out)
    }
}
