//! Ordered list store.
//!
//! Keeps points as a single ascending `(ts, id)` sequence. Insertion is
//! optimized for the append-heavy case: the batch is sorted, then placed
//! from the back of the store, walking the insertion point backward only
//! as far as out-of-order data requires.
//!
//! Re-inserting an equal `(ts, id)` key appends a duplicate by default;
//! a store built with [`MemList::with_dedup`] replaces instead.

use chrono::{DateTime, Utc};
use pointdb_core::{Cursor, Error, Point, Query, QueryCursor, Result};
use tracing::debug;

use super::pointio::PointIo;

/// Time-ordered sequence store; the usual cold-archive engine.
#[derive(Debug, Default)]
pub struct MemList {
    buf: Vec<Point>,
    dedup: bool,
}

impl MemList {
    /// Creates an empty list store with duplicate keys permitted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list store that replaces on equal-key insert
    /// instead of appending a duplicate.
    #[must_use]
    pub fn with_dedup() -> Self {
        Self { buf: Vec::new(), dedup: true }
    }

    /// Confirms the sequence is in non-decreasing point order. Intended
    /// for tests; the error names the first offending pair.
    pub fn validate(&self) -> Result<()> {
        for pair in self.buf.windows(2) {
            if pair[0].key() > pair[1].key() {
                return Err(Error::Invariant(format!(
                    "point ({}) ordered before point ({})",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }
}

impl PointIo for MemList {
    fn name(&self) -> &'static str {
        "memlist"
    }

    fn add(&mut self, mut points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        points.sort_by_key(Point::key);

        if self.dedup {
            // Replace-on-equal-key wants last-write-wins, so walk the
            // sorted batch forward.
            for p in points {
                match self.buf.binary_search_by(|q| q.key().cmp(&p.key())) {
                    Ok(i) => self.buf[i] = p,
                    Err(i) => self.buf.insert(i, p),
                }
            }
            return Ok(());
        }

        // Insert from the back: the normal case appends at the current
        // time, so the walk rarely moves. Each next point in reverse
        // batch order can only land at or before the previous slot.
        let mut pos = self.buf.len();
        for p in points.into_iter().rev() {
            while pos > 0 && self.buf[pos - 1].key() > p.key() {
                pos -= 1;
            }
            self.buf.insert(pos, p);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn first(&self) -> Option<&Point> {
        self.buf.first()
    }

    fn last(&self) -> Option<&Point> {
        self.buf.last()
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
        let start_micros = start.timestamp_micros();
        let end_micros = end.timestamp_micros();

        let from = self
            .buf
            .iter()
            .position(|p| p.micros() >= start_micros)
            .unwrap_or(self.buf.len());
        let within = self.buf[from..]
            .iter()
            .position(|p| p.micros() > end_micros)
            .unwrap_or(self.buf.len() - from);

        let moved: Vec<Point> = self.buf.drain(from..from + within).collect();
        let n = moved.len();
        if n > 0 {
            dest.add(moved)?;
        }
        debug!(moved = n, remaining = self.buf.len(), "memlist move_range");
        Ok(n)
    }

    fn search<'a>(&'a self, query: &Query) -> Result<QueryCursor<'a>> {
        let cursor = MemListCursor { list: self, pos: 0, query: query.clone() };
        Ok(QueryCursor::new(query.clone(), Box::new(cursor)))
    }
}

/// Forward walk over a [`MemList`], resuming at a saved position.
///
/// Because the sequence is time-ordered, the walk terminates as soon as a
/// point past the query window is seen.
struct MemListCursor<'a> {
    list: &'a MemList,
    pos: usize,
    query: Query,
}

impl Cursor for MemListCursor<'_> {
    fn fetch(&mut self, n: usize) -> Result<Vec<Point>> {
        let buf = &self.list.buf;
        let mut out = Vec::with_capacity(n.min(buf.len()));

        while out.len() < n && self.pos < buf.len() {
            let p = &buf[self.pos];
            if self.query.matches(p) {
                out.push(p.clone());
            }
            if p.micros() > self.query.end_micros() {
                // Ordered sequence: nothing after this can match.
                self.pos = buf.len();
                break;
            }
            self.pos += 1;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pointdb_core::PointId;

    use super::*;
    use crate::storage::testutil::{battery, minute_point, sample_points_shuffled, start_ts};

    #[test]
    fn shuffled_adds_stay_ordered() {
        let mut list = MemList::new();
        for chunk in sample_points_shuffled(0, 120).chunks(11) {
            list.add(chunk.to_vec()).unwrap();
            list.validate().unwrap();
        }
        assert_eq!(list.len(), 120);
        assert_eq!(list.first().unwrap().ts, start_ts());
        assert_eq!(list.last().unwrap().ts, start_ts() + Duration::minutes(119));
    }

    #[test]
    fn equal_key_insert_appends_by_default() {
        let mut list = MemList::new();
        let p = minute_point(0);
        list.add(vec![p.clone()]).unwrap();
        list.add(vec![p.clone()]).unwrap();
        assert_eq!(list.len(), 2);
        list.validate().unwrap();
    }

    #[test]
    fn dedup_store_replaces_on_equal_key() {
        let mut list = MemList::with_dedup();
        let p = minute_point(0);
        let mut updated = p.clone();
        updated.vals.insert("area".to_string(), 99.0);

        list.add(vec![p]).unwrap();
        list.add(vec![updated.clone()]).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.first().unwrap().identical(&updated));
    }

    #[test]
    fn same_microsecond_orders_by_id() {
        let mut list = MemList::new();
        let ts = start_ts();
        let mut hi = Point::new(ts);
        hi.id = Some(PointId::from_u64(9));
        let mut lo = Point::new(ts);
        lo.id = Some(PointId::from_u64(3));

        list.add(vec![hi]).unwrap();
        list.add(vec![lo]).unwrap();
        list.validate().unwrap();
        assert_eq!(list.first().unwrap().id, Some(PointId::from_u64(3)));
        assert_eq!(list.last().unwrap().id, Some(PointId::from_u64(9)));
    }

    #[test]
    fn move_range_excises_inclusive_window() {
        let mut src = MemList::new();
        let points = sample_points_shuffled(0, 10);
        src.add(points.clone()).unwrap();
        let mut dest = MemList::new();

        let n = src
            .move_range(
                start_ts() + Duration::minutes(3),
                start_ts() + Duration::minutes(6),
                &mut dest,
            )
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(src.len(), 6);
        assert_eq!(dest.len(), 4);
        src.validate().unwrap();
        dest.validate().unwrap();

        // Source keeps exactly the points outside the window, in order.
        let mut expected = points;
        expected.sort_by_key(Point::key);
        let outside: Vec<&Point> = expected
            .iter()
            .filter(|p| p.ts < start_ts() + Duration::minutes(3) || p.ts > start_ts() + Duration::minutes(6))
            .collect();
        for (kept, exp) in src.buf.iter().zip(outside) {
            assert!(kept.identical(exp));
        }
    }

    #[test]
    fn move_range_of_everything_empties_source() {
        let mut src = MemList::new();
        src.add(sample_points_shuffled(0, 5)).unwrap();
        let mut dest = MemList::new();

        let n = src
            .move_range(start_ts(), start_ts() + Duration::hours(1), &mut dest)
            .unwrap();
        assert_eq!(n, 5);
        assert!(src.is_empty());
        assert_eq!(dest.len(), 5);
    }

    #[test]
    fn move_range_missing_window_is_noop() {
        let mut src = MemList::new();
        src.add(sample_points_shuffled(0, 5)).unwrap();
        let mut dest = MemList::new();

        let n = src
            .move_range(
                start_ts() - Duration::hours(1),
                start_ts() - Duration::minutes(1),
                &mut dest,
            )
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(src.len(), 5);
        assert!(dest.is_empty());
    }

    #[test]
    fn cursor_stops_early_past_window() {
        let mut list = MemList::new();
        list.add(sample_points_shuffled(0, 50)).unwrap();

        let query = Query::new(
            start_ts() + Duration::minutes(10),
            start_ts() + Duration::minutes(19),
            pointdb_core::Filter::True,
        );
        let mut cur = list.search(&query).unwrap();
        let batch = cur.fetch(100).unwrap();
        assert_eq!(batch.len(), 10);
        assert!(cur.fetch(100).unwrap().is_empty());
        assert!(cur.is_done());
    }

    #[test]
    fn battery_small_batches() {
        battery(&mut MemList::new(), 100, 7);
    }

    #[test]
    fn battery_single_batch() {
        battery(&mut MemList::new(), 150, 150);
    }
}
