//! Two-tier buffer-plus-archive store.
//!
//! Composes a hot buffer (typically a [`MemTree`](super::MemTree)) with a
//! cold archive (typically a [`MemList`](super::MemList)). Fresh data
//! lands in the buffer; data arriving behind the archive's tail lands
//! directly in the archive, so the hot region stays monotone-increasing
//! while late backfill is still accepted.
//!
//! [`PointIo::flush`] promotes buffer points older than the retention
//! window to the archive. It is only ever invoked by an external
//! scheduler, never as a side effect of `add`.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use pointdb_core::{Cursor, Point, Query, QueryCursor, Result};
use tracing::debug;

use super::pointio::{Clock, PointIo, SystemClock};

/// Minimum age a point reaches before `flush` promotes it to the archive.
#[must_use]
pub fn default_retention() -> Duration {
    Duration::minutes(15)
}

/// Two-tier store: hot buffer in front of a cold archive.
pub struct Buffered {
    buf: Box<dyn PointIo>,
    archive: Box<dyn PointIo>,
    retention: Duration,
    clock: Box<dyn Clock>,
}

impl Buffered {
    /// Composes `buf` and `archive` with the default retention and the
    /// system clock.
    #[must_use]
    pub fn new(buf: Box<dyn PointIo>, archive: Box<dyn PointIo>) -> Self {
        Self {
            buf,
            archive,
            retention: default_retention(),
            clock: Box::new(SystemClock),
        }
    }

    /// Overrides how long points stay in the buffer before `flush`
    /// promotes them.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Overrides the clock; tests drive promotion deterministically.
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl PointIo for Buffered {
    fn name(&self) -> &'static str {
        "buffered"
    }

    fn add(&mut self, points: Vec<Point>) -> Result<()> {
        for p in points {
            // On or after the archive tail: the point belongs to the hot
            // region. Behind it: out-of-order backfill, straight to the
            // archive.
            let to_buffer = match self.archive.last() {
                None => true,
                Some(tail) => p.micros() >= tail.micros(),
            };
            if to_buffer {
                self.buf.add(vec![p])?;
            } else {
                self.archive.add(vec![p])?;
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.buf.len() + self.archive.len()
    }

    fn first(&self) -> Option<&Point> {
        self.archive.first().or_else(|| self.buf.first())
    }

    fn last(&self) -> Option<&Point> {
        self.buf.last().or_else(|| self.archive.last())
    }

    fn flush(&mut self) -> Result<usize> {
        let Some(oldest) = self.buf.first() else {
            return Ok(0);
        };
        let start = oldest.ts;
        // Promote strictly-older-than-cutoff points; the window is
        // inclusive, so it ends one microsecond short of the cutoff.
        let end = self.clock.now() - self.retention - Duration::microseconds(1);
        if end.timestamp_micros() < start.timestamp_micros() {
            return Ok(0);
        }
        let n = self.buf.move_range(start, end, self.archive.as_mut())?;
        debug!(
            promoted = n,
            buffered = self.buf.len(),
            archived = self.archive.len(),
            "buffered flush"
        );
        Ok(n)
    }

    fn vacuum(&mut self) -> Result<()> {
        self.buf.vacuum()?;
        self.archive.vacuum()
    }

    fn move_range(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        dest: &mut dyn PointIo,
    ) -> Result<usize> {
        let from_archive = self.archive.move_range(start, end, dest)?;
        let from_buf = self.buf.move_range(start, end, dest)?;
        Ok(from_archive + from_buf)
    }

    fn search<'a>(&'a self, query: &Query) -> Result<QueryCursor<'a>> {
        let cursor = BufferedCursor {
            archive: self.archive.search(query)?,
            buffer: self.buf.search(query)?,
            queue: VecDeque::new(),
        };
        Ok(QueryCursor::new(query.clone(), Box::new(cursor)))
    }
}

/// Merged scan over the two tiers.
///
/// Archive keys all precede buffer keys under the placement invariant, so
/// draining the archive cursor before the buffer cursor preserves the
/// overall ascending order.
struct BufferedCursor<'a> {
    archive: QueryCursor<'a>,
    buffer: QueryCursor<'a>,
    queue: VecDeque<Point>,
}

impl Cursor for BufferedCursor<'_> {
    fn fetch(&mut self, n: usize) -> Result<Vec<Point>> {
        while self.queue.len() < n && !self.archive.is_done() {
            self.queue.extend(self.archive.fetch(n)?);
        }
        while self.queue.len() < n && !self.buffer.is_done() {
            self.queue.extend(self.buffer.fetch(n)?);
        }
        let take = n.min(self.queue.len());
        Ok(self.queue.drain(..take).collect())
    }
}
