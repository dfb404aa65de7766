//! Batched result streaming for range queries.
//!
//! A store's `search` produces a [`QueryCursor`], which pulls matching
//! points in bounded batches from a store-specific [`Cursor`]
//! implementation. The wrapper owns the done-latch: the first empty batch
//! marks the stream exhausted, and any fetch after that is a contract
//! violation.

use tracing::trace;

use crate::error::{Error, Result};
use crate::point::Point;
use crate::query::Query;

/// Store-side scan state behind a [`QueryCursor`].
///
/// Implementations return up to `n` matching points in ascending
/// `(ts, id)` order, resuming where the previous call left off. An empty
/// batch means the scan is exhausted. Successive batches never overlap,
/// never skip a matching point, and never contain duplicates.
pub trait Cursor {
    /// Fetches the next batch of at most `n` matching points.
    fn fetch(&mut self, n: usize) -> Result<Vec<Point>>;
}

/// A streaming handle over one query's results.
///
/// Borrows the store it scans, so the store cannot be mutated while the
/// cursor is outstanding.
pub struct QueryCursor<'a> {
    query: Query,
    inner: Box<dyn Cursor + 'a>,
    done: bool,
}

impl<'a> QueryCursor<'a> {
    /// Wraps a store-specific cursor for the given query.
    #[must_use]
    pub fn new(query: Query, inner: Box<dyn Cursor + 'a>) -> Self {
        Self { query, inner, done: false }
    }

    /// The query this cursor is answering.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Whether the stream has already returned its final (empty) batch.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next batch of at most `n` matching points.
    ///
    /// Returns an empty batch once on exhaustion; the call after that is
    /// an invariant error. `n == 0` returns an empty batch without
    /// advancing the scan or latching the done flag.
    pub fn fetch(&mut self, n: usize) -> Result<Vec<Point>> {
        if self.done {
            return Err(Error::Invariant(format!(
                "fetch called on finished query {}",
                self.query
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let batch = self.inner.fetch(n)?;
        trace!(query = %self.query, n, got = batch.len(), "cursor fetch");
        if batch.is_empty() {
            self.done = true;
        }
        Ok(batch)
    }
}
