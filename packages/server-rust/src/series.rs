//! Named series and the process-wide series registry.
//!
//! A series owns one [`PointIo`] store behind a mutex, giving the
//! "exclusive access for mutation" contract per series rather than per
//! process. The registry itself is owned by the entry point and threaded
//! into request handlers as shared state; there is no global singleton.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use pointdb_core::{Error, Result};
use tracing::warn;

use crate::storage::PointIo;

/// A named collection of points sharing one store.
pub struct Series {
    id: String,
    io: Mutex<Box<dyn PointIo>>,
}

impl std::fmt::Debug for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Series").field("id", &self.id).finish()
    }
}

impl Series {
    /// Creates a series over the given store.
    #[must_use]
    pub fn new(id: impl Into<String>, io: Box<dyn PointIo>) -> Self {
        Self { id: id.into(), io: Mutex::new(io) }
    }

    /// The series identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Locks and returns the underlying store.
    pub fn io(&self) -> MutexGuard<'_, Box<dyn PointIo>> {
        self.io.lock()
    }
}

/// Keyed lookup of the live series.
#[derive(Default)]
pub struct SeriesRegistry {
    series: DashMap<String, Arc<Series>>,
}

impl SeriesRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no series are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Whether a series with this id exists.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    /// Registers a series. Fails with [`Error::Conflict`] if the id is
    /// already taken.
    pub fn add(&self, series: Series) -> Result<()> {
        match self.series.entry(series.id().to_string()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "series '{}' already exists",
                series.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(series));
                Ok(())
            }
        }
    }

    /// Retrieves a series by id.
    pub fn get(&self, id: &str) -> Result<Arc<Series>> {
        self.series
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotFound(format!("series '{id}' does not exist")))
    }

    /// Runs `flush` on every series, returning the total number of points
    /// promoted. A failing series is logged and skipped.
    pub fn flush_all(&self) -> usize {
        let mut promoted = 0;
        for entry in self.series.iter() {
            match entry.value().io().flush() {
                Ok(n) => promoted += n,
                Err(e) => warn!(series = entry.key().as_str(), error = %e, "flush failed"),
            }
        }
        promoted
    }
}
