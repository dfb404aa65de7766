//! Storage engines: the [`PointIo`] contract and its three implementations.
//!
//! - [`MemTree`]: ordered tree keyed by `(ts, id)`; the hot-buffer engine
//! - [`MemList`]: time-ordered sequence with range excision; the archive engine
//! - [`Buffered`]: the two-tier composition with age-based promotion

pub mod buffered;
pub mod memlist;
pub mod memtree;
pub mod pointio;

#[cfg(test)]
pub(crate) mod testutil;

pub use buffered::{default_retention, Buffered};
pub use memlist::MemList;
pub use memtree::MemTree;
pub use pointio::{Clock, PointIo, SystemClock};
