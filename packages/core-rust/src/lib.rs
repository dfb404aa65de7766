//! `PointDB` Core -- point model, identity, filter algebra, query and cursor protocol.
//!
//! This crate is the foundation layer of the `PointDB` time-series point
//! store:
//!
//! - **Error** ([`error`]): the shared [`Error`] kind surfaced by the engine
//! - **Identity** ([`id`]): [`PointId`], a 64-bit opaque id with url-safe base64 text form
//! - **Point** ([`point`]): the ingested record with its total `(ts, id)` order
//! - **Filter** ([`filter`]): composable attribute predicates and their JSON form
//! - **Query** ([`query`]): inclusive time window plus filter root
//! - **Cursor** ([`cursor`]): bounded-batch result streaming with a done-latch
//!
//! Storage engines and the HTTP surface live in the `pointdb-server` crate.

pub mod cursor;
pub mod error;
pub mod filter;
pub mod id;
pub mod point;
pub mod query;

// Error
pub use error::{Error, Result};

// Identity
pub use id::PointId;

// Point
pub use point::{Point, PointKey};

// Filter
pub use filter::Filter;

// Query
pub use query::Query;

// Cursor
pub use cursor::{Cursor, QueryCursor};
