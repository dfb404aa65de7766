//! `PointDB` Server -- storage engines, record files, series registry, HTTP API.
//!
//! Layers, innermost first:
//!
//! - [`storage`]: the [`PointIo`](storage::PointIo) contract and its three
//!   engines (tree, list, two-tier buffered)
//! - [`file`]: string dictionaries, the binary record codec, and the
//!   fixed-record data file
//! - [`series`]: named series and the registry the entry point owns
//! - [`network`]: the axum router, JSend envelope, and serve loop

pub mod file;
pub mod network;
pub mod series;
pub mod storage;

pub use file::{DataFile, PointCodec, StringDict};
pub use network::{build_router, serve, AppState, JSend, JSendStatus, ServerConfig};
pub use series::{Series, SeriesRegistry};
pub use storage::{Buffered, Clock, MemList, MemTree, PointIo, SystemClock};
