//! Persistence layer: string dictionaries, the binary record codec, and
//! the fixed-record data file.

pub mod codec;
pub mod datafile;
pub mod dict;

pub use codec::PointCodec;
pub use datafile::DataFile;
pub use dict::StringDict;
