//! XML persistence of dbmap schema maps.
//!
//! A map is stored as a single `data-map` document. Database entities come
//! first (derived entities after their parents), then object entities, then
//! database relationships, then object relationships, so that every
//! reference in the document points backwards.
//!
//! # Example
//!
//! ```
//! use dbmap_core::{types, DataMap, DbAttribute, DbEntity};
//!
//! let map = DataMap::new("gallery").with_db_entity(
//!     DbEntity::new("artist").with_attribute(DbAttribute::new("id", types::INTEGER).with_primary_key()),
//! );
//!
//! let xml = dbmap_xml::to_string(&map).unwrap();
//! let loaded = dbmap_xml::load_str(&xml).unwrap();
//! assert_eq!(loaded.db_entity("artist"), map.db_entity("artist"));
//! ```

pub mod config;
pub mod error;
pub mod format;
mod reader;
mod writer;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use dbmap_core::DataMap;

pub use config::CodecConfig;
pub use error::{CodecError, FormatError};

use reader::MapReader;
use writer::MapWriter;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Load a map from a buffered source.
pub fn load<R: BufRead>(source: R, config: &CodecConfig) -> Result<DataMap> {
    MapReader::new(source, config).read()
}

/// Load a map from a string with the default configuration.
pub fn load_str(source: &str) -> Result<DataMap> {
    load(source.as_bytes(), &CodecConfig::default())
}

/// Load a map from a file.
pub fn load_file(path: impl AsRef<Path>, config: &CodecConfig) -> Result<DataMap> {
    let source = fs::read(path)?;
    load(source.as_slice(), config)
}

/// Save a map to a sink, returning the sink.
///
/// Nothing is written when the map cannot be saved as a whole.
pub fn save<W: Write>(map: &DataMap, sink: W, config: &CodecConfig) -> Result<W> {
    MapWriter::new(map, config).write(sink)
}

/// Save a map to a string with the default configuration.
pub fn to_string(map: &DataMap) -> Result<String> {
    let bytes = save(map, Vec::new(), &CodecConfig::default())?;
    String::from_utf8(bytes).map_err(|e| CodecError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Save a map to a file.
///
/// The document is rendered in memory first, so a failed save leaves any
/// existing file untouched.
pub fn save_file(map: &DataMap, path: impl AsRef<Path>, config: &CodecConfig) -> Result<()> {
    let bytes = save(map, Vec::new(), config)?;
    fs::write(path, bytes)?;
    Ok(())
}
