//! Codec configuration.

use std::sync::Arc;

use dbmap_core::DataMap;

/// Default indentation width of written documents.
pub const DEFAULT_INDENT: usize = 2;

/// Options for loading and saving maps.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Spaces per nesting level when writing. Zero writes everything on
    /// one line.
    pub indent: usize,

    /// Whether the map name is written.
    pub include_map_name: bool,

    /// Maps that relationship targets and references may resolve against
    /// when loading. They become dependencies of the loaded map.
    pub dependencies: Vec<Arc<DataMap>>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            include_map_name: true,
            dependencies: Vec::new(),
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Do not write the map name.
    pub fn without_map_name(mut self) -> Self {
        self.include_map_name = false;
        self
    }

    /// Add a dependency map.
    pub fn with_dependency(mut self, map: Arc<DataMap>) -> Self {
        self.dependencies.push(map);
        self
    }
}
