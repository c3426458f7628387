//! RON catalog loaders.
//!
//! Builtin tables cover a default install; loaders let packs override or
//! extend catalogs from data files without recompiling.

mod catalogs;

use std::path::Path;

pub use catalogs::{AccessoryLoader, RecipeLoader};

/// Result alias shared by all loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Reads a content file with path context on failure.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read content file {}: {}", path.display(), e))
}
