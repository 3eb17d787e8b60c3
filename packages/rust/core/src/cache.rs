//! JSON cache of scraped items.

use std::path::Path;

use arcdex_shared::{ArcdexError, Catalog, Result};
use tracing::{debug, instrument};

/// Load a cached catalog.
///
/// Accepts the category-keyed object written by [`save_cache`] as well as a
/// flat array of items.
#[instrument(fields(path = %path.display()))]
pub fn load_cache(path: &Path) -> Result<Catalog> {
    let raw = std::fs::read_to_string(path).map_err(|e| ArcdexError::io(path, e))?;
    let catalog: Catalog = serde_json::from_str(&raw).map_err(|e| {
        ArcdexError::validation(format!("{}: invalid cache: {e}", path.display()))
    })?;

    debug!(
        items = catalog.len(),
        categories = catalog.category_count(),
        "loaded cache"
    );
    Ok(catalog)
}

/// Write the catalog as pretty-printed JSON, creating parent directories.
#[instrument(skip(catalog), fields(path = %path.display(), items = catalog.len()))]
pub fn save_cache(path: &Path, catalog: &Catalog) -> Result<()> {
    let json = serde_json::to_string_pretty(catalog)?;
    write_atomic(path, json.as_bytes())?;
    debug!("wrote cache");
    Ok(())
}

/// Write to `.<name>.tmp` next to `path`, then rename over it.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent).map_err(|e| ArcdexError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| ArcdexError::validation(format!("{}: not a file path", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, contents).map_err(|e| ArcdexError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ArcdexError::io(path, e))?;
    Ok(())
}
