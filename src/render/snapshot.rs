//! JSON snapshot of the whole document

use crate::document::FabricDocument;
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_PATH: &str = "reports/summary.json";

/// Write `<out_dir>/reports/summary.json`, pretty-printed.
pub fn write_snapshot(document: &FabricDocument, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(SNAPSHOT_PATH);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), "Wrote JSON snapshot");
    Ok(path)
}
