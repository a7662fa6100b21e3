//! PDF folder listing

use crate::store::InkStore;
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A PDF found in a folder
#[derive(Debug, Clone, PartialEq)]
pub struct PdfEntry {
    pub path: PathBuf,
    /// File name for display
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// An ink sidecar exists next to the file
    pub has_ink: bool,
}

/// List the PDF files directly inside `dir`, sorted by name
///
/// The extension match is case-insensitive. Subdirectories are not
/// searched.
pub fn list_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PdfEntry>> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        entries.push(PdfEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            has_ink: InkStore::sidecar_path(&path).is_file(),
            path,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    debug!(dir = %dir.display(), count = entries.len(), "listed PDFs");

    Ok(entries)
}
