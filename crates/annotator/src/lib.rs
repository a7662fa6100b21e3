//! Annotator - ink capture, persistence and the PDF round trip
//!
//! This crate provides:
//! - Ink stroke model (pen and highlighter strokes in page-view space)
//! - Stroke persistence as versioned JSON sidecar files
//! - Saving strokes into a PDF as ink annotations and importing them back
//! - Per-document viewer state, recent files and PDF folder listing
//! - User settings
//! - Raster previews of a page's ink layer
//!
//! # Example
//!
//! ```ignore
//! use annotator::{InkSession, InkStore, SaveOptions, StrokeStyle};
//!
//! let mut session = InkSession::open("paper.pdf", 1000.0)?;
//! let mut store = InkStore::load_or_default(InkStore::sidecar_path("paper.pdf"))?;
//! store.add_stroke(1, points, StrokeStyle::pen())?;
//! session.save_inking_to_pdf(&store, &SaveOptions::default())?;
//! session.write("paper-annotated.pdf")?;
//! ```

mod browse;
mod ink;
mod preview;
mod session;
mod settings;
mod state;
mod store;

pub use browse::{list_pdfs, PdfEntry};
pub use ink::{Color, InkPoint, InkStroke, PenKind, StrokeStyle};
pub use preview::{render_ink_preview, save_preview, MAX_PREVIEW_PIXELS};
pub use session::{ImportOptions, InkSession, SaveOptions, SaveReport};
pub use settings::Settings;
pub use state::{RecentEntry, RecentFiles, StateStore, ViewerState};
pub use store::{InkStore, STORE_VERSION};

use thiserror::Error;

/// Errors that can occur while annotating documents
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Stroke has no points")]
    EmptyStroke,

    #[error("No stroke ids left")]
    IdsExhausted,

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Preview of {0}x{1} pixels is too large")]
    PreviewTooLarge(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("Geometry error: {0}")]
    GeometryError(#[from] page_geometry::GeometryError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for annotator operations
pub type Result<T> = std::result::Result<T, AnnotatorError>;

/// Write `contents` to `path` through a temporary sibling and a rename
///
/// Readers never observe a half-written file.
pub(crate) fn write_atomic(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
