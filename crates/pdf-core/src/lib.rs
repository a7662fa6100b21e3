//! PDF Core - Low-level PDF page geometry and ink annotations
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Resolving effective page geometry (inherited MediaBox, CropBox, Rotate)
//! - Writing ink annotations with appearance streams
//! - Reading and removing existing ink annotations
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, InkAnnotation, PdfDocument};
//! use page_geometry::Point;
//!
//! let mut doc = PdfDocument::open("input.pdf")?;
//! let geometry = doc.page_geometry(1)?;
//! let ink = InkAnnotation::new(vec![vec![Point::new(100.0, 700.0), Point::new(200.0, 650.0)]])
//!     .with_color(Color::red())
//!     .with_width(2.0);
//! doc.add_ink_annotation(1, &ink)?;
//! doc.save("output.pdf")?;
//! ```

mod annotation;
mod document;

pub use annotation::{
    appearance_operators, decode_text_string, encode_text_string, format_number, pdf_date,
    InkAnnotation,
};
pub use document::{Color, PdfDocument};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Geometry error: {0}")]
    GeometryError(#[from] page_geometry::GeometryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Prefix of the `/NM` name given to annotations this crate writes
pub const ANNOTATION_NAME_PREFIX: &str = "inkpdf-";
