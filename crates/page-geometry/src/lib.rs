//! Page Geometry - page boxes, rotation and coordinate mapping
//!
//! This crate provides:
//! - PDF rectangles, points and sizes
//! - Page rotation (`/Rotate`) handling
//! - Effective page geometry (MediaBox, CropBox, rotation)
//! - Mapping between a top-left-origin page view and PDF user space
//! - Continuous-scroll layout of a whole document
//!
//! # Example
//!
//! ```ignore
//! use page_geometry::{PageGeometry, PageMapping, Point, Rect, Rotation};
//!
//! let geometry = PageGeometry::new(Rect::new(0.0, 0.0, 612.0, 792.0), None, Rotation::Deg90);
//! let mapping = PageMapping::for_view_width(geometry, 1000.0)?;
//! let pdf = mapping.to_pdf(Point::new(10.0, 20.0));
//! let back = mapping.to_view(pdf);
//! ```

mod geometry;
mod layout;
mod mapping;
mod page;
mod rotation;

pub use geometry::{Point, Rect, Size};
pub use layout::{DocumentLayout, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
pub use mapping::PageMapping;
pub use page::PageGeometry;
pub use rotation::Rotation;

use thiserror::Error;

/// Errors that can occur while building page geometry
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Invalid page rotation: {0} (must be a multiple of 90)")]
    InvalidRotation(i64),

    #[error("Invalid scale: {0}")]
    InvalidScale(f64),

    #[error("Invalid view width: {0}")]
    InvalidViewWidth(f64),

    #[error("Degenerate page box: {0} x {1}")]
    DegenerateBox(f64, f64),
}

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Default tolerance used when comparing mapped coordinates
pub const EPSILON: f64 = 1e-6;
