//! Mapping between a page view and PDF user space
//!
//! A page view shows the crop box of one page with its rotation applied,
//! origin at the top-left corner and y growing downwards. PDF user space
//! has its origin at the bottom-left of the unrotated page with y growing
//! upwards. Ink is captured in view units and written to the PDF in points.

use crate::{GeometryError, PageGeometry, Point, Rect, Result, Rotation, Size};

/// Rotation-aware transform between a page view and PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMapping {
    geometry: PageGeometry,
    /// PDF points per view unit
    scale: f64,
}

impl PageMapping {
    /// Create a mapping with an explicit scale (PDF points per view unit)
    pub fn new(geometry: PageGeometry, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeometryError::InvalidScale(scale));
        }

        let size = geometry.display_size();
        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(GeometryError::DegenerateBox(size.width, size.height));
        }

        Ok(Self { geometry, scale })
    }

    /// Create a mapping for a view that renders the page `view_width` units wide
    ///
    /// The scale ratio is the displayed page width in points divided by the
    /// width of the view.
    pub fn for_view_width(geometry: PageGeometry, view_width: f64) -> Result<Self> {
        if !view_width.is_finite() || view_width <= 0.0 {
            return Err(GeometryError::InvalidViewWidth(view_width));
        }

        Self::new(geometry, geometry.display_size().width / view_width)
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Size of the page in view units
    pub fn view_size(&self) -> Size {
        self.geometry.display_size().scaled(1.0 / self.scale)
    }

    /// Map a view point (top-left origin) to PDF user space
    pub fn to_pdf(&self, point: Point) -> Point {
        let offset = self.geometry.crop_offset();
        let page = self.geometry.media_display_size();
        let x = point.x * self.scale + offset.x;
        let y = point.y * self.scale + offset.y;

        let (px, py) = match self.geometry.rotation() {
            Rotation::Deg0 => (x, page.height - y),
            Rotation::Deg90 => (y, x),
            Rotation::Deg180 => (page.width - x, y),
            Rotation::Deg270 => (page.height - y, page.width - x),
        };

        let media = self.geometry.media_box();
        Point::new(px + media.llx, py + media.lly)
    }

    /// Map a PDF user space point back to the view, undoing [`Self::to_pdf`]
    pub fn to_view(&self, point: Point) -> Point {
        let media = self.geometry.media_box();
        let px = point.x - media.llx;
        let py = point.y - media.lly;
        let page = self.geometry.media_display_size();

        let (x, y) = match self.geometry.rotation() {
            Rotation::Deg0 => (px, page.height - py),
            Rotation::Deg90 => (py, px),
            Rotation::Deg180 => (page.width - px, py),
            Rotation::Deg270 => (page.width - py, page.height - px),
        };

        let offset = self.geometry.crop_offset();
        Point::new((x - offset.x) / self.scale, (y - offset.y) / self.scale)
    }

    /// Map a length (stroke width) from view units to points
    pub fn length_to_pdf(&self, length: f64) -> f64 {
        length * self.scale
    }

    /// Map a length (stroke width) from points to view units
    pub fn length_to_view(&self, length: f64) -> f64 {
        length / self.scale
    }

    /// PDF-space bounding rectangle of a set of view points
    pub fn rect_to_pdf<I>(&self, points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Point>,
    {
        Rect::bounding(points.into_iter().map(|p| self.to_pdf(p)))
    }
}
