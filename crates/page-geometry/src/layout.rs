//! Continuous vertical layout of a document's pages
//!
//! Pages are stacked top to bottom with a fixed gap and centered
//! horizontally. Page sizes are given in view units at zoom 1; the gap is
//! in viewport units and does not scale with zoom.

use crate::{Point, Rect, Size};
use std::ops::Range;

/// Lower zoom limit used unless overridden
pub const DEFAULT_MIN_ZOOM: f64 = 0.25;
/// Upper zoom limit used unless overridden
pub const DEFAULT_MAX_ZOOM: f64 = 8.0;

/// Stacked page layout used to decide which pages to realize
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    sizes: Vec<Size>,
    spacing: f64,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    /// Top edge of every page at the current zoom
    tops: Vec<f64>,
}

impl DocumentLayout {
    /// Create a layout at zoom 1
    ///
    /// # Arguments
    /// * `sizes` - Page view sizes at zoom 1, in document order
    /// * `spacing` - Gap between consecutive pages
    pub fn new(sizes: Vec<Size>, spacing: f64) -> Self {
        let mut layout = Self {
            sizes,
            spacing: spacing.max(0.0),
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            tops: Vec::new(),
        };
        layout.relayout();
        layout
    }

    /// Replace the zoom limits, clamping the current zoom into them
    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        let zoom = self.zoom;
        self.set_zoom(zoom);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.set_zoom(zoom);
        self
    }

    /// Set the zoom factor, clamped to the layout's limits
    ///
    /// Returns the zoom actually applied.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let zoom = if zoom.is_finite() { zoom } else { 1.0 };
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.relayout();
        self.zoom
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    /// Zoomed size of a page
    pub fn page_size(&self, index: usize) -> Option<Size> {
        self.sizes.get(index).map(|s| s.scaled(self.zoom))
    }

    /// Top edge of a page in layout coordinates
    pub fn page_top(&self, index: usize) -> Option<f64> {
        self.tops.get(index).copied()
    }

    /// Zoomed page area in layout coordinates (y downwards)
    ///
    /// Pages narrower than `viewport_width` are centered in it.
    pub fn page_rect(&self, index: usize, viewport_width: f64) -> Option<Rect> {
        let size = self.page_size(index)?;
        let top = self.page_top(index)?;
        let left = ((viewport_width.max(self.content_width()) - size.width) / 2.0).max(0.0);
        Some(Rect::new(left, top, left + size.width, top + size.height))
    }

    /// Scroll offset that brings a page's top edge to the top of the viewport
    pub fn offset_for_page(&self, index: usize) -> Option<f64> {
        self.page_top(index)
    }

    /// Width of the widest zoomed page
    pub fn content_width(&self) -> f64 {
        self.sizes
            .iter()
            .map(|s| s.width * self.zoom)
            .fold(0.0, f64::max)
    }

    /// Height of the whole document at the current zoom
    pub fn total_height(&self) -> f64 {
        match (self.tops.last(), self.sizes.last()) {
            (Some(top), Some(size)) => top + size.height * self.zoom,
            _ => 0.0,
        }
    }

    /// Page whose slot (page plus the gap below it) contains `y`
    pub fn page_at_offset(&self, y: f64) -> Option<usize> {
        if self.tops.is_empty() || y < 0.0 || y >= self.total_height() {
            return None;
        }

        let after = self.tops.partition_point(|top| *top <= y);
        Some(after.saturating_sub(1))
    }

    /// Pages intersecting the viewport, widened by `buffer` pages each side
    ///
    /// # Arguments
    /// * `top` - Scroll offset of the viewport
    /// * `height` - Viewport height
    /// * `buffer` - Extra pages to keep realized above and below
    pub fn visible_pages(&self, top: f64, height: f64, buffer: usize) -> Range<usize> {
        let count = self.sizes.len();
        if count == 0 || !top.is_finite() || height.is_nan() || height <= 0.0 {
            return 0..0;
        }

        let bottom = top + height;
        let first = (0..count)
            .find(|&i| self.tops[i] + self.sizes[i].height * self.zoom > top)
            .unwrap_or(count);
        // A viewport inside a gap gives `first == end`; the buffer still
        // widens around the neighbouring pages
        let end = self.tops.partition_point(|t| *t < bottom).max(first);

        first.saturating_sub(buffer)..(end + buffer).min(count)
    }

    /// Find the page under a viewport point
    ///
    /// `point` is in layout coordinates (scroll offset already added).
    /// Returns the page index and the page-local point at zoom 1, or `None`
    /// when the point falls in a gap or margin.
    pub fn locate(&self, point: Point, viewport_width: f64) -> Option<(usize, Point)> {
        let index = self.page_at_offset(point.y)?;
        let rect = self.page_rect(index, viewport_width)?;
        let local_x = point.x - rect.llx;
        let local_y = point.y - rect.lly;

        if local_x < 0.0 || local_x > rect.width() || local_y > rect.height() {
            return None;
        }

        Some((index, Point::new(local_x / self.zoom, local_y / self.zoom)))
    }

    fn relayout(&mut self) {
        let mut top = 0.0;
        self.tops.clear();
        for size in &self.sizes {
            self.tops.push(top);
            top += size.height * self.zoom + self.spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_pages() -> DocumentLayout {
        DocumentLayout::new(
            vec![
                Size::new(100.0, 200.0),
                Size::new(100.0, 100.0),
                Size::new(200.0, 300.0),
            ],
            10.0,
        )
    }

    #[test]
    fn test_tops_and_height() {
        let layout = three_pages();
        assert_eq!(layout.page_top(0), Some(0.0));
        assert_eq!(layout.page_top(1), Some(210.0));
        assert_eq!(layout.page_top(2), Some(320.0));
        assert_eq!(layout.total_height(), 620.0);
    }

    #[test]
    fn test_zoom_rescales_pages_not_gaps() {
        let layout = three_pages().with_zoom(2.0);
        assert_eq!(layout.page_top(1), Some(410.0));
        assert_eq!(layout.total_height(), 1220.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut layout = three_pages().with_zoom_limits(0.5, 4.0);
        assert_eq!(layout.set_zoom(10.0), 4.0);
        assert_eq!(layout.set_zoom(0.1), 0.5);
        assert_eq!(layout.set_zoom(f64::NAN), 1.0);
    }

    #[test]
    fn test_page_at_offset() {
        let layout = three_pages();
        assert_eq!(layout.page_at_offset(0.0), Some(0));
        assert_eq!(layout.page_at_offset(205.0), Some(0)); // gap belongs to page above
        assert_eq!(layout.page_at_offset(210.0), Some(1));
        assert_eq!(layout.page_at_offset(619.0), Some(2));
        assert_eq!(layout.page_at_offset(620.0), None);
        assert_eq!(layout.page_at_offset(-1.0), None);
    }

    #[test]
    fn test_visible_pages() {
        let layout = three_pages();
        assert_eq!(layout.visible_pages(0.0, 100.0, 0), 0..1);
        assert_eq!(layout.visible_pages(150.0, 100.0, 0), 0..2);
        assert!(layout.visible_pages(205.0, 3.0, 0).is_empty());
        assert_eq!(layout.visible_pages(250.0, 10.0, 1), 0..3);
        assert_eq!(layout.visible_pages(0.0, 0.0, 1), 0..0);
    }

    #[test]
    fn test_visible_pages_in_gap_keeps_buffer() {
        let layout = three_pages();
        assert_eq!(layout.visible_pages(205.0, 3.0, 1), 0..2);
        assert_eq!(layout.visible_pages(315.0, 2.0, 1), 1..3);
        assert_eq!(layout.visible_pages(205.0, 3.0, 5), 0..3);
    }

    #[test]
    fn test_empty_layout() {
        let layout = DocumentLayout::new(Vec::new(), 10.0);
        assert_eq!(layout.total_height(), 0.0);
        assert_eq!(layout.page_at_offset(0.0), None);
        assert_eq!(layout.visible_pages(0.0, 100.0, 2), 0..0);
    }

    #[test]
    fn test_locate_centers_pages() {
        let layout = three_pages();
        // Viewport 300 wide: page 1 (100 wide) spans x 100..200
        let (index, local) = layout.locate(Point::new(150.0, 260.0), 300.0).unwrap();
        assert_eq!(index, 1);
        assert_eq!(local, Point::new(50.0, 50.0));

        assert_eq!(layout.locate(Point::new(50.0, 260.0), 300.0), None);
        assert_eq!(layout.locate(Point::new(150.0, 315.0), 300.0), None);
    }

    #[test]
    fn test_page_rect() {
        let layout = three_pages().with_zoom(2.0);
        // Widest page is 400 at zoom 2, so it sets the content width
        assert_eq!(
            layout.page_rect(1, 300.0),
            Some(Rect::new(100.0, 410.0, 300.0, 610.0))
        );
        assert_eq!(layout.page_rect(3, 300.0), None);
    }

    #[test]
    fn test_locate_unzooms() {
        let layout = three_pages().with_zoom(2.0);
        let (index, local) = layout.locate(Point::new(200.0, 100.0), 400.0).unwrap();
        assert_eq!(index, 0);
        assert_eq!(local, Point::new(50.0, 50.0));
    }
}
