//! Effective page geometry

use crate::{Point, Rect, Rotation, Size};
use serde::{Deserialize, Serialize};

/// US Letter, used when a page carries no usable MediaBox
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// Boxes and rotation that decide how a page is displayed
///
/// The crop box is always clipped to the media box, matching how viewers
/// treat an oversized or partially outside CropBox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    media_box: Rect,
    crop_box: Rect,
    rotation: Rotation,
}

impl PageGeometry {
    /// Create page geometry from raw page attributes
    ///
    /// # Arguments
    /// * `media_box` - The page MediaBox
    /// * `crop_box` - The page CropBox, if any
    /// * `rotation` - The page `/Rotate` value
    pub fn new(media_box: Rect, crop_box: Option<Rect>, rotation: Rotation) -> Self {
        let media_box = if media_box.is_empty() {
            DEFAULT_MEDIA_BOX
        } else {
            media_box
        };

        let crop_box = crop_box
            .and_then(|crop| crop.intersect(&media_box))
            .unwrap_or(media_box);

        Self {
            media_box,
            crop_box,
            rotation,
        }
    }

    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    pub fn crop_box(&self) -> Rect {
        self.crop_box
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Same boxes with a different rotation
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Visible page size in points, after rotation
    pub fn display_size(&self) -> Size {
        let size = self.crop_box.size();
        if self.rotation.is_quarter_turn() {
            size.transposed()
        } else {
            size
        }
    }

    /// Full media box size in points, after rotation
    pub fn media_display_size(&self) -> Size {
        let size = self.media_box.size();
        if self.rotation.is_quarter_turn() {
            size.transposed()
        } else {
            size
        }
    }

    /// Top-left corner of the crop box inside the displayed media box
    ///
    /// Measured in points from the displayed top-left corner of the media
    /// box, x to the right and y downwards.
    pub fn crop_offset(&self) -> Point {
        let w = self.media_box.width();
        let h = self.media_box.height();
        let left = self.crop_box.llx - self.media_box.llx;
        let bottom = self.crop_box.lly - self.media_box.lly;
        let right = self.crop_box.urx - self.media_box.llx;
        let top = self.crop_box.ury - self.media_box.lly;

        match self.rotation {
            Rotation::Deg0 => Point::new(left, h - top),
            Rotation::Deg90 => Point::new(bottom, left),
            Rotation::Deg180 => Point::new(w - right, bottom),
            Rotation::Deg270 => Point::new(h - top, w - right),
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_BOX, None, Rotation::Deg0)
    }
}
