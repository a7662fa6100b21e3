//! Raster preview of a page's ink layer

use crate::ink::{InkPoint, InkStroke};
use crate::{AnnotatorError, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use page_geometry::Size;
use std::path::Path;
use tracing::debug;

/// Largest preview canvas, in pixels
pub const MAX_PREVIEW_PIXELS: u64 = 64 * 1024 * 1024;

/// Rasterize strokes onto a transparent canvas
///
/// # Arguments
/// * `strokes` - Strokes in page-view space
/// * `view_size` - Page view size at zoom 1
/// * `scale` - Pixels per view unit
///
/// Each stroke is stamped with a round brush along its segments into a
/// coverage mask first, so self-overlapping parts of a translucent stroke
/// do not darken. The mask is then blended over the canvas with the
/// stroke's opacity. Canvases above [`MAX_PREVIEW_PIXELS`] are refused.
pub fn render_ink_preview(
    strokes: &[InkStroke],
    view_size: Size,
    scale: f64,
) -> Result<RgbaImage> {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let width_px = (view_size.width * scale).ceil().max(1.0);
    let height_px = (view_size.height * scale).ceil().max(1.0);

    if width_px * height_px > MAX_PREVIEW_PIXELS as f64 {
        return Err(AnnotatorError::PreviewTooLarge(width_px, height_px));
    }
    let width = width_px as u32;
    let height = height_px as u32;
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or(AnnotatorError::PreviewTooLarge(width_px, height_px))?;

    let mut canvas = RgbaImage::new(width, height);
    let mut mask = vec![false; len];

    for stroke in strokes {
        if stroke.is_empty() {
            continue;
        }

        mask.iter_mut().for_each(|m| *m = false);
        let radius = (stroke.style.width * scale / 2.0).max(0.5);
        let to_pixels = |p: &InkPoint| (p.x * scale, p.y * scale);

        // Stamps further out than this cannot touch the canvas
        let margin = radius.min(width_px + height_px);
        let bounds = (-margin, -margin, width_px + margin, height_px + margin);

        let mut last = to_pixels(&stroke.points[0]);
        if stroke.points.len() == 1 && last.0.is_finite() && last.1.is_finite() {
            stamp(&mut mask, width, height, last, radius);
        }

        for point in &stroke.points[1..] {
            let next = to_pixels(point);
            if let Some((a, b)) = clip_segment(last, next, bounds) {
                let dx = b.0 - a.0;
                let dy = b.1 - a.1;
                // Clipped segments are at most a canvas diagonal long
                let steps = (dx * dx + dy * dy).sqrt().ceil().max(1.0) as u32;

                for i in 0..=steps {
                    let t = i as f64 / steps as f64;
                    stamp(&mut mask, width, height, (a.0 + dx * t, a.1 + dy * t), radius);
                }
            }
            last = next;
        }

        let [r, g, b] = pdf_core::Color::from(stroke.style.color).to_rgb8();
        let alpha = stroke.style.opacity.clamp(0.0, 1.0);

        for (index, _) in mask.iter().enumerate().filter(|(_, covered)| **covered) {
            let x = (index % width as usize) as u32;
            let y = (index / width as usize) as u32;
            let pixel = canvas.get_pixel_mut(x, y);
            *pixel = blend_over(*pixel, [r, g, b], alpha);
        }
    }

    debug!(width, height, strokes = strokes.len(), "rendered ink preview");
    Ok(canvas)
}

/// Write a preview as PNG
pub fn save_preview<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
    image.save_with_format(path.as_ref(), ImageFormat::Png)?;
    Ok(())
}

impl From<image::ImageError> for AnnotatorError {
    fn from(e: image::ImageError) -> Self {
        AnnotatorError::ImageError(e.to_string())
    }
}

fn stamp(mask: &mut [bool], width: u32, height: u32, center: (f64, f64), radius: f64) {
    let width = width as i64;
    let height = height as i64;
    let min_x = (center.0 - radius).floor().max(0.0) as i64;
    let min_y = (center.1 - radius).floor().max(0.0) as i64;
    let max_x = ((center.0 + radius).ceil() as i64).min(width - 1);
    let max_y = ((center.1 + radius).ceil() as i64).min(height - 1);
    let r2 = radius * radius;

    for y in min_y..=max_y {
        let cy = y as f64 + 0.5 - center.1;
        for x in min_x..=max_x {
            let cx = x as f64 + 0.5 - center.0;
            if cx * cx + cy * cy <= r2 {
                mask[(y * width + x) as usize] = true;
            }
        }
    }
}

/// Part of the segment `a`-`b` inside `(min_x, min_y, max_x, max_y)`
///
/// Liang-Barsky clipping. `None` when the segment misses the box or has a
/// non-finite end.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }

    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, a.0 - min_x),
        (dx, max_x - a.0),
        (-dy, a.1 - min_y),
        (dy, max_y - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    if t0 > t1 {
        return None;
    }
    // Rounding on huge inputs can land just outside the box
    let clamp = |t: f64| {
        (
            (a.0 + t * dx).clamp(min_x, max_x),
            (a.1 + t * dy).clamp(min_y, max_y),
        )
    };
    Some((clamp(t0), clamp(t1)))
}

/// Source-over compositing of a flat color
fn blend_over(dst: Rgba<u8>, src: [u8; 3], alpha: f64) -> Rgba<u8> {
    let da = dst[3] as f64 / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| {
        let value = (s as f64 * alpha + d as f64 * da * (1.0 - alpha)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}
