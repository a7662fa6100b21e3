//! Exhaustive round-trip checks for the view <-> PDF mapping
//!
//! Every rotation is combined with a spread of page boxes, scales and
//! sample points; mapping to PDF space and back must be the identity.

use page_geometry::{PageGeometry, PageMapping, Point, Rect, Rotation};

const TOLERANCE: f64 = 1e-6;

fn geometries() -> Vec<PageGeometry> {
    let boxes = [
        (Rect::new(0.0, 0.0, 612.0, 792.0), None),
        (Rect::new(0.0, 0.0, 595.28, 841.89), None),
        (
            Rect::new(0.0, 0.0, 600.0, 800.0),
            Some(Rect::new(50.0, 100.0, 550.0, 700.0)),
        ),
        (
            Rect::new(-20.0, 30.0, 1200.0, 400.0),
            Some(Rect::new(0.0, 40.0, 900.0, 390.0)),
        ),
        (Rect::new(100.0, 200.0, 712.0, 992.0), None),
    ];

    let mut out = Vec::new();
    for (media, crop) in boxes {
        for rotation in Rotation::all() {
            out.push(PageGeometry::new(media, crop, rotation));
        }
    }
    out
}

fn sample_points(width: f64, height: f64) -> Vec<Point> {
    let mut points = Vec::new();
    for i in 0..=6 {
        for j in 0..=6 {
            points.push(Point::new(
                width * i as f64 / 6.0,
                height * j as f64 / 6.0,
            ));
        }
    }
    // a few points outside the page must round trip too
    points.push(Point::new(-15.5, -3.25));
    points.push(Point::new(width + 42.0, height * 1.5));
    points
}

#[test]
fn view_to_pdf_to_view_is_identity() {
    for geometry in geometries() {
        for view_width in [96.0, 320.5, 612.0, 1000.0, 2480.0] {
            let mapping = PageMapping::for_view_width(geometry, view_width).unwrap();
            let size = mapping.view_size();

            for point in sample_points(size.width, size.height) {
                let back = mapping.to_view(mapping.to_pdf(point));
                assert!(
                    back.approx_eq(&point, TOLERANCE),
                    "{:?} width {}: {:?} -> {:?}",
                    geometry,
                    view_width,
                    point,
                    back
                );
            }
        }
    }
}

#[test]
fn pdf_to_view_to_pdf_is_identity() {
    for geometry in geometries() {
        for scale in [0.25, 0.75, 1.0, 1.333, 4.0] {
            let mapping = PageMapping::new(geometry, scale).unwrap();
            let media = geometry.media_box();

            for point in sample_points(media.width(), media.height()) {
                let pdf = Point::new(point.x + media.llx, point.y + media.lly);
                let back = mapping.to_pdf(mapping.to_view(pdf));
                assert!(back.approx_eq(&pdf, TOLERANCE), "{:?}: {:?}", geometry, pdf);
            }
        }
    }
}

#[test]
fn view_rectangle_covers_crop_box() {
    for geometry in geometries() {
        let mapping = PageMapping::for_view_width(geometry, 800.0).unwrap();
        let size = mapping.view_size();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.width, 0.0),
            Point::new(0.0, size.height),
            Point::new(size.width, size.height),
        ];

        let mapped = mapping.rect_to_pdf(corners).unwrap();
        let crop = geometry.crop_box();
        for (a, b) in mapped.to_array().iter().zip(crop.to_array().iter()) {
            assert!((a - b).abs() < TOLERANCE, "{:?} vs {:?}", mapped, crop);
        }
    }
}

#[test]
fn view_size_matches_requested_width() {
    for geometry in geometries() {
        let mapping = PageMapping::for_view_width(geometry, 750.0).unwrap();
        assert!((mapping.view_size().width - 750.0).abs() < TOLERANCE);
    }
}
