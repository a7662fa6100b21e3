//! Integration tests for the ink round trip
//!
//! Strokes captured in view space are written into PDFs with rotated and
//! cropped pages and read back.

use annotator::{ImportOptions, InkPoint, InkSession, InkStore, PenKind, SaveOptions, StrokeStyle};
use lopdf::{dictionary, Object};
use pdf_core::InkAnnotation;
use pretty_assertions::assert_eq;

const VIEW_WIDTH: f64 = 1000.0;

/// One page per entry, each with its own page dictionary additions
fn create_test_pdf(pages: Vec<lopdf::Dictionary>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_count = pages.len();
    let mut page_ids = Vec::new();
    for extra in pages {
        let contents_id = doc.add_object(lopdf::Stream::new(dictionary! {}, vec![]));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        };
        for (key, value) in extra.iter() {
            page.set(key.clone(), value.clone());
        }
        page_ids.push(doc.add_object(page));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn letter(rotate: i64) -> lopdf::Dictionary {
    dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Rotate" => rotate,
    }
}

fn cropped(rotate: i64) -> lopdf::Dictionary {
    dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "CropBox" => vec![50.into(), 100.into(), 550.into(), 700.into()],
        "Rotate" => rotate,
    }
}

fn points(coords: &[(f64, f64)]) -> Vec<InkPoint> {
    coords.iter().map(|&(x, y)| InkPoint::new(x, y)).collect()
}

fn assert_close(actual: &[InkPoint], expected: &[InkPoint]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a.x - e.x).abs() < 1e-2 && (a.y - e.y).abs() < 1e-2,
            "{:?} != {:?}",
            a,
            e
        );
    }
}

fn no_simplify() -> SaveOptions {
    SaveOptions {
        simplify_tolerance: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_view_sizes_follow_rotation_and_crop() {
    let pdf = create_test_pdf(vec![letter(0), letter(90), cropped(270)]);
    let session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let portrait = session.page_view_size(1).unwrap();
    assert!((portrait.width - 1000.0).abs() < 1e-9);
    assert!((portrait.height - 792.0 / 612.0 * 1000.0).abs() < 1e-6);

    let landscape = session.page_view_size(2).unwrap();
    assert!((landscape.height - 612.0 / 792.0 * 1000.0).abs() < 1e-6);

    // Crop is 500 x 600, displayed as 600 x 500
    let crop = session.page_view_size(3).unwrap();
    assert!((crop.height - 500.0 / 600.0 * 1000.0).abs() < 1e-6);

    let layout = session.layout(10.0).unwrap();
    assert_eq!(layout.page_count(), 3);
}

#[test]
fn test_save_and_import_roundtrip_on_every_rotation() {
    let pdf = create_test_pdf(vec![
        cropped(0),
        cropped(90),
        cropped(180),
        cropped(270),
        letter(90),
    ]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let drawn = points(&[(100.0, 120.0), (400.0, 300.0), (700.0, 150.0)]);
    let mut store = InkStore::new();
    for page in 1..=5 {
        store
            .add_stroke(page, drawn.clone(), StrokeStyle::pen().with_width(3.0))
            .unwrap();
    }

    let report = session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(report.written, 5);
    assert_eq!(report.removed, 0);

    let saved = session.to_bytes().unwrap();
    let mut reopened = InkSession::from_bytes(&saved, VIEW_WIDTH).unwrap();
    let mut imported = InkStore::new();
    let count = reopened
        .import_ink(&mut imported, &ImportOptions::default())
        .unwrap();
    assert_eq!(count, 5);

    for page in 1..=5 {
        let strokes = imported.strokes(page);
        assert_eq!(strokes.len(), 1, "page {}", page);
        assert_close(&strokes[0].points, &drawn);
        assert!((strokes[0].style.width - 3.0).abs() < 1e-3);
        assert_eq!(strokes[0].style.kind, PenKind::Pen);
    }
}

#[test]
fn test_points_land_inside_crop_box() {
    let pdf = create_test_pdf(vec![cropped(90)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();
    let view = session.page_view_size(1).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(
            1,
            points(&[(0.0, 0.0), (view.width, view.height)]),
            StrokeStyle::pen(),
        )
        .unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();

    let annotations = session.document().ink_annotations(1).unwrap();
    let path = &annotations[0].1.ink_list[0];

    // Rotated 90: view top-left is the crop box's lower-left corner
    assert!((path[0].x - 50.0).abs() < 1e-3 && (path[0].y - 100.0).abs() < 1e-3);
    assert!((path[1].x - 550.0).abs() < 1e-3 && (path[1].y - 700.0).abs() < 1e-3);
}

#[test]
fn test_repeated_saves_do_not_duplicate() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(10.0, 10.0), (20.0, 20.0)]), StrokeStyle::pen())
        .unwrap();
    store
        .add_stroke(1, points(&[(30.0, 30.0), (40.0, 40.0)]), StrokeStyle::highlighter())
        .unwrap();

    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    let report = session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(report.removed, 2);
    assert_eq!(report.written, 2);
    assert_eq!(session.document().ink_annotations(1).unwrap().len(), 2);

    // Erased strokes disappear on the next save
    store.undo();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(session.document().ink_annotations(1).unwrap().len(), 1);
}

#[test]
fn test_foreign_annotations_survive_save() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let foreign = InkAnnotation::new(vec![vec![
        page_geometry::Point::new(10.0, 10.0),
        page_geometry::Point::new(20.0, 20.0),
    ]])
    .with_name("someone-else-7");
    session.document_mut().add_ink_annotation(1, &foreign).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(10.0, 10.0)]), StrokeStyle::pen())
        .unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();

    let annotations = session.document().ink_annotations(1).unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations.iter().filter(|(_, a)| a.is_own()).count(), 1);
}

#[test]
fn test_strokes_beyond_last_page_are_reported() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(1.0, 1.0), (2.0, 2.0)]), StrokeStyle::pen())
        .unwrap();
    store
        .add_stroke(3, points(&[(1.0, 1.0), (2.0, 2.0)]), StrokeStyle::pen())
        .unwrap();

    let report = session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped_pages, vec![3]);
}

#[test]
fn test_saved_annotation_metadata() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut store = InkStore::new();
    let id = store
        .add_stroke(1, points(&[(1.0, 1.0), (50.0, 50.0)]), StrokeStyle::highlighter())
        .unwrap();

    let options = SaveOptions {
        author: Some("Reviewer".to_string()),
        ..no_simplify()
    };
    session.save_inking_to_pdf(&store, &options).unwrap();

    let (_, ink) = session.document().ink_annotations(1).unwrap().remove(0);
    assert_eq!(ink.name, Some(format!("inkpdf-{}", id)));
    assert_eq!(ink.author.as_deref(), Some("Reviewer"));
    assert_eq!(ink.opacity, 0.5);
    assert!(ink.modified.as_deref().is_some_and(|m| m.starts_with("D:")));
}

#[test]
fn test_simplify_on_save() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(
            1,
            points(&[(0.0, 0.0), (10.0, 0.01), (20.0, 0.0), (30.0, 0.0)]),
            StrokeStyle::pen(),
        )
        .unwrap();

    let options = SaveOptions {
        simplify_tolerance: 0.5,
        ..Default::default()
    };
    session.save_inking_to_pdf(&store, &options).unwrap();

    let (_, ink) = session.document().ink_annotations(1).unwrap().remove(0);
    assert_eq!(ink.point_count(), 2);
}

#[test]
fn test_import_only_own_and_remove() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let foreign = InkAnnotation::new(vec![
        vec![page_geometry::Point::new(100.0, 100.0)],
        vec![page_geometry::Point::new(200.0, 200.0)],
    ]);
    session.document_mut().add_ink_annotation(1, &foreign).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(5.0, 5.0), (6.0, 6.0)]), StrokeStyle::highlighter())
        .unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();

    let mut own = InkStore::new();
    let count = session
        .import_ink(
            &mut own,
            &ImportOptions {
                remove_from_pdf: true,
                only_own: true,
            },
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(own.strokes(1)[0].style.kind, PenKind::Highlighter);

    // Only the foreign annotation remains; its two paths become two strokes
    let remaining = session.document().ink_annotations(1).unwrap();
    assert_eq!(remaining.len(), 1);

    let mut all = InkStore::new();
    let count = session.import_ink(&mut all, &ImportOptions::default()).unwrap();
    assert_eq!(count, 2);
    assert_eq!(all.strokes(1).len(), 2);
}

#[test]
fn test_import_skips_strokes_already_in_store() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(5.0, 5.0), (60.0, 60.0)]), StrokeStyle::pen())
        .unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();

    // Apply, extract into the same store, apply again
    let count = session.import_ink(&mut store, &ImportOptions::default()).unwrap();
    assert_eq!(count, 0);
    assert_eq!(store.stroke_count(), 1);

    let report = session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(session.document().ink_annotations(1).unwrap().len(), 1);

    // A store without the stroke still gets it
    let mut fresh = InkStore::new();
    let count = session.import_ink(&mut fresh, &ImportOptions::default()).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_unwritable_stroke_does_not_abort_save() {
    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();

    let mut first = InkStore::new();
    first
        .add_stroke(1, points(&[(1.0, 1.0), (2.0, 2.0)]), StrokeStyle::pen())
        .unwrap();
    session.save_inking_to_pdf(&first, &no_simplify()).unwrap();

    let store = InkStore::from_json(
        r#"{
            "version": 1,
            "pages": {
                "1": [
                    { "id": 1, "points": [ { "x": 10.0, "y": 10.0 }, { "x": 20.0, "y": 20.0 } ], "style": {} },
                    { "id": 2, "points": [ { "x": 30.0, "y": 30.0 }, { "x": 40.0, "y": 40.0 } ], "style": { "width": 0.0 } }
                ]
            }
        }"#,
    )
    .unwrap();

    let report = session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped_strokes, vec![2]);

    let annotations = session.document().ink_annotations(1).unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].1.name.as_deref(), Some("inkpdf-1"));
}

#[test]
fn test_invalid_page_and_view_width() {
    let pdf = create_test_pdf(vec![letter(0)]);
    assert!(InkSession::from_bytes(&pdf, 0.0).is_err());

    let session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();
    assert!(matches!(
        session.page_mapping(2),
        Err(annotator::AnnotatorError::InvalidPage(2, 1))
    ));
}

#[test]
fn test_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let pdf = create_test_pdf(vec![letter(0)]);
    let mut session = InkSession::from_bytes(&pdf, VIEW_WIDTH).unwrap();
    let mut store = InkStore::new();
    store
        .add_stroke(1, points(&[(5.0, 5.0), (6.0, 6.0)]), StrokeStyle::pen())
        .unwrap();
    session.save_inking_to_pdf(&store, &no_simplify()).unwrap();
    session.write(&path).unwrap();

    let reopened = InkSession::open(&path, VIEW_WIDTH).unwrap();
    assert_eq!(reopened.document().ink_annotations(1).unwrap().len(), 1);
}
