//! Ink round trip between page views and PDF ink annotations

use crate::ink::{InkPoint, PenKind, StrokeStyle};
use crate::store::InkStore;
use crate::{AnnotatorError, Result};
use page_geometry::{DocumentLayout, PageGeometry, PageMapping, Size};
use pdf_core::{InkAnnotation, PdfDocument, PdfError, ANNOTATION_NAME_PREFIX};
use std::path::Path;
use tracing::{debug, info, warn};

/// Options for writing strokes into the PDF
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Author written to `/T`
    pub author: Option<String>,
    /// Point reduction tolerance in view units (0 disables)
    pub simplify_tolerance: f64,
    /// Remove ink annotations written by an earlier save first
    pub replace_existing: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            author: None,
            simplify_tolerance: 0.0,
            replace_existing: true,
        }
    }
}

/// Outcome of [`InkSession::save_inking_to_pdf`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Annotations written
    pub written: usize,
    /// Earlier annotations removed
    pub removed: usize,
    /// Pages with strokes that the document does not have
    pub skipped_pages: Vec<usize>,
    /// Strokes that could not be written, such as zero-width ones
    pub skipped_strokes: Vec<u64>,
}

/// Options for reading ink annotations into a store
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Delete the imported annotations from the PDF
    pub remove_from_pdf: bool,
    /// Only import annotations written by this tool
    pub only_own: bool,
}

/// An open PDF together with the page views ink is captured on
///
/// Every page is displayed `view_width` units wide at zoom 1; each page's
/// mapping derives its scale from that width.
pub struct InkSession {
    document: PdfDocument,
    geometries: Vec<PageGeometry>,
    view_width: f64,
}

impl InkSession {
    /// Open a PDF file
    ///
    /// # Arguments
    /// * `path` - Path to the PDF file
    /// * `view_width` - Width of a page view at zoom 1
    pub fn open<P: AsRef<Path>>(path: P, view_width: f64) -> Result<Self> {
        Self::from_document(PdfDocument::open(path)?, view_width)
    }

    /// Open a PDF from bytes
    pub fn from_bytes(data: &[u8], view_width: f64) -> Result<Self> {
        Self::from_document(PdfDocument::open_from_bytes(data)?, view_width)
    }

    /// Wrap an already opened document
    pub fn from_document(document: PdfDocument, view_width: f64) -> Result<Self> {
        if !view_width.is_finite() || view_width <= 0.0 {
            return Err(page_geometry::GeometryError::InvalidViewWidth(view_width).into());
        }

        let geometries = document.page_geometries()?;
        debug!(pages = geometries.len(), view_width, "ink session ready");

        Ok(Self {
            document,
            geometries,
            view_width,
        })
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut PdfDocument {
        &mut self.document
    }

    pub fn page_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn view_width(&self) -> f64 {
        self.view_width
    }

    /// Geometry of a page (1-indexed)
    pub fn geometry(&self, page: usize) -> Result<&PageGeometry> {
        page.checked_sub(1)
            .and_then(|index| self.geometries.get(index))
            .ok_or(AnnotatorError::InvalidPage(page, self.geometries.len()))
    }

    /// View <-> PDF mapping of a page (1-indexed)
    pub fn page_mapping(&self, page: usize) -> Result<PageMapping> {
        Ok(PageMapping::for_view_width(*self.geometry(page)?, self.view_width)?)
    }

    /// Size of a page view at zoom 1
    pub fn page_view_size(&self, page: usize) -> Result<Size> {
        Ok(self.page_mapping(page)?.view_size())
    }

    /// Continuous-scroll layout of all page views
    pub fn layout(&self, spacing: f64) -> Result<DocumentLayout> {
        let sizes = (1..=self.page_count())
            .map(|page| self.page_view_size(page))
            .collect::<Result<Vec<_>>>()?;
        Ok(DocumentLayout::new(sizes, spacing))
    }

    /// Write the store's strokes into the PDF as ink annotations
    ///
    /// Each stroke becomes one annotation named `inkpdf-<id>`. With
    /// `replace_existing`, annotations from an earlier save are removed from
    /// every page first, so erased strokes disappear and nothing is
    /// duplicated.
    pub fn save_inking_to_pdf(
        &mut self,
        store: &InkStore,
        options: &SaveOptions,
    ) -> Result<SaveReport> {
        let mut report = SaveReport::default();

        if options.replace_existing {
            for page in 1..=self.page_count() {
                report.removed += self
                    .document
                    .remove_annotations(page, InkAnnotation::is_own)?;
            }
        }

        for (page, strokes) in store.iter() {
            if page > self.page_count() {
                warn!(
                    page,
                    pages = self.page_count(),
                    "strokes on a page the document does not have"
                );
                report.skipped_pages.push(page);
                continue;
            }

            let mapping = self.page_mapping(page)?;

            for stroke in strokes {
                let stroke = stroke.simplified(options.simplify_tolerance);
                let points = stroke
                    .points
                    .iter()
                    .map(|p| mapping.to_pdf(p.to_point()))
                    .collect();

                let mut ink = InkAnnotation::new(vec![points])
                    .with_color(stroke.style.color.into())
                    .with_width(mapping.length_to_pdf(stroke.style.width))
                    .with_opacity(stroke.style.opacity)
                    .with_name(format!("{}{}", ANNOTATION_NAME_PREFIX, stroke.id))
                    .with_modified(stroke.created);
                if let Some(author) = &options.author {
                    ink = ink.with_author(author.clone());
                }

                match self.document.add_ink_annotation(page, &ink) {
                    Ok(_) => report.written += 1,
                    Err(PdfError::InvalidAnnotation(reason)) => {
                        warn!(page, stroke = stroke.id, %reason, "skipping unwritable stroke");
                        report.skipped_strokes.push(stroke.id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        info!(
            written = report.written,
            removed = report.removed,
            skipped_pages = report.skipped_pages.len(),
            skipped_strokes = report.skipped_strokes.len(),
            "saved inking to PDF"
        );

        Ok(report)
    }

    /// Read ink annotations into the store as editable strokes
    ///
    /// Every path of an annotation's InkList becomes its own stroke.
    /// Translucent annotations come back as highlighter strokes. Annotations
    /// written from a stroke the store still holds are skipped.
    ///
    /// # Returns
    /// Number of strokes added to the store
    pub fn import_ink(&mut self, store: &mut InkStore, options: &ImportOptions) -> Result<usize> {
        let mut imported = 0;

        for page in 1..=self.page_count() {
            let mapping = self.page_mapping(page)?;
            let wanted = |ink: &InkAnnotation| !options.only_own || ink.is_own();

            for (_, ink) in self.document.ink_annotations(page)? {
                if !wanted(&ink) {
                    continue;
                }
                if let Some(id) = stroke_id(&ink) {
                    if store.find(id).is_some() {
                        debug!(page, stroke = id, "stroke already in store");
                        continue;
                    }
                }

                let style = StrokeStyle {
                    color: ink.color.into(),
                    width: mapping.length_to_view(ink.width),
                    opacity: ink.opacity.clamp(0.0, 1.0),
                    kind: if ink.opacity < 1.0 {
                        PenKind::Highlighter
                    } else {
                        PenKind::Pen
                    },
                };

                for path in &ink.ink_list {
                    if path.is_empty() {
                        continue;
                    }
                    let points = path
                        .iter()
                        .map(|p| InkPoint::from(mapping.to_view(*p)))
                        .collect();
                    store.add_stroke(page, points, style)?;
                    imported += 1;
                }
            }

            if options.remove_from_pdf {
                self.document.remove_annotations(page, wanted)?;
            }
        }

        info!(imported, "imported ink annotations");
        Ok(imported)
    }

    /// Save the PDF to a file
    pub fn write<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        Ok(self.document.save(path)?)
    }

    /// Save the PDF to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.document.to_bytes()?)
    }
}

/// Id of the stroke an annotation was written from, parsed from `/NM`
fn stroke_id(ink: &InkAnnotation) -> Option<u64> {
    ink.name
        .as_deref()?
        .strip_prefix(ANNOTATION_NAME_PREFIX)?
        .parse()
        .ok()
}
