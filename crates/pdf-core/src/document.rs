//! PDF Document wrapper

use crate::annotation::{appearance_operators, deflate, number, parse_rect, rect_object};
use crate::{InkAnnotation, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use page_geometry::{PageGeometry, Rect, Rotation};
use std::path::Path;
use tracing::{debug, info, warn};

/// Maximum depth followed when resolving inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::from_rgb(r, g, b))
    }

    /// Color as 0-255 components
    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
        ]
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Red color
    pub fn red() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }

    /// Blue color
    pub fn blue() -> Self {
        Self::rgb(0.0, 0.0, 1.0)
    }

    /// Highlighter yellow
    pub fn yellow() -> Self {
        Self::rgb(1.0, 1.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF Document wrapper providing page geometry and ink annotation access
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
}

impl PdfDocument {
    /// Open a PDF document from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the PDF file
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("document.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        info!(path = %path.display(), pages = inner.get_pages().len(), "opened PDF");

        Ok(Self { inner })
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        debug!(bytes = data.len(), pages = inner.get_pages().len(), "loaded PDF from memory");

        Ok(Self { inner })
    }

    /// Wrap an existing lopdf document
    pub fn from_document(inner: Document) -> Self {
        Self { inner }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        info!(path = %path.display(), "saved PDF");
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Get all page object IDs in order
    pub fn get_page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    /// Effective geometry of a page
    ///
    /// Resolves MediaBox, CropBox and Rotate through the page tree, since
    /// all three are inheritable from ancestor `Pages` nodes.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn page_geometry(&self, page: usize) -> Result<PageGeometry> {
        let page_id = self.page_id(page)?;

        let media_box = match self.inherited_attribute(page_id, b"MediaBox")? {
            Some(obj) => parse_rect(obj, &|o| self.resolve(o))?,
            None => {
                warn!(page, "page has no MediaBox, assuming US Letter");
                Rect::default()
            }
        };

        let crop_box = match self.inherited_attribute(page_id, b"CropBox")? {
            Some(obj) => match parse_rect(obj, &|o| self.resolve(o)) {
                Ok(rect) => Some(rect),
                Err(e) => {
                    warn!(page, error = %e, "ignoring malformed CropBox");
                    None
                }
            },
            None => None,
        };

        let rotation = match self.inherited_attribute(page_id, b"Rotate")? {
            Some(obj) => {
                let degrees = obj.as_i64().ok().or_else(|| number(obj).map(|v| v as i64));
                match degrees.map(Rotation::from_degrees) {
                    Some(Ok(rotation)) => rotation,
                    _ => {
                        warn!(page, "ignoring invalid Rotate entry");
                        Rotation::Deg0
                    }
                }
            }
            None => Rotation::Deg0,
        };

        Ok(PageGeometry::new(media_box, crop_box, rotation))
    }

    /// Geometry of every page in document order
    pub fn page_geometries(&self) -> Result<Vec<PageGeometry>> {
        (1..=self.page_count())
            .map(|page| self.page_geometry(page))
            .collect()
    }

    /// Add an ink annotation to a page
    ///
    /// Writes the annotation dictionary together with a normal appearance
    /// stream and appends it to the page's `/Annots` array.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `ink` - Annotation in PDF user space
    ///
    /// # Returns
    /// Object ID of the new annotation
    pub fn add_ink_annotation(&mut self, page: usize, ink: &InkAnnotation) -> Result<ObjectId> {
        ink.validate()?;
        let page_id = self.page_id(page)?;

        let rect = match ink.rect.or_else(|| ink.bounding_rect()) {
            Some(rect) => rect,
            None => {
                return Err(PdfError::InvalidAnnotation(
                    "ink annotation has no points".to_string(),
                ))
            }
        };

        let appearance_id = self.add_appearance_stream(ink, rect)?;

        let mut dict = ink.to_dictionary(rect);
        dict.set("P", Object::Reference(page_id));

        let mut ap = Dictionary::new();
        ap.set("N", Object::Reference(appearance_id));
        dict.set("AP", Object::Dictionary(ap));

        let annot_id = self.inner.add_object(Object::Dictionary(dict));
        self.append_annotation(page_id, annot_id)?;

        debug!(
            page,
            strokes = ink.ink_list.len(),
            points = ink.point_count(),
            "added ink annotation"
        );

        Ok(annot_id)
    }

    /// Read every ink annotation on a page
    ///
    /// Malformed annotations are skipped with a warning.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn ink_annotations(&self, page: usize) -> Result<Vec<(ObjectId, InkAnnotation)>> {
        let page_id = self.page_id(page)?;
        let mut result = Vec::new();

        for annot_id in self.annotation_ids(page_id)? {
            let dict = match self.inner.get_object(annot_id).and_then(Object::as_dict) {
                Ok(dict) => dict,
                Err(e) => {
                    warn!(page, ?annot_id, error = %e, "skipping unreadable annotation");
                    continue;
                }
            };

            match InkAnnotation::from_dictionary(dict, |o| self.resolve(o)) {
                Ok(Some(ink)) => result.push((annot_id, ink)),
                Ok(None) => {}
                Err(e) => warn!(page, ?annot_id, error = %e, "skipping malformed ink annotation"),
            }
        }

        Ok(result)
    }

    /// Remove ink annotations matching a predicate
    ///
    /// The annotation objects and their appearance streams are deleted from
    /// the document.
    ///
    /// # Returns
    /// Number of annotations removed
    pub fn remove_annotations<F>(&mut self, page: usize, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&InkAnnotation) -> bool,
    {
        let page_id = self.page_id(page)?;

        let doomed: Vec<ObjectId> = self
            .ink_annotations(page)?
            .into_iter()
            .filter(|(_, ink)| predicate(ink))
            .map(|(id, _)| id)
            .collect();

        if doomed.is_empty() {
            return Ok(0);
        }

        let keep = |obj: &Object| match obj {
            Object::Reference(id) => !doomed.contains(id),
            _ => true,
        };

        // /Annots may live directly in the page or as an indirect array
        let annots_ref = {
            let page_dict = self.inner.get_object(page_id)?.as_dict()?;
            match page_dict.get(b"Annots") {
                Ok(Object::Reference(id)) => Some(*id),
                _ => None,
            }
        };

        match annots_ref {
            Some(array_id) => {
                if let Object::Array(arr) = self.inner.get_object_mut(array_id)? {
                    arr.retain(keep);
                }
            }
            None => {
                let page_dict = self.inner.get_object_mut(page_id)?.as_dict_mut()?;
                if let Ok(Object::Array(arr)) = page_dict.get_mut(b"Annots") {
                    arr.retain(keep);
                }
            }
        }

        for id in &doomed {
            let appearance = self
                .inner
                .get_object(*id)
                .and_then(Object::as_dict)
                .ok()
                .and_then(|d| d.get(b"AP").ok())
                .and_then(|ap| ap.as_dict().ok())
                .and_then(|ap| ap.get(b"N").ok())
                .and_then(|n| n.as_reference().ok());

            if let Some(stream_id) = appearance {
                self.inner.objects.remove(&stream_id);
            }
            self.inner.objects.remove(id);
        }

        debug!(page, removed = doomed.len(), "removed ink annotations");
        Ok(doomed.len())
    }

    /// Object ID of a page (1-indexed)
    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Follow an indirect reference (chains included) to its object
    fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        let mut current = obj;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            match current {
                Object::Reference(id) => current = self.inner.get_object(*id)?,
                _ => return Ok(current),
            }
        }
        Err(PdfError::ParseError("Reference chain too deep".to_string()))
    }

    /// Look up a page attribute, following the Parent chain if needed
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<&Object>> {
        let mut current_id = page_id;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page node is not a dictionary".to_string()))?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(self.resolve(value)?));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => return Ok(None),
            }
        }

        warn!(?page_id, "page tree deeper than expected");
        Ok(None)
    }

    /// Object IDs listed in a page's `/Annots`
    fn annotation_ids(&self, page_id: ObjectId) -> Result<Vec<ObjectId>> {
        let page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

        let annots = match page_dict.get(b"Annots") {
            Ok(obj) => self.resolve(obj)?,
            Err(_) => return Ok(Vec::new()),
        };

        let arr = annots
            .as_array()
            .map_err(|_| PdfError::ParseError("Annots is not an array".to_string()))?;

        Ok(arr
            .iter()
            .filter_map(|obj| obj.as_reference().ok())
            .collect())
    }

    /// Append an annotation reference to a page's `/Annots`
    fn append_annotation(&mut self, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
        let annots_ref = {
            let page_dict = self.inner.get_object(page_id)?.as_dict()?;
            match page_dict.get(b"Annots") {
                Ok(Object::Reference(id)) => Some(*id),
                _ => None,
            }
        };

        if let Some(array_id) = annots_ref {
            if let Object::Array(arr) = self.inner.get_object_mut(array_id)? {
                arr.push(Object::Reference(annot_id));
                return Ok(());
            }
            warn!(?array_id, "Annots reference is not an array, replacing it");
        }

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;

        match page_dict.get_mut(b"Annots") {
            Ok(Object::Array(arr)) => arr.push(Object::Reference(annot_id)),
            _ => page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)])),
        }

        Ok(())
    }

    /// Create the form XObject used as the annotation's normal appearance
    fn add_appearance_stream(&mut self, ink: &InkAnnotation, bbox: Rect) -> Result<ObjectId> {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Form".to_vec()));
        dict.set("FormType", Object::Integer(1));
        dict.set("BBox", rect_object(&bbox));

        if ink.opacity < 1.0 {
            let alpha = Object::Real(ink.opacity.clamp(0.0, 1.0) as f32);
            let mut gs = Dictionary::new();
            gs.set("Type", Object::Name(b"ExtGState".to_vec()));
            gs.set("CA", alpha.clone());
            gs.set("ca", alpha);

            let mut ext_g_state = Dictionary::new();
            ext_g_state.set("GS0", Object::Dictionary(gs));

            let mut resources = Dictionary::new();
            resources.set("ExtGState", Object::Dictionary(ext_g_state));
            dict.set("Resources", Object::Dictionary(resources));
        }

        let content = deflate(&appearance_operators(ink))?;
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

        Ok(self.inner.add_object(Stream::new(dict, content)))
    }
}
