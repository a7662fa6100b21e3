//! Persistence of ink strokes
//!
//! Strokes are kept per page and saved as a JSON sidecar next to the PDF:
//!
//! ```json
//! {
//!   "version": 1,
//!   "source": "paper.pdf",
//!   "next_id": 3,
//!   "pages": { "1": [ { "id": 1, "points": [...], "style": {...} } ] }
//! }
//! ```

use crate::ink::{InkPoint, InkStroke, StrokeStyle};
use crate::{write_atomic, AnnotatorError, Result};
use page_geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current sidecar format version
pub const STORE_VERSION: u32 = 1;

/// Ink strokes of one document, keyed by 1-indexed page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InkStore {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    pages: BTreeMap<usize, Vec<InkStroke>>,

    // === Editing state (not serialized) ===
    #[serde(skip)]
    history: Vec<u64>,

    #[serde(skip)]
    dirty: bool,
}

fn first_id() -> u64 {
    1
}

impl Default for InkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InkStore {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            source: None,
            next_id: first_id(),
            pages: BTreeMap::new(),
            history: Vec::new(),
            dirty: false,
        }
    }

    /// Remember which document the strokes belong to
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Sidecar file used for a PDF: `<name>.pdf.ink.json`
    pub fn sidecar_path<P: AsRef<Path>>(pdf_path: P) -> PathBuf {
        let pdf_path = pdf_path.as_ref();
        let mut name = pdf_path.file_name().unwrap_or_default().to_os_string();
        name.push(".ink.json");
        pdf_path.with_file_name(name)
    }

    /// Add a stroke drawn on a page
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `points` - Sampled points in page-view space
    /// * `style` - Pen settings
    ///
    /// # Returns
    /// The new stroke's id
    pub fn add_stroke(
        &mut self,
        page: usize,
        points: Vec<InkPoint>,
        style: StrokeStyle,
    ) -> Result<u64> {
        if page == 0 {
            return Err(AnnotatorError::InvalidPage(page, self.pages.len()));
        }
        if points.is_empty() {
            return Err(AnnotatorError::EmptyStroke);
        }

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(AnnotatorError::IdsExhausted)?;

        self.pages
            .entry(page)
            .or_default()
            .push(InkStroke::new(id, points, style));
        self.history.push(id);
        self.dirty = true;

        Ok(id)
    }

    /// Strokes on a page, in drawing order
    pub fn strokes(&self, page: usize) -> &[InkStroke] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pages that carry at least one stroke, ascending
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages
            .iter()
            .filter(|(_, strokes)| !strokes.is_empty())
            .map(|(page, _)| *page)
    }

    /// Every non-empty page with its strokes
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[InkStroke])> {
        self.pages
            .iter()
            .filter(|(_, strokes)| !strokes.is_empty())
            .map(|(page, strokes)| (*page, strokes.as_slice()))
    }

    pub fn stroke_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stroke_count() == 0
    }

    /// Find a stroke and the page it is on
    pub fn find(&self, id: u64) -> Option<(usize, &InkStroke)> {
        self.pages.iter().find_map(|(page, strokes)| {
            strokes.iter().find(|s| s.id == id).map(|s| (*page, s))
        })
    }

    /// Remove a stroke by id
    pub fn remove_stroke(&mut self, id: u64) -> Option<InkStroke> {
        for strokes in self.pages.values_mut() {
            if let Some(index) = strokes.iter().position(|s| s.id == id) {
                self.history.retain(|h| *h != id);
                self.dirty = true;
                return Some(strokes.remove(index));
            }
        }
        None
    }

    /// Erase every stroke on `page` passing within `radius` of `point`
    ///
    /// # Returns
    /// Number of strokes erased
    pub fn erase_at(&mut self, page: usize, point: Point, radius: f64) -> usize {
        let Some(strokes) = self.pages.get_mut(&page) else {
            return 0;
        };

        let before = strokes.len();
        let mut erased = Vec::new();
        strokes.retain(|s| {
            let hit = s.hit_test(point, radius);
            if hit {
                erased.push(s.id);
            }
            !hit
        });

        if !erased.is_empty() {
            self.history.retain(|h| !erased.contains(h));
            self.dirty = true;
        }

        before - strokes.len()
    }

    /// Remove every stroke on a page
    pub fn clear_page(&mut self, page: usize) -> usize {
        let removed = self.pages.remove(&page).unwrap_or_default();
        if !removed.is_empty() {
            self.history.retain(|h| removed.iter().all(|s| s.id != *h));
            self.dirty = true;
        }
        removed.len()
    }

    /// Remove every stroke
    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.dirty = true;
        }
        self.pages.clear();
        self.history.clear();
    }

    /// Remove the most recently added stroke that still exists
    ///
    /// # Returns
    /// `false` when there is nothing left to undo
    pub fn undo(&mut self) -> bool {
        while let Some(id) = self.history.pop() {
            if self.remove_stroke(id).is_some() {
                return true;
            }
        }
        false
    }

    /// Unsaved changes exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON, rejecting unknown format versions
    pub fn from_json(json: &str) -> Result<Self> {
        let mut store: InkStore = serde_json::from_str(json)?;
        if store.version != STORE_VERSION {
            return Err(AnnotatorError::UnsupportedVersion(store.version));
        }

        // Never hand out an id that is already taken
        let max_id = store
            .pages
            .values()
            .flatten()
            .map(|s| s.id)
            .max()
            .unwrap_or(0);
        store.next_id = store.next_id.max(max_id.saturating_add(1));
        store.pages.retain(|page, strokes| *page > 0 && !strokes.is_empty());

        Ok(store)
    }

    /// Load strokes from a sidecar file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json(&json)?;
        debug!(path = %path.display(), strokes = store.stroke_count(), "loaded ink store");
        Ok(store)
    }

    /// Load strokes, or start empty when the file does not exist yet
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no ink store yet, starting empty");
            return Ok(Self::new());
        }
        Self::load(path)
    }

    /// Save strokes to a sidecar file and mark the store clean
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, self.to_json()?.as_bytes())?;
        self.dirty = false;
        info!(path = %path.display(), strokes = self.stroke_count(), "saved ink store");
        Ok(())
    }
}
