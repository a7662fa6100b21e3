//! Per-document viewer state and recently opened files

use crate::{write_atomic, AnnotatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STATE_VERSION: u32 = 1;

/// Most documents remembered before the stalest is dropped
pub const MAX_REMEMBERED_DOCUMENTS: usize = 200;

/// Default length of the recent files list
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Where the reader left a document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    /// Current page (1-indexed)
    pub page: usize,
    pub zoom: f64,
    /// Vertical scroll offset in layout units
    #[serde(default)]
    pub scroll_offset: f64,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl ViewerState {
    pub fn new(page: usize, zoom: f64, scroll_offset: f64) -> Self {
        Self {
            page: page.max(1),
            zoom,
            scroll_offset,
            updated: Utc::now(),
        }
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(1, 1.0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub path: PathBuf,
    pub opened: DateTime<Utc>,
}

/// Most-recently-opened list, newest first, without duplicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentFiles {
    entries: VecDeque<RecentEntry>,
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_RECENT_CAPACITY
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_CAPACITY)
    }
}

impl RecentFiles {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Move `path` to the front, dropping the oldest entry when full
    pub fn touch(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.entries.retain(|e| e.path != path);
        self.entries.push_front(RecentEntry {
            path,
            opened: Utc::now(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    documents: BTreeMap<PathBuf, ViewerState>,
    #[serde(default)]
    recent: RecentFiles,
}

/// Viewer state of every opened document, persisted as JSON
///
/// Documents are keyed by their canonical path so the same file opened
/// through different relative paths shares one entry.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    file: StateFile,
}

impl StateStore {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: StateFile {
                version: STATE_VERSION,
                ..Default::default()
            },
        }
    }

    /// Default location: `<data dir>/inkpdf/state.json`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".inkpdf"))
            .join("inkpdf")
            .join("state.json")
    }

    /// Load the store at `path`; a missing file yields an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut store = Self::in_memory();
        store.path = Some(path.to_path_buf());

        if !path.exists() {
            debug!(path = %path.display(), "no viewer state yet");
            return Ok(store);
        }

        let file: StateFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if file.version > STATE_VERSION {
            return Err(AnnotatorError::UnsupportedVersion(file.version));
        }
        store.file = file;
        store.file.version = STATE_VERSION;

        debug!(
            path = %path.display(),
            documents = store.file.documents.len(),
            "loaded viewer state"
        );
        Ok(store)
    }

    /// Like [`StateStore::open`], but a corrupt file starts over empty
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable viewer state");
                let mut store = Self::in_memory();
                store.path = Some(path.to_path_buf());
                store
            }
        }
    }

    /// Saved state for a document
    pub fn get(&self, document: &Path) -> Option<ViewerState> {
        self.file.documents.get(&canonical(document)).copied()
    }

    /// Remember where the reader is in a document
    ///
    /// Also moves the document to the front of the recent files list.
    pub fn record(&mut self, document: &Path, state: ViewerState) {
        let key = canonical(document);
        let state = ViewerState {
            updated: Utc::now(),
            ..state
        };

        self.file.documents.insert(key.clone(), state);
        self.file.recent.touch(key);

        while self.file.documents.len() > MAX_REMEMBERED_DOCUMENTS {
            let stalest = self
                .file
                .documents
                .iter()
                .min_by_key(|(_, s)| s.updated)
                .map(|(path, _)| path.clone());
            match stalest {
                Some(path) => {
                    self.file.documents.remove(&path);
                }
                None => break,
            }
        }
    }

    /// Drop everything remembered about a document
    pub fn forget(&mut self, document: &Path) -> bool {
        let key = canonical(document);
        let had_state = self.file.documents.remove(&key).is_some();
        let was_recent = self.file.recent.remove(&key);
        had_state || was_recent
    }

    /// Forget documents that no longer exist on disk
    ///
    /// # Returns
    /// Number of documents forgotten
    pub fn prune_missing(&mut self) -> usize {
        let missing: Vec<PathBuf> = self
            .file
            .documents
            .keys()
            .chain(self.file.recent.iter().map(|e| &e.path))
            .filter(|path| !path.exists())
            .cloned()
            .collect();

        let mut forgotten = 0;
        for path in &missing {
            if self.forget(path) {
                forgotten += 1;
            }
        }
        if forgotten > 0 {
            info!(forgotten, "pruned missing documents from viewer state");
        }
        forgotten
    }

    pub fn recent(&self) -> &RecentFiles {
        &self.file.recent
    }

    pub fn document_count(&self) -> usize {
        self.file.documents.len()
    }

    /// Write the store back to the file it was opened from
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.file)?;
        write_atomic(path, json.as_bytes())?;
        debug!(path = %path.display(), "saved viewer state");
        Ok(())
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
