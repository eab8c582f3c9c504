use std::sync::Arc;

use super::woff;
use crate::foundation::error::{PostError, PostResult};
use crate::presets::tables::DEFAULT_FONTS;

/// Font bytes installed at runtime together with the family name from their name table.
#[derive(Clone, PartialEq, Eq)]
pub struct InstalledFace {
    /// Family name the font advertises (what shaping engines look it up by).
    pub family: String,
    /// Validated font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for InstalledFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledFace")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl InstalledFace {
    /// Validate `bytes` and read the primary family name.
    ///
    /// WOFF and WOFF2 containers are unwrapped first and the decoded sfnt is what gets stored.
    /// Validation goes through the same font collection the text renderer registers faces
    /// with, so a face accepted here is one the renderer can shape. Fails unless the data
    /// holds at least one face with a usable character map and a family name.
    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn from_bytes(bytes: Vec<u8>) -> PostResult<Self> {
        let sfnt = woff::to_sfnt(bytes)?;
        let mut collection = parley::fontique::Collection::new(parley::fontique::CollectionOptions {
            shared: false,
            system_fonts: false,
        });
        let registered =
            collection.register_fonts(parley::fontique::Blob::from(sfnt.clone()), None);
        let family = registered
            .first()
            .and_then(|(id, _)| collection.family_name(*id))
            .map(str::to_owned)
            .ok_or_else(|| PostError::font("no usable font face in data"))?;
        Ok(Self {
            family,
            bytes: Arc::new(sfnt),
        })
    }
}

/// One selectable font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontEntry {
    /// Display label.
    pub label: String,
    /// CSS-style family reference stored in the document (`'Amiri', serif`).
    pub family: String,
    /// Bytes for runtime-installed fonts; presets resolve through the font book instead.
    pub face: Option<InstalledFace>,
}

impl FontEntry {
    /// A preset entry without bytes.
    pub fn preset(label: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            family: family.into(),
            face: None,
        }
    }
}

/// Append-only list of selectable fonts.
///
/// Starts with the built-in presets; runtime installs are appended and never removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontRegistry {
    entries: Vec<FontEntry>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl FontRegistry {
    /// Registry holding only the built-in presets.
    pub fn with_presets() -> Self {
        Self {
            entries: DEFAULT_FONTS
                .iter()
                .map(|(label, family)| FontEntry::preset(*label, *family))
                .collect(),
        }
    }

    /// Append an entry. Duplicates are kept.
    pub fn append(&mut self, entry: FontEntry) {
        self.entries.push(entry);
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry used when a family is unknown.
    pub fn default_entry(&self) -> Option<&FontEntry> {
        self.entries.first()
    }

    /// Entry whose family matches `family`, or the default entry.
    ///
    /// With several matching entries the most recently appended wins.
    pub fn resolve(&self, family: &str) -> Option<&FontEntry> {
        let family = family.trim();
        self.entries
            .iter()
            .rev()
            .find(|e| e.family == family)
            .or_else(|| self.default_entry())
    }

    /// Runtime-installed faces, oldest first.
    pub fn installed_faces(&self) -> impl Iterator<Item = &InstalledFace> {
        self.entries.iter().filter_map(|e| e.face.as_ref())
    }
}

/// Signals that every registered font can be used for rasterization.
#[async_trait::async_trait]
pub trait FontReadiness: Send + Sync {
    /// Resolve once fonts are ready. May never resolve.
    async fn ready(&self);
}

/// Fonts that are ready as soon as they exist (loaded synchronously).
#[derive(Clone, Copy, Debug, Default)]
pub struct FontsLoaded;

#[async_trait::async_trait]
impl FontReadiness for FontsLoaded {
    async fn ready(&self) {}
}

/// Readiness flipped by a background font loader through [`FontGateHandle`].
#[derive(Clone, Debug)]
pub struct FontGate {
    rx: tokio::sync::watch::Receiver<bool>,
}

/// Writer side of a [`FontGate`].
#[derive(Debug)]
pub struct FontGateHandle {
    tx: tokio::sync::watch::Sender<bool>,
}

impl FontGate {
    /// A gate that stays closed until [`FontGateHandle::mark_ready`] is called.
    pub fn pending() -> (Self, FontGateHandle) {
        let (tx, rx) = tokio::sync::watch::channel(false);
        (Self { rx }, FontGateHandle { tx })
    }

    /// Whether the gate is already open.
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }
}

impl FontGateHandle {
    /// Open the gate for every current and future waiter.
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }
}

#[async_trait::async_trait]
impl FontReadiness for FontGate {
    async fn ready(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|ready| *ready).await.is_err();
        // A dropped handle leaves the gate closed for good.
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
