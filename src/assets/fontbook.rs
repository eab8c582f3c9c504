use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use usvg::fontdb;

use crate::assets::fonts::InstalledFace;

/// Font bytes picked for a text layer.
#[derive(Clone)]
pub struct ResolvedFont {
    /// Family name as stored in the font.
    pub family: String,
    /// Font file bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Parsed entry of a CSS `font-family` list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FamilyName {
    /// A quoted or bare family name.
    Named(String),
    /// `serif`
    Serif,
    /// `sans-serif`
    SansSerif,
    /// `monospace`
    Monospace,
    /// `cursive`
    Cursive,
    /// `fantasy`
    Fantasy,
}

/// Split a CSS `font-family` value into its entries.
pub fn parse_family_list(css: &str) -> Vec<FamilyName> {
    css.split(',')
        .filter_map(|part| {
            let raw = part.trim();
            let unquoted = raw.trim_matches(|c| c == '\'' || c == '"').trim();
            if unquoted.is_empty() {
                return None;
            }
            // Generic keywords are only generic when unquoted.
            if raw.len() == unquoted.len() {
                match unquoted.to_ascii_lowercase().as_str() {
                    "serif" => return Some(FamilyName::Serif),
                    "sans-serif" | "system-ui" => return Some(FamilyName::SansSerif),
                    "monospace" => return Some(FamilyName::Monospace),
                    "cursive" => return Some(FamilyName::Cursive),
                    "fantasy" => return Some(FamilyName::Fantasy),
                    _ => {}
                }
            }
            Some(FamilyName::Named(unquoted.to_owned()))
        })
        .collect()
}

/// Searchable set of font faces backing text rendering.
///
/// Fed from font directories, optionally the system fonts, and runtime-installed faces.
pub struct FontBook {
    db: fontdb::Database,
    bytes_cache: HashMap<fontdb::ID, Arc<Vec<u8>>>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .finish()
    }
}

impl FontBook {
    /// An empty book.
    pub fn new() -> Self {
        Self {
            db: fontdb::Database::new(),
            bytes_cache: HashMap::new(),
        }
    }

    /// Build a book from font directories, optionally adding the system fonts.
    #[tracing::instrument(skip(dirs))]
    pub fn load(dirs: &[PathBuf], system_fonts: bool) -> Self {
        let mut book = Self::new();
        for dir in dirs {
            book.load_dir(dir);
        }
        if system_fonts {
            book.db.load_system_fonts();
        }
        tracing::debug!(faces = book.db.len(), "font book loaded");
        book
    }

    /// Load every `ttf`/`otf`/`ttc` file directly inside `dir`. Missing directories are ignored.
    pub fn load_dir(&mut self, dir: &Path) {
        let Ok(rd) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in rd.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if ext != "ttf" && ext != "otf" && ext != "ttc" {
                continue;
            }
            if let Err(e) = self.db.load_font_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "font file skipped");
            }
        }
    }

    /// Add raw font bytes.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) {
        self.db.load_font_data(bytes);
    }

    /// Number of faces known.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Whether the book has no faces.
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Pick font bytes for a CSS family list at the given weight.
    ///
    /// An installed face wins outright. Otherwise the list is matched in order, and a
    /// book that matches nothing yields `None`.
    pub fn resolve(
        &mut self,
        css_family: &str,
        weight: u16,
        installed: Option<&InstalledFace>,
    ) -> Option<ResolvedFont> {
        if let Some(face) = installed {
            return Some(ResolvedFont {
                family: face.family.clone(),
                bytes: face.bytes.clone(),
                index: 0,
            });
        }

        let parsed = parse_family_list(css_family);
        let families: Vec<fontdb::Family<'_>> = parsed
            .iter()
            .map(|f| match f {
                FamilyName::Named(s) => fontdb::Family::Name(s.as_str()),
                FamilyName::Serif => fontdb::Family::Serif,
                FamilyName::SansSerif => fontdb::Family::SansSerif,
                FamilyName::Monospace => fontdb::Family::Monospace,
                FamilyName::Cursive => fontdb::Family::Cursive,
                FamilyName::Fantasy => fontdb::Family::Fantasy,
            })
            .collect();
        if families.is_empty() {
            return None;
        }

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let id = self.db.query(&query)?;
        let family = self
            .db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))?;
        let index = self.db.face(id).map(|f| f.index).unwrap_or(0);

        let bytes = match self.bytes_cache.get(&id) {
            Some(b) => b.clone(),
            None => {
                let b = Arc::new(self.db.with_face_data(id, |data, _| data.to_vec())?);
                self.bytes_cache.insert(id, b.clone());
                b
            }
        };

        Some(ResolvedFont {
            family,
            bytes,
            index,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fontbook.rs"]
mod tests;
