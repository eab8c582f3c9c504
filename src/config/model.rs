use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::update::FieldUpdate;
use crate::foundation::error::{PostError, PostResult};
use crate::presets::tables::{AspectRatio, DEFAULT_FONTS, STOCK_BACKGROUNDS};

/// Reference to binary image content.
///
/// One of: a `data:` URL (ingested bytes), an `http(s)://` URL, or a path relative to the asset
/// root. The string is opaque to the document; [`crate::PreparedAssetStore`] resolves it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

/// How an [`ImageRef`] is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSourceKind {
    /// Inline `data:<mime>;base64,<payload>`.
    DataUrl,
    /// Fetched over HTTP(S).
    Remote,
    /// Read from the asset root.
    Local,
}

impl ImageRef {
    /// Wrap a URL, path, or data URI.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The reference as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// How the reference is resolved.
    pub fn kind(&self) -> ImageSourceKind {
        let s = self.0.trim_start();
        if s.starts_with("data:") {
            ImageSourceKind::DataUrl
        } else if s.starts_with("http://") || s.starts_with("https://") {
            ImageSourceKind::Remote
        } else {
            ImageSourceKind::Local
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Data URLs can be megabytes; keep logs readable.
        if self.kind() == ImageSourceKind::DataUrl && self.0.len() > 48 {
            let head = self.0.get(..32).unwrap_or("data:");
            write!(f, "{head}...({} bytes)", self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Gradient stops of the theme. Always replaced as a pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeStops {
    /// Gradient start token, e.g. `from-blue-700`.
    #[serde(rename = "themeColorFrom")]
    pub from: String,
    /// Gradient end token, e.g. `to-purple-700`.
    #[serde(rename = "themeColorTo")]
    pub to: String,
}

impl ThemeStops {
    /// Pair two stop tokens.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The editable post document.
///
/// Pure data: no method here validates ranges. Editing goes through [`PostConfig::with`] so
/// every change replaces exactly one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConfig {
    /// Speaker name shown on the banner.
    pub name: String,
    /// Quote body, usually Urdu.
    pub quote: String,
    /// Footer phone number.
    pub phone_number: String,
    /// Footer website.
    pub website: String,

    /// CSS `font-family` list for the quote.
    pub font_family: String,
    /// Quote size in logical pixels.
    pub font_size: u32,
    /// Bold quote text.
    pub is_bold: bool,
    /// Heavy quote shadow instead of the subtle one.
    pub text_shadow: bool,

    /// Subject image.
    pub image_url: Option<ImageRef>,
    /// Subject opacity in percent.
    pub image_opacity: u8,
    /// Subject scale in percent.
    pub image_scale: u16,

    /// Image behind the quote panel.
    pub text_background_image_url: Option<ImageRef>,
    /// Quote panel image opacity in percent.
    pub text_background_opacity: u8,

    /// Full-canvas background image.
    pub background_image_url: Option<ImageRef>,
    /// Background opacity in percent.
    pub background_opacity: u8,
    /// Background scale in percent.
    pub background_scale: u16,
    /// Background blur in pixels.
    pub background_blur: u8,

    /// Image replacing the footer bar.
    pub footer_image_url: Option<ImageRef>,

    /// Gradient stops.
    #[serde(flatten)]
    pub theme: ThemeStops,

    /// Canvas proportion.
    pub aspect_ratio: AspectRatio,
    /// Skip the canvas fill.
    pub transparent_background: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self::new_session()
    }
}

impl PostConfig {
    /// A fresh starting document. Each call builds a new value.
    pub fn new_session() -> Self {
        Self {
            name: "Asif Sher Sial".to_owned(),
            quote: "اے آئی انسان کی جگہ نہیں لے گی، بلکہ وہ انسان جگہ لے لے گا جو اے آئی جانتا ہوگا۔"
                .to_owned(),
            phone_number: "0340-025-4444".to_owned(),
            website: "www.brighteaglets.edu.pk".to_owned(),

            font_family: DEFAULT_FONTS[0].1.to_owned(),
            font_size: 32,
            is_bold: false,
            text_shadow: false,

            image_url: Some(ImageRef::new("https://picsum.photos/800/800")),
            image_opacity: 100,
            image_scale: 100,

            text_background_image_url: None,
            text_background_opacity: 15,

            background_image_url: Some(ImageRef::new(STOCK_BACKGROUNDS[0])),
            background_opacity: 20,
            background_scale: 100,
            background_blur: 4,

            footer_image_url: None,

            theme: ThemeStops::new("from-blue-700", "to-purple-700"),
            aspect_ratio: AspectRatio::Square,
            transparent_background: false,
        }
    }

    /// Return a new document with exactly the field named by `update` replaced.
    pub fn with(mut self, update: FieldUpdate) -> Self {
        match update {
            FieldUpdate::Name(v) => self.name = v,
            FieldUpdate::Quote(v) => self.quote = v,
            FieldUpdate::PhoneNumber(v) => self.phone_number = v,
            FieldUpdate::Website(v) => self.website = v,
            FieldUpdate::FontFamily(v) => self.font_family = v,
            FieldUpdate::FontSize(v) => self.font_size = v,
            FieldUpdate::IsBold(v) => self.is_bold = v,
            FieldUpdate::TextShadow(v) => self.text_shadow = v,
            FieldUpdate::ImageUrl(v) => self.image_url = v,
            FieldUpdate::ImageOpacity(v) => self.image_opacity = v,
            FieldUpdate::ImageScale(v) => self.image_scale = v,
            FieldUpdate::TextBackgroundImageUrl(v) => self.text_background_image_url = v,
            FieldUpdate::TextBackgroundOpacity(v) => self.text_background_opacity = v,
            FieldUpdate::BackgroundImageUrl(v) => self.background_image_url = v,
            FieldUpdate::BackgroundOpacity(v) => self.background_opacity = v,
            FieldUpdate::BackgroundScale(v) => self.background_scale = v,
            FieldUpdate::BackgroundBlur(v) => self.background_blur = v,
            FieldUpdate::FooterImageUrl(v) => self.footer_image_url = v,
            FieldUpdate::Theme(v) => self.theme = v,
            FieldUpdate::AspectRatio(v) => self.aspect_ratio = v,
            FieldUpdate::TransparentBackground(v) => self.transparent_background = v,
        }
        self
    }

    /// Parse a document from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> PostResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PostError::validation(format!("parse post document JSON: {e}")))
    }

    /// Parse a document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PostResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PostError::validation(format!("open post document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Write the document as pretty JSON.
    pub fn to_writer_pretty<W: Write>(&self, w: W) -> PostResult<()> {
        serde_json::to_writer_pretty(w, self)
            .map_err(|e| PostError::validation(format!("serialize post document: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
