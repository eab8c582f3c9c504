use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::assets::decode::{decode_image, to_data_url};
use crate::assets::fonts::{FontEntry, FontRegistry, InstalledFace};
use crate::assets::store::ImageSizes;
use crate::compose::layers::{ComposeOpts, LayerStack, compose};
use crate::config::model::{ImageRef, PostConfig, ThemeStops};
use crate::config::update::FieldUpdate;
use crate::foundation::error::PostResult;
use crate::generate::gemini::QuoteGenerator;
use crate::presets::tables::{STOCK_BACKGROUNDS, theme_by_index};

/// Document fields that hold an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// The portrait (`imageUrl`).
    Subject,
    /// Watermark behind the quote (`textBackgroundImageUrl`).
    TextBackground,
    /// Full-canvas background (`backgroundImageUrl`).
    Background,
    /// Footer image replacing the theme footer (`footerImageUrl`).
    Footer,
}

impl ImageSlot {
    /// Update that sets this slot to `image`.
    pub fn update(self, image: Option<ImageRef>) -> FieldUpdate {
        match self {
            Self::Subject => FieldUpdate::ImageUrl(image),
            Self::TextBackground => FieldUpdate::TextBackgroundImageUrl(image),
            Self::Background => FieldUpdate::BackgroundImageUrl(image),
            Self::Footer => FieldUpdate::FooterImageUrl(image),
        }
    }

    /// Parse a CLI slot name (`subject`, `text-background`, `background`, `footer`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "subject" | "image" => Some(Self::Subject),
            "text-background" | "watermark" => Some(Self::TextBackground),
            "background" => Some(Self::Background),
            "footer" => Some(Self::Footer),
            _ => None,
        }
    }
}

/// Outcome of [`EditorController::apply_quote`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteApplied {
    /// The quote was replaced.
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
}

/// Keeps the in-flight counter raised while alive.
#[derive(Debug)]
struct GeneratingGuard(Arc<AtomicUsize>);

impl GeneratingGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for GeneratingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An issued quote request. Counts as in flight until run to completion or dropped.
#[derive(Debug)]
pub struct QuoteRequest {
    token: u64,
    topic: String,
    _guard: GeneratingGuard,
}

impl QuoteRequest {
    /// Monotonic request number.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Topic sent to the generator.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Ask `generator` for a quote.
    pub async fn run(self, generator: &dyn QuoteGenerator) -> QuoteResponse {
        let result = generator.generate(&self.topic).await;
        QuoteResponse {
            token: self.token,
            result,
        }
    }
}

/// Result of a finished [`QuoteRequest`].
#[derive(Debug)]
pub struct QuoteResponse {
    token: u64,
    result: PostResult<String>,
}

impl QuoteResponse {
    /// Request token the response answers.
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Owner of the document and the font registry; every edit goes through here.
#[derive(Debug)]
pub struct EditorController {
    config: PostConfig,
    fonts: FontRegistry,
    in_flight: Arc<AtomicUsize>,
    issued: u64,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new(PostConfig::new_session())
    }
}

impl EditorController {
    /// Controller over `config` with the preset fonts.
    pub fn new(config: PostConfig) -> Self {
        Self::with_fonts(config, FontRegistry::default())
    }

    /// Controller over an existing document and font registry.
    pub fn with_fonts(config: PostConfig, fonts: FontRegistry) -> Self {
        Self {
            config,
            fonts,
            in_flight: Arc::new(AtomicUsize::new(0)),
            issued: 0,
        }
    }

    /// Current document.
    pub fn config(&self) -> &PostConfig {
        &self.config
    }

    /// Runtime-installed fonts.
    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Compose the current document.
    pub fn layer_stack(&self, sizes: &dyn ImageSizes, opts: ComposeOpts) -> LayerStack {
        compose(&self.config, &self.fonts, sizes, opts)
    }

    /// Replace one field. Never fails.
    pub fn update_field(&mut self, update: FieldUpdate) {
        tracing::debug!(keys = ?update.keys(), "update field");
        let config = std::mem::take(&mut self.config);
        self.config = config.with(update);
    }

    /// Decode `bytes`, store them as a `data:` URL in `slot`, and return the reference.
    ///
    /// Undecodable bytes leave the document untouched.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn ingest_image(&mut self, slot: ImageSlot, bytes: &[u8]) -> PostResult<ImageRef> {
        let prepared = decode_image(bytes)?;
        let image = ImageRef::new(to_data_url(bytes)?);
        tracing::info!(
            width = prepared.width,
            height = prepared.height,
            "image ingested"
        );
        self.update_field(slot.update(Some(image.clone())));
        Ok(image)
    }

    /// Remove the image in `slot`.
    pub fn clear_image(&mut self, slot: ImageSlot) {
        self.update_field(slot.update(None));
    }

    /// Install font bytes under a label derived from `file_name` and select them.
    ///
    /// Returns `(family, label)`. Bytes without a usable face change nothing.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn ingest_font(&mut self, bytes: Vec<u8>, file_name: &str) -> PostResult<(String, String)> {
        let face = InstalledFace::from_bytes(bytes)?;
        let label = font_label(file_name);
        let family = format!("\"{label}\"");
        tracing::info!(%label, face_family = %face.family, "font installed");

        self.fonts.append(FontEntry {
            label: label.clone(),
            family: family.clone(),
            face: Some(face),
        });
        self.update_field(FieldUpdate::FontFamily(family.clone()));
        Ok((family, label))
    }

    /// Issue a new quote request; it supersedes every earlier one.
    pub fn quote_request(&mut self, topic: impl Into<String>) -> QuoteRequest {
        self.issued += 1;
        QuoteRequest {
            token: self.issued,
            topic: topic.into(),
            _guard: GeneratingGuard::new(&self.in_flight),
        }
    }

    /// Apply a finished request if it is the latest one issued.
    ///
    /// A failed latest request leaves the quote unchanged and returns its error.
    pub fn apply_quote(&mut self, response: QuoteResponse) -> PostResult<QuoteApplied> {
        if response.token != self.issued {
            tracing::debug!(
                token = response.token,
                latest = self.issued,
                "stale quote response dropped"
            );
            return Ok(QuoteApplied::Stale);
        }
        let quote = response.result?;
        self.update_field(FieldUpdate::Quote(quote));
        Ok(QuoteApplied::Applied)
    }

    /// Request, await and apply a quote in one call.
    #[tracing::instrument(skip(self, generator))]
    pub async fn generate_quote(
        &mut self,
        topic: &str,
        generator: &dyn QuoteGenerator,
    ) -> PostResult<QuoteApplied> {
        let request = self.quote_request(topic);
        let response = request.run(generator).await;
        self.apply_quote(response)
    }

    /// Whether any quote request is in flight.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Set a random stock background.
    pub fn pick_random_background(&mut self) -> Option<ImageRef> {
        self.pick_random_background_with(&mut rand::thread_rng())
    }

    /// Set a stock background chosen uniformly with `rng`.
    pub fn pick_random_background_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ImageRef> {
        let url = STOCK_BACKGROUNDS.choose(rng)?;
        let image = ImageRef::new(*url);
        self.update_field(FieldUpdate::BackgroundImageUrl(Some(image.clone())));
        Some(image)
    }

    /// Apply the preset theme at `index` (first theme when out of range).
    pub fn set_theme(&mut self, index: usize) {
        let theme = theme_by_index(index);
        self.update_field(FieldUpdate::Theme(ThemeStops::new(theme.from, theme.to)));
    }
}

/// Label for an uploaded font file: the name without its last extension.
pub fn font_label(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/') => {
            file_name[..dot].to_owned()
        }
        _ => file_name.to_owned(),
    }
}

/// Whether a file name passes the font picker filter.
pub fn is_font_file_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    [".ttf", ".otf", ".woff", ".woff2"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
#[path = "../../tests/unit/editor/controller.rs"]
mod tests;
