//! Urdu Post Studio composes social-media post images from layered elements and exports them
//! as PNG.
//!
//! The flow is document-oriented:
//!
//! - Edit a [`PostConfig`] through an [`EditorController`] (field updates, image and font
//!   ingestion, generated quotes)
//! - [`compose`] the document into a [`LayerStack`]
//! - Rasterize the stack with a [`CpuRasterizer`] and deliver it through an [`Exporter`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod assets;
pub(crate) mod compose;
pub(crate) mod config;
pub(crate) mod editor;
pub(crate) mod export;
pub(crate) mod foundation;
pub(crate) mod generate;
pub(crate) mod presets;
pub(crate) mod render;
pub(crate) mod settings;

pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{PostError, PostResult};

pub use crate::config::bounds::{BLUR, Bounds, FONT_SIZE, OPACITY, SCALE, clamp_update};
pub use crate::config::model::{ImageRef, ImageSourceKind, PostConfig, ThemeStops};
pub use crate::config::update::FieldUpdate;

pub use crate::presets::palette::{SLATE_50, SLATE_200, SLATE_800, Stop, resolve_token};
pub use crate::presets::tables::{
    ASPECT_RATIOS, AspectPreset, AspectRatio, COLOR_THEMES, ColorTheme, DEFAULT_FONTS,
    STOCK_BACKGROUNDS, aspect_preset, theme_by_index, theme_by_label,
};

pub use crate::assets::decode::{decode_image, parse_data_url, sniff_mime, to_data_url};
pub use crate::assets::fontbook::{FontBook, ResolvedFont};
pub use crate::assets::fonts::{
    FontEntry, FontGate, FontGateHandle, FontReadiness, FontRegistry, FontsLoaded, InstalledFace,
};
pub use crate::assets::store::{
    AssetId, ImageSizes, PreparedAssetStore, PreparedImage, referenced_images,
};

pub use crate::compose::layers::{
    ComposeOpts, FillShape, GlyphKind, Layer, LayerKind, LayerRole, LayerStack, SOCIAL_GLYPHS,
    Shadow, TextAlign, TextDirection, TextSpec, compose,
};
pub use crate::compose::layout::{LayoutDirection, MD_BREAKPOINT, Regions, THEME_FOOTER_HEIGHT};

pub use crate::render::backend::{FrameRGBA, RasterOpts, Rasterizer, encode_png};
pub use crate::render::cpu::CpuRasterizer;

pub use crate::editor::controller::{
    EditorController, ImageSlot, QuoteApplied, QuoteRequest, QuoteResponse, font_label,
    is_font_file_name,
};
pub use crate::generate::gemini::{GENERATION_FAILED, GeminiGenerator, QuoteGenerator, quote_prompt};

pub use crate::export::orchestrator::{
    ExportOpts, ExportOutcome, ExportState, ExportSurface, Exporter,
};
pub use crate::export::sink::{DirectorySink, DownloadSink, InMemorySink, export_file_name};

pub use crate::settings::StudioSettings;
