use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::assets::fonts::FontReadiness;
use crate::assets::store::PreparedAssetStore;
use crate::compose::layers::LayerStack;
use crate::export::sink::DownloadSink;
use crate::foundation::error::{PostError, PostResult};
use crate::render::backend::{RasterOpts, Rasterizer, encode_png};

/// Where an export currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    /// No export has run.
    Idle,
    /// Waiting for fonts to load.
    WaitingForFonts,
    /// Drawing the stack.
    Rasterizing,
    /// The last export was delivered.
    Done,
    /// The last export failed.
    Failed,
}

/// Export settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOpts {
    /// Device pixels per logical pixel.
    pub pixel_ratio: f64,
    /// Upper bound on the font wait; `None` waits forever.
    pub font_ready_timeout: Option<Duration>,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            font_ready_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// What gets exported: a composed stack and the images it references.
#[derive(Clone, Debug)]
pub struct ExportSurface {
    /// Layers to draw.
    pub stack: LayerStack,
    /// Decoded images the layers reference.
    pub assets: PreparedAssetStore,
}

/// A delivered export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Delivered file name.
    pub file_name: String,
    /// Where the sink put the file.
    pub path: PathBuf,
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
    /// Encoded PNG size in bytes.
    pub png_len: usize,
}

/// Runs exports and publishes their progress.
#[derive(Debug)]
pub struct Exporter {
    opts: ExportOpts,
    state: watch::Sender<ExportState>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOpts::default())
    }
}

impl Exporter {
    /// Exporter starting in [`ExportState::Idle`].
    pub fn new(opts: ExportOpts) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self { opts, state }
    }

    /// Options this exporter runs with.
    pub fn opts(&self) -> ExportOpts {
        self.opts
    }

    /// Current state.
    pub fn state(&self) -> ExportState {
        *self.state.borrow()
    }

    /// Receiver that sees every later state change.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    fn set(&self, state: ExportState) {
        tracing::debug!(?state, "export state");
        self.state.send_replace(state);
    }

    /// Wait for fonts, rasterize, encode and deliver one PNG.
    ///
    /// Without a surface nothing happens and `Ok(None)` is returned. On failure the state passes
    /// through `Failed` back to `Idle` and the error comes back as [`PostError::Export`].
    #[tracing::instrument(skip_all, fields(pixel_ratio = self.opts.pixel_ratio))]
    pub async fn export(
        &self,
        surface: Option<&ExportSurface>,
        fonts: &dyn FontReadiness,
        rasterizer: &mut dyn Rasterizer,
        sink: &mut dyn DownloadSink,
    ) -> PostResult<Option<ExportOutcome>> {
        let Some(surface) = surface else {
            tracing::debug!("nothing to export");
            return Ok(None);
        };

        self.set(ExportState::WaitingForFonts);
        match self.opts.font_ready_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, fonts.ready()).await.is_err() {
                    tracing::warn!(?limit, "fonts not ready in time; exporting anyway");
                }
            }
            None => fonts.ready().await,
        }

        self.set(ExportState::Rasterizing);
        match self.rasterize_and_deliver(surface, rasterizer, sink) {
            Ok(outcome) => {
                self.set(ExportState::Done);
                Ok(Some(outcome))
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.set(ExportState::Failed);
                self.set(ExportState::Idle);
                Err(match e {
                    PostError::Export(_) => e,
                    other => PostError::export(other.to_string()),
                })
            }
        }
    }

    fn rasterize_and_deliver(
        &self,
        surface: &ExportSurface,
        rasterizer: &mut dyn Rasterizer,
        sink: &mut dyn DownloadSink,
    ) -> PostResult<ExportOutcome> {
        let frame = rasterizer.rasterize(
            &surface.stack,
            &surface.assets,
            RasterOpts {
                pixel_ratio: self.opts.pixel_ratio,
                cache_bust: true,
            },
        )?;
        let png = encode_png(&frame)?;
        let file_name = sink.next_file_name();
        let path = sink.deliver(&file_name, &png)?;
        Ok(ExportOutcome {
            file_name,
            path,
            width: frame.width,
            height: frame.height,
            png_len: png.len(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/orchestrator.rs"]
mod tests;
