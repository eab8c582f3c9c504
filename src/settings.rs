use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::compose::layers::ComposeOpts;
use crate::export::orchestrator::ExportOpts;
use crate::foundation::error::{PostError, PostResult};
use crate::generate::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Process-level settings for the studio binary.
///
/// Every field has a default, so an empty JSON object (or no file at all) is valid.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioSettings {
    /// Model name passed to the text-generation endpoint.
    pub gemini_model: String,
    /// REST endpoint root.
    pub gemini_endpoint: String,
    /// API key. Read from the environment when not in the file; never written out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Logical canvas width in px.
    pub logical_width: f64,
    /// Device pixels per logical pixel for exports.
    pub pixel_ratio: f64,
    /// Font wait bound in ms; `0` waits forever.
    pub font_ready_timeout_ms: u64,
    /// Directories scanned for font files, relative to the working directory.
    pub font_dirs: Vec<PathBuf>,
    /// Also load system fonts.
    pub system_fonts: bool,
    /// Where exports are written.
    pub output_dir: PathBuf,
    /// Base directory for relative image paths in documents.
    pub asset_root: PathBuf,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            gemini_model: DEFAULT_MODEL.to_owned(),
            gemini_endpoint: DEFAULT_ENDPOINT.to_owned(),
            api_key: None,
            logical_width: 768.0,
            pixel_ratio: 2.0,
            font_ready_timeout_ms: 10_000,
            font_dirs: vec![PathBuf::from("fonts")],
            system_fonts: true,
            output_dir: PathBuf::from("."),
            asset_root: PathBuf::from("."),
        }
    }
}

impl std::fmt::Debug for StudioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioSettings")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_endpoint", &self.gemini_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("logical_width", &self.logical_width)
            .field("pixel_ratio", &self.pixel_ratio)
            .field("font_ready_timeout_ms", &self.font_ready_timeout_ms)
            .field("font_dirs", &self.font_dirs)
            .field("system_fonts", &self.system_fonts)
            .field("output_dir", &self.output_dir)
            .field("asset_root", &self.asset_root)
            .finish()
    }
}

impl StudioSettings {
    /// Defaults, overlaid with `path` when given, then with the process environment.
    pub fn load(path: Option<&Path>) -> PostResult<Self> {
        let settings = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        let settings = settings.with_env(|name| std::env::var(name).ok());
        settings.validate()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Parse a settings file.
    pub fn from_path(path: &Path) -> PostResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            PostError::validation(format!("settings '{}': {e}", path.display()))
        })
    }

    /// Fill `api_key` from the first non-empty variable in [`API_KEY_VARS`] unless already set.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            self.api_key = API_KEY_VARS
                .iter()
                .filter_map(|name| lookup(name))
                .find(|v| !v.is_empty());
        }
        self
    }

    /// Reject settings the editor or exporter cannot run with.
    pub fn validate(&self) -> PostResult<()> {
        if !(self.logical_width.is_finite() && self.logical_width > 0.0) {
            return Err(PostError::validation("logical_width must be > 0"));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(PostError::validation("pixel_ratio must be > 0"));
        }
        Ok(())
    }

    /// Font wait for exports; `None` when the configured value is zero.
    pub fn font_ready_timeout(&self) -> Option<Duration> {
        (self.font_ready_timeout_ms > 0).then(|| Duration::from_millis(self.font_ready_timeout_ms))
    }

    /// Export options derived from these settings.
    pub fn export_opts(&self) -> ExportOpts {
        ExportOpts {
            pixel_ratio: self.pixel_ratio,
            font_ready_timeout: self.font_ready_timeout(),
        }
    }

    /// Compose options derived from these settings.
    pub fn compose_opts(&self) -> ComposeOpts {
        ComposeOpts {
            logical_width: self.logical_width,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/settings.rs"]
mod tests;
