/// Convenience result type used across the studio.
pub type PostResult<T> = Result<T, PostError>;

/// Top-level error taxonomy.
///
/// Every variant carries a human-readable message; there are no structured error codes. None of
/// these are fatal: callers surface the message and keep editing.
#[derive(thiserror::Error, Debug)]
pub enum PostError {
    /// Invalid user-provided data (bad update key, malformed document, bad path).
    #[error("validation error: {0}")]
    Validation(String),

    /// Image bytes that cannot be decoded or fetched.
    #[error("asset error: {0}")]
    Asset(String),

    /// Font bytes that do not contain a usable face.
    #[error("font error: {0}")]
    Font(String),

    /// Failure reported by the text-generation collaborator.
    #[error("generation error: {0}")]
    Generation(String),

    /// Failure while rasterizing or delivering an export.
    #[error("export error: {0}")]
    Export(String),

    /// Rasterizer-internal failure.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PostError {
    /// Build a [`PostError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PostError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`PostError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`PostError::Generation`] value.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Build a [`PostError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`PostError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
