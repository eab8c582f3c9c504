use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{PostError, PostResult};

/// Receives a finished export, the way a browser receives a download.
pub trait DownloadSink: Send {
    /// File name for the next export. Names never repeat within one sink.
    fn next_file_name(&mut self) -> String;

    /// Store `bytes` under `file_name`; returns where they went.
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> PostResult<PathBuf>;
}

/// `urdu-post-<unix-ms>.png`.
pub fn export_file_name(unix_ms: i64) -> String {
    format!("urdu-post-{unix_ms}.png")
}

/// Millisecond stamps that are strictly increasing even within the same millisecond.
#[derive(Debug, Default)]
struct MonotonicMillis {
    last: Option<i64>,
}

impl MonotonicMillis {
    fn next(&mut self, now_ms: i64) -> i64 {
        let ms = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(ms);
        ms
    }
}

/// Writes exports into a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    clock: MonotonicMillis,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first delivery.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clock: MonotonicMillis::default(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn next_file_name(&mut self) -> String {
        export_file_name(self.clock.next(chrono::Utc::now().timestamp_millis()))
    }

    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> PostResult<PathBuf> {
        if file_name.contains(['/', '\\']) || file_name.is_empty() {
            return Err(PostError::validation(format!(
                "export file name '{file_name}' must be a plain name"
            )));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    clock: MonotonicMillis,
    /// Delivered files in order.
    pub(crate) files: Vec<(String, Vec<u8>)>,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the delivered files.
    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl DownloadSink for InMemorySink {
    fn next_file_name(&mut self) -> String {
        export_file_name(self.clock.next(chrono::Utc::now().timestamp_millis()))
    }

    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> PostResult<PathBuf> {
        self.files.push((file_name.to_owned(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}
