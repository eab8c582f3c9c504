use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::decode as assets_decode,
    config::model::{ImageRef, ImageSourceKind, PostConfig},
    foundation::error::{PostError, PostResult},
    foundation::math::Fnv1a64,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug)]
/// Prepared SVG asset represented as a parsed `usvg` tree.
pub struct PreparedSvg {
    /// Parsed SVG tree.
    pub tree: Arc<usvg::Tree>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Stable hashed identifier of an image reference.
pub struct AssetId(pub(crate) u64);

impl AssetId {
    /// Hash an image reference into an id.
    pub fn for_ref(image: &ImageRef) -> Self {
        let mut hasher = Fnv1a64::new_default();
        hasher.write_u8(b'I');
        hasher.write_bytes(image.as_str().as_bytes());
        Self(hasher.finish())
    }

    /// Access raw 64-bit identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Intrinsic pixel sizes of referenced images, as far as they are known.
///
/// Layout uses this for cover-fitting and the auto-height footer; an unknown size makes the
/// image stretch into its region instead.
pub trait ImageSizes {
    /// `(width, height)` of the decoded image, if available.
    fn image_size(&self, image: &ImageRef) -> Option<(u32, u32)>;
}

impl ImageSizes for HashMap<ImageRef, (u32, u32)> {
    fn image_size(&self, image: &ImageRef) -> Option<(u32, u32)> {
        self.get(image).copied()
    }
}

#[derive(Clone, Debug, Default)]
/// Decoded images for one document, keyed by their references.
///
/// All IO happens in [`PreparedAssetStore::prepare`]; renderers only read from the store.
pub struct PreparedAssetStore {
    root: PathBuf,
    images: HashMap<AssetId, PreparedImage>,
    missing: Vec<ImageRef>,
}

impl PreparedAssetStore {
    /// Empty store resolving local paths against `root`.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Resolve and decode every image the document references.
    ///
    /// A reference that cannot be loaded is logged and recorded in [`Self::missing`]; the
    /// matching layer is then left out of the raster, the way a broken image is in a page.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn prepare(
        config: &PostConfig,
        root: impl AsRef<Path>,
        client: &reqwest::Client,
    ) -> Self {
        let mut out = Self::empty(root.as_ref());
        for image in referenced_images(config) {
            if out.get(image).is_some() {
                continue;
            }
            match out.load_bytes(image, client).await {
                Ok(bytes) => {
                    if let Err(e) = out.insert_bytes(image, &bytes) {
                        tracing::warn!(image = %image, error = %e, "image skipped");
                        out.missing.push(image.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!(image = %image, error = %e, "image skipped");
                    out.missing.push(image.clone());
                }
            }
        }
        tracing::debug!(
            images = out.images.len(),
            missing = out.missing.len(),
            "assets prepared"
        );
        out
    }

    /// Return root directory used when resolving relative image paths.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode `bytes` and store them under `image`.
    pub fn insert_bytes(&mut self, image: &ImageRef, bytes: &[u8]) -> PostResult<AssetId> {
        let prepared = assets_decode::decode_image(bytes)?;
        Ok(self.insert(image, prepared))
    }

    /// Store an already decoded image under `image`.
    pub fn insert(&mut self, image: &ImageRef, prepared: PreparedImage) -> AssetId {
        let id = AssetId::for_ref(image);
        self.images.insert(id, prepared);
        self.missing.retain(|m| m != image);
        id
    }

    /// Lookup a prepared image.
    pub fn get(&self, image: &ImageRef) -> Option<&PreparedImage> {
        self.images.get(&AssetId::for_ref(image))
    }

    /// References that failed to load during [`Self::prepare`].
    pub fn missing(&self) -> &[ImageRef] {
        &self.missing
    }

    /// Number of prepared images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image is prepared.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    async fn load_bytes(&self, image: &ImageRef, client: &reqwest::Client) -> PostResult<Vec<u8>> {
        match image.kind() {
            ImageSourceKind::DataUrl => assets_decode::parse_data_url(image.as_str()),
            ImageSourceKind::Remote => fetch_remote(client, image.as_str()).await,
            ImageSourceKind::Local => {
                let norm = normalize_rel_path(image.as_str())?;
                let path = self.root.join(Path::new(&norm));
                tokio::fs::read(&path).await.map_err(|e| {
                    PostError::asset(format!("read image '{}': {e}", path.display()))
                })
            }
        }
    }
}

impl ImageSizes for PreparedAssetStore {
    fn image_size(&self, image: &ImageRef) -> Option<(u32, u32)> {
        self.get(image).map(|p| (p.width, p.height))
    }
}

/// Image references of a document, in layer order, without duplicates.
pub fn referenced_images(config: &PostConfig) -> Vec<&ImageRef> {
    let mut out: Vec<&ImageRef> = Vec::with_capacity(4);
    for image in [
        config.background_image_url.as_ref(),
        config.image_url.as_ref(),
        config.text_background_image_url.as_ref(),
        config.footer_image_url.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        if !out.contains(&image) {
            out.push(image);
        }
    }
    out
}

async fn fetch_remote(client: &reqwest::Client, url: &str) -> PostResult<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PostError::asset(format!("download {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(PostError::asset(format!(
            "download {url}: HTTP {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PostError::asset(format!("read image data from {url}: {e}")))?;
    Ok(bytes.to_vec())
}

/// Normalize and validate root-relative image paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PostResult<String> {
    let s = source.trim().replace('\\', "/");
    if s.starts_with('/') {
        return Err(PostError::validation("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(PostError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PostError::validation("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PostError::validation("image path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
