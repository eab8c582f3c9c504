use crate::assets::store::PreparedAssetStore;
use crate::compose::layers::LayerStack;
use crate::foundation::error::{PostError, PostResult};

/// A rendered post as RGBA8 pixels.
///
/// Frames are premultiplied alpha; the `premultiplied` flag makes that explicit at API
/// boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Rasterization options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterOpts {
    /// Device pixels per logical pixel.
    pub pixel_ratio: f64,
    /// Drop cached image paints before drawing.
    pub cache_bust: bool,
}

impl Default for RasterOpts {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            cache_bust: false,
        }
    }
}

/// Turns a layer stack into pixels.
pub trait Rasterizer {
    /// Draw every layer of `stack` bottom to top.
    ///
    /// Image layers whose source is not in `assets` are skipped.
    fn rasterize(
        &mut self,
        stack: &LayerStack,
        assets: &PreparedAssetStore,
        opts: RasterOpts,
    ) -> PostResult<FrameRGBA>;
}

/// Encode a frame as PNG, un-premultiplying when needed.
pub fn encode_png(frame: &FrameRGBA) -> PostResult<Vec<u8>> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(PostError::render("frame byte len mismatch"));
    }

    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| PostError::render("frame does not fit an rgba image"))?;

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| PostError::render(format!("encode png: {e}")))?;
    Ok(out.into_inner())
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
