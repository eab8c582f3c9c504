use rayon::prelude::*;

use crate::foundation::error::{PostError, PostResult};

/// Pixel rectangle `[x0, x1) x [y0, y1)` on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub(crate) fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Round a float rect outwards and clamp it to the surface.
    pub(crate) fn from_f64(r: kurbo::Rect, width: u32, height: u32) -> Self {
        let clamp = |v: f64, max: u32| -> u32 {
            if v.is_nan() {
                0
            } else {
                v.clamp(0.0, f64::from(max)) as u32
            }
        };
        let r = r.abs();
        Self {
            x0: clamp(r.x0.floor(), width),
            y0: clamp(r.y0.floor(), height),
            x1: clamp(r.x1.ceil(), width),
            y1: clamp(r.y1.ceil(), height),
        }
    }

    pub(crate) fn width(self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub(crate) fn height(self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub(crate) fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grow by `by` pixels on every side, staying inside the surface.
    pub(crate) fn expand(self, by: u32, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: self.x1.saturating_add(by).min(width),
            y1: self.y1.saturating_add(by).min(height),
        }
    }
}

/// Blur radius covering three standard deviations.
pub(crate) fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Gaussian blur a rectangle of a premultiplied RGBA8 surface in place.
///
/// Samples outside the rectangle are clamped to its edge.
pub(crate) fn blur_region_premul(
    data: &mut [u8],
    width: u32,
    height: u32,
    region: PixelRect,
    sigma: f32,
) -> PostResult<()> {
    let radius = radius_for_sigma(sigma);
    if radius == 0 || region.is_empty() {
        return Ok(());
    }
    if data.len() != (width as usize) * (height as usize) * 4 {
        return Err(PostError::render("blur surface byte len mismatch"));
    }
    let kernel = gaussian_kernel_q16(radius, sigma)?;

    let (rw, rh) = (region.width(), region.height());
    let row_bytes = rw as usize * 4;
    let mut src = vec![0u8; row_bytes * rh as usize];
    for (i, y) in (region.y0..region.y1).enumerate() {
        let start = ((y as usize) * (width as usize) + region.x0 as usize) * 4;
        src[i * row_bytes..(i + 1) * row_bytes].copy_from_slice(&data[start..start + row_bytes]);
    }

    let mut tmp = vec![0u8; src.len()];
    let mut dst = vec![0u8; src.len()];
    horizontal_blur_q16(&src, &mut tmp, rw, &kernel);
    vertical_blur_q16(&tmp, &mut dst, rw, rh, &kernel);

    for (i, y) in (region.y0..region.y1).enumerate() {
        let start = ((y as usize) * (width as usize) + region.x0 as usize) * 4;
        data[start..start + row_bytes].copy_from_slice(&dst[i * row_bytes..(i + 1) * row_bytes]);
    }
    Ok(())
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PostResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PostError::render("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(PostError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let row_bytes = width as usize * 4;
    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .for_each(|(out_row, in_row)| {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                    let idx = (sx as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(in_row[idx + c]);
                    }
                }
                let o = (x as usize) * 4;
                for c in 0..4 {
                    out_row[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as usize;
    let h = height as i32;
    dst.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, out_row)| {
            let y = y as i32;
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                    let idx = ((sy as usize) * w + x) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                for c in 0..4 {
                    out_row[x * 4 + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}
