use rayon::prelude::*;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{PostError, PostResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::blur::PixelRect;

/// Premultiplied source-over of `src` onto `dst`, with `src` scaled by `opacity`.
pub(crate) fn premul_over_in_place_opacity(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
) -> PostResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PostError::render(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    dst.par_chunks_mut(4096)
        .zip(src.par_chunks(4096))
        .for_each(|(dst, src)| {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let sa = mul_div255_u8(u16::from(s[3]), op);
                if sa == 0 {
                    continue;
                }
                let inv = 255u16 - u16::from(sa);

                d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
                for c in 0..3 {
                    let sc = mul_div255_u8(u16::from(s[c]), op);
                    let dc = mul_div255_u8(u16::from(d[c]), inv);
                    d[c] = add_sat_u8(sc, dc);
                }
            }
        });
    Ok(())
}

/// Zero every pixel outside `keep`.
pub(crate) fn clip_to_rect(data: &mut [u8], width: u32, height: u32, keep: PixelRect) {
    let row_bytes = width as usize * 4;
    data.par_chunks_mut(row_bytes)
        .take(height as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            if y < keep.y0 || y >= keep.y1 || keep.is_empty() {
                row.fill(0);
                return;
            }
            row[..keep.x0 as usize * 4].fill(0);
            row[keep.x1 as usize * 4..].fill(0);
        });
}

/// Tight bounds of the pixels with non-zero alpha.
pub(crate) fn alpha_bbox(data: &[u8], width: u32, height: u32) -> Option<PixelRect> {
    let mut r = PixelRect {
        x0: width,
        y0: height,
        x1: 0,
        y1: 0,
    };
    for (i, px) in data.chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        r.x0 = r.x0.min(x);
        r.y0 = r.y0.min(y);
        r.x1 = r.x1.max(x + 1);
        r.y1 = r.y1.max(y + 1);
    }
    (!r.is_empty()).then_some(r)
}

/// Silhouette of `src` filled with `color` and moved by `(dx, dy)` device pixels.
pub(crate) fn shadow_mask(
    src: &[u8],
    width: u32,
    height: u32,
    color: Rgba8,
    dx: i32,
    dy: i32,
) -> Vec<u8> {
    let c = color.premultiplied();
    let mut out = vec![0u8; src.len()];
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        let ty = y + dy;
        if ty < 0 || ty >= h {
            continue;
        }
        for x in 0..w {
            let tx = x + dx;
            if tx < 0 || tx >= w {
                continue;
            }
            let si = ((y as usize) * (width as usize) + x as usize) * 4;
            let a = u16::from(src[si + 3]);
            if a == 0 {
                continue;
            }
            let di = ((ty as usize) * (width as usize) + tx as usize) * 4;
            out[di] = mul_div255_u8(u16::from(c.r), a);
            out[di + 1] = mul_div255_u8(u16::from(c.g), a);
            out[di + 2] = mul_div255_u8(u16::from(c.b), a);
            out[di + 3] = mul_div255_u8(u16::from(c.a), a);
        }
    }
    out
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
