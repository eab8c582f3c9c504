use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::parse_svg;
use crate::compose::layers::GlyphKind;
use crate::foundation::core::{Affine, Rgba8};
use crate::foundation::error::{PostError, PostResult};
use crate::foundation::math::mul_div255_u8;

const STROKED: &str = r#"fill="none" stroke="black" stroke-width="2" stroke-linecap="round" stroke-linejoin="round""#;

/// Icon source on a 24x24 view box, drawn in black.
fn glyph_svg(kind: GlyphKind) -> String {
    let (attrs, body) = match kind {
        GlyphKind::QuoteMark => (
            r#"fill="black""#,
            concat!(
                r#"<path d="M3 21c3 0 7-1 7-8V5c0-1.25-.76-2-2-2H4c-1.25 0-2 .75-2 2v6c0 1.25.75 2 2 2 1 0 1 0 1 1v1c0 1-1 2-2 2s-1 0-1 1v2c0 1 0 1 1 1z"/>"#,
                r#"<path d="M15 21c3 0 7-1 7-8V5c0-1.25-.76-2-2-2h-4c-1.25 0-2 .75-2 2v6c0 1.25.75 2 2 2h.75c0 2.25.25 4-2.75 4v3c0 1 0 1 1 1z"/>"#,
            ),
        ),
        GlyphKind::Phone => (
            STROKED,
            r#"<path d="M22 16.92v3a2 2 0 0 1-2.18 2 19.79 19.79 0 0 1-8.63-3.07 19.5 19.5 0 0 1-6-6 19.79 19.79 0 0 1-3.07-8.67A2 2 0 0 1 4.11 2h3a2 2 0 0 1 2 1.72 12.84 12.84 0 0 0 .7 2.81 2 2 0 0 1-.45 2.11L8.09 9.91a16 16 0 0 0 6 6l1.27-1.27a2 2 0 0 1 2.11-.45 12.84 12.84 0 0 0 2.81.7A2 2 0 0 1 22 16.92z"/>"#,
        ),
        GlyphKind::Globe => (
            STROKED,
            concat!(
                r#"<circle cx="12" cy="12" r="10"/>"#,
                r#"<path d="M12 2a14.5 14.5 0 0 0 0 20 14.5 14.5 0 0 0 0-20"/>"#,
                r#"<path d="M2 12h20"/>"#,
            ),
        ),
        GlyphKind::Facebook => (
            STROKED,
            r#"<path d="M18 2h-3a5 5 0 0 0-5 5v3H7v4h3v8h4v-8h3l1-4h-4V7a1 1 0 0 1 1-1h3z"/>"#,
        ),
        GlyphKind::Instagram => (
            STROKED,
            concat!(
                r#"<rect x="2" y="2" width="20" height="20" rx="5" ry="5"/>"#,
                r#"<path d="M16 11.37A4 4 0 1 1 12.63 8 4 4 0 0 1 16 11.37z"/>"#,
                r#"<path d="M17.5 6.5h.01"/>"#,
            ),
        ),
        GlyphKind::Linkedin => (
            STROKED,
            concat!(
                r#"<path d="M16 8a6 6 0 0 1 6 6v7h-4v-7a2 2 0 0 0-2-2 2 2 0 0 0-2 2v7h-4v-7a6 6 0 0 1 6-6z"/>"#,
                r#"<rect x="2" y="9" width="4" height="12"/>"#,
                r#"<circle cx="4" cy="4" r="2"/>"#,
            ),
        ),
        GlyphKind::Youtube => (
            STROKED,
            concat!(
                r#"<path d="M2.5 17a24.12 24.12 0 0 1 0-10 2 2 0 0 1 1.4-1.4 49.56 49.56 0 0 1 16.2 0A2 2 0 0 1 21.5 7a24.12 24.12 0 0 1 0 10 2 2 0 0 1-1.4 1.4 49.55 49.55 0 0 1-16.2 0A2 2 0 0 1 2.5 17"/>"#,
                r#"<path d="m10 15 5-3-5-3z"/>"#,
            ),
        ),
    };
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" {attrs}>{body}</svg>"#
    )
}

/// Raster size and corrected draw transform for an SVG drawn with `transform`.
///
/// Rasterizing at the transformed scale keeps icons sharp; the returned transform maps raster
/// pixels back into the SVG's own coordinate space.
pub(crate) fn svg_raster_params(
    tree: &usvg::Tree,
    transform: Affine,
) -> PostResult<(u32, u32, Affine)> {
    fn to_px(v: f32) -> PostResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PostError::render("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let base_w = to_px(size.width())?;
    let base_h = to_px(size.height())?;

    let [a, b, c, d, _e, _f] = transform.as_coeffs();
    let sx = (a * a + b * b).sqrt().max(1e-6);
    let sy = (c * c + d * d).sqrt().max(1e-6);

    let w = (f64::from(base_w) * sx).ceil().max(1.0) as u32;
    let h = (f64::from(base_h) * sy).ceil().max(1.0) as u32;

    const MAX_DIM: u32 = 4096;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(PostError::render(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let inv = Affine::scale_non_uniform(1.0 / sx, 1.0 / sy);
    Ok((w, h, transform * inv))
}

pub(crate) fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> PostResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PostError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Recolour a black-on-transparent raster: coverage becomes `color` in place.
pub(crate) fn tint_mask_in_place(rgba8_premul: &mut [u8], color: Rgba8) {
    let c = color.premultiplied();
    for px in rgba8_premul.chunks_exact_mut(4) {
        let cov = u16::from(px[3]);
        px[0] = mul_div255_u8(u16::from(c.r), cov);
        px[1] = mul_div255_u8(u16::from(c.g), cov);
        px[2] = mul_div255_u8(u16::from(c.b), cov);
        px[3] = mul_div255_u8(u16::from(c.a), cov);
    }
}

/// Parsed icon trees, built on first use.
#[derive(Default)]
pub(crate) struct GlyphTrees {
    trees: HashMap<GlyphKind, Arc<usvg::Tree>>,
}

impl GlyphTrees {
    pub(crate) fn tree(&mut self, kind: GlyphKind) -> PostResult<Arc<usvg::Tree>> {
        if let Some(t) = self.trees.get(&kind) {
            return Ok(t.clone());
        }
        let tree = parse_svg(glyph_svg(kind).as_bytes())?.tree;
        self.trees.insert(kind, tree.clone());
        Ok(tree)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/glyphs.rs"]
mod tests;
