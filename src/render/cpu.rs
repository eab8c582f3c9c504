use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::fontbook::FontBook;
use crate::assets::store::{AssetId, PreparedAssetStore, PreparedImage};
use crate::compose::layers::{FillShape, GlyphKind, Layer, LayerKind, LayerStack, Shadow};
use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::foundation::error::{PostError, PostResult};
use crate::foundation::math::lerp_u8;
use crate::render::backend::{FrameRGBA, RasterOpts, Rasterizer};
use crate::render::blur::{PixelRect, blur_region_premul, radius_for_sigma};
use crate::render::composite::{
    alpha_bbox, clip_to_rect, premul_over_in_place_opacity, shadow_mask,
};
use crate::render::glyphs::{
    GlyphTrees, rasterize_svg_to_premul_rgba8, svg_raster_params, tint_mask_in_place,
};
use crate::render::text::TextLayoutEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    from: [u8; 4],
    to: [u8; 4],
    w: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GlyphRasterKey {
    glyph: GlyphKind,
    color: [u8; 4],
    w: u32,
    h: u32,
}

/// CPU rasterizer built on `vello_cpu`.
///
/// Each layer is drawn alone onto a device-sized surface, post-processed (blur, clip, shadow)
/// and composited onto the accumulated canvas with premultiplied source-over.
pub struct CpuRasterizer {
    font_book: FontBook,
    text: TextLayoutEngine,
    glyphs: GlyphTrees,
    ctx: Option<vello_cpu::RenderContext>,
    image_cache: HashMap<AssetId, vello_cpu::Image>,
    gradient_cache: HashMap<GradientKey, vello_cpu::Image>,
    glyph_cache: HashMap<GlyphRasterKey, vello_cpu::Image>,
}

impl std::fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRasterizer")
            .field("fonts", &self.font_book.len())
            .field("cached_images", &self.image_cache.len())
            .finish_non_exhaustive()
    }
}

impl CpuRasterizer {
    /// Rasterizer resolving fonts through `font_book`.
    pub fn new(font_book: FontBook) -> Self {
        Self {
            font_book,
            text: TextLayoutEngine::new(),
            glyphs: GlyphTrees::default(),
            ctx: None,
            image_cache: HashMap::new(),
            gradient_cache: HashMap::new(),
            glyph_cache: HashMap::new(),
        }
    }

    /// Fonts available to text layers.
    pub fn font_book(&self) -> &FontBook {
        &self.font_book
    }

    /// Mutable access, e.g. to load more font files.
    pub fn font_book_mut(&mut self) -> &mut FontBook {
        &mut self.font_book
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> PostResult<R>,
    ) -> PostResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn image_paint_for(&mut self, id: AssetId, prepared: &PreparedImage) -> PostResult<vello_cpu::Image> {
        if let Some(p) = self.image_cache.get(&id) {
            return Ok(p.clone());
        }
        let img = rgba_premul_to_image(&prepared.rgba8_premul, prepared.width, prepared.height)?;
        self.image_cache.insert(id, img.clone());
        Ok(img)
    }

    /// Horizontal gradient, one pixel tall; stretched over the layer bounds when drawn.
    fn gradient_paint(&mut self, from: Rgba8, to: Rgba8, w: u32) -> PostResult<vello_cpu::Image> {
        let key = GradientKey {
            from: [from.r, from.g, from.b, from.a],
            to: [to.r, to.g, to.b, to.a],
            w,
        };
        if let Some(img) = self.gradient_cache.get(&key) {
            return Ok(img.clone());
        }
        let w1 = (w.max(1) - 1) as f32;
        let mut bytes = Vec::with_capacity(w as usize * 4);
        for x in 0..w {
            let t = if w1 <= 0.0 { 0.0 } else { x as f32 / w1 };
            let c = Rgba8 {
                r: lerp_u8(from.r, to.r, t),
                g: lerp_u8(from.g, to.g, t),
                b: lerp_u8(from.b, to.b, t),
                a: lerp_u8(from.a, to.a, t),
            };
            bytes.extend_from_slice(&c.premultiplied().to_array());
        }
        let img = rgba_premul_to_image(&bytes, w, 1)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }

    fn glyph_paint(
        &mut self,
        glyph: GlyphKind,
        color: Rgba8,
        tree: &usvg::Tree,
        w: u32,
        h: u32,
    ) -> PostResult<vello_cpu::Image> {
        let key = GlyphRasterKey {
            glyph,
            color: [color.r, color.g, color.b, color.a],
            w,
            h,
        };
        if let Some(img) = self.glyph_cache.get(&key) {
            return Ok(img.clone());
        }
        let mut rgba = rasterize_svg_to_premul_rgba8(tree, w, h)?;
        tint_mask_in_place(&mut rgba, color);
        let img = rgba_premul_to_image(&rgba, w, h)?;
        self.glyph_cache.insert(key, img.clone());
        Ok(img)
    }

    /// Draw the layer's content with `tr` (logical -> device). Returns `false` when skipped.
    fn draw_content(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &Layer,
        assets: &PreparedAssetStore,
        tr: Affine,
        pixel_ratio: f64,
    ) -> PostResult<bool> {
        let b = layer.bounds;
        if !(b.width() > 0.0 && b.height() > 0.0) {
            return Ok(false);
        }
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match &layer.kind {
            LayerKind::Fill { color, shape } => {
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                match shape {
                    FillShape::Rect => ctx.fill_rect(&rect_to_cpu(b)),
                    FillShape::Ellipse => ctx.fill_path(&ellipse_to_cpu(b)),
                }
                Ok(true)
            }
            LayerKind::Gradient { from, to } => {
                let gw = (b.width() * pixel_ratio).ceil().clamp(2.0, 4096.0) as u32;
                let img = self.gradient_paint(*from, *to, gw)?;
                let stretch = Affine::translate(b.origin().to_vec2())
                    * Affine::scale_non_uniform(b.width() / f64::from(gw), b.height());
                ctx.set_transform(affine_to_cpu(tr * stretch));
                ctx.set_paint(img);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(gw), 1.0));
                Ok(true)
            }
            LayerKind::Image { source } => {
                let Some(prepared) = assets.get(source) else {
                    tracing::debug!(role = ?layer.role, %source, "image not prepared; layer skipped");
                    return Ok(false);
                };
                let img = self.image_paint_for(AssetId::for_ref(source), prepared)?;
                let (iw, ih) = (f64::from(prepared.width), f64::from(prepared.height));
                let stretch = Affine::translate(b.origin().to_vec2())
                    * Affine::scale_non_uniform(b.width() / iw, b.height() / ih);
                ctx.set_transform(affine_to_cpu(tr * stretch));
                ctx.set_paint(img);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
                Ok(true)
            }
            LayerKind::Text(spec) => {
                if spec.text.trim().is_empty() {
                    return Ok(false);
                }
                let Some(font) = self
                    .font_book
                    .resolve(&spec.family, spec.weight, spec.face.as_ref())
                else {
                    tracing::warn!(role = ?layer.role, family = %spec.family, "no font for text layer; skipped");
                    return Ok(false);
                };
                let shaped = match self.text.layout(spec, &font, b.width() as f32, b.height() as f32) {
                    Ok(s) => s,
                    Err(e @ PostError::Font(_)) => {
                        tracing::warn!(role = ?layer.role, family = %font.family, error = %e, "unusable font; text layer skipped");
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                };

                let origin = Affine::translate((b.x0, b.y0 + f64::from(shaped.dy)));
                ctx.set_transform(affine_to_cpu(tr * origin));
                for (line, dx) in shaped.layout.lines().zip(shaped.line_dx.iter().copied()) {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x + dx,
                            y: g.y,
                        });
                        ctx.glyph_run(&shaped.font)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
                Ok(true)
            }
            LayerKind::Glyph { glyph, color } => {
                let tree = self.glyphs.tree(*glyph)?;
                let size = tree.size();
                let fit = Affine::translate(b.origin().to_vec2())
                    * Affine::scale_non_uniform(
                        b.width() / f64::from(size.width()),
                        b.height() / f64::from(size.height()),
                    );
                let (w, h, adjust) = svg_raster_params(&tree, tr * fit)?;
                let img = self.glyph_paint(*glyph, *color, &tree, w, h)?;
                ctx.set_transform(affine_to_cpu(adjust));
                ctx.set_paint(img);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
                Ok(true)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn composite_layer(
        &mut self,
        canvas: &mut [u8],
        surface: &mut vello_cpu::Pixmap,
        layer: &Layer,
        assets: &PreparedAssetStore,
        device: Affine,
        pixel_ratio: f64,
        (w, h): (u32, u32),
    ) -> PostResult<()> {
        let tr = device * layer.transform;
        // Checked against u16 by the caller.
        let (w16, h16) = (w as u16, h as u16);

        let drawn = self.with_ctx_mut(w16, h16, |this, ctx| {
            if !this.draw_content(ctx, layer, assets, tr, pixel_ratio)? {
                return Ok(false);
            }
            ctx.flush();
            surface.data_as_u8_slice_mut().fill(0);
            ctx.render_to_pixmap(surface);
            Ok(true)
        })?;
        if !drawn {
            return Ok(());
        }

        let clip = layer
            .clip
            .map(|c| PixelRect::from_f64(device.transform_rect_bbox(c), w, h));
        let footprint = clip.unwrap_or_else(|| {
            PixelRect::from_f64(tr.transform_rect_bbox(layer.bounds), w, h)
        });
        let data = surface.data_as_u8_slice_mut();

        if layer.blur_px > 0.0 {
            let sigma = layer.blur_px * pixel_ratio as f32;
            let region = footprint.expand(radius_for_sigma(sigma), w, h);
            blur_region_premul(data, w, h, region, sigma)?;
        }
        if let Some(c) = clip {
            clip_to_rect(data, w, h, c);
        }

        if layer.backdrop_blur_px > 0.0 {
            let sigma = layer.backdrop_blur_px * pixel_ratio as f32;
            blur_region_premul(canvas, w, h, footprint, sigma)?;
        }

        if let Some(shadow) = layer.shadow {
            draw_shadow(canvas, data, (w, h), shadow, pixel_ratio, clip, layer.opacity)?;
        }

        premul_over_in_place_opacity(canvas, data, layer.opacity)
    }
}

impl Rasterizer for CpuRasterizer {
    #[tracing::instrument(skip_all, fields(layers = stack.layers.len(), pixel_ratio = opts.pixel_ratio))]
    fn rasterize(
        &mut self,
        stack: &LayerStack,
        assets: &PreparedAssetStore,
        opts: RasterOpts,
    ) -> PostResult<FrameRGBA> {
        if !(opts.pixel_ratio.is_finite() && opts.pixel_ratio > 0.0) {
            return Err(PostError::validation("pixel_ratio must be finite and > 0"));
        }
        if opts.cache_bust {
            self.image_cache.clear();
        }

        let (w, h) = stack.canvas.device_size(opts.pixel_ratio);
        let w16: u16 = w
            .try_into()
            .map_err(|_| PostError::render("frame width exceeds u16"))?;
        let h16: u16 = h
            .try_into()
            .map_err(|_| PostError::render("frame height exceeds u16"))?;

        let device = Affine::scale(opts.pixel_ratio);
        let mut canvas = vec![0u8; (w as usize) * (h as usize) * 4];
        let mut surface = vello_cpu::Pixmap::new(w16, h16);

        for layer in &stack.layers {
            self.composite_layer(
                &mut canvas,
                &mut surface,
                layer,
                assets,
                device,
                opts.pixel_ratio,
                (w, h),
            )?;
        }

        tracing::debug!(width = w, height = h, "rasterized");
        Ok(FrameRGBA {
            width: w,
            height: h,
            data: canvas,
            premultiplied: true,
        })
    }
}

/// Composite the blurred silhouette of `content` beneath where it will land.
///
/// The blur radius follows CSS shadow semantics: a standard deviation of half the radius.
fn draw_shadow(
    canvas: &mut [u8],
    content: &[u8],
    (w, h): (u32, u32),
    shadow: Shadow,
    pixel_ratio: f64,
    clip: Option<PixelRect>,
    opacity: f32,
) -> PostResult<()> {
    let dx = (shadow.offset.x * pixel_ratio).round() as i32;
    let dy = (shadow.offset.y * pixel_ratio).round() as i32;
    let mut mask = shadow_mask(content, w, h, shadow.color, dx, dy);

    let sigma = shadow.blur_px * pixel_ratio as f32 / 2.0;
    if let Some(bbox) = alpha_bbox(&mask, w, h) {
        let region = bbox.expand(radius_for_sigma(sigma), w, h);
        blur_region_premul(&mut mask, w, h, region, sigma)?;
    } else {
        return Ok(());
    }
    if let Some(c) = clip {
        clip_to_rect(&mut mask, w, h, c);
    }
    premul_over_in_place_opacity(canvas, &mask, opacity)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn ellipse_to_cpu(r: Rect) -> vello_cpu::kurbo::BezPath {
    use kurbo::{PathEl, Shape as _};

    let to = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in kurbo::Ellipse::from_rect(r).path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => out.move_to(to(p)),
            PathEl::LineTo(p) => out.line_to(to(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(to(p1), to(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(to(p1), to(p2), to(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> PostResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PostError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PostError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PostError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn rgba_premul_to_image(bytes_premul: &[u8], width: u32, height: u32) -> PostResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
