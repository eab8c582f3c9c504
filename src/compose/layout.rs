use serde::Serialize;

use crate::config::model::PostConfig;
use crate::foundation::core::{Canvas, Rect};
use crate::presets::tables::aspect_preset;

/// Width at and above which subject and quote sit side by side (the `md` breakpoint).
pub const MD_BREAKPOINT: f64 = 768.0;
/// Height of the theme footer bar.
pub const THEME_FOOTER_HEIGHT: f64 = 64.0;
/// Default logical canvas width.
pub const DEFAULT_LOGICAL_WIDTH: f64 = 768.0;

/// How the subject and quote regions share the content area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Subject 5/12 on the left, quote 7/12 on the right.
    SideBySide,
    /// Subject on top, quote below, each half the content height.
    Stacked,
}

/// Named areas of the canvas in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Regions {
    /// Everything above the footer.
    pub content: Rect,
    /// Portrait and name banner.
    pub subject: Rect,
    /// Quote panel.
    pub quote: Rect,
    /// Footer bar or footer image.
    pub footer: Rect,
}

/// Canvas for an aspect ratio at `logical_width`. Degenerate widths become 1px.
pub fn canvas_for(config: &PostConfig, logical_width: f64) -> Canvas {
    let width = if logical_width.is_finite() && logical_width >= 1.0 {
        logical_width
    } else {
        1.0
    };
    let height = aspect_preset(config.aspect_ratio).height_for(width).max(1.0);
    Canvas { width, height }
}

/// Footer height: the theme bar, or a full-width image at its own aspect ratio.
///
/// Clamped to the canvas height.
pub fn footer_height(canvas: Canvas, image_size: Option<(u32, u32)>, has_image: bool) -> f64 {
    let h = match (has_image, image_size) {
        (true, Some((w, h))) if w > 0 => canvas.width * f64::from(h) / f64::from(w),
        _ => THEME_FOOTER_HEIGHT,
    };
    h.clamp(0.0, canvas.height)
}

/// Split the canvas into content and footer, then the content into subject and quote.
pub fn regions(canvas: Canvas, footer_h: f64) -> (LayoutDirection, Regions) {
    let w = canvas.width;
    let content_h = (canvas.height - footer_h).max(0.0);
    let content = Rect::new(0.0, 0.0, w, content_h);
    let footer = Rect::new(0.0, content_h, w, canvas.height);

    if w >= MD_BREAKPOINT {
        let split = w * 5.0 / 12.0;
        (
            LayoutDirection::SideBySide,
            Regions {
                content,
                subject: Rect::new(0.0, 0.0, split, content_h),
                quote: Rect::new(split, 0.0, w, content_h),
                footer,
            },
        )
    } else {
        let split = content_h / 2.0;
        (
            LayoutDirection::Stacked,
            Regions {
                content,
                subject: Rect::new(0.0, 0.0, w, split),
                quote: Rect::new(0.0, split, w, content_h),
                footer,
            },
        )
    }
}

/// Destination rect that covers `region` while keeping the image aspect ratio.
///
/// Without a known size the image is stretched to the region.
pub fn cover_rect(region: Rect, size: Option<(u32, u32)>) -> Rect {
    let Some((iw, ih)) = size.filter(|(w, h)| *w > 0 && *h > 0) else {
        return region;
    };
    let (rw, rh) = (region.width(), region.height());
    if rw <= 0.0 || rh <= 0.0 {
        return region;
    }
    let scale = (rw / f64::from(iw)).max(rh / f64::from(ih));
    let (dw, dh) = (f64::from(iw) * scale, f64::from(ih) * scale);
    let c = region.center();
    Rect::new(c.x - dw / 2.0, c.y - dh / 2.0, c.x + dw / 2.0, c.y + dh / 2.0)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layout.rs"]
mod tests;
