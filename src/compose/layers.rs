use serde::Serialize;

use crate::assets::fonts::{FontRegistry, InstalledFace};
use crate::assets::store::ImageSizes;
use crate::compose::layout::{
    DEFAULT_LOGICAL_WIDTH, LayoutDirection, Regions, canvas_for, cover_rect, footer_height,
    regions,
};
use crate::config::model::{ImageRef, PostConfig};
use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2};
use crate::foundation::error::{PostError, PostResult};
use crate::presets::palette::{SLATE_50, SLATE_200, SLATE_800, Stop, resolve_token};

/// Options for [`compose`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComposeOpts {
    /// Logical canvas width; the height follows the aspect ratio.
    pub logical_width: f64,
}

impl Default for ComposeOpts {
    fn default() -> Self {
        Self {
            logical_width: DEFAULT_LOGICAL_WIDTH,
        }
    }
}

/// What a layer is for. Stable names for inspection and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    /// Gradient or solid canvas background.
    CanvasFill,
    /// Background image.
    Background,
    /// Subject image.
    Subject,
    /// Pill behind the name.
    NameBanner,
    /// Speaker name.
    NameText,
    /// Panel behind the quote.
    QuotePanel,
    /// Faint mark behind the quote.
    Watermark,
    /// Opening quote mark.
    QuoteMarkOpen,
    /// Closing quote mark.
    QuoteMarkClose,
    /// Quote body.
    QuoteText,
    /// Image replacing the footer bar.
    FooterImage,
    /// Footer strip.
    FooterBar,
    /// Phone icon.
    PhoneIcon,
    /// Phone number.
    PhoneText,
    /// Website icon.
    WebsiteIcon,
    /// Website address.
    WebsiteText,
    /// Circle behind a social icon.
    SocialBadge,
    /// Social network icon.
    SocialIcon,
}

/// Vector icons drawn by the rasterizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphKind {
    /// Curly quotation mark.
    QuoteMark,
    /// Handset.
    Phone,
    /// Globe.
    Globe,
    /// Facebook logo.
    Facebook,
    /// Instagram logo.
    Instagram,
    /// LinkedIn logo.
    Linkedin,
    /// YouTube logo.
    Youtube,
}

/// Footer social icons, left to right.
pub const SOCIAL_GLYPHS: [GlyphKind; 4] = [
    GlyphKind::Facebook,
    GlyphKind::Instagram,
    GlyphKind::Linkedin,
    GlyphKind::Youtube,
];

/// Shape of a solid fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillShape {
    /// Axis-aligned rectangle.
    Rect,
    /// Ellipse inscribed in the bounds.
    Ellipse,
}

/// Horizontal text placement inside the layer bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Left for left-to-right text, right for right-to-left text.
    Start,
    /// Centred.
    Center,
}

/// Base direction of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    /// Left to right.
    Ltr,
    /// Right to left.
    Rtl,
}

/// Styled text inside a layer's bounds.
///
/// Text wraps at the bounds width, keeps explicit line breaks, and is centred vertically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextSpec {
    /// Text to shape.
    pub text: String,
    /// CSS-style family list.
    pub family: String,
    /// Bytes of a runtime-installed font matching `family`.
    #[serde(skip)]
    pub face: Option<InstalledFace>,
    /// Font size in logical pixels.
    pub size_px: f32,
    /// CSS weight (400 normal, 700 bold).
    pub weight: u16,
    /// Fill colour.
    pub color: Rgba8,
    /// Horizontal placement.
    pub align: TextAlign,
    /// Paragraph base direction.
    pub direction: TextDirection,
}

/// Content of a layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// Solid colour.
    Fill {
        /// Fill colour.
        color: Rgba8,
        /// Outline of the fill.
        shape: FillShape,
    },
    /// Left-to-right linear gradient across the bounds.
    Gradient {
        /// Colour at the left edge.
        from: Rgba8,
        /// Colour at the right edge.
        to: Rgba8,
    },
    /// Image stretched into the bounds.
    Image {
        /// Image to draw.
        source: ImageRef,
    },
    /// Shaped text.
    Text(TextSpec),
    /// Icon scaled into the bounds.
    Glyph {
        /// Icon to draw.
        glyph: GlyphKind,
        /// Icon colour.
        color: Rgba8,
    },
}

/// Drop shadow drawn beneath a layer's content.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Shadow {
    /// Shadow displacement.
    pub offset: Vec2,
    /// Shadow blur radius.
    pub blur_px: f32,
    /// Shadow colour.
    pub color: Rgba8,
}

impl Shadow {
    /// Faint default shadow for quote text and quote marks.
    pub const SUBTLE: Self = Self {
        offset: Vec2::new(0.0, 1.0),
        blur_px: 1.0,
        color: Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 13,
        },
    };

    /// Pronounced quote shadow enabled by `textShadow`.
    pub const HEAVY: Self = Self {
        offset: Vec2::new(2.0, 2.0),
        blur_px: 2.0,
        color: Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 128,
        },
    };

    const NAME: Self = Self {
        offset: Vec2::new(0.0, 2.0),
        blur_px: 2.0,
        color: Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 26,
        },
    };

    const BANNER: Self = Self {
        offset: Vec2::new(0.0, 6.0),
        blur_px: 6.0,
        color: Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 26,
        },
    };
}

/// One composited element.
///
/// Geometry is in logical pixels. `transform` maps the content (drawn in `bounds`) onto the
/// canvas; `clip` is in canvas space and not transformed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layer {
    /// Stacking order; higher draws later.
    pub z: u32,
    /// What the layer is for.
    pub role: LayerRole,
    /// Content.
    pub kind: LayerKind,
    /// Content rectangle before `transform`.
    pub bounds: Rect,
    /// Canvas-space clip.
    pub clip: Option<Rect>,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Gaussian blur of the layer content.
    pub blur_px: f32,
    /// Gaussian blur of what is already drawn below, inside the clip (or bounds).
    pub backdrop_blur_px: f32,
    /// Content to canvas mapping.
    pub transform: Affine,
    /// Optional drop shadow.
    pub shadow: Option<Shadow>,
}

impl Layer {
    fn new(role: LayerRole, kind: LayerKind, bounds: Rect) -> Self {
        Self {
            z: 0,
            role,
            kind,
            bounds,
            clip: None,
            opacity: 1.0,
            blur_px: 0.0,
            backdrop_blur_px: 0.0,
            transform: Affine::IDENTITY,
            shadow: None,
        }
    }

    fn clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    fn transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    fn shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Text payload, if this is a text layer.
    pub fn text(&self) -> Option<&TextSpec> {
        match &self.kind {
            LayerKind::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Ordered layers of one post, bottom first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerStack {
    /// Canvas size.
    pub canvas: Canvas,
    /// Reading direction of the post.
    pub direction: LayoutDirection,
    /// Named layout regions.
    pub regions: Regions,
    /// Layers, bottom first.
    pub layers: Vec<Layer>,
}

impl LayerStack {
    /// First layer with `role`.
    pub fn find(&self, role: LayerRole) -> Option<&Layer> {
        self.layers.iter().find(|l| l.role == role)
    }

    /// Whether any layer has `role`.
    pub fn has(&self, role: LayerRole) -> bool {
        self.find(role).is_some()
    }

    /// Roles in z-order.
    pub fn roles(&self) -> Vec<LayerRole> {
        self.layers.iter().map(|l| l.role).collect()
    }

    /// Pretty JSON for inspection.
    pub fn to_json_pretty(&self) -> PostResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PostError::render(format!("serialize layer stack: {e}")))
    }
}

const SANS: &str = "sans-serif";
const NAME_BANNER_HEIGHT: f64 = 56.0;
const NAME_BANNER_HEIGHT_STACKED: f64 = 52.0;
const QUOTE_MARK_SIZE: f64 = 60.0;
const ICON_SIZE: f64 = 18.0;
const BADGE_SIZE: f64 = 30.0;
const BADGE_GAP: f64 = 12.0;

/// Build the layer stack for a document.
///
/// Pure and total: the same inputs always give the same stack, and no input makes it fail.
/// Image sizes only refine geometry (cover-fit, footer height).
#[tracing::instrument(skip_all, fields(aspect = ?config.aspect_ratio, width = opts.logical_width))]
pub fn compose(
    config: &PostConfig,
    fonts: &FontRegistry,
    sizes: &dyn ImageSizes,
    opts: ComposeOpts,
) -> LayerStack {
    let canvas = canvas_for(config, opts.logical_width);
    let footer_size = config
        .footer_image_url
        .as_ref()
        .and_then(|r| sizes.image_size(r));
    let footer_h = footer_height(canvas, footer_size, config.footer_image_url.is_some());
    let (direction, regions) = regions(canvas, footer_h);
    let stacked = direction == LayoutDirection::Stacked;

    let from = resolve_token(&config.theme.from, Stop::From);
    let to = resolve_token(&config.theme.to, Stop::To);

    let mut layers = Vec::new();

    if !config.transparent_background {
        layers.push(Layer::new(
            LayerRole::CanvasFill,
            LayerKind::Fill {
                color: Rgba8::WHITE,
                shape: FillShape::Rect,
            },
            canvas.rect(),
        ));
    }

    if let Some(bg) = &config.background_image_url {
        let area = canvas.rect();
        let mut layer = Layer::new(
            LayerRole::Background,
            LayerKind::Image { source: bg.clone() },
            cover_rect(area, sizes.image_size(bg)),
        )
        .clip(area)
        .opacity(percent(config.background_opacity))
        .transform(zoom_about(area.center(), config.background_scale));
        layer.blur_px = f32::from(config.background_blur);
        layers.push(layer);
    }

    if let Some(img) = &config.image_url {
        let area = regions.subject;
        layers.push(
            Layer::new(
                LayerRole::Subject,
                LayerKind::Image {
                    source: img.clone(),
                },
                cover_rect(area, sizes.image_size(img)),
            )
            .clip(area)
            .opacity(percent(config.image_opacity))
            .transform(zoom_about(area.center(), config.image_scale)),
        );
    }

    push_name_banner(&mut layers, config, regions.subject, stacked, from, to);

    if !config.transparent_background {
        let panel = if config.background_image_url.is_some() {
            let mut l = Layer::new(
                LayerRole::QuotePanel,
                LayerKind::Fill {
                    color: Rgba8::WHITE.with_alpha(0.8),
                    shape: FillShape::Rect,
                },
                regions.quote,
            );
            l.backdrop_blur_px = 4.0;
            l
        } else {
            Layer::new(
                LayerRole::QuotePanel,
                LayerKind::Fill {
                    color: SLATE_50,
                    shape: FillShape::Rect,
                },
                regions.quote,
            )
        };
        layers.push(panel);
    }

    if let Some(wm) = &config.text_background_image_url {
        let area = regions.quote;
        layers.push(
            Layer::new(
                LayerRole::Watermark,
                LayerKind::Image { source: wm.clone() },
                cover_rect(area, sizes.image_size(wm)),
            )
            .clip(area)
            .opacity(percent(config.text_background_opacity)),
        );
    }

    push_quote(&mut layers, config, fonts, regions.quote, stacked);

    match &config.footer_image_url {
        Some(footer) => layers.push(Layer::new(
            LayerRole::FooterImage,
            LayerKind::Image {
                source: footer.clone(),
            },
            regions.footer,
        )),
        None => push_theme_footer(&mut layers, config, regions.footer, stacked, from, to),
    }

    for (z, layer) in layers.iter_mut().enumerate() {
        layer.z = z as u32;
    }

    LayerStack {
        canvas,
        direction,
        regions,
        layers,
    }
}

fn push_name_banner(
    layers: &mut Vec<Layer>,
    config: &PostConfig,
    subject: Rect,
    stacked: bool,
    from: Rgba8,
    to: Rgba8,
) {
    let h = if stacked {
        NAME_BANNER_HEIGHT_STACKED
    } else {
        NAME_BANNER_HEIGHT
    };
    let y1 = subject.y1 - 16.0;
    let x0 = subject.x0 - 16.0;
    let banner = Rect::new(x0, y1 - h, x0 + subject.width() * 11.0 / 12.0, y1);
    let skew = skew_x_about(banner.center(), -12.0);

    layers.push(
        Layer::new(
            LayerRole::NameBanner,
            LayerKind::Gradient { from, to },
            banner,
        )
        .clip(subject)
        .transform(skew)
        .shadow(Shadow::BANNER),
    );

    // px-6 on the banner plus pl-4 on the heading.
    let text_box = Rect::new(banner.x0 + 40.0, banner.y0, banner.x1 - 24.0, banner.y1);
    layers.push(
        Layer::new(
            LayerRole::NameText,
            LayerKind::Text(TextSpec {
                text: config.name.to_uppercase(),
                family: SANS.to_owned(),
                face: None,
                size_px: if stacked { 20.0 } else { 24.0 },
                weight: 700,
                color: Rgba8::WHITE,
                align: TextAlign::Start,
                direction: TextDirection::Ltr,
            }),
            text_box,
        )
        .clip(subject)
        .shadow(Shadow::NAME),
    );
}

fn push_quote(
    layers: &mut Vec<Layer>,
    config: &PostConfig,
    fonts: &FontRegistry,
    quote: Rect,
    stacked: bool,
) {
    let mark_shadow = config.text_shadow.then_some(Shadow::SUBTLE);

    let open = Rect::new(
        quote.x1 - 32.0 - QUOTE_MARK_SIZE,
        quote.y0 + 24.0,
        quote.x1 - 32.0,
        quote.y0 + 24.0 + QUOTE_MARK_SIZE,
    );
    let close = Rect::new(
        quote.x0 + 32.0,
        quote.y1 - 24.0 - QUOTE_MARK_SIZE,
        quote.x0 + 32.0 + QUOTE_MARK_SIZE,
        quote.y1 - 24.0,
    );
    for (role, rect, transform) in [
        (LayerRole::QuoteMarkOpen, open, Affine::IDENTITY),
        (
            LayerRole::QuoteMarkClose,
            close,
            Affine::rotate_about(std::f64::consts::PI, close.center()),
        ),
    ] {
        let mut l = Layer::new(
            role,
            LayerKind::Glyph {
                glyph: GlyphKind::QuoteMark,
                color: SLATE_200,
            },
            rect,
        )
        .clip(quote)
        .opacity(0.5)
        .transform(transform);
        l.shadow = mark_shadow;
        layers.push(l);
    }

    let pad = if stacked { 32.0 } else { 48.0 };
    let text_box = quote.inset(-pad);
    let text_box = if text_box.width() > 0.0 && text_box.height() > 0.0 {
        text_box
    } else {
        quote
    };
    let (family, face) = match fonts.resolve(&config.font_family) {
        Some(e) => (e.family.clone(), e.face.clone()),
        None => (config.font_family.clone(), None),
    };
    layers.push(
        Layer::new(
            LayerRole::QuoteText,
            LayerKind::Text(TextSpec {
                text: config.quote.clone(),
                family,
                face,
                size_px: config.font_size as f32,
                weight: if config.is_bold { 700 } else { 400 },
                color: SLATE_800,
                align: TextAlign::Center,
                direction: TextDirection::Rtl,
            }),
            text_box,
        )
        .clip(quote)
        .shadow(if config.text_shadow {
            Shadow::HEAVY
        } else {
            Shadow::SUBTLE
        }),
    );
}

fn push_theme_footer(
    layers: &mut Vec<Layer>,
    config: &PostConfig,
    footer: Rect,
    stacked: bool,
    from: Rgba8,
    to: Rgba8,
) {
    layers.push(Layer::new(
        LayerRole::FooterBar,
        LayerKind::Gradient { from, to },
        footer,
    ));

    let pad = if stacked { 16.0 } else { 32.0 };
    let size = if stacked { 14.0 } else { 16.0 };
    let icon_color = Rgba8::WHITE.with_alpha(0.8);
    let cy = footer.center().y;

    // Contact entries: a row on wide canvases, a column otherwise.
    let (phone_at, web_at) = if stacked {
        let row_h = 20.0;
        let gap = 8.0;
        let top = cy - (2.0 * row_h + gap) / 2.0;
        (
            Point::new(footer.x0 + pad, top + row_h / 2.0),
            Point::new(footer.x0 + pad, top + row_h + gap + row_h / 2.0),
        )
    } else {
        let phone_end =
            footer.x0 + pad + ICON_SIZE + 8.0 + estimate_advance(&config.phone_number, size);
        (
            Point::new(footer.x0 + pad, cy),
            Point::new(phone_end + 24.0, cy),
        )
    };

    for (at, glyph, icon_role, text, text_role) in [
        (
            phone_at,
            GlyphKind::Phone,
            LayerRole::PhoneIcon,
            &config.phone_number,
            LayerRole::PhoneText,
        ),
        (
            web_at,
            GlyphKind::Globe,
            LayerRole::WebsiteIcon,
            &config.website,
            LayerRole::WebsiteText,
        ),
    ] {
        let icon = Rect::new(at.x, at.y - ICON_SIZE / 2.0, at.x + ICON_SIZE, at.y + ICON_SIZE / 2.0);
        layers.push(
            Layer::new(
                icon_role,
                LayerKind::Glyph {
                    glyph,
                    color: icon_color,
                },
                icon,
            )
            .clip(footer),
        );
        let tx = icon.x1 + 8.0;
        let text_box = Rect::new(
            tx,
            at.y - size,
            (tx + estimate_advance(text, size)).max(tx + 1.0),
            at.y + size,
        );
        layers.push(
            Layer::new(
                text_role,
                LayerKind::Text(TextSpec {
                    text: text.clone(),
                    family: SANS.to_owned(),
                    face: None,
                    size_px: size as f32,
                    weight: 600,
                    color: Rgba8::WHITE,
                    align: TextAlign::Start,
                    direction: TextDirection::Ltr,
                }),
                text_box,
            )
            .clip(footer),
        );
    }

    let n = SOCIAL_GLYPHS.len() as f64;
    let row_w = n * BADGE_SIZE + (n - 1.0) * BADGE_GAP;
    let mut x = footer.x1 - pad - row_w;
    for glyph in SOCIAL_GLYPHS {
        let badge = Rect::new(x, cy - BADGE_SIZE / 2.0, x + BADGE_SIZE, cy + BADGE_SIZE / 2.0);
        layers.push(
            Layer::new(
                LayerRole::SocialBadge,
                LayerKind::Fill {
                    color: Rgba8::WHITE.with_alpha(0.1),
                    shape: FillShape::Ellipse,
                },
                badge,
            )
            .clip(footer),
        );
        let c = badge.center();
        layers.push(
            Layer::new(
                LayerRole::SocialIcon,
                LayerKind::Glyph {
                    glyph,
                    color: Rgba8::WHITE,
                },
                Rect::new(
                    c.x - ICON_SIZE / 2.0,
                    c.y - ICON_SIZE / 2.0,
                    c.x + ICON_SIZE / 2.0,
                    c.y + ICON_SIZE / 2.0,
                ),
            )
            .clip(footer),
        );
        x += BADGE_SIZE + BADGE_GAP;
    }
}

fn percent(v: u8) -> f32 {
    f32::from(v) / 100.0
}

fn zoom_about(center: Point, scale_percent: u16) -> Affine {
    let s = f64::from(scale_percent) / 100.0;
    Affine::translate(center.to_vec2()) * Affine::scale(s) * Affine::translate(-center.to_vec2())
}

fn skew_x_about(center: Point, degrees: f64) -> Affine {
    let k = degrees.to_radians().tan();
    Affine::translate(center.to_vec2()) * Affine::skew(k, 0.0) * Affine::translate(-center.to_vec2())
}

/// Rough advance width of a single line; layout runs before any font is shaped.
fn estimate_advance(text: &str, size_px: f64) -> f64 {
    text.chars().count() as f64 * size_px * 0.6
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layers.rs"]
mod tests;
