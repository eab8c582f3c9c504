use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::fontbook::ResolvedFont;
use crate::compose::layers::{TextAlign, TextDirection, TextSpec};
use crate::foundation::error::{PostError, PostResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Shaped paragraph ready to draw at a box origin.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
    /// Horizontal shift per line, in `layout.lines()` order.
    pub(crate) line_dx: Vec<f32>,
    /// Vertical shift that centres the paragraph in its box.
    pub(crate) dy: f32,
}

struct RegisteredFont {
    // Held so the pointer key stays unique for the lifetime of the entry.
    _bytes: Arc<Vec<u8>>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

/// Stateful helper for building Parley text layouts from resolved font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashMap<(usize, u32), RegisteredFont>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    fn register(&mut self, font: &ResolvedFont) -> PostResult<(String, vello_cpu::peniko::FontData)> {
        let key = (Arc::as_ptr(&font.bytes) as usize, font.index);
        if let Some(r) = self.registered.get(&key) {
            return Ok((r.family.clone(), r.font.clone()));
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| PostError::font("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PostError::font("registered font family has no name"))?
            .to_string();
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            font.index,
        );

        self.registered.insert(
            key,
            RegisteredFont {
                _bytes: font.bytes.clone(),
                family: family.clone(),
                font: data.clone(),
            },
        );
        Ok((family, data))
    }

    /// Shape `spec.text` with `font`, wrapping at `box_w` and centring vertically in `box_h`.
    ///
    /// Explicit newlines start new lines. Lines are aligned by hand: centred, or flush to the
    /// start edge of the paragraph direction.
    pub(crate) fn layout(
        &mut self,
        spec: &TextSpec,
        font: &ResolvedFont,
        box_w: f32,
        box_h: f32,
    ) -> PostResult<ShapedText> {
        if !spec.size_px.is_finite() || spec.size_px <= 0.0 {
            return Err(PostError::validation("text size_px must be finite and > 0"));
        }
        let (family, data) = self.register(font)?;
        let brush = TextBrushRgba8 {
            r: spec.color.r,
            g: spec.color.g,
            b: spec.color.b,
            a: spec.color.a,
        };

        let text = directed_text(&spec.text, spec.direction);
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(spec.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(spec.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(&text);
        let wrap = (box_w.is_finite() && box_w > 0.0).then_some(box_w);
        layout.break_all_lines(wrap);
        layout.align(
            wrap,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let line_dx = layout
            .lines()
            .map(|line| {
                let left = line
                    .items()
                    .filter_map(|item| match item {
                        parley::layout::PositionedLayoutItem::GlyphRun(run) => Some(run.offset()),
                        _ => None,
                    })
                    .fold(f32::INFINITY, f32::min);
                if !left.is_finite() {
                    return 0.0;
                }
                let advance = line.metrics().advance;
                line_start(spec.align, spec.direction, box_w, advance) - left
            })
            .collect();
        let dy = (box_h - layout.height()) / 2.0;

        Ok(ShapedText {
            layout,
            font: data,
            line_dx,
            dy,
        })
    }
}

/// Pins the paragraph base direction for bidi resolution.
///
/// Parley picks the base level from the first strong character of the whole text, so an
/// RTL quote that opens with Latin ("AI سلام") would otherwise resolve as LTR. A leading
/// RIGHT-TO-LEFT MARK is a strong R character with no glyph. An isolate pair would not
/// work here: characters inside isolates are skipped when the base level is chosen.
pub(crate) fn directed_text(text: &str, direction: TextDirection) -> std::borrow::Cow<'_, str> {
    match direction {
        TextDirection::Rtl => std::borrow::Cow::Owned(format!("{RLM}{text}")),
        TextDirection::Ltr => std::borrow::Cow::Borrowed(text),
    }
}

const RLM: char = '\u{200F}';

/// Left edge of a line of width `advance` inside a box of width `box_w`.
pub(crate) fn line_start(align: TextAlign, direction: TextDirection, box_w: f32, advance: f32) -> f32 {
    match (align, direction) {
        (TextAlign::Center, _) => (box_w - advance) / 2.0,
        (TextAlign::Start, TextDirection::Ltr) => 0.0,
        (TextAlign::Start, TextDirection::Rtl) => box_w - advance,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
