use std::collections::HashMap;

use super::*;
use crate::assets::fonts::FontEntry;
use crate::config::update::FieldUpdate;
use crate::foundation::testfont::minimal_ttf;

fn no_sizes() -> HashMap<ImageRef, (u32, u32)> {
    HashMap::new()
}

fn stack_for(cfg: &PostConfig) -> LayerStack {
    compose(cfg, &FontRegistry::default(), &no_sizes(), ComposeOpts::default())
}

fn without_background() -> PostConfig {
    PostConfig::new_session().with(FieldUpdate::BackgroundImageUrl(None))
}

#[test]
fn default_document_layer_order() {
    let stack = stack_for(&PostConfig::new_session());
    let roles = stack.roles();
    assert_eq!(
        &roles[..10],
        &[
            LayerRole::CanvasFill,
            LayerRole::Background,
            LayerRole::Subject,
            LayerRole::NameBanner,
            LayerRole::NameText,
            LayerRole::QuotePanel,
            LayerRole::QuoteMarkOpen,
            LayerRole::QuoteMarkClose,
            LayerRole::QuoteText,
            LayerRole::FooterBar,
        ]
    );
    assert_eq!(
        roles.iter().filter(|r| **r == LayerRole::SocialIcon).count(),
        4
    );
    for (i, layer) in stack.layers.iter().enumerate() {
        assert_eq!(layer.z, i as u32);
    }
    assert_eq!(stack.direction, LayoutDirection::SideBySide);
}

#[test]
fn plain_panel_is_flat_slate_50() {
    let stack = stack_for(&without_background());
    let panel = stack.find(LayerRole::QuotePanel).unwrap();
    assert_eq!(
        panel.kind,
        LayerKind::Fill {
            color: SLATE_50,
            shape: FillShape::Rect
        }
    );
    assert_eq!(panel.backdrop_blur_px, 0.0);
    assert!(!stack.has(LayerRole::Background));
}

#[test]
fn background_makes_panel_frosted() {
    let stack = stack_for(&PostConfig::new_session());
    let panel = stack.find(LayerRole::QuotePanel).unwrap();
    let LayerKind::Fill { color, .. } = panel.kind else {
        panic!("panel should be a fill");
    };
    assert_eq!(color, Rgba8::WHITE.with_alpha(0.8));
    assert_eq!(panel.backdrop_blur_px, 4.0);

    let bg = stack.find(LayerRole::Background).unwrap();
    assert_eq!(bg.opacity, 0.2);
    assert_eq!(bg.blur_px, 4.0);
    assert_eq!(bg.clip, Some(stack.canvas.rect()));
}

#[test]
fn transparent_canvas_drops_fill_and_panel() {
    let cfg = PostConfig::new_session().with(FieldUpdate::TransparentBackground(true));
    let stack = stack_for(&cfg);
    assert!(!stack.has(LayerRole::CanvasFill));
    assert!(!stack.has(LayerRole::QuotePanel));
    assert!(stack.has(LayerRole::QuoteText));
}

#[test]
fn footer_image_replaces_theme_footer_and_clearing_restores_it() {
    let base = PostConfig::new_session();
    let before = stack_for(&base);

    let with_footer = base
        .clone()
        .with(FieldUpdate::FooterImageUrl(Some(ImageRef::new("footer.png"))));
    let mut sizes = no_sizes();
    sizes.insert(ImageRef::new("footer.png"), (1536, 256));
    let stack = compose(
        &with_footer,
        &FontRegistry::default(),
        &sizes,
        ComposeOpts::default(),
    );
    assert!(stack.has(LayerRole::FooterImage));
    for role in [
        LayerRole::FooterBar,
        LayerRole::PhoneText,
        LayerRole::WebsiteText,
        LayerRole::SocialIcon,
        LayerRole::SocialBadge,
    ] {
        assert!(!stack.has(role), "{role:?} must be absent");
    }
    assert_eq!(stack.regions.footer.height(), 128.0);

    let cleared = with_footer.with(FieldUpdate::FooterImageUrl(None));
    assert_eq!(stack_for(&cleared), before);
}

#[test]
fn quote_text_styles_follow_document() {
    let cfg = without_background()
        .with(FieldUpdate::FontSize(48))
        .with(FieldUpdate::IsBold(true))
        .with(FieldUpdate::TextShadow(true));
    let stack = stack_for(&cfg);
    let quote = stack.find(LayerRole::QuoteText).unwrap();
    let text = quote.text().unwrap();
    assert_eq!(text.size_px, 48.0);
    assert_eq!(text.weight, 700);
    assert_eq!(text.color, SLATE_800);
    assert_eq!(text.direction, TextDirection::Rtl);
    assert_eq!(text.align, TextAlign::Center);
    assert_eq!(quote.shadow, Some(Shadow::HEAVY));
    assert_eq!(quote.bounds, stack.regions.quote.inset(-48.0));

    let plain = stack_for(&without_background());
    assert_eq!(
        plain.find(LayerRole::QuoteText).unwrap().shadow,
        Some(Shadow::SUBTLE)
    );
    assert_eq!(plain.find(LayerRole::QuoteMarkOpen).unwrap().shadow, None);
}

#[test]
fn quote_text_carries_installed_face() {
    let mut fonts = FontRegistry::default();
    let face = InstalledFace::from_bytes(minimal_ttf("Custom Face")).unwrap();
    fonts.append(FontEntry {
        label: "custom".into(),
        family: "\"custom\"".into(),
        face: Some(face.clone()),
    });
    let cfg = without_background().with(FieldUpdate::FontFamily("\"custom\"".into()));
    let stack = compose(&cfg, &fonts, &no_sizes(), ComposeOpts::default());
    let text = stack.find(LayerRole::QuoteText).unwrap().text().unwrap();
    assert_eq!(text.family, "\"custom\"");
    assert_eq!(text.face.as_ref(), Some(&face));
}

#[test]
fn unknown_family_falls_back_to_first_preset() {
    let cfg = without_background().with(FieldUpdate::FontFamily("'Missing'".into()));
    let stack = stack_for(&cfg);
    let text = stack.find(LayerRole::QuoteText).unwrap().text().unwrap();
    assert_eq!(text.family, "'Noto Nastaliq Urdu', serif");
}

#[test]
fn narrow_canvas_stacks_and_shrinks() {
    let stack = compose(
        &without_background(),
        &FontRegistry::default(),
        &no_sizes(),
        ComposeOpts {
            logical_width: 400.0,
        },
    );
    assert_eq!(stack.direction, LayoutDirection::Stacked);
    let name = stack.find(LayerRole::NameText).unwrap().text().unwrap();
    assert_eq!(name.size_px, 20.0);
    assert_eq!(name.text, "ASIF SHER SIAL");
    let quote = stack.find(LayerRole::QuoteText).unwrap();
    assert_eq!(quote.bounds, stack.regions.quote.inset(-32.0));
}

#[test]
fn subject_cover_fit_uses_known_size() {
    let cfg = without_background();
    let portrait = cfg.image_url.clone().unwrap();
    let mut sizes = no_sizes();
    sizes.insert(portrait, (100, 100));
    let stack = compose(&cfg, &FontRegistry::default(), &sizes, ComposeOpts::default());
    let subject = stack.find(LayerRole::Subject).unwrap();
    let region = stack.regions.subject;
    assert_eq!(subject.clip, Some(region));
    // Square image into a tall region: height matches, width overflows.
    assert!((subject.bounds.height() - region.height()).abs() < 1e-9);
    assert!(subject.bounds.width() > region.width());
}

#[test]
fn theme_tokens_reach_gradients() {
    let cfg = without_background().with(FieldUpdate::Theme(crate::config::model::ThemeStops::new(
        "from-emerald-700",
        "to-teal-600",
    )));
    let stack = stack_for(&cfg);
    let LayerKind::Gradient { from, to } = stack.find(LayerRole::FooterBar).unwrap().kind else {
        panic!("footer bar should be a gradient");
    };
    assert_eq!(from, Rgba8::opaque(0x04, 0x78, 0x57));
    assert_eq!(to, Rgba8::opaque(0x0d, 0x94, 0x88));
}

#[test]
fn stack_serializes_with_kind_tags() {
    let json = stack_for(&PostConfig::new_session()).to_json_pretty().unwrap();
    assert!(json.contains("\"type\": \"gradient\""));
    assert!(json.contains("\"role\": \"quote_text\""));
    assert!(json.contains("\"direction\": \"side_by_side\""));
}
