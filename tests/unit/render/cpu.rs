use std::sync::Arc;

use super::*;
use crate::assets::fonts::{FontEntry, FontRegistry, InstalledFace};
use crate::compose::layers::{ComposeOpts, LayerRole, TextAlign, TextDirection, TextSpec, compose};
use crate::compose::layout::regions;
use crate::config::model::{ImageRef, PostConfig};
use crate::config::update::FieldUpdate;
use crate::foundation::core::Canvas;
use crate::foundation::testfont::minimal_ttf;

fn layer(role: LayerRole, kind: LayerKind, bounds: Rect) -> Layer {
    Layer {
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

fn fill(color: Rgba8, bounds: Rect) -> Layer {
    layer(
        LayerRole::CanvasFill,
        LayerKind::Fill {
            color,
            shape: FillShape::Rect,
        },
        bounds,
    )
}

fn stack(w: f64, h: f64, layers: Vec<Layer>) -> LayerStack {
    let canvas = Canvas::new(w, h).unwrap();
    let (direction, regions) = regions(canvas, 0.0);
    LayerStack {
        canvas,
        direction,
        regions,
        layers,
    }
}

fn ratio1() -> RasterOpts {
    RasterOpts {
        pixel_ratio: 1.0,
        cache_bust: false,
    }
}

fn rasterizer() -> CpuRasterizer {
    CpuRasterizer::new(FontBook::new())
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tol)
}

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px.iter().copied().cycle().take((w * h * 4) as usize).collect()),
    }
}

#[test]
fn fills_stack_in_order_at_pixel_ratio() {
    let s = stack(
        20.0,
        10.0,
        vec![
            fill(Rgba8::WHITE, Rect::new(0.0, 0.0, 20.0, 10.0)),
            fill(Rgba8::opaque(255, 0, 0), Rect::new(0.0, 0.0, 10.0, 10.0)),
        ],
    );
    let frame = rasterizer()
        .rasterize(&s, &PreparedAssetStore::default(), RasterOpts::default())
        .unwrap();
    assert_eq!((frame.width, frame.height), (40, 20));
    assert!(frame.premultiplied);
    assert_eq!(frame.pixel(5, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(30, 10), Some([255, 255, 255, 255]));
}

#[test]
fn empty_stack_is_transparent() {
    let frame = rasterizer()
        .rasterize(&stack(4.0, 4.0, vec![]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn layer_opacity_blends_over_canvas() {
    let mut red = fill(Rgba8::opaque(255, 0, 0), Rect::new(0.0, 0.0, 8.0, 8.0));
    red.opacity = 0.5;
    let s = stack(
        8.0,
        8.0,
        vec![fill(Rgba8::opaque(0, 0, 255), Rect::new(0.0, 0.0, 8.0, 8.0)), red],
    );
    let frame = rasterizer()
        .rasterize(&s, &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert!(close(frame.pixel(4, 4).unwrap(), [128, 0, 127, 255], 1));
}

#[test]
fn clip_limits_content() {
    let mut red = fill(Rgba8::opaque(255, 0, 0), Rect::new(0.0, 0.0, 10.0, 10.0));
    red.clip = Some(Rect::new(0.0, 0.0, 5.0, 10.0));
    let frame = rasterizer()
        .rasterize(&stack(10.0, 10.0, vec![red]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert_eq!(frame.pixel(2, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(7, 5), Some([0, 0, 0, 0]));
}

#[test]
fn images_draw_when_prepared_and_skip_otherwise() {
    let source = ImageRef::new("blue.png");
    let img = layer(
        LayerRole::Subject,
        LayerKind::Image {
            source: source.clone(),
        },
        Rect::new(0.0, 0.0, 10.0, 10.0),
    );
    let s = stack(10.0, 10.0, vec![img]);

    let mut r = rasterizer();
    let frame = r.rasterize(&s, &PreparedAssetStore::default(), ratio1()).unwrap();
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 0]));

    let mut assets = PreparedAssetStore::default();
    assets.insert(&source, solid_image(2, 2, [0, 0, 255, 255]));
    let frame = r.rasterize(&s, &assets, ratio1()).unwrap();
    assert!(close(frame.pixel(5, 5).unwrap(), [0, 0, 255, 255], 2));
}

#[test]
fn cache_bust_picks_up_replaced_pixels() {
    let source = ImageRef::new("swap.png");
    let s = stack(
        6.0,
        6.0,
        vec![layer(
            LayerRole::Background,
            LayerKind::Image {
                source: source.clone(),
            },
            Rect::new(0.0, 0.0, 6.0, 6.0),
        )],
    );
    let mut r = rasterizer();
    let mut assets = PreparedAssetStore::default();
    assets.insert(&source, solid_image(2, 2, [0, 255, 0, 255]));
    r.rasterize(&s, &assets, ratio1()).unwrap();

    assets.insert(&source, solid_image(2, 2, [255, 0, 0, 255]));
    let stale = r.rasterize(&s, &assets, ratio1()).unwrap();
    assert!(close(stale.pixel(3, 3).unwrap(), [0, 255, 0, 255], 2));

    let fresh = r
        .rasterize(
            &s,
            &assets,
            RasterOpts {
                cache_bust: true,
                ..ratio1()
            },
        )
        .unwrap();
    assert!(close(fresh.pixel(3, 3).unwrap(), [255, 0, 0, 255], 2));
}

#[test]
fn gradient_runs_left_to_right() {
    let g = layer(
        LayerRole::FooterBar,
        LayerKind::Gradient {
            from: Rgba8::opaque(255, 0, 0),
            to: Rgba8::opaque(0, 0, 255),
        },
        Rect::new(0.0, 0.0, 100.0, 4.0),
    );
    let frame = rasterizer()
        .rasterize(&stack(100.0, 4.0, vec![g]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    let left = frame.pixel(0, 2).unwrap();
    let right = frame.pixel(99, 2).unwrap();
    let mid = frame.pixel(50, 2).unwrap();
    assert!(left[0] > 240 && left[2] < 15, "{left:?}");
    assert!(right[2] > 240 && right[0] < 15, "{right:?}");
    assert!(mid[0] > 80 && mid[2] > 80, "{mid:?}");
}

#[test]
fn text_without_fonts_is_skipped() {
    let t = layer(
        LayerRole::QuoteText,
        LayerKind::Text(TextSpec {
            text: "سلام".into(),
            family: "'Nowhere Sans'".into(),
            face: None,
            size_px: 20.0,
            weight: 400,
            color: Rgba8::BLACK,
            align: TextAlign::Center,
            direction: TextDirection::Rtl,
        }),
        Rect::new(0.0, 0.0, 40.0, 20.0),
    );
    let frame = rasterizer()
        .rasterize(&stack(40.0, 20.0, vec![t]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn glyph_ink_stays_in_bounds_and_takes_colour() {
    let g = layer(
        LayerRole::PhoneIcon,
        LayerKind::Glyph {
            glyph: GlyphKind::Globe,
            color: Rgba8::opaque(255, 0, 0),
        },
        Rect::new(10.0, 10.0, 34.0, 34.0),
    );
    let frame = rasterizer()
        .rasterize(&stack(48.0, 48.0, vec![g]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    let mut ink = 0;
    for y in 0..48 {
        for x in 0..48 {
            let px = frame.pixel(x, y).unwrap();
            if px[3] == 0 {
                continue;
            }
            ink += 1;
            assert!((9..=35).contains(&x) && (9..=35).contains(&y), "ink at {x},{y}");
            assert_eq!(px[1], 0);
            assert_eq!(px[2], 0);
        }
    }
    assert!(ink > 20);
}

#[test]
fn ellipse_leaves_corners_empty() {
    let e = layer(
        LayerRole::SocialBadge,
        LayerKind::Fill {
            color: Rgba8::WHITE,
            shape: FillShape::Ellipse,
        },
        Rect::new(0.0, 0.0, 20.0, 20.0),
    );
    let frame = rasterizer()
        .rasterize(&stack(20.0, 20.0, vec![e]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(10, 10), Some([255, 255, 255, 255]));
}

#[test]
fn backdrop_blur_softens_edges_below() {
    let half = fill(Rgba8::BLACK, Rect::new(0.0, 0.0, 10.0, 20.0));
    let mut panel = fill(Rgba8::WHITE.with_alpha(0.0), Rect::new(0.0, 0.0, 20.0, 20.0));
    panel.role = LayerRole::QuotePanel;
    panel.backdrop_blur_px = 2.0;
    let s = stack(
        20.0,
        20.0,
        vec![fill(Rgba8::WHITE, Rect::new(0.0, 0.0, 20.0, 20.0)), half, panel],
    );
    let frame = rasterizer()
        .rasterize(&s, &PreparedAssetStore::default(), ratio1())
        .unwrap();
    let edge = frame.pixel(10, 10).unwrap();
    assert!(edge[0] > 20 && edge[0] < 235, "{edge:?}");
    assert_eq!(frame.pixel(1, 10).unwrap()[0], 0);
}

#[test]
fn shadow_lands_at_offset() {
    let mut sq = fill(Rgba8::WHITE, Rect::new(4.0, 4.0, 8.0, 8.0));
    sq.shadow = Some(Shadow {
        offset: crate::foundation::core::Vec2::new(6.0, 0.0),
        blur_px: 0.0,
        color: Rgba8::BLACK,
    });
    let frame = rasterizer()
        .rasterize(&stack(20.0, 12.0, vec![sq]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    assert_eq!(frame.pixel(6, 6), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(12, 6), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(16, 6), Some([0, 0, 0, 0]));
}

#[test]
fn rejects_bad_pixel_ratio() {
    let err = rasterizer()
        .rasterize(
            &stack(4.0, 4.0, vec![]),
            &PreparedAssetStore::default(),
            RasterOpts {
                pixel_ratio: 0.0,
                cache_bust: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, PostError::Validation(_)));
}

/// Ink pixels as `(x, y)`.
fn ink(frame: &FrameRGBA) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in 0..frame.height {
        for x in 0..frame.width {
            if frame.pixel(x, y).is_some_and(|px| px[3] > 0) {
                out.push((x, y));
            }
        }
    }
    out
}

fn square_text(text: &str, align: TextAlign, direction: TextDirection) -> TextSpec {
    TextSpec {
        text: text.into(),
        family: "\"square\"".into(),
        face: Some(InstalledFace::from_bytes(minimal_ttf("Square Ink")).unwrap()),
        size_px: 20.0,
        weight: 400,
        color: Rgba8::opaque(0, 0, 255),
        align,
        direction,
    }
}

#[test]
fn composed_quote_leaves_ink_inside_quote_region() {
    let mut fonts = FontRegistry::default();
    fonts.append(FontEntry {
        label: "square".into(),
        family: "\"square\"".into(),
        face: Some(InstalledFace::from_bytes(minimal_ttf("Square Ink")).unwrap()),
    });
    let cfg = PostConfig::new_session()
        .with(FieldUpdate::ImageUrl(None))
        .with(FieldUpdate::BackgroundImageUrl(None))
        .with(FieldUpdate::FontFamily("\"square\"".into()))
        .with(FieldUpdate::Quote("AI سلام دنیا".into()));
    let composed = compose(&cfg, &fonts, &PreparedAssetStore::default(), ComposeOpts::default());

    let mut quote = composed.find(LayerRole::QuoteText).unwrap().clone();
    quote.shadow = None;
    let region = composed.regions.quote;
    let only_quote = LayerStack {
        layers: vec![quote],
        ..composed
    };

    let frame = rasterizer()
        .rasterize(&only_quote, &PreparedAssetStore::default(), ratio1())
        .unwrap();
    let ink = ink(&frame);
    assert!(ink.len() > 100, "quote drew {} ink pixels", ink.len());
    for (x, y) in ink {
        let (fx, fy) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
        assert!(
            fx >= region.x0 && fx <= region.x1 && fy >= region.y0 && fy <= region.y1,
            "ink at {x},{y} outside {region:?}"
        );
    }
}

#[test]
fn start_aligned_text_hugs_the_edge_of_its_direction() {
    let bounds = Rect::new(0.0, 0.0, 200.0, 30.0);
    let draw = |direction| {
        let t = layer(
            LayerRole::QuoteText,
            LayerKind::Text(square_text("AI سلام", TextAlign::Start, direction)),
            bounds,
        );
        let frame = rasterizer()
            .rasterize(&stack(200.0, 30.0, vec![t]), &PreparedAssetStore::default(), ratio1())
            .unwrap();
        ink(&frame).into_iter().map(|(x, _)| x).collect::<Vec<u32>>()
    };

    let rtl = draw(TextDirection::Rtl);
    assert!(!rtl.is_empty());
    assert!(rtl.iter().all(|&x| x >= 110), "rtl ink starts at {:?}", rtl.iter().min());
    assert!(rtl.iter().any(|&x| x >= 180));

    let ltr = draw(TextDirection::Ltr);
    assert!(ltr.iter().all(|&x| x < 90), "ltr ink ends at {:?}", ltr.iter().max());
    assert!(ltr.iter().any(|&x| x <= 10));
}

#[test]
fn text_ink_takes_the_text_colour() {
    let t = layer(
        LayerRole::QuoteText,
        LayerKind::Text(square_text("سلام", TextAlign::Center, TextDirection::Rtl)),
        Rect::new(0.0, 0.0, 100.0, 30.0),
    );
    let frame = rasterizer()
        .rasterize(&stack(100.0, 30.0, vec![t]), &PreparedAssetStore::default(), ratio1())
        .unwrap();
    let solid = ink(&frame)
        .into_iter()
        .filter_map(|(x, y)| frame.pixel(x, y))
        .filter(|px| px[3] == 255)
        .collect::<Vec<_>>();
    assert!(solid.len() > 50);
    assert!(solid.iter().all(|px| px[0] == 0 && px[1] == 0 && px[2] == 255));
}
