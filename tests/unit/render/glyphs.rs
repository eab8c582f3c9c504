use super::*;

const ALL: [GlyphKind; 7] = [
    GlyphKind::QuoteMark,
    GlyphKind::Phone,
    GlyphKind::Globe,
    GlyphKind::Facebook,
    GlyphKind::Instagram,
    GlyphKind::Linkedin,
    GlyphKind::Youtube,
];

#[test]
fn every_glyph_parses_and_has_ink() {
    let mut trees = GlyphTrees::default();
    for kind in ALL {
        let tree = trees.tree(kind).unwrap();
        assert_eq!(tree.size().width(), 24.0);
        let px = rasterize_svg_to_premul_rgba8(&tree, 48, 48).unwrap();
        assert!(
            px.chunks_exact(4).any(|p| p[3] > 0),
            "{kind:?} rendered nothing"
        );
    }
}

#[test]
fn trees_are_cached() {
    let mut trees = GlyphTrees::default();
    let a = trees.tree(GlyphKind::Globe).unwrap();
    let b = trees.tree(GlyphKind::Globe).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn raster_params_follow_transform_scale() {
    let tree = GlyphTrees::default().tree(GlyphKind::Phone).unwrap();
    let (w, h, adjust) = svg_raster_params(&tree, Affine::scale(2.0)).unwrap();
    assert_eq!((w, h), (48, 48));
    let p = adjust * kurbo::Point::new(48.0, 48.0);
    assert!((p.x - 48.0).abs() < 1e-9 && (p.y - 48.0).abs() < 1e-9);
    assert!(svg_raster_params(&tree, Affine::scale(1000.0)).is_err());
}

#[test]
fn tint_turns_coverage_into_colour() {
    let mut px = vec![0, 0, 0, 255, 0, 0, 0, 0, 0, 0, 0, 128];
    tint_mask_in_place(&mut px, Rgba8::WHITE);
    assert_eq!(&px[0..4], &[255, 255, 255, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[128, 128, 128, 128]);
}
