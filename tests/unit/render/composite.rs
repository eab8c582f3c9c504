use super::*;

#[test]
fn over_respects_opacity() {
    let mut dst = vec![0, 0, 255, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 0, 0, 255], 1.0).unwrap();
    assert_eq!(dst, vec![255, 0, 0, 255]);

    let mut dst = vec![0, 0, 255, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 0, 0, 255], 0.5).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);

    let mut dst = vec![0, 0, 255, 255];
    premul_over_in_place_opacity(&mut dst, &[255, 0, 0, 255], 0.0).unwrap();
    assert_eq!(dst, vec![0, 0, 255, 255]);
}

#[test]
fn over_rejects_mismatched_buffers() {
    let mut dst = vec![0; 8];
    assert!(premul_over_in_place_opacity(&mut dst, &[0; 4], 1.0).is_err());
}

#[test]
fn clip_zeroes_outside() {
    let mut data = vec![255u8; 3 * 3 * 4];
    let keep = PixelRect {
        x0: 1,
        y0: 1,
        x1: 2,
        y1: 2,
    };
    clip_to_rect(&mut data, 3, 3, keep);
    for (i, px) in data.chunks_exact(4).enumerate() {
        let inside = i == 4;
        assert_eq!(px[3] == 255, inside, "pixel {i}");
    }
}

#[test]
fn bbox_and_shadow() {
    let mut data = vec![0u8; 4 * 4 * 4];
    // one opaque white pixel at (1, 1)
    let i = (4 + 1) * 4;
    data[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
    assert_eq!(
        alpha_bbox(&data, 4, 4),
        Some(PixelRect {
            x0: 1,
            y0: 1,
            x1: 2,
            y1: 2
        })
    );
    assert_eq!(alpha_bbox(&[0u8; 16], 2, 2), None);

    let shadow = shadow_mask(&data, 4, 4, Rgba8::BLACK.with_alpha(0.5), 2, 1);
    let j = (2 * 4 + 3) * 4;
    assert_eq!(&shadow[j..j + 4], &[0, 0, 0, 128]);
    assert_eq!(shadow[i + 3], 0);

    // moved off the surface entirely
    let gone = shadow_mask(&data, 4, 4, Rgba8::BLACK, 10, 0);
    assert!(gone.iter().all(|&b| b == 0));
}
