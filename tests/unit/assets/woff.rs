use std::io::Write;

use super::*;
use crate::foundation::testfont::{minimal_ttf, woff1};

fn tables_of(sfnt: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    let n = usize::from(u16::from_be_bytes([sfnt[4], sfnt[5]]));
    (0..n)
        .map(|i| {
            let rec = &sfnt[12 + 16 * i..28 + 16 * i];
            let off = u32::from_be_bytes(rec[8..12].try_into().unwrap()) as usize;
            let len = u32::from_be_bytes(rec[12..16].try_into().unwrap()) as usize;
            (rec[..4].try_into().unwrap(), sfnt[off..off + len].to_vec())
        })
        .collect()
}

fn table<'a>(tables: &'a [([u8; 4], Vec<u8>)], tag: &[u8; 4]) -> &'a [u8] {
    &tables.iter().find(|(t, _)| t == tag).unwrap().1
}

/// Tables compare equal apart from `head.checkSumAdjustment`.
fn assert_same_tables(a: &[u8], b: &[u8]) {
    let (mut ta, mut tb) = (tables_of(a), tables_of(b));
    for t in ta.iter_mut().chain(tb.iter_mut()) {
        if &t.0 == b"head" {
            t.1[8..12].fill(0);
        }
    }
    assert_eq!(ta, tb);
}

/// WOFF 1.0 container; tables named in `deflate` are zlib-compressed.
fn woff1_with(sfnt: &[u8], deflate: &[&[u8; 4]]) -> Vec<u8> {
    let tables = tables_of(sfnt);
    let dir_end = 44 + 20 * tables.len();
    let (mut dir, mut body) = (Vec::new(), Vec::new());
    for (tag, data) in &tables {
        let stored = if deflate.contains(&tag) {
            let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        } else {
            data.clone()
        };
        assert!(stored.len() <= data.len());
        dir.extend_from_slice(tag);
        dir.extend_from_slice(&((dir_end + body.len()) as u32).to_be_bytes());
        dir.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        dir.extend_from_slice(&(data.len() as u32).to_be_bytes());
        dir.extend_from_slice(&checksum(data).to_be_bytes());
        body.extend_from_slice(&stored);
        body.resize(body.len().next_multiple_of(4), 0);
    }
    let mut out = b"wOFF".to_vec();
    out.extend_from_slice(&sfnt[..4]);
    out.extend_from_slice(&((dir_end + body.len()) as u32).to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0; 2]);
    out.extend_from_slice(&(sfnt.len() as u32).to_be_bytes());
    out.extend_from_slice(&[0, 1, 0, 0]);
    out.extend_from_slice(&[0; 20]);
    out.extend_from_slice(&dir);
    out.extend_from_slice(&body);
    out
}

/// Brotli stream made of one stored meta-block.
fn brotli_stored(data: &[u8]) -> Vec<u8> {
    assert!(!data.is_empty() && data.len() <= 1 << 16);
    // WBITS=16, ISLAST=0, MNIBBLES=4, MLEN-1, ISUNCOMPRESSED=1
    let header = (((data.len() - 1) as u32) << 4) | (1 << 20);
    let mut out = header.to_le_bytes()[..3].to_vec();
    out.extend_from_slice(data);
    // ISLAST=1, ISLASTEMPTY=1
    out.push(0x03);
    out
}

fn base128(mut v: u32, out: &mut Vec<u8>) {
    let mut bytes = vec![(v & 0x7F) as u8];
    v >>= 7;
    while v > 0 {
        bytes.push((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
    bytes.reverse();
    out.extend(bytes);
}

struct W2Table {
    tag: [u8; 4],
    version: u8,
    orig_len: usize,
    stored: Vec<u8>,
}

impl W2Table {
    fn plain(tag: [u8; 4], data: Vec<u8>) -> Self {
        let version = if &tag == b"glyf" || &tag == b"loca" { 3 } else { 0 };
        Self {
            tag,
            version,
            orig_len: data.len(),
            stored: data,
        }
    }
}

fn woff2(flavor: [u8; 4], tables: &[W2Table]) -> Vec<u8> {
    let mut dir = Vec::new();
    let mut stream = Vec::new();
    for t in tables {
        let known = KNOWN_TAGS.iter().position(|k| **k == t.tag);
        dir.push(known.map_or(0x3F, |i| i as u8) | (t.version << 6));
        if known.is_none() {
            dir.extend_from_slice(&t.tag);
        }
        base128(t.orig_len as u32, &mut dir);
        let entry = Woff2Entry {
            tag: t.tag,
            transform: t.version,
            orig_len: 0,
            stored_len: 0,
        };
        if entry.is_transformed() {
            base128(t.stored.len() as u32, &mut dir);
        }
        stream.extend_from_slice(&t.stored);
    }
    let compressed = brotli_stored(&stream);
    let total = WOFF2_HEADER_LEN + dir.len() + compressed.len();

    let mut out = b"wOF2".to_vec();
    out.extend_from_slice(&flavor);
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0; 2]);
    out.extend_from_slice(&(stream.len() as u32).to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&[0, 1, 0, 0]);
    out.extend_from_slice(&[0; 20]);
    out.extend_from_slice(&dir);
    out.extend_from_slice(&compressed);
    out
}

/// Transformed `glyf` holding the test font's three glyphs (empty, square, empty).
fn transformed_square_glyf() -> Vec<u8> {
    let n_contours: Vec<u8> = [0i16, 1, 0].iter().flat_map(|v| v.to_be_bytes()).collect();
    let n_points = vec![4u8];
    // (+50, 0) (+400, 0) (0, +700) (-400, 0), all on-curve.
    let flags = vec![11u8, 13, 5, 12];
    let glyphs = vec![50u8, 144, 188, 144, 0];
    let bbox = vec![0u8; 4];
    let streams = [n_contours, n_points, flags, glyphs, Vec::new(), bbox, Vec::new()];

    let mut t = Vec::new();
    for v in [0u16, 0, 3, 1] {
        // reserved optionFlags numGlyphs indexFormat
        t.extend_from_slice(&v.to_be_bytes());
    }
    for s in &streams {
        t.extend_from_slice(&(s.len() as u32).to_be_bytes());
    }
    for s in streams {
        t.extend_from_slice(&s);
    }
    t
}

#[test]
fn plain_sfnt_passes_through_untouched() {
    let ttf = minimal_ttf("Plain");
    assert_eq!(WebFontKind::sniff(&ttf), None);
    assert_eq!(to_sfnt(ttf.clone()).unwrap(), ttf);
}

#[test]
fn stored_woff1_unwraps_to_the_same_tables() {
    let ttf = minimal_ttf("Jameel");
    let woff = woff1(&ttf);
    assert_eq!(WebFontKind::sniff(&woff), Some(WebFontKind::Woff1));
    assert_same_tables(&to_sfnt(woff).unwrap(), &ttf);
}

#[test]
fn deflated_woff1_tables_are_inflated() {
    let ttf = minimal_ttf("Jameel");
    let woff = woff1_with(&ttf, &[b"cmap", b"name"]);
    assert!(woff.len() < ttf.len());
    assert_same_tables(&to_sfnt(woff).unwrap(), &ttf);
}

#[test]
fn woff1_with_wrong_length_or_truncated_directory_is_a_font_error() {
    let mut woff = woff1(&minimal_ttf("Short"));
    woff.truncate(60);
    assert!(matches!(to_sfnt(woff.clone()), Err(PostError::Font(_))));

    woff[8..12].copy_from_slice(&60u32.to_be_bytes());
    let err = to_sfnt(woff).unwrap_err();
    assert!(matches!(err, PostError::Font(_)), "{err}");
}

#[test]
fn woff1_corrupt_zlib_is_a_font_error() {
    let ttf = minimal_ttf("Broken");
    let mut woff = woff1_with(&ttf, &[b"cmap"]);
    // cmap is the first directory entry; stomp its zlib payload.
    let off = u32::from_be_bytes(woff[48..52].try_into().unwrap()) as usize;
    woff[off + 2..off + 12].fill(0xFF);
    assert!(matches!(to_sfnt(woff), Err(PostError::Font(_))));
}

#[test]
fn woff2_without_transforms_unwraps_to_the_same_tables() {
    let ttf = minimal_ttf("Noori");
    let tables: Vec<W2Table> = tables_of(&ttf)
        .into_iter()
        .map(|(tag, data)| W2Table::plain(tag, data))
        .collect();
    let woff = woff2(*b"\0\x01\0\0", &tables);
    assert_eq!(WebFontKind::sniff(&woff), Some(WebFontKind::Woff2));
    assert_same_tables(&to_sfnt(woff).unwrap(), &ttf);
}

#[test]
fn woff2_glyf_loca_and_hmtx_transforms_are_reversed() {
    let ttf = minimal_ttf("Noori");
    let original = tables_of(&ttf);
    let mut tables = Vec::new();
    for (tag, data) in &original {
        tables.push(match tag {
            b"glyf" => W2Table {
                tag: *tag,
                version: 0,
                orig_len: data.len(),
                stored: transformed_square_glyf(),
            },
            b"loca" => W2Table {
                tag: *tag,
                version: 0,
                orig_len: data.len(),
                stored: Vec::new(),
            },
            // Advances only; every side bearing equals the glyph's xMin.
            b"hmtx" => W2Table {
                tag: *tag,
                version: 1,
                orig_len: data.len(),
                stored: vec![0x03, 0x01, 0xF4, 0x01, 0xF4, 0x01, 0xF4],
            },
            _ => W2Table::plain(*tag, data.clone()),
        });
    }

    let sfnt = to_sfnt(woff2(*b"\0\x01\0\0", &tables)).unwrap();
    let decoded = tables_of(&sfnt);

    let glyf = table(&decoded, b"glyf");
    let square = table(&original, b"glyf");
    assert_eq!(&glyf[..square.len()], square);
    assert_eq!(glyf.len(), square.len().next_multiple_of(4));

    let loca = table(&decoded, b"loca");
    let ends: Vec<u32> = loca
        .chunks(4)
        .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(ends, vec![0, 0, glyf.len() as u32, glyf.len() as u32]);

    assert_eq!(table(&decoded, b"hmtx"), table(&original, b"hmtx"));
    assert_eq!(table(&decoded, b"cmap"), table(&original, b"cmap"));
}

#[test]
fn woff2_collections_and_bad_streams_are_font_errors() {
    let ttf = minimal_ttf("Noori");
    let tables: Vec<W2Table> = tables_of(&ttf)
        .into_iter()
        .map(|(tag, data)| W2Table::plain(tag, data))
        .collect();

    let err = to_sfnt(woff2(*b"ttcf", &tables)).unwrap_err();
    assert!(err.to_string().contains("collections"), "{err}");

    // Cut the brotli stream short and patch both lengths so only the stream is wrong.
    let mut woff = woff2(*b"\0\x01\0\0", &tables);
    let cut = 200;
    woff.truncate(woff.len() - cut);
    let total = woff.len() as u32;
    let compressed = u32::from_be_bytes(woff[20..24].try_into().unwrap()) - cut as u32;
    woff[8..12].copy_from_slice(&total.to_be_bytes());
    woff[20..24].copy_from_slice(&compressed.to_be_bytes());
    assert!(matches!(to_sfnt(woff), Err(PostError::Font(_))));
}

#[test]
fn variable_length_integers() {
    let mut r = Reader::new(&[0x3F, 0x81, 0x00, 0x80]);
    assert_eq!(r.base128().unwrap(), 63);
    assert_eq!(r.base128().unwrap(), 128);
    assert!(r.base128().is_err(), "leading zero byte");

    let mut r = Reader::new(&[200, 255, 10, 254, 1, 253, 0x12, 0x34]);
    assert_eq!(r.u255_16().unwrap(), 200);
    assert_eq!(r.u255_16().unwrap(), 263);
    assert_eq!(r.u255_16().unwrap(), 507);
    assert_eq!(r.u255_16().unwrap(), 0x1234);
}

#[test]
fn written_sfnt_carries_a_whole_font_checksum_adjustment() {
    let ttf = minimal_ttf("Sum");
    let rebuilt = write_sfnt(*b"\0\x01\0\0", tables_of(&ttf));
    assert_eq!(checksum(&rebuilt), 0xB1B0_AFBA);
    assert_same_tables(&rebuilt, &ttf);
}
