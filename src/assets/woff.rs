//! WOFF and WOFF2 unwrapping.
//!
//! Both containers are decoded back to a plain sfnt (TrueType/OpenType) byte stream before
//! any face validation, so the rest of the crate only ever sees sfnt data. WOFF 1.0 tables
//! are zlib streams; WOFF 2.0 is one brotli stream with optional `glyf`/`loca`/`hmtx`
//! transforms that are reversed here.

use std::io::Read;

use crate::foundation::error::{PostError, PostResult};

const WOFF1_SIGNATURE: [u8; 4] = *b"wOFF";
const WOFF2_SIGNATURE: [u8; 4] = *b"wOF2";
const COLLECTION_FLAVOR: [u8; 4] = *b"ttcf";

const WOFF1_HEADER_LEN: usize = 44;
const WOFF1_ENTRY_LEN: usize = 20;
const WOFF2_HEADER_LEN: usize = 48;

// Upper bound on a decoded font; WOFF headers are untrusted.
const MAX_SFNT_LEN: usize = 64 * 1024 * 1024;

/// Web font container detected from the leading signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WebFontKind {
    Woff1,
    Woff2,
}

impl WebFontKind {
    pub(crate) fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4) {
            Some(sig) if sig == WOFF1_SIGNATURE => Some(Self::Woff1),
            Some(sig) if sig == WOFF2_SIGNATURE => Some(Self::Woff2),
            _ => None,
        }
    }
}

/// Return sfnt bytes: WOFF/WOFF2 input is decoded, anything else is passed through untouched.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub(crate) fn to_sfnt(bytes: Vec<u8>) -> PostResult<Vec<u8>> {
    match WebFontKind::sniff(&bytes) {
        None => Ok(bytes),
        Some(WebFontKind::Woff1) => {
            let sfnt = decode_woff1(&bytes)?;
            tracing::debug!(sfnt_len = sfnt.len(), "unwrapped woff font");
            Ok(sfnt)
        }
        Some(WebFontKind::Woff2) => {
            let sfnt = decode_woff2(&bytes)?;
            tracing::debug!(sfnt_len = sfnt.len(), "unwrapped woff2 font");
            Ok(sfnt)
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn bytes(&mut self, n: usize) -> PostResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| PostError::font("truncated web font data"))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> PostResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> PostResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> PostResult<i16> {
        let b = self.bytes(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> PostResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn tag(&mut self) -> PostResult<[u8; 4]> {
        let b = self.bytes(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// WOFF2 `UIntBase128`: at most five bytes, no leading zero byte, fits in u32.
    fn base128(&mut self) -> PostResult<u32> {
        let mut value = 0u32;
        for i in 0..5 {
            let byte = self.u8()?;
            if i == 0 && byte == 0x80 {
                return Err(PostError::font("woff2 base128 value has a leading zero"));
            }
            if value & 0xFE00_0000 != 0 {
                return Err(PostError::font("woff2 base128 value overflows"));
            }
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(PostError::font("woff2 base128 value is too long"))
    }

    /// WOFF2 `255UInt16`.
    fn u255_16(&mut self) -> PostResult<u16> {
        const WORD_CODE: u8 = 253;
        const ONE_MORE_BYTE_CODE2: u8 = 254;
        const ONE_MORE_BYTE_CODE1: u8 = 255;
        const LOWEST_U_CODE: u16 = 253;
        match self.u8()? {
            WORD_CODE => self.u16(),
            ONE_MORE_BYTE_CODE1 => Ok(u16::from(self.u8()?) + LOWEST_U_CODE),
            ONE_MORE_BYTE_CODE2 => Ok(u16::from(self.u8()?) + LOWEST_U_CODE * 2),
            code => Ok(u16::from(code)),
        }
    }
}

fn slice(data: &[u8], offset: usize, len: usize) -> PostResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| PostError::font("web font table lies outside the file"))
}

fn check_sfnt_len(len: usize) -> PostResult<()> {
    if len > MAX_SFNT_LEN {
        return Err(PostError::font(format!(
            "decoded font would be {len} bytes, limit is {MAX_SFNT_LEN}"
        )));
    }
    Ok(())
}

fn decode_woff1(data: &[u8]) -> PostResult<Vec<u8>> {
    let mut r = Reader::new(data);
    let _signature = r.tag()?;
    let flavor = r.tag()?;
    let length = r.u32()? as usize;
    let num_tables = r.u16()?;
    let _reserved = r.u16()?;
    let total_sfnt_size = r.u32()? as usize;
    if flavor == COLLECTION_FLAVOR {
        return Err(PostError::font("woff font collections are not supported"));
    }
    if length != data.len() {
        return Err(PostError::font(format!(
            "woff header length {length} does not match file size {}",
            data.len()
        )));
    }
    check_sfnt_len(total_sfnt_size)?;

    let mut tables = Vec::with_capacity(usize::from(num_tables));
    for i in 0..usize::from(num_tables) {
        let mut e = Reader::at(data, WOFF1_HEADER_LEN + i * WOFF1_ENTRY_LEN);
        let tag = e.tag()?;
        let offset = e.u32()? as usize;
        let comp_len = e.u32()? as usize;
        let orig_len = e.u32()? as usize;
        check_sfnt_len(orig_len)?;

        let stored = slice(data, offset, comp_len)?;
        let table = if comp_len == orig_len {
            stored.to_vec()
        } else if comp_len < orig_len {
            let mut out = Vec::with_capacity(orig_len);
            flate2::read::ZlibDecoder::new(stored)
                .take(orig_len as u64 + 1)
                .read_to_end(&mut out)
                .map_err(|e| PostError::font(format!("woff table inflate failed: {e}")))?;
            if out.len() != orig_len {
                return Err(PostError::font(format!(
                    "woff table '{}' inflated to {} bytes, expected {orig_len}",
                    String::from_utf8_lossy(&tag),
                    out.len()
                )));
            }
            out
        } else {
            return Err(PostError::font("woff table is larger compressed than uncompressed"));
        };
        tables.push((tag, table));
    }
    Ok(write_sfnt(flavor, tables))
}

const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

struct Woff2Entry {
    tag: [u8; 4],
    transform: u8,
    orig_len: usize,
    stored_len: usize,
}

impl Woff2Entry {
    /// `glyf`/`loca` use version 0 for the glyph transform and 3 for none; every other
    /// table uses 0 for none.
    fn is_transformed(&self) -> bool {
        if &self.tag == b"glyf" || &self.tag == b"loca" {
            self.transform != 3
        } else {
            self.transform != 0
        }
    }
}

fn decode_woff2(data: &[u8]) -> PostResult<Vec<u8>> {
    let mut r = Reader::new(data);
    let _signature = r.tag()?;
    let flavor = r.tag()?;
    let length = r.u32()? as usize;
    let num_tables = r.u16()?;
    let _reserved = r.u16()?;
    let total_sfnt_size = r.u32()? as usize;
    let total_compressed = r.u32()? as usize;
    if flavor == COLLECTION_FLAVOR {
        return Err(PostError::font("woff2 font collections are not supported"));
    }
    if length != data.len() {
        return Err(PostError::font(format!(
            "woff2 header length {length} does not match file size {}",
            data.len()
        )));
    }
    check_sfnt_len(total_sfnt_size)?;
    r.pos = WOFF2_HEADER_LEN;

    let mut entries = Vec::with_capacity(usize::from(num_tables));
    for _ in 0..num_tables {
        let flags = r.u8()?;
        let tag = match flags & 0x3F {
            0x3F => r.tag()?,
            idx => *KNOWN_TAGS[usize::from(idx)],
        };
        let mut entry = Woff2Entry {
            tag,
            transform: flags >> 6,
            orig_len: r.base128()? as usize,
            stored_len: 0,
        };
        entry.stored_len = if entry.is_transformed() {
            r.base128()? as usize
        } else {
            entry.orig_len
        };
        check_sfnt_len(entry.orig_len)?;
        entries.push(entry);
    }

    let compressed = slice(data, r.pos, total_compressed)?;
    let expected: usize = entries.iter().map(|e| e.stored_len).sum();
    check_sfnt_len(expected)?;
    let mut stream = Vec::with_capacity(expected);
    brotli_decompressor::Decompressor::new(compressed, 4096)
        .take(expected as u64 + 1)
        .read_to_end(&mut stream)
        .map_err(|e| PostError::font(format!("woff2 brotli stream is corrupt: {e}")))?;
    if stream.len() != expected {
        return Err(PostError::font(format!(
            "woff2 stream holds {} bytes, table directory expects {expected}",
            stream.len()
        )));
    }

    let mut raw: Vec<(&Woff2Entry, &[u8])> = Vec::with_capacity(entries.len());
    let mut offset = 0;
    for entry in &entries {
        raw.push((entry, &stream[offset..offset + entry.stored_len]));
        offset += entry.stored_len;
    }
    let find = |tag: &[u8; 4]| raw.iter().find(|(e, _)| &e.tag == tag);

    let mut glyf_loca: Option<(Vec<u8>, Vec<u8>, Vec<i16>)> = None;
    if let Some((glyf, glyf_data)) = find(b"glyf") {
        if glyf.is_transformed() {
            glyf_loca = Some(reconstruct_glyf(glyf_data)?);
        }
    }

    let mut tables = Vec::with_capacity(raw.len());
    for (entry, stored) in &raw {
        let table = match (&entry.tag, entry.is_transformed()) {
            (_, false) => stored.to_vec(),
            (b"glyf", true) => glyf_loca.as_ref().map(|g| g.0.clone()).unwrap_or_default(),
            (b"loca", true) => glyf_loca
                .as_ref()
                .map(|g| g.1.clone())
                .ok_or_else(|| PostError::font("woff2 transformed loca without glyf"))?,
            (b"hmtx", true) => {
                let x_mins = glyf_loca
                    .as_ref()
                    .map(|g| g.2.as_slice())
                    .ok_or_else(|| PostError::font("woff2 transformed hmtx without glyf"))?;
                let num_h_metrics = find(b"hhea")
                    .map(|(_, d)| Reader::at(d, 34).u16())
                    .transpose()?
                    .ok_or_else(|| PostError::font("woff2 font has no hhea table"))?;
                reconstruct_hmtx(stored, num_h_metrics, x_mins)?
            }
            (tag, true) => {
                return Err(PostError::font(format!(
                    "unknown woff2 transform on table '{}'",
                    String::from_utf8_lossy(tag)
                )));
            }
        };
        if table.len() != entry.orig_len && !(&entry.tag == b"glyf" || &entry.tag == b"loca") {
            return Err(PostError::font(format!(
                "woff2 table '{}' decoded to {} bytes, expected {}",
                String::from_utf8_lossy(&entry.tag),
                table.len(),
                entry.orig_len
            )));
        }
        tables.push((entry.tag, table));
    }
    Ok(write_sfnt(flavor, tables))
}

// Simple glyph point flags.
const ON_CURVE_POINT: u8 = 0x01;
const OVERLAP_SIMPLE: u8 = 0x40;

// Composite glyph component flags.
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

/// Rebuild `glyf` and `loca` from the transformed glyph streams.
///
/// Returns the two tables plus each glyph's xMin, which a transformed `hmtx` may need.
fn reconstruct_glyf(data: &[u8]) -> PostResult<(Vec<u8>, Vec<u8>, Vec<i16>)> {
    let mut h = Reader::new(data);
    let _reserved = h.u16()?;
    let option_flags = h.u16()?;
    let num_glyphs = usize::from(h.u16()?);
    let index_format = h.u16()?;
    let mut sizes = [0usize; 7];
    for size in &mut sizes {
        *size = h.u32()? as usize;
    }

    let mut offset = h.pos;
    let mut streams = Vec::with_capacity(sizes.len());
    for size in sizes {
        streams.push(Reader::new(slice(data, offset, size)?));
        offset += size;
    }
    let mut streams = streams.into_iter();
    let (
        Some(mut n_contours),
        Some(mut n_points),
        Some(mut flags),
        Some(mut glyphs),
        Some(mut composites),
        Some(bbox_stream),
        Some(mut instructions),
    ) = (
        streams.next(),
        streams.next(),
        streams.next(),
        streams.next(),
        streams.next(),
        streams.next(),
        streams.next(),
    )
    else {
        return Err(PostError::font("woff2 glyf header is incomplete"));
    };

    let bitmap_len = num_glyphs.div_ceil(32) * 4;
    let bbox_bitmap = slice(bbox_stream.data, 0, bitmap_len)?;
    let mut bboxes = Reader::at(bbox_stream.data, bitmap_len);
    let has_bbox = |i: usize| bbox_bitmap[i / 8] & (0x80 >> (i % 8)) != 0;

    let overlap_bitmap = if option_flags & 1 != 0 {
        Some(slice(data, offset, num_glyphs.div_ceil(8))?)
    } else {
        None
    };
    let overlaps = |i: usize| overlap_bitmap.is_some_and(|b| b[i / 8] & (0x80 >> (i % 8)) != 0);

    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(num_glyphs + 1);
    let mut x_mins = Vec::with_capacity(num_glyphs);

    for i in 0..num_glyphs {
        offsets.push(glyf.len());
        let contours = n_contours.i16()?;
        match contours {
            0 => {
                if has_bbox(i) {
                    return Err(PostError::font("woff2 empty glyph carries a bounding box"));
                }
                x_mins.push(0);
            }
            -1 => {
                if !has_bbox(i) {
                    return Err(PostError::font("woff2 composite glyph has no bounding box"));
                }
                let bbox = [bboxes.i16()?, bboxes.i16()?, bboxes.i16()?, bboxes.i16()?];
                x_mins.push(bbox[0]);

                let start = composites.pos;
                let mut has_instructions = false;
                loop {
                    let component_flags = composites.u16()?;
                    let _glyph_index = composites.u16()?;
                    let mut skip = if component_flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
                    if component_flags & WE_HAVE_A_SCALE != 0 {
                        skip += 2;
                    } else if component_flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                        skip += 4;
                    } else if component_flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                        skip += 8;
                    }
                    composites.bytes(skip)?;
                    has_instructions |= component_flags & WE_HAVE_INSTRUCTIONS != 0;
                    if component_flags & MORE_COMPONENTS == 0 {
                        break;
                    }
                }
                let components = &composites.data[start..composites.pos];

                glyf.extend_from_slice(&(-1i16).to_be_bytes());
                for v in bbox {
                    glyf.extend_from_slice(&v.to_be_bytes());
                }
                glyf.extend_from_slice(components);
                if has_instructions {
                    let len = glyphs.u255_16()?;
                    glyf.extend_from_slice(&len.to_be_bytes());
                    glyf.extend_from_slice(instructions.bytes(usize::from(len))?);
                }
            }
            n if n > 0 => {
                let mut end_points = Vec::with_capacity(n as usize);
                let mut total = 0usize;
                for _ in 0..n {
                    total += usize::from(n_points.u255_16()?);
                    let end = total
                        .checked_sub(1)
                        .and_then(|end| u16::try_from(end).ok())
                        .ok_or_else(|| PostError::font("woff2 glyph point count is out of range"))?;
                    end_points.push(end);
                }

                let mut points = Vec::with_capacity(total);
                let (mut x, mut y) = (0i32, 0i32);
                for _ in 0..total {
                    let flag = flags.u8()?;
                    let (dx, dy) = decode_triplet(flag & 0x7F, &mut glyphs)?;
                    x += dx;
                    y += dy;
                    let px = i16::try_from(x).map_err(|_| PostError::font("woff2 point out of range"))?;
                    let py = i16::try_from(y).map_err(|_| PostError::font("woff2 point out of range"))?;
                    points.push((px, py, flag & 0x80 == 0));
                }

                let bbox = if has_bbox(i) {
                    [bboxes.i16()?, bboxes.i16()?, bboxes.i16()?, bboxes.i16()?]
                } else {
                    let (mut x0, mut y0, mut x1, mut y1) = (i16::MAX, i16::MAX, i16::MIN, i16::MIN);
                    for (px, py, _) in &points {
                        x0 = x0.min(*px);
                        y0 = y0.min(*py);
                        x1 = x1.max(*px);
                        y1 = y1.max(*py);
                    }
                    [x0, y0, x1, y1]
                };
                x_mins.push(bbox[0]);

                let instruction_len = glyphs.u255_16()?;

                glyf.extend_from_slice(&n.to_be_bytes());
                for v in bbox {
                    glyf.extend_from_slice(&v.to_be_bytes());
                }
                for end in end_points {
                    glyf.extend_from_slice(&end.to_be_bytes());
                }
                glyf.extend_from_slice(&instruction_len.to_be_bytes());
                glyf.extend_from_slice(instructions.bytes(usize::from(instruction_len))?);
                for (idx, (_, _, on_curve)) in points.iter().enumerate() {
                    let mut flag = if *on_curve { ON_CURVE_POINT } else { 0 };
                    if idx == 0 && overlaps(i) {
                        flag |= OVERLAP_SIMPLE;
                    }
                    glyf.push(flag);
                }
                let mut prev = 0i16;
                for (px, _, _) in &points {
                    glyf.extend_from_slice(&px.wrapping_sub(prev).to_be_bytes());
                    prev = *px;
                }
                prev = 0;
                for (_, py, _) in &points {
                    glyf.extend_from_slice(&py.wrapping_sub(prev).to_be_bytes());
                    prev = *py;
                }
            }
            n => {
                return Err(PostError::font(format!("woff2 glyph has {n} contours")));
            }
        }
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    offsets.push(glyf.len());

    let mut loca = Vec::with_capacity(offsets.len() * 4);
    for off in offsets {
        if index_format == 0 {
            let half = u16::try_from(off / 2)
                .map_err(|_| PostError::font("woff2 glyf is too large for a short loca"))?;
            loca.extend_from_slice(&half.to_be_bytes());
        } else {
            loca.extend_from_slice(&(off as u32).to_be_bytes());
        }
    }
    Ok((glyf, loca, x_mins))
}

/// Decode one point delta from the glyph stream for a 7-bit triplet flag.
fn decode_triplet(flag: u8, glyphs: &mut Reader<'_>) -> PostResult<(i32, i32)> {
    let sign = |bit: u8, v: i32| if bit & 1 != 0 { v } else { -v };
    let flag_i = i32::from(flag);
    Ok(match flag {
        0..=9 => {
            let b0 = i32::from(glyphs.u8()?);
            (0, sign(flag, ((flag_i & 14) << 7) + b0))
        }
        10..=19 => {
            let b0 = i32::from(glyphs.u8()?);
            (sign(flag, (((flag_i - 10) & 14) << 7) + b0), 0)
        }
        20..=83 => {
            let b0 = flag_i - 20;
            let b1 = i32::from(glyphs.u8()?);
            (
                sign(flag, 1 + (b0 & 0x30) + (b1 >> 4)),
                sign(flag >> 1, 1 + ((b0 & 0x0C) << 2) + (b1 & 0x0F)),
            )
        }
        84..=119 => {
            let b0 = flag_i - 84;
            let b1 = i32::from(glyphs.u8()?);
            let b2 = i32::from(glyphs.u8()?);
            (
                sign(flag, 1 + ((b0 / 12) << 8) + b1),
                sign(flag >> 1, 1 + (((b0 % 12) >> 2) << 8) + b2),
            )
        }
        120..=123 => {
            let b1 = i32::from(glyphs.u8()?);
            let b2 = i32::from(glyphs.u8()?);
            let b3 = i32::from(glyphs.u8()?);
            (sign(flag, (b1 << 4) + (b2 >> 4)), sign(flag >> 1, ((b2 & 0x0F) << 8) + b3))
        }
        _ => {
            let b = glyphs.bytes(4)?;
            (
                sign(flag, (i32::from(b[0]) << 8) + i32::from(b[1])),
                sign(flag >> 1, (i32::from(b[2]) << 8) + i32::from(b[3])),
            )
        }
    })
}

/// Rebuild `hmtx`, filling elided left side bearings from glyph xMin values.
fn reconstruct_hmtx(data: &[u8], num_h_metrics: u16, x_mins: &[i16]) -> PostResult<Vec<u8>> {
    let num_h_metrics = usize::from(num_h_metrics);
    let num_glyphs = x_mins.len();
    if num_h_metrics == 0 || num_h_metrics > num_glyphs {
        return Err(PostError::font("woff2 hhea numberOfHMetrics is out of range"));
    }
    let mut r = Reader::new(data);
    let flags = r.u8()?;
    let mut advances = Vec::with_capacity(num_h_metrics);
    for _ in 0..num_h_metrics {
        advances.push(r.u16()?);
    }
    let mut lsbs = Vec::with_capacity(num_glyphs);
    for &x_min in &x_mins[..num_h_metrics] {
        lsbs.push(if flags & 1 == 0 { r.i16()? } else { x_min });
    }
    for &x_min in &x_mins[num_h_metrics..] {
        lsbs.push(if flags & 2 == 0 { r.i16()? } else { x_min });
    }

    let mut out = Vec::with_capacity(num_h_metrics * 4 + (num_glyphs - num_h_metrics) * 2);
    for (i, lsb) in lsbs.iter().enumerate() {
        if let Some(advance) = advances.get(i) {
            out.extend_from_slice(&advance.to_be_bytes());
        }
        out.extend_from_slice(&lsb.to_be_bytes());
    }
    Ok(out)
}

/// Assemble an sfnt from `(tag, data)` tables: sorted directory, checksums, padding and
/// `head.checkSumAdjustment`.
pub(crate) fn write_sfnt(flavor: [u8; 4], mut tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by(|a, b| a.0.cmp(&b.0));
    let num_tables = tables.len() as u32;
    let entry_selector = num_tables.max(1).ilog2();
    let search_range = (1u32 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut out = Vec::new();
    out.extend_from_slice(&flavor);
    for field in [num_tables, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&(field as u16).to_be_bytes());
    }

    let mut offset = 12 + 16 * tables.len();
    let mut head_offset = None;
    for (tag, data) in &mut tables {
        if tag == b"head" && data.len() >= 12 {
            data[8..12].fill(0);
            head_offset = Some(offset);
        }
        out.extend_from_slice(tag);
        out.extend_from_slice(&checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        out.resize(out.len().next_multiple_of(4), 0);
    }
    if let Some(at) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&out));
        out[at + 8..at + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    out
}

pub(crate) fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/woff.rs"]
mod tests;
