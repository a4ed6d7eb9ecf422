//! App icon normalization
//!
//! Xcode stores app icons as "CgBI" PNGs: an extra leading `CgBI` chunk,
//! headerless deflate in IDAT, BGRA channel order and premultiplied alpha.
//! Most decoders outside Apple platforms reject them, so they are rewritten
//! to standard PNG before upload.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use tracing::debug;

use crate::error::{PackageError, Result};
use crate::types::AppIcon;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Largest width or height accepted for repair
const MAX_DIMENSION: usize = 16384;

const COLOR_RGB: u8 = 2;
const COLOR_RGBA: u8 = 6;

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
}

/// Whether the bytes are an Apple CgBI PNG
pub fn is_cgbi(data: &[u8]) -> bool {
    data.len() >= 16 && data[..8] == PNG_SIGNATURE && &data[12..16] == b"CgBI"
}

/// Repair an icon in place if it is a CgBI PNG; standard PNGs pass through
pub fn repair_icon(icon: AppIcon) -> Result<AppIcon> {
    if !is_cgbi(&icon.data) {
        return Ok(icon);
    }

    let data = repair_cgbi(&icon.data)?;
    debug!(
        file = %icon.file_name,
        before = icon.data.len(),
        after = data.len(),
        "repaired CgBI icon"
    );

    Ok(AppIcon {
        file_name: icon.file_name,
        data,
    })
}

/// Convert a CgBI PNG into a standard PNG
pub fn repair_cgbi(data: &[u8]) -> Result<Vec<u8>> {
    let chunks = read_chunks(data)?;

    let ihdr = chunks
        .iter()
        .find(|c| &c.kind == b"IHDR")
        .ok_or_else(|| PackageError::IconRepair("missing IHDR chunk".to_string()))?;
    if ihdr.data.len() != 13 {
        return Err(PackageError::IconRepair("malformed IHDR chunk".to_string()));
    }

    let width = u32::from_be_bytes([ihdr.data[0], ihdr.data[1], ihdr.data[2], ihdr.data[3]]) as usize;
    let height = u32::from_be_bytes([ihdr.data[4], ihdr.data[5], ihdr.data[6], ihdr.data[7]]) as usize;
    let bit_depth = ihdr.data[8];
    let color_type = ihdr.data[9];
    let interlace = ihdr.data[12];

    let bpp = match (color_type, bit_depth, interlace) {
        (COLOR_RGBA, 8, 0) => 4,
        (COLOR_RGB, 8, 0) => 3,
        _ => {
            return Err(PackageError::IconRepair(format!(
                "unsupported layout: color type {color_type}, depth {bit_depth}, interlace {interlace}"
            )))
        }
    };

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PackageError::IconRepair(format!(
            "unsupported dimensions {width}x{height}"
        )));
    }
    let stride = width * bpp;
    let expected = height * (stride + 1);

    let compressed: Vec<u8> = chunks
        .iter()
        .filter(|c| &c.kind == b"IDAT")
        .flat_map(|c| c.data.iter().copied())
        .collect();

    let mut raw = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(expected as u64)
        .read_to_end(&mut raw)
        .map_err(|e| PackageError::IconRepair(format!("inflate failed: {e}")))?;

    if raw.len() < expected {
        return Err(PackageError::IconRepair(format!(
            "image data too short: {} bytes for {}x{}",
            raw.len(),
            width,
            height
        )));
    }

    let mut pixels = unfilter(&raw, width, height, bpp)?;
    for px in pixels.chunks_exact_mut(bpp) {
        px.swap(0, 2);
        if bpp == 4 {
            let alpha = px[3] as u32;
            if alpha > 0 && alpha < 255 {
                for c in &mut px[..3] {
                    *c = ((*c as u32 * 255 + alpha / 2) / alpha).min(255) as u8;
                }
            }
        }
    }

    // Re-encode every scanline with filter type 0
    let mut filtered = Vec::with_capacity(expected);
    for row in pixels.chunks_exact(stride) {
        filtered.push(0);
        filtered.extend_from_slice(row);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&filtered)?;
    let idat = encoder.finish()?;

    let mut out = PNG_SIGNATURE.to_vec();
    let mut wrote_idat = false;
    for chunk in &chunks {
        match &chunk.kind {
            b"CgBI" | b"IEND" => {}
            b"IDAT" => {
                if !wrote_idat {
                    write_chunk(&mut out, b"IDAT", &idat);
                    wrote_idat = true;
                }
            }
            kind => write_chunk(&mut out, kind, chunk.data),
        }
    }
    write_chunk(&mut out, b"IEND", &[]);

    Ok(out)
}

fn read_chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if data.len() < 8 || data[..8] != PNG_SIGNATURE {
        return Err(PackageError::IconRepair("not a PNG file".to_string()));
    }

    let mut chunks = Vec::new();
    let mut at = 8;
    while at + 12 <= data.len() {
        let len = u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) as usize;
        let end = at + 12 + len;
        if end > data.len() {
            return Err(PackageError::IconRepair("truncated chunk".to_string()));
        }
        let kind = [data[at + 4], data[at + 5], data[at + 6], data[at + 7]];
        chunks.push(Chunk {
            kind,
            data: &data[at + 8..at + 8 + len],
        });
        at = end;
        if &kind == b"IEND" {
            break;
        }
    }
    Ok(chunks)
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

/// Undo PNG scanline filters, returning tightly packed rows
fn unfilter(raw: &[u8], width: usize, height: usize, bpp: usize) -> Result<Vec<u8>> {
    let stride = width * bpp;
    let mut out = vec![0u8; stride * height];

    for y in 0..height {
        let filter = raw[y * (stride + 1)];
        let src = &raw[y * (stride + 1) + 1..(y + 1) * (stride + 1)];
        let (done, rest) = out.split_at_mut(y * stride);
        let prev = if y > 0 { &done[(y - 1) * stride..] } else { &[][..] };
        let row = &mut rest[..stride];

        for x in 0..stride {
            let a = if x >= bpp { row[x - bpp] as i16 } else { 0 };
            let b = if y > 0 { prev[x] as i16 } else { 0 };
            let c = if y > 0 && x >= bpp { prev[x - bpp] as i16 } else { 0 };
            let predictor = match filter {
                0 => 0,
                1 => a,
                2 => b,
                3 => (a + b) / 2,
                4 => paeth(a, b, c),
                other => {
                    return Err(PackageError::IconRepair(format!(
                        "unknown filter type {other} on row {y}"
                    )))
                }
            };
            row[x] = src[x].wrapping_add(predictor as u8);
        }
    }

    Ok(out)
}

fn paeth(a: i16, b: i16, c: i16) -> i16 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;

    /// Build a 2x2 RGBA CgBI PNG with premultiplied BGRA pixels
    pub(crate) fn cgbi_fixture() -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&2u32.to_be_bytes());
        ihdr.extend_from_slice(&2u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, COLOR_RGBA, 0, 0, 0]);

        // Row 0 unfiltered, row 1 uses the Up filter (all zero deltas)
        let raw: Vec<u8> = vec![
            0, 0, 0, 255, 255, /**/ 64, 32, 0, 128, //
            2, 0, 0, 0, 0, /**/ 0, 0, 0, 0,
        ];
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let idat = encoder.finish().unwrap();

        let mut out = PNG_SIGNATURE.to_vec();
        write_chunk(&mut out, b"CgBI", &[0x50, 0x00, 0x20, 0x06]);
        write_chunk(&mut out, b"IHDR", &ihdr);
        write_chunk(&mut out, b"IDAT", &idat);
        write_chunk(&mut out, b"IEND", &[]);
        out
    }

    fn decode_idat(png: &[u8]) -> Vec<u8> {
        let chunks = read_chunks(png).unwrap();
        let idat = chunks.iter().find(|c| &c.kind == b"IDAT").unwrap();
        let mut raw = Vec::new();
        flate2::read::ZlibDecoder::new(idat.data)
            .read_to_end(&mut raw)
            .unwrap();
        raw
    }

    #[test]
    fn test_detects_cgbi() {
        assert!(is_cgbi(&cgbi_fixture()));

        let mut plain = PNG_SIGNATURE.to_vec();
        write_chunk(&mut plain, b"IHDR", &[0; 13]);
        assert!(!is_cgbi(&plain));
    }

    #[test]
    fn test_repair_cgbi() {
        let repaired = repair_cgbi(&cgbi_fixture()).unwrap();
        assert!(!is_cgbi(&repaired));

        let kinds: Vec<[u8; 4]> = read_chunks(&repaired).unwrap().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![*b"IHDR", *b"IDAT", *b"IEND"]);

        let raw = decode_idat(&repaired);
        // Row 0: BGRA(0,0,255,255) -> RGBA(255,0,0,255);
        // BGRA(64,32,0,128) premultiplied -> RGBA(0,64,128,128)
        assert_eq!(&raw[..9], &[0, 255, 0, 0, 255, 0, 64, 128, 128]);
        // Row 1 was Up-filtered with zero deltas, so it equals row 0
        assert_eq!(&raw[9..], &raw[..9]);
    }

    #[test]
    fn test_repair_icon_passes_standard_png() {
        let mut plain = PNG_SIGNATURE.to_vec();
        write_chunk(&mut plain, b"IHDR", &[0; 13]);
        let icon = AppIcon {
            file_name: "icon.png".to_string(),
            data: plain.clone(),
        };
        assert_eq!(repair_icon(icon).unwrap().data, plain);
    }

    fn cgbi_with_dimensions(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, COLOR_RGBA, 0, 0, 0]);

        let mut out = PNG_SIGNATURE.to_vec();
        write_chunk(&mut out, b"CgBI", &[0x50, 0x00, 0x20, 0x06]);
        write_chunk(&mut out, b"IHDR", &ihdr);
        write_chunk(&mut out, b"IDAT", &[0; 16]);
        write_chunk(&mut out, b"IEND", &[]);
        out
    }

    #[test]
    fn test_huge_dimensions_are_rejected() {
        let icon = AppIcon {
            file_name: "AppIcon60x60@2x.png".to_string(),
            data: cgbi_with_dimensions(u32::MAX, u32::MAX),
        };
        assert!(matches!(repair_icon(icon), Err(PackageError::IconRepair(_))));
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        let err = repair_cgbi(&cgbi_with_dimensions(0, 2)).unwrap_err();
        assert!(matches!(err, PackageError::IconRepair(_)));
    }

    #[test]
    fn test_paeth_predictor() {
        assert_eq!(paeth(10, 20, 10), 20);
        assert_eq!(paeth(20, 10, 10), 20);
        assert_eq!(paeth(5, 5, 5), 5);
    }
}
