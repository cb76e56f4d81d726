//! Minimal indexed PNG encoder.
//!
//! Writes colour type 3: one byte per pixel plus a `PLTE`/`tRNS` pair.
//! Bucketed rasters never exceed 256 colours.
//!
//! Scanlines use filter type 0 and are zlib-compressed with `flate2`; chunk
//! CRCs come from `crc32fast`.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{RenderError, RenderResult};

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const MAX_PALETTE_SIZE: usize = 256;

const COLOR_TYPE_INDEXED: u8 = 3;

/// Encode an indexed image. `palette` entries are RGBA; alpha goes to `tRNS`.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> RenderResult<Vec<u8>> {
    check_size(indices.len(), width, height)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::Encode(format!(
            "palette must have 1..={} entries, got {}",
            MAX_PALETTE_SIZE,
            palette.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
        return Err(RenderError::Encode(format!(
            "palette index {} out of range ({} entries)",
            bad,
            palette.len()
        )));
    }

    let mut png = Vec::with_capacity(indices.len() / 4 + 1024);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_INDEXED));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width, height)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_size(len: usize, width: usize, height: usize) -> RenderResult<()> {
    if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(RenderError::InvalidSize { width, height });
    }
    if len != width * height {
        return Err(RenderError::Encode(format!(
            "buffer has {} pixels, expected {} for {}x{}",
            len,
            width * height,
            width,
            height
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Prefix each row with filter byte 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&raw).map_err(compression_failed)?;
    encoder.finish().map_err(compression_failed)
}

fn compression_failed(e: std::io::Error) -> RenderError {
    RenderError::Encode(format!("IDAT compression failed: {}", e))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the chunk list, returning `(type, data)` pairs.
    fn chunks(png: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut out = Vec::new();
        let mut pos = 8;
        while pos < png.len() {
            let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
            let kind = String::from_utf8(png[pos + 4..pos + 8].to_vec()).unwrap();
            let data = png[pos + 8..pos + 8 + len].to_vec();
            let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
            assert_eq!(crc, crc32fast::hash(&png[pos + 4..pos + 8 + len]), "bad CRC on {}", kind);
            out.push((kind, data));
            pos += 12 + len;
        }
        out
    }

    #[test]
    fn test_indexed_layout_with_transparency() {
        let palette = [[0, 0, 0, 0], [62, 160, 239, 255]];
        let png = encode_indexed(2, 2, &palette, &[0, 1, 1, 0]).unwrap();

        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let kinds: Vec<String> = chunks(&png).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec!["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);

        let (_, ihdr) = &chunks(&png)[0];
        assert_eq!(&ihdr[0..4], &2u32.to_be_bytes());
        assert_eq!(ihdr[9], COLOR_TYPE_INDEXED);
    }

    #[test]
    fn test_opaque_palette_has_no_trns() {
        let png = encode_indexed(2, 1, &[[10, 20, 30, 255]], &[0, 0]).unwrap();
        assert!(chunks(&png).iter().all(|(k, _)| k != "tRNS"));
    }

    #[test]
    fn test_size_errors() {
        let black = [[0, 0, 0, 255]];
        assert!(matches!(
            encode_indexed(0, 1, &black, &[]),
            Err(RenderError::InvalidSize { .. })
        ));
        assert!(matches!(
            encode_indexed(2, 1, &black, &[0]),
            Err(RenderError::Encode(_))
        ));
        assert!(encode_indexed(1, 1, &black, &[3]).is_err());
        assert!(encode_indexed(1, 1, &[], &[0]).is_err());
    }
}
