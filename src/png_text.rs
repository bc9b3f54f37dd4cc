//! PNG text-chunk extraction.
//!
//! Card-sharing tools hide their payloads in the ancillary text chunks of
//! ordinary PNG files. This module walks the chunk framing of a PNG byte
//! stream and decodes every `tEXt`, `zTXt` and `iTXt` chunk it can into a
//! [`TextEntry`]. Pixel data is never interpreted. A chunk that cannot be
//! decoded is dropped and the walk continues, so one bad chunk never
//! sinks a file; only a missing PNG signature is fatal.

use std::fmt;
use std::io::Read;

use flate2::read::ZlibDecoder;
use memchr::memchr;
use tracing::debug;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A decoded text chunk: the keyword and its (possibly inflated) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub keyword: String,
    pub text: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PngTextError {
    InvalidSignature,
}

impl fmt::Display for PngTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngTextError::InvalidSignature => write!(f, "not a PNG file"),
        }
    }
}

impl std::error::Error for PngTextError {}

/// Per-chunk decoding failures. These never abort the walk; the chunk is
/// skipped and the next one is read.
#[derive(Debug)]
pub enum TextDecodeError {
    /// Required sub-structure (keyword separator, header bytes) missing.
    Malformed(&'static str),
    /// Compression method other than 0 (zlib/deflate).
    UnsupportedCompression(u8),
    /// The zlib stream did not inflate.
    DecompressionFailed(std::io::Error),
}

impl fmt::Display for TextDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextDecodeError::Malformed(reason) => {
                write!(f, "malformed text chunk: {}", reason)
            }
            TextDecodeError::UnsupportedCompression(method) => {
                write!(f, "unsupported compression method {}", method)
            }
            TextDecodeError::DecompressionFailed(err) => {
                write!(f, "decompression failed: {}", err)
            }
        }
    }
}

impl std::error::Error for TextDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextDecodeError::DecompressionFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Extract every decodable text entry from a PNG byte stream, in stream
/// order.
///
/// The walk starts after the 8-byte signature and reads chunks as a
/// big-endian length, a 4-byte type tag, `length` bytes of data and a
/// 4-byte CRC. The CRC is framing only and is never verified. The walk
/// ends when a declared length would overrun the buffer (a truncated
/// trailer is not an error), when fewer than 12 bytes remain, or after
/// the `IEND` chunk.
pub fn extract_text_entries(data: &[u8]) -> Result<Vec<TextEntry>, PngTextError> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(PngTextError::InvalidSignature);
    }

    let mut entries = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    while offset + 12 <= data.len() {
        let length =
            u32::from_be_bytes(data[offset..offset + 4].try_into().expect("slice of length 4"))
                as usize;
        let chunk_type: [u8; 4] = data[offset + 4..offset + 8]
            .try_into()
            .expect("slice of length 4");
        let data_start = offset + 8;
        let Some(data_end) = data_start.checked_add(length) else {
            break;
        };
        if data_end > data.len() {
            break;
        }
        let chunk_data = &data[data_start..data_end];

        let decoded = match &chunk_type {
            b"tEXt" => Some(decode_text(chunk_data)),
            b"zTXt" => Some(decode_compressed_text(chunk_data)),
            b"iTXt" => Some(decode_international_text(chunk_data)),
            _ => None,
        };
        match decoded {
            Some(Ok(entry)) => entries.push(entry),
            Some(Err(err)) => {
                debug!(chunk = %display_chunk_type(&chunk_type), %err, "Skipping undecodable text chunk");
            }
            None => {}
        }

        offset = data_end + 4;
        if &chunk_type == b"IEND" {
            break;
        }
    }

    Ok(entries)
}

/// `tEXt`: `keyword NUL text`. Text is nominally Latin-1 but card tools
/// write UTF-8, so decoding is lossy UTF-8 throughout.
fn decode_text(data: &[u8]) -> Result<TextEntry, TextDecodeError> {
    let nul = memchr(0, data).ok_or(TextDecodeError::Malformed("missing keyword separator"))?;
    Ok(TextEntry {
        keyword: String::from_utf8_lossy(&data[..nul]).into_owned(),
        text: String::from_utf8_lossy(&data[nul + 1..]).into_owned(),
    })
}

/// `zTXt`: `keyword NUL method(1) compressed-text`. Only method 0
/// (zlib/deflate) is defined.
fn decode_compressed_text(data: &[u8]) -> Result<TextEntry, TextDecodeError> {
    let nul = memchr(0, data).ok_or(TextDecodeError::Malformed("missing keyword separator"))?;
    if data.len() <= nul + 2 {
        return Err(TextDecodeError::Malformed("missing compressed payload"));
    }
    let method = data[nul + 1];
    if method != 0 {
        return Err(TextDecodeError::UnsupportedCompression(method));
    }
    let inflated = inflate(&data[nul + 2..])?;
    Ok(TextEntry {
        keyword: String::from_utf8_lossy(&data[..nul]).into_owned(),
        text: String::from_utf8_lossy(&inflated).into_owned(),
    })
}

/// `iTXt`: `keyword NUL flag(1) method(1) language NUL translated NUL
/// text`. The language tag and translated keyword are read past, not
/// kept; the keyword stays the candidate key.
fn decode_international_text(data: &[u8]) -> Result<TextEntry, TextDecodeError> {
    let nul = memchr(0, data).ok_or(TextDecodeError::Malformed("missing keyword separator"))?;
    let keyword = &data[..nul];
    let rest = &data[nul + 1..];
    let (&[flag, method], rest) = rest.split_first_chunk::<2>().ok_or(
        TextDecodeError::Malformed("missing compression header"),
    )?;

    let lang_nul =
        memchr(0, rest).ok_or(TextDecodeError::Malformed("missing language tag separator"))?;
    let rest = &rest[lang_nul + 1..];
    let translated_nul = memchr(0, rest).ok_or(TextDecodeError::Malformed(
        "missing translated keyword separator",
    ))?;
    let remainder = &rest[translated_nul + 1..];

    let text = match (flag, method) {
        (1, 0) => String::from_utf8_lossy(&inflate(remainder)?).into_owned(),
        (1, method) => return Err(TextDecodeError::UnsupportedCompression(method)),
        _ => String::from_utf8_lossy(remainder).into_owned(),
    };
    Ok(TextEntry {
        keyword: String::from_utf8_lossy(keyword).into_owned(),
        text,
    })
}

/// Inflate a zlib-framed deflate stream in full.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, TextDecodeError> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(TextDecodeError::DecompressionFailed)?;
    Ok(out)
}

fn display_chunk_type(chunk_type: &[u8; 4]) -> String {
    chunk_type
        .iter()
        .map(|&b| {
            if (32..=126).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
