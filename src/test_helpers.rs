//! Shared fixture builders for import tests.
//!
//! Fixtures are honest PNGs: chunks carry valid CRCs even though the
//! reader never checks them, and compressed payloads are real zlib
//! streams.

use std::io::Write;

use crc32fast::Hasher;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::{json, Value};

use crate::png_text::PNG_SIGNATURE;

const TEST_IHDR: [u8; 13] = [
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
];

const TEST_IDAT: [u8; 12] = [
    0x78, 0xDA, 0x63, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01,
];

/// A single chunk: length, type, data, CRC over type + data.
pub fn chunk(chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk_type);
    out.extend_from_slice(data);
    let mut hasher = Hasher::new();
    hasher.update(&chunk_type);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

/// Signature followed by exactly the given chunks, nothing else.
pub fn raw_png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    for c in chunks {
        png.extend_from_slice(c);
    }
    png
}

pub fn ihdr_chunk() -> Vec<u8> {
    chunk(*b"IHDR", &TEST_IHDR)
}

pub fn iend_chunk() -> Vec<u8> {
    chunk(*b"IEND", &[])
}

/// A minimal well-formed 1x1 PNG with the given chunks spliced in
/// between IHDR and IDAT.
pub fn png_with_chunks(text_chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut chunks = vec![ihdr_chunk()];
    chunks.extend_from_slice(text_chunks);
    chunks.push(chunk(*b"IDAT", &TEST_IDAT));
    chunks.push(iend_chunk());
    raw_png(&chunks)
}

/// A well-formed PNG carrying one `tEXt` chunk.
pub fn png_with_text(keyword: &str, text: &str) -> Vec<u8> {
    png_with_chunks(&[text_chunk(keyword, text.as_bytes())])
}

pub fn text_chunk(keyword: &str, text: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.extend_from_slice(text);
    chunk(*b"tEXt", &data)
}

pub fn ztxt_chunk(keyword: &str, method: u8, compressed: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.push(method);
    data.extend_from_slice(compressed);
    chunk(*b"zTXt", &data)
}

pub fn itxt_chunk(
    keyword: &str,
    flag: u8,
    method: u8,
    language: &str,
    translated: &str,
    text: &[u8],
) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.push(flag);
    data.push(method);
    data.extend_from_slice(language.as_bytes());
    data.push(0);
    data.extend_from_slice(translated.as_bytes());
    data.push(0);
    data.extend_from_slice(text);
    chunk(*b"iTXt", &data)
}

/// Compress with zlib framing, as PNG encoders do.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to in-memory encoder");
    encoder.finish().expect("finish zlib stream")
}

/// A fully-populated V2 card value for round-trip assertions.
pub fn v2_card(name: &str) -> Value {
    json!({
        "spec": "chara_card_v2",
        "spec_version": "2.0",
        "data": {
            "name": name,
            "description": "A test character",
            "personality": "Friendly",
            "scenario": "Testing",
            "first_mes": "Hello!",
            "mes_example": "{{user}}: Hi"
        }
    })
}
