//! Import orchestration: one operation, "import this file, give me back
//! a character or an error."
//!
//! JSON files get a single parse-and-classify. Everything else takes the
//! PNG path: every decodable text chunk becomes a candidate, `chara`
//! keywords are tried first, and the first candidate that classifies
//! wins. Per-candidate problems are absorbed as "try the next option";
//! only the aggregate conditions in [`ImportError`] reach the caller.

use std::fmt;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::booth::CharacterBooth;
use crate::card::{self, TavernCard};
use crate::png_text::{self, PngTextError, TextEntry};

/// An uploaded file as handed over by the UI layer.
#[derive(Debug, Clone)]
pub struct CharacterFile {
    /// Original filename, consulted for `.json` dispatch.
    pub name: String,
    /// Declared media type. May be empty or wrong; only
    /// `application/json` influences dispatch.
    pub media_type: String,
    /// Complete file contents.
    pub bytes: Vec<u8>,
}

/// Terminal import failures.
#[derive(Debug)]
pub enum ImportError {
    /// The file took the PNG path but does not carry a PNG signature.
    NotPng(PngTextError),
    /// A declared-JSON file did not parse.
    InvalidJson,
    /// A declared-JSON file parsed but matched neither card schema.
    NotACard,
    /// No PNG text candidate yielded a recognizable card.
    NoCardFound,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::NotPng(err) => write!(f, "{}", err),
            ImportError::InvalidJson => write!(f, "invalid JSON"),
            ImportError::NotACard => write!(f, "not a valid character card"),
            ImportError::NoCardFound => {
                write!(f, "no valid character card found in file")
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::NotPng(err) => Some(err),
            _ => None,
        }
    }
}

/// Import a character card from an uploaded file.
///
/// Dispatch is by declared media type or filename suffix. The avatar
/// reference is derived once from the file bytes and shared by every
/// candidate tried within this call. Calls are independent and
/// reentrant; nothing is retained between them.
pub fn import_character(file: &CharacterFile) -> Result<CharacterBooth, ImportError> {
    let avatar_url = data_url(&file.media_type, &file.bytes);

    if is_json_file(file) {
        import_json(&file.bytes, avatar_url)
    } else {
        import_png(&file.bytes, avatar_url)
    }
}

fn is_json_file(file: &CharacterFile) -> bool {
    file.media_type == "application/json" || file.name.to_lowercase().ends_with(".json")
}

fn import_json(bytes: &[u8], avatar_url: String) -> Result<CharacterBooth, ImportError> {
    let text = String::from_utf8_lossy(bytes);
    let value = parse_sanitized(&text).ok_or(ImportError::InvalidJson)?;
    let card = card::classify(&value).ok_or(ImportError::NotACard)?;
    Ok(CharacterBooth::from_card(card, avatar_url))
}

fn import_png(bytes: &[u8], avatar_url: String) -> Result<CharacterBooth, ImportError> {
    let entries = png_text::extract_text_entries(bytes).map_err(ImportError::NotPng)?;
    debug!(candidates = entries.len(), "Scanning PNG text entries for a card");

    ordered_candidates(entries)
        .filter_map(|entry| parse_candidate(&entry.text))
        .find_map(|value| classify_with_nested(&value))
        .map(|card| CharacterBooth::from_card(card, avatar_url))
        .ok_or(ImportError::NoCardFound)
}

/// Order decoded entries for classification: keywords equal to `chara`
/// (case-insensitively) first, original order preserved within each
/// group.
fn ordered_candidates(entries: Vec<TextEntry>) -> impl Iterator<Item = TextEntry> {
    let (chara, rest): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.keyword.eq_ignore_ascii_case("chara"));
    chara.into_iter().chain(rest)
}

/// Parse a candidate text as JSON, falling back to base64-wrapped JSON
/// when the text has the shape of a standard base64 payload.
fn parse_candidate(text: &str) -> Option<Value> {
    if let Some(value) = parse_sanitized(text) {
        return Some(value);
    }
    if !looks_like_base64(text) {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(text).ok()?;
    let value = parse_sanitized(&String::from_utf8_lossy(&decoded))?;
    debug!("Recovered card candidate from base64-wrapped text");
    Some(value)
}

fn parse_sanitized(text: &str) -> Option<Value> {
    let mut value = serde_json::from_str(text).ok()?;
    card::sanitize(&mut value);
    Some(value)
}

/// Base64 shape check: alphabet characters with up to two trailing `=`,
/// length a multiple of four and long enough to rule out short plain
/// text.
fn looks_like_base64(text: &str) -> bool {
    if text.len() <= 20 || text.len() % 4 != 0 {
        return false;
    }
    let body = text.trim_end_matches('=');
    if text.len() - body.len() > 2 {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Classify a value, then its direct object members in key order. Some
/// tools nest the card under a wrapper key; the scan goes exactly one
/// level deep and no further.
fn classify_with_nested(value: &Value) -> Option<TavernCard> {
    card::classify(value).or_else(|| value.as_object()?.values().find_map(card::classify))
}

/// The avatar reference for this import: a data URL over the original
/// file bytes, self-contained for the life of the session and released
/// by dropping the record.
fn data_url(media_type: &str, bytes: &[u8]) -> String {
    let media_type = if media_type.is_empty() {
        "application/octet-stream"
    } else {
        media_type
    };
    format!("data:{};base64,{}", media_type, BASE64_STANDARD.encode(bytes))
}
