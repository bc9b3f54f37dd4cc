//! Theater Booth is the character-card import core of the Theater Kid
//! chat client.
//!
//! The crate turns an uploaded file (filename, declared media type, raw
//! bytes) into a normalized character record, reading tavern cards
//! embedded in PNG text chunks or supplied as plain JSON:
//! - [`png_text`] walks the PNG byte layout and decodes `tEXt`/`zTXt`/
//!   `iTXt` chunks into keyword/text entries, inflating compressed
//!   payloads along the way.
//! - [`card`] classifies parsed JSON against the two community tavern-card
//!   schema versions.
//! - [`booth`] defines the normalized [`CharacterBooth`] record handed to
//!   the chat UI.
//! - [`import`] dispatches by file type, orders candidate payloads, and
//!   owns the caller-visible error taxonomy.
//!
//! The importer performs no I/O and keeps no state between calls: callers
//! hand it bytes and receive a record or an [`ImportError`].

pub mod booth;
pub mod card;
pub mod import;
pub mod png_text;

#[cfg(test)]
mod test_helpers;

pub use booth::CharacterBooth;
pub use card::{classify, TavernCard, TavernCardV1, TavernCardV2};
pub use import::{import_character, CharacterFile, ImportError};
pub use png_text::{extract_text_entries, PngTextError, TextEntry};
