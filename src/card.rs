//! Tavern-card schema classification.
//!
//! Character cards circulate in two community schema versions: the flat
//! V1 layout and the `chara_card_v2` envelope. Classification is
//! structural over parsed JSON. For V2 only the envelope is checked:
//! `data` members are left unvalidated so that cards with sloppy fields
//! still import, with the broken pieces dropping out of the normalized
//! record instead of failing the whole file.

use serde_json::{Map, Value};

/// `spec` tag identifying a V2 card envelope.
pub const SPEC_V2: &str = "chara_card_v2";

/// A card that passed classification, tagged by schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum TavernCard {
    V1(TavernCardV1),
    V2(TavernCardV2),
}

/// Flat V1 card. The five required fields are guaranteed strings by
/// classification; `personality` is optional and never gates.
#[derive(Debug, Clone, PartialEq)]
pub struct TavernCardV1 {
    pub name: String,
    pub description: String,
    pub personality: Option<String>,
    pub scenario: String,
    pub first_mes: String,
    pub mes_example: String,
    raw: Value,
}

impl TavernCardV1 {
    /// The card exactly as parsed, including fields this crate does not
    /// model.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

/// V2 envelope: `spec` matched the literal tag and `data` is an object.
/// Members of `data` are carried as-is and extracted leniently.
#[derive(Debug, Clone, PartialEq)]
pub struct TavernCardV2 {
    pub spec_version: Option<String>,
    pub data: Map<String, Value>,
    raw: Value,
}

impl TavernCardV2 {
    /// A `data` member, if present with a string value.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// A `data` member, if present as an array; keeps only its string
    /// elements.
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        let items = self.data.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
        )
    }

    /// The card exactly as parsed, including `character_book`,
    /// `extensions` and anything else riding in the envelope.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

/// Strip `__proto__` and `constructor` own-properties from a top-level
/// JSON object.
///
/// Card content is untrusted; the removal is shallow and happens before
/// classification, so the stripped keys never reach the retained raw
/// card.
pub fn sanitize(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        // shift_remove keeps the order of the remaining keys, which the
        // nested candidate scan depends on.
        obj.shift_remove("__proto__");
        obj.shift_remove("constructor");
    }
}

/// Classify a parsed JSON value as a V2 card, a V1 card, or neither.
///
/// V2 is checked first and wins when `spec` equals the exact literal and
/// `data` is an object; nothing inside `data` is inspected. V1 requires
/// `name`, `description`, `scenario`, `first_mes` and `mes_example` all
/// present with string values.
pub fn classify(value: &Value) -> Option<TavernCard> {
    if let Some(card) = classify_v2(value) {
        return Some(TavernCard::V2(card));
    }
    classify_v1(value).map(TavernCard::V1)
}

fn classify_v2(value: &Value) -> Option<TavernCardV2> {
    let obj = value.as_object()?;
    if obj.get("spec").and_then(Value::as_str) != Some(SPEC_V2) {
        return None;
    }
    let data = obj.get("data")?.as_object()?.clone();
    Some(TavernCardV2 {
        spec_version: obj
            .get("spec_version")
            .and_then(Value::as_str)
            .map(str::to_owned),
        data,
        raw: value.clone(),
    })
}

fn classify_v1(value: &Value) -> Option<TavernCardV1> {
    let obj = value.as_object()?;
    let string_field = |key: &str| obj.get(key)?.as_str().map(str::to_owned);
    Some(TavernCardV1 {
        name: string_field("name")?,
        description: string_field("description")?,
        personality: string_field("personality"),
        scenario: string_field("scenario")?,
        first_mes: string_field("first_mes")?,
        mes_example: string_field("mes_example")?,
        raw: value.clone(),
    })
}
