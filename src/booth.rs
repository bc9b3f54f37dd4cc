//! The normalized character record handed to the chat UI.
//!
//! Whatever schema version a card arrived in, the booth record is the
//! single shape the rest of the client works with. One record is created
//! per successful import; ownership passes to the caller and nothing is
//! mutated afterwards. Field names serialize in the camelCase form the
//! web UI expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::{TavernCard, TavernCardV1, TavernCardV2};

/// A character ready for the theater booth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterBooth {
    pub name: String,
    /// Reference to the uploaded file's bytes, valid for the importing
    /// session.
    pub avatar_url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The original card exactly as parsed, kept for lossless display.
    pub raw_card: Value,
}

impl CharacterBooth {
    /// Map a classified card onto the normalized record.
    ///
    /// V2 `data` members are extracted leniently: a missing or
    /// non-string member leaves its slot unset rather than failing the
    /// import. Both versions fall back from `description` to
    /// `personality` to the empty string; V2-only fields stay unset for
    /// V1 cards.
    pub fn from_card(card: TavernCard, avatar_url: String) -> Self {
        match card {
            TavernCard::V1(card) => Self::from_v1(card, avatar_url),
            TavernCard::V2(card) => Self::from_v2(card, avatar_url),
        }
    }

    fn from_v1(card: TavernCardV1, avatar_url: String) -> Self {
        CharacterBooth {
            name: card.name.clone(),
            avatar_url,
            description: card.description.clone(),
            scenario: Some(card.scenario.clone()),
            greeting: Some(card.first_mes.clone()),
            examples: Some(card.mes_example.clone()),
            system_prompt: None,
            post_history: None,
            tags: None,
            creator: None,
            version: None,
            raw_card: card.into_raw(),
        }
    }

    fn from_v2(card: TavernCardV2, avatar_url: String) -> Self {
        let owned = |key: &str| card.str_field(key).map(str::to_owned);
        CharacterBooth {
            name: owned("name").unwrap_or_default(),
            avatar_url,
            description: owned("description")
                .or_else(|| owned("personality"))
                .unwrap_or_default(),
            scenario: owned("scenario"),
            greeting: owned("first_mes"),
            examples: owned("mes_example"),
            system_prompt: owned("system_prompt"),
            post_history: owned("post_history_instructions"),
            tags: card.string_list("tags"),
            creator: owned("creator"),
            version: owned("character_version"),
            raw_card: card.into_raw(),
        }
    }
}
