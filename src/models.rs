//! Card Models
//!
//! Data structures matching the backend `cards` collection.

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner recorded on speculative cards until the server assigns the real one
pub const PLACEHOLDER_OWNER: &str = "temp";

/// Prefix used for locally generated ids unless configured otherwise
pub const DEFAULT_TEMP_PREFIX: &str = "temp";

/// Non-default prefixes in use by any layer in this process
static TEMP_PREFIXES: RwLock<Vec<String>> = RwLock::new(Vec::new());

/// Make [`CardId::is_temporary`] recognize ids minted with `prefix`
pub fn register_temp_prefix(prefix: &str) {
    if prefix == DEFAULT_TEMP_PREFIX {
        return;
    }
    let mut prefixes = TEMP_PREFIXES.write().unwrap_or_else(PoisonError::into_inner);
    if !prefixes.iter().any(|p| p == prefix) {
        prefixes.push(prefix.to_string());
    }
}

/// Rejected user input (empty fields, unknown enum names)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("unknown {kind}: {value:?}")]
    Unknown { kind: &'static str, value: String },
}

// ========================
// Identifiers
// ========================

/// Card identifier: server-assigned, or temporary while a create is in flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for ids minted locally, under the default or a registered prefix
    pub fn is_temporary(&self) -> bool {
        self.has_prefix(DEFAULT_TEMP_PREFIX)
            || TEMP_PREFIXES
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|prefix| self.has_prefix(prefix))
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ========================
// Enumerations
// ========================

/// How a card's content is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// Free text
    #[default]
    Text,
    /// URL opened in a new tab
    Link,
    /// URL rendered as an image
    Image,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Text => "text",
            CardType::Link => "link",
            CardType::Image => "image",
        }
    }

    pub fn opens_url(&self) -> bool {
        matches!(self, CardType::Link)
    }

    pub fn renders_image(&self) -> bool {
        matches!(self, CardType::Image)
    }
}

impl FromStr for CardType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(CardType::Text),
            "link" => Ok(CardType::Link),
            "image" => Ok(CardType::Image),
            other => Err(ValidationError::Unknown { kind: "card type", value: other.to_string() }),
        }
    }
}

/// Fixed card palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    #[default]
    Blue,
    Peach,
    Yellow,
    Mint,
    Lavender,
}

impl CardColor {
    pub const ALL: [CardColor; 5] = [
        CardColor::Blue,
        CardColor::Peach,
        CardColor::Yellow,
        CardColor::Mint,
        CardColor::Lavender,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardColor::Blue => "blue",
            CardColor::Peach => "peach",
            CardColor::Yellow => "yellow",
            CardColor::Mint => "mint",
            CardColor::Lavender => "lavender",
        }
    }
}

impl FromStr for CardColor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardColor::ALL
            .into_iter()
            .find(|color| color.as_str() == s)
            .ok_or_else(|| ValidationError::Unknown { kind: "card color", value: s.to_string() })
    }
}

/// Grid footprint, written `columns x rows`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CardSize {
    #[default]
    #[serde(rename = "1x1")]
    OneByOne,
    #[serde(rename = "1x2")]
    OneByTwo,
    #[serde(rename = "2x1")]
    TwoByOne,
    #[serde(rename = "2x2")]
    TwoByTwo,
}

impl CardSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSize::OneByOne => "1x1",
            CardSize::OneByTwo => "1x2",
            CardSize::TwoByOne => "2x1",
            CardSize::TwoByTwo => "2x2",
        }
    }

    /// (columns, rows) occupied in the grid
    pub fn footprint(&self) -> (u8, u8) {
        match self {
            CardSize::OneByOne => (1, 1),
            CardSize::OneByTwo => (1, 2),
            CardSize::TwoByOne => (2, 1),
            CardSize::TwoByTwo => (2, 2),
        }
    }

    pub fn cells(&self) -> u8 {
        let (columns, rows) = self.footprint();
        columns * rows
    }
}

impl FromStr for CardSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1x1" => Ok(CardSize::OneByOne),
            "1x2" => Ok(CardSize::OneByTwo),
            "2x1" => Ok(CardSize::TwoByOne),
            "2x2" => Ok(CardSize::TwoByTwo),
            other => Err(ValidationError::Unknown { kind: "card size", value: other.to_string() }),
        }
    }
}

// ========================
// Card
// ========================

/// A content card (matches backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub color: CardColor,
    pub size: CardSize,
    /// Ordering key, lower sorts first
    #[serde(default)]
    pub position: i32,
    #[serde(rename = "user_id")]
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Placeholder shown while the server has not acknowledged a create
    pub fn speculative(id: CardId, draft: CardDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            card_type: draft.card_type,
            color: draft.color,
            size: draft.size,
            position: draft.position,
            owner: PLACEHOLDER_OWNER.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Text placed on the clipboard when the card is copied
    pub fn copy_text(&self) -> &str {
        &self.content
    }

    /// Apply a partial change set in place
    pub fn apply_changes(&mut self, changes: &CardChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(card_type) = changes.card_type {
            self.card_type = card_type;
        }
        if let Some(color) = changes.color {
            self.color = color;
        }
        if let Some(size) = changes.size {
            self.size = size;
        }
        if let Some(position) = changes.position {
            self.position = position;
        }
    }
}

/// Stable sort: `position` ascending, then `created_at` descending
pub fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

// ========================
// Drafts and change sets
// ========================

/// A card as submitted by the creation form (no id, owner or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardDraft {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub color: CardColor,
    pub size: CardSize,
    #[serde(default)]
    pub position: i32,
}

impl CardDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Trim title and content, rejecting either when blank
    pub fn validated(
        title: &str,
        content: &str,
        card_type: CardType,
        color: CardColor,
        size: CardSize,
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title"));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::Empty("content"));
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            card_type,
            color,
            size,
            position: 0,
        })
    }

    pub fn with_type(mut self, card_type: CardType) -> Self {
        self.card_type = card_type;
        self
    }

    pub fn with_color(mut self, color: CardColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: CardSize) -> Self {
        self.size = size;
        self
    }
}

impl From<&Card> for CardDraft {
    fn from(card: &Card) -> Self {
        Self {
            title: card.title.clone(),
            content: card.content.clone(),
            card_type: card.card_type,
            color: card.color,
            size: card.size,
            position: card.position,
        }
    }
}

/// Partial card sent to the gateway's `update`; `None` leaves a field alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<CardColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<CardSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl CardChanges {
    pub fn is_empty(&self) -> bool {
        *self == CardChanges::default()
    }
}

impl From<&Card> for CardChanges {
    fn from(card: &Card) -> Self {
        Self {
            title: Some(card.title.clone()),
            content: Some(card.content.clone()),
            card_type: Some(card.card_type),
            color: Some(card.color),
            size: Some(card.size),
            position: Some(card.position),
        }
    }
}
