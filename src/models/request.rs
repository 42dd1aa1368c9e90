use serde::{Deserialize, Serialize};

/// Which way up a card was drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Upright,
    Reversed,
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upright" | "up" => Ok(Orientation::Upright),
            "reversed" | "rev" => Ok(Orientation::Reversed),
            other => Err(format!("unknown orientation: {}", other)),
        }
    }
}

/// Identity of one drawn card as the backend expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_id: u32,
    /// English name, e.g. "The Tower"
    pub card_name: String,
    /// Chinese name, e.g. "塔"
    pub card_cname: String,
    /// Arcana group, e.g. "major" or "cups"
    pub card_type: String,
    pub orientation: Orientation,
}

/// A card placed in a spread position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    pub card: Card,
    pub position: u32,
    pub position_name: String,
}

/// Request body for the streaming reading endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRequest {
    pub cards: Vec<DrawnCard>,
    pub spread_id: String,
}

impl ReadingRequest {
    /// Create a request for a spread with no cards yet
    pub fn new(spread_id: impl Into<String>) -> Self {
        Self {
            cards: Vec::new(),
            spread_id: spread_id.into(),
        }
    }

    /// Create a single-card reading
    pub fn single(card: Card, spread_id: impl Into<String>) -> Self {
        Self::new(spread_id).with_card(card, 1, "Present")
    }

    /// Add a card at a spread position (builder pattern)
    pub fn with_card(mut self, card: Card, position: u32, position_name: impl Into<String>) -> Self {
        self.cards.push(DrawnCard {
            card,
            position,
            position_name: position_name.into(),
        });
        self
    }
}
