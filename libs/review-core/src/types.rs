//! Core types for the review scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quality;

/// Learner rating on the coarse 4-point scale shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (0-3).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 0,
            Self::Hard => 1,
            Self::Good => 2,
            Self::Easy => 3,
        }
    }

    /// Create from a raw numeric rating.
    ///
    /// Out-of-range input is clamped to the nearest end of the scale, so
    /// malformed client input still produces a usable rating.
    pub fn from_value(value: i64) -> Self {
        match value.clamp(0, 3) {
            0 => Self::Again,
            1 => Self::Hard,
            2 => Self::Good,
            _ => Self::Easy,
        }
    }

    /// Confidence on the 6-point (0-5) scale the SM-2 formula uses.
    pub fn confidence(self) -> u8 {
        quality::map_to_confidence(i64::from(self.to_value()))
    }
}

impl From<i64> for Rating {
    fn from(value: i64) -> Self {
        Self::from_value(value)
    }
}

/// Per learner, per card scheduling state. This is the unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    /// `None` means the card was never reviewed and is due immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: 2.5,
            interval_days: 0,
            repetitions: 0,
            next_review_at: None,
        }
    }
}

impl ReviewState {
    /// Whether the card has never been reviewed.
    pub fn is_new(&self) -> bool {
        self.next_review_at.is_none()
    }
}

/// Immutable card content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// A named, ordered collection of cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
}

/// Result of scheduling a card after review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub new_state: ReviewState,
    pub next_review_at: DateTime<Utc>,
}
