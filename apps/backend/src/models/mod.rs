//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from review-core
pub use review_core::{
    Card, Deck, HasDueDate, Rating, ReviewOutcome, ReviewState, SessionState,
};

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Learner {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Deck stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDeck {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl DbDeck {
    pub fn to_api_deck(&self) -> Deck {
        Deck {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Card stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCard {
    pub id: i64,
    pub deck_id: i64,
    pub position: i32,
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbCard {
    /// Convert to API card type
    pub fn to_api_card(&self) -> Card {
        Card {
            id: self.id,
            deck_id: self.deck_id,
            front: self.front.clone(),
            back: self.back.clone(),
            hint: self.hint.clone(),
        }
    }
}

/// Review state in PostgreSQL, one row per learner and card
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewState {
    pub card_id: i64,
    pub learner_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetitions: i32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DbReviewState {
    /// Create from review-core ReviewState
    pub fn from_core_state(card_id: i64, learner_id: Uuid, state: &ReviewState) -> Self {
        Self {
            card_id,
            learner_id,
            ease_factor: state.ease_factor,
            interval_days: i32::try_from(state.interval_days).unwrap_or(i32::MAX),
            repetitions: i32::try_from(state.repetitions).unwrap_or(i32::MAX),
            next_review_at: state.next_review_at,
            updated_at: Utc::now(),
        }
    }

    /// Convert to review-core ReviewState
    pub fn to_core_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days.max(0) as u32,
            repetitions: self.repetitions.max(0) as u32,
            next_review_at: self.next_review_at,
        }
    }
}

/// Card joined with the learner's optional review state
#[derive(Debug, Clone, FromRow)]
pub struct DbCardWithState {
    #[sqlx(flatten)]
    pub card: DbCard,
    pub ease_factor: Option<f64>,
    pub interval_days: Option<i32>,
    pub repetitions: Option<i32>,
    pub next_review_at: Option<DateTime<Utc>>,
}

impl DbCardWithState {
    /// Split into the API card and its state; `None` when never reviewed.
    pub fn into_core(self) -> (Card, Option<ReviewState>) {
        let state = match (self.ease_factor, self.interval_days, self.repetitions) {
            (Some(ease_factor), Some(interval_days), Some(repetitions)) => Some(ReviewState {
                ease_factor,
                interval_days: interval_days.max(0) as u32,
                repetitions: repetitions.max(0) as u32,
                next_review_at: self.next_review_at,
            }),
            _ => None,
        };
        (self.card.to_api_card(), state)
    }
}

/// Deck summary for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckInfo {
    pub id: i64,
    pub name: String,
    pub card_count: usize,
    pub due_count: usize,
}

// === API Request/Response Types ===

// Learner types
#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterResponse {
    pub learner_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerStatusResponse {
    pub learner_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

// Deck types
#[derive(Debug, Serialize, Deserialize)]
pub struct NewCard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<NewCard>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeckResponse {
    pub deck: Deck,
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckInfo>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueCountResponse {
    pub due: usize,
}

// Study types
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub card_id: i64,
    pub rating: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewResponse {
    pub new_state: ReviewState,
    pub next_review_at: DateTime<Utc>,
}

/// Anything carrying a next review time, as posted by summary views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueEntry {
    #[serde(default)]
    pub next_review_at: Option<DateTime<Utc>>,
}

impl HasDueDate for DueEntry {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueCountRequest {
    pub states: Vec<DueEntry>,
}

// Session types
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub deck_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateCardRequest {
    pub rating: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub deck_id: i64,
    pub state: SessionState,
    pub position: usize,
    pub total: usize,
    pub reviewed_count: usize,
    pub remaining: usize,
    pub current_card: Option<Card>,
}

#[derive(Debug, Serialize)]
pub struct RateCardResponse {
    pub outcome: ReviewOutcome,
    pub session: SessionView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn db_card() -> DbCard {
        DbCard {
            id: 11,
            deck_id: 2,
            position: 0,
            front: "bonjour".to_string(),
            back: "hello".to_string(),
            hint: Some("greeting".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_review_state_round_trip() {
        let state = ReviewState {
            ease_factor: 2.36,
            interval_days: 8,
            repetitions: 3,
            next_review_at: Some(Utc::now()),
        };
        let db = DbReviewState::from_core_state(11, Uuid::new_v4(), &state);
        assert_eq!(db.to_core_state(), state);
    }

    #[test]
    fn test_negative_columns_clamp_to_zero() {
        let db = DbReviewState {
            card_id: 1,
            learner_id: Uuid::nil(),
            ease_factor: 2.5,
            interval_days: -4,
            repetitions: -1,
            next_review_at: None,
            updated_at: Utc::now(),
        };
        let state = db.to_core_state();
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.repetitions, 0);
    }

    #[test]
    fn test_card_without_state_is_new() {
        let row = DbCardWithState {
            card: db_card(),
            ease_factor: None,
            interval_days: None,
            repetitions: None,
            next_review_at: None,
        };
        let (card, state) = row.into_core();
        assert_eq!(card.hint.as_deref(), Some("greeting"));
        assert!(state.is_none());
    }

    #[test]
    fn test_card_with_state() {
        let row = DbCardWithState {
            card: db_card(),
            ease_factor: Some(2.6),
            interval_days: Some(3),
            repetitions: Some(2),
            next_review_at: None,
        };
        let (_, state) = row.into_core();
        let state = state.unwrap();
        assert_eq!(state.interval_days, 3);
        assert_eq!(state.repetitions, 2);
    }

    #[test]
    fn test_due_count_request_parses_missing_timestamps() {
        let request: DueCountRequest = serde_json::from_value(serde_json::json!({
            "states": [{}, {"next_review_at": null}, {"next_review_at": "2030-01-01T00:00:00Z"}]
        }))
        .unwrap();
        assert_eq!(request.states.len(), 3);
        assert!(request.states[0].next_review_at.is_none());
        assert!(request.states[2].next_review_at.is_some());
    }
}
