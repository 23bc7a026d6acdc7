//! Test fixtures and factory functions for creating test data.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use review_scheduler_backend::models::NewCard;

/// Build the n-th sample card.
pub fn new_card(i: usize) -> NewCard {
    NewCard {
        front: format!("Question {}?", i + 1),
        back: format!("Answer {}.", i + 1),
        hint: None,
    }
}

/// Create a learner register request body.
pub fn learner_register_request(name: Option<&str>) -> serde_json::Value {
    match name {
        Some(n) => json!({ "name": n }),
        None => json!({}),
    }
}

/// Create a deck request body with `num_cards` cards.
pub fn create_deck_request(name: &str, num_cards: usize) -> serde_json::Value {
    let cards: Vec<serde_json::Value> = (0..num_cards)
        .map(|i| {
            json!({
                "front": format!("Question {}?", i + 1),
                "back": format!("Answer {}.", i + 1),
            })
        })
        .collect();
    json!({ "name": name, "cards": cards })
}

/// Create a submit review request body.
pub fn submit_review_request(card_id: i64, rating: i64) -> serde_json::Value {
    json!({
        "card_id": card_id,
        "rating": rating,
    })
}

/// Create a due count request body.
pub fn due_count_request(next_review_at: &[Option<DateTime<Utc>>]) -> serde_json::Value {
    let states: Vec<serde_json::Value> = next_review_at
        .iter()
        .map(|at| json!({ "next_review_at": at }))
        .collect();
    json!({ "states": states })
}

/// Create an open session request body.
pub fn open_session_request(deck_id: i64) -> serde_json::Value {
    json!({ "deck_id": deck_id })
}

/// Create a rate card request body.
pub fn rate_request(rating: i64) -> serde_json::Value {
    json!({ "rating": rating })
}

/// Generate a unique test deck name to avoid collisions.
pub fn unique_deck_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().to_string()[..8])
}
