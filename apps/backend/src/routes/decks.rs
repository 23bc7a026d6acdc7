//! Deck endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use review_core::count_due;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// POST /api/decks
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<Json<CreateDeckResponse>> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Deck name must not be empty".to_string()));
    }
    if payload
        .cards
        .iter()
        .any(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
    {
        return Err(ApiError::BadRequest(
            "Cards need both a front and a back".to_string(),
        ));
    }

    let (deck, cards) = state.db.create_deck(name, &payload.cards).await?;

    tracing::info!(
        deck_id = deck.id,
        cards = cards.len(),
        learner_id = %auth.learner_id,
        "created deck"
    );

    Ok(Json(CreateDeckResponse {
        deck: deck.to_api_deck(),
        cards: cards.iter().map(DbCard::to_api_card).collect(),
    }))
}

/// GET /api/decks
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
) -> Result<Json<DeckListResponse>> {
    let decks = state.db.get_all_decks(auth.learner_id).await?;
    Ok(Json(DeckListResponse { decks }))
}

/// GET /api/decks/:deck_id/due-count
pub async fn due_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(deck_id): Path<i64>,
) -> Result<Json<DueCountResponse>> {
    state
        .db
        .get_deck(deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deck {deck_id}")))?;

    let rows = state
        .db
        .get_cards_with_states(deck_id, auth.learner_id)
        .await?;
    let due = count_due(rows.iter().map(|row| row.next_review_at), Utc::now());

    Ok(Json(DueCountResponse { due }))
}
