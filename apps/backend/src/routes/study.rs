//! Study endpoints

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use review_core::count_due;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// POST /api/study/review
pub async fn review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    state
        .db
        .get_card(payload.card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

    // Get current review state (or default if none)
    let current_state = state
        .db
        .get_review_state(payload.card_id, auth.learner_id)
        .await?
        .map(|s| s.to_core_state());

    let result = state
        .scheduler
        .review(payload.rating, current_state.as_ref(), Utc::now());

    let db_state = DbReviewState::from_core_state(payload.card_id, auth.learner_id, &result.new_state);
    state.db.upsert_review_state(&db_state).await?;

    tracing::debug!(
        card_id = payload.card_id,
        rating = payload.rating,
        interval_days = result.new_state.interval_days,
        "review scored"
    );

    Ok(Json(SubmitReviewResponse {
        new_state: result.new_state,
        next_review_at: result.next_review_at,
    }))
}

/// POST /api/study/due-count
pub async fn due_count(
    Extension(_auth): Extension<AuthenticatedLearner>,
    Json(payload): Json<DueCountRequest>,
) -> Json<DueCountResponse> {
    Json(DueCountResponse {
        due: count_due(&payload.states, Utc::now()),
    })
}
