//! Study session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use review_core::StudySession;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::services::sessions::SharedSession;
use crate::AppState;

fn view(session_id: Uuid, session: &StudySession<Database>) -> SessionView {
    SessionView {
        session_id,
        deck_id: session.deck_id(),
        state: session.state(),
        position: session.position(),
        total: session.len(),
        reviewed_count: session.reviewed_count(),
        remaining: session.remaining(),
        current_card: session.current_card().map(|c| c.card.clone()),
    }
}

async fn find(
    state: &AppState,
    session_id: Uuid,
    auth: &AuthenticatedLearner,
) -> Result<SharedSession<Database>> {
    state
        .sessions
        .get(session_id, auth.learner_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {session_id}")))
}

/// POST /api/sessions
pub async fn open(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Json(payload): Json<OpenSessionRequest>,
) -> Result<Json<SessionView>> {
    let mut session = StudySession::new(
        state.db.clone(),
        state.scheduler.clone(),
        payload.deck_id,
        auth.learner_id,
    );
    session.open(Utc::now()).await?;

    let (session_id, shared) = state.sessions.insert(session).await;
    let session = shared.lock().await;

    tracing::info!(
        %session_id,
        deck_id = payload.deck_id,
        queued = session.len(),
        "opened study session"
    );

    Ok(Json(view(session_id, &session)))
}

/// GET /api/sessions/:session_id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let shared = find(&state, session_id, &auth).await?;
    let session = shared.lock().await;
    Ok(Json(view(session_id, &session)))
}

/// POST /api/sessions/:session_id/rate
pub async fn rate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<RateCardRequest>,
) -> Result<Json<RateCardResponse>> {
    let shared = find(&state, session_id, &auth).await?;
    let mut session = shared.lock().await;

    let outcome = session.rate(payload.rating, Utc::now()).await?;

    Ok(Json(RateCardResponse {
        outcome,
        session: view(session_id, &session),
    }))
}

/// POST /api/sessions/:session_id/restart
pub async fn restart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let shared = find(&state, session_id, &auth).await?;
    let mut session = shared.lock().await;
    session.restart()?;
    Ok(Json(view(session_id, &session)))
}

/// DELETE /api/sessions/:session_id
/// Abandons the session; reviews already handed to the store stay saved.
pub async fn abandon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.sessions.remove(session_id, auth.learner_id).await {
        tracing::debug!(%session_id, "abandoned study session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {session_id}")))
    }
}
