//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating learners and decks
//! - Authentication helpers
//!
//! # Requirements
//! Database-backed tests require PostgreSQL (set DATABASE_URL env var).
//! `TestContext::without_database` needs no running server.

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use review_scheduler_backend::db::Database;
use review_scheduler_backend::models::{Card, Learner, NewCard};
use review_scheduler_backend::services::sessions::DEFAULT_IDLE_TTL;
use review_scheduler_backend::{router, AppState};

/// Test context containing database connection and test router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context with a migrated database.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url, 5)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self::from_database(db)
    }

    /// Create a test context whose pool never connects unless used.
    ///
    /// Only suitable for requests rejected before touching the database.
    pub fn without_database() -> Self {
        let db = Database::connect_lazy("postgres://postgres@127.0.0.1:1/unused")
            .expect("Failed to build lazy pool");
        Self::from_database(db)
    }

    fn from_database(db: Database) -> Self {
        let state = AppState::new(db, DEFAULT_IDLE_TTL);
        let db = state.db.clone();
        let app = router(state);
        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test learner and return its ID and token.
    pub async fn create_test_learner(&self, name: Option<&str>) -> (Uuid, String) {
        let learner = self
            .db
            .create_learner(name)
            .await
            .expect("Failed to create test learner");
        (learner.id, learner.token)
    }

    /// Get learner by token.
    pub async fn get_learner_by_token(&self, token: &str) -> Option<Learner> {
        self.db.get_learner_by_token(token).await.ok().flatten()
    }

    /// Create a deck with `num_cards` cards and return its ID and cards.
    pub async fn create_test_deck(&self, num_cards: usize) -> (i64, Vec<Card>) {
        let cards: Vec<NewCard> = (0..num_cards).map(fixtures::new_card).collect();
        let (deck, cards) = self
            .db
            .create_deck(&fixtures::unique_deck_name("deck"), &cards)
            .await
            .expect("Failed to create test deck");
        (deck.id, cards.iter().map(|c| c.to_api_card()).collect())
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a learner.
    pub async fn cleanup_learner(&self, learner_id: Uuid) {
        let _ = sqlx::query("DELETE FROM review_states WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM learners WHERE id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;
    }

    /// Clean up a deck; cards and their states cascade.
    pub async fn cleanup_deck(&self, deck_id: i64) {
        let _ = sqlx::query("DELETE FROM decks WHERE id = $1")
            .bind(deck_id)
            .execute(self.db.pool())
            .await;
    }
}
