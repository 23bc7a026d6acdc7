//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use review_core::{count_due, Card, ReviewState, ReviewStore, StoreError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that only connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Learner Repository ===

    /// Create a new learner with generated token
    pub async fn create_learner(&self, name: Option<&str>) -> Result<Learner> {
        let token = Uuid::new_v4().to_string();
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            INSERT INTO learners (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Get learner by token
    pub async fn get_learner_by_token(&self, token: &str) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM learners
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Update learner last_seen_at timestamp
    pub async fn update_last_seen(&self, learner_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE learners
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Deck Repository ===

    /// Create a deck and its cards in stored order
    pub async fn create_deck(&self, name: &str, cards: &[NewCard]) -> Result<(DbDeck, Vec<DbCard>)> {
        let mut tx = self.pool.begin().await?;

        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            INSERT INTO decks (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(cards.len());
        for (position, card) in cards.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| ApiError::BadRequest("Too many cards in deck".to_string()))?;
            let row = sqlx::query_as::<_, DbCard>(
                r#"
                INSERT INTO cards (deck_id, position, front, back, hint)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, deck_id, position, front, back, hint, created_at
                "#,
            )
            .bind(deck.id)
            .bind(position)
            .bind(&card.front)
            .bind(&card.back)
            .bind(&card.hint)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;

        Ok((deck, created))
    }

    /// Get deck by ID
    pub async fn get_deck(&self, deck_id: i64) -> Result<Option<DbDeck>> {
        let deck = sqlx::query_as::<_, DbDeck>(
            r#"
            SELECT id, name, created_at
            FROM decks
            WHERE id = $1
            "#,
        )
        .bind(deck_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deck)
    }

    /// List all decks with card and due counts for a learner
    pub async fn get_all_decks(&self, learner_id: Uuid) -> Result<Vec<DeckInfo>> {
        let rows = sqlx::query_as::<_, (i64, String, Option<i64>, Option<DateTime<Utc>>)>(
            r#"
            SELECT d.id, d.name, c.id, rs.next_review_at
            FROM decks d
            LEFT JOIN cards c ON c.deck_id = d.id
            LEFT JOIN review_states rs ON rs.card_id = c.id AND rs.learner_id = $1
            ORDER BY d.id, c.position, c.id
            "#,
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let mut decks: Vec<(DeckInfo, Vec<Option<DateTime<Utc>>>)> = Vec::new();
        for (deck_id, name, card_id, next_review_at) in rows {
            if decks.last().map(|(d, _)| d.id) != Some(deck_id) {
                decks.push((
                    DeckInfo {
                        id: deck_id,
                        name,
                        card_count: 0,
                        due_count: 0,
                    },
                    Vec::new(),
                ));
            }
            if card_id.is_some() {
                if let Some((_, due_dates)) = decks.last_mut() {
                    due_dates.push(next_review_at);
                }
            }
        }

        Ok(decks
            .into_iter()
            .map(|(mut info, due_dates)| {
                info.card_count = due_dates.len();
                info.due_count = count_due(&due_dates, now);
                info
            })
            .collect())
    }

    // === Card Repository ===

    /// Get card by ID
    pub async fn get_card(&self, card_id: i64) -> Result<Option<DbCard>> {
        let card = sqlx::query_as::<_, DbCard>(
            r#"
            SELECT id, deck_id, position, front, back, hint, created_at
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Get a deck's cards in stored order, each with the learner's state
    pub async fn get_cards_with_states(
        &self,
        deck_id: i64,
        learner_id: Uuid,
    ) -> Result<Vec<DbCardWithState>> {
        let rows = sqlx::query_as::<_, DbCardWithState>(
            r#"
            SELECT c.id, c.deck_id, c.position, c.front, c.back, c.hint, c.created_at,
                   rs.ease_factor, rs.interval_days, rs.repetitions, rs.next_review_at
            FROM cards c
            LEFT JOIN review_states rs ON rs.card_id = c.id AND rs.learner_id = $2
            WHERE c.deck_id = $1
            ORDER BY c.position, c.id
            "#,
        )
        .bind(deck_id)
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === Review State Repository ===

    /// Get review state
    pub async fn get_review_state(
        &self,
        card_id: i64,
        learner_id: Uuid,
    ) -> Result<Option<DbReviewState>> {
        let state = sqlx::query_as::<_, DbReviewState>(
            r#"
            SELECT card_id, learner_id, ease_factor, interval_days, repetitions,
                   next_review_at, updated_at
            FROM review_states
            WHERE card_id = $1 AND learner_id = $2
            "#,
        )
        .bind(card_id)
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Upsert review state
    pub async fn upsert_review_state(&self, state: &DbReviewState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_states (card_id, learner_id, ease_factor, interval_days,
                                       repetitions, next_review_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (card_id, learner_id) DO UPDATE SET
                ease_factor = EXCLUDED.ease_factor,
                interval_days = EXCLUDED.interval_days,
                repetitions = EXCLUDED.repetitions,
                next_review_at = EXCLUDED.next_review_at,
                updated_at = NOW()
            "#,
        )
        .bind(state.card_id)
        .bind(state.learner_id)
        .bind(state.ease_factor)
        .bind(state.interval_days)
        .bind(state.repetitions)
        .bind(state.next_review_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// === Study Session Store ===

impl ReviewStore for Database {
    async fn load_cards_and_states(
        &self,
        deck_id: i64,
        learner_id: Uuid,
    ) -> std::result::Result<Vec<(Card, Option<ReviewState>)>, StoreError> {
        let deck = self.get_deck(deck_id).await.map_err(backend_error)?;
        if deck.is_none() {
            return Err(StoreError::NotFound(format!("Deck {deck_id}")));
        }

        let rows = self
            .get_cards_with_states(deck_id, learner_id)
            .await
            .map_err(backend_error)?;

        Ok(rows.into_iter().map(DbCardWithState::into_core).collect())
    }

    async fn save_state(
        &self,
        card_id: i64,
        learner_id: Uuid,
        state: &ReviewState,
    ) -> std::result::Result<(), StoreError> {
        let row = DbReviewState::from_core_state(card_id, learner_id, state);
        self.upsert_review_state(&row).await.map_err(backend_error)
    }
}

fn backend_error(err: ApiError) -> StoreError {
    StoreError::Backend(err.to_string())
}
