//! Study session controller.
//!
//! A session walks the due cards of one deck in deck order, scores each
//! rating with the SM-2 scheduler and hands the new state to a
//! [`ReviewStore`] for write-back on a spawned task. Sessions live in memory only; dropping one
//! abandons it without rolling back reviews already handed to the store.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::due::{partition_due, HasDueDate};
use crate::error::{Result, SessionError, StoreError};
use crate::scheduler::Sm2Scheduler;
use crate::types::{Card, Rating, ReviewState, SchedulingResult};

/// Persistence collaborator used by [`StudySession`].
pub trait ReviewStore: Send + Sync {
    /// Cards of a deck in stored order, each with the learner's state.
    /// A `None` state means the learner never reviewed the card.
    fn load_cards_and_states(
        &self,
        deck_id: i64,
        learner_id: Uuid,
    ) -> impl Future<Output = std::result::Result<Vec<(Card, Option<ReviewState>)>, StoreError>> + Send;

    /// Persist the learner's new state for a card.
    fn save_state(
        &self,
        card_id: i64,
        learner_id: Uuid,
        state: &ReviewState,
    ) -> impl Future<Output = std::result::Result<(), StoreError>> + Send;
}

/// Lifecycle of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Active,
    Complete,
}

/// A card queued for study together with its current state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCard {
    pub card: Card,
    pub state: ReviewState,
}

impl HasDueDate for SessionCard {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.state.next_review_at
    }
}

/// Outcome of rating the current card.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub card_id: i64,
    pub result: SchedulingResult,
    /// False when write-back failed; the card stays due on its old schedule.
    pub persisted: bool,
    pub session_complete: bool,
}

/// Sequential study pass over one deck for one learner.
pub struct StudySession<S> {
    store: Arc<S>,
    scheduler: Sm2Scheduler,
    deck_id: i64,
    learner_id: Uuid,
    state: SessionState,
    queue: Vec<SessionCard>,
    position: usize,
    reviewed_count: usize,
}

impl<S: ReviewStore + 'static> StudySession<S> {
    pub fn new(store: Arc<S>, scheduler: Sm2Scheduler, deck_id: i64, learner_id: Uuid) -> Self {
        Self {
            store,
            scheduler,
            deck_id,
            learner_id,
            state: SessionState::Idle,
            queue: Vec::new(),
            position: 0,
            reviewed_count: 0,
        }
    }

    /// Load the deck and queue its due cards in deck order.
    ///
    /// Returns the number of queued cards. An empty queue completes the
    /// session immediately. On load failure the session returns to `Idle`.
    pub async fn open(&mut self, now: DateTime<Utc>) -> Result<usize> {
        self.expect(&[SessionState::Idle], "idle")?;
        self.state = SessionState::Loading;

        let loaded = match self
            .store
            .load_cards_and_states(self.deck_id, self.learner_id)
            .await
        {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(deck_id = self.deck_id, error = %err, "failed to load study queue");
                self.state = SessionState::Idle;
                return Err(SessionError::Load(err));
            }
        };

        let cards = loaded
            .into_iter()
            .map(|(card, state)| SessionCard {
                card,
                state: state.unwrap_or_else(|| self.scheduler.initial_state()),
            })
            .collect();
        let (due, _) = partition_due(cards, now);

        self.queue = due;
        self.position = 0;
        self.reviewed_count = 0;
        self.state = if self.queue.is_empty() {
            SessionState::Complete
        } else {
            SessionState::Active
        };

        tracing::debug!(
            deck_id = self.deck_id,
            learner_id = %self.learner_id,
            queued = self.queue.len(),
            "study session opened"
        );

        Ok(self.queue.len())
    }

    /// Rate the current card and advance to the next one.
    ///
    /// The write-back runs on its own task, spawned before the session
    /// advances, so it lands (or is logged) even if this future is dropped.
    /// A failed write is reported in the outcome but never aborts the session.
    pub async fn rate(&mut self, rating: i64, now: DateTime<Utc>) -> Result<ReviewOutcome> {
        self.expect(&[SessionState::Active], "active")?;

        let entry = &mut self.queue[self.position];
        let result = self
            .scheduler
            .schedule(&entry.state, Rating::from_value(rating), now);
        entry.state = result.new_state.clone();
        let card_id = entry.card.id;

        let write_back = self.spawn_save(card_id, result.new_state.clone());

        self.reviewed_count += 1;
        self.position += 1;
        if self.position >= self.queue.len() {
            self.state = SessionState::Complete;
            tracing::info!(
                deck_id = self.deck_id,
                learner_id = %self.learner_id,
                reviewed = self.reviewed_count,
                "study session complete"
            );
        }

        let persisted = match write_back.await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(card_id, learner_id = %self.learner_id, error = %err, "review state write-back task failed");
                false
            }
        };

        Ok(ReviewOutcome {
            card_id,
            result,
            persisted,
            session_complete: self.is_complete(),
        })
    }

    /// Walk the queue again from the first card with the counter reset.
    ///
    /// Earlier ratings are not replayed; new ratings build on the states
    /// produced during the previous pass.
    pub fn restart(&mut self) -> Result<()> {
        self.expect(&[SessionState::Active, SessionState::Complete], "active or complete")?;
        self.position = 0;
        self.reviewed_count = 0;
        if !self.queue.is_empty() {
            self.state = SessionState::Active;
        }
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deck_id(&self) -> i64 {
        self.deck_id
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    /// The card awaiting a rating, if the session is active.
    pub fn current_card(&self) -> Option<&SessionCard> {
        match self.state {
            SessionState::Active => self.queue.get(self.position),
            _ => None,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn reviewed_count(&self) -> usize {
        self.reviewed_count
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.position)
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    fn spawn_save(&self, card_id: i64, state: ReviewState) -> JoinHandle<bool> {
        let store = Arc::clone(&self.store);
        let learner_id = self.learner_id;
        tokio::spawn(async move {
            match store.save_state(card_id, learner_id, &state).await {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(card_id, learner_id = %learner_id, error = %err, "failed to save review state");
                    false
                }
            }
        })
    }

    fn expect(&self, allowed: &[SessionState], expected: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}
