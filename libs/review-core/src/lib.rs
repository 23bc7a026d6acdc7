//! Spaced repetition scheduling core shared by the backend service.
//!
//! Provides:
//! - Rating to confidence mapping (4-point to 6-point scale)
//! - SM-2 scheduler producing the next review state
//! - Due-card selection over stored review states
//! - Study session controller walking a deck one rating at a time

pub mod due;
pub mod error;
pub mod quality;
pub mod scheduler;
pub mod session;
pub mod types;

pub use due::{count_due, is_due, partition_due, HasDueDate};
pub use error::{Result, SessionError, StoreError};
pub use quality::map_to_confidence;
pub use scheduler::Sm2Scheduler;
pub use session::{ReviewOutcome, ReviewStore, SessionCard, SessionState, StudySession};
pub use types::{Card, Deck, Rating, ReviewState, SchedulingResult};
