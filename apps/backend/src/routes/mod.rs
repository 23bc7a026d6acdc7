pub mod auth;
pub mod decks;
pub mod learner;
pub mod sessions;
pub mod study;
