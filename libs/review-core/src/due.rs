//! Due-card selection.
//!
//! "Due" is binary: a card is either reviewable now or not, regardless of how
//! overdue it is.

use chrono::{DateTime, Utc};

use crate::types::ReviewState;

/// Anything that carries a next-review timestamp.
pub trait HasDueDate {
    /// `None` means never reviewed.
    fn next_review_at(&self) -> Option<DateTime<Utc>>;
}

impl HasDueDate for ReviewState {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }
}

impl HasDueDate for Option<DateTime<Utc>> {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        *self
    }
}

impl HasDueDate for Option<ReviewState> {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.as_ref().and_then(|state| state.next_review_at)
    }
}

impl<T: HasDueDate + ?Sized> HasDueDate for &T {
    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        (**self).next_review_at()
    }
}

/// A card is due when it was never reviewed or its review time has passed.
pub fn is_due<T: HasDueDate + ?Sized>(item: &T, now: DateTime<Utc>) -> bool {
    match item.next_review_at() {
        None => true,
        Some(at) => at <= now,
    }
}

/// Count due items without materializing them.
pub fn count_due<I>(items: I, now: DateTime<Utc>) -> usize
where
    I: IntoIterator,
    I::Item: HasDueDate,
{
    items.into_iter().filter(|item| is_due(item, now)).count()
}

/// Split items into `(due, not_due)`, keeping input order in both halves.
pub fn partition_due<T: HasDueDate>(items: Vec<T>, now: DateTime<Utc>) -> (Vec<T>, Vec<T>) {
    items.into_iter().partition(|item| is_due(item, now))
}
