//! SM-2 spaced repetition scheduler.
//!
//! Based on SuperMemo 2: two fixed opening intervals for the first successful
//! reviews, then multiplicative growth driven by the ease factor.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::quality;
use crate::types::{Rating, ReviewState, SchedulingResult};

/// SM-2 scheduler with configurable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sm2Scheduler {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub maximum_interval_days: u32,
    /// Interval after the first successful review.
    pub first_interval_days: u32,
    /// Interval after the second consecutive successful review.
    pub second_interval_days: u32,
}

impl Default for Sm2Scheduler {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            maximum_interval_days: 365,
            first_interval_days: 1,
            second_interval_days: 3,
        }
    }
}

impl Sm2Scheduler {
    /// Initial state for a card that was never reviewed.
    pub fn initial_state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.initial_ease,
            interval_days: 0,
            repetitions: 0,
            next_review_at: None,
        }
    }

    /// Score a raw rating against an optional stored state.
    ///
    /// A missing state is treated as a brand-new card.
    pub fn review(
        &self,
        rating: i64,
        prior: Option<&ReviewState>,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let prior = prior.cloned().unwrap_or_else(|| self.initial_state());
        self.schedule(&prior, Rating::from_value(rating), now)
    }

    /// Calculate the next review state after a review.
    pub fn schedule(
        &self,
        state: &ReviewState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let confidence = rating.confidence();
        let ease_factor = self.next_ease(self.sanitize_ease(state.ease_factor), confidence);

        let (interval_days, repetitions) = if !quality::is_passing(confidence) {
            (self.first_interval_days, 0)
        } else {
            match state.repetitions {
                0 => (self.first_interval_days, 1),
                1 => (self.second_interval_days, 2),
                reps => {
                    let grown = (f64::from(state.interval_days) * ease_factor).round();
                    let grown = grown.min(f64::from(self.maximum_interval_days)) as u32;
                    (grown, reps.saturating_add(1))
                }
            }
        };
        let interval_days = interval_days.clamp(1, self.maximum_interval_days.max(1));

        let next_review_at = now + Duration::days(i64::from(interval_days));

        SchedulingResult {
            new_state: ReviewState {
                ease_factor,
                interval_days,
                repetitions,
                next_review_at: Some(next_review_at),
            },
            next_review_at,
        }
    }

    fn next_ease(&self, ease: f64, confidence: u8) -> f64 {
        let miss = f64::from(5 - confidence.min(5));
        let updated = ease + (0.1 - miss * (0.08 + miss * 0.02));
        updated.max(self.minimum_ease)
    }

    fn sanitize_ease(&self, ease: f64) -> f64 {
        if ease.is_finite() {
            ease.max(self.minimum_ease)
        } else {
            self.initial_ease
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn state(ease_factor: f64, interval_days: u32, repetitions: u32) -> ReviewState {
        ReviewState {
            ease_factor,
            interval_days,
            repetitions,
            next_review_at: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn new_card_good_gets_one_day() {
        let sm2 = Sm2Scheduler::default();
        let result = sm2.review(2, None, now());
        assert_eq!(result.new_state.interval_days, 1);
        assert_eq!(result.new_state.repetitions, 1);
    }

    #[test]
    fn new_card_easy_then_easy_follows_fixed_opening_intervals() {
        let sm2 = Sm2Scheduler::default();
        let first = sm2.schedule(&sm2.initial_state(), Rating::Easy, now());
        assert_eq!(first.new_state.interval_days, 1);
        assert_eq!(first.new_state.repetitions, 1);

        let second = sm2.schedule(&first.new_state, Rating::Easy, now());
        assert_eq!(second.new_state.interval_days, 3);
        assert_eq!(second.new_state.repetitions, 2);
    }

    #[test]
    fn third_success_grows_by_ease() {
        let sm2 = Sm2Scheduler::default();
        let result = sm2.schedule(&state(2.5, 3, 2), Rating::Easy, now());
        assert_close(result.new_state.ease_factor, 2.6);
        // round(3 * 2.6)
        assert_eq!(result.new_state.interval_days, 8);
        assert_eq!(result.new_state.repetitions, 3);
    }

    #[test]
    fn failure_resets_repetitions() {
        let sm2 = Sm2Scheduler::default();
        for rating in [Rating::Again, Rating::Hard] {
            let result = sm2.schedule(&state(2.5, 40, 5), rating, now());
            assert_eq!(result.new_state.repetitions, 0);
            assert_eq!(result.new_state.interval_days, 1);
        }
    }

    #[test]
    fn failure_still_updates_ease() {
        let sm2 = Sm2Scheduler::default();
        let again = sm2.schedule(&state(2.5, 10, 3), Rating::Again, now());
        assert_close(again.new_state.ease_factor, 1.7);

        let hard = sm2.schedule(&state(2.5, 10, 3), Rating::Hard, now());
        assert_close(hard.new_state.ease_factor, 2.18);
    }

    #[test]
    fn out_of_range_ratings_match_boundaries() {
        let sm2 = Sm2Scheduler::default();
        let at = now();
        let prior = state(2.2, 12, 4);
        assert_eq!(sm2.review(-5, Some(&prior), at), sm2.review(0, Some(&prior), at));
        assert_eq!(sm2.review(10, Some(&prior), at), sm2.review(3, Some(&prior), at));
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = Sm2Scheduler::default();
        let mut current = state(1.3, 1, 0);
        for _ in 0..25 {
            current = sm2.schedule(&current, Rating::Good, now()).new_state;
            assert!(current.ease_factor >= 1.3);
        }
        assert_close(current.ease_factor, 1.3);
    }

    #[test]
    fn interval_capped_at_one_year() {
        let sm2 = Sm2Scheduler::default();
        let result = sm2.schedule(&state(2.5, 300, 20), Rating::Easy, now());
        assert_eq!(result.new_state.interval_days, 365);
        assert_eq!(result.new_state.repetitions, 21);
    }

    #[test]
    fn invariants_hold_for_all_ratings() {
        let sm2 = Sm2Scheduler::default();
        let priors = [
            sm2.initial_state(),
            state(1.3, 0, 0),
            state(1.3, 1, 1),
            state(2.5, 3, 2),
            state(3.4, 200, 9),
            state(2.5, 365, 30),
        ];
        for prior in &priors {
            for rating in 0..=3 {
                let result = sm2.review(rating, Some(prior), now());
                assert!(result.new_state.ease_factor >= 1.3);
                assert!((1..=365).contains(&result.new_state.interval_days));
            }
        }
    }

    #[test]
    fn degenerate_prior_state_is_sanitized() {
        let sm2 = Sm2Scheduler::default();
        let nan = sm2.schedule(&state(f64::NAN, 3, 2), Rating::Good, now());
        assert!(nan.new_state.ease_factor.is_finite());
        assert!(nan.new_state.ease_factor >= 1.3);

        let zero = sm2.schedule(&state(0.0, 5, 3), Rating::Easy, now());
        assert_close(zero.new_state.ease_factor, 1.4);

        // A repeated card with a zero interval still moves forward.
        let stalled = sm2.schedule(&state(2.5, 0, 4), Rating::Good, now());
        assert_eq!(stalled.new_state.interval_days, 1);
    }

    #[test]
    fn next_review_is_strictly_in_future() {
        let sm2 = Sm2Scheduler::default();
        for rating in 0..=3 {
            let at = now();
            let result = sm2.review(rating, None, at);
            assert!(result.next_review_at > at);
            assert_eq!(result.new_state.next_review_at, Some(result.next_review_at));
            assert_eq!(
                result.next_review_at - at,
                Duration::days(i64::from(result.new_state.interval_days))
            );
        }
    }
}
