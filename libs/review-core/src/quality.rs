//! Mapping from the 4-point learner rating to the 6-point confidence scale.

/// Lowest confidence that counts as a successful recall.
pub const PASSING_CONFIDENCE: u8 = 3;

/// Project a 0-3 rating onto the 0-5 confidence scale.
///
/// Input is clamped into `[0, 3]` first, giving `0→0, 1→2, 2→3, 3→5`.
pub fn map_to_confidence(rating: i64) -> u8 {
    let rating = rating.clamp(0, 3) as f64;
    (rating * 5.0 / 3.0).round() as u8
}

/// Whether a confidence value is a pass.
pub fn is_passing(confidence: u8) -> bool {
    confidence >= PASSING_CONFIDENCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_fixed_table() {
        let mapped: Vec<u8> = (0..=3).map(map_to_confidence).collect();
        assert_eq!(mapped, vec![0, 2, 3, 5]);
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(map_to_confidence(-5), 0);
        assert_eq!(map_to_confidence(i64::MIN), 0);
        assert_eq!(map_to_confidence(10), 5);
        assert_eq!(map_to_confidence(i64::MAX), 5);
    }

    #[test]
    fn only_good_and_easy_pass() {
        assert!(!is_passing(map_to_confidence(0)));
        assert!(!is_passing(map_to_confidence(1)));
        assert!(is_passing(map_to_confidence(2)));
        assert!(is_passing(map_to_confidence(3)));
    }
}
