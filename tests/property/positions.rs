//! Property-based tests for fractional position keys.
//!
//! Uses proptest to verify:
//! 1. A position inserted below another is strictly between its neighbors
//!    whenever the gap is not exhausted.
//! 2. Positions survive the string wire encoding round trip.
//! 3. `total_cmp` sorting agrees with the numeric order.
//! 4. Arbitrary strings never cause a panic in parsing (returns `Err`
//!    gracefully for non-numeric input).

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use taskdeck_proto::position::Position;

/// Strategy for generating finite positions in a realistic range.
fn arb_position() -> impl Strategy<Value = Position> {
    (-1.0e12f64..1.0e12f64).prop_map(|v| Position::new(v).expect("finite by construction"))
}

proptest! {
    #[test]
    fn below_tail_is_strictly_greater(p in arb_position()) {
        let below = p.below(None);
        prop_assert!(p < below);
    }

    #[test]
    fn midpoint_is_strictly_between_unless_exhausted(a in arb_position(), b in arb_position()) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        prop_assume!(lo < hi);
        prop_assume!(!lo.gap_exhausted(hi));

        let mid = lo.below(Some(hi));
        prop_assert!(lo < mid, "midpoint {mid} not above {lo}");
        prop_assert!(mid < hi, "midpoint {mid} not below {hi}");
    }

    #[test]
    fn wire_encoding_round_trips(p in arb_position()) {
        let json = serde_json::to_string(&p).unwrap();
        // Always a JSON string, never a bare number.
        prop_assert!(json.starts_with('"') && json.ends_with('"'));

        let back: Position = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, p);
    }

    #[test]
    fn display_parse_round_trips(p in arb_position()) {
        let shown = p.to_string();
        let back: Position = shown.parse().unwrap();
        prop_assert_eq!(back, p);
    }

    #[test]
    fn total_cmp_sort_matches_numeric_order(mut values in prop::collection::vec(arb_position(), 0..32)) {
        values.sort_by(Position::total_cmp);
        for pair in values.windows(2) {
            prop_assert!(pair[0].value() <= pair[1].value());
        }
    }

    #[test]
    fn parsing_arbitrary_strings_never_panics(s in ".*") {
        // Either parses to a finite position or fails cleanly.
        if let Ok(p) = s.parse::<Position>() {
            prop_assert!(p.value().is_finite());
        }
    }

    #[test]
    fn from_index_is_monotonic(index in 0usize..10_000) {
        let a = Position::from_index(index);
        let b = Position::from_index(index + 1);
        prop_assert!(a < b);
    }
}
