//! Property tests for the scoring stages.

use andeped_scoring::{build_windows, evaluate, rising_edges, ScoringOptions, WindowSize};
use proptest::prelude::*;

fn runs_of_true(values: &[bool]) -> usize {
    let mut runs = 0;
    let mut previous = false;
    for &v in values {
        if v && !previous {
            runs += 1;
        }
        previous = v;
    }
    runs
}

proptest! {
    #[test]
    fn edges_count_runs_after_first_step(values in prop::collection::vec(any::<bool>(), 0..200)) {
        let edges = rising_edges(&values);
        prop_assert_eq!(edges.len(), values.len());
        if let Some(first) = edges.first() {
            prop_assert!(!first);
        }
        // A run starting at 0 has no visible onset.
        let expected = runs_of_true(&values) - usize::from(values.first() == Some(&true));
        prop_assert_eq!(edges.iter().filter(|e| **e).count(), expected);
    }

    #[test]
    fn window_ids_are_non_decreasing_and_bounded(
        flags in prop::collection::btree_set(0usize..300, 0..8),
        window in 0usize..40,
        len in 1usize..300,
    ) {
        let flags: Vec<usize> = flags.into_iter().collect();
        let labels = build_windows(&flags, window, len);
        prop_assert_eq!(labels.len(), len);
        let in_range = flags.iter().filter(|f| **f < len).count() as u32;
        prop_assert!(labels.iter().all(|l| *l <= in_range));
        prop_assert!(labels.windows(2).all(|w| w[1] == 0 || w[0] == 0 || w[0] <= w[1]));
        prop_assert_eq!(labels[len - 1], 0);
    }

    #[test]
    fn evaluation_is_idempotent(
        detections in prop::collection::vec(any::<bool>(), 1..200),
        flags in prop::collection::vec(0usize..200, 0..5),
        normalize in any::<bool>(),
        rising_edge in any::<bool>(),
    ) {
        let options = ScoringOptions { window_size: WindowSize::Nab, normalize, rising_edge };
        let a = evaluate(&detections, &flags, &options).unwrap();
        let b = evaluate(&detections, &flags, &options).unwrap();
        prop_assert_eq!(a.counts.true_positives, b.counts.true_positives);
        prop_assert_eq!(a.counts.false_negatives, b.counts.false_negatives);
        prop_assert_eq!(a.counts.false_positives.to_bits(), b.counts.false_positives.to_bits());
        prop_assert_eq!(a.counts.true_negatives.to_bits(), b.counts.true_negatives.to_bits());
        prop_assert_eq!(a.metrics.f1.to_bits(), b.metrics.f1.to_bits());
    }
}
