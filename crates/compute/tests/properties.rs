//! Property tests for the stateless pipeline stages.

use andeped_compute::pipeline::rescale;
use andeped_compute::{BoundedBuffer, ModePattern, ScaleRange};
use proptest::prelude::*;

proptest! {
    #[test]
    fn buffer_keeps_newest_values(
        capacity in 1usize..32,
        values in prop::collection::vec(-1e6f64..1e6, 0..100),
    ) {
        let mut buffer = BoundedBuffer::new(capacity).unwrap();
        for &v in &values {
            buffer.add(v);
        }
        let keep = values.len().min(capacity);
        prop_assert_eq!(buffer.snapshot(), values[values.len() - keep..].to_vec());
        prop_assert!(buffer.len() <= capacity);
    }

    #[test]
    fn rescale_stays_in_range(values in prop::collection::vec(-1e6f64..1e6, 1..64)) {
        let range = ScaleRange::default();
        let out = rescale(&values, range);
        prop_assert_eq!(out.len(), values.len());
        prop_assert!(out.iter().all(|v| (range.lo..=range.hi).contains(v)));
    }

    #[test]
    fn rescale_hits_both_ends_for_non_constant_input(
        values in prop::collection::vec(-1e3f64..1e3, 2..64),
    ) {
        let distinct = values.iter().any(|v| *v != values[0]);
        prop_assume!(distinct);
        let out = rescale(&values, ScaleRange::default());
        prop_assert!(out.contains(&-1.0));
        prop_assert!(out.contains(&1.0));
    }

    #[test]
    fn tiling_repeats_the_pattern(
        pattern in prop::collection::vec(-5f64..5.0, 1..20),
        length in 0usize..100,
    ) {
        let p = ModePattern::new(pattern.clone()).unwrap();
        let tiled = p.tile(length);
        prop_assert_eq!(tiled.len(), length);
        for (i, v) in tiled.iter().enumerate() {
            prop_assert_eq!(*v, pattern[i % pattern.len()]);
        }
    }
}
