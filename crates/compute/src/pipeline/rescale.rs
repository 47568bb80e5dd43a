/// Target range of the per-call min-max rescale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub lo: f64,
    pub hi: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { lo: -1.0, hi: 1.0 }
    }
}

/// Map `values` linearly so their minimum lands on `range.lo` and maximum on `range.hi`.
///
/// The bounds are refit from `values` on every call; nothing is carried over
/// between calls. A constant input maps entirely to `range.lo`.
pub fn rescale(values: &[f64], range: ScaleRange) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;

    if span <= 0.0 || !span.is_finite() {
        return vec![range.lo; values.len()];
    }

    let scale = (range.hi - range.lo) / span;
    values
        .iter()
        .map(|&v| {
            if v == max {
                range.hi
            } else {
                (range.lo + (v - min) * scale).clamp(range.lo, range.hi)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes_map_to_range_bounds() {
        let out = rescale(&[2.0, 4.0, 6.0], ScaleRange::default());
        assert_eq!(out, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn constant_input_maps_to_lower_bound() {
        let out = rescale(&[3.0, 3.0, 3.0], ScaleRange { lo: 0.0, hi: 1.0 });
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(rescale(&[], ScaleRange::default()).is_empty());
    }

    #[test]
    fn refits_every_call() {
        let range = ScaleRange { lo: 0.0, hi: 1.0 };
        let first = rescale(&[0.0, 10.0], range);
        let second = rescale(&[10.0, 20.0], range);
        // Same absolute value 10.0 lands at opposite ends of the two windows.
        assert_eq!(first[1], 1.0);
        assert_eq!(second[0], 0.0);
    }
}
