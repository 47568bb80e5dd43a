use serde::{Deserialize, Serialize};

/// How the anomaly window size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowSize {
    /// 10% of the series split evenly across the labelled anomalies.
    #[default]
    Nab,
    Fixed(usize),
}

impl WindowSize {
    pub fn resolve(&self, len: usize, flag_count: usize) -> usize {
        match self {
            WindowSize::Nab => anomaly_window_size(len, flag_count),
            WindowSize::Fixed(w) => *w,
        }
    }
}

/// `ceil(0.1 * len / flag_count)`, or `ceil(0.1 * len)` without flags.
pub fn anomaly_window_size(len: usize, flag_count: usize) -> usize {
    let tenth = 0.1 * len as f64;
    if flag_count == 0 {
        tenth.ceil() as usize
    } else {
        (tenth / flag_count as f64).ceil() as usize
    }
}

/// Label every timestep with the 1-based id of the window covering it, 0 outside.
///
/// Flags are visited in ascending order. A flag close to the previous one
/// starts its window halfway between the two; otherwise the window starts
/// `window` steps before the flag. Windows end at `min(flag + window, len - 2)`.
/// Where windows overlap the later one wins. Flags outside `0..len` are ignored.
pub fn build_windows(flags: &[usize], window: usize, len: usize) -> Vec<u32> {
    let mut labels = vec![0u32; len];
    let mut flagged = vec![false; len];
    for &f in flags {
        if f < len {
            flagged[f] = true;
        }
    }

    let mut gap = window.saturating_add(1);
    let mut occurrence = 0u32;
    let end_cap = len.saturating_sub(1);

    for y in 0..len {
        if !flagged[y] {
            if occurrence > 0 {
                gap = gap.saturating_add(1);
            }
            continue;
        }

        gap = gap.saturating_add(1);
        occurrence += 1;
        let start = if gap < window {
            y.saturating_sub((gap - 1) / 2)
        } else {
            y.saturating_sub(window)
        };
        let end = y.saturating_add(window).saturating_add(1).min(end_cap);
        if start < end {
            labels[start..end].fill(occurrence);
        }
        gap = 0;
    }

    labels
}
