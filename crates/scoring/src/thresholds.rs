use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use andeped_core::{AndepedError, Result};

/// Detectors whose scores are always cut at 0.5.
const HALF_THRESHOLD_FAMILY: &[&str] = &["andeped", "andepedpro", "rere", "alter-rere", "arep"];

pub fn is_half_threshold(detector: &str) -> bool {
    let lower = detector.to_ascii_lowercase();
    HALF_THRESHOLD_FAMILY.contains(&lower.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ThresholdEntry {
    threshold: f64,
}

/// Per-detector thresholds in the NAB layout, read for one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    table: BTreeMap<String, BTreeMap<String, ThresholdEntry>>,
    profile: String,
}

impl Thresholds {
    /// No table: only the fixed 0.5 family resolves.
    pub fn empty(profile: impl Into<String>) -> Self {
        Self {
            table: BTreeMap::new(),
            profile: profile.into(),
        }
    }

    pub fn from_json_str(json: &str, profile: impl Into<String>) -> Result<Self> {
        Ok(Self {
            table: serde_json::from_str(json)?,
            profile: profile.into(),
        })
    }

    pub fn load(path: &Path, profile: impl Into<String>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text, profile)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn threshold_for(&self, detector: &str) -> Result<f64> {
        if is_half_threshold(detector) {
            return Ok(0.5);
        }
        self.table
            .get(detector)
            .and_then(|profiles| profiles.get(&self.profile))
            .map(|entry| entry.threshold)
            .ok_or_else(|| {
                AndepedError::UnknownDetector(format!(
                    "no '{}' threshold for '{detector}'",
                    self.profile
                ))
            })
    }
}

/// `score >= threshold` per position.
pub fn binarize(scores: &[f64], threshold: f64) -> Vec<bool> {
    scores.iter().map(|&s| s >= threshold).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAB: &str = r#"{
        "windowedGaussian": {
            "reward_low_FN_rate": {"score": -3.9, "threshold": 1.0},
            "standard": {"score": -1.4, "threshold": 0.99999}
        },
        "random": {"standard": {"score": -2.0, "threshold": 0.95}}
    }"#;

    #[test]
    fn profile_selects_threshold() {
        let t = Thresholds::from_json_str(NAB, "standard").unwrap();
        assert_eq!(t.threshold_for("windowedGaussian").unwrap(), 0.99999);
        let low_fn = Thresholds::from_json_str(NAB, "reward_low_FN_rate").unwrap();
        assert_eq!(low_fn.threshold_for("windowedGaussian").unwrap(), 1.0);
    }

    #[test]
    fn half_family_ignores_table() {
        let t = Thresholds::empty("standard");
        assert_eq!(t.threshold_for("AnDePeDPro").unwrap(), 0.5);
        assert_eq!(t.threshold_for("alter-ReRe").unwrap(), 0.5);
        assert!(!is_half_threshold("bayesChangePt"));
    }

    #[test]
    fn unknown_detector_or_profile() {
        let t = Thresholds::from_json_str(NAB, "standard").unwrap();
        assert!(matches!(
            t.threshold_for("bayesChangePt"),
            Err(AndepedError::UnknownDetector(_))
        ));
        let other = Thresholds::from_json_str(NAB, "reward_low_FP_rate").unwrap();
        assert!(other.threshold_for("random").is_err());
    }

    #[test]
    fn binarize_is_inclusive() {
        assert_eq!(binarize(&[0.2, 0.5, 0.9], 0.5), vec![false, true, true]);
    }
}
