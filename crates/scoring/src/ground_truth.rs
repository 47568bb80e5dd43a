use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use andeped_core::{AndepedError, Result};

/// Labelled anomaly timestamps per dataset, as stored in a labels JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth {
    labels: BTreeMap<String, Vec<String>>,
}

impl GroundTruth {
    pub fn new(labels: BTreeMap<String, Vec<String>>) -> Self {
        Self { labels }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Key for `dataset`: an exact match, else the first key containing it.
    pub fn resolve_key(&self, dataset: &str) -> Result<&str> {
        if let Some((key, _)) = self.labels.get_key_value(dataset) {
            return Ok(key);
        }
        self.labels
            .keys()
            .find(|key| key.contains(dataset))
            .map(String::as_str)
            .ok_or_else(|| AndepedError::MissingLabel {
                dataset: dataset.to_string(),
                label: "no labelled entry".into(),
            })
    }

    pub fn labels_for(&self, dataset: &str) -> Result<&[String]> {
        let key = self.resolve_key(dataset)?;
        Ok(self.labels.get(key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Positions of the dataset's labels in `timestamps`.
    pub fn indices(&self, dataset: &str, timestamps: &[String]) -> Result<Vec<usize>> {
        self.labels_for(dataset)?
            .iter()
            .map(|label| {
                timestamps
                    .iter()
                    .position(|t| t == label)
                    .ok_or_else(|| AndepedError::MissingLabel {
                        dataset: dataset.to_string(),
                        label: label.clone(),
                    })
            })
            .collect()
    }

    /// Like [`indices`](Self::indices) over the full `timestamps` column, but
    /// relative to the `scored` slice of it. Labels outside the slice are dropped.
    pub fn indices_within(
        &self,
        dataset: &str,
        timestamps: &[String],
        scored: Range<usize>,
    ) -> Result<Vec<usize>> {
        Ok(self
            .indices(dataset, timestamps)?
            .into_iter()
            .filter(|i| scored.contains(i))
            .map(|i| i - scored.start)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &str = r#"{
        "realKnownCause/machine_temperature_system_failure.csv": [
            "2013-12-11 06:00:00",
            "2013-12-16 17:25:00"
        ],
        "realKnownCause/ambient_temperature_system_failure.csv": [],
        "artificialWithAnomaly/art_daily_jumpsup.csv": ["2014-04-11 09:00:00"]
    }"#;

    fn timestamps() -> Vec<String> {
        vec![
            "2013-12-11 05:55:00".into(),
            "2013-12-11 06:00:00".into(),
            "2013-12-16 17:25:00".into(),
        ]
    }

    #[test]
    fn partial_name_resolves_key() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        assert_eq!(
            gt.resolve_key("machine_temperature").unwrap(),
            "realKnownCause/machine_temperature_system_failure.csv"
        );
        assert_eq!(gt.len(), 3);
    }

    #[test]
    fn first_sorted_key_wins() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        assert_eq!(
            gt.resolve_key("temperature_system").unwrap(),
            "realKnownCause/ambient_temperature_system_failure.csv"
        );
    }

    #[test]
    fn labels_resolve_to_indices() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        assert_eq!(gt.indices("machine_temperature", &timestamps()).unwrap(), vec![1, 2]);
        assert!(gt.indices("ambient", &timestamps()).unwrap().is_empty());
    }

    #[test]
    fn unknown_dataset() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        assert!(matches!(
            gt.indices("nyc_taxi", &timestamps()),
            Err(AndepedError::MissingLabel { .. })
        ));
    }

    #[test]
    fn label_missing_from_timestamps() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        let err = gt.indices("art_daily_jumpsup", &timestamps()).unwrap_err();
        match err {
            AndepedError::MissingLabel { label, .. } => assert_eq!(label, "2014-04-11 09:00:00"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn labels_outside_scored_slice_are_dropped() {
        let gt = GroundTruth::from_json_str(LABELS).unwrap();
        let ts = timestamps();
        // Offline part is index 0..2, online part 2..3.
        assert_eq!(gt.indices_within("machine_temperature", &ts, 0..2).unwrap(), vec![1]);
        assert_eq!(gt.indices_within("machine_temperature", &ts, 2..3).unwrap(), vec![0]);
        assert!(matches!(
            gt.indices_within("art_daily_jumpsup", &ts, 0..2),
            Err(AndepedError::MissingLabel { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined_labels.json");
        std::fs::write(&path, LABELS).unwrap();
        assert_eq!(GroundTruth::load(&path).unwrap().len(), 3);
    }
}
