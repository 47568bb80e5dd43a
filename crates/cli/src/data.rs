//! Dataset discovery and series I/O.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct DataPoint {
    timestamp: String,
    value: f64,
}

/// A `timestamp,value` series, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSeries {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
}

impl DataSeries {
    pub fn read(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut series = DataSeries::default();
        for row in rdr.deserialize() {
            let point: DataPoint =
                row.with_context(|| format!("malformed row in {}", path.display()))?;
            series.timestamps.push(point.timestamp);
            series.values.push(point.value);
        }
        debug!(path = %path.display(), len = series.len(), "series loaded");
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Offline and online files of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub name: String,
    pub offline: PathBuf,
    pub online: PathBuf,
}

/// Online file for `name`: `name.csv`, else the first `name_adddata-*.csv`.
pub fn online_file(online_dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = online_dir.join(format!("{name}.csv"));
    if exact.is_file() {
        return Some(exact);
    }
    let prefix = format!("{name}_adddata-");
    let mut candidates: Vec<PathBuf> = csv_files(online_dir)
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    if candidates.len() > 1 {
        warn!(dataset = name, count = candidates.len(), "several online files, using the first");
    }
    candidates.into_iter().next()
}

fn csv_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().map(|e| e == "csv").unwrap_or(false))
        .collect()
}

/// Every `offline_dir/*.csv` with a matching online file, sorted by name.
///
/// `filters` keeps only names containing one of its entries; empty keeps all.
pub fn discover_datasets(
    offline_dir: &Path,
    online_dir: &Path,
    filters: &[String],
) -> Result<Vec<DatasetFiles>> {
    if !offline_dir.is_dir() {
        anyhow::bail!("offline directory {} does not exist", offline_dir.display());
    }

    let mut datasets = Vec::new();
    for offline in csv_files(offline_dir) {
        let Some(name) = offline.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if !filters.is_empty() && !filters.iter().any(|f| name.contains(f.as_str())) {
            continue;
        }
        match online_file(online_dir, &name) {
            Some(online) => datasets.push(DatasetFiles {
                name,
                offline,
                online,
            }),
            None => warn!(dataset = %name, "no online data, skipping"),
        }
    }

    datasets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(datasets)
}
