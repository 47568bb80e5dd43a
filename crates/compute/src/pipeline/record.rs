use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use andeped_core::{AndepedError, Result};

/// One streamed sample and what the pipeline made of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub algorithm: String,
    pub dataset: String,
    pub timestep: u64,
    pub original_value: f64,
    pub residual_value: f64,
    pub anomaly_score: f64,
}

/// Append-only per-run log, exported once when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    rows: Vec<RecordRow>,
}

fn csv_err(e: csv::Error) -> AndepedError {
    AndepedError::Csv(e.to_string())
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row and return it.
    pub fn push(&mut self, row: RecordRow) -> &RecordRow {
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&RecordRow> {
        self.rows.last()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.anomaly_score).collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            wtr.write_record([
                "algorithm",
                "dataset",
                "timestep",
                "original_value",
                "residual_value",
                "anomaly_score",
            ])
            .map_err(csv_err)?;
        }
        for row in &self.rows {
            wtr.serialize(row).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<RecordRow>, _>>()
            .map_err(csv_err)?;
        Ok(Self { rows })
    }

    pub fn import_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(std::io::BufReader::new(file))
    }
}
