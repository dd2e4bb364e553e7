use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{fs, path::PathBuf};

use crate::model::DayHistory;

/// Writes fetched history payloads to dated JSON files.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    /// Serialize `history` to `<output_dir>/<to_date>.json`, creating the
    /// directory if needed and overwriting any file a previous run left for
    /// the same date. Returns the written path.
    pub fn write_history(&self, history: &[DayHistory], to_date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let path = self.output_dir.join(format!("{to_date}.json"));

        let json = serde_json::to_string_pretty(history)
            .context("Failed to serialize weather history to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write history file: {}", path.display()))?;

        Ok(path)
    }
}
