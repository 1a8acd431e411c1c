//! Roster ingestion: per-subject CSV files of `Name,Marks` rows.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One student's mark in one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Marks")]
    pub marks: i64,
}

impl StudentRecord {
    pub fn new(name: impl Into<String>, marks: i64) -> Self {
        Self {
            name: name.into(),
            marks,
        }
    }
}

/// Reads a roster from any CSV source with a `Name,Marks` header.
///
/// Rows with a blank name are skipped. A row whose marks are not an integer
/// is an error.
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<StudentRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<StudentRecord>().enumerate() {
        let record = result.with_context(|| format!("invalid roster row {}", idx + 1))?;
        if record.name.is_empty() {
            warn!(row = idx + 1, "Skipping roster row with blank name");
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Loads a roster CSV from disk.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<StudentRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open roster {}", path.display()))?;
    let records =
        read_roster(file).with_context(|| format!("failed to read roster {}", path.display()))?;
    debug!(students = records.len(), "Roster loaded");
    Ok(records)
}
