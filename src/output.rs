//! Output formatting and persistence for grading results.
//!
//! Supports pretty-printing, JSON serialization, and CSV tables.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::session::SubjectResult;
use crate::summary::ClassSummary;

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    debug!(path = %path.display(), "JSON written");
    Ok(())
}

/// Writes one subject's graded records as a `Name,Marks,Grade` CSV.
pub fn write_subject_results(path: impl AsRef<Path>, result: &SubjectResult) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    for record in &result.records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = result.records.len(), "Subject results written");
    Ok(())
}

/// Writes the merged class summary CSV.
pub fn write_summary(path: impl AsRef<Path>, summary: &ClassSummary) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    writer.write_record(summary.headers())?;
    for row in &summary.rows {
        writer.write_record(ClassSummary::flatten(row))?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = summary.rows.len(), "Class summary written");
    Ok(())
}
