//! Cross-subject class summary and per-subject grade distributions.
//!
//! The class summary is an outer join of every graded subject on student
//! name: a student missing from a subject gets [`MISSING`] in that subject's
//! columns. Students are listed in the order they are first seen.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::session::{GradedRecord, PolicyKind, SubjectResult};

/// Placeholder for a subject a student has no record in.
pub const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCell {
    pub marks: i64,
    pub grade: String,
}

/// One student's line in the class summary; `cells[i]` belongs to `subjects[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub cells: Vec<Option<SubjectCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub subjects: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl ClassSummary {
    /// Column headers: `Name`, then `<Subject>_Marks`, `<Subject>_Grade` per subject.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Name".to_string()];
        for subject in &self.subjects {
            headers.push(format!("{subject}_Marks"));
            headers.push(format!("{subject}_Grade"));
        }
        headers
    }

    /// Flattens a row into strings matching [`ClassSummary::headers`].
    pub fn flatten(row: &SummaryRow) -> Vec<String> {
        let mut out = Vec::with_capacity(1 + row.cells.len() * 2);
        out.push(row.name.clone());
        for cell in &row.cells {
            match cell {
                Some(c) => {
                    out.push(c.marks.to_string());
                    out.push(c.grade.clone());
                }
                None => {
                    out.push(MISSING.to_string());
                    out.push(MISSING.to_string());
                }
            }
        }
        out
    }
}

/// Outer-joins graded subjects on student name.
pub fn merge_subjects(results: &[SubjectResult]) -> ClassSummary {
    let subjects: Vec<String> = results.iter().map(|r| r.subject.clone()).collect();
    let mut rows: Vec<SummaryRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (col, result) in results.iter().enumerate() {
        for record in &result.records {
            let row = *index.entry(record.name.clone()).or_insert_with(|| {
                rows.push(SummaryRow {
                    name: record.name.clone(),
                    cells: vec![None; subjects.len()],
                });
                rows.len() - 1
            });

            let cell = &mut rows[row].cells[col];
            if cell.is_some() {
                warn!(
                    subject = %result.subject,
                    student = %record.name,
                    "Duplicate student in subject, keeping first record"
                );
                continue;
            }
            *cell = Some(SubjectCell {
                marks: record.marks,
                grade: record.grade.clone(),
            });
        }
    }

    ClassSummary { subjects, rows }
}

/// Number of students per grade, ordered by grade label.
pub fn grade_distribution(records: &[GradedRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.grade.clone()).or_insert(0) += 1;
    }
    counts
}

/// Per-subject section of a [`GradeReport`].
#[derive(Debug, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    pub students: usize,
    pub ungraded: usize,
    pub distribution: BTreeMap<String, usize>,
    pub records: Vec<GradedRecord>,
}

/// Complete grading result, serialized as the JSON report.
#[derive(Debug, Serialize)]
pub struct GradeReport {
    pub generated_at: DateTime<Utc>,
    pub policy: PolicyKind,
    pub subjects: Vec<SubjectReport>,
}

impl GradeReport {
    pub fn new(policy: PolicyKind, results: &[SubjectResult]) -> Self {
        GradeReport {
            generated_at: Utc::now(),
            policy,
            subjects: results
                .iter()
                .map(|r| SubjectReport {
                    subject: r.subject.clone(),
                    students: r.records.len(),
                    ungraded: r.ungraded(),
                    distribution: grade_distribution(&r.records),
                    records: r.records.clone(),
                })
                .collect(),
        }
    }
}
