//! Caller-owned grading state.
//!
//! A [`GradingSession`] holds the selected policy (with its rules, for the
//! absolute policy) and the records entered per subject. It is passed around
//! explicitly; nothing is cached between calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GradingError, Result};
use crate::grading::{NO_GRADE, absolute_grade, relative_grades};
use crate::roster::StudentRecord;
use crate::rules::Rule;

/// Policy selector as typed by a user: `Absolute` or `Relative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    Absolute,
    Relative,
}

impl FromStr for PolicyKind {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" => Ok(PolicyKind::Absolute),
            "relative" => Ok(PolicyKind::Relative),
            other => Err(GradingError::InvalidArgument(format!(
                "unknown grading policy `{other}` (expected Absolute or Relative)"
            ))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Absolute => f.write_str("Absolute"),
            PolicyKind::Relative => f.write_str("Relative"),
        }
    }
}

/// A grading policy ready to apply. The absolute variant owns its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradingPolicy {
    Absolute { rules: Vec<Rule> },
    Relative,
}

impl GradingPolicy {
    /// Builds a policy from a selector. `rules` is required for
    /// [`PolicyKind::Absolute`] and ignored for [`PolicyKind::Relative`].
    pub fn from_kind(kind: PolicyKind, rules: Option<Vec<Rule>>) -> Result<Self> {
        match kind {
            PolicyKind::Absolute => rules
                .map(|rules| GradingPolicy::Absolute { rules })
                .ok_or(GradingError::MissingRules),
            PolicyKind::Relative => Ok(GradingPolicy::Relative),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            GradingPolicy::Absolute { .. } => PolicyKind::Absolute,
            GradingPolicy::Relative => PolicyKind::Relative,
        }
    }

    /// Grades one subject's records, keeping their order.
    pub fn grade_records(&self, records: &[StudentRecord]) -> Result<Vec<GradedRecord>> {
        let grades: Vec<String> = match self {
            GradingPolicy::Absolute { rules } => records
                .iter()
                .map(|r| absolute_grade(r.marks, rules).to_string())
                .collect(),
            GradingPolicy::Relative => {
                let marks: Vec<f64> = records.iter().map(|r| r.marks as f64).collect();
                relative_grades(&marks)?
                    .into_iter()
                    .map(|g| g.to_string())
                    .collect()
            }
        };

        Ok(records
            .iter()
            .zip(grades)
            .map(|(r, grade)| GradedRecord {
                name: r.name.clone(),
                marks: r.marks,
                grade,
            })
            .collect())
    }
}

/// A student record with its assigned grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Marks")]
    pub marks: i64,
    #[serde(rename = "Grade")]
    pub grade: String,
}

/// Graded records for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectResult {
    pub subject: String,
    pub records: Vec<GradedRecord>,
}

impl SubjectResult {
    /// Number of students no absolute rule applied to.
    pub fn ungraded(&self) -> usize {
        self.records.iter().filter(|r| r.grade == NO_GRADE).count()
    }
}

#[derive(Debug, Clone)]
struct Subject {
    name: String,
    records: Vec<StudentRecord>,
}

/// Policy plus per-subject records, in the order subjects were added.
#[derive(Debug, Clone)]
pub struct GradingSession {
    policy: GradingPolicy,
    subjects: Vec<Subject>,
}

impl GradingSession {
    pub fn new(policy: GradingPolicy) -> Self {
        Self {
            policy,
            subjects: Vec::new(),
        }
    }

    pub fn policy(&self) -> &GradingPolicy {
        &self.policy
    }

    /// Adds a subject, replacing the records of an existing subject with the same name.
    pub fn add_subject(&mut self, name: impl Into<String>, records: Vec<StudentRecord>) {
        let name = name.into();
        match self.subjects.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                debug!(subject = %name, "Replacing subject records");
                existing.records = records;
            }
            None => self.subjects.push(Subject { name, records }),
        }
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|s| s.name.as_str())
    }

    pub fn records(&self, subject: &str) -> Option<&[StudentRecord]> {
        self.subjects
            .iter()
            .find(|s| s.name == subject)
            .map(|s| s.records.as_slice())
    }

    /// Grades one subject under the session policy.
    pub fn grade_subject(&self, subject: &str) -> Result<SubjectResult> {
        let records = self
            .records(subject)
            .ok_or_else(|| GradingError::UnknownSubject(subject.to_string()))?;

        let result = SubjectResult {
            subject: subject.to_string(),
            records: self.policy.grade_records(records)?,
        };

        let ungraded = result.ungraded();
        if ungraded > 0 {
            warn!(subject, ungraded, "Some marks matched no grading rule");
        }
        Ok(result)
    }

    /// Grades every subject, in insertion order.
    pub fn grade_all(&self) -> Result<Vec<SubjectResult>> {
        self.subjects
            .iter()
            .map(|s| self.grade_subject(&s.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;

    fn absolute_session() -> GradingSession {
        let rules = parse_rules(
            "grade(M, 'A') :- M >= 90.\n\
             grade(M, 'B') :- M >= 75.\n\
             grade(M, 'F') :- M >= 0.",
        )
        .unwrap();
        GradingSession::new(GradingPolicy::Absolute { rules })
    }

    fn roster() -> Vec<StudentRecord> {
        vec![
            StudentRecord::new("Asha", 92),
            StudentRecord::new("Ben", 80),
            StudentRecord::new("Cai", -5),
        ]
    }

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!("Absolute".parse::<PolicyKind>().unwrap(), PolicyKind::Absolute);
        assert_eq!(" relative ".parse::<PolicyKind>().unwrap(), PolicyKind::Relative);
        assert!("curve".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_absolute_policy_needs_rules() {
        assert!(matches!(
            GradingPolicy::from_kind(PolicyKind::Absolute, None),
            Err(GradingError::MissingRules)
        ));
        assert_eq!(
            GradingPolicy::from_kind(PolicyKind::Relative, None).unwrap(),
            GradingPolicy::Relative
        );
    }

    #[test]
    fn test_session_reports_policy_kind() {
        assert_eq!(absolute_session().policy().kind(), PolicyKind::Absolute);
        let relative = GradingSession::new(GradingPolicy::Relative);
        assert_eq!(relative.policy().kind(), PolicyKind::Relative);
        assert_eq!(relative.policy().kind().to_string(), "Relative");
    }

    #[test]
    fn test_grade_subject_absolute() {
        let mut session = absolute_session();
        session.add_subject("Maths", roster());

        let result = session.grade_subject("Maths").unwrap();
        let grades: Vec<_> = result.records.iter().map(|r| r.grade.as_str()).collect();
        assert_eq!(grades, vec!["A", "B", NO_GRADE]);
        assert_eq!(result.ungraded(), 1);
        assert_eq!(result.records[0].name, "Asha");
    }

    #[test]
    fn test_grade_subject_relative() {
        let mut session = GradingSession::new(GradingPolicy::Relative);
        session.add_subject(
            "Physics",
            vec![
                StudentRecord::new("a", 90),
                StudentRecord::new("b", 70),
                StudentRecord::new("c", 50),
                StudentRecord::new("d", 30),
                StudentRecord::new("e", 10),
            ],
        );

        let result = session.grade_subject("Physics").unwrap();
        let grades: Vec<_> = result.records.iter().map(|r| r.grade.as_str()).collect();
        assert_eq!(grades, vec!["A-", "B+", "B-", "C-", "D+"]);
    }

    #[test]
    fn test_relative_empty_subject_fails() {
        let mut session = GradingSession::new(GradingPolicy::Relative);
        session.add_subject("Empty", Vec::new());
        assert!(matches!(
            session.grade_subject("Empty"),
            Err(GradingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_subject() {
        let session = absolute_session();
        assert!(matches!(
            session.grade_subject("History"),
            Err(GradingError::UnknownSubject(_))
        ));
    }

    #[test]
    fn test_add_subject_replaces_and_keeps_order() {
        let mut session = absolute_session();
        session.add_subject("Maths", roster());
        session.add_subject("Art", vec![StudentRecord::new("Asha", 60)]);
        session.add_subject("Maths", vec![StudentRecord::new("Ben", 99)]);

        let names: Vec<_> = session.subject_names().collect();
        assert_eq!(names, vec!["Maths", "Art"]);
        assert_eq!(session.records("Maths").unwrap().len(), 1);

        let all = session.grade_all().unwrap();
        assert_eq!(all[0].records[0].grade, "A");
        assert_eq!(all[1].subject, "Art");
    }
}
