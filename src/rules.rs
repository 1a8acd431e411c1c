//! Rule-file loader.
//!
//! A rule file holds one Prolog-style clause per line:
//!
//! ```text
//! grade(Marks, 'A') :- Marks >= 90.
//! grade(Marks, 'B') :- Marks >= 75, Marks < 90.
//! ```
//!
//! Only lines starting with `grade(` are rules; everything else (blank lines,
//! `%` comments, other clauses) is skipped. Rules keep their file order, which
//! decides ties during absolute grading.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{GradingError, Result};

/// Keyword that marks a line as a rule.
pub const RULE_KEYWORD: &str = "grade";

/// Default rule file name, looked up relative to the working directory.
pub const DEFAULT_RULES_FILE: &str = "grading_rules.pl";

static HEAD_RE: OnceLock<Regex> = OnceLock::new();
static CONDITION_RE: OnceLock<Regex> = OnceLock::new();

fn head_re() -> &'static Regex {
    // grade(Var, 'LABEL') with a single-quoted, double-quoted or bare label
    HEAD_RE.get_or_init(|| {
        let pattern = format!(
            r#"^{}\s*\(\s*[A-Za-z_][A-Za-z0-9_]*\s*,\s*(?:'([^']*)'|"([^"]*)"|([^\s,()'"]+))\s*\)$"#,
            regex::escape(RULE_KEYWORD)
        );
        Regex::new(&pattern).expect("rule head pattern is valid")
    })
}

fn condition_re() -> &'static Regex {
    CONDITION_RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*\s*)?(>=|=<|<=|>|<)\s*(-?\d+)$")
            .expect("condition pattern is valid")
    })
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Ge,
    Le,
    Gt,
    Lt,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            ">=" => Some(Operator::Ge),
            "<=" | "=<" => Some(Operator::Le),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }
}

/// One `operator threshold` comparison against a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub op: Operator,
    pub threshold: i64,
}

impl Condition {
    pub fn new(op: Operator, threshold: i64) -> Self {
        Self { op, threshold }
    }

    pub fn holds(&self, mark: i64) -> bool {
        match self.op {
            Operator::Ge => mark >= self.threshold,
            Operator::Le => mark <= self.threshold,
            Operator::Gt => mark > self.threshold,
            Operator::Lt => mark < self.threshold,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marks {} {}", self.op.symbol(), self.threshold)
    }
}

/// A grade label and the conditions that must all hold for it to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub grade: String,
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(grade: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            grade: grade.into(),
            conditions,
        }
    }

    /// True when every condition holds for `mark`.
    pub fn matches(&self, mark: i64) -> bool {
        self.conditions.iter().all(|c| c.holds(mark))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- ", self.grade)?;
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Reads and parses the rule file at `path`.
///
/// # Errors
///
/// [`GradingError::RuleFileNotFound`] if the file is missing,
/// [`GradingError::Io`] for other read failures and
/// [`GradingError::Parse`] for the first malformed rule line.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            GradingError::RuleFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            GradingError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let rules = parse_rules(&text)?;
    info!(rule_count = rules.len(), "Grading rules loaded");
    Ok(rules)
}

/// Parses rule-file text already held in memory.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if !is_rule_line(line) {
            if !line.is_empty() {
                debug!(line = idx + 1, "Skipping non-rule line");
            }
            continue;
        }

        let rule = parse_rule_line(line).map_err(|reason| GradingError::Parse {
            line: idx + 1,
            content: line.to_string(),
            reason,
        })?;
        debug!(line = idx + 1, rule = %rule, "Parsed rule");
        rules.push(rule);
    }

    Ok(rules)
}

fn is_rule_line(line: &str) -> bool {
    line.strip_prefix(RULE_KEYWORD)
        .is_some_and(|rest| rest.trim_start().starts_with('('))
}

fn parse_rule_line(line: &str) -> std::result::Result<Rule, String> {
    let (head, body) = line
        .split_once(":-")
        .ok_or_else(|| "missing `:-` between head and conditions".to_string())?;

    let caps = head_re()
        .captures(head.trim())
        .ok_or_else(|| format!("head must look like {RULE_KEYWORD}(Var, 'LABEL')"))?;
    let grade = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if grade.is_empty() {
        return Err("grade label is empty".to_string());
    }

    let body = body
        .trim()
        .strip_suffix('.')
        .ok_or_else(|| "missing terminating `.`".to_string())?
        .trim();
    if body.is_empty() {
        return Err("rule has no conditions".to_string());
    }

    let conditions = body
        .split(',')
        .map(|token| parse_condition(token.trim()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Rule::new(grade, conditions))
}

fn parse_condition(token: &str) -> std::result::Result<Condition, String> {
    let caps = condition_re()
        .captures(token)
        .ok_or_else(|| format!("unrecognised condition `{token}`"))?;

    let op = Operator::from_token(&caps[1])
        .ok_or_else(|| format!("unsupported operator `{}`", &caps[1]))?;
    let threshold = caps[2]
        .parse::<i64>()
        .map_err(|e| format!("threshold `{}` out of range: {e}", &caps[2]))?;

    Ok(Condition::new(op, threshold))
}
