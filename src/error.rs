//! Error type shared by the rule loader and the graders.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradingError {
    /// The rule file does not exist. Absolute grading cannot proceed without it.
    #[error("rule file not found: {}", path.display())]
    RuleFileNotFound { path: PathBuf },

    #[error("failed to read rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `grade` line that does not follow `grade(Var, 'LABEL') :- conditions.`
    #[error("malformed rule on line {line}: {reason} (`{content}`)")]
    Parse {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Absolute grading was requested but no rules were supplied.
    #[error("absolute grading requires a loaded rule set")]
    MissingRules,

    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}

pub type Result<T> = std::result::Result<T, GradingError>;
