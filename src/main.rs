//! CLI entry point for the gradebook tool.
//!
//! Provides subcommands for inspecting a rule file, grading a single mark,
//! and grading per-subject rosters into result tables and a class summary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gradebook::grading::absolute_grade;
use gradebook::output::{print_json, print_pretty, write_json, write_subject_results, write_summary};
use gradebook::roster::load_roster;
use gradebook::rules::{DEFAULT_RULES_FILE, load_rules};
use gradebook::session::{GradingPolicy, GradingSession, PolicyKind};
use gradebook::summary::{GradeReport, grade_distribution, merge_subjects};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Grade student marks with absolute rules or cohort-relative bands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a rule file and list its rules
    Rules {
        /// Rule file to load
        #[arg(short, long, env = "GRADING_RULES", default_value = DEFAULT_RULES_FILE)]
        rules: PathBuf,
    },
    /// Grade a single mark against the absolute rules
    Mark {
        /// Mark to grade
        #[arg(allow_negative_numbers = true)]
        mark: i64,

        /// Rule file to load
        #[arg(short, long, env = "GRADING_RULES", default_value = DEFAULT_RULES_FILE)]
        rules: PathBuf,
    },
    /// Grade subject rosters and write result tables
    Grade {
        /// Subject roster as NAME=CSV_PATH (repeatable); CSV needs Name,Marks headers
        #[arg(short, long = "subject", value_name = "NAME=CSV", value_parser = parse_subject, required = true)]
        subjects: Vec<(String, PathBuf)>,

        /// Grading policy: Absolute or Relative
        #[arg(short, long, env = "GRADING_POLICY", default_value = "absolute")]
        policy: PolicyKind,

        /// Rule file to load (absolute policy only)
        #[arg(short, long, env = "GRADING_RULES", default_value = DEFAULT_RULES_FILE)]
        rules: PathBuf,

        /// Directory for per-subject CSVs and summary.csv
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,

        /// Optional: write the full JSON report to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn parse_subject(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=CSV_PATH, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() || path.trim().is_empty() {
        return Err(format!("expected NAME=CSV_PATH, got `{arg}`"));
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gradebook.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rules { rules } => {
            let rules = load_rules(&rules)?;
            for (position, rule) in rules.iter().enumerate() {
                info!(position = position + 1, grade = %rule.grade, rule = %rule, "Rule");
            }
            info!(total = rules.len(), "Rule list summary");
        }
        Commands::Mark { mark, rules } => {
            let rules = load_rules(&rules)?;
            let grade = absolute_grade(mark, &rules);
            info!(mark, grade, "Mark graded");
        }
        Commands::Grade {
            subjects,
            policy,
            rules,
            output_dir,
            json,
        } => {
            grade_subjects(subjects, policy, &rules, &output_dir, json.as_deref())?;
        }
    }

    Ok(())
}

/// Loads every roster into a session, grades it, and writes the
/// per-subject tables, the class summary and the optional JSON report.
#[tracing::instrument(skip_all, fields(subjects = subjects.len(), policy = %policy, output_dir = %output_dir.display()))]
fn grade_subjects(
    subjects: Vec<(String, PathBuf)>,
    policy: PolicyKind,
    rules_path: &Path,
    output_dir: &Path,
    json: Option<&Path>,
) -> Result<()> {
    let rules = match policy {
        PolicyKind::Absolute => Some(load_rules(rules_path)?),
        PolicyKind::Relative => None,
    };
    let mut session = GradingSession::new(GradingPolicy::from_kind(policy, rules)?);
    info!(policy = %session.policy().kind(), "Grading session ready");

    for (name, path) in subjects {
        let records = load_roster(&path)?;
        if records.is_empty() {
            warn!(subject = %name, path = %path.display(), "Roster has no students");
        }
        session.add_subject(name, records);
    }

    let results = session.grade_all()?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    for result in &results {
        let path = output_dir.join(format!("{}.csv", sanitize_file_stem(&result.subject)));
        write_subject_results(&path, result)?;
        print_pretty(result);

        let distribution = grade_distribution(&result.records);
        info!(
            subject = %result.subject,
            students = result.records.len(),
            distribution = ?distribution,
            "Subject graded"
        );
    }

    let summary = merge_subjects(&results);
    write_summary(output_dir.join("summary.csv"), &summary)?;
    info!(students = summary.rows.len(), subjects = summary.subjects.len(), "Class summary written");

    let report = GradeReport::new(session.policy().kind(), &results);
    match json {
        Some(path) => {
            write_json(path, &report)?;
            info!(path = %path.display(), "JSON report written");
        }
        None => print_json(&report)?,
    }

    Ok(())
}

/// Maps a subject name onto a safe file stem.
fn sanitize_file_stem(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subject() {
        assert_eq!(
            parse_subject("Maths=data/maths.csv").unwrap(),
            ("Maths".to_string(), PathBuf::from("data/maths.csv"))
        );
        assert!(parse_subject("Maths").is_err());
        assert!(parse_subject("=maths.csv").is_err());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Computer Science/II"), "Computer_Science_II");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
