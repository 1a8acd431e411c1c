use crate::rules::Rule;

/// Result of absolute grading when no rule applies to a mark.
pub const NO_GRADE: &str = "N/A";

/// Grades `mark` against `rules` in order.
///
/// The first rule whose conditions all hold wins; later rules are not
/// examined. Returns [`NO_GRADE`] when nothing matches.
pub fn absolute_grade(mark: i64, rules: &[Rule]) -> &str {
    rules
        .iter()
        .find(|rule| rule.matches(mark))
        .map_or(NO_GRADE, |rule| rule.grade.as_str())
}
