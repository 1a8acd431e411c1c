use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{GradingError, Result};
use crate::grading::utility::{mean, stddev};

/// Fixed eight-step scale used for cohort-relative grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RelativeGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "F")]
    F,
}

impl RelativeGrade {
    /// All grades, best first.
    pub const SCALE: [RelativeGrade; 8] = [
        RelativeGrade::APlus,
        RelativeGrade::AMinus,
        RelativeGrade::BPlus,
        RelativeGrade::BMinus,
        RelativeGrade::CPlus,
        RelativeGrade::CMinus,
        RelativeGrade::DPlus,
        RelativeGrade::F,
    ];

    /// Maps a z-score onto the scale.
    ///
    /// | z-score          | Grade |
    /// |------------------|-------|
    /// | >= 1.5           | A+    |
    /// | >= 1.0           | A-    |
    /// | >= 0.5           | B+    |
    /// | >= 0.0           | B-    |
    /// | >= -0.5          | C+    |
    /// | >= -1.0          | C-    |
    /// | >= -1.5          | D+    |
    /// | < -1.5           | F     |
    pub fn from_z(z: f64) -> Self {
        match z {
            z if z >= 1.5 => RelativeGrade::APlus,
            z if z >= 1.0 => RelativeGrade::AMinus,
            z if z >= 0.5 => RelativeGrade::BPlus,
            z if z >= 0.0 => RelativeGrade::BMinus,
            z if z >= -0.5 => RelativeGrade::CPlus,
            z if z >= -1.0 => RelativeGrade::CMinus,
            z if z >= -1.5 => RelativeGrade::DPlus,
            _ => RelativeGrade::F,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelativeGrade::APlus => "A+",
            RelativeGrade::AMinus => "A-",
            RelativeGrade::BPlus => "B+",
            RelativeGrade::BMinus => "B-",
            RelativeGrade::CPlus => "C+",
            RelativeGrade::CMinus => "C-",
            RelativeGrade::DPlus => "D+",
            RelativeGrade::F => "F",
        }
    }
}

impl fmt::Display for RelativeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Standard scores of each mark against the batch's population mean and
/// standard deviation. Every score is 0 when the deviation is 0.
///
/// # Errors
///
/// [`GradingError::InvalidArgument`] for an empty batch, a non-finite mark,
/// or a batch whose mean or deviation overflows.
pub fn z_scores(marks: &[f64]) -> Result<Vec<f64>> {
    if marks.is_empty() {
        return Err(GradingError::InvalidArgument(
            "relative grading needs at least one mark".to_string(),
        ));
    }
    if let Some(pos) = marks.iter().position(|m| !m.is_finite()) {
        return Err(GradingError::InvalidArgument(format!(
            "mark at position {pos} is not a finite number"
        )));
    }

    // equal marks have no spread, whatever rounding does to the mean
    let first = marks[0];
    if marks.iter().all(|&m| m == first) {
        debug!(count = marks.len(), mark = first, "Uniform batch");
        return Ok(vec![0.0; marks.len()]);
    }

    let avg = mean(marks);
    let sd = stddev(marks, avg);
    debug!(count = marks.len(), mean = avg, stddev = sd, "Batch distribution");
    if !avg.is_finite() || !sd.is_finite() {
        return Err(GradingError::InvalidArgument(format!(
            "batch statistics overflow (mean {avg}, stddev {sd})"
        )));
    }

    Ok(marks
        .iter()
        .map(|m| if sd == 0.0 { 0.0 } else { (m - avg) / sd })
        .collect())
}

/// Grades every mark by its standing in the batch. Output order matches input order.
pub fn relative_grades(marks: &[f64]) -> Result<Vec<RelativeGrade>> {
    Ok(z_scores(marks)?
        .into_iter()
        .map(RelativeGrade::from_z)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(RelativeGrade::from_z(3.0), RelativeGrade::APlus);
        assert_eq!(RelativeGrade::from_z(1.5), RelativeGrade::APlus);
        assert_eq!(RelativeGrade::from_z(1.49), RelativeGrade::AMinus);
        assert_eq!(RelativeGrade::from_z(1.0), RelativeGrade::AMinus);
        assert_eq!(RelativeGrade::from_z(0.99), RelativeGrade::BPlus);
        assert_eq!(RelativeGrade::from_z(0.5), RelativeGrade::BPlus);
        assert_eq!(RelativeGrade::from_z(0.49), RelativeGrade::BMinus);
        assert_eq!(RelativeGrade::from_z(0.0), RelativeGrade::BMinus);
        assert_eq!(RelativeGrade::from_z(-0.01), RelativeGrade::CPlus);
        assert_eq!(RelativeGrade::from_z(-0.5), RelativeGrade::CPlus);
        assert_eq!(RelativeGrade::from_z(-0.51), RelativeGrade::CMinus);
        assert_eq!(RelativeGrade::from_z(-1.0), RelativeGrade::CMinus);
        assert_eq!(RelativeGrade::from_z(-1.01), RelativeGrade::DPlus);
        assert_eq!(RelativeGrade::from_z(-1.5), RelativeGrade::DPlus);
        assert_eq!(RelativeGrade::from_z(-1.51), RelativeGrade::F);
        assert_eq!(RelativeGrade::from_z(-10.0), RelativeGrade::F);
    }

    #[test]
    fn test_bands_are_monotonic() {
        // walking z downwards never moves to a better grade
        let mut prev = RelativeGrade::from_z(5.0);
        let mut z = 5.0;
        while z > -5.0 {
            let g = RelativeGrade::from_z(z);
            assert!(g >= prev, "z={z} gave {g} after {prev}");
            prev = g;
            z -= 0.01;
        }
        assert_eq!(prev, RelativeGrade::F);
    }

    #[test]
    fn test_spread_batch() {
        let grades = relative_grades(&[90.0, 70.0, 50.0, 30.0, 10.0]).unwrap();
        let labels: Vec<_> = grades.iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["A-", "B+", "B-", "C-", "D+"]);
    }

    #[test]
    fn test_z_scores_of_spread_batch() {
        let z = z_scores(&[90.0, 70.0, 50.0, 30.0, 10.0]).unwrap();
        let expected = [1.41421, 0.70711, 0.0, -0.70711, -1.41421];
        for (got, want) in z.iter().zip(expected) {
            assert!((got - want).abs() < 1e-4, "{got} vs {want}");
        }
    }

    #[test]
    fn test_uniform_batch_is_b_minus() {
        let grades = relative_grades(&[50.0, 50.0, 50.0, 50.0]).unwrap();
        assert_eq!(grades, vec![RelativeGrade::BMinus; 4]);
    }

    #[test]
    fn test_fractional_uniform_batch_is_b_minus() {
        for v in [0.1, 0.7, 33.3, 66.7, 1e308] {
            assert_eq!(z_scores(&[v, v, v]).unwrap(), vec![0.0; 3], "v={v}");
            assert_eq!(
                relative_grades(&[v, v, v]).unwrap(),
                vec![RelativeGrade::BMinus; 3],
                "v={v}"
            );
        }
    }

    #[test]
    fn test_overflowing_batch_is_invalid() {
        // sum overflows to infinity
        assert!(matches!(
            relative_grades(&[1e308, 1e308, -1e308]),
            Err(GradingError::InvalidArgument(_))
        ));
        // squared deviations overflow
        assert!(matches!(
            relative_grades(&[1e308, -1e308]),
            Err(GradingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_single_mark_is_b_minus() {
        assert_eq!(relative_grades(&[17.0]).unwrap(), vec![RelativeGrade::BMinus]);
    }

    #[test]
    fn test_output_follows_input_order() {
        let grades = relative_grades(&[10.0, 90.0, 50.0]).unwrap();
        assert_eq!(grades.len(), 3);
        assert!(grades[0] > grades[2]);
        assert!(grades[1] < grades[2]);
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        assert!(matches!(
            relative_grades(&[]),
            Err(GradingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_nan_is_invalid() {
        assert!(matches!(
            relative_grades(&[50.0, f64::NAN]),
            Err(GradingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display_matches_serialized_label() {
        for grade in RelativeGrade::SCALE {
            let json = serde_json::to_string(&grade).unwrap();
            assert_eq!(json, format!("\"{grade}\""));
        }
    }
}
