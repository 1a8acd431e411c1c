//! Grade assignment under the two supported policies.
//!
//! Absolute grading walks a loaded rule list; relative grading places each
//! mark on a fixed scale by its z-score within the batch.

pub mod absolute;
pub mod relative;
pub mod utility;

pub use absolute::{NO_GRADE, absolute_grade};
pub use relative::{RelativeGrade, relative_grades, z_scores};
