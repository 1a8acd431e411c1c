pub mod error;
pub mod grading;
pub mod output;
pub mod roster;
pub mod rules;
pub mod session;
pub mod summary;

pub use error::GradingError;
