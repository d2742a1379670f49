//! Domain value types shared by services and handlers.

pub mod grade;
pub mod imei;

pub use grade::{stored_grade_letter, Grade, GradeError};
