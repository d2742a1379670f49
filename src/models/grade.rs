use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::RefOr;

/// Refurbishment condition rating. Stored as 1..=6, shown as A..F.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(try_from = "GradeInput", into = "String")]
pub enum Grade {
    A = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    F = 6,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("unknown grade letter '{0}', expected one of A-F")]
    UnknownLetter(String),
    #[error("grade {0} is out of range, expected 1-6")]
    OutOfRange(i64),
}

impl Grade {
    const LETTERS: [&'static str; 6] = ["A", "B", "C", "D", "E", "F"];

    /// Integer code persisted in the database.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn letter(self) -> &'static str {
        Self::LETTERS[(self.code() - 1) as usize]
    }

    pub fn from_code(code: i64) -> Result<Self, GradeError> {
        Self::iter()
            .find(|grade| i64::from(grade.code()) == code)
            .ok_or(GradeError::OutOfRange(code))
    }

    /// Case-insensitive; anything outside A-F is rejected.
    pub fn from_letter(letter: &str) -> Result<Self, GradeError> {
        let trimmed = letter.trim();
        Self::iter()
            .find(|grade| grade.letter().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| GradeError::UnknownLetter(trimmed.to_string()))
    }
}

/// Renders a stored grade column. `0` is the legacy "ungraded" value.
pub fn stored_grade_letter(code: i32) -> Option<&'static str> {
    Grade::from_code(i64::from(code)).ok().map(Grade::letter)
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl utoipa::PartialSchema for Grade {
    fn schema() -> RefOr<Schema> {
        RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::String)
                .enum_values(Some(Grade::LETTERS))
                .description(Some("Grade letter A-F; requests may also send 1-6"))
                .build(),
        ))
    }
}

impl utoipa::ToSchema for Grade {}

impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_letter(s)
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.letter().to_string()
    }
}

/// Wire shape: clients send either the letter or the integer code.
#[derive(Deserialize)]
#[serde(untagged)]
enum GradeInput {
    Code(i64),
    Letter(String),
}

impl TryFrom<GradeInput> for Grade {
    type Error = GradeError;

    fn try_from(value: GradeInput) -> Result<Self, Self::Error> {
        match value {
            GradeInput::Code(code) => Grade::from_code(code),
            GradeInput::Letter(letter) => match letter.trim().parse::<i64>() {
                Ok(code) => Grade::from_code(code),
                Err(_) => Grade::from_letter(&letter),
            },
        }
    }
}
