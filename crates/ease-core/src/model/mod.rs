//! Domain records for worries, cognitive challenges and settings.

pub mod challenge;
pub mod distortion;
pub mod settings;
pub mod worry;

pub use challenge::{ChallengePatch, CognitiveChallenge, EvidenceKind};
pub use distortion::{Distortion, DistortionInfo};
pub use settings::{Settings, SettingsPatch};
pub use worry::{BODY_RESPONSE_PRESETS, Category, NewWorry, Worry};

use std::fmt;

use crate::error::ErrorCode;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Rejected user input, raised before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} must be between {min} and {max}, got {got}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        got: i64,
    },

    #[error("{field} has an invalid format: {reason}")]
    Format {
        field: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    Enum(#[from] ParseEnumError),
}

impl ValidationError {
    /// Machine-readable code associated with this validation error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Enum(_) => ErrorCode::InvalidEnumValue,
            _ => ErrorCode::InvalidInput,
        }
    }
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn in_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            got: value,
        })
    }
}
