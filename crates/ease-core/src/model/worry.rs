use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, ValidationError, in_range, required};

/// Longest accepted worry name.
pub const MAX_NAME_LEN: usize = 200;

/// Intensity assigned when the user does not pick one.
pub const DEFAULT_INTENSITY: u8 = 5;

/// Physical sensations offered when capturing a worry. Free text is also accepted.
pub const BODY_RESPONSE_PRESETS: [&str; 8] = [
    "Sweaty palms",
    "Racing heartbeat",
    "Jaw tightness",
    "Restless legs",
    "Stomach knots",
    "Shoulder tension",
    "Chest tightness",
    "Other",
];

/// Life area a worry belongs to: one of the presets or a user-defined name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Category {
    School,
    #[default]
    Work,
    Family,
    Finance,
    Politics,
    Health,
    Relationships,
    Other,
    Custom(String),
}

impl Category {
    pub const PRESETS: [Self; 8] = [
        Self::School,
        Self::Work,
        Self::Family,
        Self::Finance,
        Self::Politics,
        Self::Health,
        Self::Relationships,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::School => "School",
            Self::Work => "Work",
            Self::Family => "Family",
            Self::Finance => "Finance",
            Self::Politics => "Politics",
            Self::Health => "Health",
            Self::Relationships => "Relationships",
            Self::Other => "Other",
            Self::Custom(name) => name,
        }
    }

    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            });
        }

        let preset = Self::PRESETS
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(trimmed));
        Ok(preset.unwrap_or_else(|| Self::Custom(trimmed.to_string())))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Custom(name) => name,
            preset => preset.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A captured worry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub body_responses: Vec<String>,
    pub intensity: u8,
    pub created_at: DateTime<Utc>,
    pub is_released: bool,
    pub released_at: Option<DateTime<Utc>>,
}

impl Worry {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_released
    }
}

/// User input for a new worry, before id and timestamps are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorry {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub body_responses: Vec<String>,
    pub intensity: u8,
}

impl NewWorry {
    /// Normalize and check the input: trimmed non-empty name (at most
    /// [`MAX_NAME_LEN`] characters) and description, intensity 1–10, body
    /// responses trimmed and de-duplicated in selection order. Preset body
    /// responses are matched case-insensitively and stored in their
    /// canonical spelling.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = required("name", &self.name)?;
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                len,
                max: MAX_NAME_LEN,
            });
        }
        let description = required("description", &self.description)?;
        in_range("intensity", i64::from(self.intensity), 1, 10)?;

        let mut body_responses: Vec<String> = Vec::with_capacity(self.body_responses.len());
        for raw in &self.body_responses {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let canonical = BODY_RESPONSE_PRESETS
                .iter()
                .find(|preset| preset.eq_ignore_ascii_case(trimmed))
                .map_or_else(|| trimmed.to_string(), |preset| (*preset).to_string());
            if !body_responses.contains(&canonical) {
                body_responses.push(canonical);
            }
        }

        Ok(Self {
            name,
            description,
            category: self.category,
            body_responses,
            intensity: self.intensity,
        })
    }
}
