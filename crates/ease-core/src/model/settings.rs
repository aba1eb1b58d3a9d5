use serde::{Deserialize, Serialize};

use super::{ValidationError, in_range};

pub const MAX_CUSTOM_CATEGORIES: usize = 10;
/// Bounds for the daily worry-time slider, in minutes.
pub const MIN_DAILY_WORRY_TIME: u32 = 5;
pub const MAX_DAILY_WORRY_TIME: u32 = 60;

/// Per-user preferences kept alongside the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes set aside each day for worry time.
    pub daily_worry_time: u32,
    pub notifications: bool,
    /// Daily reflection reminder, `HH:MM`.
    pub reflection_time: String,
    pub custom_categories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_worry_time: 15,
            notifications: true,
            reflection_time: "17:00".to_string(),
            custom_categories: Vec::new(),
        }
    }
}

/// Partial settings update; `None` leaves the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub daily_worry_time: Option<u32>,
    pub notifications: Option<bool>,
    pub reflection_time: Option<String>,
    pub custom_categories: Option<Vec<String>>,
}

impl SettingsPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.daily_worry_time.is_none()
            && self.notifications.is_none()
            && self.reflection_time.is_none()
            && self.custom_categories.is_none()
    }

    /// Check and normalize the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an out-of-range worry time, a
    /// reflection time not shaped `HH:MM`, or more than
    /// [`MAX_CUSTOM_CATEGORIES`] custom categories.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if let Some(minutes) = self.daily_worry_time {
            in_range(
                "daily worry time",
                i64::from(minutes),
                i64::from(MIN_DAILY_WORRY_TIME),
                i64::from(MAX_DAILY_WORRY_TIME),
            )?;
        }

        let reflection_time = match self.reflection_time {
            Some(raw) => Some(validate_reflection_time(&raw)?),
            None => None,
        };

        let custom_categories = match self.custom_categories {
            Some(raw) => {
                let mut cleaned: Vec<String> = Vec::with_capacity(raw.len());
                for name in raw {
                    let trimmed = name.trim();
                    if !trimmed.is_empty() && !cleaned.iter().any(|c| c == trimmed) {
                        cleaned.push(trimmed.to_string());
                    }
                }
                if cleaned.len() > MAX_CUSTOM_CATEGORIES {
                    return Err(ValidationError::TooLong {
                        field: "custom categories",
                        len: cleaned.len(),
                        max: MAX_CUSTOM_CATEGORIES,
                    });
                }
                Some(cleaned)
            }
            None => None,
        };

        Ok(Self {
            daily_worry_time: self.daily_worry_time,
            notifications: self.notifications,
            reflection_time,
            custom_categories,
        })
    }

    pub(crate) fn merge_into(self, settings: &mut Settings) {
        if let Some(minutes) = self.daily_worry_time {
            settings.daily_worry_time = minutes;
        }
        if let Some(enabled) = self.notifications {
            settings.notifications = enabled;
        }
        if let Some(time) = self.reflection_time {
            settings.reflection_time = time;
        }
        if let Some(categories) = self.custom_categories {
            settings.custom_categories = categories;
        }
    }
}

/// Accepts a 24-hour `HH:MM` clock time.
///
/// # Errors
///
/// Returns [`ValidationError::Format`] when the value is not `HH:MM` or
/// names an impossible time.
pub fn validate_reflection_time(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !shaped {
        return Err(ValidationError::Format {
            field: "reflection time",
            reason: "expected HH:MM",
        });
    }

    let hours: u32 = value[..2].parse().unwrap_or(99);
    let minutes: u32 = value[3..].parse().unwrap_or(99);
    if hours > 23 || minutes > 59 {
        return Err(ValidationError::Format {
            field: "reflection time",
            reason: "hour must be 00-23 and minute 00-59",
        });
    }

    Ok(value.to_string())
}
