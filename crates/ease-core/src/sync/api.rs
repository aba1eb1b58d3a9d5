//! Wire types for the Ease web API.
//!
//! Field names follow the service's camelCase JSON. Each request type
//! carries the same checks the service applies so that obviously invalid
//! requests fail locally instead of costing a round trip.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{
    Category, CognitiveChallenge, Settings, SettingsPatch, ValidationError, Worry,
    settings::{MAX_CUSTOM_CATEGORIES, validate_reflection_time},
    worry::MAX_NAME_LEN,
};

/// Categories the service accepts. Anything else is sent as `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiCategory {
    School,
    Work,
    Family,
    Finance,
    Politics,
    Custom,
}

impl From<&Category> for ApiCategory {
    fn from(category: &Category) -> Self {
        match category {
            Category::School => Self::School,
            Category::Work => Self::Work,
            Category::Family => Self::Family,
            Category::Finance => Self::Finance,
            Category::Politics => Self::Politics,
            _ => Self::Custom,
        }
    }
}

/// Body sensations the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFeeling {
    #[serde(rename = "Sweaty palms")]
    SweatyPalms,
    Heartbeat,
    #[serde(rename = "Jaw tightness")]
    JawTightness,
    #[serde(rename = "Restless legs")]
    RestlessLegs,
    Others,
}

impl BodyFeeling {
    /// Map a locally recorded body response onto the service's smaller set.
    #[must_use]
    pub fn from_response(response: &str) -> Self {
        match response.trim().to_ascii_lowercase().as_str() {
            "sweaty palms" => Self::SweatyPalms,
            "heartbeat" | "racing heartbeat" => Self::Heartbeat,
            "jaw tightness" => Self::JawTightness,
            "restless legs" => Self::RestlessLegs,
            _ => Self::Others,
        }
    }
}

/// `POST /api/worries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorryRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: ApiCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_feeling: Option<BodyFeeling>,
    pub intensity: u8,
}

impl From<&Worry> for CreateWorryRequest {
    fn from(worry: &Worry) -> Self {
        Self {
            title: worry.name.clone(),
            description: Some(worry.description.clone()).filter(|d| !d.is_empty()),
            category: ApiCategory::from(&worry.category),
            body_feeling: worry
                .body_responses
                .first()
                .map(|response| BodyFeeling::from_response(response)),
            intensity: worry.intensity,
        }
    }
}

impl CreateWorryRequest {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty or overlong title or an
    /// intensity outside 1–10.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.title.chars().count();
        if len == 0 {
            return Err(ValidationError::Required { field: "title" });
        }
        if len > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                len,
                max: MAX_NAME_LEN,
            });
        }
        crate::model::in_range("intensity", i64::from(self.intensity), 1, 10)?;
        Ok(())
    }
}

/// Server-side lifecycle of a worry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorryStatus {
    Active,
    Scheduled,
    Resolved,
    Archived,
}

impl WorryStatus {
    /// Only terminal statuses may be set through `PATCH /api/worries/{id}`.
    #[must_use]
    pub const fn is_patchable(self) -> bool {
        matches!(self, Self::Resolved | Self::Archived)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Scheduled => "SCHEDULED",
            Self::Resolved => "RESOLVED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for WorryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PATCH /api/worries/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWorryStatusRequest {
    pub status: WorryStatus,
}

/// `POST /api/reflections`: the narrative form of a completed challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReflectionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_against: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_case_reality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gentle_action: Option<String>,
    pub completed: bool,
}

impl CreateReflectionRequest {
    /// Fold the structured ratings of a challenge into the service's free
    /// text fields.
    #[must_use]
    pub fn from_challenge(challenge: &CognitiveChallenge) -> Self {
        let distortions = if challenge.cognitive_distortions.is_empty() {
            "None identified.".to_string()
        } else {
            challenge
                .cognitive_distortions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            worry_id: Some(challenge.worry_id.clone()).filter(|id| !id.is_empty()),
            evidence_for: Some(challenge.evidence_for.join("\n")),
            evidence_against: Some(challenge.evidence_against.join("\n")),
            alternative_view: Some(challenge.reframed_thought.clone())
                .filter(|text| !text.is_empty()),
            worst_case_reality: Some(format!(
                "Perceived probability: {}%. Distortions: {distortions}",
                challenge.probability_rating
            )),
            gentle_action: Some(format!(
                "Helpfulness rating: {}/10. Next step: Focus on balanced thought.",
                challenge.helpfulness_rating
            )),
            completed: true,
        }
    }
}

/// `GET/POST /api/user/settings` payload. Every field is optional on
/// write; absent fields are left unchanged by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
}

impl From<&Settings> for RemoteSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            reflection_time: Some(settings.reflection_time.clone()),
            custom_categories: Some(settings.custom_categories.clone()),
            notifications: Some(settings.notifications),
        }
    }
}

impl RemoteSettings {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a malformed reflection time or too
    /// many custom categories.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(time) = &self.reflection_time {
            validate_reflection_time(time)?;
        }
        if let Some(categories) = &self.custom_categories {
            if categories.len() > MAX_CUSTOM_CATEGORIES {
                return Err(ValidationError::TooLong {
                    field: "custom categories",
                    len: categories.len(),
                    max: MAX_CUSTOM_CATEGORIES,
                });
            }
        }
        Ok(())
    }

    /// Convert a settings document pulled from the service into a local patch.
    #[must_use]
    pub fn into_patch(self) -> SettingsPatch {
        SettingsPatch {
            daily_worry_time: None,
            notifications: self.notifications,
            reflection_time: self.reflection_time,
            custom_categories: self.custom_categories,
        }
    }
}

/// Envelope returned by the settings endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsEnvelope {
    #[serde(default)]
    pub settings: Option<RemoteSettings>,
}

/// `POST /api/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RegisterRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] when email or password is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required { field: "email" });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required { field: "password" });
        }
        Ok(())
    }
}

/// Response body of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredAccount {
    pub id: String,
    pub email: String,
}

/// Server-side identity of a created document. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(rename = "_id")]
    pub id: String,
}

/// `POST /api/reflections` wraps the created document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReflectionEnvelope {
    pub reflection: RemoteRecord,
}

/// Error body returned by every endpoint: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Distortion;
    use chrono::Utc;
    use serde_json::json;

    fn worry() -> Worry {
        Worry {
            id: "w1".into(),
            name: "Interview".into(),
            description: "I might fail".into(),
            category: Category::Health,
            body_responses: vec!["Racing heartbeat".into(), "Jaw tightness".into()],
            intensity: 7,
            created_at: Utc::now(),
            is_released: false,
            released_at: None,
        }
    }

    fn completed_challenge() -> CognitiveChallenge {
        let now = Utc::now();
        CognitiveChallenge {
            id: "c1".into(),
            worry_id: "w1".into(),
            original_thought: "I might fail".into(),
            evidence_for: vec!["I prepared well".into(), "I know the team".into()],
            evidence_against: vec!["I've passed before".into()],
            probability_rating: 30,
            helpfulness_rating: 3,
            cognitive_distortions: vec![Distortion::Catastrophizing, Distortion::Labeling],
            reframed_thought: "I am prepared and have succeeded before.".into(),
            is_completed: true,
            completed_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn worry_request_maps_into_api_enums() {
        let request = CreateWorryRequest::from(&worry());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Interview",
                "description": "I might fail",
                "category": "Custom",
                "bodyFeeling": "Heartbeat",
                "intensity": 7
            })
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn worry_request_without_body_response_omits_field() {
        let mut source = worry();
        source.body_responses.clear();
        source.category = Category::Finance;
        let value = serde_json::to_value(CreateWorryRequest::from(&source)).unwrap();
        assert_eq!(value["category"], "Finance");
        assert!(value.get("bodyFeeling").is_none());
    }

    #[test]
    fn unknown_body_response_maps_to_others() {
        assert_eq!(BodyFeeling::from_response("Stomach knots"), BodyFeeling::Others);
        assert_eq!(
            serde_json::to_value(BodyFeeling::SweatyPalms).unwrap(),
            "Sweaty palms"
        );
    }

    #[test]
    fn worry_request_validation() {
        let mut request = CreateWorryRequest::from(&worry());
        request.title = String::new();
        assert!(request.validate().is_err());
        request.title = "ok".into();
        request.intensity = 11;
        assert!(request.validate().is_err());
    }

    #[test]
    fn reflection_payload_narrates_ratings() {
        let request = CreateReflectionRequest::from_challenge(&completed_challenge());
        assert_eq!(request.worry_id.as_deref(), Some("w1"));
        assert_eq!(
            request.evidence_for.as_deref(),
            Some("I prepared well\nI know the team")
        );
        assert_eq!(
            request.worst_case_reality.as_deref(),
            Some("Perceived probability: 30%. Distortions: catastrophizing, labeling")
        );
        assert_eq!(
            request.gentle_action.as_deref(),
            Some("Helpfulness rating: 3/10. Next step: Focus on balanced thought.")
        );
        assert!(request.completed);

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("alternativeView").is_some());
        assert!(value.get("worstCaseReality").is_some());
    }

    #[test]
    fn reflection_payload_without_distortions() {
        let mut challenge = completed_challenge();
        challenge.cognitive_distortions.clear();
        let request = CreateReflectionRequest::from_challenge(&challenge);
        assert_eq!(
            request.worst_case_reality.as_deref(),
            Some("Perceived probability: 30%. Distortions: None identified.")
        );
    }

    #[test]
    fn only_terminal_statuses_are_patchable() {
        assert!(WorryStatus::Resolved.is_patchable());
        assert!(WorryStatus::Archived.is_patchable());
        assert!(!WorryStatus::Active.is_patchable());
        assert_eq!(
            serde_json::to_value(UpdateWorryStatusRequest {
                status: WorryStatus::Resolved
            })
            .unwrap(),
            json!({ "status": "RESOLVED" })
        );
    }

    #[test]
    fn settings_envelope_tolerates_null() {
        let envelope: SettingsEnvelope = serde_json::from_str(r#"{"settings":null}"#).unwrap();
        assert!(envelope.settings.is_none());

        let envelope: SettingsEnvelope = serde_json::from_str(
            r#"{"settings":{"reflectionTime":"08:15","customCategories":["Garden"],"notifications":false,"userId":"u1"}}"#,
        )
        .unwrap();
        let patch = envelope.settings.unwrap().into_patch();
        assert_eq!(patch.reflection_time.as_deref(), Some("08:15"));
        assert_eq!(patch.notifications, Some(false));
        assert_eq!(patch.daily_worry_time, None);
    }

    #[test]
    fn created_documents_expose_mongo_id() {
        let record: RemoteRecord =
            serde_json::from_str(r#"{"_id":"665f","title":"Interview","status":"ACTIVE"}"#)
                .unwrap();
        assert_eq!(record.id, "665f");

        let envelope: ReflectionEnvelope =
            serde_json::from_str(r#"{"reflection":{"_id":"r9","completed":true}}"#).unwrap();
        assert_eq!(envelope.reflection.id, "r9");
    }

    #[test]
    fn register_requires_credentials() {
        let request = RegisterRequest {
            email: " ".into(),
            password: "secret".into(),
            name: None,
        };
        assert_eq!(
            request.validate(),
            Err(ValidationError::Required { field: "email" })
        );
    }
}
