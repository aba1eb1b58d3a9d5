use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{Distortion, ParseEnumError};

pub const DEFAULT_PROBABILITY: u8 = 50;
pub const DEFAULT_HELPFULNESS: u8 = 5;

/// A reframe must be strictly longer than this (after trimming) to complete.
pub const MIN_REFRAME_CHARS: usize = 10;

/// A structured walk of one worry through evidence, probability,
/// distortions, helpfulness and a balanced reframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveChallenge {
    pub id: String,
    pub worry_id: String,
    pub original_thought: String,
    pub evidence_for: Vec<String>,
    pub evidence_against: Vec<String>,
    /// Estimated likelihood of the feared outcome, 0–100.
    pub probability_rating: u8,
    /// How useful the thought is, 1–10.
    pub helpfulness_rating: u8,
    pub cognitive_distortions: Vec<Distortion>,
    pub reframed_thought: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shallow partial update for an in-progress challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengePatch {
    pub evidence_for: Option<Vec<String>>,
    pub evidence_against: Option<Vec<String>>,
    pub probability_rating: Option<u8>,
    pub helpfulness_rating: Option<u8>,
    pub cognitive_distortions: Option<Vec<Distortion>>,
    pub reframed_thought: Option<String>,
}

impl ChallengePatch {
    pub(crate) fn apply_to(self, challenge: &mut CognitiveChallenge) {
        if let Some(items) = self.evidence_for {
            challenge.evidence_for = items;
        }
        if let Some(items) = self.evidence_against {
            challenge.evidence_against = items;
        }
        if let Some(rating) = self.probability_rating {
            challenge.probability_rating = rating.min(100);
        }
        if let Some(rating) = self.helpfulness_rating {
            challenge.helpfulness_rating = rating.clamp(1, 10);
        }
        if let Some(mut tags) = self.cognitive_distortions {
            let mut seen = Vec::with_capacity(tags.len());
            tags.retain(|tag| {
                if seen.contains(tag) {
                    false
                } else {
                    seen.push(*tag);
                    true
                }
            });
            challenge.cognitive_distortions = tags;
        }
        if let Some(text) = self.reframed_thought {
            challenge.reframed_thought = text;
        }
    }
}

/// Which evidence list an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    For,
    Against,
}

impl EvidenceKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "for" => Ok(Self::For),
            "against" => Ok(Self::Against),
            _ => Err(ParseEnumError {
                expected: "evidence kind",
                got: s.to_string(),
            }),
        }
    }
}
