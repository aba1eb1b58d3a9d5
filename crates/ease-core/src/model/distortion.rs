//! The fixed taxonomy of cognitive distortions a user can tag a worry with.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// One of ten named unhelpful thinking patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distortion {
    AllOrNothing,
    Overgeneralization,
    MentalFilter,
    DiminishingPositive,
    JumpingToConclusions,
    Catastrophizing,
    EmotionalReasoning,
    ShouldStatements,
    Labeling,
    Personalization,
}

/// Static reference text shown while the user picks distortions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistortionInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub reframe: &'static str,
}

impl Distortion {
    pub const ALL: [Self; 10] = [
        Self::AllOrNothing,
        Self::Overgeneralization,
        Self::MentalFilter,
        Self::DiminishingPositive,
        Self::JumpingToConclusions,
        Self::Catastrophizing,
        Self::EmotionalReasoning,
        Self::ShouldStatements,
        Self::Labeling,
        Self::Personalization,
    ];

    /// Stable kebab-case tag used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllOrNothing => "all-or-nothing",
            Self::Overgeneralization => "overgeneralization",
            Self::MentalFilter => "mental-filter",
            Self::DiminishingPositive => "diminishing-positive",
            Self::JumpingToConclusions => "jumping-to-conclusions",
            Self::Catastrophizing => "catastrophizing",
            Self::EmotionalReasoning => "emotional-reasoning",
            Self::ShouldStatements => "should-statements",
            Self::Labeling => "labeling",
            Self::Personalization => "personalization",
        }
    }

    #[must_use]
    pub const fn info(self) -> &'static DistortionInfo {
        match self {
            Self::AllOrNothing => &DistortionInfo {
                name: "All-or-Nothing Thinking",
                description: "Seeing things in black and white categories",
                example: "\"If I'm not perfect, I'm a failure\"",
                reframe: "\"I can do well without being perfect\"",
            },
            Self::Overgeneralization => &DistortionInfo {
                name: "Overgeneralization",
                description: "Seeing a single negative event as a pattern",
                example: "\"I didn't get this job, I'll never get any job\"",
                reframe: "\"This wasn't the right fit, but other opportunities exist\"",
            },
            Self::MentalFilter => &DistortionInfo {
                name: "Mental Filter",
                description: "Focusing only on negatives",
                example: "\"The whole presentation was terrible because I stumbled on one word\"",
                reframe: "\"The presentation went well overall, with one minor hiccup\"",
            },
            Self::DiminishingPositive => &DistortionInfo {
                name: "Diminishing the Positive",
                description: "Rejecting positive experiences or achievements",
                example: "\"That compliment doesn't count, they were just being nice\"",
                reframe: "\"I can accept and appreciate positive feedback\"",
            },
            Self::JumpingToConclusions => &DistortionInfo {
                name: "Jumping to Conclusions",
                description: "Making negative assumptions without evidence",
                example: "\"They didn't call back, they must hate me\"",
                reframe: "\"There could be many reasons for the delay\"",
            },
            Self::Catastrophizing => &DistortionInfo {
                name: "Catastrophizing",
                description: "Expecting the worst possible outcome",
                example: "\"If I fail this test, my entire future is ruined\"",
                reframe: "\"This test is important, but one result doesn't determine everything\"",
            },
            Self::EmotionalReasoning => &DistortionInfo {
                name: "Emotional Reasoning",
                description: "Believing feelings are facts",
                example: "\"I feel stupid, so I must be stupid\"",
                reframe: "\"Feeling something doesn't make it true\"",
            },
            Self::ShouldStatements => &DistortionInfo {
                name: "Should Statements",
                description: "Using \"should,\" \"must,\" or \"ought\" statements",
                example: "\"I should never make mistakes\"",
                reframe: "\"Making mistakes is human and helps me learn\"",
            },
            Self::Labeling => &DistortionInfo {
                name: "Labeling",
                description: "Calling yourself or others names",
                example: "\"I'm such an idiot for forgetting that\"",
                reframe: "\"I made a mistake, but that doesn't define me\"",
            },
            Self::Personalization => &DistortionInfo {
                name: "Personalization",
                description: "Blaming yourself for things outside your control",
                example: "\"My friend is upset, it must be my fault\"",
                reframe: "\"People have their own reasons for their emotions\"",
            },
        }
    }
}

impl fmt::Display for Distortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distortion {
    type Err = ParseEnumError;

    /// Accepts `catastrophizing`, `all_or_nothing` and `ALL_OR_NOTHING` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "distortion",
                got: s.to_string(),
            })
    }
}
