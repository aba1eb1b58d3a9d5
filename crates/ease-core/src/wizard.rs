//! Six-step cognitive challenge wizard.
//!
//! The wizard walks one worry through a fixed linear sequence of steps:
//!
//! ```text
//! evidence-for -> evidence-against -> probability -> distortions
//!              -> helpfulness -> reframe -> (complete)
//! ```
//!
//! Answers accumulate in the [`Wizard`] value and are written to the
//! challenge record through [`AppState::update_challenge`] on every forward
//! transition. Completion is only possible from the reframe step and emits
//! the remote reflection and resolve intents after the local completion.
//!
//! A `Wizard` is plain serializable data; the CLI stores it as the current
//! draft between invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ErrorCode;
use crate::model::{
    ChallengePatch, CognitiveChallenge, Distortion, EvidenceKind, ParseEnumError,
    challenge::{DEFAULT_HELPFULNESS, DEFAULT_PROBABILITY, MIN_REFRAME_CHARS},
};
use crate::store::{AppState, Effect, RemoteIntent, Update};
use crate::sync::api::CreateReflectionRequest;

/// Number of steps in the wizard.
pub const STEP_COUNT: usize = 6;

/// A wizard step. Variants are listed in flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    EvidenceFor,
    EvidenceAgainst,
    Probability,
    Distortions,
    Helpfulness,
    Reframe,
}

/// Copy shown for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub title: &'static str,
    pub question: &'static str,
    pub description: &'static str,
}

impl Step {
    pub const FIRST: Self = Self::EvidenceFor;

    pub const ALL: [Self; STEP_COUNT] = [
        Self::EvidenceFor,
        Self::EvidenceAgainst,
        Self::Probability,
        Self::Distortions,
        Self::Helpfulness,
        Self::Reframe,
    ];

    /// Forward transition. `None` at the reframe step.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::EvidenceFor => Some(Self::EvidenceAgainst),
            Self::EvidenceAgainst => Some(Self::Probability),
            Self::Probability => Some(Self::Distortions),
            Self::Distortions => Some(Self::Helpfulness),
            Self::Helpfulness => Some(Self::Reframe),
            Self::Reframe => None,
        }
    }

    /// Backward transition. `None` at the first step.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::EvidenceFor => None,
            Self::EvidenceAgainst => Some(Self::EvidenceFor),
            Self::Probability => Some(Self::EvidenceAgainst),
            Self::Distortions => Some(Self::Probability),
            Self::Helpfulness => Some(Self::Distortions),
            Self::Reframe => Some(Self::Helpfulness),
        }
    }

    /// Zero-based position in the flow.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::EvidenceFor => 0,
            Self::EvidenceAgainst => 1,
            Self::Probability => 2,
            Self::Distortions => 3,
            Self::Helpfulness => 4,
            Self::Reframe => 5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EvidenceFor => "evidence-for",
            Self::EvidenceAgainst => "evidence-against",
            Self::Probability => "probability",
            Self::Distortions => "distortions",
            Self::Helpfulness => "helpfulness",
            Self::Reframe => "reframe",
        }
    }

    /// The evidence list edited at this step, if any.
    #[must_use]
    pub const fn evidence_kind(self) -> Option<EvidenceKind> {
        match self {
            Self::EvidenceFor => Some(EvidenceKind::For),
            Self::EvidenceAgainst => Some(EvidenceKind::Against),
            _ => None,
        }
    }

    #[must_use]
    pub const fn info(self) -> &'static StepInfo {
        match self {
            Self::EvidenceFor => &StepInfo {
                title: "Evidence Supporting the Worry",
                question: "What evidence do I have that this thought is true?",
                description: "List any facts, experiences, or observations that support your worry. Be specific and objective.",
            },
            Self::EvidenceAgainst => &StepInfo {
                title: "Evidence Against the Worry",
                question: "What evidence do I have that this thought is not completely true?",
                description: "Look for facts, past experiences, or alternative explanations that challenge your worry.",
            },
            Self::Probability => &StepInfo {
                title: "Realistic Probability",
                question: "What's the realistic probability that my feared outcome will actually happen?",
                description: "Consider all factors and give an honest percentage estimate (0-100%).",
            },
            Self::Distortions => &StepInfo {
                title: "Thinking Patterns",
                question: "Which unhelpful thinking patterns might be affecting this worry?",
                description: "Review the list below and select any patterns that apply to your current thinking.",
            },
            Self::Helpfulness => &StepInfo {
                title: "Is This Helpful?",
                question: "How helpful is this thought to me right now?",
                description: "Rate from 1 (very harmful) to 10 (very helpful). Consider how this thought affects your mood and actions.",
            },
            Self::Reframe => &StepInfo {
                title: "Create a Balanced Thought",
                question: "Based on my answers above, how could I rewrite this thought in a more balanced way?",
                description: "Use your evidence and insights to create a more realistic and helpful perspective.",
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "wizard step",
                got: s.to_string(),
            })
    }
}

/// Errors that block a wizard transition. The wizard is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("no {missing} was given for the challenge")]
    MissingContext { missing: &'static str },

    #[error("already at the first step")]
    AtFirstStep,

    #[error("already at the final step; complete the challenge instead")]
    AtFinalStep,

    #[error("the {step} step is not finished yet")]
    StepBlocked { step: Step },

    #[error("the challenge can only be completed from the reframe step (currently at {step})")]
    NotAtFinalStep { step: Step },

    #[error("balanced thought must be longer than {min} characters (got {len})")]
    ReframeTooShort { len: usize, min: usize },

    #[error("challenge {id} no longer exists")]
    ChallengeMissing { id: String },

    #[error("challenge {id} is already completed")]
    ChallengeClosed { id: String },
}

impl WizardError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingContext { .. } => ErrorCode::WizardMissingContext,
            Self::AtFirstStep
            | Self::AtFinalStep
            | Self::StepBlocked { .. }
            | Self::NotAtFinalStep { .. }
            | Self::ReframeTooShort { .. } => ErrorCode::WizardStepBlocked,
            Self::ChallengeMissing { .. } => ErrorCode::ChallengeNotFound,
            Self::ChallengeClosed { .. } => ErrorCode::ChallengeAlreadyCompleted,
        }
    }
}

/// Answers gathered so far. Mirrors the editable fields of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    pub evidence_for: Vec<String>,
    pub evidence_against: Vec<String>,
    pub probability_rating: u8,
    pub helpfulness_rating: u8,
    pub cognitive_distortions: Vec<Distortion>,
    pub reframed_thought: String,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            evidence_for: Vec::new(),
            evidence_against: Vec::new(),
            probability_rating: DEFAULT_PROBABILITY,
            helpfulness_rating: DEFAULT_HELPFULNESS,
            cognitive_distortions: Vec::new(),
            reframed_thought: String::new(),
        }
    }
}

impl Answers {
    fn to_patch(&self) -> ChallengePatch {
        ChallengePatch {
            evidence_for: Some(self.evidence_for.clone()),
            evidence_against: Some(self.evidence_against.clone()),
            probability_rating: Some(self.probability_rating),
            helpfulness_rating: Some(self.helpfulness_rating),
            cognitive_distortions: Some(self.cognitive_distortions.clone()),
            reframed_thought: Some(self.reframed_thought.clone()),
        }
    }

    fn evidence_mut(&mut self, kind: EvidenceKind) -> &mut Vec<String> {
        match kind {
            EvidenceKind::For => &mut self.evidence_for,
            EvidenceKind::Against => &mut self.evidence_against,
        }
    }
}

/// An in-progress walk through the challenge steps for one worry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wizard {
    pub challenge_id: String,
    pub worry_id: String,
    pub worry_text: String,
    step: Step,
    answers: Answers,
    /// Scratch text for the evidence entry box.
    input: String,
    pub started_at: DateTime<Utc>,
}

impl Wizard {
    /// Start a challenge for a worry and position the wizard at the first
    /// step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::MissingContext`] when the worry id or the
    /// worry text is absent or blank. Nothing is created in that case.
    pub fn begin(
        state: &AppState,
        worry_id: Option<&str>,
        worry_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(Self, Update<String>), WizardError> {
        let worry_id = worry_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(WizardError::MissingContext {
                missing: "worry id",
            })?;
        let worry_text = worry_text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(WizardError::MissingContext {
                missing: "worry text",
            })?;

        let update = state.start_challenge(worry_id, worry_text, now);
        tracing::debug!(challenge = %update.output, worry = worry_id, "challenge wizard started");

        let wizard = Self {
            challenge_id: update.output.clone(),
            worry_id: worry_id.to_string(),
            worry_text: worry_text.to_string(),
            step: Step::FIRST,
            answers: Answers::default(),
            input: String::new(),
            started_at: now,
        };
        Ok((wizard, update))
    }

    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub const fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn evidence(&self, kind: EvidenceKind) -> &[String] {
        match kind {
            EvidenceKind::For => &self.answers.evidence_for,
            EvidenceKind::Against => &self.answers.evidence_against,
        }
    }

    /// `round((index + 1) / 6 * 100)`.
    #[must_use]
    pub const fn progress_percent(&self) -> usize {
        ((self.step.index() + 1) * 200 + STEP_COUNT) / (2 * STEP_COUNT)
    }

    /// Whether the current step's gate allows moving on.
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        match self.step {
            Step::Reframe => reframe_len(&self.answers.reframed_thought) > MIN_REFRAME_CHARS,
            _ => true,
        }
    }

    /// Persist the answers and advance one step. Clears the scratch input.
    ///
    /// # Errors
    ///
    /// [`WizardError::AtFinalStep`] at the reframe step,
    /// [`WizardError::StepBlocked`] when [`Self::can_proceed`] is false, or
    /// [`WizardError::ChallengeMissing`]/[`WizardError::ChallengeClosed`]
    /// when the record can no longer be updated.
    pub fn next(
        &mut self,
        state: &AppState,
        now: DateTime<Utc>,
    ) -> Result<Update<Step>, WizardError> {
        let Some(target) = self.step.next() else {
            return Err(WizardError::AtFinalStep);
        };
        if !self.can_proceed() {
            return Err(WizardError::StepBlocked { step: self.step });
        }
        let update = self.persist(state, now)?;

        self.step = target;
        self.input.clear();
        Ok(update.map(|_| target))
    }

    /// Move back one step, keeping every answer. Clears the scratch input.
    ///
    /// # Errors
    ///
    /// [`WizardError::AtFirstStep`] at the first step.
    pub fn back(&mut self) -> Result<Step, WizardError> {
        let target = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.step = target;
        self.input.clear();
        Ok(target)
    }

    pub fn set_input(&mut self, text: &str) {
        text.clone_into(&mut self.input);
    }

    /// Append the trimmed scratch input to the `kind` list and clear it.
    /// Blank input is ignored and reported as `false`.
    pub fn add_evidence(&mut self, kind: EvidenceKind) -> bool {
        let entry = self.input.trim();
        if entry.is_empty() {
            return false;
        }
        let entry = entry.to_string();
        self.answers.evidence_mut(kind).push(entry);
        self.input.clear();
        true
    }

    /// Remove the item at `index` from the `kind` list. Out of range is a no-op.
    pub fn remove_evidence(&mut self, kind: EvidenceKind, index: usize) -> Option<String> {
        let list = self.answers.evidence_mut(kind);
        (index < list.len()).then(|| list.remove(index))
    }

    /// Add `distortion` if absent, remove it if present. Returns whether it
    /// is selected afterwards.
    pub fn toggle_distortion(&mut self, distortion: Distortion) -> bool {
        let tags = &mut self.answers.cognitive_distortions;
        if let Some(position) = tags.iter().position(|d| *d == distortion) {
            tags.remove(position);
            false
        } else {
            tags.push(distortion);
            true
        }
    }

    /// Clamped to 0–100.
    pub fn set_probability(&mut self, value: i64) -> u8 {
        self.answers.probability_rating = clamp_rating(value, 0, 100);
        self.answers.probability_rating
    }

    /// Clamped to 1–10.
    pub fn set_helpfulness(&mut self, value: i64) -> u8 {
        self.answers.helpfulness_rating = clamp_rating(value, 1, 10);
        self.answers.helpfulness_rating
    }

    pub fn set_reframe(&mut self, text: &str) {
        text.clone_into(&mut self.answers.reframed_thought);
    }

    /// Finish the challenge from the reframe step.
    ///
    /// Applies the accumulated answers, marks the challenge completed with
    /// the trimmed reframe, then queues a reflection for the service and a
    /// request to resolve the worry there. The returned output is the
    /// completed record.
    ///
    /// # Errors
    ///
    /// [`WizardError::NotAtFinalStep`] before the reframe step,
    /// [`WizardError::ReframeTooShort`] when the trimmed reframe has
    /// [`MIN_REFRAME_CHARS`] characters or fewer, or a challenge lookup
    /// error when the record can no longer be updated.
    pub fn complete(
        &self,
        state: &AppState,
        now: DateTime<Utc>,
    ) -> Result<Update<CognitiveChallenge>, WizardError> {
        if self.step != Step::Reframe {
            return Err(WizardError::NotAtFinalStep { step: self.step });
        }
        let reframe = self.answers.reframed_thought.trim();
        let len = reframe_len(reframe);
        if len <= MIN_REFRAME_CHARS {
            return Err(WizardError::ReframeTooShort {
                len,
                min: MIN_REFRAME_CHARS,
            });
        }

        let updated = self.persist(state, now)?;
        let mut completed = updated
            .then(|s| s.complete_challenge(&self.challenge_id, reframe, now))
            .map(|_| ());

        let Some(challenge) = completed.state.challenge(&self.challenge_id).cloned() else {
            return Err(WizardError::ChallengeMissing {
                id: self.challenge_id.clone(),
            });
        };

        completed.effects.push(Effect::Remote(RemoteIntent::CreateReflection {
            worry_id: self.worry_id.clone(),
            request: CreateReflectionRequest::from_challenge(&challenge),
        }));
        completed.effects.push(Effect::Remote(RemoteIntent::ResolveWorry {
            worry_id: self.worry_id.clone(),
        }));
        tracing::info!(challenge = %self.challenge_id, "challenge completed");

        Ok(completed.map(|()| challenge))
    }

    fn persist(&self, state: &AppState, now: DateTime<Utc>) -> Result<Update<bool>, WizardError> {
        let update = state.update_challenge(&self.challenge_id, self.answers.to_patch(), now);
        if update.output {
            return Ok(update);
        }
        match state.challenge(&self.challenge_id) {
            Some(_) => Err(WizardError::ChallengeClosed {
                id: self.challenge_id.clone(),
            }),
            None => Err(WizardError::ChallengeMissing {
                id: self.challenge_id.clone(),
            }),
        }
    }
}

fn reframe_len(text: &str) -> usize {
    text.trim().chars().count()
}

fn clamp_rating(value: i64, min: u8, max: u8) -> u8 {
    u8::try_from(value.clamp(i64::from(min), i64::from(max))).unwrap_or(min)
}
