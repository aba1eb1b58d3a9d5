use chrono::{DateTime, Utc};

use super::{AppState, Effect, Update, new_id};
use crate::model::{
    ChallengePatch, CognitiveChallenge,
    challenge::{DEFAULT_HELPFULNESS, DEFAULT_PROBABILITY},
};

impl AppState {
    /// Open a new challenge for `worry_id` with mid-scale default ratings.
    /// The worry is not required to exist. Returns the new id.
    #[must_use]
    pub fn start_challenge(
        &self,
        worry_id: &str,
        original_thought: &str,
        now: DateTime<Utc>,
    ) -> Update<String> {
        let challenge = CognitiveChallenge {
            id: new_id(),
            worry_id: worry_id.to_string(),
            original_thought: original_thought.to_string(),
            evidence_for: Vec::new(),
            evidence_against: Vec::new(),
            probability_rating: DEFAULT_PROBABILITY,
            helpfulness_rating: DEFAULT_HELPFULNESS,
            cognitive_distortions: Vec::new(),
            reframed_thought: String::new(),
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let id = challenge.id.clone();

        let mut state = self.clone();
        let effects = vec![Effect::SaveChallenge(challenge.clone())];
        state.challenges.push(challenge);

        Update {
            state,
            output: id,
            effects,
        }
    }

    /// Shallow-merge `patch` into an in-progress challenge.
    ///
    /// Returns `false` for an unknown id or a completed challenge.
    #[must_use]
    pub fn update_challenge(
        &self,
        id: &str,
        patch: ChallengePatch,
        now: DateTime<Utc>,
    ) -> Update<bool> {
        self.modify_open_challenge(id, now, |challenge| patch.apply_to(challenge))
    }

    /// Record the reframe and close the challenge. Completion is terminal:
    /// a second call returns `false`.
    #[must_use]
    pub fn complete_challenge(
        &self,
        id: &str,
        reframed_thought: &str,
        now: DateTime<Utc>,
    ) -> Update<bool> {
        self.modify_open_challenge(id, now, |challenge| {
            challenge.reframed_thought = reframed_thought.to_string();
            challenge.is_completed = true;
            challenge.completed_at = Some(now);
        })
    }

    #[must_use]
    pub fn challenge(&self, id: &str) -> Option<&CognitiveChallenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    /// Every challenge opened for `worry_id`, oldest first.
    #[must_use]
    pub fn worry_challenges(&self, worry_id: &str) -> Vec<&CognitiveChallenge> {
        self.challenges
            .iter()
            .filter(|c| c.worry_id == worry_id)
            .collect()
    }

    /// Remove a challenge. Returns `false` when the id is unknown.
    #[must_use]
    pub fn delete_challenge(&self, id: &str) -> Update<bool> {
        if self.challenge(id).is_none() {
            return Update::unchanged(self, false);
        }

        let mut state = self.clone();
        state.challenges.retain(|c| c.id != id);

        Update {
            state,
            output: true,
            effects: vec![Effect::DeleteChallenge(id.to_string())],
        }
    }

    fn modify_open_challenge(
        &self,
        id: &str,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut CognitiveChallenge),
    ) -> Update<bool> {
        let Some(index) = self.challenges.iter().position(|c| c.id == id) else {
            return Update::unchanged(self, false);
        };
        if self.challenges[index].is_completed {
            tracing::debug!(challenge = id, "refusing to modify completed challenge");
            return Update::unchanged(self, false);
        }

        let mut state = self.clone();
        let challenge = &mut state.challenges[index];
        edit(challenge);
        challenge.updated_at = now;
        let effects = vec![Effect::SaveChallenge(challenge.clone())];

        Update {
            state,
            output: true,
            effects,
        }
    }
}
