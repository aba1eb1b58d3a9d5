//! Pure application state.
//!
//! [`AppState`] owns every worry, challenge and the settings record. All
//! mutations borrow the current state and return an [`Update`]: the next
//! state, an operation-specific output and the [`Effect`]s the caller must
//! execute (see [`crate::effects::apply`]). Nothing in this module performs
//! I/O.
//!
//! Operations addressing an unknown id report `false`/`None` and emit no
//! effects, leaving the caller to decide whether that is an error.

pub mod challenges;
pub mod stats;
pub mod worries;

pub use stats::{ChallengeStats, DistortionCount, Trend, WorryStats, release_rate};

use serde::{Deserialize, Serialize};

use crate::model::{CognitiveChallenge, Settings, Worry};
use crate::sync::api::{CreateReflectionRequest, CreateWorryRequest, RemoteSettings};

/// The complete journal held in memory for one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// In insertion order.
    pub worries: Vec<Worry>,
    /// In insertion order.
    pub challenges: Vec<CognitiveChallenge>,
    pub settings: Settings,
}

/// Result of a pure store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update<T> {
    pub state: AppState,
    pub output: T,
    pub effects: Vec<Effect>,
}

impl<T> Update<T> {
    /// An update that leaves `state` as it is and emits nothing.
    pub(crate) fn unchanged(state: &AppState, output: T) -> Self {
        Self {
            state: state.clone(),
            output,
            effects: Vec::new(),
        }
    }

    /// Transform the output, keeping state and effects.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Update<U> {
        Update {
            state: self.state,
            output: f(self.output),
            effects: self.effects,
        }
    }

    /// Chain a follow-up operation on the resulting state, concatenating
    /// the effects of both in order.
    pub fn then<U>(self, f: impl FnOnce(&AppState) -> Update<U>) -> Update<(T, U)> {
        let next = f(&self.state);
        let mut effects = self.effects;
        effects.extend(next.effects);
        Update {
            state: next.state,
            output: (self.output, next.output),
            effects,
        }
    }
}

/// A side-effect intent emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", content = "data", rename_all = "snake_case")]
pub enum Effect {
    SaveWorry(Worry),
    ClearWorries,
    SaveChallenge(CognitiveChallenge),
    DeleteChallenge(String),
    SaveSettings(Settings),
    Remote(RemoteIntent),
}

impl Effect {
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// A call to the Ease web API, attempted only with an authenticated session.
///
/// Local ids are carried alongside each request; the executor translates
/// them to server ids recorded when the worry was first pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum RemoteIntent {
    CreateWorry {
        worry_id: String,
        request: CreateWorryRequest,
    },
    CreateReflection {
        worry_id: String,
        request: CreateReflectionRequest,
    },
    ResolveWorry {
        worry_id: String,
    },
    SaveSettings(RemoteSettings),
}

impl RemoteIntent {
    /// Short label used in logs and command output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreateWorry { .. } => "create worry",
            Self::CreateReflection { .. } => "create reflection",
            Self::ResolveWorry { .. } => "resolve worry",
            Self::SaveSettings(_) => "save settings",
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_update_has_no_effects() {
        let state = AppState::default();
        let update = Update::unchanged(&state, false);
        assert_eq!(update.state, state);
        assert!(update.effects.is_empty());
    }

    #[test]
    fn then_concatenates_effects_in_order() {
        let state = AppState::default();
        let update = Update {
            state: state.clone(),
            output: 1,
            effects: vec![Effect::ClearWorries],
        }
        .then(|s| Update {
            state: s.clone(),
            output: "two",
            effects: vec![Effect::DeleteChallenge("c1".into())],
        });
        assert_eq!(update.output, (1, "two"));
        assert_eq!(
            update.effects,
            vec![Effect::ClearWorries, Effect::DeleteChallenge("c1".into())]
        );
    }

    #[test]
    fn ids_are_unique_uuids() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn remote_effects_are_flagged() {
        assert!(Effect::Remote(RemoteIntent::ResolveWorry {
            worry_id: "w".into()
        })
        .is_remote());
        assert!(!Effect::ClearWorries.is_remote());
    }
}
