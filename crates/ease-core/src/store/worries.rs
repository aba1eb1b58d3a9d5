use chrono::{DateTime, Utc};

use super::{AppState, Effect, RemoteIntent, Update, new_id};
use crate::model::{NewWorry, Settings, SettingsPatch, Worry};
use crate::sync::api::{CreateWorryRequest, RemoteSettings};

impl AppState {
    /// Append a worry. `input` is expected to have passed
    /// [`NewWorry::validate`]. Returns the new id.
    #[must_use]
    pub fn add_worry(&self, input: NewWorry, now: DateTime<Utc>) -> Update<String> {
        let worry = Worry {
            id: new_id(),
            name: input.name,
            description: input.description,
            category: input.category,
            body_responses: input.body_responses,
            intensity: input.intensity,
            created_at: now,
            is_released: false,
            released_at: None,
        };
        let id = worry.id.clone();

        let mut state = self.clone();
        let effects = vec![
            Effect::SaveWorry(worry.clone()),
            Effect::Remote(RemoteIntent::CreateWorry {
                worry_id: id.clone(),
                request: CreateWorryRequest::from(&worry),
            }),
        ];
        state.worries.push(worry);

        Update {
            state,
            output: id,
            effects,
        }
    }

    /// Mark a worry released. Returns `false` when the id is unknown.
    /// Releasing twice keeps the first timestamp and emits nothing.
    #[must_use]
    pub fn release_worry(&self, id: &str, now: DateTime<Utc>) -> Update<bool> {
        let Some(index) = self.worries.iter().position(|w| w.id == id) else {
            return Update::unchanged(self, false);
        };
        if self.worries[index].is_released {
            return Update::unchanged(self, true);
        }

        let mut state = self.clone();
        let worry = &mut state.worries[index];
        worry.is_released = true;
        worry.released_at = Some(now);
        let effects = vec![
            Effect::SaveWorry(worry.clone()),
            Effect::Remote(RemoteIntent::ResolveWorry {
                worry_id: id.to_string(),
            }),
        ];

        Update {
            state,
            output: true,
            effects,
        }
    }

    #[must_use]
    pub fn worry(&self, id: &str) -> Option<&Worry> {
        self.worries.iter().find(|w| w.id == id)
    }

    #[must_use]
    pub fn active_worries(&self) -> Vec<&Worry> {
        self.worries.iter().filter(|w| w.is_active()).collect()
    }

    #[must_use]
    pub fn released_worries(&self) -> Vec<&Worry> {
        self.worries.iter().filter(|w| w.is_released).collect()
    }

    /// Shallow-merge settings. `patch` is expected to have passed
    /// [`SettingsPatch::validate`].
    #[must_use]
    pub fn update_settings(&self, patch: SettingsPatch) -> Update<Settings> {
        let mut state = self.clone();
        patch.merge_into(&mut state.settings);
        let settings = state.settings.clone();
        let effects = vec![
            Effect::SaveSettings(settings.clone()),
            Effect::Remote(RemoteIntent::SaveSettings(RemoteSettings::from(&settings))),
        ];

        Update {
            state,
            output: settings,
            effects,
        }
    }

    /// Drop every worry. Challenges are kept. Returns how many were removed.
    #[must_use]
    pub fn clear_worries(&self) -> Update<usize> {
        let mut state = self.clone();
        let removed = state.worries.len();
        state.worries.clear();

        Update {
            state,
            output: removed,
            effects: vec![Effect::ClearWorries],
        }
    }
}
