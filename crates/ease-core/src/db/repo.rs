//! Row mapping between the journal tables and the store types.
//!
//! [`SqliteStore`] is the on-disk [`LocalStore`]: every batch of effects is
//! applied in a single transaction, and `load_state` rebuilds an
//! [`AppState`] in insertion order.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::effects::LocalStore;
use crate::model::{CognitiveChallenge, Settings, Worry};
use crate::store::{AppState, Effect};
use crate::wizard::Wizard;

/// Journal database handle.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Read every worry, challenge and the settings row.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a stored row is malformed.
    pub fn load_state(&self) -> Result<AppState> {
        Ok(AppState {
            worries: self.load_worries()?,
            challenges: self.load_challenges()?,
            settings: self.load_settings()?.unwrap_or_default(),
        })
    }

    fn load_worries(&self) -> Result<Vec<Worry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT worry_id, name, description, category, body_responses_json,
                        intensity, created_at_us, is_released, released_at_us
                 FROM worries
                 ORDER BY rowid",
            )
            .context("prepare load_worries")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(WorryRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    category: row.get(3)?,
                    body_responses_json: row.get(4)?,
                    intensity: row.get(5)?,
                    created_at_us: row.get(6)?,
                    is_released: row.get(7)?,
                    released_at_us: row.get(8)?,
                })
            })
            .context("execute load_worries")?;

        let mut worries = Vec::new();
        for row in rows {
            let row = row.context("read worry row")?;
            let id = row.id.clone();
            worries.push(row.into_worry().with_context(|| format!("decode worry {id}"))?);
        }
        Ok(worries)
    }

    fn load_challenges(&self) -> Result<Vec<CognitiveChallenge>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT challenge_id, worry_id, original_thought, evidence_for_json,
                        evidence_against_json, probability_rating, helpfulness_rating,
                        distortions_json, reframed_thought, is_completed,
                        completed_at_us, created_at_us, updated_at_us
                 FROM challenges
                 ORDER BY rowid",
            )
            .context("prepare load_challenges")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ChallengeRow {
                    id: row.get(0)?,
                    worry_id: row.get(1)?,
                    original_thought: row.get(2)?,
                    evidence_for_json: row.get(3)?,
                    evidence_against_json: row.get(4)?,
                    probability_rating: row.get(5)?,
                    helpfulness_rating: row.get(6)?,
                    distortions_json: row.get(7)?,
                    reframed_thought: row.get(8)?,
                    is_completed: row.get(9)?,
                    completed_at_us: row.get(10)?,
                    created_at_us: row.get(11)?,
                    updated_at_us: row.get(12)?,
                })
            })
            .context("execute load_challenges")?;

        let mut challenges = Vec::new();
        for row in rows {
            let row = row.context("read challenge row")?;
            let id = row.id.clone();
            challenges.push(
                row.into_challenge()
                    .with_context(|| format!("decode challenge {id}"))?,
            );
        }
        Ok(challenges)
    }

    fn load_settings(&self) -> Result<Option<Settings>> {
        let row = self
            .conn
            .query_row(
                "SELECT daily_worry_time, notifications, reflection_time, custom_categories_json
                 FROM settings WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .context("query settings")?;

        row.map(
            |(daily_worry_time, notifications, reflection_time, categories_json)| {
                Ok(Settings {
                    daily_worry_time,
                    notifications,
                    reflection_time,
                    custom_categories: serde_json::from_str(&categories_json)
                        .context("decode custom categories")?,
                })
            },
        )
        .transpose()
    }

    /// The saved in-progress wizard, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored draft is not valid.
    pub fn load_draft(&self) -> Result<Option<Wizard>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT draft_json FROM wizard_draft WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .context("query wizard draft")?;

        json.map(|json| serde_json::from_str(&json).context("decode wizard draft"))
            .transpose()
    }

    /// Replace the saved wizard draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft cannot be encoded or written.
    pub fn save_draft(&self, wizard: &Wizard, now: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(wizard).context("encode wizard draft")?;
        self.conn
            .execute(
                "INSERT INTO wizard_draft (id, draft_json, saved_at_us) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     draft_json = excluded.draft_json,
                     saved_at_us = excluded.saved_at_us",
                params![json, now.timestamp_micros()],
            )
            .context("write wizard draft")?;
        tracing::trace!(challenge = %wizard.challenge_id, step = %wizard.step(), "wizard draft saved");
        Ok(())
    }

    /// Drop the saved wizard draft. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear_draft(&self) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM wizard_draft WHERE id = 1", [])
            .context("delete wizard draft")?;
        Ok(deleted > 0)
    }
}

impl LocalStore for SqliteStore {
    fn write(&mut self, effects: &[Effect]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin journal write")?;
        let mut written = 0;
        for effect in effects {
            if write_effect(&tx, effect)? {
                written += 1;
            }
        }
        tx.commit().context("commit journal write")?;
        tracing::debug!(written, "journal updated");
        Ok(written)
    }

    fn link_remote(&mut self, local_id: &str, remote_id: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO remote_links (worry_id, remote_id, linked_at_us)
                 VALUES (?1, ?2, ?3)",
                params![local_id, remote_id, Utc::now().timestamp_micros()],
            )
            .with_context(|| format!("link worry {local_id} to {remote_id}"))?;
        Ok(())
    }

    fn remote_id(&self, local_id: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT remote_id FROM remote_links WHERE worry_id = ?1",
                params![local_id],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("look up server id for worry {local_id}"))
    }
}

/// Returns false for remote intents, which have no local row.
fn write_effect(tx: &Transaction<'_>, effect: &Effect) -> Result<bool> {
    match effect {
        Effect::SaveWorry(worry) => upsert_worry(tx, worry)?,
        Effect::ClearWorries => {
            tx.execute("DELETE FROM worries", [])
                .context("clear worries")?;
            tx.execute("DELETE FROM remote_links", [])
                .context("clear remote links")?;
        }
        Effect::SaveChallenge(challenge) => upsert_challenge(tx, challenge)?,
        Effect::DeleteChallenge(id) => {
            tx.execute(
                "DELETE FROM challenges WHERE challenge_id = ?1",
                params![id],
            )
            .with_context(|| format!("delete challenge {id}"))?;
        }
        Effect::SaveSettings(settings) => upsert_settings(tx, settings)?,
        Effect::Remote(_) => return Ok(false),
    }
    Ok(true)
}

fn upsert_worry(tx: &Transaction<'_>, worry: &Worry) -> Result<()> {
    let body_responses =
        serde_json::to_string(&worry.body_responses).context("encode body responses")?;
    tx.execute(
        "INSERT INTO worries (
            worry_id, name, description, category, body_responses_json,
            intensity, created_at_us, is_released, released_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(worry_id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            category = excluded.category,
            body_responses_json = excluded.body_responses_json,
            intensity = excluded.intensity,
            is_released = excluded.is_released,
            released_at_us = excluded.released_at_us",
        params![
            worry.id,
            worry.name,
            worry.description,
            worry.category.as_str(),
            body_responses,
            worry.intensity,
            worry.created_at.timestamp_micros(),
            worry.is_released,
            worry.released_at.map(|at| at.timestamp_micros()),
        ],
    )
    .with_context(|| format!("save worry {}", worry.id))?;
    Ok(())
}

fn upsert_challenge(tx: &Transaction<'_>, challenge: &CognitiveChallenge) -> Result<()> {
    let evidence_for =
        serde_json::to_string(&challenge.evidence_for).context("encode evidence for")?;
    let evidence_against =
        serde_json::to_string(&challenge.evidence_against).context("encode evidence against")?;
    let distortions =
        serde_json::to_string(&challenge.cognitive_distortions).context("encode distortions")?;
    tx.execute(
        "INSERT INTO challenges (
            challenge_id, worry_id, original_thought, evidence_for_json,
            evidence_against_json, probability_rating, helpfulness_rating,
            distortions_json, reframed_thought, is_completed, completed_at_us,
            created_at_us, updated_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(challenge_id) DO UPDATE SET
            evidence_for_json = excluded.evidence_for_json,
            evidence_against_json = excluded.evidence_against_json,
            probability_rating = excluded.probability_rating,
            helpfulness_rating = excluded.helpfulness_rating,
            distortions_json = excluded.distortions_json,
            reframed_thought = excluded.reframed_thought,
            is_completed = excluded.is_completed,
            completed_at_us = excluded.completed_at_us,
            updated_at_us = excluded.updated_at_us",
        params![
            challenge.id,
            challenge.worry_id,
            challenge.original_thought,
            evidence_for,
            evidence_against,
            challenge.probability_rating,
            challenge.helpfulness_rating,
            distortions,
            challenge.reframed_thought,
            challenge.is_completed,
            challenge.completed_at.map(|at| at.timestamp_micros()),
            challenge.created_at.timestamp_micros(),
            challenge.updated_at.timestamp_micros(),
        ],
    )
    .with_context(|| format!("save challenge {}", challenge.id))?;
    Ok(())
}

fn upsert_settings(tx: &Transaction<'_>, settings: &Settings) -> Result<()> {
    let categories =
        serde_json::to_string(&settings.custom_categories).context("encode custom categories")?;
    tx.execute(
        "INSERT INTO settings (id, daily_worry_time, notifications, reflection_time, custom_categories_json)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            daily_worry_time = excluded.daily_worry_time,
            notifications = excluded.notifications,
            reflection_time = excluded.reflection_time,
            custom_categories_json = excluded.custom_categories_json",
        params![
            settings.daily_worry_time,
            settings.notifications,
            settings.reflection_time,
            categories,
        ],
    )
    .context("save settings")?;
    Ok(())
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("timestamp out of range: {micros}"))
}

struct WorryRow {
    id: String,
    name: String,
    description: String,
    category: String,
    body_responses_json: String,
    intensity: u8,
    created_at_us: i64,
    is_released: bool,
    released_at_us: Option<i64>,
}

impl WorryRow {
    fn into_worry(self) -> Result<Worry> {
        Ok(Worry {
            category: self.category.parse().context("decode category")?,
            body_responses: serde_json::from_str(&self.body_responses_json)
                .context("decode body responses")?,
            created_at: from_micros(self.created_at_us)?,
            released_at: self.released_at_us.map(from_micros).transpose()?,
            id: self.id,
            name: self.name,
            description: self.description,
            intensity: self.intensity,
            is_released: self.is_released,
        })
    }
}

struct ChallengeRow {
    id: String,
    worry_id: String,
    original_thought: String,
    evidence_for_json: String,
    evidence_against_json: String,
    probability_rating: u8,
    helpfulness_rating: u8,
    distortions_json: String,
    reframed_thought: String,
    is_completed: bool,
    completed_at_us: Option<i64>,
    created_at_us: i64,
    updated_at_us: i64,
}

impl ChallengeRow {
    fn into_challenge(self) -> Result<CognitiveChallenge> {
        Ok(CognitiveChallenge {
            evidence_for: serde_json::from_str(&self.evidence_for_json)
                .context("decode evidence for")?,
            evidence_against: serde_json::from_str(&self.evidence_against_json)
                .context("decode evidence against")?,
            cognitive_distortions: serde_json::from_str(&self.distortions_json)
                .context("decode distortions")?,
            completed_at: self.completed_at_us.map(from_micros).transpose()?,
            created_at: from_micros(self.created_at_us)?,
            updated_at: from_micros(self.updated_at_us)?,
            id: self.id,
            worry_id: self.worry_id,
            original_thought: self.original_thought,
            probability_rating: self.probability_rating,
            helpfulness_rating: self.helpfulness_rating,
            reframed_thought: self.reframed_thought,
            is_completed: self.is_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::db::{db_path, open_store};
    use crate::effects::LocalStore;
    use crate::model::{Category, ChallengePatch, Distortion, NewWorry, SettingsPatch};
    use crate::store::{AppState, Effect};
    use crate::wizard::Wizard;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn open() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let conn = open_store(&db_path(dir.path())).expect("open journal");
        (dir, SqliteStore::new(conn))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().expect("valid time")
    }

    fn worry(name: &str) -> NewWorry {
        NewWorry {
            name: name.into(),
            description: format!("{name} is on my mind"),
            category: Category::Custom("Garden".into()),
            body_responses: vec!["Racing heartbeat".into()],
            intensity: 6,
        }
    }

    /// Apply only the local half of an update, the way `effects::apply` does.
    fn persist(store: &mut SqliteStore, effects: Vec<Effect>) -> usize {
        let local: Vec<Effect> = effects.into_iter().filter(|e| !e.is_remote()).collect();
        store.write(&local).expect("write effects")
    }

    #[test]
    fn empty_journal_loads_default_state() {
        let (_dir, store) = open();
        let state = store.load_state().expect("load");
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn worries_and_challenges_survive_reload_in_order() {
        let (_dir, mut store) = open();
        let state = AppState::default();

        let first = state.add_worry(worry("Interview"), at(0));
        persist(&mut store, first.effects);
        let second = first.state.add_worry(worry("Rent"), at(10));
        persist(&mut store, second.effects);

        let started = second
            .state
            .start_challenge(&first.output, "I will fail", at(20));
        persist(&mut store, started.effects);
        let patch = ChallengePatch {
            evidence_for: Some(vec!["I stumbled last time".into()]),
            cognitive_distortions: Some(vec![Distortion::Catastrophizing]),
            probability_rating: Some(30),
            ..ChallengePatch::default()
        };
        let updated = started.state.update_challenge(&started.output, patch, at(30));
        assert!(updated.output);
        persist(&mut store, updated.effects);

        let released = updated.state.release_worry(&second.output, at(40));
        persist(&mut store, released.effects);

        let loaded = store.load_state().expect("load");
        assert_eq!(loaded, released.state);
        assert_eq!(loaded.worries[0].name, "Interview");
        assert_eq!(loaded.worries[1].released_at, Some(at(40)));
        assert_eq!(loaded.challenges[0].probability_rating, 30);
    }

    #[test]
    fn upsert_keeps_insertion_order() {
        let (_dir, mut store) = open();
        let a = AppState::default().add_worry(worry("A"), at(0));
        persist(&mut store, a.effects);
        let b = a.state.add_worry(worry("B"), at(1));
        persist(&mut store, b.effects);

        let released = b.state.release_worry(&a.output, at(2));
        persist(&mut store, released.effects);

        let names: Vec<String> = store
            .load_state()
            .expect("load")
            .worries
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn clear_and_delete_remove_rows() {
        let (_dir, mut store) = open();
        let added = AppState::default().add_worry(worry("Interview"), at(0));
        persist(&mut store, added.effects);
        store.link_remote(&added.output, "srv-1").expect("link");
        let started = added.state.start_challenge(&added.output, "I will fail", at(1));
        persist(&mut store, started.effects);

        let deleted = started.state.delete_challenge(&started.output);
        assert!(deleted.output);
        persist(&mut store, deleted.effects);
        let cleared = deleted.state.clear_worries();
        assert_eq!(persist(&mut store, cleared.effects), 1);

        let loaded = store.load_state().expect("load");
        assert!(loaded.worries.is_empty());
        assert!(loaded.challenges.is_empty());
        assert_eq!(store.remote_id(&added.output).expect("lookup"), None);
    }

    #[test]
    fn settings_are_a_single_row() {
        let (_dir, mut store) = open();
        let first = AppState::default().update_settings(SettingsPatch {
            daily_worry_time: Some(20),
            ..SettingsPatch::default()
        });
        persist(&mut store, first.effects);
        let second = first.state.update_settings(SettingsPatch {
            custom_categories: Some(vec!["Garden".into()]),
            ..SettingsPatch::default()
        });
        persist(&mut store, second.effects);

        let settings = store.load_state().expect("load").settings;
        assert_eq!(settings.daily_worry_time, 20);
        assert_eq!(settings.custom_categories, vec!["Garden".to_string()]);

        let rows: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[test]
    fn remote_links_round_trip_and_replace() {
        let (_dir, mut store) = open();
        assert_eq!(store.remote_id("w1").expect("lookup"), None);
        store.link_remote("w1", "srv-1").expect("link");
        store.link_remote("w1", "srv-2").expect("relink");
        assert_eq!(store.remote_id("w1").expect("lookup").as_deref(), Some("srv-2"));
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let (_dir, mut store) = open();
        let added = AppState::default().add_worry(worry("Interview"), at(0));
        let Effect::SaveWorry(mut broken) = added.effects[0].clone() else {
            panic!("expected save worry first");
        };
        broken.id = "w-broken".into();
        broken.intensity = 42;

        let batch = vec![added.effects[0].clone(), Effect::SaveWorry(broken)];
        assert!(store.write(&batch).is_err());
        assert!(store.load_state().expect("load").worries.is_empty());
    }

    #[test]
    fn wizard_draft_round_trip() {
        let (_dir, store) = open();
        assert!(store.load_draft().expect("load").is_none());
        assert!(!store.clear_draft().expect("clear"));

        let state = AppState::default();
        let (mut wizard, _) =
            Wizard::begin(&state, Some("w1"), Some("I will fail"), at(0)).expect("begin");
        wizard.set_input("I stumbled last time");
        wizard.toggle_distortion(Distortion::Labeling);

        store.save_draft(&wizard, at(1)).expect("save");
        store.save_draft(&wizard, at(2)).expect("save again");
        assert_eq!(store.load_draft().expect("load"), Some(wizard));

        assert!(store.clear_draft().expect("clear"));
        assert!(store.load_draft().expect("load").is_none());
    }
}
