//! End-to-end pipeline over a real SQLite journal: pure store operations,
//! effect application, remote linking, and reloading from a fresh
//! connection.

use chrono::Utc;
use ease_core::db::{self, SqliteStore};
use ease_core::effects::{self, LocalStore, RemoteStatus};
use ease_core::model::{Category, Distortion, EvidenceKind, NewWorry};
use ease_core::store::AppState;
use ease_core::sync::api::{
    CreateReflectionRequest, CreateWorryRequest, RegisterRequest, RegisteredAccount, RemoteRecord,
    RemoteSettings, WorryStatus,
};
use ease_core::sync::{RemoteSync, SyncError};
use ease_core::wizard::{Step, Wizard};
use std::cell::RefCell;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn open(root: &Path) -> SqliteStore {
    SqliteStore::new(db::open_store(&db::db_path(root)).expect("open journal"))
}

fn interview() -> NewWorry {
    NewWorry {
        name: "Interview".into(),
        description: "I will freeze in the interview".into(),
        category: Category::Work,
        body_responses: vec!["Racing heartbeat".into()],
        intensity: 7,
    }
    .validate()
    .expect("valid worry")
}

/// Records every call and hands out a fixed server id.
#[derive(Default)]
struct RecordingRemote {
    calls: RefCell<Vec<String>>,
}

impl RemoteSync for RecordingRemote {
    fn create_worry(&self, request: &CreateWorryRequest) -> Result<RemoteRecord, SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("create_worry {}", request.title));
        Ok(RemoteRecord { id: "srv-9".into() })
    }

    fn update_worry_status(&self, remote_id: &str, status: WorryStatus) -> Result<(), SyncError> {
        self.calls
            .borrow_mut()
            .push(format!("update_worry_status {remote_id} {status}"));
        Ok(())
    }

    fn create_reflection(
        &self,
        request: &CreateReflectionRequest,
    ) -> Result<RemoteRecord, SyncError> {
        self.calls.borrow_mut().push(format!(
            "create_reflection {}",
            request.worry_id.clone().unwrap_or_default()
        ));
        Ok(RemoteRecord { id: "ref-1".into() })
    }

    fn load_settings(&self) -> Result<Option<RemoteSettings>, SyncError> {
        Ok(None)
    }

    fn save_settings(&self, _settings: &RemoteSettings) -> Result<(), SyncError> {
        self.calls.borrow_mut().push("save_settings".into());
        Ok(())
    }

    fn register(&self, request: &RegisterRequest) -> Result<RegisteredAccount, SyncError> {
        Ok(RegisteredAccount {
            id: "acct-1".into(),
            email: request.email.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn state_survives_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let now = Utc::now();

    let id = {
        let mut store = open(dir.path());
        let update = AppState::default().add_worry(interview(), now);
        let report = effects::apply(update.effects, &mut store, None).expect("apply");
        assert_eq!(report.local_writes, 1);
        assert_eq!(report.remote[0].status, RemoteStatus::SkippedNoSession);
        update.output
    };

    let store = open(dir.path());
    let state = store.load_state().expect("load");
    let worry = state.worry(&id).expect("worry persisted");
    assert_eq!(worry.name, "Interview");
    assert_eq!(worry.body_responses, vec!["Racing heartbeat".to_string()]);
    assert_eq!(worry.created_at.timestamp_micros(), now.timestamp_micros());
}

#[test]
fn wizard_run_syncs_reflection_against_linked_worry() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = open(dir.path());
    let remote = RecordingRemote::default();
    let now = Utc::now();

    let added = AppState::default().add_worry(interview(), now);
    let worry_id = added.output.clone();
    effects::apply(added.effects, &mut store, Some(&remote)).expect("apply add");

    let state = store.load_state().expect("load");
    let worry = state.worry(&worry_id).expect("worry");
    let (mut wizard, begun) =
        Wizard::begin(&state, Some(worry.id.as_str()), Some(worry.description.as_str()), now).expect("begin");
    effects::apply(begun.effects, &mut store, Some(&remote)).expect("apply begin");
    store.save_draft(&wizard, now).expect("save draft");

    // Each step runs against state reloaded from disk, like separate invocations.
    wizard.set_input("I blanked once before");
    assert!(wizard.add_evidence(EvidenceKind::For));
    while wizard.step() != Step::Reframe {
        if wizard.step() == Step::Distortions {
            wizard.toggle_distortion(Distortion::Catastrophizing);
        }
        let state = store.load_state().expect("load");
        let update = wizard.next(&state, now).expect("next");
        effects::apply(update.effects, &mut store, Some(&remote)).expect("apply next");
        store.save_draft(&wizard, now).expect("save draft");
    }

    let mut wizard = store.load_draft().expect("load draft").expect("draft exists");
    wizard.set_reframe("I prepared and can handle hard questions");
    let state = store.load_state().expect("load");
    let completed = wizard.complete(&state, now).expect("complete");
    let report = effects::apply(completed.effects, &mut store, Some(&remote)).expect("apply");
    assert_eq!(report.synced(), 2);
    assert!(store.clear_draft().expect("clear"));

    assert_eq!(
        *remote.calls.borrow(),
        vec![
            "create_worry Interview".to_string(),
            "create_reflection srv-9".to_string(),
            "update_worry_status srv-9 RESOLVED".to_string(),
        ]
    );

    let state = store.load_state().expect("reload");
    let challenge = state
        .challenge(&completed.output.id)
        .expect("challenge persisted");
    assert!(challenge.is_completed);
    assert_eq!(challenge.evidence_for, vec!["I blanked once before".to_string()]);
    assert_eq!(challenge.cognitive_distortions, vec![Distortion::Catastrophizing]);
    assert!(!state.worry(&worry_id).expect("worry").is_released);
    assert!(store.load_draft().expect("load draft").is_none());
}

#[test]
fn clearing_worries_forgets_remote_links() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = open(dir.path());
    let remote = RecordingRemote::default();
    let now = Utc::now();

    let added = AppState::default().add_worry(interview(), now);
    let worry_id = added.output.clone();
    effects::apply(added.effects, &mut store, Some(&remote)).expect("apply add");
    assert_eq!(
        store.remote_id(&worry_id).expect("lookup").as_deref(),
        Some("srv-9")
    );

    let cleared = store.load_state().expect("load").clear_worries();
    assert_eq!(cleared.output, 1);
    effects::apply(cleared.effects, &mut store, None).expect("apply clear");

    let state = store.load_state().expect("load");
    assert!(state.worries.is_empty());
    assert!(store.remote_id(&worry_id).expect("lookup").is_none());
    let released = state.release_worry(&worry_id, now);
    assert!(!released.output);
}
