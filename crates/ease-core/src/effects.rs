//! Execution of store effects.
//!
//! Local effects are written first, atomically. Remote intents then run in
//! emission order against the [`RemoteSync`] port. The first remote failure
//! stops the chain: it is logged and reported, never propagated, and the
//! local writes stand.

use anyhow::Context as _;
use serde::Serialize;

use crate::store::{Effect, RemoteIntent};
use crate::sync::{RemoteSync, SyncError, api::WorryStatus};

/// Persistence port for local effects.
pub trait LocalStore {
    /// Write every effect in one transaction. Returns the number written.
    ///
    /// # Errors
    ///
    /// Any storage failure. Nothing is written in that case.
    fn write(&mut self, effects: &[Effect]) -> anyhow::Result<usize>;

    /// Remember the server id assigned to a local worry.
    ///
    /// # Errors
    ///
    /// Any storage failure.
    fn link_remote(&mut self, local_id: &str, remote_id: &str) -> anyhow::Result<()>;

    /// Server id of a local worry, if it was ever pushed.
    ///
    /// # Errors
    ///
    /// Any storage failure.
    fn remote_id(&self, local_id: &str) -> anyhow::Result<Option<String>>;
}

/// What happened to one remote intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteStatus {
    Synced,
    /// No session: the change is saved locally only.
    SkippedNoSession,
    /// An earlier call in the same chain failed.
    SkippedEarlierFailure,
    /// The worry was never pushed, so there is no server record to address.
    SkippedNotLinked,
    Failed { code: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteOutcome {
    pub intent: &'static str,
    #[serde(flatten)]
    pub status: RemoteStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub local_writes: usize,
    pub remote: Vec<RemoteOutcome>,
}

impl ApplyReport {
    /// The remote call that failed, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&RemoteOutcome> {
        self.remote
            .iter()
            .find(|o| matches!(o.status, RemoteStatus::Failed { .. }))
    }

    /// True when some remote intent was not delivered.
    #[must_use]
    pub fn saved_locally_only(&self) -> bool {
        self.remote.iter().any(|o| {
            matches!(
                o.status,
                RemoteStatus::SkippedNoSession
                    | RemoteStatus::SkippedEarlierFailure
                    | RemoteStatus::Failed { .. }
            )
        })
    }

    #[must_use]
    pub fn synced(&self) -> usize {
        self.remote
            .iter()
            .filter(|o| o.status == RemoteStatus::Synced)
            .count()
    }
}

/// Execute `effects`: local writes, then remote intents when `remote` is
/// available.
///
/// # Errors
///
/// Only local persistence failures. Remote failures are reported in the
/// returned [`ApplyReport`].
pub fn apply(
    effects: Vec<Effect>,
    local: &mut dyn LocalStore,
    remote: Option<&dyn RemoteSync>,
) -> anyhow::Result<ApplyReport> {
    let (intents, writes): (Vec<Effect>, Vec<Effect>) =
        effects.into_iter().partition(Effect::is_remote);

    let local_writes = if writes.is_empty() {
        0
    } else {
        local
            .write(&writes)
            .context("failed to persist local changes")?
    };

    let intents: Vec<RemoteIntent> = intents
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Remote(intent) => Some(intent),
            _ => None,
        })
        .collect();

    let Some(remote) = remote else {
        if !intents.is_empty() {
            tracing::info!(pending = intents.len(), "no session; saved locally only");
        }
        let remote = intents
            .iter()
            .map(|intent| RemoteOutcome {
                intent: intent.label(),
                status: RemoteStatus::SkippedNoSession,
            })
            .collect();
        return Ok(ApplyReport {
            local_writes,
            remote,
        });
    };

    let mut outcomes = Vec::with_capacity(intents.len());
    let mut failed = false;
    for intent in &intents {
        let status = if failed {
            RemoteStatus::SkippedEarlierFailure
        } else {
            match execute(intent, local, remote)? {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(
                        intent = intent.label(),
                        code = err.code().code(),
                        error = %err,
                        "remote sync failed; saved locally only"
                    );
                    failed = true;
                    RemoteStatus::Failed {
                        code: err.code().code(),
                        message: err.to_string(),
                    }
                }
            }
        };
        outcomes.push(RemoteOutcome {
            intent: intent.label(),
            status,
        });
    }

    Ok(ApplyReport {
        local_writes,
        remote: outcomes,
    })
}

/// Outer error: local bookkeeping failed. Inner error: the remote call failed.
fn execute(
    intent: &RemoteIntent,
    local: &mut dyn LocalStore,
    remote: &dyn RemoteSync,
) -> anyhow::Result<Result<RemoteStatus, SyncError>> {
    match intent {
        RemoteIntent::CreateWorry { worry_id, request } => {
            let record = match remote.create_worry(request) {
                Ok(record) => record,
                Err(err) => return Ok(Err(err)),
            };
            local
                .link_remote(worry_id, &record.id)
                .with_context(|| format!("failed to record server id for worry {worry_id}"))?;
            tracing::debug!(worry = %worry_id, remote = %record.id, "worry pushed");
            Ok(Ok(RemoteStatus::Synced))
        }
        RemoteIntent::CreateReflection { worry_id, request } => {
            let mut request = request.clone();
            request.worry_id = local.remote_id(worry_id)?;
            Ok(remote
                .create_reflection(&request)
                .map(|_| RemoteStatus::Synced))
        }
        RemoteIntent::ResolveWorry { worry_id } => {
            let Some(remote_id) = local.remote_id(worry_id)? else {
                tracing::debug!(worry = %worry_id, "worry was never pushed; nothing to resolve");
                return Ok(Ok(RemoteStatus::SkippedNotLinked));
            };
            Ok(remote
                .update_worry_status(&remote_id, WorryStatus::Resolved)
                .map(|()| RemoteStatus::Synced))
        }
        RemoteIntent::SaveSettings(settings) => Ok(remote
            .save_settings(settings)
            .map(|()| RemoteStatus::Synced)),
    }
}
