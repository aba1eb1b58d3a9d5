//! Per-invocation context shared by command handlers.
//!
//! A mutating command runs `open_journal(Access::Write)`, loads the state,
//! applies one store operation, and hands the effects to
//! [`Journal::apply`]. The journal lock is held until the [`Journal`] drops.

use crate::output::{CliError, OutputMode, fail};
use crate::session;
use anyhow::Context as _;
use ease_core::config::{EASE_DIR, EffectiveConfig};
use ease_core::db::{self, SqliteStore};
use ease_core::effects::{self, ApplyReport};
use ease_core::error::ErrorCode;
use ease_core::lock::{DEFAULT_LOCK_TIMEOUT, LockError, StoreLock, StoreReadLock};
use ease_core::store::{AppState, Effect};
use ease_core::sync::{HttpSync, RemoteSync};
use std::path::{Path, PathBuf};

/// Walk up from `start` looking for a directory that contains `.ease/`.
pub fn find_journal_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(EASE_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug)]
enum JournalLock {
    Read(StoreReadLock),
    Write(StoreLock),
}

/// An open journal database guarded by the journal lock.
pub struct Journal {
    pub store: SqliteStore,
    _lock: JournalLock,
}

impl Journal {
    /// Load the full application state.
    pub fn state(&self) -> anyhow::Result<AppState> {
        self.store
            .load_state()
            .with_context(|| format!("{}: failed to load journal", ErrorCode::CorruptStore))
    }

    /// Persist local effects, then push remote intents when `remote` is set.
    pub fn apply(
        &mut self,
        effects: Vec<Effect>,
        remote: Option<&HttpSync>,
    ) -> anyhow::Result<ApplyReport> {
        let remote = remote.map(|client| client as &dyn RemoteSync);
        effects::apply(effects, &mut self.store, remote)
    }
}

/// Global flags and configuration resolved once in `main`.
pub struct Context {
    pub cwd: PathBuf,
    pub output: OutputMode,
    pub config: EffectiveConfig,
    pub session: Option<String>,
}

impl Context {
    pub fn new(
        cwd: PathBuf,
        output: OutputMode,
        config: EffectiveConfig,
        session_flag: Option<&str>,
    ) -> Self {
        let session = session::resolve_session(session_flag, config.user.session_token.as_deref());
        Self {
            cwd,
            output,
            config,
            session,
        }
    }

    /// Open the journal enclosing the working directory.
    ///
    /// # Errors
    ///
    /// Fails with `E1001` when no journal exists, `E5002` when the lock is
    /// held elsewhere, or when the database cannot be opened.
    pub fn open_journal(&self, access: Access) -> anyhow::Result<Journal> {
        let Some(root) = find_journal_root(&self.cwd) else {
            return Err(fail(
                self.output,
                &CliError::coded(
                    ErrorCode::NotInitialized,
                    "not an ease journal: .ease directory not found",
                ),
            ));
        };

        let lock_path = db::lock_path(&root);
        let lock = match access {
            Access::Read => {
                StoreReadLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT).map(JournalLock::Read)
            }
            Access::Write => {
                StoreLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT).map(JournalLock::Write)
            }
        }
        .map_err(|err| self.lock_failure(&err))?;

        let conn = db::open_store(&db::db_path(&root)).map_err(|err| {
            fail(
                self.output,
                &CliError::coded(ErrorCode::CorruptStore, format!("{err:#}")),
            )
        })?;

        tracing::debug!(root = %root.display(), ?access, "journal opened");
        Ok(Journal {
            store: SqliteStore::new(conn),
            _lock: lock,
        })
    }

    fn lock_failure(&self, err: &LockError) -> anyhow::Error {
        fail(self.output, &CliError::coded(err.code(), err.to_string()))
    }

    /// Remote client for the configured web app, if a session is available.
    pub fn remote(&self) -> Option<HttpSync> {
        let session = self.session.as_deref()?;
        self.client().map(|client| client.with_session(session))
    }

    /// Remote client without a session, for unauthenticated endpoints.
    pub fn client(&self) -> Option<HttpSync> {
        let remote = &self.config.project.remote;
        let base_url = remote.base_url.as_deref()?;
        Some(HttpSync::new(base_url, remote.timeout()).with_cookie_name(&remote.session_cookie))
    }

    /// Like [`Context::client`], but a missing base URL is an error.
    pub fn require_client(&self) -> anyhow::Result<HttpSync> {
        self.client().ok_or_else(|| {
            fail(
                self.output,
                &CliError::coded(
                    ErrorCode::RemoteNotConfigured,
                    "no remote configured for this journal",
                ),
            )
        })
    }

    /// Like [`Context::remote`], but a missing base URL or session is an error.
    pub fn require_remote(&self) -> anyhow::Result<HttpSync> {
        let client = self.require_client()?;
        match self.session.as_deref() {
            Some(session) => Ok(client.with_session(session)),
            None => Err(fail(
                self.output,
                &CliError::coded(ErrorCode::RemoteUnauthorized, "not signed in"),
            )),
        }
    }
}
