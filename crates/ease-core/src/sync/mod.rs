//! Remote synchronization with the Ease web API.
//!
//! The local journal is the source of truth. Remote calls are best effort:
//! callers log a [`SyncError`] and carry on, nothing is retried and local
//! state is never rolled back.

pub mod api;
pub mod http;

pub use http::HttpSync;

use crate::error::ErrorCode;
use crate::model::ValidationError;
use api::{
    CreateReflectionRequest, CreateWorryRequest, RegisterRequest, RegisteredAccount, RemoteRecord,
    RemoteSettings, WorryStatus,
};

/// Port to the remote service. Implemented over HTTP by [`HttpSync`] and
/// by in-memory fakes in tests.
pub trait RemoteSync {
    /// `POST /api/worries`. Returns the server id of the created worry.
    ///
    /// # Errors
    ///
    /// Any [`SyncError`]; the caller treats it as non-fatal.
    fn create_worry(&self, request: &CreateWorryRequest) -> Result<RemoteRecord, SyncError>;

    /// `PATCH /api/worries/{id}` with a terminal status.
    ///
    /// # Errors
    ///
    /// [`SyncError::Invalid`] for a non-terminal status, otherwise any
    /// transport or API failure.
    fn update_worry_status(&self, remote_id: &str, status: WorryStatus) -> Result<(), SyncError>;

    /// `POST /api/reflections`.
    ///
    /// # Errors
    ///
    /// Any [`SyncError`].
    fn create_reflection(
        &self,
        request: &CreateReflectionRequest,
    ) -> Result<RemoteRecord, SyncError>;

    /// `GET /api/user/settings`. `None` when the account has no settings yet.
    ///
    /// # Errors
    ///
    /// Any [`SyncError`].
    fn load_settings(&self) -> Result<Option<RemoteSettings>, SyncError>;

    /// `POST /api/user/settings`.
    ///
    /// # Errors
    ///
    /// Any [`SyncError`].
    fn save_settings(&self, settings: &RemoteSettings) -> Result<(), SyncError>;

    /// `POST /api/auth/register`. Does not need a session.
    ///
    /// # Errors
    ///
    /// [`SyncError::Api`] with status 409 when the email is taken.
    fn register(&self, request: &RegisterRequest) -> Result<RegisteredAccount, SyncError>;
}

/// Failure of a single remote call.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("server rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not reach {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("request not sent: {0}")]
    Invalid(#[from] ValidationError),
}

impl SyncError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized => ErrorCode::RemoteUnauthorized,
            Self::Api { .. } => ErrorCode::RemoteRejected,
            Self::Transport { .. } | Self::Decode { .. } => ErrorCode::RemoteUnreachable,
            Self::Invalid(err) => err.code(),
        }
    }

    /// True when the server answered 409 Conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}
