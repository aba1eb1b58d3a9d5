//! ease-core library.
//!
//! Domain records, the pure application-state store, the challenge wizard,
//! local persistence and the remote sync client behind the `ease` CLI.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` at I/O boundaries; typed `thiserror`
//!   enums (with an [`error::ErrorCode`]) for failures callers branch on.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Purity**: [`store::AppState`] never performs I/O. Mutations return an
//!   [`store::Update`] whose effects are executed by [`effects::apply`].

pub mod config;
pub mod db;
pub mod effects;
pub mod error;
pub mod lock;
pub mod model;
pub mod store;
pub mod sync;
pub mod wizard;
