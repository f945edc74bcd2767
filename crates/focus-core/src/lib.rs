//! focus-core - Core library for Focus
//!
//! This crate contains the record models, the local blob store, the remote
//! store client, and the reconciliation layer that keeps the two in step.
//! Clients (CLI today) drive it as the UI collaborator.

pub mod auth;
pub mod backup;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod remote;
pub mod stats;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use identity::{Identity, IdentityProvider};
pub use models::{Interrupt, InterruptOutcome, Session, SessionStatus, SyncStatus};
pub use store::LocalStore;
pub use sync::{AutoSync, ReconcileEngine, SyncCounts, SyncStatusPublisher};
