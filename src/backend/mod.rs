//! Hosted-backend collaborators
//!
//! Everything durable lives behind a hosted backend-as-a-service: identity
//! (OAuth sessions), the `users` directory, and the `scores` ledger. The
//! contracts are small and keyed: per-user upserts with last-write-wins,
//! ordered top-N reads. This module owns the types, the auth plumbing, the
//! wasm32 REST client, and an in-memory stand-in for native runs and tests.

pub mod auth;
pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod rest;
pub mod types;

pub use memory::MemoryLedger;
#[cfg(target_arch = "wasm32")]
pub use rest::RestClient;
pub use types::{AuthProvider, BackendError, ScoreRow, Session, UserId, UserProfile};
