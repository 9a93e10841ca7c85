//! Shared types for the hosted-backend collaborators

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque user identity, the key for every durable row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallback display name when the user directory has no row for this id
    pub fn placeholder_name(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("Player {prefix}")
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// OAuth providers offered on the login surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Discord,
    Google,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthProvider::Discord => "discord",
            AuthProvider::Google => "google",
        }
    }
}

/// Authenticated identity for the current browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
}

impl Session {
    /// Name shown in the HUD; falls back to a generic label like the original UI
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Player")
    }

    /// Directory row to upsert after a successful sign-in
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id.clone(),
            name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// One row of the `users` directory table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// One row of a top-N ledger read, timestamps already resolved to epoch ms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub user_id: UserId,
    pub score: u64,
    /// When the row last changed; drives the activity display
    pub changed_at_ms: f64,
}

/// Failure taxonomy for collaborator calls.
///
/// None of these are fatal: every call site degrades to a safe default
/// (zero score, empty leaderboard, skipped refresh) and logs.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http status {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_name_truncates_id() {
        let id = UserId("a1b2c3d4e5f6".into());
        assert_eq!(id.placeholder_name(), "Player a1b2c3d4");
    }

    #[test]
    fn test_placeholder_name_short_id() {
        let id = UserId("ab".into());
        assert_eq!(id.placeholder_name(), "Player ab");
    }

    #[test]
    fn test_session_name_fallback() {
        let session = Session {
            user_id: UserId("u1".into()),
            display_name: None,
            avatar_url: None,
            access_token: "t".into(),
        };
        assert_eq!(session.name(), "Player");
    }
}
