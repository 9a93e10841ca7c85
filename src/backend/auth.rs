//! OAuth sign-in plumbing and the LocalStorage session cache
//!
//! The OAuth flow itself is the provider's problem: we build the authorize
//! URL, the browser navigates away, and the provider redirects back with an
//! implicit-grant fragment (`#access_token=...`). The pure pieces (URL
//! construction, fragment parsing, auth-user mapping) are platform-free and
//! tested natively; only the storage cache touches the browser.

use serde::Deserialize;

use super::types::{AuthProvider, Session, UserId};

/// LocalStorage key for the cached session (used only in wasm32)
#[allow(dead_code)]
const SESSION_KEY: &str = "orb_rush_session";

/// Build the hosted auth endpoint's authorize URL for a provider
pub fn authorize_url(base_url: &str, provider: AuthProvider, redirect_to: &str) -> String {
    format!(
        "{}/auth/v1/authorize?provider={}&redirect_to={}",
        base_url.trim_end_matches('/'),
        provider.as_str(),
        redirect_to,
    )
}

/// Extract the access token from an implicit-grant redirect fragment.
///
/// Accepts the fragment with or without its leading `#`. Returns `None` for
/// fragments that do not carry a token (e.g. ordinary page loads).
pub fn parse_auth_fragment(fragment: &str) -> Option<String> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment
        .split('&')
        .find_map(|pair| pair.strip_prefix("access_token="))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Wire shape of the auth endpoint's `/auth/v1/user` response (subset)
#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub user_metadata: AuthUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthUserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    /// Map an auth user plus its token into a session.
    ///
    /// Display name prefers `full_name` over `name`, matching what the
    /// providers put in the metadata.
    pub fn into_session(self, access_token: String) -> Session {
        let AuthUserMetadata {
            full_name,
            name,
            avatar_url,
        } = self.user_metadata;
        Session {
            user_id: UserId(self.id),
            display_name: full_name.or(name),
            avatar_url,
            access_token,
        }
    }
}

/// Load the cached session from LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn load_session() -> Option<Session> {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()?;
    let json = storage.get_item(SESSION_KEY).ok()??;
    match serde_json::from_str::<Session>(&json) {
        Ok(session) => {
            log::info!("Restored session for {}", session.user_id);
            Some(session)
        }
        Err(err) => {
            log::warn!("Discarding unreadable cached session: {err}");
            let _ = storage.remove_item(SESSION_KEY);
            None
        }
    }
}

/// Save the session to LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn save_session(session: &Session) {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten();
    if let Some(storage) = storage {
        if let Ok(json) = serde_json::to_string(session) {
            let _ = storage.set_item(SESSION_KEY, &json);
            log::info!("Session cached for {}", session.user_id);
        }
    }
}

/// Clear the cached session (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn clear_session() {
    if let Some(storage) = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
    {
        let _ = storage.remove_item(SESSION_KEY);
        log::info!("Session cleared");
    }
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn load_session() -> Option<Session> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_session(_session: &Session) {
    // No-op for native
}

#[cfg(not(target_arch = "wasm32"))]
pub fn clear_session() {
    // No-op for native
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            "https://example.supabase.co/",
            AuthProvider::Discord,
            "https://game.example/play",
        );
        assert_eq!(
            url,
            "https://example.supabase.co/auth/v1/authorize?provider=discord&redirect_to=https://game.example/play"
        );
    }

    #[test]
    fn test_parse_fragment_with_token() {
        let token = parse_auth_fragment(
            "#access_token=abc123&expires_in=3600&refresh_token=r&token_type=bearer",
        );
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_fragment_without_hash() {
        let token = parse_auth_fragment("access_token=xyz&token_type=bearer");
        assert_eq!(token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_fragment_no_token() {
        assert!(parse_auth_fragment("#section-2").is_none());
        assert!(parse_auth_fragment("").is_none());
        assert!(parse_auth_fragment("#access_token=").is_none());
    }

    #[test]
    fn test_auth_user_name_preference() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"u1","user_metadata":{"full_name":"Ada L","name":"ada","avatar_url":null}}"#,
        )
        .unwrap();
        let session = user.into_session("tok".into());
        assert_eq!(session.display_name.as_deref(), Some("Ada L"));
        assert_eq!(session.user_id.as_str(), "u1");
        assert_eq!(session.access_token, "tok");
    }

    #[test]
    fn test_auth_user_missing_metadata() {
        let user: AuthUser = serde_json::from_str(r#"{"id":"u2"}"#).unwrap();
        let session = user.into_session("tok".into());
        assert!(session.display_name.is_none());
        assert!(session.avatar_url.is_none());
    }
}
