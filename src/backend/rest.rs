//! Fetch-based client for the hosted backend (wasm32 only)
//!
//! Speaks the backend's REST dialect: `/auth/v1/user` for identity,
//! `/rest/v1/<table>` with query-string filters for rows. Upserts are
//! idempotent, keyed on the table's unique column via `on_conflict`.
//!
//! Every method returns `Result` and every caller degrades on `Err`;
//! nothing here is allowed to take the game loop down.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use serde::Deserialize;
use serde_json::json;

use super::auth::AuthUser;
use super::types::{BackendError, ScoreRow, Session, UserId, UserProfile};

/// Wire shape of a `scores` row
#[derive(Debug, Deserialize)]
struct WireScore {
    user_id: String,
    score: u64,
    #[serde(default)]
    created_at: Option<String>,
}

/// Wire shape of a `users` row
#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// REST client bound to one backend project and (optionally) one session
pub struct RestClient {
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    /// Attach the signed-in user's token so row-level security sees them
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, prefer: Option<&str>) -> Result<Headers, BackendError> {
        let headers = Headers::new().map_err(js_err)?;
        headers.set("apikey", &self.anon_key).map_err(js_err)?;
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        headers
            .set("Authorization", &format!("Bearer {bearer}"))
            .map_err(js_err)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_err)?;
        if let Some(prefer) = prefer {
            headers.set("Prefer", prefer).map_err(js_err)?;
        }
        Ok(headers)
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
        prefer: Option<&str>,
    ) -> Result<String, BackendError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        opts.set_headers(&self.headers(prefer)?);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(&body));
        }

        let url = format!("{}{}", self.base_url, path);
        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_err)?;
        let window = web_sys::window().ok_or_else(|| BackendError::Network("no window".into()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?;
        let response: Response = response.dyn_into().map_err(js_err)?;

        if !response.ok() {
            return Err(BackendError::Http {
                status: response.status(),
            });
        }

        let text = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        Ok(text.as_string().unwrap_or_default())
    }

    /// Resolve the signed-in user behind an access token
    pub async fn auth_user(&self, access_token: &str) -> Result<Session, BackendError> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);
        let headers = Headers::new().map_err(js_err)?;
        headers.set("apikey", &self.anon_key).map_err(js_err)?;
        headers
            .set("Authorization", &format!("Bearer {access_token}"))
            .map_err(js_err)?;
        opts.set_headers(&headers);

        let url = format!("{}/auth/v1/user", self.base_url);
        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_err)?;
        let window = web_sys::window().ok_or_else(|| BackendError::Network("no window".into()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?;
        let response: Response = response.dyn_into().map_err(js_err)?;
        if !response.ok() {
            return Err(BackendError::Http {
                status: response.status(),
            });
        }
        let text = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        let user: AuthUser = serde_json::from_str(&text.as_string().unwrap_or_default())?;
        Ok(user.into_session(access_token.to_owned()))
    }

    /// Read one user's cumulative score; `Ok(None)` when no row exists yet
    pub async fn get_score(&self, user: &UserId) -> Result<Option<u64>, BackendError> {
        let path = format!("/rest/v1/scores?user_id=eq.{}&select=score", user.as_str());
        let text = self.request("GET", &path, None, None).await?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&text)?;
        Ok(rows
            .first()
            .and_then(|row| row.get("score"))
            .and_then(|s| s.as_u64()))
    }

    /// Idempotent overwrite of a user's score row, keyed on user_id
    pub async fn upsert_score(&self, user: &UserId, score: u64) -> Result<(), BackendError> {
        let body = json!({ "user_id": user.as_str(), "score": score }).to_string();
        self.request(
            "POST",
            "/rest/v1/scores?on_conflict=user_id",
            Some(body),
            Some("resolution=merge-duplicates,return=minimal"),
        )
        .await?;
        Ok(())
    }

    /// Idempotent write of a directory row, called once per successful sign-in
    pub async fn upsert_user(&self, profile: &UserProfile) -> Result<(), BackendError> {
        let body = json!({
            "id": profile.id.as_str(),
            "name": profile.name,
            "avatar_url": profile.avatar_url,
        })
        .to_string();
        self.request(
            "POST",
            "/rest/v1/users?on_conflict=id",
            Some(body),
            Some("resolution=merge-duplicates,return=minimal"),
        )
        .await?;
        Ok(())
    }

    /// Top-N ledger read, ordered by score descending.
    ///
    /// Tie order among equal scores is whatever the backend returns; the
    /// differ never re-sorts.
    pub async fn top_scores(&self, n: usize) -> Result<Vec<ScoreRow>, BackendError> {
        let path = format!("/rest/v1/scores?select=*&order=score.desc&limit={n}");
        let text = self.request("GET", &path, None, None).await?;
        let rows: Vec<WireScore> = serde_json::from_str(&text)?;
        Ok(rows
            .into_iter()
            .map(|row| ScoreRow {
                user_id: UserId(row.user_id),
                score: row.score,
                changed_at_ms: row.created_at.as_deref().map(parse_ms).unwrap_or(0.0),
            })
            .collect())
    }

    /// Directory rows for a set of user ids (leaderboard name resolution)
    pub async fn profiles(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, BackendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids
            .iter()
            .map(UserId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/users?id=in.({list})&select=id,name,avatar_url");
        let text = self.request("GET", &path, None, None).await?;
        let rows: Vec<WireUser> = serde_json::from_str(&text)?;
        Ok(rows
            .into_iter()
            .map(|row| UserProfile {
                id: UserId(row.id),
                name: row.name,
                avatar_url: row.avatar_url,
            })
            .collect())
    }
}

/// Parse an ISO timestamp to epoch ms via the JS Date parser (0.0 on failure)
fn parse_ms(iso: &str) -> f64 {
    let ms = js_sys::Date::new(&JsValue::from_str(iso)).get_time();
    if ms.is_nan() { 0.0 } else { ms }
}

fn js_err(err: impl Into<JsValue>) -> BackendError {
    let value: JsValue = err.into();
    BackendError::Network(format!("{value:?}"))
}
