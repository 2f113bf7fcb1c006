//! HTTP client for the hosted backend (PostgREST data API + auth API).
//!
//! Every request carries the project's anon key; requests made while signed
//! in also carry the session's access token. A 401 triggers one token
//! refresh and one retry.

use super::{Filter, RemoteStore};
use crate::auth::{AuthEvent, Session, SessionUser};
use crate::config::SyncConfig;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use winshirt_model::Table;

/// State shared across client clones.
struct AuthState {
    session: Option<Session>,
    /// Bumped on every successful refresh; lets a waiter see that a
    /// concurrent refresh already rotated the tokens.
    refresh_generation: u64,
}

/// Client for the PostgREST data API and the auth API of the backend.
#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    anon_key: String,
    auth: Arc<RwLock<AuthState>>,
    /// Serializes refreshes: the server rotates the refresh token on use, so
    /// two concurrent refreshes with the same token would fail one of them.
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
    auth_events: broadcast::Sender<AuthEvent>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<TokenUser>,
    // Sign-up without auto-confirm returns the bare user object.
    id: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Option<Session> {
        let user = match self.user {
            Some(u) => SessionUser {
                id: u.id,
                email: u.email,
            },
            None => SessionUser {
                id: self.id?,
                email: self.email,
            },
        };
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| chrono::Utc::now().timestamp() + secs));
        Some(Session {
            access_token: self.access_token?,
            refresh_token: self.refresh_token?,
            expires_at,
            user,
        })
    }
}

impl PostgrestClient {
    pub fn new(config: &SyncConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Connectivity(format!("failed to build HTTP client: {e}")))?;
        let (auth_events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            base_url: config.remote_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            auth: Arc::new(RwLock::new(AuthState {
                session: None,
                refresh_generation: 0,
            })),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
            auth_events,
        })
    }

    // ── Auth ──

    /// Subscribes to sign-in, refresh and sign-out events.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_events.subscribe()
    }

    pub async fn get_session(&self) -> Option<Session> {
        self.auth.read().await.session.clone()
    }

    /// Restores a saved session without contacting the server.
    pub async fn set_session(&self, session: Session) {
        self.auth.write().await.session = Some(session);
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        // Wrong credentials come back as 400 invalid_grant.
        let resp = check(resp).await.map_err(|e| match e {
            RemoteError::Api {
                status: 400, message, ..
            } => RemoteError::Auth(message),
            other => other,
        })?;

        let session = resp
            .json::<TokenResponse>()
            .await?
            .into_session()
            .ok_or_else(|| RemoteError::Auth("sign-in response carried no session".to_string()))?;

        self.auth.write().await.session = Some(session.clone());
        let _ = self.auth_events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Registers a new account. Returns `None` when the backend requires
    /// email confirmation before issuing a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> RemoteResult<Option<Session>> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = check(resp).await?;

        let session = resp.json::<TokenResponse>().await?.into_session();
        if let Some(session) = &session {
            self.auth.write().await.session = Some(session.clone());
            let _ = self.auth_events.send(AuthEvent::SignedIn(session.clone()));
        } else {
            debug!("sign-up for {email} pending confirmation");
        }
        Ok(session)
    }

    /// Ends the session. Local state is cleared even if the server call fails.
    pub async fn sign_out(&self) -> RemoteResult<()> {
        let session = self.auth.write().await.session.take();
        let Some(session) = session else {
            return Ok(());
        };
        let _ = self.auth_events.send(AuthEvent::SignedOut);

        let url = format!("{}/auth/v1/logout", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn refresh_session(&self) -> RemoteResult<Session> {
        let seen = self.auth.read().await.refresh_generation;
        self.refresh_after(seen).await
    }

    /// Refreshes unless the tokens were already rotated past generation
    /// `seen`, in which case the newer session is returned as is.
    async fn refresh_after(&self, seen: u64) -> RemoteResult<Session> {
        let _guard = self.refresh_lock.lock().await;

        {
            let auth = self.auth.read().await;
            if auth.refresh_generation > seen {
                return auth
                    .session
                    .clone()
                    .ok_or_else(|| RemoteError::Auth("not signed in".to_string()));
            }
        }

        let refresh_token = self
            .auth
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(|| RemoteError::Auth("not signed in".to_string()))?;

        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if matches!(resp.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            // Refresh token expired or revoked.
            self.auth.write().await.session = None;
            let _ = self.auth_events.send(AuthEvent::SignedOut);
            return Err(RemoteError::Auth(
                "session expired, sign in again".to_string(),
            ));
        }
        let resp = check(resp).await?;
        let session = resp
            .json::<TokenResponse>()
            .await?
            .into_session()
            .ok_or_else(|| RemoteError::Auth("refresh response carried no session".to_string()))?;

        {
            let mut auth = self.auth.write().await;
            auth.session = Some(session.clone());
            auth.refresh_generation += 1;
        }
        let _ = self.auth_events.send(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    // ── Requests ──

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    /// Token to send, whether it belongs to a session, and the refresh
    /// generation it came from.
    async fn bearer(&self) -> (String, bool, u64) {
        let auth = self.auth.read().await;
        match &auth.session {
            Some(session) => (session.access_token.clone(), true, auth.refresh_generation),
            None => (self.anon_key.clone(), false, auth.refresh_generation),
        }
    }

    /// Sends a request built by `build`, retrying once after a token refresh
    /// if the server answers 401 to a signed-in request.
    async fn send<F>(&self, build: F) -> RemoteResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let (token, signed_in, generation) = self.bearer().await;
        let resp = build(&token).send().await?;

        if resp.status() == StatusCode::UNAUTHORIZED && signed_in {
            debug!("401 from remote store, refreshing session");
            let session = self.refresh_after(generation).await?;
            return Ok(build(&session.access_token).send().await?);
        }
        Ok(resp)
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }
}

/// Passes successful responses through and turns the rest into errors.
async fn check(resp: Response) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::from_response(status.as_u16(), &body))
}

/// Union of the keys of every row, in first-seen order.
///
/// Bulk inserts require every object to carry the same keys unless the
/// column set is named explicitly; rows missing a column get its default.
fn column_list(rows: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().filter_map(Value::as_object).flat_map(|row| row.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns.join(",")
}

/// Parses the total out of a `Content-Range` header (`0-24/25`, `*/0`).
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RemoteStore for PostgrestClient {
    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Value>> {
        let url = self.rest_url(table.name());
        let resp = self
            .send(|token| self.request(Method::GET, &url, token).query(&[("select", "*")]))
            .await?;
        let rows = check(resp).await?.json::<Vec<Value>>().await?;
        debug!("selected {} rows from {table}", rows.len());
        Ok(rows)
    }

    async fn upsert_batch(&self, table: Table, rows: &[Value], conflict_key: &str) -> RemoteResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let url = self.rest_url(table.name());
        let columns = column_list(rows);
        let resp = self
            .send(|token| {
                self.request(Method::POST, &url, token)
                    .query(&[("on_conflict", conflict_key), ("columns", columns.as_str())])
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(rows)
            })
            .await?;
        check(resp).await?;
        debug!("upserted {} rows into {table}", rows.len());
        Ok(rows.len())
    }

    async fn delete_where(&self, table: Table, filter: &Filter) -> RemoteResult<()> {
        let url = self.rest_url(table.name());
        let predicate = format!("eq.{}", filter.value_text());
        let resp = self
            .send(|token| {
                self.request(Method::DELETE, &url, token)
                    .query(&[(filter.column.as_str(), predicate.as_str())])
            })
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn count(&self, table: Table) -> RemoteResult<u64> {
        let url = self.rest_url(table.name());
        let resp = self
            .send(|token| {
                self.request(Method::HEAD, &url, token)
                    .query(&[("select", "*")])
                    .header("Prefer", "count=exact")
            })
            .await?;
        let resp = check(resp).await?;
        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| RemoteError::Api {
                status: resp.status().as_u16(),
                code: None,
                message: format!("count for {table} returned no Content-Range total"),
            })
    }

    async fn probe_table(&self, table: Table) -> RemoteResult<()> {
        let url = self.rest_url(table.name());
        let resp = self
            .send(|token| {
                self.request(Method::GET, &url, token)
                    .query(&[("select", "*"), ("limit", "1")])
            })
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, payload: &Value) -> RemoteResult<Value> {
        let url = self.rest_url(&format!("rpc/{function}"));
        let resp = self
            .send(|token| self.request(Method::POST, &url, token).json(payload))
            .await?;
        let text = check(resp).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
