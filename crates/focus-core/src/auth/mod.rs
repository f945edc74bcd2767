//! Supabase auth client and the identity provider built on it.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{Identity, IdentityProvider};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= chrono::Utc::now().timestamp() + EXPIRY_SKEW_SECONDS
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.user.id.clone(), self.access_token.clone())
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Supabase auth is not configured for this profile.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Auth request rejected: {0}")]
    Rejected(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for crate::Error {
    fn from(error: AuthError) -> Self {
        Self::Remote(format!("identity provider: {error}"))
    }
}

/// Where a signed-in session is kept between runs (keychain, memory, ...)
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Load the stored session, refreshing it when it is about to expire.
    ///
    /// A refresh the API rejects with 400/401/403 clears the stored session
    /// (signed out). Any other failure, including a 5xx or a keychain write
    /// error, is returned and the stored session is kept for the next attempt.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error @ (AuthError::Rejected(_) | AuthError::InvalidConfiguration(_))) => {
                tracing::warn!("Persisted session is no longer valid: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                Err(error)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );

        let session = self.send_session_request(request, "Sign-in").await?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );

        let session = self.send_session_request(request, "Refresh").await?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        // An already-invalid token still counts as signed out.
        if !(response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED) {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()?;
        Ok(())
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send_session_request(
        &self,
        request: RequestBuilder,
        label: &str,
    ) -> AuthResult<AuthSession> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(status, &body);
            return Err(if is_session_rejection(status) {
                AuthError::Rejected(message)
            } else {
                AuthError::Api(message)
            });
        }

        let payload = response.json::<TokenResponse>().await?;
        payload.into_session().ok_or_else(|| {
            AuthError::Api(format!("{label} response did not include an active session"))
        })
    }
}

/// Identity provider backed by the persisted Supabase session
#[derive(Clone)]
pub struct SupabaseIdentityProvider<S: SessionPersistence> {
    client: SupabaseAuthClient<S>,
}

impl<S: SessionPersistence> SupabaseIdentityProvider<S> {
    pub const fn new(client: SupabaseAuthClient<S>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<S: SessionPersistence> IdentityProvider for SupabaseIdentityProvider<S> {
    async fn current_identity(&self) -> crate::Result<Option<Identity>> {
        let session = self.client.restore_session().await?;
        Ok(session.map(|session| session.identity()))
    }
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

/// Both values or neither; a half-configured profile is an error.
pub fn resolve_optional_supabase_config(
    url: Option<String>,
    anon_key: Option<String>,
) -> AuthResult<Option<(String, String)>> {
    let url = normalize_text_option(url);
    let anon_key = normalize_text_option(anon_key);

    match (url, anon_key) {
        (None, None) => Ok(None),
        (Some(url), Some(anon_key)) => Ok(Some((url, anon_key))),
        _ => Err(AuthError::NotConfigured),
    }
}

/// Credentials or refresh token refused, as opposed to the service failing.
fn is_session_rejection(status: StatusCode) -> bool {
    matches!(status.as_u16(), 400 | 401 | 403)
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

impl TokenResponse {
    fn into_session(self) -> Option<AuthSession> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| chrono::Utc::now().timestamp().saturating_add(expires_in))
        })?;

        Some(AuthSession {
            access_token: self.access_token?,
            refresh_token: self.refresh_token?,
            expires_at,
            user: self.user?.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

impl From<TokenUser> for AuthUser {
    fn from(value: TokenUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<AuthErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Clone, Default)]
    struct MemorySessions(Arc<Mutex<Option<AuthSession>>>);

    impl SessionPersistence for MemorySessions {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.0.lock().unwrap() = Some(session.clone());
            Ok(())
        }

        fn clear_session(&self) -> AuthResult<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("user@example.com".to_string()),
            },
        }
    }

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn normalize_auth_url_keeps_existing_auth_path() {
        let normalized = normalize_auth_url("https://demo.supabase.co/auth/v1/").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/auth/v1");
        assert!(normalize_auth_url("demo.supabase.co").is_err());
    }

    #[test]
    fn half_configured_profile_is_rejected() {
        assert!(resolve_optional_supabase_config(None, None).unwrap().is_none());
        assert!(matches!(
            resolve_optional_supabase_config(Some("https://x.supabase.co".to_string()), None),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(1_700_000_000));
        assert!(!rendered.contains("\"access\""));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn identity_provider_reports_signed_out_without_session() {
        let client =
            SupabaseAuthClient::new("https://demo.supabase.co", "anon", MemorySessions::default())
                .unwrap();
        let provider = SupabaseIdentityProvider::new(client);
        assert!(provider.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn identity_provider_uses_fresh_stored_session() {
        let store = MemorySessions::default();
        store
            .save_session(&session(chrono::Utc::now().timestamp() + 3600))
            .unwrap();
        let client = SupabaseAuthClient::new("https://demo.supabase.co", "anon", store).unwrap();

        let identity = SupabaseIdentityProvider::new(client)
            .current_identity()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.access_token, "access");
    }

    #[tokio::test]
    async fn expired_session_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600,
                "user": { "id": "user-1", "email": null }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySessions::default();
        store.save_session(&session(0)).unwrap();
        let client = SupabaseAuthClient::new(server.uri(), "anon", store.clone()).unwrap();

        let identity = SupabaseIdentityProvider::new(client)
            .current_identity()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.access_token, "new-access");
        assert_eq!(
            store.load_session().unwrap().unwrap().refresh_token,
            "new-refresh"
        );
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error_description": "Invalid Refresh Token" })),
            )
            .mount(&server)
            .await;

        let store = MemorySessions::default();
        store.save_session(&session(0)).unwrap();
        let client = SupabaseAuthClient::new(server.uri(), "anon", store.clone()).unwrap();

        let identity = SupabaseIdentityProvider::new(client)
            .current_identity()
            .await
            .unwrap();
        assert!(identity.is_none());
        assert!(store.load_session().unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_auth_service_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemorySessions::default();
        store.save_session(&session(0)).unwrap();
        let client = SupabaseAuthClient::new(server.uri(), "anon", store.clone()).unwrap();

        let error = SupabaseIdentityProvider::new(client)
            .current_identity()
            .await
            .unwrap_err();
        assert!(error.is_remote());
        assert!(!error.is_not_signed_in());
        assert_eq!(
            store.load_session().unwrap().unwrap().refresh_token,
            "refresh"
        );
    }

    #[derive(Clone)]
    struct ReadOnlySessions(MemorySessions);

    impl SessionPersistence for ReadOnlySessions {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            self.0.load_session()
        }

        fn save_session(&self, _session: &AuthSession) -> AuthResult<()> {
            Err(AuthError::SecureStorage("keychain locked".to_string()))
        }

        fn clear_session(&self) -> AuthResult<()> {
            self.0.clear_session()
        }
    }

    #[tokio::test]
    async fn keychain_failure_after_refresh_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600,
                "user": { "id": "user-1", "email": null }
            })))
            .mount(&server)
            .await;

        let inner = MemorySessions::default();
        inner.save_session(&session(0)).unwrap();
        let client =
            SupabaseAuthClient::new(server.uri(), "anon", ReadOnlySessions(inner.clone())).unwrap();

        let error = client.restore_session().await.unwrap_err();
        assert!(matches!(error, AuthError::SecureStorage(_)));
        assert!(inner.load_session().unwrap().is_some());
    }
}
