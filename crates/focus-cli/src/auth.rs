//! CLI Supabase auth/session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use focus_core::auth::{
    resolve_optional_supabase_config, AuthResult, SessionPersistence, SupabaseAuthClient,
    SupabaseIdentityProvider,
};
pub use focus_core::auth::{AuthError, AuthSession};
use focus_core::IdentityProvider;

use crate::config_profiles::CliProfile;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "focus-cli";

#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<SessionStore>,
}

impl SupabaseAuthService {
    pub fn new_for_profile(profile_name: &str, profile: &CliProfile) -> AuthResult<Option<Self>> {
        let Some((url, anon_key)) =
            resolve_optional_supabase_config(profile.supabase_url(), profile.supabase_anon_key())?
        else {
            return Ok(None);
        };

        Ok(Some(Self::new(profile_name, &url, &anon_key)?))
    }

    pub fn new(
        profile_name: &str,
        url: impl AsRef<str>,
        anon_key: impl AsRef<str>,
    ) -> AuthResult<Self> {
        Ok(Self {
            inner: SupabaseAuthClient::new(
                url,
                anon_key.as_ref().to_string(),
                SessionStore::new(profile_name),
            )?,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }

    /// Identity for reconciliation, backed by this profile's stored session.
    pub fn identity_provider(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(SupabaseIdentityProvider::new(self.inner.clone()))
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use focus_core::auth::AuthUser;

    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn stored_session_is_scoped_by_profile() {
        SessionStore::new("auth-test-work")
            .save_session(&session(1_700_000_000))
            .unwrap();

        assert!(load_stored_session("auth-test-work").unwrap().is_some());
        assert!(load_stored_session("auth-test-home").unwrap().is_none());

        clear_stored_session("auth-test-work").unwrap();
        assert!(load_stored_session("auth-test-work").unwrap().is_none());
    }

    #[test]
    fn profile_without_supabase_has_no_auth_service() {
        let service = SupabaseAuthService::new_for_profile("auth-test-empty", &CliProfile::default());
        assert!(service.unwrap().is_none());
    }

    #[tokio::test]
    async fn identity_provider_reads_profile_session() {
        SessionStore::new("auth-test-identity")
            .save_session(&session(chrono::Utc::now().timestamp() + 3600))
            .unwrap();
        let service =
            SupabaseAuthService::new("auth-test-identity", "https://demo.supabase.co", "anon")
                .unwrap();

        let identity = service
            .identity_provider()
            .current_identity()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.user_id, "user-1");
    }
}
