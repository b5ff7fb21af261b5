use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginCredentials, RegisterData, User};
use crate::validation::{require_email, require_min_len, require_non_empty};

const SESSION_FILE: &str = "session.json";
const PASSWORD_MIN_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Snapshot of the auth state, published through a watch channel so UI
/// layers can react to login/logout without polling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// Persisted session (token + user, like the web client's local storage)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    user: User,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Owns login/register/logout and the persisted session file.
///
/// On success the token is installed on the shared [`ApiClient`] so every
/// other store's calls are authenticated; on logout it is cleared again.
pub struct SessionStore {
    api: Arc<ApiClient>,
    session_path: PathBuf,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, config: &ApiConfig) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            session_path: config.storage_dir.join(SESSION_FILE),
            state,
        }
    }

    /// Subscribe to auth state changes. The receiver always holds the
    /// latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    // --------------------------------------------------------------------
    // Login / register / logout
    // --------------------------------------------------------------------

    /// Validate credentials locally, then `POST /auth/login`. On success the
    /// session is persisted and the bearer token installed.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, AppError> {
        require_email("email", &credentials.email)?;
        require_min_len("password", &credentials.password, PASSWORD_MIN_LEN)?;

        let resp = self.api.login(credentials).await?;
        tracing::info!(user = %resp.user.email, "Logged in");
        self.install(resp)
    }

    /// Validate the registration form locally, then `POST /auth/register`.
    /// The backend responds like login, so the new account is signed in
    /// immediately.
    pub async fn register(&self, data: &RegisterData) -> Result<User, AppError> {
        require_non_empty("name", &data.name)?;
        require_email("email", &data.email)?;
        require_min_len("password", &data.password, PASSWORD_MIN_LEN)?;

        let resp = self.api.register(data).await?;
        tracing::info!(user = %resp.user.email, "Registered");
        self.install(resp)
    }

    /// Clear the persisted session and reset in-memory state. Never fails:
    /// a missing session file just means there was nothing to clear.
    pub fn logout(&self) {
        if let Err(e) = std::fs::remove_file(&self.session_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "Failed to remove session file");
            }
        }
        self.api.clear_token();
        self.state.send_replace(SessionState::default());
        tracing::info!("Logged out, session cleared");
    }

    // --------------------------------------------------------------------
    // Session restore on startup
    // --------------------------------------------------------------------

    /// Attempt to restore a previous session from disk. Called once at
    /// startup; a missing or unreadable file leaves the store signed out.
    pub fn try_restore(&self) -> bool {
        let json = match std::fs::read_to_string(&self.session_path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No stored session, starting unauthenticated");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session file");
                return false;
            }
        };

        let session: PersistedSession = match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Stored session is corrupt, discarding");
                let _ = std::fs::remove_file(&self.session_path);
                return false;
            }
        };

        self.api.set_token(&session.token);
        self.state.send_replace(SessionState {
            is_authenticated: true,
            user: Some(session.user),
        });
        tracing::info!("Session restored");
        true
    }

    // --------------------------------------------------------------------
    // Internal
    // --------------------------------------------------------------------

    fn install(&self, resp: AuthResponse) -> Result<User, AppError> {
        self.persist(&resp)?;
        self.api.set_token(&resp.token);
        self.state.send_replace(SessionState {
            is_authenticated: true,
            user: Some(resp.user.clone()),
        });
        Ok(resp.user)
    }

    fn persist(&self, resp: &AuthResponse) -> Result<(), AppError> {
        if let Some(dir) = self.session_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let session = PersistedSession {
            token: resp.token.clone(),
            user: resp.user.clone(),
        };
        std::fs::write(&self.session_path, serde_json::to_string_pretty(&session)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path) -> SessionStore {
        let config = ApiConfig::default().with_storage_dir(dir.to_path_buf());
        let api = Arc::new(ApiClient::new(&config));
        SessionStore::new(api, &config)
    }

    fn sample_session() -> AuthResponse {
        AuthResponse {
            token: "tok-1".into(),
            user: User {
                id: "u1".into(),
                name: "Dana".into(),
                email: "dana@example.com".into(),
                role: None,
            },
        }
    }

    #[test]
    fn test_restore_without_file_stays_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.try_restore());
        assert!(!store.is_logged_in());
    }

    #[test]
    fn test_install_then_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.install(sample_session()).unwrap();
        assert!(store.is_logged_in());

        // A fresh store over the same dir picks the session up from disk.
        let fresh = store_in(dir.path());
        assert!(fresh.try_restore());
        assert_eq!(fresh.current_user().unwrap().id, "u1");
    }

    #[test]
    fn test_logout_removes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.install(sample_session()).unwrap();
        store.logout();
        assert!(!store.is_logged_in());

        let fresh = store_in(dir.path());
        assert!(!fresh.try_restore());
    }

    #[test]
    fn test_corrupt_session_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let store = store_in(dir.path());
        assert!(!store.try_restore());
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_subscribe_sees_state_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let rx = store.subscribe();
        assert!(!rx.borrow().is_authenticated);

        store.install(sample_session()).unwrap();
        assert!(rx.borrow().is_authenticated);
        assert_eq!(rx.borrow().user.as_ref().unwrap().name, "Dana");
    }
}
