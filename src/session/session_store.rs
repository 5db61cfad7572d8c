use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::navigator::Navigator;
use super::token::is_token_expired;
use crate::config::SessionConfig;
use crate::models::{LoginOutcome, LoginRequest, LoginResponse, SessionState};
use crate::storage::{Storage, ACCESS_TOKEN_KEY};
use crate::utils::value::str_field;

const NETWORK_ERROR: &str = "Network error. Please try again.";
const LOGIN_FAILED: &str = "Login failed";
const MISSING_TOKEN: &str = "Login failed: response did not contain an access token";

/// Anything that can hand out the bearer token for the next request.
pub trait TokenSource: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Single source of truth for "am I logged in".
///
/// Owned by the application root and shared by reference. Consumers observe
/// changes through `subscribe`. The token is the only part persisted.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    http: reqwest::Client,
    base_url: String,
    config: SessionConfig,
}

impl SessionStore {
    /// Creates a store in the initial loading state. Call `initialize` next.
    pub fn new(
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        http: reqwest::Client,
        base_url: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        SessionStore {
            state,
            storage,
            navigator,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Receiver that sees every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Restores the session from storage.
    ///
    /// A persisted token makes the store authenticated right away; the token
    /// is then checked for expiry and the session is dropped (with a redirect)
    /// if it cannot be trusted. Safe to call more than once.
    pub async fn initialize(&self) {
        match self.read_persisted_token().await {
            Some(token) => {
                debug!("Restoring session from persisted token");
                self.state.send_replace(SessionState::authenticated(token.clone()));
                self.validate_token(&token).await;
            }
            None => {
                debug!("No persisted token; starting anonymous");
                self.state.send_modify(|state| state.loading = false);
            }
        }
    }

    /// Whether a stored session survives a restart.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_durable()
    }

    /// Re-checks the held token and signs out if it has expired.
    /// Returns whether the session is still valid.
    pub async fn check_expiry(&self) -> bool {
        match self.token() {
            Some(token) => self.validate_token(&token).await,
            None => false,
        }
    }

    /// Exchanges credentials for a token at `POST /auth/login`.
    ///
    /// A failed attempt only clears `loading`. A session that was already
    /// signed in stays signed in with its previous token; call `logout` to
    /// drop it.
    pub async fn login(&self, credentials: &LoginRequest) -> LoginOutcome {
        self.state.send_modify(|state| state.loading = true);
        let url = format!("{}/auth/login", self.base_url);
        debug!(email = credentials.email.as_str(), "Logging in at {}", url);

        let response = match self.http.post(&url).json(credentials).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Login request failed: {}", e);
                return self.login_failed(NETWORK_ERROR);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read login response: {}", e);
                return self.login_failed(NETWORK_ERROR);
            }
        };

        if !status.is_success() {
            let message = login_error_message(&body);
            warn!(
                event_name = "session.login.rejected",
                event_domain = "session",
                status = status.as_u16(),
                "Login rejected: {}",
                message
            );
            return self.login_failed(message);
        }

        let token = match serde_json::from_str::<LoginResponse>(&body) {
            Ok(LoginResponse { access_token }) if !access_token.is_empty() => access_token,
            Ok(_) | Err(_) => {
                warn!(status = status.as_u16(), "Login response carried no access token");
                return self.login_failed(MISSING_TOKEN);
            }
        };

        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, &token).await {
            error!("Failed to persist access token: {}", e);
        } else if !self.is_persistent() {
            warn!("Session storage is not durable; the session ends with this process");
        }
        self.state.send_replace(SessionState::authenticated(token));
        info!(
            event_name = "session.login.succeeded",
            event_domain = "session",
            "Login succeeded"
        );
        LoginOutcome::succeeded()
    }

    /// Forgets the token everywhere and navigates to the login route.
    pub async fn logout(&self) {
        info!(
            event_name = "session.logout",
            event_domain = "session",
            "Logging out"
        );
        self.clear_session(&self.config.login_route).await;
    }

    /// Default JSON headers plus the bearer header when a token is held.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(value) = self.token().as_deref().and_then(bearer_value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn read_persisted_token(&self) -> Option<String> {
        match self.storage.get(ACCESS_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                error!("Failed to read persisted token: {}", e);
                None
            }
        }
    }

    async fn validate_token(&self, token: &str) -> bool {
        if !is_token_expired(token) {
            return true;
        }
        warn!(
            event_name = "session.token.expired",
            event_domain = "session",
            "Session token expired or unreadable; signing out"
        );
        self.clear_session(&self.config.expired_route).await;
        false
    }

    async fn clear_session(&self, route: &str) {
        if let Err(e) = self.storage.remove(ACCESS_TOKEN_KEY).await {
            error!("Failed to clear persisted token: {}", e);
        }
        self.state.send_replace(SessionState::anonymous());
        self.navigator.navigate(route);
    }

    fn login_failed(&self, message: impl Into<String>) -> LoginOutcome {
        self.state.send_modify(|state| state.loading = false);
        LoginOutcome::failed(message)
    }
}

impl TokenSource for SessionStore {
    fn current_token(&self) -> Option<String> {
        self.token()
    }
}

/// Stateless check of the persisted token, usable before any store exists.
pub async fn is_authenticated(storage: &dyn Storage) -> bool {
    match storage.get(ACCESS_TOKEN_KEY).await {
        Ok(Some(token)) if !token.is_empty() => !is_token_expired(&token),
        Ok(_) => false,
        Err(e) => {
            error!("Failed to read persisted token: {}", e);
            false
        }
    }
}

/// `Bearer <token>` as a header value, or `None` if the token holds
/// characters a header cannot carry.
pub(crate) fn bearer_value(token: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            warn!("Token contains characters not allowed in a header; sending without it");
            None
        }
    }
}

// The identity endpoint reports failures in `error`, sometimes in `message`.
fn login_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            str_field(&json, "error")
                .or_else(|| str_field(&json, "message"))
                .map(str::to_string)
        })
        .unwrap_or_else(|| LOGIN_FAILED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use mockito::Server;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn routes(&self) -> Vec<String> {
            self.routes.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    fn mint_token(expires_in: i64) -> String {
        let claims = json!({
            "sub": "guru@school.id",
            "exp": Utc::now().timestamp() + expires_in,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .expect("Failed to encode JWT")
    }

    fn build_store(
        storage: Arc<dyn Storage>,
        base_url: &str,
    ) -> (SessionStore, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = SessionStore::new(
            storage,
            navigator.clone(),
            reqwest::Client::new(),
            base_url,
            SessionConfig {
                login_route: "/login".to_string(),
                expired_route: "/expired".to_string(),
            },
        );
        (store, navigator)
    }

    #[tokio::test]
    async fn test_new_store_is_loading() {
        let (store, _) = build_store(Arc::new(MemoryStorage::new()), "http://unused");
        assert_eq!(store.state(), SessionState::initial());
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_anonymous() {
        let (store, navigator) = build_store(Arc::new(MemoryStorage::new()), "http://unused");
        store.initialize().await;
        assert_eq!(store.state(), SessionState::anonymous());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_with_valid_token_restores_session() {
        let token = mint_token(3600);
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &token));
        let (store, navigator) = build_store(storage.clone(), "http://unused");

        store.initialize().await;
        store.initialize().await;

        assert_eq!(store.state(), SessionState::authenticated(token.clone()));
        assert_eq!(store.current_token(), Some(token.clone()));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), Some(token));
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_with_expired_token_signs_out_once() {
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &mint_token(-60)));
        let (store, navigator) = build_store(storage.clone(), "http://unused");

        store.initialize().await;
        store.initialize().await;

        assert_eq!(store.state(), SessionState::anonymous());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(navigator.routes(), vec!["/expired"]);
    }

    #[tokio::test]
    async fn test_initialize_with_garbage_token_signs_out() {
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, "not-a-jwt"));
        let (store, navigator) = build_store(storage.clone(), "http://unused");
        store.initialize().await;
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(navigator.routes(), vec!["/expired"]);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let token = mint_token(3600);
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &token));
        let (store, _) = build_store(storage, "http://unused");
        let mut receiver = store.subscribe();

        store.initialize().await;
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_authenticated);

        store.logout().await;
        assert!(receiver.has_changed().unwrap());
        assert!(!receiver.borrow_and_update().is_authenticated);
    }

    #[tokio::test]
    async fn test_login_success_persists_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({
                "email": "guru@school.id",
                "password": "secret"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "abc.def.ghi"}"#)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let (store, _) = build_store(storage.clone(), &server.url());
        store.initialize().await;

        let outcome = store
            .login(&LoginRequest::new("guru@school.id", "secret"))
            .await;

        m.assert_async().await;
        assert_eq!(outcome, LoginOutcome::succeeded());
        assert_eq!(store.state(), SessionState::authenticated("abc.def.ghi"));
        assert_eq!(
            storage.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[tokio::test]
    async fn test_login_rejected_surfaces_server_error() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid credentials"}"#)
            .create_async()
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let (store, _) = build_store(storage.clone(), &server.url());
        store.initialize().await;

        let outcome = store.login(&LoginRequest::new("a@b.c", "wrong")).await;

        m.assert_async().await;
        assert_eq!(outcome, LoginOutcome::failed("invalid credentials"));
        assert_eq!(store.state(), SessionState::anonymous());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_existing_session() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"error": "invalid credentials"}"#)
            .create_async()
            .await;

        let token = mint_token(3600);
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &token));
        let (store, navigator) = build_store(storage.clone(), &server.url());
        store.initialize().await;

        let outcome = store.login(&LoginRequest::new("a@b.c", "wrong")).await;

        assert_eq!(outcome, LoginOutcome::failed("invalid credentials"));
        assert_eq!(store.state(), SessionState::authenticated(token.clone()));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), Some(token));
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_follows_storage() {
        let (store, _) = build_store(Arc::new(MemoryStorage::new()), "http://unused");
        assert!(!store.is_persistent());

        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(crate::storage::FileStorage::new(dir.path().join("s.json")));
        let (store, _) = build_store(file, "http://unused");
        assert!(store.is_persistent());
    }

    #[tokio::test]
    async fn test_login_rejected_without_usable_body_is_generic() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let (store, _) = build_store(Arc::new(MemoryStorage::new()), &server.url());
        let outcome = store.login(&LoginRequest::new("a@b.c", "pw")).await;
        assert_eq!(outcome.error.as_deref(), Some(LOGIN_FAILED));
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_login_success_without_token_fails() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"message": "welcome"}"#)
            .create_async()
            .await;

        let (store, _) = build_store(Arc::new(MemoryStorage::new()), &server.url());
        let outcome = store.login(&LoginRequest::new("a@b.c", "pw")).await;
        assert_eq!(outcome.error.as_deref(), Some(MISSING_TOKEN));
        assert!(!store.is_authenticated());
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        // Nothing listens on port 9 of localhost.
        let (store, _) = build_store(Arc::new(MemoryStorage::new()), "http://127.0.0.1:9");
        let outcome = store.login(&LoginRequest::new("a@b.c", "pw")).await;
        assert_eq!(outcome, LoginOutcome::failed(NETWORK_ERROR));
        assert!(!store.state().loading);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_is_repeatable() {
        let token = mint_token(3600);
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &token));
        let (store, navigator) = build_store(storage.clone(), "http://unused");
        store.initialize().await;

        store.logout().await;
        store.logout().await;

        assert_eq!(store.state(), SessionState::anonymous());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(navigator.routes(), vec!["/login", "/login"]);
    }

    #[tokio::test]
    async fn test_check_expiry() {
        let (store, _) = build_store(Arc::new(MemoryStorage::new()), "http://unused");
        store.initialize().await;
        assert!(!store.check_expiry().await);

        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &mint_token(3600)));
        let (store, navigator) = build_store(storage, "http://unused");
        store.initialize().await;
        assert!(store.check_expiry().await);
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_auth_headers() {
        let (store, _) = build_store(Arc::new(MemoryStorage::new()), "http://unused");
        store.initialize().await;
        let headers = store.auth_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());

        let token = mint_token(3600);
        let storage = Arc::new(MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &token));
        let (store, _) = build_store(storage, "http://unused");
        store.initialize().await;
        let headers = store.auth_headers();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            format!("Bearer {}", token)
        );
    }

    #[tokio::test]
    async fn test_stateless_is_authenticated() {
        assert!(!is_authenticated(&MemoryStorage::new()).await);
        assert!(is_authenticated(&MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &mint_token(60))).await);
        assert!(!is_authenticated(&MemoryStorage::with_entry(ACCESS_TOKEN_KEY, &mint_token(-60))).await);
        assert!(!is_authenticated(&MemoryStorage::with_entry(ACCESS_TOKEN_KEY, "abc.def.ghi")).await);
    }

    #[test]
    fn test_login_error_message_priority() {
        assert_eq!(login_error_message(r#"{"error":"e","message":"m"}"#), "e");
        assert_eq!(login_error_message(r#"{"message":"m"}"#), "m");
        assert_eq!(login_error_message(r#"{"detail":"d"}"#), LOGIN_FAILED);
        assert_eq!(login_error_message("<html>"), LOGIN_FAILED);
    }
}
