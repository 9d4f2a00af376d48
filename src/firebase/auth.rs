use super::{describe_error, FirebaseOptions};
use crate::error::{auth_error, config_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Seconds before expiry at which an ID token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Signed-in user as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Auth state as published to listeners. Nothing is delivered until resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unresolved,
    Resolved(Option<User>),
}

/// Callback invoked with the current user on every auth state change
pub type AuthListener = Arc<dyn Fn(Option<User>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into an [`AuthListener`]
pub fn listener<F, Fut>(f: F) -> AuthListener
where
    F: Fn(Option<User>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |user| f(user).boxed())
}

/// Handle to an auth state subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl AuthSubscription {
    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Fan-out of auth state changes to subscribed listeners
#[derive(Debug)]
pub struct AuthStateNotifier {
    state: watch::Sender<AuthState>,
}

impl Default for AuthStateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateNotifier {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Unresolved);
        Self { state }
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.state.borrow() {
            AuthState::Resolved(user) => user.clone(),
            AuthState::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.borrow(), AuthState::Resolved(_))
    }

    /// Publish a resolved state. Listeners are only woken when it differs.
    pub fn publish(&self, user: Option<User>) {
        self.state.send_if_modified(|state| {
            let next = AuthState::Resolved(user);
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    /// Register a listener. The current state is delivered first once resolved.
    pub fn subscribe(&self, listener: AuthListener) -> AuthSubscription {
        let mut rx = self.state.subscribe();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            if let AuthState::Resolved(user) = initial {
                if cancelled.is_cancelled() {
                    return;
                }
                listener(user).await;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = rx.borrow_and_update().clone();
                        if let AuthState::Resolved(user) = state {
                            listener(user).await;
                        }
                    }
                }
            }

            debug!("Auth state listener stopped");
        });

        AuthSubscription { token, task }
    }
}

/// Source of the session user and its change notifications
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// User of the current session, if any
    fn current_user(&self) -> Option<User>;

    /// Subscribe to sign-in, sign-out and initial resolution
    fn on_auth_state_changed(&self, listener: AuthListener) -> AuthSubscription;

    /// ID token for authorizing backend requests, refreshed when close to expiry
    async fn id_token(&self) -> AppResult<Option<String>>;

    async fn sign_in_with_email_and_password(&self, email: &str, password: &str)
        -> AppResult<User>;

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<User>;

    async fn sign_out(&self) -> AppResult<()>;
}

#[derive(Debug, Clone)]
struct Session {
    user: User,
    id_token: String,
    refresh_token: String,
    expires_at: i64,
}

/// What is written to the session file
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: User,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Firebase Authentication over the Identity Toolkit REST API
pub struct FirebaseAuth {
    options: FirebaseOptions,
    client: Client,
    session: RwLock<Option<Session>>,
    persistence: RwLock<Option<PathBuf>>,
    notifier: AuthStateNotifier,
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("project_id", &self.options.project_id)
            .field("current_user", &self.notifier.current_user())
            .finish()
    }
}

impl FirebaseAuth {
    pub(crate) fn new(options: FirebaseOptions, client: Client) -> Self {
        Self {
            options,
            client,
            session: RwLock::new(None),
            persistence: RwLock::new(None),
            notifier: AuthStateNotifier::new(),
        }
    }

    /// Persist sessions to `path`, or keep them in memory only with `None`
    pub async fn set_persistence(&self, path: Option<PathBuf>) {
        *self.persistence.write().await = path;
    }

    /// Resolve the initial auth state from the persisted session, if any.
    /// Always leaves the state resolved, even when restoring fails.
    pub async fn restore_session(&self) -> AppResult<Option<User>> {
        let path = self.persistence.read().await.clone();
        let Some(path) = path else {
            self.notifier.publish(None);
            return Ok(None);
        };

        let persisted = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<PersistedSession>(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted session at {}", path.display());
                self.notifier.publish(None);
                return Ok(None);
            }
            Err(e) => {
                self.notifier.publish(None);
                return Err(e.into());
            }
        };

        let persisted = match persisted {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                self.notifier.publish(None);
                return Ok(None);
            }
        };

        match self.refresh(&persisted.refresh_token, persisted.user).await {
            Ok(session) => {
                let user = session.user.clone();
                info!("Restored session for user {}", user.uid);
                self.store_session(session).await;
                Ok(Some(user))
            }
            Err(e) => {
                warn!("Could not restore session: {}", e);
                remove_session_file(&path).await;
                self.notifier.publish(None);
                Ok(None)
            }
        }
    }

    fn identity_url(&self, method: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.options.endpoints.identity_toolkit)?;
        url.path_segments_mut()
            .map_err(|_| config_error("Identity Toolkit endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(["v1", method]);
        Ok(url)
    }

    fn token_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&self.options.endpoints.secure_token)?;
        url.path_segments_mut()
            .map_err(|_| config_error("Secure Token endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(["v1", "token"]);
        Ok(url)
    }

    async fn password_request(&self, method: &str, email: &str, password: &str) -> AppResult<User> {
        let url = self.identity_url(method)?;

        let response = self
            .client
            .post(url)
            .query(&[("key", self.options.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(&describe_error(response).await));
        }

        let body: SignInResponse = response.json().await?;
        let user = User {
            uid: body.local_id,
            email: body.email.filter(|e| !e.is_empty()),
            display_name: body.display_name.filter(|n| !n.is_empty()),
        };

        let session = Session {
            user: user.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        };
        self.store_session(session).await;

        Ok(user)
    }

    /// Exchange a refresh token for a fresh ID token
    async fn refresh(&self, refresh_token: &str, user: User) -> AppResult<Session> {
        let url = self.token_url()?;

        let response = self
            .client
            .post(url)
            .query(&[("key", self.options.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(&format!(
                "Failed to refresh token: {}",
                describe_error(response).await
            )));
        }

        let body: RefreshResponse = response.json().await?;

        Ok(Session {
            user,
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        })
    }

    async fn store_session(&self, session: Session) {
        let user = session.user.clone();

        if let Some(path) = self.persistence.read().await.as_ref() {
            let persisted = PersistedSession {
                user: user.clone(),
                refresh_token: session.refresh_token.clone(),
            };
            if let Err(e) = write_session_file(path, &persisted).await {
                warn!("Failed to persist session to {}: {}", path.display(), e);
            }
        }

        *self.session.write().await = Some(session);
        self.notifier.publish(Some(user));
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    fn current_user(&self) -> Option<User> {
        self.notifier.current_user()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> AuthSubscription {
        self.notifier.subscribe(listener)
    }

    async fn id_token(&self) -> AppResult<Option<String>> {
        let session = self.session.read().await.clone();
        let Some(session) = session else {
            return Ok(None);
        };

        if session.expires_at - Utc::now().timestamp() > TOKEN_REFRESH_MARGIN_SECS {
            return Ok(Some(session.id_token));
        }

        debug!("ID token for {} is about to expire, refreshing", session.user.uid);
        let refreshed = self.refresh(&session.refresh_token, session.user).await?;
        let token = refreshed.id_token.clone();
        self.store_session(refreshed).await;

        Ok(Some(token))
    }

    async fn sign_in_with_email_and_password(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .password_request("accounts:signInWithPassword", email, password)
            .await?;
        info!("Signed in as {}", user.uid);
        Ok(user)
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<User> {
        let user = self.password_request("accounts:signUp", email, password).await?;
        info!("Created account {}", user.uid);
        Ok(user)
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.session.write().await = None;

        if let Some(path) = self.persistence.read().await.as_ref() {
            remove_session_file(path).await;
        }

        self.notifier.publish(None);
        info!("Signed out");
        Ok(())
    }
}

/// Token lifetime assumed when the server's `expiresIn` is unreadable
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

fn expiry_from(expires_in: &str) -> i64 {
    let secs = expires_in.parse::<i64>().unwrap_or_else(|e| {
        warn!(
            "Unreadable token lifetime {:?} ({}), assuming {}s",
            expires_in, e, DEFAULT_TOKEN_LIFETIME_SECS
        );
        DEFAULT_TOKEN_LIFETIME_SECS
    });
    Utc::now().timestamp() + secs
}

async fn write_session_file(path: &Path, session: &PersistedSession) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(session)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

async fn remove_session_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove session file {}: {}", path.display(), e),
    }
}
