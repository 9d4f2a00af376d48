use crate::config::Config;
use crate::error::AppResult;
use crate::firebase::{AuthProvider, DocumentStore, FirebaseApp, User};
use crate::navigation::{Route, SharedNavigator};
use crate::utils::time::DisplaySettings;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a screen or component needs, passed explicitly instead of
/// reaching for process globals
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RwLock<Config>>,
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub navigator: SharedNavigator,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("session_user", &self.auth.current_user())
            .finish()
    }
}

impl AppContext {
    pub fn new(
        config: Arc<RwLock<Config>>,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        navigator: SharedNavigator,
    ) -> Self {
        Self {
            config,
            auth,
            store,
            navigator,
        }
    }

    /// Context backed by the handles of an initialized Firebase app
    pub fn from_app(
        config: Arc<RwLock<Config>>,
        app: &FirebaseApp,
        navigator: SharedNavigator,
    ) -> Self {
        Self::new(config, app.auth(), app.firestore(), navigator)
    }

    pub fn session_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    pub fn session_uid(&self) -> Option<String> {
        self.session_user().map(|user| user.uid)
    }

    pub async fn current_route(&self) -> Route {
        self.navigator.read().await.current().clone()
    }

    pub async fn display_settings(&self) -> AppResult<DisplaySettings> {
        let config = self.config.read().await;
        DisplaySettings::from_config(&config)
    }
}
