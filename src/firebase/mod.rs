//! Firebase client handles: the app registry plus the auth and Firestore
//! REST clients derived from each app.

pub mod auth;
pub mod firestore;
pub mod value;

pub use auth::{AuthProvider, AuthSubscription, FirebaseAuth, User};
pub use firestore::{Document, DocumentStore, Firestore};

use crate::error::AppResult;
use lazy_static::lazy_static;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Name used when an app is initialized without an explicit name
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// REST endpoints of the hosted services. Overridable for emulators and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
    pub firestore: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity_toolkit: "https://identitytoolkit.googleapis.com".to_string(),
            secure_token: "https://securetoken.googleapis.com".to_string(),
            firestore: "https://firestore.googleapis.com".to_string(),
        }
    }
}

/// Project settings for one Firebase app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirebaseOptions {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl FirebaseOptions {
    /// Options with only the required project settings
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_domain: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
            measurement_id: None,
            endpoints: Endpoints::default(),
        }
    }

    /// Point every service at the same base URL (emulator or mock server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        self.endpoints = Endpoints {
            identity_toolkit: base_url.clone(),
            secure_token: base_url.clone(),
            firestore: base_url,
        };
        self
    }
}

/// An initialized app and the service handles derived from it
pub struct FirebaseApp {
    name: String,
    options: FirebaseOptions,
    auth: Arc<FirebaseAuth>,
    firestore: Arc<Firestore>,
}

impl std::fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("name", &self.name)
            .field("project_id", &self.options.project_id)
            .finish()
    }
}

impl FirebaseApp {
    fn new(name: &str, options: FirebaseOptions) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("eventos/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let auth = Arc::new(FirebaseAuth::new(options.clone(), client.clone()));
        let firestore = Arc::new(Firestore::new(options.clone(), client, Arc::clone(&auth)));

        Ok(Self {
            name: name.to_string(),
            options,
            auth,
            firestore,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FirebaseOptions {
        &self.options
    }

    /// Auth handle of this app
    pub fn auth(&self) -> Arc<FirebaseAuth> {
        Arc::clone(&self.auth)
    }

    /// Document store handle of this app
    pub fn firestore(&self) -> Arc<Firestore> {
        Arc::clone(&self.firestore)
    }
}

/// Registry of initialized apps. Initialization is idempotent per app name.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: Mutex<Vec<Arc<FirebaseApp>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the default app, or return it if it already exists
    pub fn initialize_app(&self, options: FirebaseOptions) -> AppResult<Arc<FirebaseApp>> {
        self.initialize_named_app(DEFAULT_APP_NAME, options)
    }

    /// Initialize an app under `name`, or return the one already registered
    pub fn initialize_named_app(
        &self,
        name: &str,
        options: FirebaseOptions,
    ) -> AppResult<Arc<FirebaseApp>> {
        let mut apps = self.apps.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = apps.iter().find(|app| app.name == name) {
            if existing.options != options {
                warn!(
                    "Firebase app {} already initialized with different options, keeping the existing one",
                    name
                );
            } else {
                debug!("Firebase app {} already initialized, reusing it", name);
            }
            return Ok(Arc::clone(existing));
        }

        let app = Arc::new(FirebaseApp::new(name, options)?);
        info!(
            "Initialized Firebase app {} for project {}",
            name, app.options.project_id
        );
        apps.push(Arc::clone(&app));

        Ok(app)
    }

    /// Get an app by name
    pub fn get_app(&self, name: &str) -> Option<Arc<FirebaseApp>> {
        let apps = self.apps.lock().unwrap_or_else(|e| e.into_inner());
        apps.iter().find(|app| app.name == name).cloned()
    }

    /// All initialized apps, in initialization order
    pub fn get_apps(&self) -> Vec<Arc<FirebaseApp>> {
        self.apps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

lazy_static! {
    static ref REGISTRY: AppRegistry = AppRegistry::new();
}

/// Initialize the process-wide default app (idempotent)
pub fn initialize_app(options: FirebaseOptions) -> AppResult<Arc<FirebaseApp>> {
    REGISTRY.initialize_app(options)
}

/// Apps registered in the process-wide registry
pub fn get_apps() -> Vec<Arc<FirebaseApp>> {
    REGISTRY.get_apps()
}

/// Best-effort description of a failed REST response
pub(crate) async fn describe_error(response: Response) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Body,
    }

    #[derive(Deserialize)]
    struct Body {
        message: String,
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => format!("HTTP {} - {}", status, envelope.error.message),
        Err(_) if body.is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {} - {}", status, body),
    }
}
