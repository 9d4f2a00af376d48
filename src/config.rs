use crate::error::{config_error, env_error, AppResult};
use crate::firebase::{Endpoints, FirebaseOptions};
use crate::utils::time::check_date_format;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default date format used when rendering event dates
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default UI locale
pub const DEFAULT_LOCALE: &str = "es";

/// Where per-component enabled flags are read from
pub const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Firebase project settings and REST endpoints
    pub firebase: FirebaseOptions,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
    /// Timezone used to display event dates
    pub timezone: String,
    /// chrono format string for event dates
    pub date_format: String,
    /// UI locale
    pub locale: String,
    /// File used to persist the signed-in session between runs
    pub session_file: Option<PathBuf>,
}

impl Config {
    /// Build a configuration with defaults for everything but the Firebase project
    pub fn new(firebase: FirebaseOptions) -> Self {
        Self {
            firebase,
            components: default_components(),
            timezone: String::from("UTC"),
            date_format: String::from(DEFAULT_DATE_FORMAT),
            locale: String::from(DEFAULT_LOCALE),
            session_file: None,
        }
    }

    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let api_key = env::var("FIREBASE_API_KEY").map_err(|_| env_error("FIREBASE_API_KEY"))?;
        let project_id =
            env::var("FIREBASE_PROJECT_ID").map_err(|_| env_error("FIREBASE_PROJECT_ID"))?;

        let mut endpoints = Endpoints::default();
        if let Ok(url) = env::var("FIREBASE_AUTH_URL") {
            endpoints.identity_toolkit = url;
        }
        if let Ok(url) = env::var("FIREBASE_TOKEN_URL") {
            endpoints.secure_token = url;
        }
        if let Ok(url) = env::var("FIRESTORE_URL") {
            endpoints.firestore = url;
        }

        let firebase = FirebaseOptions {
            api_key,
            project_id,
            auth_domain: env::var("FIREBASE_AUTH_DOMAIN").ok(),
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET").ok(),
            messaging_sender_id: env::var("FIREBASE_MESSAGING_SENDER_ID").ok(),
            app_id: env::var("FIREBASE_APP_ID").ok(),
            measurement_id: env::var("FIREBASE_MEASUREMENT_ID").ok(),
            endpoints,
        };

        let mut config = Config::new(firebase);

        if let Ok(timezone) = env::var("EVENTOS_TIMEZONE") {
            config.timezone = timezone;
        }
        if let Ok(format) = env::var("EVENTOS_DATE_FORMAT") {
            config.date_format = format;
        }
        if let Ok(locale) = env::var("EVENTOS_LOCALE") {
            config.locale = locale;
        }
        config.session_file = env::var("EVENTOS_SESSION_FILE").ok().map(PathBuf::from);

        // Merge component flags from file over the defaults
        config.merge_components_file(Path::new(COMPONENTS_FILE))?;

        config.validate()?;
        Ok(config)
    }

    /// Merge component flags from a TOML file, if it exists
    pub fn merge_components_file(&mut self, path: &Path) -> AppResult<()> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
        for (key, value) in file_components {
            self.components.insert(key, value);
        }

        Ok(())
    }

    /// Check values that can only be verified after loading
    pub fn validate(&self) -> AppResult<()> {
        if self.firebase.api_key.trim().is_empty() {
            return Err(config_error("FIREBASE_API_KEY must not be empty"));
        }
        if self.firebase.project_id.trim().is_empty() {
            return Err(config_error("FIREBASE_PROJECT_ID must not be empty"));
        }
        self.tz()?;
        check_date_format(&self.date_format)?;
        Ok(())
    }

    /// Parsed display timezone
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}

fn default_components() -> HashMap<String, bool> {
    let mut components = HashMap::new();
    components.insert("auth_gate".to_string(), true);
    components
}
