use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(eventos::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(eventos::config))]
    Config(String),

    #[error("Authentication error: {0}")]
    #[diagnostic(code(eventos::auth))]
    Auth(String),

    #[error("Firestore error: {0}")]
    #[diagnostic(code(eventos::firestore))]
    Firestore(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(eventos::http))]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(eventos::validation))]
    Validation(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(eventos::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(eventos::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(eventos::serialization))]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create Firestore errors
pub fn firestore_error(message: &str) -> Error {
    Error::Firestore(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}
