use eventos::config::{Config, DEFAULT_DATE_FORMAT, DEFAULT_LOCALE};
use eventos::firebase::{self, FirebaseOptions};
use eventos::navigation::Route;
use eventos::utils::time::DisplaySettings;
use std::io::Write;
use tempfile::NamedTempFile;

fn test_config() -> Config {
    Config::new(FirebaseOptions::new("test-key", "demo-project"))
}

/// Smoke test to verify that a default config is valid
#[test]
fn test_default_config_is_valid() {
    let config = test_config();

    assert!(config.validate().is_ok());
    assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    assert_eq!(config.locale, DEFAULT_LOCALE);
    assert!(config.is_component_enabled("auth_gate"));
    assert!(!config.is_component_enabled("unknown"));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let mut config = test_config();
    config.timezone = "Mars/Olympus".to_string();
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.date_format = "%Q".to_string();
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.firebase.api_key = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_components_file_overrides_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "auth_gate = false\nexperimental = true").unwrap();

    let mut config = test_config();
    config.merge_components_file(file.path()).unwrap();

    assert!(!config.is_component_enabled("auth_gate"));
    assert!(config.is_component_enabled("experimental"));
}

#[test]
fn test_missing_components_file_is_ignored() {
    let mut config = test_config();
    config
        .merge_components_file(std::path::Path::new("does/not/exist.toml"))
        .unwrap();
    assert!(config.is_component_enabled("auth_gate"));
}

#[test]
fn test_malformed_components_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "auth_gate = \"sometimes\"").unwrap();

    assert!(test_config().merge_components_file(file.path()).is_err());
}

#[test]
fn test_display_settings_follow_config() {
    let mut config = test_config();
    config.timezone = "America/Mexico_City".to_string();
    config.date_format = "%Y-%m-%d".to_string();

    let settings = DisplaySettings::from_config(&config).unwrap();
    assert_eq!(settings.timezone, chrono_tz::America::Mexico_City);
    assert_eq!(settings.date_format, "%Y-%m-%d");
}

/// The process-wide registry hands back the same app on every call
#[test]
fn test_global_initialize_app() {
    let options = FirebaseOptions::new("test-key", "demo-project");
    let first = firebase::initialize_app(options.clone()).unwrap();
    let second = firebase::initialize_app(options).unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(firebase::get_apps().len(), 1);
}

#[test]
fn test_route_paths_round_trip() {
    for route in [
        Route::Login,
        Route::Events,
        Route::EventDetail("abc".into()),
        Route::EditEvent("abc".into()),
    ] {
        assert_eq!(Route::parse(&route.path()), route);
    }
    assert_eq!(Route::parse("/(auth)/events"), Route::NotFound);
}
