use shared_types::{AppConfig, FeatureFlags, RoleLookup, RolesConfig};
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the working directory.
const CONFIG_PATH: &str = "config.toml";

/// Read `config.toml` and store the parsed configuration in the global
/// `OnceLock`. Safe to call multiple times — only the first call has effect.
///
/// If the file is missing or unparseable, everything defaults.
pub fn load_config() {
    CONFIG.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            eprintln!("[config] Failed to parse {CONFIG_PATH}: {e} — using defaults");
            AppConfig::default()
        }),
        Err(e) => {
            eprintln!("[config] {CONFIG_PATH} not found ({e}) — using defaults");
            AppConfig::default()
        }
    });
}

/// Get the loaded configuration. Returns defaults if `load_config()`
/// hasn't been called yet (safe fallback).
pub fn app_config() -> &'static AppConfig {
    static DEFAULT: AppConfig = AppConfig {
        features: FeatureFlags { docs: false },
        roles: RolesConfig {
            lookup: RoleLookup::Id,
        },
    };
    CONFIG.get().unwrap_or(&DEFAULT)
}
