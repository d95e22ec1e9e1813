//! Service configuration.

use std::path::Path;
use std::str::FromStr;

use secrecy::SecretString;
use serde::Deserialize;

use chili_gemini::{DEFAULT_ASSISTANT_MODEL, DEFAULT_FORECAST_MODEL};

use crate::identity::{DEFAULT_IDENTITY_BASE_URL, DEFAULT_SECURE_TOKEN_BASE_URL};

/// Which customer store to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Cloud Firestore over REST.
    Firestore,
    /// In-process memory (development and tests).
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Customer store backend (default: Firestore).
    pub store_backend: StoreBackend,

    /// Firebase project ID (required for the Firestore backend).
    pub firebase_project_id: Option<String>,

    /// Firebase Web API key (required for sign-in).
    pub firebase_api_key: Option<SecretString>,

    /// Firestore REST base URL.
    pub firestore_base_url: String,

    /// Identity Toolkit base URL.
    pub identity_base_url: String,

    /// Secure Token base URL.
    pub secure_token_base_url: String,

    /// Gemini API key (required for forecasts and the assistant).
    pub gemini_api_key: Option<SecretString>,

    /// Gemini REST base URL.
    pub gemini_base_url: String,

    /// Model used for forecasts.
    pub forecast_model: String,

    /// Model used for the assistant.
    pub assistant_model: String,

    /// Seconds between background refreshes of a session's customers.
    pub sync_interval_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Also bounds outbound API calls.
    pub request_timeout_seconds: u64,
}

/// Firebase secrets file structure.
#[derive(Debug, Deserialize)]
struct FirebaseSecrets {
    project_id: String,
    api_key: String,
}

/// Gemini secrets file structure.
#[derive(Debug, Deserialize)]
struct GeminiSecrets {
    api_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Secrets files take precedence over environment variables
        let (firebase_project_id, firebase_api_key) = load_firebase_secrets();
        let gemini_api_key = load_gemini_secrets();

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to the Firestore backend");
                StoreBackend::Firestore
            }),
            Err(_) => defaults.store_backend,
        };

        Self {
            listen_addr: env_or("LISTEN_ADDR", defaults.listen_addr),
            store_backend,
            firebase_project_id,
            firebase_api_key,
            firestore_base_url: env_or("FIRESTORE_BASE_URL", defaults.firestore_base_url),
            identity_base_url: env_or("IDENTITY_BASE_URL", defaults.identity_base_url),
            secure_token_base_url: env_or("SECURE_TOKEN_BASE_URL", defaults.secure_token_base_url),
            gemini_api_key,
            gemini_base_url: env_or("GEMINI_BASE_URL", defaults.gemini_base_url),
            forecast_model: env_or("FORECAST_MODEL", defaults.forecast_model),
            assistant_model: env_or("ASSISTANT_MODEL", defaults.assistant_model),
            sync_interval_seconds: env_parse("SYNC_INTERVAL_SECONDS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.sync_interval_seconds),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Load Firebase secrets from file or environment.
fn load_firebase_secrets() -> (Option<String>, Option<SecretString>) {
    let secret_paths = [".secrets/firebase.json", "../.secrets/firebase.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<FirebaseSecrets>(path) {
            tracing::info!(path = %path, "Loaded Firebase secrets from file");
            return (
                Some(secrets.project_id),
                Some(SecretString::from(secrets.api_key)),
            );
        }
    }

    tracing::debug!("Firebase secrets file not found, using environment variables");
    (
        std::env::var("FIREBASE_PROJECT_ID").ok(),
        std::env::var("FIREBASE_API_KEY").ok().map(SecretString::from),
    )
}

/// Load Gemini secrets from file or environment.
fn load_gemini_secrets() -> Option<SecretString> {
    let secret_paths = [".secrets/gemini.json", "../.secrets/gemini.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<GeminiSecrets>(path) {
            tracing::info!(path = %path, "Loaded Gemini secrets from file");
            return Some(SecretString::from(secrets.api_key));
        }
    }

    tracing::debug!("Gemini secrets file not found, using environment variables");
    std::env::var("GEMINI_API_KEY").ok().map(SecretString::from)
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            store_backend: StoreBackend::Firestore,
            firebase_project_id: None,
            firebase_api_key: None,
            firestore_base_url: chili_store::firestore::DEFAULT_BASE_URL.into(),
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.into(),
            secure_token_base_url: DEFAULT_SECURE_TOKEN_BASE_URL.into(),
            gemini_api_key: None,
            gemini_base_url: chili_gemini::DEFAULT_BASE_URL.into(),
            forecast_model: DEFAULT_FORECAST_MODEL.into(),
            assistant_model: DEFAULT_ASSISTANT_MODEL.into(),
            sync_interval_seconds: 5,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" firestore ".parse::<StoreBackend>(), Ok(StoreBackend::Firestore));
        assert!("rocksdb".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn defaults_point_at_google_endpoints() {
        let config = ServiceConfig::default();
        assert_eq!(config.forecast_model, "gemini-2.5-flash-lite");
        assert_eq!(config.assistant_model, "gemini-3.1-pro-preview");
        assert_eq!(config.sync_interval_seconds, 5);
        assert!(config.identity_base_url.starts_with("https://identitytoolkit.googleapis.com"));
    }
}
