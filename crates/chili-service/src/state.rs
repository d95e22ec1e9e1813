//! Application state.

use std::sync::Arc;
use std::time::Duration;

use chili_gemini::{Assistant, ForecastAdapter, GeminiClient};
use chili_store::Store;

use crate::config::ServiceConfig;
use crate::identity::IdentityClient;
use crate::session::SessionRegistry;
use crate::sync::SyncEngine;

/// Application state shared across handlers.
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Firebase Auth client (optional).
    pub identity: Option<Arc<IdentityClient>>,

    /// Forecast adapter (optional).
    pub forecaster: Option<ForecastAdapter>,

    /// Business assistant (optional).
    pub assistant: Option<Assistant>,

    /// Live sessions.
    pub sessions: SessionRegistry,

    /// Store access and background refresh for sessions.
    pub sync: SyncEngine,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_seconds);

        let identity = config.firebase_api_key.as_ref().and_then(|key| {
            match IdentityClient::new(
                &config.identity_base_url,
                &config.secure_token_base_url,
                key.clone(),
                timeout,
            ) {
                Ok(client) => {
                    tracing::info!(identity_url = %config.identity_base_url, "Firebase Auth enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Firebase Auth client");
                    None
                }
            }
        });

        if identity.is_none() {
            tracing::warn!("Firebase Auth not configured - sign-in will not be available");
        }

        let gemini = config.gemini_api_key.as_ref().and_then(|key| {
            match GeminiClient::new(&config.gemini_base_url, key.clone(), timeout) {
                Ok(client) => {
                    tracing::info!(
                        forecast_model = %config.forecast_model,
                        assistant_model = %config.assistant_model,
                        "Gemini integration enabled"
                    );
                    Some(client)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Gemini client");
                    None
                }
            }
        });

        if gemini.is_none() {
            tracing::warn!("Gemini not configured - predictions and the assistant will not be available");
        }

        let forecaster = gemini
            .clone()
            .map(|client| ForecastAdapter::new(client, &config.forecast_model));
        let assistant = gemini.map(|client| Assistant::new(client, &config.assistant_model));

        let sync = SyncEngine::new(
            store,
            identity.clone(),
            Duration::from_secs(config.sync_interval_seconds),
        );

        Self {
            config,
            identity,
            forecaster,
            assistant,
            sessions: SessionRegistry::new(),
            sync,
        }
    }

    /// Check if sign-in is available.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Check if Gemini is configured.
    #[must_use]
    pub fn has_gemini(&self) -> bool {
        self.forecaster.is_some()
    }
}
