//! Generative Language REST client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::error::{GeminiError, Result};
use crate::types::{ErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `base_url` (normally [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Configuration` if the API key is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| GeminiError::Configuration("API key is not a valid header value".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Run one `generateContent` call against `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error.
    #[instrument(skip(self, request), fields(model = %model))]
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        Self::handle_response(response).await
    }

    async fn handle_response(response: reqwest::Response) -> Result<GenerateContentResponse> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body)
                .map_err(|e| GeminiError::Parse(format!("failed to parse response: {e}")));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(GeminiError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();

        match parsed {
            Some(ErrorResponse { error })
                if status == StatusCode::UNAUTHORIZED
                    || status == StatusCode::FORBIDDEN
                    || error.message.contains("API key") =>
            {
                Err(GeminiError::Unauthorized(error.message))
            }
            Some(ErrorResponse { error }) => Err(GeminiError::Api {
                code: if error.code == 0 { status.as_u16() } else { error.code },
                status: error.status,
                message: error.message,
            }),
            None if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Err(GeminiError::Unauthorized(format!("HTTP {status}")))
            }
            None => Err(GeminiError::Api {
                code: status.as_u16(),
                status: "UNKNOWN".to_string(),
                message: body,
            }),
        }
    }
}
