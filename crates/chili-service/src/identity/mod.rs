//! Firebase Authentication REST client.
//!
//! Exchanges credentials for a Firebase ID token and refresh token:
//!
//! - email and password via `accounts:signInWithPassword`
//! - a Google ID token via `accounts:signInWithIdp`
//! - a refresh token via the Secure Token `token` endpoint
//!
//! Sign-out is local; nothing is revoked server-side.

mod types;

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use chili_core::{IdError, UserId};

use types::{
    ErrorResponse, IdpSignInRequest, PasswordSignInRequest, RefreshRequest, RefreshResponse,
    SignInResponse,
};

/// Default Identity Toolkit endpoint.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default Secure Token endpoint.
pub const DEFAULT_SECURE_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

const GOOGLE_PROVIDER_ID: &str = "google.com";
const IDP_REQUEST_URI: &str = "http://localhost";

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the credentials or request.
    #[error("sign-in rejected: {reason}")]
    Rejected {
        /// Provider reason code, e.g. `INVALID_LOGIN_CREDENTIALS`.
        reason: String,
        /// HTTP status code.
        status: u16,
    },

    /// The provider's response could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<IdError> for IdentityError {
    fn from(err: IdError) -> Self {
        Self::Parse(format!("invalid user id: {err}"))
    }
}

/// Tokens and profile returned by a successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct IdentityTokens {
    /// Firebase user ID.
    pub user_id: UserId,
    /// Email, if the account has one.
    pub email: Option<String>,
    /// Display name, if the account has one.
    pub display_name: Option<String>,
    /// Short-lived ID token used for store calls.
    pub id_token: SecretString,
    /// Long-lived refresh token.
    pub refresh_token: SecretString,
    /// ID token lifetime.
    pub expires_in: Duration,
}

/// Firebase Auth client.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    identity_base_url: String,
    secure_token_base_url: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        identity_base_url: impl Into<String>,
        secure_token_base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            identity_base_url: identity_base_url.into().trim_end_matches('/').to_string(),
            secure_token_base_url: secure_token_base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` for bad credentials.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityTokens, IdentityError> {
        let url = format!("{}/accounts:signInWithPassword", self.identity_base_url);
        let request = PasswordSignInRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let body: SignInResponse = Self::handle_response(response).await?;
        body.try_into()
    }

    /// Sign in with a Google ID token obtained by the client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` if the token is invalid or expired.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in_with_google(
        &self,
        google_id_token: &str,
    ) -> Result<IdentityTokens, IdentityError> {
        let url = format!("{}/accounts:signInWithIdp", self.identity_base_url);
        // Google ID tokens are JWTs; their alphabet needs no form encoding.
        let request = IdpSignInRequest {
            post_body: format!("id_token={google_id_token}&providerId={GOOGLE_PROVIDER_ID}"),
            request_uri: IDP_REQUEST_URI.to_string(),
            return_secure_token: true,
            return_idp_credential: true,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let body: SignInResponse = Self::handle_response(response).await?;
        body.try_into()
    }

    /// Exchange a refresh token for a fresh ID token.
    ///
    /// Email and display name are not returned by this endpoint and are left
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` if the refresh token was revoked.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<IdentityTokens, IdentityError> {
        let url = format!("{}/token", self.secure_token_base_url);
        let request = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token: refresh_token.expose_secret(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let body: RefreshResponse = Self::handle_response(response).await?;
        Ok(IdentityTokens {
            user_id: UserId::new(body.user_id)?,
            email: None,
            display_name: None,
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_in: parse_expires_in(&body.expires_in)?,
        })
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| IdentityError::Parse(format!("failed to parse response: {e}")));
        }

        let reason = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .map(|e| reason_code(&e.error.message).to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));

        tracing::warn!(status = %status, reason = %reason, "Identity provider rejected request");
        Err(IdentityError::Rejected {
            reason,
            status: status.as_u16(),
        })
    }
}

impl TryFrom<SignInResponse> for IdentityTokens {
    type Error = IdentityError;

    fn try_from(body: SignInResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(body.local_id)?,
            email: body.email.filter(|e| !e.is_empty()),
            display_name: body.display_name.filter(|n| !n.is_empty()),
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_in: parse_expires_in(&body.expires_in)?,
        })
    }
}

/// `"TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"` -> `"TOO_MANY_ATTEMPTS_TRY_LATER"`.
fn reason_code(message: &str) -> &str {
    message.split(" : ").next().unwrap_or(message).trim()
}

fn parse_expires_in(raw: &str) -> Result<Duration, IdentityError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| IdentityError::Parse(format!("invalid expiresIn: {raw}")))
}
