//! Firebase Auth REST API types.

use serde::{Deserialize, Serialize};

/// `accounts:signInWithPassword` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// `accounts:signInWithIdp` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpSignInRequest {
    /// URL-encoded provider credential, e.g. `id_token=...&providerId=google.com`.
    pub post_body: String,
    pub request_uri: String,
    pub return_secure_token: bool,
    pub return_idp_credential: bool,
}

/// Response of both sign-in endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds, as a decimal string.
    pub expires_in: String,
}

/// Secure Token refresh request.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub grant_type: &'static str,
    pub refresh_token: &'a str,
}

/// Secure Token refresh response (snake case, unlike Identity Toolkit).
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub user_id: String,
}

/// Error envelope. `message` carries the reason code, optionally followed by
/// ` : <detail>`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
