//! Sign-in and sign-out handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::SessionAuth;
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

/// Sign-in request: email and password, or a Google ID token.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignInRequest {
    /// Email and password.
    Password {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Google ID token obtained by the client.
    Google {
        /// The Google ID token.
        google_id_token: String,
    },
}

/// Session response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token for later requests (only returned on sign-in).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Firebase user ID.
    pub user_id: String,
    /// Email.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

impl SessionResponse {
    fn from_session(session: &Session, include_token: bool) -> Self {
        Self {
            session_token: include_token.then(|| session.token().to_string()),
            user_id: session.user_id().to_string(),
            email: session.email().map(str::to_string),
            display_name: session.display_name().map(str::to_string),
        }
    }
}

/// Sign in and start syncing the user's customers.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Firebase Auth".into()))?;

    let tokens = match request {
        SignInRequest::Password { email, password } => {
            let email = email.trim();
            if email.is_empty() || password.is_empty() {
                return Err(ApiError::BadRequest("email and password are required".into()));
            }
            identity.sign_in_with_password(email, &password).await?
        }
        SignInRequest::Google { google_id_token } => {
            let token = google_id_token.trim();
            if token.is_empty() {
                return Err(ApiError::BadRequest("google_id_token is required".into()));
            }
            identity.sign_in_with_google(token).await?
        }
    };

    let session = Arc::new(Session::new(tokens));

    // A failed first load is recorded on the session and shown on the dashboard.
    let _ = state.sync.refresh(&session).await;
    state.sync.start(&session);
    state.sessions.insert(session.clone()).await;

    tracing::info!(user_id = %session.user_id(), "User signed in");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from_session(&session, true)),
    ))
}

/// Get the current session's identity.
pub async fn get_session(auth: SessionAuth) -> Json<SessionResponse> {
    Json(SessionResponse::from_session(&auth.session, false))
}

/// Sign out: stop syncing and drop all local state for the session.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
) -> StatusCode {
    state.sessions.remove(auth.session.token()).await;
    tracing::info!(user_id = %auth.session.user_id(), "User signed out");
    StatusCode::NO_CONTENT
}
