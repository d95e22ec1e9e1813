//! Signed-in sessions.
//!
//! A session is created by a successful sign-in and identified by an opaque
//! bearer token. It owns everything tied to the signed-in user: identity
//! tokens, the customer mirror, the background sync task and the assistant
//! transcript. Signing out drops all of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use chili_core::{Mirror, UserId};
use chili_gemini::ChatSession;
use chili_store::AuthContext;

use crate::identity::{IdentityClient, IdentityError, IdentityTokens};

/// ID tokens are refreshed once they are this close to expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

struct Credentials {
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
}

/// One signed-in user's session.
pub struct Session {
    token: String,
    user_id: UserId,
    email: Option<String>,
    display_name: Option<String>,
    credentials: Mutex<Credentials>,
    /// Customers visible to this user. Snapshots are applied only under `refresh_lock`.
    pub(crate) mirror: RwLock<Mirror>,
    pub(crate) refresh_lock: Mutex<()>,
    pub(crate) sync_error: RwLock<Option<String>>,
    pub(crate) assistant: Mutex<ChatSession>,
    predicting: AtomicBool,
    sync_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session from a sign-in result.
    #[must_use]
    pub fn new(tokens: IdentityTokens) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            mirror: RwLock::new(Mirror::new(tokens.user_id.clone())),
            user_id: tokens.user_id,
            email: tokens.email,
            display_name: tokens.display_name,
            credentials: Mutex::new(Credentials {
                id_token: tokens.id_token,
                refresh_token: tokens.refresh_token,
                expires_at: Instant::now() + tokens.expires_in,
            }),
            refresh_lock: Mutex::new(()),
            sync_error: RwLock::new(None),
            assistant: Mutex::new(ChatSession::new()),
            predicting: AtomicBool::new(false),
            sync_task: std::sync::Mutex::new(None),
        }
    }

    /// The bearer token identifying this session.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The signed-in user.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The user's email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// The user's display name, if known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Store credentials for this user, refreshing the ID token first if it
    /// is about to expire.
    ///
    /// # Errors
    ///
    /// Returns an error if a needed refresh fails.
    pub async fn auth_context(
        &self,
        identity: Option<&IdentityClient>,
    ) -> Result<AuthContext, IdentityError> {
        let mut credentials = self.credentials.lock().await;

        if let Some(identity) = identity {
            if credentials.expires_at.saturating_duration_since(Instant::now()) <= REFRESH_MARGIN {
                tracing::debug!(user_id = %self.user_id, "Refreshing ID token");
                let fresh = identity.refresh(&credentials.refresh_token).await?;
                credentials.id_token = fresh.id_token;
                credentials.refresh_token = fresh.refresh_token;
                credentials.expires_at = Instant::now() + fresh.expires_in;
            }
        }

        Ok(AuthContext {
            user_id: self.user_id.clone(),
            id_token: credentials.id_token.clone(),
        })
    }

    /// Claim the forecast slot. Returns `None` if a forecast is already running.
    #[must_use]
    pub fn begin_prediction(&self) -> Option<PredictionGuard<'_>> {
        self.predicting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PredictionGuard { session: self })
    }

    /// Whether a forecast is running.
    #[must_use]
    pub fn is_predicting(&self) -> bool {
        self.predicting.load(Ordering::Acquire)
    }

    pub(crate) fn set_sync_task(&self, handle: JoinHandle<()>) {
        let mut slot = self
            .sync_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stop background sync and clear all local state.
    pub async fn close(&self) {
        let task = self
            .sync_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }

        // Wait out an in-flight refresh so it cannot repopulate the mirror.
        let _refresh = self.refresh_lock.lock().await;
        self.mirror.write().await.clear();
        *self.sync_error.write().await = None;
        *self.assistant.lock().await = ChatSession::new();
    }
}

/// Releases the forecast slot when dropped.
#[derive(Debug)]
pub struct PredictionGuard<'a> {
    session: &'a Session,
}

impl Drop for PredictionGuard<'_> {
    fn drop(&mut self) {
        self.session.predicting.store(false, Ordering::Release);
    }
}

/// All live sessions, keyed by bearer token.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session.
    pub async fn insert(&self, session: Arc<Session>) {
        self.sessions
            .write()
            .await
            .insert(session.token().to_string(), session);
    }

    /// Look up a session by bearer token.
    pub async fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Remove a session and shut it down.
    pub async fn remove(&self, token: &str) -> Option<Arc<Session>> {
        let session = self.sessions.write().await.remove(token)?;
        session.close().await;
        Some(session)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
