//! ChiliPredict HTTP client implementation.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

use crate::error::ClientError;
use crate::types::{
    AddPurchaseRequest, ApiErrorResponse, ChatMessage, CreatedCustomer, CustomerDetail,
    CustomerNameRequest, Dashboard, HealthStatus, PurchaseEdit, ReplyResponse, SendMessageRequest,
    SessionInfo, SignInRequest, SignInResponse, TranscriptResponse,
};

/// ChiliPredict API client.
///
/// Holds the session token after a successful sign-in and sends it with
/// every later call.
#[derive(Debug, Clone)]
pub struct ChiliClient {
    client: Client,
    base_url: String,
    session_token: Option<SecretString>,
}

impl ChiliClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://localhost:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: None,
        })
    }

    /// Resume an existing session.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(SecretString::from(token.into()));
        self
    }

    /// The current session token, if signed in.
    #[must_use]
    pub fn session_token(&self) -> Option<&SecretString> {
        self.session_token.as_ref()
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        self.handle_response(response).await
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SignInFailed` if the credentials are rejected.
    pub async fn sign_in_with_password(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<SessionInfo, ClientError> {
        self.sign_in(&SignInRequest::Password { email, password })
            .await
    }

    /// Sign in with a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SignInFailed` if the token is rejected.
    pub async fn sign_in_with_google(
        &mut self,
        google_id_token: &str,
    ) -> Result<SessionInfo, ClientError> {
        self.sign_in(&SignInRequest::Google { google_id_token })
            .await
    }

    async fn sign_in(&mut self, request: &SignInRequest<'_>) -> Result<SessionInfo, ClientError> {
        let response = self
            .client
            .post(self.url("/v1/session"))
            .json(request)
            .send()
            .await?;

        let body: SignInResponse = self.handle_response(response).await?;
        self.session_token = Some(SecretString::from(body.session_token));
        Ok(body.info)
    }

    /// Get the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if the session has ended.
    pub async fn session(&self) -> Result<SessionInfo, ClientError> {
        let response = self.authed(self.client.get(self.url("/v1/session")))?
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Sign out. The local token is dropped even if the call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        let request = self.authed(self.client.delete(self.url("/v1/session")))?;
        self.session_token = None;

        let response = request.send().await?;
        self.handle_empty(response).await
    }

    // ========================================================================
    // Customers
    // ========================================================================

    /// List customers, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_customers(&self, query: Option<&str>) -> Result<Dashboard, ClientError> {
        let mut request = self.client.get(self.url("/v1/customers"));
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }

        let response = self.authed(request)?.send().await?;
        self.handle_response(response).await
    }

    /// Re-query the store now.
    ///
    /// # Errors
    ///
    /// Returns an error with guidance if the store query fails.
    pub async fn refresh(&self) -> Result<Dashboard, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/v1/customers/refresh")))?
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a customer and return its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the write fails.
    pub async fn create_customer(&self, name: &str) -> Result<String, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/v1/customers")))?
            .json(&CustomerNameRequest { name })
            .send()
            .await?;

        let created: CreatedCustomer = self.handle_response(response).await?;
        Ok(created.id)
    }

    /// Get one customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist.
    pub async fn get_customer(&self, id: &str) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/v1/customers/{id}"))))?
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Rename a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the write fails.
    pub async fn rename_customer(&self, id: &str, name: &str) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(self.client.patch(self.url(&format!("/v1/customers/{id}"))))?
            .json(&CustomerNameRequest { name })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a customer with its purchases and prediction.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn delete_customer(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/v1/customers/{id}"))))?
            .send()
            .await?;
        self.handle_empty(response).await
    }

    /// Select a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist.
    pub async fn select_customer(&self, id: &str) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(self.client.post(self.url(&format!("/v1/customers/{id}/select"))))?
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    /// Record a purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero or the write fails.
    pub async fn add_purchase(
        &self,
        id: &str,
        date: NaiveDate,
        quantity: u32,
    ) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(self.client.post(self.url(&format!("/v1/customers/{id}/purchases"))))?
            .json(&AddPurchaseRequest { date, quantity })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Change a purchase's date and/or quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit is empty or invalid, or the write fails.
    pub async fn edit_purchase(
        &self,
        id: &str,
        purchase_id: &str,
        edit: &PurchaseEdit,
    ) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(
                self.client
                    .patch(self.url(&format!("/v1/customers/{id}/purchases/{purchase_id}"))),
            )?
            .json(edit)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Remove a purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase does not exist or the write fails.
    pub async fn delete_purchase(
        &self,
        id: &str,
        purchase_id: &str,
    ) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(
                self.client
                    .delete(self.url(&format!("/v1/customers/{id}/purchases/{purchase_id}"))),
            )?
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ========================================================================
    // Forecast / assistant
    // ========================================================================

    /// Forecast the customer's next purchase and store it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is too little history, a forecast is already
    /// running, the model fails, or the customer changed meanwhile.
    pub async fn predict(&self, id: &str) -> Result<CustomerDetail, ClientError> {
        let response = self
            .authed(self.client.post(self.url(&format!("/v1/customers/{id}/prediction"))))?
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get the assistant transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn transcript(&self) -> Result<Vec<ChatMessage>, ClientError> {
        let response = self
            .authed(self.client.get(self.url("/v1/assistant")))?
            .send()
            .await?;

        let body: TranscriptResponse = self.handle_response(response).await?;
        Ok(body.messages)
    }

    /// Send a message to the assistant and return its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is blank or the model fails; the
    /// apology shown to the user is in the error message.
    pub async fn send_message(&self, message: &str) -> Result<ChatMessage, ClientError> {
        let response = self
            .authed(self.client.post(self.url("/v1/assistant/messages")))?
            .json(&SendMessageRequest { message })
            .send()
            .await?;

        let body: ReplyResponse = self.handle_response(response).await?;
        Ok(body.reply)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.session_token.as_ref().ok_or(ClientError::NotSignedIn)?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    async fn handle_empty(&self, response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(response).await)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::error_from(response).await)
    }

    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                tracing::debug!(status = %status, code = %code, "API error response");

                match code {
                    "sign_in_failed" => {
                        let reason = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("reason"))
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("UNKNOWN")
                            .to_string();
                        ClientError::SignInFailed { reason }
                    }
                    "unauthorized" => ClientError::Unauthorized(message),
                    _ => ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    },
                }
            }
            Err(_) => ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            },
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 90, longer than a model call).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_seconds: 90 }
    }
}
