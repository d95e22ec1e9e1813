//! Business assistant chat.
//!
//! One [`ChatSession`] per signed-in user holds the transcript shown to the
//! user. Every message sends the whole model-visible history in a single
//! request. The greeting and any failed exchange stay in the transcript but are
//! never sent to the model.

use serde::Serialize;
use uuid::Uuid;

use crate::client::GeminiClient;
use crate::error::AssistantError;
use crate::types::{Content, GenerateContentRequest};

/// Default model for the assistant.
pub const DEFAULT_ASSISTANT_MODEL: &str = "gemini-3.1-pro-preview";

/// System instruction for every assistant request.
pub const PERSONA: &str = "Bạn là một chuyên gia tư vấn kinh doanh bán buôn tương ớt và hỗ trợ sử dụng phần mềm ChiliPredict. Hãy trả lời ngắn gọn, súc tích và hữu ích bằng tiếng Việt.";

/// First message of every transcript.
pub const GREETING: &str = "Chào bạn! Tôi là trợ lý AI của ChiliPredict. Bạn cần hỏi gì về kinh doanh tương ớt hay cách sử dụng phần mềm?";

/// Reply shown when the model answers with no text.
pub const NO_ANSWER: &str = "Xin lỗi, tôi không thể trả lời lúc này.";

/// Reply shown when the model request fails.
pub const APOLOGY: &str = "Đã có lỗi xảy ra khi kết nối với AI. Vui lòng thử lại sau.";

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The signed-in user.
    User,
    /// The assistant.
    Model,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    /// Entry identifier.
    pub id: Uuid,
    /// Author.
    pub role: ChatRole,
    /// Text.
    pub content: String,
    #[serde(skip)]
    in_context: bool,
}

impl ChatTurn {
    fn new(role: ChatRole, content: impl Into<String>, in_context: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            in_context,
        }
    }

    /// Whether this entry is part of the history sent to the model.
    #[must_use]
    pub fn in_context(&self) -> bool {
        self.in_context
    }
}

/// A user's assistant transcript.
#[derive(Debug, Clone)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A new session holding only the greeting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            turns: vec![ChatTurn::new(ChatRole::Model, GREETING, false)],
        }
    }

    /// The full transcript, greeting first.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    fn history(&self) -> Vec<Content> {
        self.turns
            .iter()
            .filter(|t| t.in_context)
            .map(|t| match t.role {
                ChatRole::User => Content::user(&t.content),
                ChatRole::Model => Content::model(&t.content),
            })
            .collect()
    }

    fn push(&mut self, turn: ChatTurn) -> &ChatTurn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Drop the user turn just sent from the model-visible history.
    fn exclude_last(&mut self) {
        if let Some(last) = self.turns.last_mut() {
            last.in_context = false;
        }
    }
}

/// Sends chat turns to a Gemini model.
#[derive(Debug, Clone)]
pub struct Assistant {
    client: GeminiClient,
    model: String,
}

impl Assistant {
    /// Create an assistant using `model`.
    #[must_use]
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// The model used for chat.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Append `message` to `session`, ask the model, and append its reply.
    ///
    /// Returns the reply entry.
    ///
    /// # Errors
    ///
    /// - `AssistantError::EmptyMessage` if `message` is blank; the transcript
    ///   is unchanged
    /// - `AssistantError::Model` if the request fails; the transcript then ends
    ///   with the user's message followed by [`APOLOGY`]
    #[tracing::instrument(skip(self, session, message), fields(model = %self.model))]
    pub async fn send(
        &self,
        session: &mut ChatSession,
        message: &str,
    ) -> Result<ChatTurn, AssistantError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        session.push(ChatTurn::new(ChatRole::User, message, true));
        let request = GenerateContentRequest {
            contents: session.history(),
            system_instruction: Some(Content::instruction(PERSONA)),
            generation_config: None,
        };

        match self.client.generate_content(&self.model, &request).await {
            Ok(response) => {
                let reply = match response.text() {
                    Some(text) => ChatTurn::new(ChatRole::Model, text, true),
                    None => {
                        tracing::warn!("Assistant returned no text");
                        session.exclude_last();
                        ChatTurn::new(ChatRole::Model, NO_ANSWER, false)
                    }
                };
                Ok(session.push(reply).clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Assistant request failed");
                session.exclude_last();
                session.push(ChatTurn::new(ChatRole::Model, APOLOGY, false));
                Err(e.into())
            }
        }
    }
}
