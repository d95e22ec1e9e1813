//! Request and response types for `models/{model}:generateContent`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Author of a content block.
pub const ROLE_USER: &str = "user";
/// Author of a model reply.
pub const ROLE_MODEL: &str = "model";

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`. Absent for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts of the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(ROLE_USER, text)
    }

    /// A single-part model turn.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role(ROLE_MODEL, text)
    }

    /// A role-less block, used for system instructions.
    #[must_use]
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

/// A content part. Only text parts are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// A text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation so far, oldest first.
    pub contents: Vec<Content>,
    /// Persona / system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Output constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Output constraints for a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// E.g. `application/json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Schema the JSON output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
}

/// OpenAPI-subset schema accepted by `responseSchema`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// `OBJECT`, `STRING`, `NUMBER`, ...
    #[serde(rename = "type")]
    pub kind: SchemaType,
    /// Human hint for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Required property names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Schema value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    /// Object.
    Object,
    /// String.
    String,
    /// Floating point number.
    Number,
}

impl Schema {
    /// A scalar schema.
    #[must_use]
    pub fn scalar(kind: SchemaType, description: Option<&str>) -> Self {
        Self {
            kind,
            description: description.map(str::to_string),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// `generateContent` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate completions; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// A candidate completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content. Absent when generation was blocked.
    pub content: Option<Content>,
    /// Why generation stopped, e.g. `STOP` or `SAFETY`.
    pub finish_reason: Option<String>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_and_omits_empty_options() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("xin chào")],
            system_instruction: None,
            generation_config: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "xin chào"}]}]})
        );
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Chào "}, {"text": "bạn"}]}, "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("Chào bạn"));
    }

    #[test]
    fn blocked_candidate_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(response.text(), None);

        assert_eq!(GenerateContentResponse::default().text(), None);
    }
}
