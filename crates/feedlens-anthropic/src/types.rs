// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API request/response types (non-streaming subset).

use serde::{Deserialize, Serialize};

/// A request to the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-3-5-haiku-latest").
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ApiMessage>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// A single message in the Anthropic conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Plain text content.
    pub content: String,
}

impl ApiMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ApiMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A non-streaming response from the Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Content blocks; text blocks are concatenated by the backend.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped, when reported.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// One content block in a response.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    /// Block type (e.g., "text").
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text payload for text blocks.
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageResponse {
    /// Concatenate all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Error envelope returned by the API on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail within [`ApiErrorResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_concatenates_text_blocks() {
        let response: MessageResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "Read "},
                    {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                    {"type": "text", "text": "a book."}
                ],
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), "Read a book.");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn request_serializes_expected_shape() {
        let request = MessageRequest {
            model: "claude-3-5-haiku-latest".to_string(),
            messages: vec![ApiMessage::user("hello")],
            max_tokens: 512,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn error_envelope_parses() {
        let err: ApiErrorResponse = serde_json::from_str(
            r#"{"error": {"type": "overloaded_error", "message": "try later"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.type_, "overloaded_error");
    }
}
