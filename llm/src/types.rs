//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Common types for the chat capability

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default OpenAI-compatible chat completions endpoint (OpenRouter)
pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default free-tier model on OpenRouter
pub const DEFAULT_MODEL: &str = "google/gemma-2-9b-it:free";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for LlmRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmRole::System => write!(f, "system"),
            LlmRole::User => write!(f, "user"),
            LlmRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Prompt context, system prompt first
    pub messages: Vec<LlmMessage>,
    /// Model to use (provider-specific)
    pub model: String,
    /// Temperature (0.0 - 2.0, higher = more random)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn with_message(mut self, message: LlmMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add multiple messages
    pub fn with_messages<I>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = LlmMessage>,
    {
        self.messages.extend(messages);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated content
    pub content: String,
    /// Model that produced the content
    pub model: String,
    /// Total tokens, when reported
    pub total_tokens: Option<u32>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            total_tokens: None,
            finish_reason: None,
        }
    }
}

/// Chat backend errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),
    /// API error (invalid request, rate limit, etc.)
    #[error("API error: {0}")]
    Api(String),
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Request timed out
    #[error("Timeout: {0}")]
    Timeout(String),
    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout(_))
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// API key; `None` when unset
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Additional attempts after a transient failure
    pub max_retries: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per reply
    pub max_tokens: u32,
    /// Optional `HTTP-Referer` attribution header
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header
    pub title: Option<String>,
}

impl LlmConfig {
    /// Create an OpenRouter configuration
    pub fn openrouter(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: OPENROUTER_ENDPOINT.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            timeout_seconds: 30,
            max_retries: 2,
            temperature: 0.7,
            max_tokens: 500,
            referer: None,
            title: Some("AI BBS".to_string()),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::openrouter(None, DEFAULT_MODEL)
    }
}
