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

//! Per-session conversation state on top of an [`LlmProvider`]
//!
//! A [`Conversation`] owns the ordered turn history that is sent upstream as
//! prompt context. It is created lazily through a [`ChatConnector`] the first
//! time a user enters the chat room and is never shared between sessions.

use super::providers::{LlmProvider, OpenAiProvider};
use super::types::{LlmConfig, LlmError, LlmMessage, LlmRequest, LlmRole};
use std::sync::Arc;

/// System prompt used for the BBS chat room
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly AI assistant living on a retro 90s \
bulletin board system. Keep replies conversational and concise, this is a text terminal. \
Retro internet slang and emoticons are welcome where they fit. Always answer in the language \
the user writes in, including Russian and other non-Latin scripts.";

/// Generation settings carried by a conversation
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub model: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Upper bound on stored turns; `None` keeps everything
    pub max_history: Option<usize>,
}

impl ConversationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: None,
            max_history: None,
        }
    }
}

/// Chat history plus the provider it is replayed against
pub struct Conversation {
    provider: Arc<dyn LlmProvider>,
    settings: ConversationSettings,
    history: Vec<LlmMessage>,
}

impl Conversation {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: ConversationSettings) -> Self {
        Self {
            provider,
            settings,
            history: Vec::new(),
        }
    }

    /// Send a user message and return the assistant reply.
    ///
    /// The user turn is recorded before the call and stays recorded when the
    /// call fails; the assistant turn is only recorded on success.
    pub async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        self.history.push(LlmMessage::user(text));
        self.enforce_limit();

        let mut request = LlmRequest::new(self.settings.model.clone())
            .with_message(LlmMessage::system(self.settings.system_prompt.clone()))
            .with_messages(self.history.iter().cloned());
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.provider.complete(request).await?;
        tracing::debug!(
            "Chat reply from {} ({} chars, {:?} tokens)",
            response.model,
            response.content.len(),
            response.total_tokens
        );

        self.history.push(LlmMessage::assistant(response.content.clone()));
        self.enforce_limit();
        Ok(response.content)
    }

    /// Forget every turn
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn provider_name(&self) -> String {
        self.provider.name()
    }

    /// Drop the oldest turns beyond `max_history`, never leaving an
    /// assistant turn at the front.
    fn enforce_limit(&mut self) {
        let Some(max) = self.settings.max_history else {
            return;
        };
        let max = max.max(1);
        if self.history.len() <= max {
            return;
        }
        let mut excess = self.history.len() - max;
        while excess < self.history.len() - 1
            && self.history[excess].role == LlmRole::Assistant
        {
            excess += 1;
        }
        self.history.drain(..excess);
    }
}

/// Fallible factory for conversations
pub trait ChatConnector: Send + Sync {
    /// Build a fresh conversation, e.g. failing when credentials are missing
    fn connect(&self) -> Result<Conversation, LlmError>;

    /// Model identifier conversations will use
    fn model(&self) -> &str;
}

/// Connector for OpenAI-compatible endpoints
pub struct OpenAiConnector {
    config: LlmConfig,
    system_prompt: String,
    max_history: Option<usize>,
}

impl OpenAiConnector {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_history: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_history(mut self, max_history: Option<usize>) -> Self {
        self.max_history = max_history;
        self
    }
}

impl ChatConnector for OpenAiConnector {
    fn connect(&self) -> Result<Conversation, LlmError> {
        let provider = OpenAiProvider::new(self.config.clone())?;
        let settings = ConversationSettings {
            model: self.config.model.clone(),
            system_prompt: self.system_prompt.clone(),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            max_history: self.max_history,
        };
        Ok(Conversation::new(Arc::new(provider), settings))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
