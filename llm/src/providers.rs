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

//! Chat provider implementations

use super::types::{LlmConfig, LlmError, LlmMessage, LlmRequest, LlmResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base delay between retries; doubled on every further attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on a single retry delay
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Trait for chat completion backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request to the model and wait for the full reply
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get provider name
    fn name(&self) -> String;
}

/// OpenAI-compatible provider (OpenRouter, OpenAI, LM Studio, ...)
pub struct OpenAiProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    total_tokens: u32,
}

impl OpenAiProvider {
    /// Create a new provider. Fails when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::Config(
                "OPENROUTER_API_KEY not found in environment variables".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// One HTTP round trip. The flag says whether a retry is worthwhile.
    async fn attempt(&self, request: &LlmRequest) -> Result<LlmResponse, (LlmError, bool)> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| (LlmError::Auth("No API key configured".to_string()), false))?;

        let body = OpenAiRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body);
        if let Some(referer) = &self.config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                (LlmError::Timeout(format!("Request timed out: {}", e)), true)
            } else {
                (LlmError::Network(format!("Request failed: {}", e)), true)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, error_text));
        }

        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            (
                LlmError::Api(format!("Failed to parse response: {}", e)),
                false,
            )
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| (LlmError::Api("No choices in response".to_string()), false))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            total_tokens: parsed.usage.map(|u| u.total_tokens),
            finish_reason: choice.finish_reason,
        })
    }
}

/// Map a non-success HTTP status onto an error and a retry decision
fn classify_status(status: StatusCode, body: String) -> (LlmError, bool) {
    let message = format!("API returned {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => (LlmError::Auth(message), false),
        StatusCode::TOO_MANY_REQUESTS => (LlmError::Api(message), true),
        s if s.is_server_error() => (LlmError::Api(message), true),
        _ => (LlmError::Api(message), false),
    }
}

/// Exponential backoff for retry number `attempt`, counted from zero
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(RETRY_MAX_DELAY)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut attempt = 0;
        loop {
            match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err((error, retry)) if retry && attempt < self.config.max_retries => {
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        "Chat request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err((error, _)) => return Err(error),
            }
        }
    }

    fn name(&self) -> String {
        "OpenRouter".to_string()
    }
}
