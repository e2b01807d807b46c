//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
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

use aibbs_llm::{
    Conversation, ConversationSettings, LlmError, LlmMessage, LlmProvider, LlmRequest,
    LlmResponse, LlmRole,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Provider that replays scripted outcomes and records every request
struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Other("script exhausted".into())));
        outcome.map(|content| LlmResponse::new(content, model))
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

#[tokio::test]
async fn test_retry_after_failure_keeps_prior_context() {
    let provider = ScriptedProvider::new(vec![
        Err(LlmError::Timeout("upstream slow".into())),
        Ok("Hello, Guest! :)".into()),
    ]);
    let mut conversation = Conversation::new(provider.clone(), ConversationSettings::new("m"));

    let err = conversation.send("hi").await.unwrap_err();
    assert!(err.to_string().contains("upstream slow"));
    assert_eq!(conversation.len(), 1);

    let reply = conversation.send("hi again").await.unwrap();
    assert_eq!(reply, "Hello, Guest! :)");

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let second: Vec<&str> = requests[1]
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(&second[1..], &["hi", "hi again"]);
    assert_eq!(
        conversation.history().last(),
        Some(&LlmMessage::assistant("Hello, Guest! :)"))
    );
}

#[tokio::test]
async fn test_reset_starts_a_fresh_prompt() {
    let provider = ScriptedProvider::new(vec![Ok("first".into()), Ok("second".into())]);
    let mut conversation = Conversation::new(provider.clone(), ConversationSettings::new("m"));

    conversation.send("remember me").await.unwrap();
    conversation.reset();
    assert_eq!(conversation.len(), 0);
    conversation.send("who am i").await.unwrap();

    let requests = provider.requests.lock().unwrap();
    let last = &requests[1].messages;
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].role, LlmRole::System);
    assert_eq!(last[1], LlmMessage::user("who am i"));
}

#[tokio::test]
async fn test_unicode_messages_pass_through() {
    let provider = ScriptedProvider::new(vec![Ok("Привет! 👋".into())]);
    let mut conversation = Conversation::new(provider, ConversationSettings::new("m"));

    let reply = conversation.send("Привет, мир!").await.unwrap();
    assert_eq!(reply, "Привет! 👋");
    assert_eq!(conversation.history()[0].content, "Привет, мир!");
}
