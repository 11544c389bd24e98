use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::chat::Message;
use crate::config::Settings;
use crate::generate::Generator;
use crate::http::{self, ProviderKind};
use crate::{Error, Result};

const PROVIDER: &str = "huggingface";

/// Chat model served by the HuggingFace router's OpenAI-compatible
/// `/v1/chat/completions` endpoint.
///
/// The API token is read from [`Settings`] at call time, so a missing token
/// fails the first request with [`Error::ConfigurationMissing`].
pub struct HuggingFaceChat {
    client: Client,
    settings: Settings,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HuggingFaceChat {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            settings: settings.clone(),
            max_tokens: None,
        })
    }

    /// Use a different model than the one in settings.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.settings.chat_model = model.into();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.settings.hf_base_url)
    }
}

/// Extract the first choice's text from a chat-completions response.
fn parse_reply(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::generation(PROVIDER, format!("failed to parse response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::generation(PROVIDER, "response contained no message content"))
}

impl Generator for HuggingFaceChat {
    fn chat(&mut self, messages: &[Message]) -> Result<String> {
        let token = self.settings.require_token()?;
        debug!(
            provider = PROVIDER,
            model = %self.settings.chat_model,
            messages = messages.len(),
            "chat completion"
        );

        let request = ChatRequest {
            model: &self.settings.chat_model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(token)
            .json(&request)
            .send()
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Error::generation(PROVIDER, format!("request failed: {e}"))
            })?;

        let body = http::check(ProviderKind::Generation, PROVIDER, response)?
            .text()
            .map_err(|e| Error::generation(PROVIDER, format!("failed to read response: {e}")))?;

        parse_reply(&body)
    }

    fn model_name(&self) -> &str {
        &self.settings.chat_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "New Delhi."}, "finish_reason": "stop"}
            ]
        }"#;
        assert_eq!(parse_reply(body).unwrap(), "New Delhi.");
    }

    #[test]
    fn test_parse_reply_no_choices() {
        let err = parse_reply(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, Error::GenerationProvider { .. }));
    }

    #[test]
    fn test_parse_reply_null_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(parse_reply(body).is_err());
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![
            Message::system("You are a helpful assistant"),
            Message::user("Tell me about LangChain"),
        ];
        let request = ChatRequest {
            model: "HuggingFaceH4/zephyr-7b-beta",
            messages: &messages,
            temperature: 0.7,
            max_tokens: None,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "HuggingFaceH4/zephyr-7b-beta");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Tell me about LangChain");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_missing_token_fails_on_first_call() {
        let mut model = HuggingFaceChat::new(&Settings::default()).unwrap();
        let err = model.generate("What is the capital of India?").unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_with_model() {
        let model = HuggingFaceChat::new(&Settings::default())
            .unwrap()
            .with_model("mistralai/Mistral-7B-Instruct-v0.2");
        assert_eq!(model.model_name(), "mistralai/Mistral-7B-Instruct-v0.2");
    }
}
