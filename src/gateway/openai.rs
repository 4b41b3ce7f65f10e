// OpenAI Chat Completions backend. Speaks the REST API directly over a
// blocking client; the system prompt travels as the leading `system`
// message.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{api_error_message, GatewayError, ReplyBackend};
use crate::conversation::Message;

const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiBackend {
    client: Client,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(model: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| GatewayError::Client {
                platform: "openai",
                source,
            })?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }

    // The key is read per call so that a missing key only fails the
    // platform when it is actually used, not at startup.
    fn api_key(&self) -> Result<String, GatewayError> {
        env::var(API_KEY_VAR).map_err(|_| GatewayError::MissingApiKey {
            platform: self.platform(),
            var: API_KEY_VAR,
        })
    }
}

impl ReplyBackend for OpenAiBackend {
    fn platform(&self) -> &'static str {
        "openai"
    }

    fn request_reply(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, GatewayError> {
        let api_key = self.api_key()?;

        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        wire.extend(messages.iter().map(|m| WireMessage {
            role: m.role.wire(),
            content: &m.text,
        }));

        let request = ChatRequest {
            model: &self.model,
            messages: wire,
        };

        let response = self
            .client
            .post(BASE_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(|source| GatewayError::Request {
                platform: self.platform(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Api {
                platform: self.platform(),
                status,
                message: api_error_message(&body),
            });
        }

        let parsed: ChatResponse = response.json().map_err(|source| GatewayError::Parse {
            platform: self.platform(),
            source,
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyReply {
                platform: self.platform(),
            })
    }
}
