// Claude Messages API backend. Unlike the Chat Completions shape, the
// system prompt rides in a dedicated `system` field and only user and
// assistant turns appear in `messages`.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{api_error_message, GatewayError, ReplyBackend};
use crate::conversation::Message;

const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling cap sent to the Messages API. Separate from the context
/// budget used for clamping, which comes from configuration.
const MAX_TOKENS_TO_SAMPLE: u32 = 1024;

pub struct ClaudeBackend {
    client: Client,
    model: String,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ClaudeBackend {
    pub fn new(model: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| GatewayError::Client {
                platform: "claude",
                source,
            })?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }

    // Read per call; a missing key fails the first use, not startup.
    fn api_key(&self) -> Result<String, GatewayError> {
        env::var(API_KEY_VAR).map_err(|_| GatewayError::MissingApiKey {
            platform: self.platform(),
            var: API_KEY_VAR,
        })
    }
}

impl ReplyBackend for ClaudeBackend {
    fn platform(&self) -> &'static str {
        "claude"
    }

    fn request_reply(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, GatewayError> {
        let api_key = self.api_key()?;

        let request = CreateMessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS_TO_SAMPLE,
            system: system_prompt,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.wire(),
                    content: &m.text,
                })
                .collect(),
        };

        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let parsed: CreateMessageResponse =
            response.json().map_err(|source| GatewayError::Parse {
                platform: self.platform(),
                source,
            })?;

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or(GatewayError::EmptyReply {
                platform: self.platform(),
            })
    }
}
