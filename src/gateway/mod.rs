// Reply gateway: one backend per AI platform behind a common trait.
// Each backend maps the conversation history into its provider's wire
// shape; everything above this module only sees `get_reply` and a
// classified `GatewayError`.

pub mod claude;
pub mod mock;
pub mod openai;

use std::borrow::Cow;

use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::conversation::Message;

/// Canned reply when a single message alone exceeds the context budget.
const OVERSIZED_REPLY: &str =
    "I'm sorry, but your response is too long. Can you try something shorter?";

/// Note appended to the system prompt once older turns have been dropped.
const MID_CONVERSATION_NOTE: &str = " You are in the middle of a conversation with the user.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unsupported GAI platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("{var} is not set; cannot call the {platform} API")]
    MissingApiKey {
        platform: &'static str,
        var: &'static str,
    },

    #[error("could not build HTTP client for {platform}: {source}")]
    Client {
        platform: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} API request failed: {source}")]
    Request {
        platform: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} API returned {status}: {message}")]
    Api {
        platform: &'static str,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("could not parse {platform} API response: {source}")]
    Parse {
        platform: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} API returned no text content")]
    EmptyReply { platform: &'static str },
}

/// A reply backend for one AI platform.
pub trait ReplyBackend {
    /// Platform name this backend serves, for error reporting.
    fn platform(&self) -> &'static str;

    /// Send an already-clamped context window to the provider and return
    /// the assistant's reply text.
    fn request_reply(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, GatewayError>;

    /// Clamp the history to the token budget, then request a reply.
    ///
    /// No retries: a failure surfaces immediately to the caller.
    fn get_reply(
        &self,
        system_prompt: &str,
        history: &[Message],
        max_tokens: u32,
    ) -> Result<String, GatewayError> {
        match clamp_context(system_prompt, history, max_tokens) {
            ClampedContext::Window {
                system_prompt,
                messages,
            } => self.request_reply(&system_prompt, messages),
            ClampedContext::Oversized => Ok(OVERSIZED_REPLY.to_string()),
        }
    }
}

/// Resolve a platform name to its backend.
pub fn for_platform(platform: &str, model: &str) -> Result<Box<dyn ReplyBackend>, GatewayError> {
    match platform {
        "openai" => Ok(Box::new(openai::OpenAiBackend::new(model)?)),
        "claude" => Ok(Box::new(claude::ClaudeBackend::new(model)?)),
        other => Err(GatewayError::UnsupportedPlatform {
            platform: other.to_string(),
        }),
    }
}

/// Flatten the configured platform -> models mapping into `(platform,
/// model)` pairs for menu rendering.
pub fn list_available_models(config: &Config) -> Vec<(String, String)> {
    let mut all = Vec::new();
    for (platform, models) in &config.gai_models {
        for model in models {
            all.push((platform.clone(), model.clone()));
        }
    }
    all
}

/// Result of fitting a conversation into the context budget.
pub enum ClampedContext<'a> {
    /// The window to send: possibly the full history, possibly a suffix
    /// with the system prompt marked as mid-conversation.
    Window {
        system_prompt: Cow<'a, str>,
        messages: &'a [Message],
    },
    /// Even a single message exceeds the budget.
    Oversized,
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn window_len(system_prompt: &str, messages: &[Message]) -> usize {
    word_count(system_prompt) + messages.iter().map(|m| word_count(&m.text)).sum::<usize>()
}

/// Fit `history` into `max_tokens` words by dropping oldest messages
/// first. The budget is approximated as a whitespace word count, which
/// tracks the production bot's accounting.
pub fn clamp_context<'a>(
    system_prompt: &'a str,
    history: &'a [Message],
    max_tokens: u32,
) -> ClampedContext<'a> {
    let budget = max_tokens as usize;
    if window_len(system_prompt, history) <= budget {
        return ClampedContext::Window {
            system_prompt: Cow::Borrowed(system_prompt),
            messages: history,
        };
    }

    let marked = format!("{system_prompt}{MID_CONVERSATION_NOTE}");
    let mut start = 1;
    while start < history.len() {
        if window_len(&marked, &history[start..]) <= budget {
            return ClampedContext::Window {
                system_prompt: Cow::Owned(marked),
                messages: &history[start..],
            };
        }
        start += 1;
    }

    ClampedContext::Oversized
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull the human-readable message out of a provider error body, falling
/// back to the raw body when it is not the usual envelope.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}
