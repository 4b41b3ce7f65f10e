// A scriptable backend for tests: plays back a fixed sequence of replies
// and failures instead of calling a provider.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::{GatewayError, ReplyBackend};
use crate::conversation::Message;

/// One scripted gateway outcome.
pub enum MockStep {
    Reply(String),
    Fail(String),
}

/// Backend that returns preconfigured outcomes in order. Once the script
/// runs out, every further call fails with `fallback_failure`.
pub struct MockBackend {
    script: RefCell<VecDeque<MockStep>>,
    fallback_failure: String,
    calls: Cell<usize>,
}

impl MockBackend {
    /// A backend that answers with the given replies, in order.
    pub fn replies(replies: &[&str]) -> Self {
        Self::steps(replies.iter().map(|r| MockStep::Reply(r.to_string())).collect())
    }

    /// A backend that fails every call with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            script: RefCell::new(VecDeque::new()),
            fallback_failure: message.to_string(),
            calls: Cell::new(0),
        }
    }

    /// A backend that plays back an explicit script.
    pub fn steps(steps: Vec<MockStep>) -> Self {
        Self {
            script: RefCell::new(steps.into()),
            fallback_failure: "mock script exhausted".to_string(),
            calls: Cell::new(0),
        }
    }

    /// Number of `request_reply` calls that reached this backend.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn failure(&self, message: String) -> GatewayError {
        GatewayError::Api {
            platform: self.platform(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl ReplyBackend for MockBackend {
    fn platform(&self) -> &'static str {
        "mock"
    }

    fn request_reply(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
    ) -> Result<String, GatewayError> {
        self.calls.set(self.calls.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(MockStep::Reply(text)) => Ok(text),
            Some(MockStep::Fail(message)) => Err(self.failure(message)),
            None => Err(self.failure(self.fallback_failure.clone())),
        }
    }
}
