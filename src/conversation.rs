// The turn-taking conversation loop. The loop owns the message history
// for the whole session and produces a `ConversationRecord` on every
// exit path, including interrupts, so partial conversations still reach
// the transcript file.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::gateway::ReplyBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Tag used in the saved transcript.
    pub fn tag(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }

    /// Role name used on the provider wire.
    pub fn wire(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The platform/model/prompt/first-message tuple chosen in the menus.
/// Immutable once the conversation starts.
#[derive(Debug, Clone)]
pub struct Selection {
    pub platform: String,
    pub model: String,
    pub prompt_key: String,
    pub first_message_key: String,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    UserExit,
    LimitReached,
    Interrupted,
}

/// Everything the loop needs to run one session.
pub struct SessionSettings {
    pub selection: Selection,
    /// System prompt with placeholders already filled in.
    pub system_prompt: String,
    /// Opening assistant line, placeholders already filled in.
    pub first_message: String,
    /// Context budget handed to the gateway on every call.
    pub max_tokens: u32,
    pub max_interactions: Option<u32>,
    pub goodbye_message: Option<String>,
}

/// A finished conversation, handed to the transcript writer exactly once.
#[derive(Debug)]
pub struct ConversationRecord {
    pub timestamp: String,
    pub selection: Selection,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub end: EndReason,
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Run one conversation to completion.
///
/// The history is seeded with the first consented message as an
/// assistant turn; that opener is shown to the user but never sent to
/// the gateway on its own. Each subsequent turn reads one line from
/// `input`, relays it through `backend`, and prints the reply to `out`.
///
/// `exit`/`quit` (any case) end the session. EOF, a failed read, or the
/// `interrupted` flag end it as an interrupt; the record still carries
/// whatever history accumulated. A gateway failure is reported and the
/// turn is rolled back, leaving the history exactly as it was before.
pub fn run_loop<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    interrupted: &AtomicBool,
    backend: &dyn ReplyBackend,
    settings: &SessionSettings,
) -> io::Result<ConversationRecord> {
    let mut messages = vec![Message::assistant(settings.first_message.clone())];
    writeln!(out, "BOT: {}\n", settings.first_message)?;

    let mut user_turns: u32 = 0;

    let end = loop {
        if interrupted.load(Ordering::SeqCst) {
            break EndReason::Interrupted;
        }

        write!(out, "YOU: ")?;
        out.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line);
        if interrupted.load(Ordering::SeqCst) {
            writeln!(out)?;
            break EndReason::Interrupted;
        }
        match read {
            Ok(0) => {
                // EOF on stdin ends the session like an interrupt.
                writeln!(out)?;
                break EndReason::Interrupted;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("input read failed: {err}");
                break EndReason::Interrupted;
            }
        }

        let text = line.trim();
        if text.is_empty() {
            writeln!(out, "Please enter a message.")?;
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            if let Some(goodbye) = &settings.goodbye_message {
                writeln!(out, "BOT: {goodbye}")?;
            }
            break EndReason::UserExit;
        }

        messages.push(Message::user(text));
        user_turns += 1;

        let spinner = thinking_spinner();
        let reply = backend.get_reply(&settings.system_prompt, &messages, settings.max_tokens);
        spinner.finish_and_clear();

        match reply {
            Ok(reply) => {
                writeln!(out, "BOT: {reply}\n")?;
                messages.push(Message::assistant(reply));
            }
            Err(err) => {
                // Roll the failed turn back so the history matches what
                // the model has actually seen.
                messages.pop();
                user_turns -= 1;
                warn!("gateway call failed: {err}");
                writeln!(out, "Could not get a reply: {err}. Your message was not kept; try again.")?;
                continue;
            }
        }

        if let Some(limit) = settings.max_interactions {
            if user_turns >= limit {
                if let Some(goodbye) = &settings.goodbye_message {
                    writeln!(out, "BOT: {goodbye}")?;
                    messages.push(Message::assistant(goodbye.clone()));
                }
                writeln!(out, "Maximum interactions reached. Ending conversation.")?;
                break EndReason::LimitReached;
            }
        }
    };

    Ok(ConversationRecord {
        timestamp: Local::now().to_rfc3339(),
        selection: settings.selection.clone(),
        system_prompt: settings.system_prompt.clone(),
        messages,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{MockBackend, MockStep};
    use std::io::Cursor;

    fn settings(max_interactions: Option<u32>, goodbye: Option<&str>) -> SessionSettings {
        SessionSettings {
            selection: Selection {
                platform: "mock".to_string(),
                model: "test-model".to_string(),
                prompt_key: "p1".to_string(),
                first_message_key: "m1".to_string(),
            },
            system_prompt: "You are a test bot.".to_string(),
            first_message: "Hi there".to_string(),
            max_tokens: 7000,
            max_interactions,
            goodbye_message: goodbye.map(str::to_string),
        }
    }

    fn run(input: &str, backend: &MockBackend, settings: &SessionSettings) -> ConversationRecord {
        let interrupted = AtomicBool::new(false);
        let mut out = Vec::new();
        run_loop(
            &mut Cursor::new(input.to_string()),
            &mut out,
            &interrupted,
            backend,
            settings,
        )
        .unwrap()
    }

    #[test]
    fn exit_on_first_turn_keeps_only_the_opener() {
        let backend = MockBackend::replies(&[]);
        let record = run("exit\n", &backend, &settings(Some(5), Some("bye")));

        assert_eq!(record.end, EndReason::UserExit);
        assert_eq!(record.messages, vec![Message::assistant("Hi there")]);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn quit_is_case_insensitive() {
        let backend = MockBackend::replies(&[]);
        let record = run("QUIT\n", &backend, &settings(None, None));
        assert_eq!(record.end, EndReason::UserExit);
        assert_eq!(record.messages.len(), 1);

        let backend = MockBackend::replies(&[]);
        let record = run("Exit\n", &backend, &settings(None, None));
        assert_eq!(record.end, EndReason::UserExit);
    }

    #[test]
    fn interaction_limit_ends_after_the_reply() {
        let backend = MockBackend::replies(&["r1", "r2"]);
        let record = run(
            "one\ntwo\nthree\n",
            &backend,
            &settings(Some(2), Some("Thanks for chatting.")),
        );

        assert_eq!(record.end, EndReason::LimitReached);
        // The third input line is never read.
        assert_eq!(backend.calls(), 2);
        assert_eq!(
            record.messages,
            vec![
                Message::assistant("Hi there"),
                Message::user("one"),
                Message::assistant("r1"),
                Message::user("two"),
                Message::assistant("r2"),
                Message::assistant("Thanks for chatting."),
            ]
        );
    }

    #[test]
    fn gateway_failure_rolls_the_turn_back() {
        let backend = MockBackend::steps(vec![
            MockStep::Fail("boom".to_string()),
            MockStep::Reply("ok".to_string()),
        ]);
        let record = run("first\nsecond\nquit\n", &backend, &settings(None, None));

        assert_eq!(record.end, EndReason::UserExit);
        assert_eq!(
            record.messages,
            vec![
                Message::assistant("Hi there"),
                Message::user("second"),
                Message::assistant("ok"),
            ]
        );
    }

    #[test]
    fn eof_ends_as_an_interrupt_and_keeps_history() {
        let backend = MockBackend::replies(&["ack"]);
        let record = run("hello\n", &backend, &settings(None, None));

        assert_eq!(record.end, EndReason::Interrupted);
        assert_eq!(
            record.messages,
            vec![
                Message::assistant("Hi there"),
                Message::user("hello"),
                Message::assistant("ack"),
            ]
        );
        assert!(!record.timestamp.is_empty());
    }

    #[test]
    fn blank_lines_do_not_reach_the_history() {
        let backend = MockBackend::replies(&[]);
        let record = run("\n   \nexit\n", &backend, &settings(None, None));

        assert_eq!(record.end, EndReason::UserExit);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn interrupt_flag_ends_before_reading() {
        let backend = MockBackend::replies(&[]);
        let interrupted = AtomicBool::new(true);
        let mut out = Vec::new();
        let record = run_loop(
            &mut Cursor::new("hello\n".to_string()),
            &mut out,
            &interrupted,
            &backend,
            &settings(None, None),
        )
        .unwrap();

        assert_eq!(record.end, EndReason::Interrupted);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(backend.calls(), 0);
    }
}
