// End-to-end session: config -> selections -> conversation -> transcript,
// with the gateway stubbed out.

use std::io::Cursor;
use std::sync::atomic::AtomicBool;

use promptlab_cli::config::Config;
use promptlab_cli::conversation::{run_loop, EndReason, Message, Selection, SessionSettings};
use promptlab_cli::gateway::{self, mock::MockBackend};
use promptlab_cli::template;
use promptlab_cli::transcript;
use promptlab_cli::ui;

#[test]
fn full_session_from_config_to_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "gai_models:\n  openai: [gpt-4]\ngai_prompt:\n  p1: \"Hello {subreddit}\"\nfirst_consented_message:\n  m1: \"Hi there\"\n",
    )
    .unwrap();
    let config = Config::load(&config_path).unwrap();

    // Entering `1` in each menu resolves to the only entry.
    let models = gateway::list_available_models(&config);
    let (platform, model) = models[ui::resolve_choice("1", models.len()).unwrap()].clone();
    assert_eq!((platform.as_str(), model.as_str()), ("openai", "gpt-4"));

    let prompt_keys: Vec<String> = config.gai_prompt.keys().cloned().collect();
    let prompt_key = prompt_keys[ui::resolve_choice("1", prompt_keys.len()).unwrap()].clone();
    let message_keys: Vec<String> = config.first_consented_message.keys().cloned().collect();
    let first_message_key =
        message_keys[ui::resolve_choice("1", message_keys.len()).unwrap()].clone();

    let system_prompt = template::fill_placeholders(&config.gai_prompt[&prompt_key]);
    assert_eq!(system_prompt, "Hello [test_subreddit]");
    let first_message =
        template::fill_placeholders(&config.first_consented_message[&first_message_key]);

    let settings = SessionSettings {
        selection: Selection {
            platform,
            model: model.clone(),
            prompt_key,
            first_message_key,
        },
        system_prompt,
        first_message,
        max_tokens: config.max_tokens_for(&model),
        max_interactions: config.max_interactions,
        goodbye_message: config.goodbye_message.clone(),
    };

    let backend = MockBackend::replies(&["ack"]);
    let interrupted = AtomicBool::new(false);
    let mut out = Vec::new();
    let record = run_loop(
        &mut Cursor::new("test\nquit\n".to_string()),
        &mut out,
        &interrupted,
        &backend,
        &settings,
    )
    .unwrap();

    assert_eq!(record.end, EndReason::UserExit);
    assert_eq!(
        record.messages,
        vec![
            Message::assistant("Hi there"),
            Message::user("test"),
            Message::assistant("ack"),
        ]
    );
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("BOT: Hi there"));
    assert!(printed.contains("BOT: ack"));

    let output_path = dir.path().join("conversations.txt");
    transcript::append(&output_path, &record).unwrap();
    let saved = std::fs::read_to_string(&output_path).unwrap();

    assert_eq!(saved.matches("Conversation at ").count(), 1);
    assert!(saved.contains("GAI Platform: openai"));
    assert!(saved.contains("GAI Model: gpt-4"));
    assert!(saved.contains("Prompt Key: p1"));
    assert!(saved.contains("First Consented Message Key: m1"));
    assert!(saved.contains("System Prompt:\nHello [test_subreddit]"));

    let opener_at = saved.find("ASSISTANT: Hi there").unwrap();
    let user_at = saved.find("USER: test").unwrap();
    let reply_at = saved.find("ASSISTANT: ack").unwrap();
    assert!(opener_at < user_at && user_at < reply_at);
}
