// UI layer: numbered selection menus using `dialoguer`, plus the session
// flow that wires selection -> conversation -> transcript.

use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use dialoguer::Input;
use tracing::{info, warn};

use crate::config::Config;
use crate::conversation::{self, Selection, SessionSettings};
use crate::gateway::{self, ReplyBackend};
use crate::template;
use crate::transcript;

/// Resolve one line of selector input against an options list of length
/// `len`. Input is 1-based; the returned index is 0-based. Anything
/// non-numeric or out of range resolves to nothing.
pub fn resolve_choice(line: &str, len: usize) -> Option<usize> {
    let n: usize = line.trim().parse().ok()?;
    if (1..=len).contains(&n) {
        Some(n - 1)
    } else {
        None
    }
}

/// Print a 1-based numbered menu and block until the user picks a valid
/// entry. Invalid input re-prompts; there is no default.
fn select_from_list(prompt: &str, labels: &[String]) -> Result<usize> {
    println!("\n{prompt}");
    for (i, label) in labels.iter().enumerate() {
        println!("  {}. {}", i + 1, label);
    }

    let len = labels.len();
    loop {
        let line: String = Input::new()
            .with_prompt(format!("Enter your choice (1-{len})"))
            .interact_text()?;
        match resolve_choice(&line, len) {
            Some(index) => return Ok(index),
            None => println!("Please enter a number between 1 and {len}"),
        }
    }
}

/// Pick a platform/model pair and build its backend. A platform this
/// build cannot speak is reported and the menu runs again.
fn select_model(config: &Config) -> Result<(Box<dyn ReplyBackend>, String, String)> {
    let models = gateway::list_available_models(config);
    let labels: Vec<String> = models
        .iter()
        .map(|(platform, model)| format!("{platform}: {model}"))
        .collect();

    loop {
        let index = select_from_list("Select a GAI model:", &labels)?;
        let (platform, model) = &models[index];
        match gateway::for_platform(platform, model) {
            Ok(backend) => return Ok((backend, platform.clone(), model.clone())),
            Err(err) => {
                warn!("model selection rejected: {err}");
                println!("{err}. Please pick a different model.");
            }
        }
    }
}

/// Run one full session: three selections, the conversation, and the
/// transcript append.
pub fn run(config: &Config, output: &Path, interrupted: &AtomicBool) -> Result<()> {
    let rule = "=".repeat(80);
    println!("\n{rule}");
    println!("Bot Prompt Testing Utility");
    println!("{rule}");

    let (backend, platform, model) = select_model(config)?;
    println!("\nSelected: {platform} - {model}");

    let prompt_keys: Vec<String> = config.gai_prompt.keys().cloned().collect();
    let prompt_index = select_from_list("Select a bot prompt:", &prompt_keys)?;
    let prompt_key = prompt_keys[prompt_index].clone();
    println!("\nSelected prompt: {prompt_key}");

    let message_keys: Vec<String> = config.first_consented_message.keys().cloned().collect();
    let message_index = select_from_list("Select a first consented message:", &message_keys)?;
    let first_message_key = message_keys[message_index].clone();
    println!("\nSelected first message: {first_message_key}");

    let system_prompt = template::fill_placeholders(&config.gai_prompt[&prompt_key]);
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

    println!("\n{rule}");
    println!("Starting conversation. Type 'exit' or 'quit' to end the conversation.");
    println!("{rule}\n");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let record = conversation::run_loop(
        &mut input,
        &mut out,
        interrupted,
        backend.as_ref(),
        &settings,
    )
    .context("conversation input/output failed")?;
    info!("conversation ended: {:?}", record.end);

    transcript::append(output, &record)
        .with_context(|| format!("could not save conversation to {}", output.display()))?;
    println!("\nConversation saved to {}", output.display());
    Ok(())
}
