// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive prompt
// testing utility.
//
// Module responsibilities:
// - `cli`: Command-line flags (`--config`, `--output`, `--log`).
// - `config`: Typed configuration document loaded from YAML.
// - `template`: Placeholder substitution for prompts and first messages.
// - `gateway`: Reply backends for the supported AI platforms, plus
//   platform dispatch and context clamping.
// - `conversation`: The turn-taking loop and the finished conversation
//   record it produces.
// - `transcript`: Appends finished conversations to the output file.
// - `ui`: Numbered selection menus and the session flow that wires the
//   pieces together.
pub mod cli;
pub mod config;
pub mod conversation;
pub mod gateway;
pub mod template;
pub mod transcript;
pub mod ui;
