// Transcript writer: appends one fixed-format block per finished
// conversation to the output file. The format matches what the
// production log tooling expects, so blocks from this utility and the
// bot itself can live in the same file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::conversation::ConversationRecord;

/// Append `record` as one transcript block.
///
/// The file handle is scoped to this call; errors surface to the caller
/// unchanged and nothing is retried.
pub fn append(path: &Path, record: &ConversationRecord) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;

    let heavy = "=".repeat(80);
    let light = "-".repeat(80);

    writeln!(file)?;
    writeln!(file, "{heavy}")?;
    writeln!(file, "Conversation at {}", record.timestamp)?;
    writeln!(file, "GAI Platform: {}", record.selection.platform)?;
    writeln!(file, "GAI Model: {}", record.selection.model)?;
    writeln!(file, "Prompt Key: {}", record.selection.prompt_key)?;
    writeln!(
        file,
        "First Consented Message Key: {}",
        record.selection.first_message_key
    )?;
    writeln!(file, "{heavy}")?;
    writeln!(file)?;
    writeln!(file, "System Prompt:")?;
    writeln!(file, "{}", record.system_prompt)?;
    writeln!(file)?;
    writeln!(file, "Conversation:")?;
    writeln!(file, "{light}")?;
    for message in &record.messages {
        writeln!(file, "{}: {}", message.role.tag(), message.text)?;
        writeln!(file, "{light}")?;
    }
    writeln!(file)?;

    info!("conversation saved to {}", path.display());
    Ok(())
}
