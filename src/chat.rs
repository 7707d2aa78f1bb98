// Line-oriented chat: the same gate and session as the terminal UI, driven
// from a reader/writer pair (stdin/stdout in practice).

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use tracing::info;

use crate::completions::CompletionsClient;
use crate::config::Config;
use crate::credential::CredentialGate;
use crate::dispatcher::ChatSession;

fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).context("Failed to read input")? == 0 {
        return Ok(None);
    }
    // Only the line terminator is stripped; the rest is kept verbatim.
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

const KEY_PROMPT_MESSAGE: &str = "Please enter your OpenRouter API key to start the conversation.";

/// Asks for the key on the controlling terminal without echoing it.
/// Only meaningful when stdin is a terminal; piped input goes through
/// [`run_line_chat`] instead.
pub fn prompt_for_key_masked(gate: &mut CredentialGate) -> Result<bool> {
    eprintln!("{}", KEY_PROMPT_MESSAGE);
    let value = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(false)
        .interact()
        .context("Failed to read the API key")?;
    gate.accept(&value).context("Failed to persist the API key")
}

/// Runs until the reader hits EOF. Returns the number of completed exchanges.
pub async fn run_line_chat<R: BufRead, W: Write>(
    config: &Config,
    gate: &mut CredentialGate,
    mut reader: R,
    mut writer: W,
) -> Result<usize> {
    if gate.is_open() {
        writeln!(writer, "{}", KEY_PROMPT_MESSAGE)?;
        loop {
            // Plain reads echo; the masked prompt is used when stdin is a terminal.
            write!(writer, "API Key (input is visible): ")?;
            writer.flush()?;
            let Some(value) = read_trimmed_line(&mut reader)? else {
                info!("Input closed before an API key was entered");
                return Ok(0);
            };
            if gate.accept(&value).context("Failed to persist the API key")? {
                break;
            }
            writeln!(writer, "An API key is required.")?;
        }
    }

    let Some(credential) = gate.credential().cloned() else {
        return Ok(0);
    };
    let client = Arc::new(CompletionsClient::new(config));
    let mut session = ChatSession::new(client, credential);
    let mut exchanges = 0;

    info!("Starting line chat session");
    loop {
        write!(writer, "You: ")?;
        writer.flush()?;
        let Some(input) = read_trimmed_line(&mut reader)? else {
            break;
        };
        let Some(reply) = session.send(&input).await else {
            continue;
        };
        writeln!(writer, "{}: {}", config.assistant_name, reply.content)?;
        exchanges += 1;
    }
    writeln!(writer)?;
    info!(exchanges, "Line chat session finished");
    Ok(exchanges)
}
