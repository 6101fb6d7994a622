//! Prompt commands typed on stdin.

use crate::error::CliError;

pub const HELP: &str = "\
commands:
  connect            open the realtime connection
  disconnect         close it and stop reconnecting
  ocr <image-url>    request text extraction for an image
  recommend          request recipe recommendations
  token <token>      replace the bearer token
  state              print the connection state
  progress           print in-flight progress
  help               show this message
  quit               disconnect and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Connect,
    Disconnect,
    Ocr { image_url: String },
    Recommend,
    Token(String),
    State,
    Progress,
    Help,
    Quit,
}

/// Parse one line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns [`CliError::Command`] for unknown commands or missing arguments.
pub fn parse(line: &str) -> Result<Option<PromptCommand>, CliError> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let argument = parts.next();

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("connect", _) => PromptCommand::Connect,
        ("disconnect", _) => PromptCommand::Disconnect,
        ("ocr", Some(url)) => PromptCommand::Ocr {
            image_url: url.to_string(),
        },
        ("ocr", None) => return Err(CliError::command("usage: ocr <image-url>")),
        ("recommend" | "rec", _) => PromptCommand::Recommend,
        ("token", Some(token)) => PromptCommand::Token(token.to_string()),
        ("token", None) => return Err(CliError::command("usage: token <token>")),
        ("state", _) => PromptCommand::State,
        ("progress", _) => PromptCommand::Progress,
        ("help" | "?", _) => PromptCommand::Help,
        ("quit" | "exit", _) => PromptCommand::Quit,
        (other, _) => {
            return Err(CliError::command(format!(
                "unknown command '{other}', type 'help'"
            )));
        }
    };

    Ok(Some(command))
}
