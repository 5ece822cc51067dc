//! Inbound command parsing
//!
//! One line of the gitremote-helpers(7) dialect becomes one tagged
//! [`Command`]. The session loop owns blank-line skipping and end-of-input.

use crate::error::{GrsError, Result};

/// A parsed remote-helper command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capabilities,
    List { for_push: bool },
    Fetch { sha: String, name: String },
    Push { refspec: String },
    Option { name: String, value: String },
    Import { name: String },
    Export,
    Connect { service: String },
    StatelessConnect { service: String },
    Get { uri: String, path: String },
}

impl Command {
    /// Parse one non-empty, pre-trimmed command line.
    pub fn parse(line: &str) -> Result<Command> {
        let mut tokens = line.split(' ');
        let verb = tokens
            .next()
            .ok_or_else(|| GrsError::InvalidCommand(line.to_string()))?;

        let command = match verb {
            "capabilities" => Command::Capabilities,
            "list" => match tokens.next() {
                None => Command::List { for_push: false },
                Some("for-push") => Command::List { for_push: true },
                Some(_) => return Err(GrsError::InvalidCommand(line.to_string())),
            },
            "fetch" => {
                let sha = required(tokens.next(), line)?;
                let name = required(tokens.next(), line)?;
                Command::Fetch { sha, name }
            }
            "push" => {
                let refspec = required(tokens.next(), line)?;
                Command::Push { refspec }
            }
            "option" => {
                let name = required(tokens.next(), line)?;
                let value = tokens.collect::<Vec<_>>().join(" ");
                if value.is_empty() {
                    return Err(GrsError::InvalidCommand(line.to_string()));
                }
                Command::Option { name, value }
            }
            "import" => {
                let name = required(tokens.next(), line)?;
                Command::Import { name }
            }
            "export" => Command::Export,
            "connect" => {
                let service = required(tokens.next(), line)?;
                Command::Connect { service }
            }
            "stateless-connect" => {
                let service = required(tokens.next(), line)?;
                Command::StatelessConnect { service }
            }
            "get" => {
                let uri = required(tokens.next(), line)?;
                let path = required(tokens.next(), line)?;
                Command::Get { uri, path }
            }
            _ => return Err(GrsError::InvalidCommand(line.to_string())),
        };

        Ok(command)
    }
}

fn required(token: Option<&str>, line: &str) -> Result<String> {
    match token {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(GrsError::InvalidCommand(line.to_string())),
    }
}
