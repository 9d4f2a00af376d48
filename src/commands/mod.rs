use crate::error::{validation_error, AppResult};
use crate::models::DraftField;
use std::str::FromStr;

// Export submodules
pub mod dialogs;
pub mod shell;

pub use dialogs::TerminalDialogs;
pub use shell::{Shell, ShellOutcome};

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    WhoAmI,
    /// Go to the event list
    Events,
    /// Open an event from the list by id or position
    Open(String),
    New,
    Edit,
    Attend,
    Delete,
    Set { field: DraftField, value: String },
    Save,
    Back,
    /// Print the current route path
    Where,
    Quit,
}

/// Type alias for command result
pub type CommandResult = AppResult<ShellOutcome>;

impl FromStr for Command {
    type Err = crate::error::Error;

    fn from_str(line: &str) -> AppResult<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "help" | "ayuda" | "?" => Command::Help,
            "login" => {
                let (email, password) = credentials(rest)?;
                Command::Login { email, password }
            }
            "register" => {
                let (email, password) = credentials(rest)?;
                Command::Register { email, password }
            }
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "events" | "list" => Command::Events,
            "open" => {
                if rest.is_empty() {
                    return Err(validation_error("usage: open <id|number>"));
                }
                Command::Open(rest.to_string())
            }
            "new" => Command::New,
            "edit" => Command::Edit,
            "attend" => Command::Attend,
            "delete" => Command::Delete,
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(field, value)| (field, value.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(validation_error("usage: set <field> <value>"));
                }
                Command::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                }
            }
            "save" => Command::Save,
            "back" => Command::Back,
            "where" | "pwd" => Command::Where,
            "quit" | "exit" => Command::Quit,
            "" => return Err(validation_error("empty command")),
            other => return Err(validation_error(&format!("unknown command: {}", other))),
        };

        Ok(command)
    }
}

fn credentials(rest: &str) -> AppResult<(String, String)> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(email), Some(password), None) => Ok((email.to_string(), password.to_string())),
        _ => Err(validation_error("usage: login|register <email> <password>")),
    }
}
