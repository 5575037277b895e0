//! Panel commands read from stdin

use std::str::FromStr;

use thiserror::Error;

/// A line typed at the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Start,
    Pause,
    Stop,
    Output(String),
    Dir(String),
    Set { field: String, value: String },
    Status,
    Help,
    Quit,
}

/// Unparseable panel input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: \"{0}\". Type 'help' for commands")]
    Unknown(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),
}

impl FromStr for PanelCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "start" | "r" | "record" | "resume" => Ok(Self::Start),
            "pause" | "p" => Ok(Self::Pause),
            "stop" | "s" => Ok(Self::Stop),
            "status" | "" => Ok(Self::Status),
            "help" | "?" | "h" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            "output" | "o" => required(rest, "output <file>").map(Self::Output),
            "dir" | "d" => required(rest, "dir <directory>").map(Self::Dir),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::MissingArgument("set <field> <value>"))?;
                Ok(Self::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                })
            }
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

fn required(arg: &str, usage: &'static str) -> Result<String, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument(usage))
    } else {
        Ok(arg.to_string())
    }
}
