//! Parsing of terminal command lines.

use smartcount_core::{Command, NudgeDirection};
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Commands:
  start                    start the program
  pause                    pause or resume
  restart                  reset the clock and restore the configured program
  + <n>  /  - <n>          lengthen or shorten section n by one step
  adjust <n> <+/-secs>     change section n by any number of seconds
  add <minutes> <title>    append a section
  delete <n>               remove section n
  status [--json]          show the current board
  help                     show this help
  quit                     exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Forward to the clock runner
    Clock(Command),
    Status { json: bool },
    Help,
    Quit,
    /// Blank line
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command \"{0}\" (type \"help\" for a list)")]
    UnknownCommand(String),

    #[error("\"{command}\" needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("\"{0}\" is not a number")]
    InvalidNumber(String),

    #[error("Sections are numbered from 1")]
    ZeroSection,
}

/// Parse a single line typed by the user.
///
/// Section numbers are 1-based on the terminal and converted to indices here.
pub fn parse_line(line: &str) -> Result<InputAction, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(InputAction::Nothing);
    }

    // "+2" and "-2" are accepted as well as "+ 2"
    let (verb, rest) = if let Some(rest) = line.strip_prefix('+') {
        ("+", rest.trim_start())
    } else if let Some(rest) = line.strip_prefix('-') {
        ("-", rest.trim_start())
    } else {
        line.split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim_start()))
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "start" => InputAction::Clock(Command::Start),
        "pause" | "resume" => InputAction::Clock(Command::PauseToggle),
        "restart" => InputAction::Clock(Command::Restart),
        "+" => InputAction::Clock(Command::Nudge {
            index: section_index(rest, "+")?,
            direction: NudgeDirection::Up,
        }),
        "-" => InputAction::Clock(Command::Nudge {
            index: section_index(rest, "-")?,
            direction: NudgeDirection::Down,
        }),
        "adjust" => {
            let (section, delta) =
                rest.split_once(char::is_whitespace)
                    .ok_or(ParseError::MissingArgument {
                        command: "adjust",
                        argument: "a section number and a number of seconds",
                    })?;
            InputAction::Clock(Command::Adjust {
                index: section_index(section, "adjust")?,
                delta_seconds: parse_number(delta.trim())?,
            })
        }
        "add" => {
            let (minutes, title) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(minutes, title)| (minutes, title.trim()));
            if minutes.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "add",
                    argument: "a duration in minutes and a title",
                });
            }
            InputAction::Clock(Command::AddSection {
                title: title.to_string(),
                duration_minutes: parse_number(minutes)?,
            })
        }
        "delete" | "del" | "rm" => InputAction::Clock(Command::DeleteSection {
            index: section_index(rest, "delete")?,
        }),
        "status" => InputAction::Status {
            json: rest == "--json",
        },
        "help" | "?" => InputAction::Help,
        "quit" | "exit" | "q" => InputAction::Quit,
        _ => return Err(ParseError::UnknownCommand(verb.to_string())),
    };

    Ok(action)
}

fn parse_number(token: &str) -> Result<i64, ParseError> {
    token
        .strip_prefix('+')
        .unwrap_or(token)
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

/// Convert a 1-based section number into an index
fn section_index(token: &str, command: &'static str) -> Result<usize, ParseError> {
    if token.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            argument: "a section number",
        });
    }
    let number: usize = token
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))?;
    number.checked_sub(1).ok_or(ParseError::ZeroSection)
}
