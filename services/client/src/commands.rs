//! services/client/src/commands.rs
//!
//! The line-oriented command language of the `hub` shell.

use knowledge_hub_core::ReviewOutcome;
use std::path::PathBuf;
use std::str::FromStr;

pub const HELP_TEXT: &str = "\
Commands:
  login <api-key>          validate an API key and start a session
  logout                   end the session and forget the document
  upload <path> [model]    upload a PDF for summarizing
  search <question>        ask about the uploaded documents
  summary                  show the current document's summary
  cards                    list the remaining flashcards
  flip <n>                 show or hide the answer of card n
  master <n> | skip <n>    review card n
  dismiss                  close the current document
  status                   show the session state
  help                     show this help
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(String),
    Logout,
    Upload { path: PathBuf, model: Option<String> },
    Search(String),
    Summary,
    Cards,
    /// Zero-based card index.
    Flip(usize),
    /// Zero-based card index.
    Review { index: usize, outcome: ReviewOutcome },
    Dismiss,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a card number (cards are numbered from 1)")]
    InvalidIndex(String),
}

/// Card numbers are shown to the user starting at 1.
fn parse_card_number(raw: &str, command: &'static str) -> Result<usize, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "a card number",
        });
    }
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::InvalidIndex(raw.to_string())),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "login" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "login",
                        argument: "an API key",
                    });
                }
                Ok(Command::Login(rest.to_string()))
            }
            "logout" => Ok(Command::Logout),
            "upload" => {
                let mut parts = rest.split_whitespace();
                let path = parts.next().ok_or(CommandError::MissingArgument {
                    command: "upload",
                    argument: "a file path",
                })?;
                Ok(Command::Upload {
                    path: PathBuf::from(path),
                    model: parts.next().map(str::to_string),
                })
            }
            // An empty query is passed through; the controller ignores it.
            "search" | "ask" => Ok(Command::Search(rest.to_string())),
            "summary" => Ok(Command::Summary),
            "cards" => Ok(Command::Cards),
            "flip" => Ok(Command::Flip(parse_card_number(rest, "flip")?)),
            "master" => Ok(Command::Review {
                index: parse_card_number(rest, "master")?,
                outcome: ReviewOutcome::Mastered,
            }),
            "skip" => Ok(Command::Review {
                index: parse_card_number(rest, "skip")?,
                outcome: ReviewOutcome::Skipped,
            }),
            "dismiss" | "close" => Ok(Command::Dismiss),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_and_without_model() {
        assert_eq!(
            "upload notes.pdf".parse::<Command>(),
            Ok(Command::Upload {
                path: PathBuf::from("notes.pdf"),
                model: None
            })
        );
        assert_eq!(
            "  UPLOAD  notes.pdf gemini-2.5-flash ".parse::<Command>(),
            Ok(Command::Upload {
                path: PathBuf::from("notes.pdf"),
                model: Some("gemini-2.5-flash".into())
            })
        );
    }

    #[test]
    fn search_keeps_the_whole_question() {
        assert_eq!(
            "search what is X?".parse::<Command>(),
            Ok(Command::Search("what is X?".into()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
    }

    #[test]
    fn card_numbers_are_one_based() {
        assert_eq!(
            "master 1".parse::<Command>(),
            Ok(Command::Review {
                index: 0,
                outcome: ReviewOutcome::Mastered
            })
        );
        assert_eq!("flip 3".parse::<Command>(), Ok(Command::Flip(2)));
        assert_eq!(
            "skip 0".parse::<Command>(),
            Err(CommandError::InvalidIndex("0".into()))
        );
        assert!(matches!(
            "skip".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "skip", .. })
        ));
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(CommandError::Unknown("frobnicate".into()))
        );
        assert!(matches!(
            "login".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "login", .. })
        ));
    }
}
