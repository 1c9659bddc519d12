//! # Command protocol.
//!
//! Text commands accepted by the agent, parsed into [`Command`] via `FromStr`.
//!
//! | Command string                                   | Parsed as            |
//! |--------------------------------------------------|----------------------|
//! | `create,<name>[,<durationSeconds>]`              | [`Command::Create`]  |
//! | `stop,<name>` / `stop:<name>`                    | [`Command::Stop`]    |
//! | `list`                                           | [`Command::List`]    |
//! | `add:<name>[:<daemonFlag>[:<intervalMillis>]]`   | [`Command::Add`]     |
//! | `stopall`                                        | [`Command::StopAll`] |
//!
//! The separator is whichever of `,` or `:` first follows the action token.
//! Fields are trimmed; an empty optional field counts as omitted. Omitted
//! optional fields stay `None` and are filled from
//! [`ControllerConfig`](crate::ControllerConfig) at execution time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ControlError;

/// A parsed controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a fixed-duration worker.
    Create {
        /// Worker name.
        name: String,
        /// Lifetime; `None` uses the configured default.
        lifetime: Option<Duration>,
    },
    /// Start a periodic worker.
    Add {
        /// Worker name.
        name: String,
        /// Daemon flag; `None` uses the configured default.
        daemon: Option<bool>,
        /// Heartbeat interval; `None` uses the configured default.
        interval: Option<Duration>,
    },
    /// Stop one worker.
    Stop {
        /// Worker name.
        name: String,
    },
    /// List live workers.
    List,
    /// Stop every worker.
    StopAll,
}

impl FromStr for Command {
    type Err = ControlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ControlError::MissingArgument { field: "command" });
        }

        let (action, rest) = match input.find([',', ':']) {
            Some(at) => {
                let sep = input[at..].chars().next().unwrap_or(',');
                let fields: Vec<&str> = input[at + 1..].split(sep).map(str::trim).collect();
                (input[..at].trim(), fields)
            }
            None => (input, Vec::new()),
        };
        let mut fields = rest.into_iter();

        match action.to_ascii_lowercase().as_str() {
            "create" => {
                let name = required(fields.next(), "name")?;
                let lifetime = optional(fields.next())
                    .map(|raw| parse_u64(raw, "duration").map(Duration::from_secs))
                    .transpose()?;
                Ok(Command::Create { name, lifetime })
            }
            "add" => {
                let name = required(fields.next(), "name")?;
                let daemon = optional(fields.next()).map(parse_bool).transpose()?;
                let interval = optional(fields.next())
                    .map(|raw| parse_u64(raw, "interval").map(Duration::from_millis))
                    .transpose()?;
                Ok(Command::Add {
                    name,
                    daemon,
                    interval,
                })
            }
            "stop" => Ok(Command::Stop {
                name: required(fields.next(), "name")?,
            }),
            "list" => Ok(Command::List),
            "stopall" => Ok(Command::StopAll),
            _ => Err(ControlError::UnknownCommand {
                command: action.to_string(),
            }),
        }
    }
}

fn optional(field: Option<&str>) -> Option<&str> {
    field.filter(|f| !f.is_empty())
}

fn required(field: Option<&str>, name: &'static str) -> Result<String, ControlError> {
    optional(field)
        .map(str::to_string)
        .ok_or(ControlError::MissingArgument { field: name })
}

fn parse_u64(raw: &str, field: &'static str) -> Result<u64, ControlError> {
    raw.parse().map_err(|_| ControlError::InvalidArgument {
        field,
        value: raw.to_string(),
    })
}

fn parse_bool(raw: &str) -> Result<bool, ControlError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ControlError::InvalidArgument {
            field: "daemon",
            value: raw.to_string(),
        }),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Create { name, lifetime } => {
                write!(f, "create,{name}")?;
                if let Some(l) = lifetime {
                    write!(f, ",{}", l.as_secs())?;
                }
                Ok(())
            }
            Command::Add {
                name,
                daemon,
                interval,
            } => {
                write!(f, "add:{name}")?;
                match (daemon, interval) {
                    (None, None) => Ok(()),
                    (Some(d), None) => write!(f, ":{d}"),
                    (d, Some(i)) => write!(
                        f,
                        ":{}:{}",
                        d.map(|d| d.to_string()).unwrap_or_default(),
                        i.as_millis()
                    ),
                }
            }
            Command::Stop { name } => write!(f, "stop,{name}"),
            Command::List => f.write_str("list"),
            Command::StopAll => f.write_str("stopall"),
        }
    }
}
