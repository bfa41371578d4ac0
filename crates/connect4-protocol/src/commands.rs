//! Outbound commands sent by the client.
//!
//! Each variant maps to exactly one wire tag:
//!
//! | Command | Wire body | Acknowledged with `OK` |
//! |---|---|---|
//! | `Nick` | `NICK <nick>` | yes |
//! | `Exit` | `EXIT` | yes |
//! | `Challenge` | `RQ <nick>` | yes |
//! | `CancelChallenge` | `RQ_CANCELED <nick>` | yes |
//! | `Reply` | `RPL <nick> YES\|NO` | only `NO` (`YES` is answered with `GAME_START`) |
//! | `CancelGame` | `GAME_CANCELED` | no |
//! | `Play` | `GAME_PLAY <col>` | no |
//! | `Ping` | `PING` | yes |
//!
//! # Round-trip Conversion
//!
//! ```
//! use connect4_core::Nick;
//! use connect4_protocol::ClientCommand;
//!
//! let command = ClientCommand::Reply {
//!     to: Nick::new("bob").unwrap(),
//!     accept: true,
//! };
//! let frame = command.to_frame();
//! assert_eq!(frame.body(), "RPL bob YES");
//! assert_eq!(ClientCommand::try_from(&frame).unwrap(), command);
//! ```

use std::fmt;

use crate::Frame;
use connect4_core::{Error, Nick, Result};

/// Command originated by the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Nick(Nick),
    Exit,
    Challenge(Nick),
    CancelChallenge(Nick),
    Reply { to: Nick, accept: bool },
    CancelGame,
    Play { column: usize },
    Ping,
}

impl ClientCommand {
    /// Wire tag of the command.
    pub fn tag(&self) -> &'static str {
        match self {
            ClientCommand::Nick(_) => "NICK",
            ClientCommand::Exit => "EXIT",
            ClientCommand::Challenge(_) => "RQ",
            ClientCommand::CancelChallenge(_) => "RQ_CANCELED",
            ClientCommand::Reply { .. } => "RPL",
            ClientCommand::CancelGame => "GAME_CANCELED",
            ClientCommand::Play { .. } => "GAME_PLAY",
            ClientCommand::Ping => "PING",
        }
    }

    /// Whether the server answers this command with a bare `OK`.
    pub fn expects_ack(&self) -> bool {
        match self {
            ClientCommand::Nick(_)
            | ClientCommand::Exit
            | ClientCommand::Challenge(_)
            | ClientCommand::CancelChallenge(_)
            | ClientCommand::Ping => true,
            ClientCommand::Reply { accept, .. } => !accept,
            ClientCommand::CancelGame | ClientCommand::Play { .. } => false,
        }
    }

    /// Build the frame carrying this command.
    pub fn to_frame(&self) -> Frame {
        let args: Vec<String> = match self {
            ClientCommand::Nick(nick)
            | ClientCommand::Challenge(nick)
            | ClientCommand::CancelChallenge(nick) => vec![nick.to_string()],
            ClientCommand::Reply { to, accept } => {
                let answer = if *accept { "YES" } else { "NO" };
                vec![to.to_string(), answer.to_string()]
            }
            ClientCommand::Play { column } => vec![column.to_string()],
            ClientCommand::Exit | ClientCommand::CancelGame | ClientCommand::Ping => Vec::new(),
        };
        Frame::new(self.tag(), args)
    }
}

impl TryFrom<&Frame> for ClientCommand {
    type Error = Error;

    /// Parse a client frame, as a server would.
    fn try_from(frame: &Frame) -> Result<Self> {
        let invalid = || Error::InvalidMessage {
            kind: frame.tag().to_string(),
            line: frame.line(),
        };
        let nick_arg = || -> Result<Nick> {
            match frame.args() {
                [nick] => Nick::new(nick).map_err(|_| invalid()),
                _ => Err(invalid()),
            }
        };
        let no_args = |command: ClientCommand| {
            if frame.args().is_empty() {
                Ok(command)
            } else {
                Err(invalid())
            }
        };

        match frame.tag() {
            "NICK" => Ok(ClientCommand::Nick(nick_arg()?)),
            "RQ" => Ok(ClientCommand::Challenge(nick_arg()?)),
            "RQ_CANCELED" => Ok(ClientCommand::CancelChallenge(nick_arg()?)),
            "RPL" => match frame.args() {
                [to, answer] if answer == "YES" || answer == "NO" => Ok(ClientCommand::Reply {
                    to: Nick::new(to).map_err(|_| invalid())?,
                    accept: answer == "YES",
                }),
                _ => Err(invalid()),
            },
            "GAME_PLAY" => match frame.args() {
                [column] => column
                    .parse()
                    .map(|column| ClientCommand::Play { column })
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            "EXIT" => no_args(ClientCommand::Exit),
            "GAME_CANCELED" => no_args(ClientCommand::CancelGame),
            "PING" => no_args(ClientCommand::Ping),
            tag => Err(Error::UnknownTag {
                tag: tag.to_string(),
                line: frame.line(),
            }),
        }
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_frame())
    }
}
