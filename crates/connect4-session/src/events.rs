use std::fmt;

use connect4_core::{Cell, Disc, Nick};

/// Notification delivered to the presentation layer.
///
/// Events are produced in the order the underlying messages were received
/// and are never coalesced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The handshake was acknowledged; the lobby is active.
    LobbyReady,

    /// The link is down and the client is trying to (re)connect.
    Connecting { info: String },

    UserAdded { nick: Nick },
    UserRemoved { nick: Nick },
    UserAvailability { nick: Nick, available: bool },

    /// Another player challenged the local player.
    ChallengeReceived { from: Nick },

    /// The pending challenge was withdrawn, declined or timed out.
    ChallengeCanceled,

    GameStarted { opponent: Nick },

    /// Discs replayed by the server after a reconnect, row-major.
    BoardRecovered { discs: Vec<(Cell, Disc)> },

    /// A disc landed in `cell`; `local` is set when the local player moved.
    MoveMade { cell: Cell, local: bool, disc: Disc },

    GameCanceled { message: String },
    GameMessage { message: String },
    GameResult { message: String },

    /// Cells of the winning line, to be highlighted.
    WinningCells { cells: Vec<Cell> },

    /// The client stopped after a protocol violation.
    Terminated { reason: String },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEvent::LobbyReady => write!(f, "lobby ready"),
            ClientEvent::Connecting { info } => write!(f, "connecting ({info})"),
            ClientEvent::UserAdded { nick } => write!(f, "{nick} joined"),
            ClientEvent::UserRemoved { nick } => write!(f, "{nick} left"),
            ClientEvent::UserAvailability { nick, available } => {
                let status = if *available { "available" } else { "busy" };
                write!(f, "{nick} is {status}")
            }
            ClientEvent::ChallengeReceived { from } => write!(f, "{from} challenges you"),
            ClientEvent::ChallengeCanceled => write!(f, "challenge canceled"),
            ClientEvent::GameStarted { opponent } => write!(f, "game started against {opponent}"),
            ClientEvent::BoardRecovered { discs } => {
                write!(f, "board recovered:")?;
                for (cell, disc) in discs {
                    write!(f, " {cell}={disc}")?;
                }
                Ok(())
            }
            ClientEvent::MoveMade { cell, local, disc } => {
                let side = if *local { "you" } else { "opponent" };
                write!(f, "{side} played {cell} as {disc}")
            }
            ClientEvent::GameCanceled { message } => write!(f, "game canceled: {message}"),
            ClientEvent::GameMessage { message } => write!(f, "{message}"),
            ClientEvent::GameResult { message } => write!(f, "result: {message}"),
            ClientEvent::WinningCells { cells } => {
                write!(f, "winning cells:")?;
                for cell in cells {
                    write!(f, " {cell}")?;
                }
                Ok(())
            }
            ClientEvent::Terminated { reason } => write!(f, "terminated: {reason}"),
        }
    }
}
